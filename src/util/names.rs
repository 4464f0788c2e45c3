//! Random ship/team name generation

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Generate a random name of ASCII letters
pub fn random_name<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    rng.sample_iter(Alphanumeric)
        .map(char::from)
        .filter(char::is_ascii_alphabetic)
        .take(len)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn names_are_letters_only() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..50 {
            let name = random_name(&mut rng, 10);
            assert_eq!(name.len(), 10);
            assert!(name.chars().all(|c| c.is_ascii_alphabetic()));
        }
    }

    #[test]
    fn same_seed_same_name() {
        let a = random_name(&mut ChaCha8Rng::seed_from_u64(1), 12);
        let b = random_name(&mut ChaCha8Rng::seed_from_u64(1), 12);
        assert_eq!(a, b);
    }
}

//! Bang-bang steering policy
//!
//! The ship only ever thrusts fully or not at all, and turns left, right or
//! not at all. The policy turns toward the local flow direction, but only
//! commits to a rotation when the ship is already spinning that way; any
//! disagreement between the desired correction and the current spin yields
//! no rotation, which damps oscillation around the target heading.

use std::f64::consts::{PI, TAU};
use std::fmt;

use super::flow_field::FlowVector;

/// Default heading window inside which thrust is applied (30 degrees)
pub const DEFAULT_TOLERANCE: f64 = PI / 6.0;

/// Forward thrust state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thrust {
    Off,
    On,
}

/// Rotation direction (positive is counter-clockwise)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Right,
    Hold,
    Left,
}

impl Thrust {
    pub fn as_i8(self) -> i8 {
        match self {
            Thrust::Off => 0,
            Thrust::On => 1,
        }
    }
}

impl Turn {
    pub fn as_i8(self) -> i8 {
        match self {
            Turn::Right => -1,
            Turn::Hold => 0,
            Turn::Left => 1,
        }
    }

    fn from_sign(sign: i8) -> Self {
        match sign {
            s if s > 0 => Turn::Left,
            s if s < 0 => Turn::Right,
            _ => Turn::Hold,
        }
    }
}

/// One actuation tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlCommand {
    pub linear: Thrust,
    pub rotational: Turn,
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.linear.as_i8(), self.rotational.as_i8())
    }
}

/// Steering decision maker
#[derive(Debug, Clone, Copy)]
pub struct SteeringPolicy {
    tolerance: f64,
}

impl Default for SteeringPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl SteeringPolicy {
    /// `tolerance` is the heading window in radians; its sign is ignored
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.abs(),
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Decide thrust and rotation for heading `theta` spinning at `omega`
    pub fn decide(&self, theta: f64, omega: f64, flow: FlowVector) -> ControlCommand {
        let delta = heading_error(theta, flow);

        // Truncating division: only agreeing signs survive.
        let rotational = Turn::from_sign((sign(delta) + sign(omega)) / 2);

        let linear = if delta.abs() > self.tolerance {
            Thrust::Off
        } else {
            Thrust::On
        };

        ControlCommand { linear, rotational }
    }
}

/// Angle from heading `theta` to the flow direction, folded once into (-π, π].
///
/// Only one 2π correction is applied, so `theta` must already be within a
/// turn of the flow angle.
pub fn heading_error(theta: f64, flow: FlowVector) -> f64 {
    let delta = flow.y.atan2(flow.x) - theta;
    if delta > PI {
        delta - TAU
    } else if delta <= -PI {
        delta + TAU
    } else {
        delta
    }
}

/// Sign as -1, 0 or 1; zero (and NaN) map to 0
fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;
    use std::f64::consts::FRAC_PI_4;

    fn flow(x: f64, y: f64) -> FlowVector {
        FlowVector { x, y }
    }

    /// Heading that produces exactly `delta` against an eastward flow
    fn theta_for(delta: f64) -> f64 {
        -delta
    }

    #[test]
    fn diagonal_flow_from_zero_heading() {
        let delta = heading_error(0.0, flow(1.0, 1.0));
        assert!((delta - FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn heading_error_stays_in_half_open_range() {
        let steps = 64;
        for i in 0..=steps {
            let theta = -PI + TAU * i as f64 / steps as f64;
            for j in 0..steps {
                let angle = TAU * j as f64 / steps as f64;
                let delta = heading_error(theta, flow(angle.cos(), angle.sin()));
                assert!(delta > -PI && delta <= PI, "theta={theta} angle={angle} delta={delta}");
            }
        }
    }

    #[test]
    fn fold_is_applied_once() {
        // flow angle π/2, heading -π => raw delta 3π/2 folds to -π/2
        let delta = heading_error(-PI, flow(0.0, 1.0));
        assert!((delta + FRAC_PI_2).abs() < 1e-12);

        // raw delta exactly -π folds up to +π
        let delta = heading_error(PI, flow(1.0, 0.0));
        assert!((delta - PI).abs() < 1e-12);
    }

    #[test]
    fn zero_flow_points_east() {
        let delta = heading_error(0.5, flow(0.0, 0.0));
        assert!((delta + 0.5).abs() < 1e-12);
    }

    #[test]
    fn north_flow_while_spinning_left() {
        let policy = SteeringPolicy::default();
        let cmd = policy.decide(0.0, 1.0, flow(0.0, 1.0));
        assert_eq!(
            cmd,
            ControlCommand {
                linear: Thrust::Off,
                rotational: Turn::Left
            }
        );
        assert_eq!(cmd.to_string(), "0,1");
    }

    #[test]
    fn disagreeing_signs_never_rotate() {
        let policy = SteeringPolicy::default();
        for &delta in &[0.1, 0.5, 1.0, 2.5] {
            for &omega in &[0.01, 1.0, 7.0] {
                let left = policy.decide(theta_for(delta), -omega, flow(1.0, 0.0));
                assert_eq!(left.rotational, Turn::Hold);
                let right = policy.decide(theta_for(-delta), omega, flow(1.0, 0.0));
                assert_eq!(right.rotational, Turn::Hold);
            }
        }
    }

    #[test]
    fn zero_spin_or_zero_error_holds() {
        let policy = SteeringPolicy::default();
        assert_eq!(policy.decide(-1.0, 0.0, flow(1.0, 0.0)).rotational, Turn::Hold);
        assert_eq!(policy.decide(0.0, 2.0, flow(1.0, 0.0)).rotational, Turn::Hold);
    }

    #[test]
    fn agreeing_signs_rotate_that_way() {
        let policy = SteeringPolicy::default();
        assert_eq!(policy.decide(theta_for(0.3), 0.2, flow(1.0, 0.0)).rotational, Turn::Left);
        assert_eq!(policy.decide(theta_for(-0.3), -0.2, flow(1.0, 0.0)).rotational, Turn::Right);
    }

    #[test]
    fn rotation_is_antisymmetric() {
        let policy = SteeringPolicy::default();
        for &delta in &[-2.0, -0.4, 0.0, 0.4, 2.0] {
            for &omega in &[-1.0, 0.0, 1.0] {
                let a = policy.decide(theta_for(delta), omega, flow(1.0, 0.0));
                let b = policy.decide(theta_for(-delta), -omega, flow(1.0, 0.0));
                assert_eq!(a.rotational.as_i8(), -b.rotational.as_i8());
            }
        }
    }

    #[test]
    fn thrust_only_inside_tolerance() {
        let policy = SteeringPolicy::new(0.5);
        assert_eq!(policy.decide(theta_for(0.49), 0.0, flow(1.0, 0.0)).linear, Thrust::On);
        assert_eq!(policy.decide(theta_for(-0.49), 0.0, flow(1.0, 0.0)).linear, Thrust::On);
        assert_eq!(policy.decide(theta_for(0.51), 0.0, flow(1.0, 0.0)).linear, Thrust::Off);
        assert_eq!(policy.decide(theta_for(-0.51), 0.0, flow(1.0, 0.0)).linear, Thrust::Off);
    }

    #[test]
    fn boundary_counts_as_aligned() {
        let policy = SteeringPolicy::new(0.5);
        assert_eq!(policy.decide(-0.5, 0.0, flow(1.0, 0.0)).linear, Thrust::On);
        assert_eq!(policy.decide(0.5, 0.0, flow(1.0, 0.0)).linear, Thrust::On);
    }

    #[test]
    fn negative_tolerance_uses_magnitude() {
        let policy = SteeringPolicy::new(-0.5);
        assert_eq!(policy.tolerance(), 0.5);
        assert_eq!(policy.decide(theta_for(0.2), 0.0, flow(1.0, 0.0)).linear, Thrust::On);
    }

    #[test]
    fn display_is_linear_then_rotational() {
        let command = ControlCommand {
            linear: Thrust::Off,
            rotational: Turn::Right,
        };
        assert_eq!(command.to_string(), "0,-1");
    }
}

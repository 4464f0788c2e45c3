//! Flow field storage and sampling
//!
//! A map ships with two grids of the same shape, one per vector component.
//! Files are stored top-down (first line is the top row) while world
//! coordinates grow upward from the bottom-left corner, so sampling flips
//! the row index.

use std::path::{Path, PathBuf};

use tracing::debug;

/// One flow vector sampled from the field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowVector {
    pub x: f64,
    pub y: f64,
}

/// Precomputed navigation field for one map
#[derive(Debug, Clone)]
pub struct FlowField {
    rows: usize,
    cols: usize,
    /// Row-major, top-down
    flow_x: Vec<f64>,
    /// Row-major, top-down
    flow_y: Vec<f64>,
}

/// A parsed grid before pairing
#[derive(Debug)]
struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<f64>,
}

impl FlowField {
    /// Build a field from the text of the x and y component files
    pub fn parse(flow_x: &str, flow_y: &str) -> Result<Self, MapDataError> {
        let gx = parse_grid(flow_x, Component::X)?;
        let gy = parse_grid(flow_y, Component::Y)?;

        if gx.rows != gy.rows || gx.cols != gy.cols {
            return Err(MapDataError::ShapeMismatch {
                x: (gx.rows, gx.cols),
                y: (gy.rows, gy.cols),
            });
        }

        Ok(Self {
            rows: gx.rows,
            cols: gx.cols,
            flow_x: gx.cells,
            flow_y: gy.cells,
        })
    }

    /// Load `<map>_flowx` / `<map>_flowy` from `maps_dir`
    ///
    /// Both `.csv` and extension-less file names are accepted; `.csv` wins
    /// when both exist.
    pub async fn load(maps_dir: &Path, map: &str) -> Result<Self, MapDataError> {
        let x_path = resolve(maps_dir, map, Component::X).await?;
        let y_path = resolve(maps_dir, map, Component::Y).await?;

        let x_text = read(&x_path).await?;
        let y_text = read(&y_path).await?;

        let field = Self::parse(&x_text, &y_text)?;
        debug!(
            map = %map,
            rows = field.rows,
            cols = field.cols,
            "Loaded flow field"
        );
        Ok(field)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Sample the field at a world position.
    ///
    /// Coordinates are floored to cell indices; the stored row is
    /// `rows - 1 - floor(y)`.
    pub fn sample(&self, x: f64, y: f64) -> Result<FlowVector, OutOfBounds> {
        let out_of_bounds = OutOfBounds {
            x,
            y,
            rows: self.rows,
            cols: self.cols,
        };

        let col = cell_index(x, self.cols).ok_or(out_of_bounds)?;
        let world_row = cell_index(y, self.rows).ok_or(out_of_bounds)?;
        let row = self.rows - 1 - world_row;

        let idx = row * self.cols + col;
        Ok(FlowVector {
            x: self.flow_x[idx],
            y: self.flow_y[idx],
        })
    }
}

/// Floor a coordinate and check it against `extent`
fn cell_index(v: f64, extent: usize) -> Option<usize> {
    let cell = v.floor();
    if !cell.is_finite() || cell < 0.0 || cell >= extent as f64 {
        return None;
    }
    Some(cell as usize)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    X,
    Y,
}

impl Component {
    fn suffix(self) -> &'static str {
        match self {
            Component::X => "flowx",
            Component::Y => "flowy",
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}

fn parse_grid(text: &str, component: Component) -> Result<Grid, MapDataError> {
    let mut cells = Vec::new();
    let mut cols = None;
    let mut rows = 0;

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let start = cells.len();
        for (col, raw) in line.split_whitespace().enumerate() {
            let value = raw.parse::<f64>().map_err(|_| MapDataError::NotNumeric {
                component,
                row: rows,
                col,
                value: raw.to_string(),
            })?;
            cells.push(value);
        }

        let width = cells.len() - start;
        match cols {
            None => cols = Some(width),
            Some(expected) if expected != width => {
                return Err(MapDataError::Ragged {
                    component,
                    row: rows,
                    expected,
                    found: width,
                });
            }
            Some(_) => {}
        }
        rows += 1;
    }

    match cols {
        Some(cols) if cols > 0 => Ok(Grid { rows, cols, cells }),
        _ => Err(MapDataError::Empty { component }),
    }
}

async fn resolve(maps_dir: &Path, map: &str, component: Component) -> Result<PathBuf, MapDataError> {
    let stem = format!("{}_{}", map, component.suffix());
    let csv = maps_dir.join(format!("{stem}.csv"));
    if tokio::fs::try_exists(&csv).await.unwrap_or(false) {
        return Ok(csv);
    }
    let bare = maps_dir.join(&stem);
    if tokio::fs::try_exists(&bare).await.unwrap_or(false) {
        return Ok(bare);
    }
    Err(MapDataError::Missing { path: csv })
}

async fn read(path: &Path) -> Result<String, MapDataError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| MapDataError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Map data could not be turned into a flow field
#[derive(Debug, thiserror::Error)]
pub enum MapDataError {
    #[error("Map file not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Non-numeric {component} cell {value:?} at row {row}, column {col}")]
    NotNumeric {
        component: Component,
        row: usize,
        col: usize,
        value: String,
    },

    #[error("{component} row {row} has {found} cells, expected {expected}")]
    Ragged {
        component: Component,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{component} grid is empty")]
    Empty { component: Component },

    #[error("Grid shapes differ: flowx is {x:?}, flowy is {y:?}")]
    ShapeMismatch { x: (usize, usize), y: (usize, usize) },
}

/// Sampled position lies outside the grid
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("Position ({x}, {y}) outside {cols}x{rows} flow field")]
pub struct OutOfBounds {
    pub x: f64,
    pub y: f64,
    pub rows: usize,
    pub cols: usize,
}

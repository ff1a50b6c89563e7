use ndarray::Array2;

use crate::{BoardCell, Coord, Coord2, ExperimentError, Result, StateCell, ToNdIndex};

fn decode_rows<T>(rows: &[Vec<i32>], decode: impl Fn(i32) -> Result<T>) -> Result<Array2<T>> {
    let x_len = rows.len();
    let y_len = rows.first().map_or(0, Vec::len);
    if x_len == 0 || y_len == 0 || x_len > Coord::MAX as usize || y_len > Coord::MAX as usize {
        return Err(ExperimentError::InvalidGridShape);
    }

    let mut cells = Vec::with_capacity(x_len * y_len);
    for row in rows {
        if row.len() != y_len {
            return Err(ExperimentError::InvalidGridShape);
        }
        for &code in row {
            cells.push(decode(code)?);
        }
    }

    Array2::from_shape_vec((x_len, y_len), cells).map_err(|_| ExperimentError::InvalidGridShape)
}

fn dims_of<T>(cells: &Array2<T>) -> Coord2 {
    let dim = cells.dim();
    (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
}

fn encode_rows<T: Copy>(cells: &Array2<T>, code: impl Fn(T) -> i32) -> Vec<Vec<i32>> {
    cells
        .outer_iter()
        .map(|row| row.iter().map(|&cell| code(cell)).collect())
        .collect()
}

/// The participant-visible grid for one trial.
#[derive(Clone, Debug, PartialEq)]
pub struct StateGrid {
    cells: Array2<StateCell>,
}

impl StateGrid {
    pub fn from_rows(rows: &[Vec<i32>]) -> Result<Self> {
        Ok(Self {
            cells: decode_rows(rows, StateCell::from_code)?,
        })
    }

    pub fn size(&self) -> Coord2 {
        dims_of(&self.cells)
    }

    pub fn cell_at(&self, coords: Coord2) -> StateCell {
        self.cells[coords.to_nd_index()]
    }

    pub fn cells(&self) -> &Array2<StateCell> {
        &self.cells
    }

    /// Coordinates of the probe marker, if any.
    ///
    /// A well-formed stimulus carries at most one; when several are present
    /// the last one wins.
    pub fn probe_position(&self) -> Option<Coord2> {
        let mut probe = None;
        let mut markers = 0;
        for ((x, y), &cell) in self.cells.indexed_iter() {
            if cell == StateCell::Probe {
                markers += 1;
                probe = Some((x as Coord, y as Coord));
            }
        }
        if markers > 1 {
            log::warn!("state grid carries {markers} probe markers, keeping the last");
        }
        probe
    }

    pub fn to_rows(&self) -> Vec<Vec<i32>> {
        encode_rows(&self.cells, StateCell::code)
    }
}

/// Ground truth for one trial: where the mines actually are.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardGrid {
    cells: Array2<BoardCell>,
}

impl BoardGrid {
    pub fn from_rows(rows: &[Vec<i32>]) -> Result<Self> {
        Ok(Self {
            cells: decode_rows(rows, BoardCell::from_code)?,
        })
    }

    pub fn size(&self) -> Coord2 {
        dims_of(&self.cells)
    }

    pub fn cell_at(&self, coords: Coord2) -> BoardCell {
        self.cells[coords.to_nd_index()]
    }

    pub fn mine_at(&self, coords: Coord2) -> bool {
        self.cell_at(coords).is_mine()
    }

    pub fn to_rows(&self) -> Vec<Vec<i32>> {
        encode_rows(&self.cells, BoardCell::code)
    }
}

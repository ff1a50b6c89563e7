use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExperimentError {
    #[error("Cell value {0} is outside the wire range")]
    InvalidCellCode(i32),
    #[error("Grid is empty, ragged, or larger than the coordinate type allows")]
    InvalidGridShape,
    #[error("Board and state dimensions do not match")]
    SizeMismatch,
}

pub type Result<T> = core::result::Result<T, ExperimentError>;

use thiserror::Error;

use crate::cell::CellError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("could not bucket trace point: {0}")]
    Cell(#[from] CellError),

    #[error("trace {0:?} contains no points")]
    EmptyTrace(String),
}

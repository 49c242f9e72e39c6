use thiserror::Error;

use crate::candidate::IndexError;
use crate::cell::CellError;
use crate::transition::MatchError;

/// Crate-level error, wrapping the error type of each submodule.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Cell(#[from] CellError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Match(#[from] MatchError),
}

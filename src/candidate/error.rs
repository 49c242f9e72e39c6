use thiserror::Error;

use crate::cell::CellError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("feature id {0:?} appears more than once")]
    DuplicateFeature(String),

    #[error("could not bucket feature {id:?}: {source}")]
    Cell {
        id: String,
        #[source]
        source: CellError,
    },
}

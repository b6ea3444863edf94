use thiserror::Error;

/// All errors that can occur in smallworld operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A tuning parameter violates its invariant.
    #[error("invalid parameter '{field}': {reason}")]
    InvalidParameters {
        /// Name of the offending parameter.
        field: String,
        /// Why the value is rejected.
        reason: String,
    },

    /// A query or serialization was attempted before the graph was built.
    #[error("graph has not been built")]
    GraphNotBuilt,

    /// A k-NN query was issued against a graph with zero items.
    #[error("graph contains no items")]
    EmptyGraph,

    /// A snapshot failed checksum or structural validation.
    #[error("corrupt graph snapshot at offset {offset}: {message}")]
    CorruptGraph {
        /// Byte offset where decoding failed.
        offset: u64,
        /// What was wrong at that offset.
        message: String,
    },

    /// The item sequence supplied on restore does not match the snapshot.
    #[error("item count mismatch: snapshot has {expected} nodes, got {got} items")]
    MismatchedItems {
        /// Node count encoded in the snapshot.
        expected: usize,
        /// Length of the caller-supplied item sequence.
        got: usize,
    },
}

impl Error {
    /// Create an invalid-parameter error.
    pub fn invalid_param(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidParameters {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a corruption error.
    pub fn corrupt(offset: u64, message: impl Into<String>) -> Self {
        Error::CorruptGraph {
            offset,
            message: message.into(),
        }
    }
}

/// Result type alias for smallworld operations.
pub type Result<T> = std::result::Result<T, Error>;

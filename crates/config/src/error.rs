//! Config Error Types

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A source could not be read or didn't match the expected shape.
    #[display("could not load configuration")]
    Load,
    /// Every source loaded, but the merged values make no sense together.
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] String),
}

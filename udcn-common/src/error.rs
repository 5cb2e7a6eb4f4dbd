//! Error types for the uDCN packet layer.

use thiserror::Error;

/// Errors that can occur while building or parsing NDN packet types.
#[derive(Error, Debug)]
pub enum Error {
    /// A `Name` could not be parsed from its URI representation.
    #[error("name error: {0}")]
    Name(String),

    /// An NDN packet was malformed or missing a required field.
    #[error("NDN packet error: {0}")]
    NdnPacket(String),

    /// Other errors.
    #[error("other error: {0}")]
    Other(String),
}

use thiserror::Error;

/// Errors produced while decoding a frame or a field within a frame's body.
///
/// A `DecodeError` poisons the *current* packet only: callers that are
/// accumulating results (the listing flow) keep whatever was decoded before
/// the error and move on; callers that need a single answer (the resolve
/// flow) surface it as a failure.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("packet size {size} is below the minimum of 3 bytes")]
    TooSmall { size: u16 },

    #[error("packet size {size} exceeds the maximum of {max} bytes")]
    TooLarge { size: u16, max: u16 },

    #[error("read past end of payload: wanted {wanted} bytes, {available} remaining")]
    UnexpectedEof { wanted: usize, available: usize },

    #[error("zstring missing a NUL terminator before end of payload")]
    UnterminatedString,

    #[error("zstring is not valid UTF-8")]
    InvalidUtf8(#[source] std::str::Utf8Error),
}

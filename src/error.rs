use thiserror::Error;

/// Errors surfaced by the encoders.
///
/// Everything here is recoverable for the next top-level call: a state
/// error drops the offending frame and leaves the encoder usable, a sink
/// error aborts the stream and returns the encoder to idle. Bad palettes
/// and degenerate sizes are not errors at all; they fall back with a
/// logged warning.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// `add_frame` or `finish` was called before `start`; the frame is
    /// dropped.
    #[error("encoder has not been started; frame dropped")]
    NotStarted,

    /// `start` was called while a stream is open.
    #[error("encoder is already started")]
    AlreadyStarted,

    /// The sink rejected a write. The current frame is aborted, the
    /// encoder returns to idle, and the sink is dropped; the caller is
    /// responsible for discarding whatever was partially written.
    #[error("sink write failed: {0}")]
    Write(#[from] std::io::Error),

    /// The PNG encoder rejected the stream.
    #[error("png encode failed: {0}")]
    Png(#[from] png::EncodingError),
}

use thiserror::Error;

/// Main error type for the muxing core
#[derive(Error, Debug)]
pub enum MuxError {
    /// An error reported by the media muxing backend
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// A standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested container format is not supported by the backend
    #[error("No suitable output format found: {0}")]
    UnsupportedFormat(String),

    /// The backend failed to allocate an output context
    #[error("Could not allocate output context for: {0}")]
    ContextAlloc(String),

    /// `init_for_write` was called before a source stream descriptor was captured
    #[error("No source stream config captured")]
    NoSourceStream,

    /// An operation was attempted in the wrong session state
    #[error("Invalid session state: expected {expected}, got {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    /// Byte and timestamp buffers disagree on length; lockstep invariant broken
    #[error("Buffer length mismatch: {bytes} bytes vs {timestamps} timestamps")]
    BufferMismatch { bytes: usize, timestamps: usize },

    /// Session configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors reported by a media muxing backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// Failure adding the output stream to the container context
    #[error("Failed to create stream: {0}")]
    StreamCreate(String),

    /// The codec in the source stream config is not representable in the container
    #[error("Unsupported codec for container: {0}")]
    UnsupportedCodec(String),

    /// Failure opening the output resource
    #[error("Failed to open output resource: {0}")]
    OpenResource(String),

    /// Failure writing the container header
    #[error("Failed to write header: {0}")]
    WriteHeader(String),

    /// Failure writing a single frame to the container
    #[error("Failed to write frame: {0}")]
    WriteFrame(String),

    /// Failure writing the container trailer
    #[error("Failed to write trailer: {0}")]
    WriteTrailer(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, MuxError>;

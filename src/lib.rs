//! Packetizes timestamped network audio into fixed-size frames and muxes
//! them into a playable audio file.
//!
//! The transport delivers one timestamp per packet; the container wants one
//! timestamp per byte. [`WavSession`] reconciles the two: packet records are
//! expanded into per-byte timestamps, buffered bytes are cut into fixed-size
//! [`OutputFrame`]s, and every frame goes to a pluggable [`MuxBackend`].
//! [`WavBackend`] writes real WAV files; the `ffmpeg` feature adds a
//! libavformat-backed `FfmpegBackend`.

pub(crate) mod assembler;
pub(crate) mod backend;
pub(crate) mod buffer;
pub(crate) mod error;
pub(crate) mod session;
pub(crate) mod types;
pub(crate) mod wav;

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;

#[cfg(test)]
pub(crate) mod tests;

pub use backend::MuxBackend;
pub use error::{BackendError, MuxError, Result};
pub use session::{DrainStats, WavSession};
pub use types::{
    CodecId, MediaType, OutputFrame, SampleFormat, SessionState, StreamConfig, TimeBase,
    WriterConfig, DEFAULT_FRAME_SIZE,
};
pub use wav::WavBackend;

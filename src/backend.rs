//! The media muxing backend seam.
//!
//! Everything that touches the container format or storage goes through
//! this trait: the session core never opens files itself. The method set
//! follows the libavformat muxing lifecycle (guess format, allocate
//! context, add stream, open resource, header / frames / trailer, close).

use crate::error::BackendError;
use crate::types::{OutputFrame, StreamConfig};
use std::path::Path;

/// A container muxing backend.
///
/// `Format` is an opaque handle for a resolved container format; `Context`
/// is the live output context bound to one destination. Both are owned by
/// the session between calls.
pub trait MuxBackend {
    type Format;
    type Context;

    /// Resolve a container format by short name ("wav"). `None` when the
    /// backend does not support it.
    fn guess_format(&mut self, name: &str) -> Option<Self::Format>;

    /// Allocate an output context bound to the destination path. `None` on
    /// allocation failure.
    fn allocate_context(&mut self, format: Self::Format, path: &Path) -> Option<Self::Context>;

    /// Add the single output stream, copying parameters from the source
    /// stream config.
    fn new_stream(
        &mut self,
        ctx: &mut Self::Context,
        config: &StreamConfig,
    ) -> Result<(), BackendError>;

    /// Whether the resolved container wants global codec headers.
    fn requires_global_header(&self, ctx: &Self::Context) -> bool;

    /// Open the underlying output resource for writing.
    fn open_resource(&mut self, ctx: &mut Self::Context) -> Result<(), BackendError>;

    /// Write the container header.
    fn write_header(&mut self, ctx: &mut Self::Context) -> Result<(), BackendError>;

    /// Write one assembled frame.
    fn write_frame(
        &mut self,
        ctx: &mut Self::Context,
        frame: &OutputFrame,
    ) -> Result<(), BackendError>;

    /// Write the container trailer.
    fn write_trailer(&mut self, ctx: &mut Self::Context) -> Result<(), BackendError>;

    /// Close the underlying output resource. Infallible by contract;
    /// close failures are the backend's to log.
    fn close_resource(&mut self, ctx: &mut Self::Context);
}

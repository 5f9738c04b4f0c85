//! Mock backends for session tests.
//!
//! `RecordingBackend` captures every backend call so tests can assert on the
//! exact frame sequence without touching the filesystem. Failure injection
//! covers the best-effort write policy.

use crate::backend::MuxBackend;
use crate::error::BackendError;
use crate::types::{OutputFrame, StreamConfig};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Everything a recording context observed, shared with the test body.
#[derive(Debug, Default)]
pub struct Recorded {
    pub path: Option<PathBuf>,
    pub stream: Option<StreamConfig>,
    pub opened: bool,
    pub header_written: bool,
    pub frames: Vec<OutputFrame>,
    pub trailer_written: bool,
    pub closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Nothing,
    GuessFormat,
    NewStream,
    OpenResource,
    WriteHeader,
    /// Fail frame writes whose zero-based submission index is in the set
    Frames,
    WriteTrailer,
}

/// In-memory muxing backend that records calls and injects failures.
pub struct RecordingBackend {
    pub recorded: Rc<RefCell<Recorded>>,
    fail_at: FailAt,
    fail_frames: Vec<usize>,
    submissions: usize,
    pub global_header: bool,
}

pub struct RecordingFormat;

pub struct RecordingContext {
    recorded: Rc<RefCell<Recorded>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            recorded: Rc::new(RefCell::new(Recorded::default())),
            fail_at: FailAt::Nothing,
            fail_frames: Vec::new(),
            submissions: 0,
            global_header: false,
        }
    }

    pub fn failing_at(fail_at: FailAt) -> Self {
        Self {
            fail_at,
            ..Self::new()
        }
    }

    /// Reject the frames at the given zero-based submission indices.
    pub fn failing_frames(indices: &[usize]) -> Self {
        Self {
            fail_at: FailAt::Frames,
            fail_frames: indices.to_vec(),
            ..Self::new()
        }
    }

    pub fn recorded(&self) -> Rc<RefCell<Recorded>> {
        Rc::clone(&self.recorded)
    }
}

impl MuxBackend for RecordingBackend {
    type Format = RecordingFormat;
    type Context = RecordingContext;

    fn guess_format(&mut self, name: &str) -> Option<RecordingFormat> {
        if self.fail_at == FailAt::GuessFormat || name != "wav" {
            return None;
        }
        Some(RecordingFormat)
    }

    fn allocate_context(
        &mut self,
        _format: RecordingFormat,
        path: &Path,
    ) -> Option<RecordingContext> {
        self.recorded.borrow_mut().path = Some(path.to_path_buf());
        Some(RecordingContext {
            recorded: Rc::clone(&self.recorded),
        })
    }

    fn new_stream(
        &mut self,
        ctx: &mut RecordingContext,
        config: &StreamConfig,
    ) -> Result<(), BackendError> {
        if self.fail_at == FailAt::NewStream {
            return Err(BackendError::StreamCreate("injected".to_string()));
        }
        ctx.recorded.borrow_mut().stream = Some(config.clone());
        Ok(())
    }

    fn requires_global_header(&self, _ctx: &RecordingContext) -> bool {
        self.global_header
    }

    fn open_resource(&mut self, ctx: &mut RecordingContext) -> Result<(), BackendError> {
        if self.fail_at == FailAt::OpenResource {
            return Err(BackendError::OpenResource("injected".to_string()));
        }
        ctx.recorded.borrow_mut().opened = true;
        Ok(())
    }

    fn write_header(&mut self, ctx: &mut RecordingContext) -> Result<(), BackendError> {
        if self.fail_at == FailAt::WriteHeader {
            return Err(BackendError::WriteHeader("injected".to_string()));
        }
        ctx.recorded.borrow_mut().header_written = true;
        Ok(())
    }

    fn write_frame(
        &mut self,
        ctx: &mut RecordingContext,
        frame: &OutputFrame,
    ) -> Result<(), BackendError> {
        let index = self.submissions;
        self.submissions += 1;
        if self.fail_at == FailAt::Frames && self.fail_frames.contains(&index) {
            return Err(BackendError::WriteFrame("injected".to_string()));
        }
        ctx.recorded.borrow_mut().frames.push(frame.clone());
        Ok(())
    }

    fn write_trailer(&mut self, ctx: &mut RecordingContext) -> Result<(), BackendError> {
        if self.fail_at == FailAt::WriteTrailer {
            return Err(BackendError::WriteTrailer("injected".to_string()));
        }
        ctx.recorded.borrow_mut().trailer_written = true;
        Ok(())
    }

    fn close_resource(&mut self, ctx: &mut RecordingContext) {
        ctx.recorded.borrow_mut().closed = true;
    }
}

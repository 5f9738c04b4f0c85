//! Writer session: lifecycle state machine, packetization, finalization.

use crate::assembler;
use crate::backend::MuxBackend;
use crate::buffer::{PacketQueue, SampleBuffer};
use crate::error::{MuxError, Result};
use crate::types::{OutputFrame, SessionState, StreamConfig, WriterConfig};

/// Per-call frame accounting. Frame write failures are swallowed by policy
/// (the stream keeps going), so they surface here instead of as errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Frames accepted by the backend
    pub written: usize,
    /// Frames the backend rejected; logged and skipped
    pub failed: usize,
}

impl DrainStats {
    fn merge(&mut self, other: DrainStats) {
        self.written += other.written;
        self.failed += other.failed;
    }
}

/// One write session: buffers packets from a single audio source and muxes
/// them into one output file through a [`MuxBackend`].
///
/// Single-threaded by design; callers with multiple producers must
/// serialize access externally.
pub struct WavSession<B: MuxBackend> {
    backend: B,
    config: WriterConfig,
    source: Option<StreamConfig>,
    state: SessionState,
    ctx: Option<B::Context>,
    file_open: bool,
    packets: PacketQueue,
    samples: SampleBuffer,
    frames_written: u64,
    frames_failed: u64,
}

impl<B: MuxBackend> WavSession<B> {
    pub fn new(backend: B, config: WriterConfig) -> Self {
        Self {
            backend,
            config,
            source: None,
            state: SessionState::Closed,
            ctx: None,
            file_open: false,
            packets: PacketQueue::new(),
            samples: SampleBuffer::new(),
            frames_written: 0,
            frames_failed: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Total frames the backend accepted over the session.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Total frames the backend rejected over the session.
    pub fn frames_failed(&self) -> u64 {
        self.frames_failed
    }

    /// Record the source stream descriptor the output stream will be copied
    /// from. Must happen before [`init_for_write`](Self::init_for_write).
    pub fn capture_stream_config(&mut self, config: StreamConfig) -> Result<()> {
        if self.state != SessionState::Closed {
            return Err(self.state_error("Closed"));
        }
        self.source = Some(config);
        Ok(())
    }

    /// Open the session for writing.
    ///
    /// Runs the full setup chain: resolve the container format, allocate
    /// the output context, copy the source stream parameters onto a new
    /// output stream, propagate global-header requirements, open the
    /// resource and write the container header. Each step is a hard
    /// precondition for the next; any failure rolls the session back to
    /// `Closed` with no context retained.
    pub fn init_for_write(&mut self) -> Result<()> {
        if self.state != SessionState::Closed {
            return Err(self.state_error("Closed"));
        }
        self.state = SessionState::Configuring;

        match self.try_init() {
            Ok(ctx) => {
                self.ctx = Some(ctx);
                self.file_open = true;
                self.state = SessionState::Open;
                tracing::debug!(
                    path = %self.config.path.display(),
                    container = %self.config.container,
                    frame_size = self.config.frame_size,
                    "session open for write"
                );
                Ok(())
            }
            Err(e) => {
                self.ctx = None;
                self.file_open = false;
                self.state = SessionState::Closed;
                Err(e)
            }
        }
    }

    fn try_init(&mut self) -> Result<B::Context> {
        if self.config.frame_size == 0 {
            return Err(MuxError::Config("frame_size must be non-zero".to_string()));
        }

        let format = self
            .backend
            .guess_format(&self.config.container)
            .ok_or_else(|| MuxError::UnsupportedFormat(self.config.container.clone()))?;

        let mut ctx = self
            .backend
            .allocate_context(format, &self.config.path)
            .ok_or_else(|| MuxError::ContextAlloc(self.config.path.display().to_string()))?;

        let mut stream = self.source.clone().ok_or(MuxError::NoSourceStream)?;
        if self.backend.requires_global_header(&ctx) {
            stream.global_header = true;
        }
        self.backend.new_stream(&mut ctx, &stream)?;
        self.source = Some(stream);

        self.backend.open_resource(&mut ctx)?;
        self.backend.write_header(&mut ctx)?;
        Ok(ctx)
    }

    /// Buffer one arrived packet: its receiver-clock timestamp and payload.
    ///
    /// Header record, length record and payload bytes are enqueued in
    /// lockstep; expansion into per-byte timestamps happens on the next
    /// [`packetize_from_queue`](Self::packetize_from_queue) call.
    pub fn push_packet(&mut self, timestamp: i64, payload: &[u8]) -> Result<()> {
        if self.state != SessionState::Open {
            return Err(self.state_error("Open"));
        }
        self.packets.push(timestamp, payload.len());
        self.samples.push_bytes(payload);
        Ok(())
    }

    /// Expand queued packets and write every full frame to the backend.
    ///
    /// A frame write failure is logged and counted but never interrupts the
    /// stream; the next frame is attempted regardless. Returns the per-call
    /// accounting. Control returns once fewer than `frame_size` bytes
    /// remain buffered.
    pub fn packetize_from_queue(&mut self) -> Result<DrainStats> {
        if self.state != SessionState::Open {
            return Err(self.state_error("Open"));
        }
        self.packets.expand_into(&mut self.samples);

        let mut stats = DrainStats::default();
        while let Some(frame) = assembler::next_frame(&mut self.samples, self.config.frame_size) {
            stats.merge(self.submit(&frame));
        }
        Ok(stats)
    }

    /// Flush the remaining partial frame, write the trailer and close the
    /// output.
    ///
    /// Pending packets are expanded first so nothing pushed is lost. The
    /// trailer write and resource close are best-effort: their failures are
    /// logged, and the session reaches `Finalized` unconditionally. Calling
    /// this on an already-finalized session is an error, not a re-run.
    pub fn finalize(&mut self) -> Result<DrainStats> {
        // Also guards re-entry: a second call sees `Finalized` and is
        // rejected without touching the trailer again.
        if self.state != SessionState::Open {
            return Err(self.state_error("Open"));
        }

        self.packets.expand_into(&mut self.samples);

        let mut stats = DrainStats::default();
        let remainder = assembler::final_frame(&mut self.samples);

        if let Some(mut ctx) = self.ctx.take() {
            match &remainder {
                Ok(Some(frame)) => stats.merge(self.submit_to(&mut ctx, frame)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "skipping final frame");
                }
            }

            if let Err(e) = self.backend.write_trailer(&mut ctx) {
                tracing::warn!(error = %e, "trailer write failed");
            }
            if self.file_open {
                self.backend.close_resource(&mut ctx);
                self.file_open = false;
            }
        }

        self.state = SessionState::Finalized;
        tracing::debug!(
            written = self.frames_written,
            failed = self.frames_failed,
            "session finalized"
        );

        // A buffer mismatch is still reported to the caller, after the
        // best-effort teardown above.
        remainder?;
        Ok(stats)
    }

    fn submit(&mut self, frame: &OutputFrame) -> DrainStats {
        if let Some(mut ctx) = self.ctx.take() {
            let stats = self.submit_to(&mut ctx, frame);
            self.ctx = Some(ctx);
            stats
        } else {
            DrainStats::default()
        }
    }

    fn submit_to(&mut self, ctx: &mut B::Context, frame: &OutputFrame) -> DrainStats {
        match self.backend.write_frame(ctx, frame) {
            Ok(()) => {
                self.frames_written += 1;
                DrainStats {
                    written: 1,
                    failed: 0,
                }
            }
            Err(e) => {
                self.frames_failed += 1;
                tracing::warn!(pts = frame.pts, len = frame.data.len(), error = %e, "frame write failed");
                DrainStats {
                    written: 0,
                    failed: 1,
                }
            }
        }
    }

    fn state_error(&self, expected: &'static str) -> MuxError {
        MuxError::InvalidState {
            expected,
            actual: self.state.name(),
        }
    }

    /// Bytes currently buffered and not yet framed.
    pub fn buffered_bytes(&self) -> usize {
        self.samples.len()
    }

    /// Packets pushed but not yet expanded.
    pub fn pending_packets(&self) -> usize {
        self.packets.len()
    }
}

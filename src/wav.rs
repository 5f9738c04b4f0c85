//! Pure-Rust WAV container backend built on `hound`.
//!
//! Covers the linear PCM codecs; companded codecs (mu-law/a-law) need the
//! libavformat backend from the `ffmpeg` feature, since hound only writes
//! linear PCM.

use crate::backend::MuxBackend;
use crate::error::BackendError;
use crate::types::{CodecId, OutputFrame, StreamConfig};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// WAV muxing backend.
#[derive(Debug, Default)]
pub struct WavBackend;

impl WavBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Resolved format handle. Only "wav" is ever resolved.
#[derive(Debug, Clone, Copy)]
pub struct WavFormat;

/// Live output context for one destination file.
pub struct WavContext {
    path: PathBuf,
    spec: Option<hound::WavSpec>,
    codec: Option<CodecId>,
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    /// Dangling low byte of a 16-bit sample split across frame boundaries.
    carry: Option<u8>,
}

impl MuxBackend for WavBackend {
    type Format = WavFormat;
    type Context = WavContext;

    fn guess_format(&mut self, name: &str) -> Option<WavFormat> {
        match name {
            "wav" | "wave" => Some(WavFormat),
            _ => None,
        }
    }

    fn allocate_context(&mut self, _format: WavFormat, path: &Path) -> Option<WavContext> {
        Some(WavContext {
            path: path.to_path_buf(),
            spec: None,
            codec: None,
            writer: None,
            carry: None,
        })
    }

    fn new_stream(
        &mut self,
        ctx: &mut WavContext,
        config: &StreamConfig,
    ) -> Result<(), BackendError> {
        let bits_per_sample = match config.codec_id {
            CodecId::PcmU8 => 8,
            CodecId::PcmS16le => 16,
            CodecId::PcmMulaw | CodecId::PcmAlaw => {
                return Err(BackendError::UnsupportedCodec(format!(
                    "{:?}: hound writes linear PCM only",
                    config.codec_id
                )));
            }
        };
        ctx.spec = Some(hound::WavSpec {
            channels: config.channels,
            sample_rate: config.sample_rate,
            bits_per_sample,
            sample_format: hound::SampleFormat::Int,
        });
        ctx.codec = Some(config.codec_id);
        Ok(())
    }

    fn requires_global_header(&self, _ctx: &WavContext) -> bool {
        false
    }

    fn open_resource(&mut self, ctx: &mut WavContext) -> Result<(), BackendError> {
        let spec = ctx
            .spec
            .ok_or_else(|| BackendError::OpenResource("no stream configured".to_string()))?;
        let writer = hound::WavWriter::create(&ctx.path, spec)
            .map_err(|e| BackendError::OpenResource(e.to_string()))?;
        ctx.writer = Some(writer);
        Ok(())
    }

    fn write_header(&mut self, ctx: &mut WavContext) -> Result<(), BackendError> {
        // hound writes the RIFF/fmt chunks when the writer is created; the
        // header step only verifies the resource is actually open.
        if ctx.writer.is_none() {
            return Err(BackendError::WriteHeader("resource not open".to_string()));
        }
        Ok(())
    }

    fn write_frame(
        &mut self,
        ctx: &mut WavContext,
        frame: &OutputFrame,
    ) -> Result<(), BackendError> {
        let codec = ctx
            .codec
            .ok_or_else(|| BackendError::WriteFrame("no stream configured".to_string()))?;
        let writer = ctx
            .writer
            .as_mut()
            .ok_or_else(|| BackendError::WriteFrame("resource not open".to_string()))?;

        match codec {
            CodecId::PcmU8 => {
                for &b in frame.data.iter() {
                    // WAV 8-bit PCM is unsigned with midpoint 128; hound
                    // takes i8 and re-biases on write.
                    let s = b.wrapping_sub(128) as i8;
                    writer
                        .write_sample(s)
                        .map_err(|e| BackendError::WriteFrame(e.to_string()))?;
                }
            }
            CodecId::PcmS16le => {
                let mut iter = ctx.carry.take().into_iter().chain(frame.data.iter().copied());
                loop {
                    let Some(lo) = iter.next() else { break };
                    let Some(hi) = iter.next() else {
                        ctx.carry = Some(lo);
                        break;
                    };
                    writer
                        .write_sample(i16::from_le_bytes([lo, hi]))
                        .map_err(|e| BackendError::WriteFrame(e.to_string()))?;
                }
            }
            CodecId::PcmMulaw | CodecId::PcmAlaw => {
                return Err(BackendError::UnsupportedCodec(format!("{:?}", codec)));
            }
        }
        Ok(())
    }

    fn write_trailer(&mut self, ctx: &mut WavContext) -> Result<(), BackendError> {
        if let Some(b) = ctx.carry.take() {
            tracing::warn!("dropping dangling low byte 0x{:02x} of a split 16-bit sample", b);
        }
        match ctx.writer.take() {
            Some(writer) => writer
                .finalize()
                .map_err(|e| BackendError::WriteTrailer(e.to_string())),
            None => Ok(()),
        }
    }

    fn close_resource(&mut self, ctx: &mut WavContext) {
        // Trailer writing already consumed the writer on the happy path;
        // dropping here lets hound patch the RIFF sizes best-effort.
        ctx.writer = None;
    }
}

//! libavformat muxing backend.
//!
//! `ffmpeg-next` exposes no safe path for building an output context from
//! scratch (without an input file), so this module talks to the FFI layer
//! directly. All `unsafe` blocks are contained here with explicit safety
//! arguments; callers never touch raw pointers.

use crate::backend::MuxBackend;
use crate::error::BackendError;
use crate::types::{CodecId, MediaType, OutputFrame, SampleFormat, StreamConfig};
use ffmpeg_next as ffmpeg;
use ffmpeg_next::ffi;
use std::ffi::CString;
use std::path::{Path, PathBuf};

/// Muxing backend over libavformat.
pub struct FfmpegBackend;

impl FfmpegBackend {
    pub fn new() -> Result<Self, BackendError> {
        ffmpeg::init().map_err(|e| BackendError::OpenResource(format!("ffmpeg init: {e}")))?;
        Ok(Self)
    }
}

/// Resolved `AVOutputFormat`. Registry pointers are static for the process
/// lifetime once `ffmpeg::init()` has run.
pub struct FfmpegFormat {
    oformat: *const ffi::AVOutputFormat,
}

/// Owned `AVFormatContext` bound to one destination.
pub struct FfmpegContext {
    ctx: *mut ffi::AVFormatContext,
    path: PathBuf,
    io_open: bool,
}

impl Drop for FfmpegContext {
    fn drop(&mut self) {
        // SAFETY: `ctx` is either null or a context we allocated and still
        // own. Closing a null/already-closed pb is a no-op for avio_closep.
        unsafe {
            if !self.ctx.is_null() {
                if self.io_open {
                    ffi::avio_closep(&mut (*self.ctx).pb);
                }
                ffi::avformat_free_context(self.ctx);
                self.ctx = std::ptr::null_mut();
            }
        }
    }
}

fn codec_id(id: CodecId) -> ffi::AVCodecID {
    match id {
        CodecId::PcmMulaw => ffi::AVCodecID::AV_CODEC_ID_PCM_MULAW,
        CodecId::PcmAlaw => ffi::AVCodecID::AV_CODEC_ID_PCM_ALAW,
        CodecId::PcmU8 => ffi::AVCodecID::AV_CODEC_ID_PCM_U8,
        CodecId::PcmS16le => ffi::AVCodecID::AV_CODEC_ID_PCM_S16LE,
    }
}

fn media_type(t: MediaType) -> ffi::AVMediaType {
    match t {
        MediaType::Audio => ffi::AVMediaType::AVMEDIA_TYPE_AUDIO,
    }
}

fn sample_format(f: SampleFormat) -> ffi::AVSampleFormat {
    match f {
        SampleFormat::U8 => ffi::AVSampleFormat::AV_SAMPLE_FMT_U8,
        SampleFormat::S16 => ffi::AVSampleFormat::AV_SAMPLE_FMT_S16,
    }
}

fn path_cstring(path: &Path) -> Result<CString, BackendError> {
    CString::new(path.to_string_lossy().as_bytes())
        .map_err(|_| BackendError::OpenResource("path contains a NUL byte".to_string()))
}

impl MuxBackend for FfmpegBackend {
    type Format = FfmpegFormat;
    type Context = FfmpegContext;

    fn guess_format(&mut self, name: &str) -> Option<FfmpegFormat> {
        let name = CString::new(name).ok()?;
        // SAFETY: av_guess_format reads the static muxer registry; the
        // returned pointer is valid for the process lifetime or null.
        let oformat =
            unsafe { ffi::av_guess_format(name.as_ptr(), std::ptr::null(), std::ptr::null()) };
        if oformat.is_null() {
            None
        } else {
            Some(FfmpegFormat { oformat })
        }
    }

    fn allocate_context(&mut self, format: FfmpegFormat, path: &Path) -> Option<FfmpegContext> {
        // SAFETY: avformat_alloc_context returns an owned context or null.
        // `oformat` and `url` are fields we are expected to fill before
        // writing; `url` must be av_malloc'd, which av_strdup guarantees.
        unsafe {
            let ctx = ffi::avformat_alloc_context();
            if ctx.is_null() {
                return None;
            }
            (*ctx).oformat = format.oformat;

            let url = match path_cstring(path) {
                Ok(c) => c,
                Err(_) => {
                    ffi::avformat_free_context(ctx);
                    return None;
                }
            };
            (*ctx).url = ffi::av_strdup(url.as_ptr());

            Some(FfmpegContext {
                ctx,
                path: path.to_path_buf(),
                io_open: false,
            })
        }
    }

    fn new_stream(
        &mut self,
        ctx: &mut FfmpegContext,
        config: &StreamConfig,
    ) -> Result<(), BackendError> {
        // SAFETY: `ctx.ctx` is a live context we own. avformat_new_stream
        // attaches the stream to the context, which keeps ownership; its
        // codecpar is allocated by the call and non-null on success.
        unsafe {
            let stream = ffi::avformat_new_stream(ctx.ctx, std::ptr::null());
            if stream.is_null() {
                return Err(BackendError::StreamCreate(
                    "avformat_new_stream returned null".to_string(),
                ));
            }

            let par = (*stream).codecpar;
            (*par).codec_id = codec_id(config.codec_id);
            (*par).codec_type = media_type(config.media_type);
            (*par).format = sample_format(config.sample_format) as i32;
            (*par).bit_rate = config.bit_rate as i64;
            (*par).sample_rate = config.sample_rate as i32;
            ffi::av_channel_layout_default(&mut (*par).ch_layout, i32::from(config.channels));

            (*stream).time_base = ffi::AVRational {
                num: config.time_base.num,
                den: config.time_base.den,
            };
        }
        Ok(())
    }

    fn requires_global_header(&self, ctx: &FfmpegContext) -> bool {
        // SAFETY: `oformat` was set at allocation and points into the
        // static registry; `flags` is a plain int field.
        unsafe {
            let oformat = (*ctx.ctx).oformat;
            !oformat.is_null() && ((*oformat).flags & ffi::AVFMT_GLOBALHEADER as i32) != 0
        }
    }

    fn open_resource(&mut self, ctx: &mut FfmpegContext) -> Result<(), BackendError> {
        // SAFETY: pb is null before the first open; avio_open fills it on
        // success and leaves it untouched on failure. Formats flagged
        // AVFMT_NOFILE carry their own I/O and must not get a pb.
        unsafe {
            let oformat = (*ctx.ctx).oformat;
            if !oformat.is_null() && ((*oformat).flags & ffi::AVFMT_NOFILE as i32) != 0 {
                return Ok(());
            }
            let url = path_cstring(&ctx.path)?;
            let ret = ffi::avio_open(&mut (*ctx.ctx).pb, url.as_ptr(), ffi::AVIO_FLAG_WRITE as i32);
            if ret < 0 {
                return Err(BackendError::OpenResource(format!(
                    "avio_open({}) failed: {ret}",
                    ctx.path.display()
                )));
            }
            ctx.io_open = true;
        }
        Ok(())
    }

    fn write_header(&mut self, ctx: &mut FfmpegContext) -> Result<(), BackendError> {
        // SAFETY: context has a stream and an open pb at this point in the
        // lifecycle; a null options dict is allowed.
        let ret = unsafe { ffi::avformat_write_header(ctx.ctx, std::ptr::null_mut()) };
        if ret < 0 {
            return Err(BackendError::WriteHeader(format!(
                "avformat_write_header failed: {ret}"
            )));
        }
        Ok(())
    }

    fn write_frame(
        &mut self,
        ctx: &mut FfmpegContext,
        frame: &OutputFrame,
    ) -> Result<(), BackendError> {
        // SAFETY: av_new_packet allocates a refcounted buffer of the exact
        // size; we copy the frame bytes in and hand the packet to the
        // muxer, then free our reference regardless of the outcome.
        unsafe {
            let mut pkt = ffi::av_packet_alloc();
            if pkt.is_null() {
                return Err(BackendError::WriteFrame(
                    "av_packet_alloc returned null".to_string(),
                ));
            }
            if ffi::av_new_packet(pkt, frame.data.len() as i32) < 0 {
                ffi::av_packet_free(&mut pkt);
                return Err(BackendError::WriteFrame(
                    "av_new_packet failed".to_string(),
                ));
            }
            std::ptr::copy_nonoverlapping(frame.data.as_ptr(), (*pkt).data, frame.data.len());
            (*pkt).pts = frame.pts;
            (*pkt).dts = frame.dts();
            (*pkt).stream_index = 0;

            let ret = ffi::av_interleaved_write_frame(ctx.ctx, pkt);
            ffi::av_packet_free(&mut pkt);
            if ret != 0 {
                return Err(BackendError::WriteFrame(format!(
                    "av_interleaved_write_frame failed: {ret}"
                )));
            }
        }
        Ok(())
    }

    fn write_trailer(&mut self, ctx: &mut FfmpegContext) -> Result<(), BackendError> {
        // SAFETY: only legal after a successful write_header, which the
        // session lifecycle guarantees.
        let ret = unsafe { ffi::av_write_trailer(ctx.ctx) };
        if ret < 0 {
            return Err(BackendError::WriteTrailer(format!(
                "av_write_trailer failed: {ret}"
            )));
        }
        Ok(())
    }

    fn close_resource(&mut self, ctx: &mut FfmpegContext) {
        // SAFETY: avio_closep nulls pb, making a later Drop close a no-op.
        unsafe {
            if ctx.io_open {
                ffi::avio_closep(&mut (*ctx.ctx).pb);
                ctx.io_open = false;
            }
        }
    }
}

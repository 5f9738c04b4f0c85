use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default output frame granularity in bytes.
pub const DEFAULT_FRAME_SIZE: usize = 512;

/// Codec of the raw audio payload carried by the incoming packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodecId {
    PcmMulaw,
    PcmAlaw,
    PcmU8,
    PcmS16le,
}

/// Media type of the stream. Only audio is meaningful for this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Audio,
}

/// Sample format of the decoded output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleFormat {
    U8,
    S16,
}

impl SampleFormat {
    pub fn bits_per_sample(self) -> u16 {
        match self {
            SampleFormat::U8 => 8,
            SampleFormat::S16 => 16,
        }
    }
}

/// Rational time base: `num/den` seconds per timestamp tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBase {
    pub num: i32,
    pub den: i32,
}

impl TimeBase {
    pub fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// Seconds per tick as a float.
    pub fn as_secs_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

/// Stream parameters copied from the source stream descriptor at session
/// start. Immutable once the session is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub codec_id: CodecId,
    pub media_type: MediaType,
    pub sample_format: SampleFormat,
    pub bit_rate: u64,
    pub sample_rate: u32,
    pub channels: u16,
    pub time_base: TimeBase,
    /// Set during session init when the container requires global headers.
    #[serde(default)]
    pub global_header: bool,
}

impl StreamConfig {
    /// Standard narrowband telephony stream: mu-law, 64 kbit/s, 8 kHz, mono.
    pub fn mulaw_8k() -> Self {
        Self {
            codec_id: CodecId::PcmMulaw,
            media_type: MediaType::Audio,
            sample_format: SampleFormat::S16,
            bit_rate: 64_000,
            sample_rate: 8_000,
            channels: 1,
            time_base: TimeBase::new(1, 8_000),
            global_header: false,
        }
    }

    /// Linear 16-bit PCM at the given sample rate, mono.
    pub fn pcm_s16(sample_rate: u32) -> Self {
        Self {
            codec_id: CodecId::PcmS16le,
            media_type: MediaType::Audio,
            sample_format: SampleFormat::S16,
            bit_rate: u64::from(sample_rate) * 16,
            sample_rate,
            channels: 1,
            time_base: TimeBase::new(1, sample_rate as i32),
            global_header: false,
        }
    }
}

/// One assembled output frame: a block of payload bytes tagged with the
/// timestamp of its first byte. `dts == pts` for raw audio.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFrame {
    pub data: Bytes,
    pub pts: i64,
}

impl OutputFrame {
    pub fn dts(&self) -> i64 {
        self.pts
    }
}

/// Lifecycle state of a writer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Configuring,
    Open,
    Finalized,
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Closed => "Closed",
            SessionState::Configuring => "Configuring",
            SessionState::Open => "Open",
            SessionState::Finalized => "Finalized",
        }
    }
}

/// Session configuration: where to write and at which frame granularity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Destination file path
    pub path: PathBuf,
    /// Container short name, e.g. "wav"
    pub container: String,
    /// Output frame granularity in bytes
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,
}

fn default_frame_size() -> usize {
    DEFAULT_FRAME_SIZE
}

impl WriterConfig {
    pub fn wav(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            container: "wav".to_string(),
            frame_size: DEFAULT_FRAME_SIZE,
        }
    }
}

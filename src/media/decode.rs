use std::io::Cursor;

use hound::{SampleFormat, WavReader};
use tracing::debug;

use crate::error::{Error, Result};

/// Fully decoded stereo audio. Mono files are duplicated onto both channels.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        self.left.len().min(self.right.len())
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate.max(1) as f64
    }
}

/// Decode WAV bytes (integer or float PCM) into normalized stereo.
///
/// Channels beyond the first two are dropped.
pub fn decode(bytes: &[u8]) -> Result<DecodedAudio> {
    let fail = |err: hound::Error| Error::DecodeFailure(err.to_string());
    let mut reader = WavReader::new(Cursor::new(bytes)).map_err(fail)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels);
    if channels == 0 {
        return Err(Error::DecodeFailure("no channels".into()));
    }

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(fail)?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(fail)?
        }
    };

    let frames = samples.len() / channels;
    if frames == 0 {
        return Err(Error::DecodeFailure("no audio frames".into()));
    }

    let mut left = Vec::with_capacity(frames);
    let mut right = Vec::with_capacity(frames);
    for frame in samples.chunks_exact(channels) {
        left.push(frame[0]);
        right.push(frame.get(1).copied().unwrap_or(frame[0]));
    }

    debug!(
        sample_rate = spec.sample_rate,
        channels,
        frames,
        "decoded wav"
    );
    Ok(DecodedAudio {
        sample_rate: spec.sample_rate,
        left,
        right,
    })
}

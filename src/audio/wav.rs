//! WAV file loading and writing for recorded or synthesized practice takes.

use std::path::Path;

use crate::audio::AudioBuffer;
use crate::error::AudioError;

/// Read a WAV file into a mono [`AudioBuffer`], averaging channels when needed.
///
/// Supports float and 16/24/32-bit integer PCM.
pub fn read_wav(path: &Path) -> Result<AudioBuffer, AudioError> {
    let mut reader = hound::WavReader::open(path).map_err(|err| AudioError::FileOpen {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AudioError::UnsupportedFormat {
            reason: format!("{} has zero channels", path.display()),
        });
    }

    let decode_err = |err: hound::Error| AudioError::Decode {
        reason: format!("error reading {}: {err}", path.display()),
    };

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map_err(decode_err))
            .collect::<Result<Vec<f32>, _>>()?,
        hound::SampleFormat::Int => match spec.bits_per_sample {
            16 => reader
                .samples::<i16>()
                .map(|sample| sample.map(|v| v as f32 / i16::MAX as f32).map_err(decode_err))
                .collect::<Result<Vec<f32>, _>>()?,
            24 => reader
                .samples::<i32>()
                .map(|sample| {
                    sample
                        .map(|v| v as f32 / 8_388_607.0)
                        .map_err(decode_err)
                })
                .collect::<Result<Vec<f32>, _>>()?,
            32 => reader
                .samples::<i32>()
                .map(|sample| sample.map(|v| v as f32 / i32::MAX as f32).map_err(decode_err))
                .collect::<Result<Vec<f32>, _>>()?,
            bits => {
                return Err(AudioError::UnsupportedFormat {
                    reason: format!(
                        "unsupported bits_per_sample={} for {}",
                        bits,
                        path.display()
                    ),
                })
            }
        },
    };

    AudioBuffer::from_interleaved(&samples, spec.sample_rate, spec.channels).map_err(|err| {
        AudioError::UnsupportedFormat {
            reason: err.to_string(),
        }
    })
}

/// Write a mono buffer as 16-bit PCM, clamping samples to [-1.0, 1.0].
pub fn write_wav(path: &Path, buffer: &AudioBuffer) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(|err| AudioError::FileOpen {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;

    for &sample in buffer.samples() {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        writer.write_sample(value).map_err(|err| AudioError::Encode {
            reason: err.to_string(),
        })?;
    }

    writer.finalize().map_err(|err| AudioError::Encode {
        reason: err.to_string(),
    })
}

//! AudioBuffer - immutable mono PCM handed over by the capture layer

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Normalized mono samples plus the metadata needed to interpret them.
///
/// The sample rate is always read from here; the analyzer never assumes a
/// fixed device rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    /// Wrap mono samples in the range [-1.0, 1.0]
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Build a mono buffer from interleaved frames by averaging channels
    ///
    /// Fails when the sample count is not a whole number of frames.
    pub fn from_interleaved(
        samples: &[f32],
        sample_rate: u32,
        channels: u16,
    ) -> Result<Self, AnalysisError> {
        match channels {
            0 => Err(AnalysisError::invalid("channel count must be at least 1")),
            1 => Ok(Self::mono(samples.to_vec(), sample_rate)),
            n => {
                let n = n as usize;
                if samples.len() % n != 0 {
                    return Err(AnalysisError::invalid(format!(
                        "{} interleaved samples is not a whole number of {}-channel frames",
                        samples.len(),
                        n
                    )));
                }
                let mono = samples
                    .chunks_exact(n)
                    .map(|frame| frame.iter().sum::<f32>() / n as f32)
                    .collect();
                Ok(Self::mono(mono, sample_rate))
            }
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Reject buffers that violate the capture contract
    ///
    /// Out-of-range amplitudes are tolerated (clipped captures happen);
    /// non-finite samples are not.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.samples.is_empty() {
            return Err(AnalysisError::invalid("audio buffer is empty"));
        }
        if self.sample_rate == 0 {
            return Err(AnalysisError::invalid("sample rate must be > 0"));
        }
        if self.channels != 1 {
            return Err(AnalysisError::invalid(format!(
                "expected mono audio, got {} channels",
                self.channels
            )));
        }
        if let Some(index) = self.samples.iter().position(|s| !s.is_finite()) {
            return Err(AnalysisError::invalid(format!(
                "non-finite sample at index {}",
                index
            )));
        }
        Ok(())
    }
}

// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Sample-rate conversion between the carrier's 8 kHz mu-law domain and the
//! realtime model's 24 kHz PCM16 domain.
//!
//! Mirrors the `RateConverter` pattern used elsewhere in this codebase's
//! audio pipeline: a band-limited polynomial resampler from `rubato`,
//! falling back to zero-copy passthrough when rates already match, with an
//! internal accumulation buffer so callers may feed arbitrarily sized
//! chunks.

use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResampleError {
    #[error("failed to initialize resampler: {0}")]
    Init(String),
}

/// Converts mono f32 audio from one fixed sample rate to another.
pub struct RateConverter {
    resampler: Option<FastFixedIn<f32>>,
    input_buf: Vec<f32>,
    chunk_size: usize,
    output_buf: Vec<Vec<f32>>,
}

impl RateConverter {
    /// `chunk_size` is the input-frame count rubato processes per call, e.g.
    /// 160 for 20 ms at 8 kHz.
    pub fn new(from_rate: u32, to_rate: u32, chunk_size: usize) -> Result<Self, ResampleError> {
        if from_rate == to_rate {
            return Ok(Self {
                resampler: None,
                input_buf: Vec::new(),
                chunk_size,
                output_buf: Vec::new(),
            });
        }

        let ratio = to_rate as f64 / from_rate as f64;
        let resampler = FastFixedIn::<f32>::new(ratio, 1.0, PolynomialDegree::Cubic, chunk_size, 1)
            .map_err(|e| ResampleError::Init(e.to_string()))?;

        let max_out = resampler.output_frames_max();
        let output_buf = vec![vec![0f32; max_out]; 1];

        Ok(Self {
            resampler: Some(resampler),
            input_buf: Vec::new(),
            chunk_size,
            output_buf,
        })
    }

    /// Resample PCM16 samples, returning resampled PCM16 output (may be
    /// empty — accumulation waits for a full internal chunk).
    pub fn process_i16(&mut self, samples: &[i16]) -> Vec<i16> {
        let floats: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();
        self.process(&floats)
            .into_iter()
            .map(|f| (f * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16)
            .collect()
    }

    fn process(&mut self, samples: &[f32]) -> Vec<f32> {
        let Some(ref mut resampler) = self.resampler else {
            return samples.to_vec();
        };

        self.input_buf.extend_from_slice(samples);
        let mut result = Vec::new();

        while self.input_buf.len() >= self.chunk_size {
            let input_slice = &self.input_buf[..self.chunk_size];
            match resampler.process_into_buffer(&[input_slice], &mut self.output_buf, None) {
                Ok((_consumed, produced)) => {
                    result.extend_from_slice(&self.output_buf[0][..produced]);
                }
                Err(e) => {
                    tracing::error!("resampler process error: {e}");
                }
            }
            self.input_buf.drain(..self.chunk_size);
        }

        result
    }

    pub fn is_passthrough(&self) -> bool {
        self.resampler.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_when_rates_match() {
        let mut rc = RateConverter::new(8_000, 8_000, 160).unwrap();
        assert!(rc.is_passthrough());
        let samples: Vec<i16> = (0..160).map(|i| i as i16).collect();
        assert_eq!(rc.process_i16(&samples), samples);
    }

    #[test]
    fn upsample_8k_to_24k_triples_frame_count_approximately() {
        let mut rc = RateConverter::new(8_000, 24_000, 160).unwrap();
        assert!(!rc.is_passthrough());
        let samples = vec![0i16; 160];
        let out = rc.process_i16(&samples);
        let expected = 480usize;
        assert!(
            (out.len() as isize - expected as isize).unsigned_abs() <= 16,
            "output len={} expected≈{}",
            out.len(),
            expected
        );
    }

    #[test]
    fn downsample_24k_to_8k_thirds_frame_count_approximately() {
        let mut rc = RateConverter::new(24_000, 8_000, 480).unwrap();
        let samples = vec![0i16; 480];
        let out = rc.process_i16(&samples);
        let expected = 160usize;
        assert!(
            (out.len() as isize - expected as isize).unsigned_abs() <= 8,
            "output len={} expected≈{}",
            out.len(),
            expected
        );
    }

    #[test]
    fn partial_chunk_accumulates_without_output() {
        let mut rc = RateConverter::new(8_000, 24_000, 160).unwrap();
        let out = rc.process_i16(&vec![0i16; 50]);
        assert!(out.is_empty());
    }

    #[test]
    fn accumulated_partial_chunks_eventually_produce_output() {
        let mut rc = RateConverter::new(8_000, 24_000, 160).unwrap();
        let out1 = rc.process_i16(&vec![0i16; 100]);
        assert!(out1.is_empty());
        let out2 = rc.process_i16(&vec![0i16; 100]);
        assert!(!out2.is_empty());
    }
}

// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Media Bridge (C2, §4.2): per-call mu-law↔PCM16 transcoding, 8↔24 kHz
//! resampling, the bounded outbound pacing queue, barge-in buffer clearing,
//! and DTMF intake.

use std::collections::VecDeque;

use telagent_audio::{decode_frame, encode_frame, RateConverter, CARRIER_FRAME_BYTES};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to initialize resampler: {0}")]
    Resample(#[from] telagent_audio::ResampleError),
}

/// Bounded FIFO of outbound mu-law frames awaiting the 20 ms pacer. When
/// full, the oldest frame is dropped and a warning logged (§4.2) rather than
/// blocking the outbound pump.
pub struct PacingQueue {
    frames: VecDeque<Vec<u8>>,
    cap_frames: usize,
}

impl PacingQueue {
    pub fn new(cap_ms: u64) -> Self {
        let cap_frames = (cap_ms / 20).max(1) as usize;
        Self { frames: VecDeque::with_capacity(cap_frames), cap_frames }
    }

    pub fn push(&mut self, frame: Vec<u8>) {
        if self.frames.len() >= self.cap_frames {
            self.frames.pop_front();
            tracing::warn!("pacing queue full, dropped oldest outbound frame");
        }
        self.frames.push_back(frame);
    }

    pub fn pop(&mut self) -> Option<Vec<u8>> {
        self.frames.pop_front()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Owns the two transcoding paths for one call's carrier↔model audio.
pub struct MediaBridge {
    inbound: RateConverter,
    outbound: RateConverter,
    mulaw_remainder: Vec<u8>,
    pacing: PacingQueue,
}

impl MediaBridge {
    pub fn new(pacing_cap_ms: u64) -> Result<Self, BridgeError> {
        Ok(Self {
            inbound: RateConverter::new(
                telagent_audio::CARRIER_SAMPLE_RATE,
                telagent_audio::MODEL_SAMPLE_RATE,
                CARRIER_FRAME_BYTES,
            )?,
            outbound: RateConverter::new(
                telagent_audio::MODEL_SAMPLE_RATE,
                telagent_audio::CARRIER_SAMPLE_RATE,
                CARRIER_FRAME_BYTES * 3,
            )?,
            mulaw_remainder: Vec::new(),
            pacing: PacingQueue::new(pacing_cap_ms),
        })
    }

    /// carrier → model: mu-law 8 kHz frame in, PCM16 24 kHz samples out. An
    /// empty frame is silently skipped (§8 boundary behaviour).
    pub fn process_inbound(&mut self, mulaw_payload: &[u8]) -> Vec<i16> {
        if mulaw_payload.is_empty() {
            return Vec::new();
        }
        let pcm8k = decode_frame(mulaw_payload);
        self.inbound.process_i16(&pcm8k)
    }

    /// model → carrier: PCM16 24 kHz chunk in, zero or more ready 160-byte
    /// mu-law frames appended to the pacing queue. Any trailing bytes short
    /// of a full frame are kept as the remainder for the next call.
    pub fn process_outbound(&mut self, pcm24k: &[i16]) {
        let pcm8k = self.outbound.process_i16(pcm24k);
        if pcm8k.is_empty() {
            return;
        }
        let mut mulaw = encode_frame(&pcm8k);
        self.mulaw_remainder.append(&mut mulaw);

        while self.mulaw_remainder.len() >= CARRIER_FRAME_BYTES {
            let frame: Vec<u8> = self.mulaw_remainder.drain(..CARRIER_FRAME_BYTES).collect();
            self.pacing.push(frame);
        }
    }

    /// Drains the next paced outbound frame, if the pacer's 20 ms tick is
    /// due and a frame is queued.
    pub fn next_outbound_frame(&mut self) -> Option<Vec<u8>> {
        self.pacing.pop()
    }

    pub fn queued_frames(&self) -> usize {
        self.pacing.len()
    }

    /// On "input speech started": drop every queued frame and the mu-law
    /// remainder so no pre-interruption audio is ever emitted (§4.2, §8
    /// invariant 3).
    pub fn barge_in(&mut self) {
        self.pacing.clear();
        self.mulaw_remainder.clear();
    }

    /// Returns true iff `digit` is this business's configured emergency
    /// trigger (§4.2 DTMF intake, §9 open question: the digit is
    /// business-specific).
    pub fn is_emergency_digit(digit: &str, configured: &str) -> bool {
        digit == configured
    }
}

//! Frequency Offset Estimator — fine frequency synchronisation from
//! training symbols
//!
//! After coarse acquisition, a DAB receiver is still left with a residual
//! carrier frequency offset that shows up as a constant phase drift per
//! sample. Each transmission frame opens with a fixed number of training
//! symbols; this block averages the per-symbol phase drift over that
//! window, unwraps phase-wrap artifacts at the ±π boundary, and smooths
//! the result across frames with a single-pole IIR. It emits one offset
//! value per input sample (strict 1:1, no resampling), held constant
//! between updates, for a downstream derotator.
//!
//! Two unwrap heuristics are applied, both using a ±π/2 decision band:
//! a fine one comparing each raw training sample against the running
//! average of the current window, and a coarse one comparing the new frame
//! average against the previous smoothed estimate. The coarse case matters
//! when the true offset sits near half the subcarrier spacing, where the
//! averaged estimate can jump between large positive and large negative
//! values from frame to frame.
//!
//! # Example
//!
//! ```rust
//! use dab_phy::frequency_offset_estimator::{
//!     EstimatorParams, FrequencyOffsetEstimator, PhaseTick,
//! };
//!
//! let params = EstimatorParams {
//!     symbol_length: 4,
//!     fft_length: 8,
//!     num_symbols: 2,
//!     alpha: 0.5,
//!     sample_rate: 2_048_000,
//! };
//! let mut est = FrequencyOffsetEstimator::new(params).unwrap();
//!
//! // One frame of constant phase drift 0.25 rad per symbol.
//! let mut input = vec![PhaseTick { phase: 0.25, frame_start: false }; 8];
//! input[0].frame_start = true;
//! let mut output = vec![0.0f64; 8];
//! est.work(&input, &mut output);
//!
//! // First lock snaps straight to the window average.
//! assert!((est.estimate() - 0.25).abs() < 1e-12);
//! assert!((output[7] - 0.25 / 8.0).abs() < 1e-12);
//! ```

use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::stream::WorkResult;
use crate::types::{DspError, DspResult};

/// One stream tick: an instantaneous per-symbol phase estimate plus the
/// frame-start trigger, advancing in lock step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseTick {
    /// Phase drift estimate in radians for the symbol this sample
    /// belongs to.
    pub phase: f64,
    /// True on the first sample of a new transmission frame.
    pub frame_start: bool,
}

/// Construction parameters of the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatorParams {
    /// Samples per OFDM symbol including the cyclic prefix.
    pub symbol_length: usize,
    /// FFT length; a phase drift of 2π over `fft_length` samples equals
    /// one subcarrier spacing of offset.
    pub fft_length: usize,
    /// Training symbols averaged at the start of every frame.
    pub num_symbols: usize,
    /// Smoothing coefficient in (0, 1]; 1 disables smoothing.
    pub alpha: f64,
    /// Sample rate in Hz, used only for the logged Hz equivalent.
    pub sample_rate: u32,
}

impl EstimatorParams {
    /// Validate the parameter set. Degenerate values are rejected here so
    /// no runtime path ever divides by a zero-sized parameter.
    pub fn validate(&self) -> DspResult<()> {
        if self.symbol_length == 0 {
            return Err(DspError::InvalidConfig("symbol_length must be > 0".into()));
        }
        if self.fft_length == 0 {
            return Err(DspError::InvalidConfig("fft_length must be > 0".into()));
        }
        if self.num_symbols == 0 {
            return Err(DspError::InvalidConfig("num_symbols must be > 0".into()));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(DspError::InvalidConfig("alpha must be in (0, 1]".into()));
        }
        if self.sample_rate == 0 {
            return Err(DspError::InvalidConfig("sample_rate must be > 0".into()));
        }
        Ok(())
    }
}

/// Streaming fine frequency offset estimator.
///
/// All cross-call state lives in the instance; nothing resets it except a
/// frame-start trigger on the input stream.
#[derive(Debug, Clone)]
pub struct FrequencyOffsetEstimator {
    params: EstimatorParams,
    /// Index within the training window; `num_symbols` once the window is
    /// done, meaning "outside any frame" until the next trigger.
    cur_symbol: usize,
    /// Sample index within the current symbol period, wraps modulo
    /// `symbol_length`.
    cur_sample: usize,
    /// Running phase accumulation for the current frame; becomes the
    /// window average when the last training symbol completes.
    phase_sum: f64,
    /// Smoothed offset estimate in radians per `fft_length` samples.
    estimated_error: f64,
    /// Derived per-sample offset, held constant between updates.
    estimated_error_per_sample: f64,
    /// Whether a first estimate has been acquired. The first completed
    /// window snaps the estimate directly; smoothing starts afterwards.
    locked: bool,
}

impl FrequencyOffsetEstimator {
    /// Create an estimator; rejects degenerate parameters.
    pub fn new(params: EstimatorParams) -> DspResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            cur_symbol: params.num_symbols,
            cur_sample: 0,
            phase_sum: 0.0,
            estimated_error: 0.0,
            estimated_error_per_sample: 0.0,
            locked: false,
        })
    }

    pub fn params(&self) -> &EstimatorParams {
        &self.params
    }

    /// Current offset estimate in radians per `fft_length` samples.
    pub fn estimate(&self) -> f64 {
        self.estimated_error
    }

    /// Current offset estimate in radians per sample.
    pub fn estimate_per_sample(&self) -> f64 {
        self.estimated_error_per_sample
    }

    /// Current offset estimate in Hz.
    pub fn estimate_hz(&self) -> f64 {
        self.estimated_error_per_sample * self.params.sample_rate as f64 / (2.0 * PI)
    }

    /// True once at least one training window has completed.
    pub fn locked(&self) -> bool {
        self.locked
    }

    /// Input ticks required to guarantee `noutput` output samples (1:1).
    pub fn forecast(&self, noutput: usize) -> usize {
        noutput
    }

    /// Process `min(input, output)` samples, writing one per-sample offset
    /// value for each input tick.
    pub fn work(&mut self, input: &[PhaseTick], output: &mut [f64]) -> WorkResult {
        let n = input.len().min(output.len());
        for (tick, out) in input[..n].iter().zip(output[..n].iter_mut()) {
            if tick.frame_start {
                self.cur_symbol = 0;
                self.cur_sample = 0;
                self.phase_sum = 0.0;
            }

            self.cur_sample += 1;

            if self.cur_sample == self.params.symbol_length {
                // Symbol boundary; the phase sample of this symbol is read
                // from its last tick.
                self.cur_sample = 0;
                if self.cur_symbol < self.params.num_symbols {
                    self.accumulate(tick.phase);
                }
                if self.cur_symbol + 1 == self.params.num_symbols {
                    self.finalize_window();
                }
                self.cur_symbol += 1;
            }

            *out = self.estimated_error_per_sample;
        }
        WorkResult::single(n, n)
    }

    /// Add one training-symbol phase sample to the window, unwrapping it
    /// against the running average if the two sit on opposite sides of the
    /// ±π boundary.
    fn accumulate(&mut self, phase: f64) {
        let mut sample = phase;
        if self.cur_symbol > 0 {
            let avg = self.phase_sum / self.cur_symbol as f64;
            if avg < -FRAC_PI_2 && sample > FRAC_PI_2 {
                sample -= 2.0 * PI;
            } else if avg > FRAC_PI_2 && sample < -FRAC_PI_2 {
                sample += 2.0 * PI;
            }
        }
        self.phase_sum += sample;
    }

    /// Complete the training window: average, coarse unwrap against the
    /// previous estimate, then first-lock snap or exponential smoothing.
    fn finalize_window(&mut self) {
        self.phase_sum /= self.params.num_symbols as f64;

        // An offset near half the subcarrier spacing makes the window
        // average flip sign between frames; pull the previous estimate
        // onto the same branch before smoothing.
        if self.estimated_error < -FRAC_PI_2 && self.phase_sum > FRAC_PI_2 {
            tracing::debug!("phase wrap detected: neg -> pos");
            self.estimated_error += 2.0 * PI;
        } else if self.estimated_error > FRAC_PI_2 && self.phase_sum < -FRAC_PI_2 {
            tracing::debug!("phase wrap detected: pos -> neg");
            self.estimated_error -= 2.0 * PI;
        }

        if self.locked {
            self.estimated_error =
                self.params.alpha * self.phase_sum + (1.0 - self.params.alpha) * self.estimated_error;
        } else {
            // Fast first adjustment, otherwise lock-in would take many
            // frames at small alpha.
            self.estimated_error = self.phase_sum;
            self.locked = true;
        }

        self.estimated_error_per_sample = self.estimated_error / self.params.fft_length as f64;
        tracing::debug!(
            rad = self.estimated_error,
            hz = self.estimate_hz(),
            "frequency offset estimate updated"
        );
    }
}

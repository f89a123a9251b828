//! # DAB Post-Demodulation DSP Library
//!
//! This crate provides the post-demodulation physical-layer processing
//! blocks of a Digital Audio Broadcasting (DAB) receiver: logical frame
//! validation against the embedded Fire code, reconstruction of stripped
//! OFDM pilot symbols, and fine frequency offset estimation from the
//! training symbols at the start of every transmission frame.
//!
//! ## Signal Flow
//!
//! ```text
//! bytes ─────────────────► FirecodeValidator ─────────► validated bytes
//!                                                       (+ verdict events)
//!
//! OFDM symbols + markers ► PilotReconstructor ────────► symbols with pilots
//!
//! phase samples + markers► FrequencyOffsetEstimator ──► offset per sample
//!                                                       (to the derotator)
//! ```
//!
//! The three blocks are independent of one another. Each is a synchronous,
//! single-threaded streaming transform driven by an external pull-based
//! scheduler: the caller owns all buffers, asks [`stream`]-style `forecast`
//! questions before invoking `work`, and learns from the returned
//! [`stream::WorkResult`] exactly how many items were consumed and produced.
//! All cross-call state (frame counters, the pilot insertion guard, the
//! running phase window) is private to the block instance.
//!
//! ## Example
//!
//! ```rust
//! use dab_phy::firecode_check::{FirecodeChecker, FirecodeValidator};
//!
//! // Build one valid 24-byte logical frame (bit_rate_n = 1).
//! let checker = FirecodeChecker::new();
//! let mut frame = vec![0u8; 24];
//! frame[2..11].copy_from_slice(b"DAB frame");
//! let parity = checker.parity(&frame[2..11]);
//! frame[0] = (parity >> 8) as u8;
//! frame[1] = (parity & 0xff) as u8;
//!
//! let mut validator = FirecodeValidator::new(1).unwrap();
//! let mut out = vec![0u8; 24];
//! let report = validator.work(&frame, &mut out);
//!
//! assert!(report.verdicts[0].valid);
//! assert_eq!(out, frame); // strict passthrough
//! ```

pub mod firecode_check;
pub mod frequency_offset_estimator;
pub mod observe;
pub mod pilot_reconstructor;
pub mod stream;
pub mod types;

pub use firecode_check::{FirecodeChecker, FirecodeValidator, ValidatorMode};
pub use frequency_offset_estimator::{EstimatorParams, FrequencyOffsetEstimator, PhaseTick};
pub use pilot_reconstructor::{MarkedSymbol, PilotReconstructor};
pub use stream::WorkResult;
pub use types::{Complex, DspError, DspResult, IQSample, Sample};

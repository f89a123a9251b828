//! Fire Code Frame Validation — DAB logical frame integrity checking
//!
//! Partitions a byte stream into fixed-size logical frames and checks each
//! one against the embedded Fire code, a 16-bit burst-error-detecting code
//! carried in the first two bytes of every frame. In the default mode the
//! data stream passes through completely unchanged; validity is reported
//! out-of-band via debug log events and a per-call report, so a downstream
//! decoder can decide what to do with a corrupted frame.
//!
//! A logical frame is `24 * bit_rate_n` bytes. The Fire code protects the
//! frame header: bytes 0–1 hold the parity word, bytes 2–10 the protected
//! data. The generator polynomial is
//! x¹⁶ + x¹⁴ + x¹³ + x¹² + x¹¹ + x⁵ + x³ + x² + x + 1 (0x782F), the product
//! of (x¹¹ + 1) and (x⁵ + x³ + x² + x + 1).
//!
//! An alternative superframe mode groups runs of five consecutive frames
//! into one superframe for higher-layer error correction, discarding
//! invalid frames and re-acquiring alignment one frame at a time. It must
//! be requested explicitly via [`ValidatorMode::SuperframeResync`]; it is
//! never active by default.
//!
//! # Example
//!
//! ```rust
//! use dab_phy::firecode_check::{FirecodeChecker, FirecodeValidator};
//!
//! let checker = FirecodeChecker::new();
//! let mut frame = vec![0u8; 24];
//! frame[2..11].copy_from_slice(b"123456789");
//! let parity = checker.parity(&frame[2..11]);
//! frame[0] = (parity >> 8) as u8;
//! frame[1] = (parity & 0xff) as u8;
//! assert!(checker.check(&frame));
//!
//! let mut validator = FirecodeValidator::new(1).unwrap();
//! let mut out = vec![0u8; 24];
//! let report = validator.work(&frame, &mut out);
//! assert!(report.verdicts[0].valid);
//! assert_eq!(out, frame);
//! ```

use serde::{Deserialize, Serialize};

use crate::stream::WorkResult;
use crate::types::{DspError, DspResult};

/// Generator polynomial of the DAB Fire code (MSB-first, degree 16).
const FIRECODE_POLY: u16 = 0x782F;

/// Number of bytes covered by the Fire code: 2 parity + 9 data.
const FIRECODE_SPAN: usize = 11;

/// Frames per superframe in [`ValidatorMode::SuperframeResync`].
const FRAMES_PER_SUPERFRAME: usize = 5;

/// Table-driven Fire code register.
///
/// The register is a plain MSB-first CRC over GF(2): init 0, no reflection,
/// no final xor. Feeding the 9 protected data bytes followed by the 2-byte
/// parity word leaves the register at zero for an intact frame.
#[derive(Clone)]
pub struct FirecodeChecker {
    table: [u16; 256],
}

impl FirecodeChecker {
    /// Build the checker, precomputing the byte-wise lookup table.
    pub fn new() -> Self {
        let mut table = [0u16; 256];
        for i in 0..256u16 {
            let mut crc = i << 8;
            for _ in 0..8 {
                if crc & 0x8000 != 0 {
                    crc = (crc << 1) ^ FIRECODE_POLY;
                } else {
                    crc <<= 1;
                }
            }
            table[i as usize] = crc;
        }
        Self { table }
    }

    fn feed(&self, state: u16, byte: u8) -> u16 {
        (state << 8) ^ self.table[((state >> 8) ^ byte as u16) as usize]
    }

    /// Compute the 16-bit parity word for the protected data bytes
    /// (bytes 2–10 of a frame). Used by encoders and tests to build
    /// frames that pass [`check`](Self::check).
    pub fn parity(&self, data: &[u8]) -> u16 {
        data.iter().fold(0u16, |state, &b| self.feed(state, b))
    }

    /// Check the Fire code of one logical frame.
    ///
    /// Runs the register over the protected data (bytes 2–10) and then the
    /// embedded parity word (bytes 0–1); an intact frame leaves the register
    /// at zero. Only the first 11 bytes of the frame participate.
    ///
    /// # Panics
    ///
    /// Panics if `frame` has fewer than 11 bytes. `FirecodeValidator`
    /// guarantees the minimum via its frame size (24 bytes or more).
    pub fn check(&self, frame: &[u8]) -> bool {
        assert!(
            frame.len() >= FIRECODE_SPAN,
            "Fire code needs {} bytes, frame has {}",
            FIRECODE_SPAN,
            frame.len()
        );
        let mut state = 0u16;
        for &b in &frame[2..FIRECODE_SPAN] {
            state = self.feed(state, b);
        }
        for &b in &frame[..2] {
            state = self.feed(state, b);
        }
        state == 0
    }
}

impl Default for FirecodeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FirecodeChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirecodeChecker")
            .field("poly", &format_args!("{:#06x}", FIRECODE_POLY))
            .finish()
    }
}

/// Frame handling strategy of the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorMode {
    /// Check every frame, log the verdict, pass all bytes through
    /// unchanged. A failed check never drops or alters data.
    #[default]
    Passthrough,
    /// Accumulate runs of five consecutive valid frames into superframes,
    /// discard frames that fail the check, and re-acquire alignment by
    /// shifting the detection window one frame at a time.
    SuperframeResync,
}

/// Alignment state of the superframe resync mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Not aligned; probing frame by frame for a valid Fire code.
    Seeking,
    /// Aligned; superframes are being emitted back to back.
    Locked,
}

/// Validity verdict for one logical frame.
///
/// `index` is the absolute frame count since construction, so verdicts
/// from successive `work` calls never repeat an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameVerdict {
    pub index: u64,
    pub valid: bool,
}

/// Report of one validator `work` call: buffer accounting plus the
/// per-frame verdicts observed during the call. Verdicts are diagnostic
/// only; they are also emitted as `tracing` debug events.
#[derive(Debug, Clone)]
pub struct ValidatorReport {
    pub result: WorkResult,
    pub verdicts: Vec<FrameVerdict>,
}

/// Streaming Fire code validator for DAB logical frames.
///
/// Operates only on whole frames: `work` silently truncates the buffers it
/// was given down to a multiple of the frame size, consuming and producing
/// nothing if less than one whole frame fits.
#[derive(Debug, Clone)]
pub struct FirecodeValidator {
    checker: FirecodeChecker,
    frame_size: usize,
    mode: ValidatorMode,
    sync_state: SyncState,
    /// Lifetime count of frames taken off the input stream.
    frames_seen: u64,
    /// Lifetime count of frames that failed the check.
    frames_failed: u64,
}

impl FirecodeValidator {
    /// Create a validator for logical frames of `24 * bit_rate_n` bytes,
    /// in the default passthrough mode.
    pub fn new(bit_rate_n: usize) -> DspResult<Self> {
        if bit_rate_n == 0 {
            return Err(DspError::InvalidConfig(
                "bit_rate_n must be > 0".into(),
            ));
        }
        Ok(Self {
            checker: FirecodeChecker::new(),
            frame_size: 24 * bit_rate_n,
            mode: ValidatorMode::Passthrough,
            sync_state: SyncState::Seeking,
            frames_seen: 0,
            frames_failed: 0,
        })
    }

    /// Create a validator with an explicit frame handling mode.
    pub fn with_mode(bit_rate_n: usize, mode: ValidatorMode) -> DspResult<Self> {
        let mut v = Self::new(bit_rate_n)?;
        v.mode = mode;
        Ok(v)
    }

    /// Logical frame size in bytes.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// `work` handles buffers only in multiples of this item count.
    pub fn output_multiple(&self) -> usize {
        self.frame_size
    }

    /// Current alignment state (meaningful in superframe mode).
    pub fn sync_state(&self) -> SyncState {
        self.sync_state
    }

    /// Lifetime count of frames taken off the input stream.
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Lifetime count of frames that failed the Fire code check.
    pub fn frames_failed(&self) -> u64 {
        self.frames_failed
    }

    /// Input items required to guarantee `noutput` output items.
    ///
    /// The passthrough mode is exactly 1:1. The superframe mode discards
    /// invalid frames, so 1:1 is a lower bound there; the scheduler simply
    /// retries with more input when a call stalls.
    pub fn forecast(&self, noutput: usize) -> usize {
        noutput
    }

    /// Validate and copy as many whole frames as the buffers allow.
    ///
    /// Every frame boundary is fixed by construction; the call processes
    /// `min(input, output)` bytes rounded down to a multiple of
    /// [`frame_size`](Self::frame_size).
    pub fn work(&mut self, input: &[u8], output: &mut [u8]) -> ValidatorReport {
        match self.mode {
            ValidatorMode::Passthrough => self.work_passthrough(input, output),
            ValidatorMode::SuperframeResync => self.work_resync(input, output),
        }
    }

    fn check_frame(&mut self, frame: &[u8]) -> FrameVerdict {
        let index = self.frames_seen;
        let valid = self.checker.check(frame);
        if valid {
            tracing::debug!(frame = index, "fire code OK");
        } else {
            self.frames_failed += 1;
            tracing::debug!(frame = index, "fire code failed");
        }
        FrameVerdict { index, valid }
    }

    fn work_passthrough(&mut self, input: &[u8], output: &mut [u8]) -> ValidatorReport {
        let n = (input.len().min(output.len()) / self.frame_size) * self.frame_size;
        let mut verdicts = Vec::with_capacity(n / self.frame_size);
        for frame in input[..n].chunks_exact(self.frame_size) {
            verdicts.push(self.check_frame(frame));
            self.frames_seen += 1;
        }
        output[..n].copy_from_slice(&input[..n]);
        ValidatorReport {
            result: WorkResult::single(n, n),
            verdicts,
        }
    }

    fn work_resync(&mut self, input: &[u8], output: &mut [u8]) -> ValidatorReport {
        let fs = self.frame_size;
        let frames_avail = input.len() / fs;
        let mut verdicts = Vec::new();
        let mut consumed_frames = 0;
        let mut produced = 0;

        while consumed_frames < frames_avail {
            let frame = &input[consumed_frames * fs..];
            let verdict = self.check_frame(frame);
            verdicts.push(verdict);
            if verdict.valid {
                let superframe_fits = consumed_frames + FRAMES_PER_SUPERFRAME <= frames_avail
                    && produced + FRAMES_PER_SUPERFRAME * fs <= output.len();
                if !superframe_fits {
                    // Valid header but the superframe is not fully buffered
                    // yet; leave it for the next call.
                    tracing::debug!(
                        frame = verdict.index,
                        "fire code OK but superframe not full in buffer"
                    );
                    verdicts.pop();
                    break;
                }
                let span = FRAMES_PER_SUPERFRAME * fs;
                let start = consumed_frames * fs;
                output[produced..produced + span]
                    .copy_from_slice(&input[start..start + span]);
                produced += span;
                consumed_frames += FRAMES_PER_SUPERFRAME;
                self.frames_seen += FRAMES_PER_SUPERFRAME as u64;
                self.sync_state = SyncState::Locked;
            } else {
                // Shift the detection window by one frame.
                consumed_frames += 1;
                self.frames_seen += 1;
                self.sync_state = SyncState::Seeking;
            }
        }

        ValidatorReport {
            result: WorkResult::single(consumed_frames * fs, produced),
            verdicts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a frame of `frame_size` bytes whose Fire code checks out.
    fn valid_frame(frame_size: usize, fill: u8) -> Vec<u8> {
        let checker = FirecodeChecker::new();
        let mut frame = vec![fill; frame_size];
        let parity = checker.parity(&frame[2..11]);
        frame[0] = (parity >> 8) as u8;
        frame[1] = (parity & 0xff) as u8;
        frame
    }

    #[test]
    fn test_parity_roundtrip() {
        let checker = FirecodeChecker::new();
        let frame = valid_frame(24, 0xA5);
        assert!(checker.check(&frame));
    }

    #[test]
    fn test_single_bit_flip_detected() {
        let checker = FirecodeChecker::new();
        let reference = valid_frame(24, 0x3C);
        // Flip every bit of the protected data window in turn.
        for byte in 2..11 {
            for bit in 0..8 {
                let mut frame = reference.clone();
                frame[byte] ^= 1 << bit;
                assert!(
                    !checker.check(&frame),
                    "flip at byte {} bit {} not detected",
                    byte,
                    bit
                );
            }
        }
    }

    #[test]
    fn test_parity_flip_detected() {
        let checker = FirecodeChecker::new();
        let mut frame = valid_frame(24, 0x00);
        frame[1] ^= 0x01;
        assert!(!checker.check(&frame));
    }

    #[test]
    fn test_rejects_zero_bit_rate() {
        assert!(FirecodeValidator::new(0).is_err());
    }

    #[test]
    fn test_frame_size() {
        let v = FirecodeValidator::new(4).unwrap();
        assert_eq!(v.frame_size(), 96);
        assert_eq!(v.output_multiple(), 96);
        assert_eq!(v.forecast(96), 96);
    }

    #[test]
    fn test_passthrough_law() {
        // Output equals input byte for byte, valid or not.
        let mut v = FirecodeValidator::new(1).unwrap();
        let mut input = valid_frame(24, 0x11);
        input.extend(vec![0x77u8; 24]); // second frame is garbage
        let mut output = vec![0u8; 48];

        let report = v.work(&input, &mut output);
        assert_eq!(report.result, WorkResult::single(48, 48));
        assert_eq!(output, input);
        assert_eq!(report.verdicts.len(), 2);
        assert!(report.verdicts[0].valid);
        assert!(!report.verdicts[1].valid);
        assert_eq!(v.frames_failed(), 1);
    }

    #[test]
    fn test_two_valid_frames_end_to_end() {
        // bit_rate_n = 1 gives 24-byte frames; 48 valid bytes in, 48 out.
        let mut v = FirecodeValidator::new(1).unwrap();
        let mut input = valid_frame(24, 0x01);
        input.extend(valid_frame(24, 0x02));
        let mut output = vec![0u8; 48];

        let report = v.work(&input, &mut output);
        assert_eq!(report.result.produced, 48);
        assert_eq!(output, input);
        assert_eq!(report.verdicts.len(), 2);
        assert!(report.verdicts.iter().all(|fv| fv.valid));
        assert_eq!(report.verdicts[0].index, 0);
        assert_eq!(report.verdicts[1].index, 1);
    }

    #[test]
    fn test_truncates_to_frame_multiple() {
        let mut v = FirecodeValidator::new(1).unwrap();
        let input = valid_frame(24, 0x00);
        let mut output = vec![0u8; 24];

        // 23 bytes: less than one frame, nothing happens.
        let report = v.work(&input[..23], &mut output);
        assert!(report.result.is_stalled());
        assert!(report.verdicts.is_empty());

        // Output window of 30 bytes still only fits one frame.
        let mut wide = vec![0u8; 30];
        let report = v.work(&input, &mut wide);
        assert_eq!(report.result, WorkResult::single(24, 24));
    }

    #[test]
    fn test_frame_index_spans_calls() {
        let mut v = FirecodeValidator::new(1).unwrap();
        let frame = valid_frame(24, 0x55);
        let mut output = vec![0u8; 24];
        v.work(&frame, &mut output);
        let report = v.work(&frame, &mut output);
        assert_eq!(report.verdicts[0].index, 1);
        assert_eq!(v.frames_seen(), 2);
    }

    #[test]
    fn test_resync_accumulates_superframe() {
        let mut v =
            FirecodeValidator::with_mode(1, ValidatorMode::SuperframeResync).unwrap();
        let mut input = Vec::new();
        for i in 0..5 {
            input.extend(valid_frame(24, i));
        }
        let mut output = vec![0u8; 120];

        let report = v.work(&input, &mut output);
        assert_eq!(report.result, WorkResult::single(120, 120));
        assert_eq!(output, input);
        assert_eq!(v.sync_state(), SyncState::Locked);
        // Only the superframe head is checked.
        assert_eq!(report.verdicts.len(), 1);
    }

    #[test]
    fn test_resync_shifts_past_bad_frame() {
        let mut v =
            FirecodeValidator::with_mode(1, ValidatorMode::SuperframeResync).unwrap();
        let mut input = vec![0xEEu8; 24]; // bad frame first
        for i in 0..5 {
            input.extend(valid_frame(24, i));
        }
        let mut output = vec![0u8; 144];

        let report = v.work(&input, &mut output);
        // Bad frame dropped, superframe of the five good frames emitted.
        assert_eq!(report.result, WorkResult::single(144, 120));
        assert_eq!(&output[..120], &input[24..]);
        assert!(!report.verdicts[0].valid);
        assert!(report.verdicts[1].valid);
    }

    #[test]
    fn test_resync_stalls_on_partial_superframe() {
        let mut v =
            FirecodeValidator::with_mode(1, ValidatorMode::SuperframeResync).unwrap();
        let mut input = Vec::new();
        for i in 0..3 {
            input.extend(valid_frame(24, i));
        }
        let mut output = vec![0u8; 120];

        // Valid head but only 3 of 5 frames buffered: no progress.
        let report = v.work(&input, &mut output);
        assert!(report.result.is_stalled());
        assert_eq!(v.sync_state(), SyncState::Seeking);
    }
}

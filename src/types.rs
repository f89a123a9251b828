//! Core types shared by the DAB post-demodulation blocks
//!
//! Signals are represented as complex I/Q (In-phase/Quadrature) samples:
//! the real part is the component aligned with the reference carrier, the
//! imaginary part the component 90° out of phase. Phase estimates and
//! frequency offsets are plain `f64` values in radians.

use num_complex::Complex64;

/// Type alias for complex numbers using f64 precision
pub type Complex = Complex64;

/// A single I/Q sample point
pub type IQSample = Complex64;

/// A floating point sample (for real-valued signals)
pub type Sample = f64;

/// A stream of raw frame bytes
pub type ByteStream = Vec<u8>;

/// Result type for DSP operations
pub type DspResult<T> = Result<T, DspError>;

/// Errors that can occur during DSP operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DspError {
    /// A construction-time parameter was rejected. Degenerate configuration
    /// (zero-sized symbol or FFT length, empty pilot pattern) is fatal at
    /// construction, never discovered by a runtime divide.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Buffer too short: expected {expected}, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    /// An OFDM symbol vector did not match the configured carrier count.
    #[error("Symbol size mismatch: expected {expected} carriers, got {actual}")]
    SymbolSizeMismatch { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_stream_alias() {
        let frame: ByteStream = vec![0u8; 24];
        assert_eq!(frame.len(), 24);
    }

    #[test]
    fn test_error_display() {
        let e = DspError::SymbolSizeMismatch {
            expected: 76,
            actual: 75,
        };
        assert_eq!(
            format!("{}", e),
            "Symbol size mismatch: expected 76 carriers, got 75"
        );

        let e = DspError::InvalidConfig("alpha must be in (0, 1]".into());
        assert!(format!("{}", e).contains("alpha"));
    }
}

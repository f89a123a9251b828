//! Pilot Reconstructor — reinsertion of stripped OFDM pilot symbols
//!
//! Some links strip the known phase-reference (pilot) symbol from an OFDM
//! symbol stream before transport to save bandwidth; the receiver side must
//! put it back so that downstream differential demodulation sees a complete
//! frame. This block watches a frame-start marker carried alongside each
//! OFDM symbol and, at every frame boundary, emits the configured pilot
//! pattern as an extra symbol ahead of the data.
//!
//! The data stream and the marker stream advance in lock step, so they are
//! modeled as one composite per-tick record ([`MarkedSymbol`]) rather than
//! two independently advancing buffers. Output rate exceeds input rate by
//! exactly one symbol per frame: a substitution tick produces one symbol
//! while consuming none.
//!
//! # Example
//!
//! ```rust
//! use dab_phy::pilot_reconstructor::{MarkedSymbol, PilotReconstructor};
//! use num_complex::Complex64;
//!
//! let pilot = vec![Complex64::new(1.0, 0.0), Complex64::new(0.0, 1.0)];
//! let mut block = PilotReconstructor::new(pilot.clone()).unwrap();
//!
//! let input = vec![MarkedSymbol {
//!     symbol: vec![Complex64::new(0.5, -0.5); 2],
//!     frame_start: true,
//! }];
//! let mut output = vec![MarkedSymbol::default(); 2];
//! let result = block.work(&input, &mut output).unwrap();
//!
//! // One pilot inserted ahead of the data symbol.
//! assert_eq!(result.produced, 2);
//! assert_eq!(result.consumed, vec![1]);
//! assert_eq!(output[0].symbol, pilot);
//! assert!(output[0].frame_start);
//! assert_eq!(output[1].symbol, input[0].symbol);
//! ```

use crate::stream::WorkResult;
use crate::types::{Complex, DspError, DspResult};

/// One stream tick: a whole OFDM symbol plus its frame-start flag.
///
/// Keeping the flag inside the tick removes any chance of the data and
/// marker streams drifting apart positionally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkedSymbol {
    /// Complex carrier values of one OFDM symbol.
    pub symbol: Vec<Complex>,
    /// True on the first symbol of a new transmission frame.
    pub frame_start: bool,
}

impl MarkedSymbol {
    pub fn new(symbol: Vec<Complex>, frame_start: bool) -> Self {
        Self {
            symbol,
            frame_start,
        }
    }
}

/// Streaming pilot reinsertion block.
#[derive(Debug, Clone)]
pub struct PilotReconstructor {
    /// Phase reference pattern inserted at each frame start. Fixed at
    /// construction; its length defines the expected carrier count of
    /// every symbol passing through.
    pilot: Vec<Complex>,
    /// One-shot guard: set while positioned on a frame-start run that has
    /// already received its pilot, so a marker held across several ticks
    /// triggers exactly one substitution.
    inserted: bool,
}

impl PilotReconstructor {
    /// Create a reconstructor for the given pilot pattern.
    pub fn new(pilot: Vec<Complex>) -> DspResult<Self> {
        if pilot.is_empty() {
            return Err(DspError::InvalidConfig(
                "pilot pattern must not be empty".into(),
            ));
        }
        Ok(Self {
            pilot,
            inserted: false,
        })
    }

    /// The configured pilot pattern.
    pub fn pilot(&self) -> &[Complex] {
        &self.pilot
    }

    /// Number of carriers expected in every symbol.
    pub fn carriers(&self) -> usize {
        self.pilot.len()
    }

    /// Input ticks required to guarantee `noutput` output ticks.
    ///
    /// An upper bound: substitution ticks consume no input, so the true
    /// requirement depends on how many frame starts occur in the window.
    pub fn forecast(&self, noutput: usize) -> usize {
        noutput
    }

    /// Process ticks until the input or the output window is exhausted.
    ///
    /// Each output tick is either the pilot pattern (frame-start marker set
    /// on output, nothing consumed) or a verbatim copy of the next input
    /// symbol (marker clear, one tick consumed).
    ///
    /// # Errors
    ///
    /// Returns [`DspError::SymbolSizeMismatch`] if an input symbol does not
    /// have exactly `carriers()` values. State is untouched in that case.
    pub fn work(
        &mut self,
        input: &[MarkedSymbol],
        output: &mut [MarkedSymbol],
    ) -> DspResult<WorkResult> {
        for tick in input {
            if tick.symbol.len() != self.pilot.len() {
                return Err(DspError::SymbolSizeMismatch {
                    expected: self.pilot.len(),
                    actual: tick.symbol.len(),
                });
            }
        }

        let mut consumed = 0;
        let mut produced = 0;
        while consumed < input.len() && produced < output.len() {
            let tick = &input[consumed];
            if tick.frame_start && !self.inserted {
                output[produced].symbol.clear();
                output[produced].symbol.extend_from_slice(&self.pilot);
                output[produced].frame_start = true;
                self.inserted = true;
            } else {
                output[produced].symbol.clear();
                output[produced].symbol.extend_from_slice(&tick.symbol);
                output[produced].frame_start = false;
                // The guard survives a marker held across several ticks.
                self.inserted = self.inserted && tick.frame_start;
                consumed += 1;
            }
            produced += 1;
        }

        Ok(WorkResult::single(consumed, produced))
    }
}

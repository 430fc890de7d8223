//! This crate implements the forward-error-correction decoder of a satellite short-burst-data
//! link (SDL): a fixed-point Viterbi decoder for a rate-1/2, 64-state, tail-biting convolutional
//! code punctured to rate 2/3 with the pattern `110110`.
//!
//! The decoder de-punctures the received soft samples, computes 6-bit branch metrics, runs the
//! add-compare-select recursion past the end of the block and wraps around to the beginning (so
//! that the unknown start state of the tail-biting encoder does not matter), and finally traces
//! back through the survivor memory from the state with the largest path metric. Every stage uses
//! the exact bit widths, rounding and saturation rules of the modem hardware, so results are
//! bit-for-bit reproducible.
//!
//! A matching tail-biting encoder and puncturer are included, along with a BPSK-AWGN simulator
//! for evaluating the bit and block error rates of the decoder.
//!
//! # Examples
//!
//! ```
//! use sdl_viterbi::{decode, encode, puncture, Bit};
//! use Bit::{One, Zero};
//!
//! let info_bits = [
//!     One, Zero, Zero, One, One, One, Zero, One, Zero, Zero, Zero, One, One, Zero, One, Zero,
//!     Zero, One, One, Zero, One, One, One, Zero,
//! ];
//! let code_bits = puncture::puncture(&encode(&info_bits));
//! let code_soft: Vec<i8> = code_bits
//!     .iter()
//!     .map(|&b| if b == One { 100 } else { -100 })
//!     .collect();
//! let info_bits_hat = decode(&code_soft, info_bits.len(), 12)?;
//! assert_eq!(info_bits_hat, info_bits);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(
    clippy::complexity,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_allocation,
    unused_import_braces,
    unused_qualifications
)]

use thiserror::Error;

pub mod code;
pub mod puncture;
pub mod sim;
pub mod utils;
pub mod viterbi;

pub use code::encode;
pub use viterbi::{decode, decode_with, Normalization};

/// Number of memory cells in the encoder state
pub const STATE_LEN: usize = 6;

/// Number of encoder states
pub const NUM_STATES: usize = 1 << STATE_LEN;

/// Number of butterflies in one trellis section
pub const NUM_BUTTERFLIES: usize = NUM_STATES / 2;

/// Custom error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input error
    #[error("{0}")]
    InvalidInput(String),
    /// File read/write error
    #[error("{0}")]
    FileReadWriteError(#[from] std::io::Error),
    /// Serde read/write error
    #[error("{0}")]
    SerdeReadWriteError(#[from] serde_json::Error),
}

/// Enumeration of binary symbol values
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy)]
pub enum Bit {
    /// Binary symbol `0`
    Zero = 0,
    /// Binary symbol `1`
    One = 1,
}

impl Bit {
    /// Returns the bit as an integer (`0` or `1`).
    #[must_use]
    pub fn value(self) -> usize {
        match self {
            Bit::Zero => 0,
            Bit::One => 1,
        }
    }

    /// Returns the antipodal form of the bit: `-1` for `Zero` and `+1` for `One`.
    #[must_use]
    pub fn antipodal(self) -> i32 {
        match self {
            Bit::Zero => -1,
            Bit::One => 1,
        }
    }
}

impl From<bool> for Bit {
    fn from(val: bool) -> Self {
        if val {
            Bit::One
        } else {
            Bit::Zero
        }
    }
}

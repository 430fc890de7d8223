//! # Some useful functions for simulating decoder performance
//!
//! The [`random_bits`] function returns a given number of random bits; the [`bpsk_awgn_channel`]
//! function returns quantized soft samples at the output of a BPSK-AWGN channel corresponding to
//! given input bits; the [`bpsk_slicer`] function slices soft samples to bits; and the
//! [`error_count`] function returns the number of errors in a sequence with respect to a reference
//! sequence.
//!
//! # Examples
//!
//! The code below illustrates the usage of the functions in this module.
//! ```
//! use sdl_viterbi::utils;
//!
//! let num_bits = 40;
//! let es_over_n0_db = 10.0;
//! let bits = utils::random_bits(num_bits);
//! let bits_soft = utils::bpsk_awgn_channel(&bits, es_over_n0_db, 32.0);
//! let bits_hat = utils::bpsk_slicer(&bits_soft);
//! let err_count = utils::error_count(&bits_hat, &bits);
//! ```

use rand::Rng;
use rand_distr::StandardNormal;

use crate::Bit;

/// Returns given number of random bits.
///
/// # Parameters
///
/// - `num_bits`: Number of random bits to be generated.
///
/// # Returns
///
/// - `bits`: Random bits.
#[must_use]
pub fn random_bits(num_bits: usize) -> Vec<Bit> {
    let mut rng = rand::rng();
    (0 .. num_bits)
        .map(|_| Bit::from(rng.random_bool(0.5)))
        .collect()
}

/// Returns quantized soft samples at BPSK-AWGN channel output corresponding to given input bits.
///
/// # Parameters
///
/// - `bits`: Bits to be transmitted over the BPSK-AWGN channel.
///
/// - `es_over_n0_db`: Ratio (dB) of symbol energy to noise power spectral density at the BPSK-AWGN
///   channel output (the BPSK symbols are `+1.0` and `-1.0`, and the noise variance is
///   `0.5 / 10f64.powf(0.1 * es_over_n0_db)`).
///
/// - `amplitude`: Soft sample value corresponding to a noiseless BPSK symbol of `+1.0`.
///
/// # Returns
///
/// - `bits_soft`: Channel output values scaled by `amplitude`, rounded, and saturated to the
///   signed-byte range, with positive values indicating that `One` is more likely.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn bpsk_awgn_channel(bits: &[Bit], es_over_n0_db: f64, amplitude: f64) -> Vec<i8> {
    let mut rng = rand::rng();
    let es_over_n0 = 10f64.powf(0.1 * es_over_n0_db);
    let noise_std = (0.5 / es_over_n0).sqrt();
    bits.iter()
        .map(|&b| f64::from(b.antipodal()))
        .map(|x| amplitude * (x + noise_std * rng.sample::<f64, _>(StandardNormal)))
        // OK to cast `f64` to `i8`: Value has been rounded and clamped to the `i8` range.
        .map(|y| y.round().clamp(f64::from(i8::MIN), f64::from(i8::MAX)) as i8)
        .collect()
}

/// Returns BPSK slicer output.
///
/// # Parameters
///
/// - `bits_soft`: Soft samples to be sliced. Positive values are mapped to `One`, and all others
///   to `Zero`.
///
/// # Returns
///
/// - `bits_hat`: Bits obtained by slicing the given soft samples.
#[must_use]
pub fn bpsk_slicer(bits_soft: &[i8]) -> Vec<Bit> {
    bits_soft.iter().map(|&x| Bit::from(x > 0)).collect()
}

/// Returns number of errors in a sequence with respect to a reference sequence.
///
/// # Parameters
///
/// - `seq`: Sequence in which errors must be counted.
///
/// - `ref_seq`: Reference sequence to which the given sequence is compared.
///
/// # Returns
///
/// - `err_count`: Number of positions in which the two sequences differ. If they are of different
///   lengths, then the longer sequence is effectively truncated to the length of the shorter one.
pub fn error_count<T: PartialEq>(seq: &[T], ref_seq: &[T]) -> usize {
    ref_seq
        .iter()
        .zip(seq.iter())
        .filter(|&(x, y)| x != y)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use Bit::{One, Zero};

    #[test]
    fn test_random_bits() {
        let num_bits = 0;
        assert!(random_bits(num_bits).is_empty());
        let num_bits = 10000;
        let bits = random_bits(num_bits);
        let num_zeros = bits.iter().filter(|&b| *b == Zero).count();
        let num_ones = bits.iter().filter(|&b| *b == One).count();
        assert!(num_zeros > 9 * num_bits / 20 && num_ones > 9 * num_bits / 20);
    }

    #[test]
    fn test_bpsk_awgn_channel() {
        assert!(bpsk_awgn_channel(&random_bits(0), 0.0, 32.0).is_empty());
        // Negligible noise
        let bits = random_bits(1000);
        let bits_soft = bpsk_awgn_channel(&bits, 60.0, 32.0);
        for (&y, &b) in bits_soft.iter().zip(bits.iter()) {
            match b {
                Zero => assert_eq!(y, -32),
                One => assert_eq!(y, 32),
            }
        }
        // Saturation
        let bits_soft = bpsk_awgn_channel(&[Zero, One], 60.0, 500.0);
        assert_eq!(bits_soft, [-128, 127]);
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn test_bpsk_awgn_channel_noise_variance() {
        let es_over_n0_db = 3f64;
        let amplitude = 16.0;
        let num_bits = 10000;
        let bits = random_bits(num_bits);
        let bits_soft = bpsk_awgn_channel(&bits, es_over_n0_db, amplitude);
        let noise_var_expected = amplitude * amplitude * 0.5 / 10f64.powf(0.1 * es_over_n0_db);
        let noise_var_est = bits_soft
            .iter()
            .zip(bits)
            .map(|(&y, b)| f64::from(y) - amplitude * f64::from(b.antipodal()))
            .map(|x| x * x)
            .sum::<f64>()
            / num_bits as f64;
        assert!(
            noise_var_est > 0.9 * noise_var_expected && noise_var_est < 1.1 * noise_var_expected
        );
    }

    #[test]
    fn test_bpsk_slicer() {
        assert!(bpsk_slicer(&[]).is_empty());
        assert_eq!(bpsk_slicer(&[0, 1, -1, 127, -128]), [Zero, One, Zero, One, Zero]);
    }

    #[test]
    fn test_error_count() {
        assert_eq!(error_count(&[], &[One, Zero]), 0);
        assert_eq!(error_count(&[One, Zero], &[]), 0);
        // Longer `seq`
        let ref_seq = [One, Zero, Zero, One, One, One, Zero, Zero];
        let seq = [One, One, Zero, Zero, One, One, Zero, Zero, Zero, One];
        assert_eq!(error_count(&seq, &ref_seq), 2);
        // Shorter `seq`
        let ref_seq = [One, Zero, Zero, One, One, One, Zero, Zero, Zero, One];
        let seq = [One, One, Zero, Zero, One, One, Zero, Zero];
        assert_eq!(error_count(&seq, &ref_seq), 2);
    }
}

//! Puncturing and de-puncturing with the pattern `110110`
//!
//! Of every three consecutive bits of the rate-1/2 mother code, the first two are transmitted and
//! the third is erased, giving a rate-2/3 punctured code. At the receiver, an erased position is
//! refilled with a zero soft sample, which contributes nothing to any branch metric.

use crate::Error;

/// Puncture pattern, with `true` marking transmitted positions of the mother code
pub const PUNCTURE_PATTERN: [bool; 6] = [true, true, false, true, true, false];

/// Returns the punctured sequence obtained by dropping the erased positions of a mother-code
/// sequence.
///
/// # Parameters
///
/// - `code_bits`: Mother-code sequence (bits or soft values).
///
/// # Returns
///
/// - `punctured`: Elements of `code_bits` at the positions marked as transmitted in
///   [`PUNCTURE_PATTERN`], in order.
///
/// # Examples
/// ```
/// use sdl_viterbi::puncture::puncture;
///
/// assert_eq!(puncture(&[1, 2, 3, 4, 5, 6, 7, 8]), [1, 2, 4, 5, 7, 8]);
/// ```
#[must_use]
pub fn puncture<T: Copy>(code_bits: &[T]) -> Vec<T> {
    code_bits
        .iter()
        .zip(PUNCTURE_PATTERN.iter().cycle())
        .filter_map(|(&x, &keep)| keep.then_some(x))
        .collect()
}

/// Returns de-punctured soft samples.
///
/// Soft samples are consumed two at a time; each pair is copied to the output and followed by a
/// zero placeholder for the erased mother-code bit.
///
/// # Parameters
///
/// - `code_soft`: Punctured soft samples. Must have even length.
///
/// # Returns
///
/// - `depunctured`: Soft samples for the mother code, of length `3 * code_soft.len() / 2`, with
///   zeros at indices `2, 5, 8, ...`.
///
/// # Errors
///
/// Returns an error if `code_soft.len()` is odd.
///
/// # Examples
/// ```
/// use sdl_viterbi::puncture::depuncture;
///
/// assert_eq!(depuncture(&[10, -20, 30, -40])?, [10, -20, 0, 30, -40, 0]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn depuncture(code_soft: &[i8]) -> Result<Vec<i8>, Error> {
    if code_soft.len() % 2 != 0 {
        return Err(Error::InvalidInput(format!(
            "Expected even number of punctured soft samples (found {})",
            code_soft.len()
        )));
    }
    let mut depunctured = Vec::with_capacity(3 * code_soft.len() / 2);
    for pair in code_soft.chunks_exact(2) {
        depunctured.extend_from_slice(pair);
        depunctured.push(0);
    }
    Ok(depunctured)
}

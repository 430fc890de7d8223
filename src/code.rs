//! Rate-1/2, 64-state tail-biting convolutional code of the SDL link
//!
//! The encoder has [`STATE_LEN`] memory cells. A state transition shifts the new input bit into
//! position `0` of the state and drops the oldest bit from position `STATE_LEN - 1`, so the two
//! predecessors `s00` and `s01 = s00 | 32` of a butterfly share the successors `s10 = s00 << 1`
//! and `s11 = s10 | 1`.
//!
//! The two code bits `c1` (transmitted first) and `c2` on a branch are packed into a
//! [`BranchLabel`] as `c2 * 2 + c1`. Both generator polynomials tap the newest and the oldest
//! register bit, so complementing either the dropped bit or the input bit complements both code
//! bits. Hence the label on the upper branch `s00 -> s10` of each butterfly determines the labels
//! on the other three branches, and only those 32 labels are tabulated in [`BRANCH_LABELS`].

use crate::{Bit, NUM_BUTTERFLIES, NUM_STATES, STATE_LEN};

/// Generator polynomial for code bit `c1`, with bit `0` tapping the input bit and bit
/// `STATE_LEN` tapping the oldest state bit (`171` octal in MSB-first notation)
pub const GENERATOR_C1: usize = 0o117;

/// Generator polynomial for code bit `c2`, with the same bit ordering as [`GENERATOR_C1`] (`133`
/// octal in MSB-first notation)
pub const GENERATOR_C2: usize = 0o155;

/// Branch label on the upper branch (`s00 -> s10`) of each butterfly, indexed by `s00`
pub const BRANCH_LABELS: [BranchLabel; NUM_BUTTERFLIES] = {
    let raw: [u8; NUM_BUTTERFLIES] = [
        0, 1, 3, 2, 3, 2, 0, 1, 0, 1, 3, 2, 3, 2, 0, 1, 2, 3, 1, 0, 1, 0, 2, 3, 2, 3, 1, 0, 1, 0,
        2, 3,
    ];
    let mut labels = [BranchLabel(0); NUM_BUTTERFLIES];
    let mut i = 0;
    while i < NUM_BUTTERFLIES {
        labels[i] = BranchLabel(raw[i]);
        i += 1;
    }
    labels
};

/// State of the encoder (integer in `[0, NUM_STATES)`)
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy, Default)]
pub struct State(pub usize);

impl State {
    /// Returns the state reached from this state when the given bit is shifted in.
    #[must_use]
    pub fn successor(self, input_bit: Bit) -> Self {
        State(((self.0 << 1) | input_bit.value()) & (NUM_STATES - 1))
    }

    /// Returns the state preceding this state, given the bit that was dropped from the oldest
    /// memory cell on the way here.
    ///
    /// This inverts [`State::successor`] up to the input bit, which is discarded.
    #[must_use]
    pub fn predecessor(self, dropped_bit: Bit) -> Self {
        State((dropped_bit.value() << (STATE_LEN - 1)) | (self.0 >> 1))
    }

    /// Returns the oldest bit held in the state.
    #[must_use]
    pub fn oldest_bit(self) -> Bit {
        Bit::from((self.0 >> (STATE_LEN - 1)) & 1 == 1)
    }
}

/// Two code bits on a trellis branch, packed as `c2 * 2 + c1`
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy)]
pub struct BranchLabel(pub u8);

impl BranchLabel {
    /// Label `00`
    pub const ZERO_ZERO: Self = BranchLabel(0);
    /// Label `01` (`c1 = 1`, `c2 = 0`)
    pub const ZERO_ONE: Self = BranchLabel(1);
    /// Label `10` (`c1 = 0`, `c2 = 1`)
    pub const ONE_ZERO: Self = BranchLabel(2);
    /// Label `11`
    pub const ONE_ONE: Self = BranchLabel(3);

    /// Returns the label with given code bits.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_bits(c1: Bit, c2: Bit) -> Self {
        // OK to cast `usize` to `u8`: Value is at most 3.
        BranchLabel((c2.value() * 2 + c1.value()) as u8)
    }

    /// Returns the first transmitted code bit.
    #[must_use]
    pub fn c1(self) -> Bit {
        Bit::from(self.0 & 1 == 1)
    }

    /// Returns the second transmitted code bit.
    #[must_use]
    pub fn c2(self) -> Bit {
        Bit::from((self.0 >> 1) & 1 == 1)
    }

    /// Returns the label with both code bits complemented.
    #[must_use]
    pub fn complement(self) -> Self {
        BranchLabel(self.0 ^ 3)
    }

    /// Returns the label on the branch leaving `state` for input bit `input_bit`.
    #[must_use]
    pub fn for_transition(state: State, input_bit: Bit) -> Self {
        let upper = BRANCH_LABELS[state.0 & (NUM_BUTTERFLIES - 1)];
        if state.oldest_bit() == input_bit {
            upper
        } else {
            upper.complement()
        }
    }
}

/// Returns code bits from the tail-biting encoder for given information bits.
///
/// The encoder is initialized with the state that it reaches after the last `STATE_LEN`
/// information bits (taken cyclically for blocks shorter than that), so that its final state
/// equals its initial state.
///
/// # Parameters
///
/// - `info_bits`: Information bits to be encoded.
///
/// # Returns
///
/// - `code_bits`: Unpunctured code bits, `c1` and `c2` for each information bit in turn (length
///   `2 * info_bits.len()`).
///
/// # Examples
/// ```
/// use sdl_viterbi::{encode, Bit};
/// use Bit::{One, Zero};
///
/// let code_bits = encode(&[Zero, Zero, Zero, Zero, Zero, Zero, One]);
/// assert_eq!(code_bits.len(), 14);
/// assert_eq!(&code_bits[12 ..], [One, One]);
/// ```
#[must_use]
pub fn encode(info_bits: &[Bit]) -> Vec<Bit> {
    let mut code_bits = Vec::with_capacity(2 * info_bits.len());
    let mut state = initial_state(info_bits);
    for &info_bit in info_bits {
        let label = BranchLabel::for_transition(state, info_bit);
        code_bits.push(label.c1());
        code_bits.push(label.c2());
        state = state.successor(info_bit);
    }
    code_bits
}

/// Returns initial (and final) state of the tail-biting encoder for given information bits.
fn initial_state(info_bits: &[Bit]) -> State {
    let num_info_bits = info_bits.len();
    if num_info_bits == 0 {
        return State(0);
    }
    (0 .. STATE_LEN)
        .map(|k| info_bits[(k + STATE_LEN * num_info_bits - STATE_LEN) % num_info_bits])
        .fold(State(0), State::successor)
}

#[cfg(test)]
mod tests_of_functions {
    use super::*;
    use crate::utils;
    use Bit::{One, Zero};

    /// Returns XOR of bits in the binary representation of given integer.
    fn bitxor(num: usize) -> Bit {
        match num.count_ones() % 2 {
            0 => Zero,
            _ => One,
        }
    }

    #[test]
    fn test_branch_labels_match_generators() {
        for s00 in 0 .. NUM_BUTTERFLIES {
            let register = s00 << 1;
            let label = BranchLabel::from_bits(
                bitxor(register & GENERATOR_C1),
                bitxor(register & GENERATOR_C2),
            );
            assert_eq!(BRANCH_LABELS[s00], label);
        }
    }

    #[test]
    fn test_for_transition() {
        for state_index in 0 .. NUM_STATES {
            for input_bit in [Zero, One] {
                let register = (state_index << 1) | input_bit.value();
                let label = BranchLabel::from_bits(
                    bitxor(register & GENERATOR_C1),
                    bitxor(register & GENERATOR_C2),
                );
                assert_eq!(
                    BranchLabel::for_transition(State(state_index), input_bit),
                    label
                );
            }
        }
    }

    #[test]
    fn test_label_bits() {
        assert_eq!(BranchLabel::ZERO_ONE.c1(), One);
        assert_eq!(BranchLabel::ZERO_ONE.c2(), Zero);
        assert_eq!(BranchLabel::ONE_ZERO.c1(), Zero);
        assert_eq!(BranchLabel::ONE_ZERO.c2(), One);
        assert_eq!(BranchLabel::ONE_ONE.complement(), BranchLabel::ZERO_ZERO);
        assert_eq!(BranchLabel::ZERO_ONE.complement(), BranchLabel::ONE_ZERO);
        assert_eq!(BranchLabel::from_bits(One, Zero), BranchLabel::ZERO_ONE);
    }

    #[test]
    fn test_successor_and_predecessor() {
        assert_eq!(State(0).successor(One), State(1));
        assert_eq!(State(33).successor(Zero), State(2));
        assert_eq!(State(63).successor(One), State(63));
        for state_index in 0 .. NUM_STATES {
            let state = State(state_index);
            for input_bit in [Zero, One] {
                assert_eq!(
                    state.successor(input_bit).predecessor(state.oldest_bit()),
                    state
                );
            }
        }
    }

    #[test]
    fn test_encode() {
        assert!(encode(&[]).is_empty());
        // All-zero block stays in state 0
        assert_eq!(encode(&[Zero; 12]), [Zero; 24]);
        // Impulse response of both generators (bits shifted in from the LSB end)
        let mut info_bits = [Zero; 14];
        info_bits[0] = One;
        let code_bits = encode(&info_bits);
        let c1: Vec<Bit> = code_bits.iter().step_by(2).copied().collect();
        let c2: Vec<Bit> = code_bits.iter().skip(1).step_by(2).copied().collect();
        assert_eq!(&c1[.. 7], [One, One, One, One, Zero, Zero, One]);
        assert_eq!(&c2[.. 7], [One, Zero, One, One, Zero, One, One]);
        assert!(c1[7 ..].iter().chain(c2[7 ..].iter()).all(|&b| b == Zero));
    }

    #[test]
    fn test_encode_is_tail_biting() {
        // Cyclic shift of the information bits cyclically shifts the code bits.
        let info_bits = utils::random_bits(30);
        let code_bits = encode(&info_bits);
        let mut shifted_info_bits = info_bits.clone();
        shifted_info_bits.rotate_left(5);
        let mut shifted_code_bits = code_bits.clone();
        shifted_code_bits.rotate_left(10);
        assert_eq!(encode(&shifted_info_bits), shifted_code_bits);
        // Short blocks are encoded cyclically too.
        let info_bits = [One, Zero, One];
        let code_bits = encode(&info_bits);
        let repeated_code_bits = encode(&[One, Zero, One, One, Zero, One]);
        assert_eq!(&repeated_code_bits[.. 6], code_bits);
    }
}

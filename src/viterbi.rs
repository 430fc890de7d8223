//! Fixed-point tail-biting Viterbi decoder for the punctured SDL code
//!
//! Bit widths follow the modem hardware: soft samples are 8-bit signed, branch metrics are 6-bit
//! signed (range `[-31, 31]`), and path metrics are nominally 9-bit unsigned. Narrow widths are
//! emulated with ordinary integers plus explicit rounding and saturation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::code::{BranchLabel, State, BRANCH_LABELS};
use crate::{puncture, Bit, Error, NUM_BUTTERFLIES, NUM_STATES, STATE_LEN};

/// Largest magnitude of a branch metric (6-bit signed)
pub const BRANCH_METRIC_MAX: i32 = 31;

/// Largest path metric representable in 9 bits
pub const PATH_METRIC_MAX: u32 = 511;

/// Path metric above which all states must lie for normalization to be requested
const NORM_THRESHOLD: u32 = 255;

/// Offset subtracted from all path metrics when normalization is applied
const NORM_OFFSET: u32 = 256;

/// Path metric normalization mode
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy, Default, Deserialize, Serialize)]
pub enum Normalization {
    /// Normalization alert is tracked but no offset is ever subtracted (modem behavior)
    #[default]
    Disabled,
    /// Offset of `256` is subtracted from all path metrics in a step whenever all path metrics
    /// from the previous step exceeded `255`
    Enabled,
}

impl std::fmt::Display for Normalization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Normalization::Disabled => write!(f, "normalization disabled"),
            Normalization::Enabled => write!(f, "normalization enabled"),
        }
    }
}

/// Returns branch metric for a pair of soft samples and a branch label.
///
/// Each code bit of the label is mapped to `-1` (bit `0`) or `+1` (bit `1`) and multiplied by its
/// soft sample. The 9-bit sum is rounded to 7 bits by adding `2` and shifting right by `2`, and
/// then saturated symmetrically to 6 bits.
///
/// # Parameters
///
/// - `soft1`: Soft sample for the first code bit `c1`.
///
/// - `soft2`: Soft sample for the second code bit `c2`.
///
/// - `label`: Branch label.
///
/// # Returns
///
/// - `bm`: Branch metric in `[-31, 31]`.
///
/// # Examples
/// ```
/// use sdl_viterbi::code::BranchLabel;
/// use sdl_viterbi::viterbi::branch_metric;
///
/// assert_eq!(branch_metric(10, 5, BranchLabel::ONE_ONE), 4);
/// assert_eq!(branch_metric(127, 127, BranchLabel::ONE_ONE), 31);
/// assert_eq!(branch_metric(-128, -128, BranchLabel::ONE_ONE), -31);
/// ```
#[must_use]
pub fn branch_metric(soft1: i8, soft2: i8, label: BranchLabel) -> i32 {
    let raw = label.c1().antipodal() * i32::from(soft1) + label.c2().antipodal() * i32::from(soft2);
    ((raw + 2) >> 2).clamp(-BRANCH_METRIC_MAX, BRANCH_METRIC_MAX)
}

/// Branch metrics for all four branch labels in one trellis section
#[derive(Clone, Eq, PartialEq, Debug, Copy)]
pub struct BranchMetrics([i32; 4]);

impl BranchMetrics {
    /// Returns branch metrics for the given pair of de-punctured soft samples.
    ///
    /// Only the metrics for labels `11` and `01` are computed; those for labels `00` and `10` are
    /// their negations.
    ///
    /// # Examples
    /// ```
    /// use sdl_viterbi::code::BranchLabel;
    /// use sdl_viterbi::viterbi::BranchMetrics;
    ///
    /// let bms = BranchMetrics::new(10, 5);
    /// assert_eq!(bms.get(BranchLabel::ONE_ONE), 4);
    /// assert_eq!(bms.get(BranchLabel::ZERO_ZERO), -4);
    /// ```
    #[must_use]
    pub fn new(soft1: i8, soft2: i8) -> Self {
        let bm11 = branch_metric(soft1, soft2, BranchLabel::ONE_ONE);
        let bm01 = branch_metric(soft1, soft2, BranchLabel::ZERO_ONE);
        Self([-bm11, bm01, -bm01, bm11])
    }

    /// Returns branch metric for given label.
    #[must_use]
    pub fn get(&self, label: BranchLabel) -> i32 {
        self.0[usize::from(label.0 & 3)]
    }
}

/// Returns surviving path metric and survivor bit from an add-compare-select operation.
///
/// # Parameters
///
/// - `pm00`: Path metric of the first predecessor state (oldest bit `0`).
///
/// - `pm01`: Path metric of the second predecessor state (oldest bit `1`).
///
/// - `bm0`: Branch metric on the branch from the first predecessor.
///
/// - `bm1`: Branch metric on the branch from the second predecessor.
///
/// # Returns
///
/// - `pm`: Larger of the two candidate metrics `pm00 + bm0` and `pm01 + bm1`.
///
/// - `survivor`: `Zero` if the path from the first predecessor survives, `One` otherwise. Ties go
///   to the second predecessor.
///
/// The larger candidate metric must not be negative. This always holds in the trellis, where
/// `bm1 == -bm0`; debug builds panic if it is violated.
///
/// # Examples
/// ```
/// use sdl_viterbi::viterbi::acs;
/// use sdl_viterbi::Bit;
///
/// assert_eq!(acs(10, 5, 3, -3), (13, Bit::Zero));
/// assert_eq!(acs(10, 10, 4, 4), (14, Bit::One));
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn acs(pm00: u32, pm01: u32, bm0: i32, bm1: i32) -> (u32, Bit) {
    // Candidate metrics need a sign bit, since a branch metric can be negative.
    let cm0 = i64::from(pm00) + i64::from(bm0);
    let cm1 = i64::from(pm01) + i64::from(bm1);
    debug_assert!(
        cm0.max(cm1) >= 0,
        "Both ACS candidate metrics are negative ({cm0}, {cm1})"
    );
    // OK to cast `i64` to `u32`: The surviving candidate is not negative, and with `bm1 == -bm0`
    // the sum of the two candidates is the sum of two path metrics.
    if cm0 > cm1 {
        (cm0 as u32, Bit::Zero)
    } else {
        (cm1 as u32, Bit::One)
    }
}

/// States forming one butterfly of the trellis
#[derive(Clone, Eq, PartialEq, Debug, Copy)]
struct Butterfly {
    /// Upper predecessor
    s00: State,
    /// Lower predecessor
    s01: State,
    /// Upper successor
    s10: State,
    /// Lower successor
    s11: State,
}

impl Butterfly {
    /// Returns butterfly with given upper predecessor (in `[0, NUM_BUTTERFLIES)`).
    fn new(s00: usize) -> Self {
        Self {
            s00: State(s00),
            s01: State(s00 | NUM_BUTTERFLIES),
            s10: State(s00 << 1),
            s11: State((s00 << 1) | 1),
        }
    }
}

/// Survivor memory, holding one survivor bit per state for each traceback step
#[derive(Debug)]
struct SurvivorMemory {
    /// Survivor bits, `NUM_STATES` per slot
    bits: Vec<Bit>,
}

impl SurvivorMemory {
    /// Returns survivor memory with given number of slots.
    fn new(num_slots: usize) -> Self {
        Self {
            bits: vec![Bit::Zero; num_slots * NUM_STATES],
        }
    }

    /// Returns number of slots.
    fn num_slots(&self) -> usize {
        self.bits.len() / NUM_STATES
    }

    /// Stores survivor bit for a state in a slot.
    fn store(&mut self, slot: usize, state: State, survivor: Bit) {
        self.bits[slot * NUM_STATES + state.0] = survivor;
    }

    /// Returns survivor bit for a state in a slot.
    fn read(&self, slot: usize, state: State) -> Bit {
        self.bits[slot * NUM_STATES + state.0]
    }
}

/// Workspace for decoder, owned by a single call to [`decode_with`]
#[derive(Debug)]
struct DecoderWorkspace {
    /// Branch metrics for each information bit position
    branch_metrics: Vec<BranchMetrics>,
    /// Path metrics before the current trellis section
    pm_old: [u32; NUM_STATES],
    /// Path metrics after the current trellis section
    pm_new: [u32; NUM_STATES],
    /// Survivor memory
    survivors: SurvivorMemory,
}

impl DecoderWorkspace {
    /// Returns workspace for decoding given de-punctured soft samples.
    fn new(depunctured: &[i8], num_trace_steps: usize) -> Self {
        Self {
            branch_metrics: depunctured
                .chunks_exact(2)
                .map(|pair| BranchMetrics::new(pair[0], pair[1]))
                .collect(),
            pm_old: [0; NUM_STATES],
            pm_new: [0; NUM_STATES],
            survivors: SurvivorMemory::new(num_trace_steps),
        }
    }

    /// Runs one trellis section, writing survivor bits to given slot, and returns the
    /// normalization alert for the new path metrics.
    fn run_acs_section(&mut self, time: usize, slot: usize, pm_offset: u32) -> bool {
        let bms = self.branch_metrics[time];
        let mut norm_alert = true;
        for (s00, &label) in BRANCH_LABELS.iter().enumerate() {
            let bf = Butterfly::new(s00);
            // Offset is only ever applied when all old path metrics exceed it.
            let pm00 = self.pm_old[bf.s00.0] - pm_offset;
            let pm01 = self.pm_old[bf.s01.0] - pm_offset;
            let bm = bms.get(label);
            let (pm10, surv10) = acs(pm00, pm01, bm, -bm);
            self.pm_new[bf.s10.0] = pm10;
            self.survivors.store(slot, bf.s10, surv10);
            let (pm11, surv11) = acs(pm00, pm01, -bm, bm);
            self.pm_new[bf.s11.0] = pm11;
            self.survivors.store(slot, bf.s11, surv11);
            norm_alert &= pm10 > NORM_THRESHOLD && pm11 > NORM_THRESHOLD;
        }
        std::mem::swap(&mut self.pm_old, &mut self.pm_new);
        norm_alert
    }
}

/// Returns information bit decisions from the tail-biting Viterbi decoder.
///
/// Equivalent to [`decode_with`] with [`Normalization::Disabled`].
///
/// # Parameters
///
/// - `code_soft`: Punctured soft samples, one per transmitted code bit, with positive values
///   indicating that `One` is more likely.
///
/// - `num_info_bits`: Number of information bits in the block.
///
/// - `traceback_param`: Traceback parameter `L`. The trellis is run for `2 * L` sections past the
///   end of the block, and the first `L - STATE_LEN` traceback steps release no decisions.
///
/// # Returns
///
/// - `info_bits_hat`: Decisions on the `num_info_bits` information bits.
///
/// # Errors
///
/// Returns an error if `num_info_bits` is `0`, if `3 * code_soft.len()` does not equal
/// `4 * num_info_bits`, or if `traceback_param` is not in the range
/// `[STATE_LEN, num_info_bits]`.
///
/// # Examples
/// ```
/// use sdl_viterbi::{decode, Bit};
///
/// let code_soft = [-90; 32];
/// let info_bits_hat = decode(&code_soft, 24, 12)?;
/// assert_eq!(info_bits_hat, [Bit::Zero; 24]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn decode(
    code_soft: &[i8],
    num_info_bits: usize,
    traceback_param: usize,
) -> Result<Vec<Bit>, Error> {
    decode_with(
        code_soft,
        num_info_bits,
        traceback_param,
        Normalization::Disabled,
    )
}

/// Returns information bit decisions from the tail-biting Viterbi decoder, with given path metric
/// normalization mode.
///
/// See [`decode`] for parameters, return value and errors. The decisions do not depend on
/// `normalization`.
///
/// # Errors
///
/// Returns an error if `num_info_bits` is `0`, if `3 * code_soft.len()` does not equal
/// `4 * num_info_bits`, or if `traceback_param` is not in the range
/// `[STATE_LEN, num_info_bits]`.
pub fn decode_with(
    code_soft: &[i8],
    num_info_bits: usize,
    traceback_param: usize,
    normalization: Normalization,
) -> Result<Vec<Bit>, Error> {
    check_decoder_params(num_info_bits, traceback_param)?;
    check_code_soft_len(code_soft, num_info_bits)?;
    let num_steps = num_trellis_steps(num_info_bits, traceback_param)?;
    // Cannot overflow: Smaller than `num_steps`, since `traceback_param >= STATE_LEN`.
    let num_trace_steps = num_info_bits + traceback_param - STATE_LEN;
    let depunctured = puncture::depuncture(code_soft)?;
    let mut ws = DecoderWorkspace::new(&depunctured, num_trace_steps);
    run_recursions(&mut ws, num_steps, traceback_param, normalization);
    let (best_state, best_metric) = best_state(&ws.pm_old);
    debug!(
        num_info_bits,
        traceback_param,
        num_steps,
        best_state = best_state.0,
        best_metric,
        "Viterbi recursions done"
    );
    if best_metric > PATH_METRIC_MAX {
        debug!(
            best_metric,
            %normalization,
            "Best path metric exceeds 9-bit range"
        );
    }
    Ok(traceback(
        &ws.survivors,
        best_state,
        num_info_bits,
        traceback_param,
    ))
}

/// Checks validity of block length and traceback parameter.
///
/// # Errors
///
/// Returns an error if `num_info_bits` is `0` or not a multiple of `3`, or if `traceback_param`
/// is not in the range `[STATE_LEN, num_info_bits]`.
pub fn check_decoder_params(num_info_bits: usize, traceback_param: usize) -> Result<(), Error> {
    if num_info_bits == 0 || num_info_bits % 3 != 0 {
        return Err(Error::InvalidInput(format!(
            "Number of information bits must be a positive multiple of 3 (found {num_info_bits})"
        )));
    }
    if traceback_param < STATE_LEN || traceback_param > num_info_bits {
        return Err(Error::InvalidInput(format!(
            "For {num_info_bits} information bits, traceback parameter must be in the range \
            [{STATE_LEN}, {num_info_bits}] (found {traceback_param})"
        )));
    }
    Ok(())
}

/// Checks that number of soft samples matches the puncture ratio for given block length.
///
/// `num_info_bits` must already be known to be a multiple of `3`.
fn check_code_soft_len(code_soft: &[i8], num_info_bits: usize) -> Result<(), Error> {
    match (num_info_bits / 3).checked_mul(4) {
        Some(expected_len) if expected_len == code_soft.len() => Ok(()),
        Some(expected_len) => Err(Error::InvalidInput(format!(
            "For {} information bits, expected {} soft samples (found {})",
            num_info_bits,
            expected_len,
            code_soft.len()
        ))),
        None => Err(Error::InvalidInput(format!(
            "Number of information bits ({num_info_bits}) is too large"
        ))),
    }
}

/// Returns number of trellis sections run by the decoder (`num_info_bits + 2 * traceback_param`).
fn num_trellis_steps(num_info_bits: usize, traceback_param: usize) -> Result<usize, Error> {
    traceback_param
        .checked_mul(2)
        .and_then(|n| n.checked_add(num_info_bits))
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "Number of trellis sections overflows for {num_info_bits} information bits and \
                traceback parameter {traceback_param}"
            ))
        })
}

/// Runs all Viterbi recursions, wrapping around the end of the block.
///
/// Survivor bits from the first `traceback_param + STATE_LEN` steps all go to slot `0` and are
/// overwritten; every later step gets its own slot.
fn run_recursions(
    ws: &mut DecoderWorkspace,
    num_steps: usize,
    traceback_param: usize,
    normalization: Normalization,
) {
    let num_info_bits = ws.branch_metrics.len();
    let mut time = 0;
    let mut slot = 0;
    let mut norm_alert = false;
    for step in 0 .. num_steps {
        let pm_offset = match normalization {
            Normalization::Enabled if norm_alert => NORM_OFFSET,
            _ => 0,
        };
        norm_alert = ws.run_acs_section(time, slot, pm_offset);
        time = (time + 1) % num_info_bits;
        if step >= traceback_param + STATE_LEN {
            slot += 1;
        }
    }
}

/// Returns state with largest path metric (lowest such state on ties), and that metric.
fn best_state(path_metrics: &[u32; NUM_STATES]) -> (State, u32) {
    let mut best = (State(0), 0);
    for (state_index, &pm) in path_metrics.iter().enumerate() {
        if pm > best.1 {
            best = (State(state_index), pm);
        }
    }
    best
}

/// Returns information bits obtained by tracing back through survivor memory from given state.
///
/// Decisions from the first `traceback_param - STATE_LEN` steps are discarded. The remaining
/// decisions are written backwards starting at index `traceback_param - 1`, wrapping from `0` to
/// `num_info_bits - 1`.
fn traceback(
    survivors: &SurvivorMemory,
    start_state: State,
    num_info_bits: usize,
    traceback_param: usize,
) -> Vec<Bit> {
    let mut info_bits_hat = vec![Bit::Zero; num_info_bits];
    let mut state = start_state;
    let mut data_index = traceback_param - 1;
    for (k, slot) in (0 .. survivors.num_slots()).rev().enumerate() {
        let bit = survivors.read(slot, state);
        state = state.predecessor(bit);
        if k >= traceback_param - STATE_LEN {
            info_bits_hat[data_index] = bit;
            data_index = if data_index == 0 {
                num_info_bits - 1
            } else {
                data_index - 1
            };
        }
    }
    info_bits_hat
}

//! Simulator to evaluate performance of the SDL Viterbi decoder over BPSK-AWGN channel

use std::fs::File;
use std::io::BufWriter;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{code, puncture, utils, viterbi, Error, Normalization};

/// Parameters for SDL code simulation over BPSK-AWGN channel
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct SimParams {
    /// Number of information bits per block
    pub num_info_bits_per_block: u32,
    /// Traceback parameter of the Viterbi decoder
    pub traceback_param: u32,
    /// Path metric normalization mode of the Viterbi decoder
    pub normalization: Normalization,
    /// Soft sample value corresponding to a noiseless BPSK symbol
    pub soft_amplitude: f64,
    /// Ratio (dB) of symbol energy to noise power spectral density at BPSK-AWGN channel output
    pub es_over_n0_db: f64,
    /// Desired minimum number of block errors
    pub num_block_errors_min: u32,
    /// Number of blocks to be transmitted per run
    pub num_blocks_per_run: u32,
    /// Minimum number of runs of blocks to be simulated
    pub num_runs_min: u32,
    /// Maximum number of runs of blocks to be simulated
    pub num_runs_max: u32,
}

/// Results from SDL code simulation over BPSK-AWGN channel
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct SimResults {
    /// Simulation parameters
    pub params: SimParams,
    /// Number of runs of blocks simulated
    pub num_runs: u32,
    /// Number of blocks transmitted
    pub num_blocks: u32,
    /// Number of information bits transmitted
    pub num_info_bits: u64,
    /// Number of information bit errors
    pub num_info_bit_errors: u64,
    /// Number of block errors
    pub num_block_errors: u32,
}

impl SimResults {
    /// Returns initialized simulation results for given parameters.
    #[must_use]
    pub fn new(params: &SimParams) -> Self {
        Self {
            params: *params,
            num_runs: 0,
            num_blocks: 0,
            num_info_bits: 0,
            num_info_bit_errors: 0,
            num_block_errors: 0,
        }
    }

    /// Returns information bit error rate.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn info_bit_error_rate(&self) -> f64 {
        if self.num_info_bits == 0 {
            0.0
        } else {
            self.num_info_bit_errors as f64 / self.num_info_bits as f64
        }
    }

    /// Returns block error rate.
    #[must_use]
    pub fn block_error_rate(&self) -> f64 {
        if self.num_blocks == 0 {
            0.0
        } else {
            f64::from(self.num_block_errors) / f64::from(self.num_blocks)
        }
    }

    /// Returns `true` iff the simulation is complete.
    #[must_use]
    pub fn run_complete(&self) -> bool {
        self.num_runs >= self.params.num_runs_max
            || (self.num_runs >= self.params.num_runs_min
                && self.num_block_errors >= self.params.num_block_errors_min)
    }

    /// Updates results with the number of information bit errors in a block.
    fn update_after_block(&mut self, num_info_bit_errors_this_block: usize) {
        self.num_blocks += 1;
        self.num_info_bits += u64::from(self.params.num_info_bits_per_block);
        // OK to cast `usize` to `u64`: Error count is at most the block length, a `u32`.
        self.num_info_bit_errors += num_info_bit_errors_this_block as u64;
        if num_info_bit_errors_this_block > 0 {
            self.num_block_errors += 1;
        }
    }
}

impl std::fmt::Display for SimResults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Es/N0 = {:.2} dB, L = {}: {} blocks, BER = {:.3e}, BLER = {:.3e}",
            self.params.es_over_n0_db,
            self.params.traceback_param,
            self.num_blocks,
            self.info_bit_error_rate(),
            self.block_error_rate()
        )
    }
}

/// Runs simulations for all given parameters and saves results to a JSON file.
///
/// # Parameters
///
/// - `all_params`: Parameters for each simulation.
///
/// - `json_filename`: Name of JSON file to which results must be saved.
///
/// # Errors
///
/// Returns an error if any parameters are invalid, or if the results cannot be written to
/// `json_filename`.
pub fn run_bpsk_awgn_sims(all_params: &[SimParams], json_filename: &str) -> Result<(), Error> {
    let mut all_results = Vec::with_capacity(all_params.len());
    for params in all_params {
        let results = run_bpsk_awgn_sim(params)?;
        info!("{results}");
        all_results.push(results);
    }
    let writer = BufWriter::new(File::create(json_filename)?);
    serde_json::to_writer_pretty(writer, &all_results)?;
    Ok(())
}

/// Runs simulation for given parameters and returns results.
///
/// Blocks within a run are simulated in parallel.
///
/// # Errors
///
/// Returns an error if `params` is invalid.
pub fn run_bpsk_awgn_sim(params: &SimParams) -> Result<SimResults, Error> {
    check_sim_params(params)?;
    let mut results = SimResults::new(params);
    while !results.run_complete() {
        let all_num_errors = (0 .. params.num_blocks_per_run)
            .into_par_iter()
            .map(|_| simulate_block(params))
            .collect::<Result<Vec<usize>, Error>>()?;
        for num_errors in all_num_errors {
            results.update_after_block(num_errors);
        }
        results.num_runs += 1;
    }
    Ok(results)
}

/// Simulates transmission of one block and returns the number of information bit errors.
fn simulate_block(params: &SimParams) -> Result<usize, Error> {
    let num_info_bits = params.num_info_bits_per_block as usize;
    let info_bits = utils::random_bits(num_info_bits);
    let code_bits = puncture::puncture(&code::encode(&info_bits));
    let code_soft =
        utils::bpsk_awgn_channel(&code_bits, params.es_over_n0_db, params.soft_amplitude);
    let info_bits_hat = viterbi::decode_with(
        &code_soft,
        num_info_bits,
        params.traceback_param as usize,
        params.normalization,
    )?;
    Ok(utils::error_count(&info_bits_hat, &info_bits))
}

/// Checks validity of simulation parameters.
fn check_sim_params(params: &SimParams) -> Result<(), Error> {
    viterbi::check_decoder_params(
        params.num_info_bits_per_block as usize,
        params.traceback_param as usize,
    )?;
    if !(params.soft_amplitude > 0.0 && params.soft_amplitude.is_finite()) {
        return Err(Error::InvalidInput(format!(
            "Soft sample amplitude must be positive (found {})",
            params.soft_amplitude
        )));
    }
    if params.num_blocks_per_run == 0 {
        return Err(Error::InvalidInput(
            "Number of blocks per run cannot be zero".to_string(),
        ));
    }
    if params.num_runs_min > params.num_runs_max {
        return Err(Error::InvalidInput(format!(
            "Minimum number of runs ({}) exceeds maximum number of runs ({})",
            params.num_runs_min, params.num_runs_max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests_of_functions {
    use float_eq::assert_float_eq;

    use super::*;

    fn params_for_test() -> SimParams {
        SimParams {
            num_info_bits_per_block: 48,
            traceback_param: 24,
            normalization: Normalization::Disabled,
            soft_amplitude: 32.0,
            es_over_n0_db: 3.0,
            num_block_errors_min: 10,
            num_blocks_per_run: 8,
            num_runs_min: 1,
            num_runs_max: 2,
        }
    }

    #[test]
    fn test_check_sim_params() {
        // Invalid inputs
        let params = SimParams {
            num_info_bits_per_block: 40,
            ..params_for_test()
        };
        assert!(check_sim_params(&params).is_err());
        let params = SimParams {
            traceback_param: 5,
            ..params_for_test()
        };
        assert!(check_sim_params(&params).is_err());
        let params = SimParams {
            soft_amplitude: 0.0,
            ..params_for_test()
        };
        assert!(check_sim_params(&params).is_err());
        let params = SimParams {
            num_blocks_per_run: 0,
            ..params_for_test()
        };
        assert!(check_sim_params(&params).is_err());
        let params = SimParams {
            num_runs_min: 3,
            num_runs_max: 2,
            ..params_for_test()
        };
        assert!(check_sim_params(&params).is_err());
        // Valid input
        assert!(check_sim_params(&params_for_test()).is_ok());
    }

    #[test]
    fn test_sim_results() {
        let mut results = SimResults::new(&params_for_test());
        assert_float_eq!(results.info_bit_error_rate(), 0.0, abs <= 1e-12);
        assert_float_eq!(results.block_error_rate(), 0.0, abs <= 1e-12);
        results.update_after_block(0);
        results.update_after_block(3);
        results.update_after_block(0);
        results.update_after_block(9);
        assert_eq!(results.num_blocks, 4);
        assert_eq!(results.num_info_bits, 192);
        assert_eq!(results.num_info_bit_errors, 12);
        assert_eq!(results.num_block_errors, 2);
        assert_float_eq!(results.info_bit_error_rate(), 0.0625, abs <= 1e-12);
        assert_float_eq!(results.block_error_rate(), 0.5, abs <= 1e-12);
    }

    #[test]
    fn test_run_complete() {
        let params = SimParams {
            num_block_errors_min: 2,
            num_runs_min: 1,
            num_runs_max: 3,
            ..params_for_test()
        };
        let mut results = SimResults::new(&params);
        assert!(!results.run_complete());
        results.num_runs = 1;
        assert!(!results.run_complete());
        results.num_block_errors = 2;
        assert!(results.run_complete());
        results.num_block_errors = 0;
        results.num_runs = 3;
        assert!(results.run_complete());
    }

    #[test]
    fn test_run_bpsk_awgn_sim() {
        // High SNR: no errors, so all runs up to the maximum are simulated.
        let params = SimParams {
            es_over_n0_db: 30.0,
            ..params_for_test()
        };
        let results = run_bpsk_awgn_sim(&params).unwrap();
        assert_eq!(results.num_runs, 2);
        assert_eq!(results.num_blocks, 16);
        assert_eq!(results.num_info_bits, 768);
        assert_eq!(results.num_info_bit_errors, 0);
        // Very low SNR: every block is in error, so the minimum number of runs suffices.
        let params = SimParams {
            es_over_n0_db: -20.0,
            num_block_errors_min: 4,
            ..params_for_test()
        };
        let results = run_bpsk_awgn_sim(&params).unwrap();
        assert_eq!(results.num_runs, 1);
        assert_eq!(results.num_block_errors, 8);
    }

    #[test]
    fn test_run_bpsk_awgn_sims() {
        let json_filename = std::env::temp_dir().join("sdl_viterbi_test_results.json");
        let json_filename = json_filename.to_str().unwrap();
        let all_params = [
            SimParams {
                es_over_n0_db: 30.0,
                ..params_for_test()
            },
            SimParams {
                es_over_n0_db: 30.0,
                normalization: Normalization::Enabled,
                ..params_for_test()
            },
        ];
        run_bpsk_awgn_sims(&all_params, json_filename).unwrap();
        let all_results: Vec<SimResults> =
            serde_json::from_reader(File::open(json_filename).unwrap()).unwrap();
        assert_eq!(all_results.len(), 2);
        assert_eq!(all_results[0].params, all_params[0]);
        assert_eq!(all_results[1].params, all_params[1]);
        assert_eq!(all_results[1].num_info_bit_errors, 0);
        std::fs::remove_file(json_filename).unwrap();
        // Invalid parameters
        let all_params = [SimParams {
            num_blocks_per_run: 0,
            ..params_for_test()
        }];
        assert!(run_bpsk_awgn_sims(&all_params, json_filename).is_err());
    }
}

//! This crate simulates the BER-versus-SNR and BLER-versus-SNR performance of the tail-biting
//! Viterbi decoder for the punctured SDL convolutional code over a BPSK-AWGN channel. Simulation
//! parameters are specified on the command line, and simulation results are saved to a JSON file.
//!
//! Build the executable with `cargo build --release` and then run `./target/release/sdl-viterbi -h`
//! for help on the command-line interface. Set `RUST_LOG=info` to see per-point results.

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

use anyhow::Result;
use clap::parser::ValueSource;
use clap::{crate_name, crate_version, value_parser, Arg, ArgMatches, Command};
use itertools::iproduct;
use sdl_viterbi::{sim, Normalization};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main function
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();
    let timer = Instant::now();
    let matches = command_line_parser().get_matches();
    let json_filename = &json_filename_from_matches(&matches);
    sim::run_bpsk_awgn_sims(&all_sim_params(&matches), json_filename)?;
    info!("Elapsed time: {:.3?}", timer.elapsed());
    Ok(())
}

/// Returns command line parser.
fn command_line_parser() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .about("Evaluates the performance of the SDL Viterbi decoder over a BPSK-AWGN channel")
        .arg(num_info_bits_per_block())
        .arg(traceback_params())
        .arg(normalization())
        .arg(soft_amplitude())
        .arg(first_snr_db())
        .arg(snr_step_db())
        .arg(num_snr())
        .arg(num_block_errors_min())
        .arg(num_blocks_per_run())
        .arg(num_runs_min())
        .arg(num_runs_max())
        .arg(json_filename())
}

/// Returns argument for number of information bits per block.
fn num_info_bits_per_block() -> Arg {
    Arg::new("num_info_bits_per_block")
        .short('i')
        .value_parser(value_parser!(u32))
        .default_value("96")
        .help("Number of information bits per block (multiple of 3)")
}

/// Returns argument for traceback parameters.
fn traceback_params() -> Arg {
    Arg::new("traceback_params")
        .short('l')
        .value_parser(value_parser!(u32))
        .num_args(1 ..)
        .default_value("32")
        .help("Traceback parameters of the decoder (one simulation per value)")
}

/// Returns argument for path metric normalization mode.
fn normalization() -> Arg {
    Arg::new("normalization")
        .short('z')
        .value_parser(["disabled", "enabled"])
        .default_value("disabled")
        .help("Path metric normalization mode")
}

/// Returns argument for soft sample amplitude.
fn soft_amplitude() -> Arg {
    Arg::new("soft_amplitude")
        .short('m')
        .value_parser(value_parser!(f64))
        .default_value("32.0")
        .help("Soft sample value for a noiseless BPSK symbol")
}

/// Returns argument for first Es/N0 (dB).
fn first_snr_db() -> Arg {
    Arg::new("first_snr_db")
        .short('r')
        .value_parser(value_parser!(f64))
        .allow_negative_numbers(true)
        .default_value("0.0")
        .help("First Es/N0 (dB)")
}

/// Returns argument for Es/N0 step (dB).
fn snr_step_db() -> Arg {
    Arg::new("snr_step_db")
        .short('p')
        .value_parser(value_parser!(f64))
        .allow_negative_numbers(true)
        .default_value("1.0")
        .help("Es/N0 step (dB)")
}

/// Returns argument for number of Es/N0 values.
fn num_snr() -> Arg {
    Arg::new("num_snr")
        .short('s')
        .value_parser(value_parser!(u32))
        .default_value("4")
        .help("Number of Es/N0 values")
}

/// Returns argument for desired minimum number of block errors.
fn num_block_errors_min() -> Arg {
    Arg::new("num_block_errors_min")
        .short('e')
        .value_parser(value_parser!(u32))
        .default_value("500")
        .help("Desired minimum number of block errors")
}

/// Returns argument for number of blocks to be transmitted per run.
fn num_blocks_per_run() -> Arg {
    Arg::new("num_blocks_per_run")
        .short('b')
        .value_parser(value_parser!(u32))
        .default_value("1000")
        .help("Number of blocks to be transmitted per run")
}

/// Returns argument for minimum number of runs of blocks to be simulated.
fn num_runs_min() -> Arg {
    Arg::new("num_runs_min")
        .short('n')
        .value_parser(value_parser!(u32))
        .default_value("10")
        .help("Minimum number of runs of blocks to be simulated")
}

/// Returns argument for maximum number of runs of blocks to be simulated.
fn num_runs_max() -> Arg {
    Arg::new("num_runs_max")
        .short('x')
        .value_parser(value_parser!(u32))
        .default_value("100")
        .help("Maximum number of runs of blocks to be simulated")
}

/// Returns argument for name of JSON file to which results must be saved.
fn json_filename() -> Arg {
    Arg::new("json_filename")
        .short('f')
        .default_value("results.json")
        .help("Name of JSON file to which results must be saved")
}

/// Returns simulation parameters based on command-line arguments.
fn all_sim_params(matches: &ArgMatches) -> Vec<sim::SimParams> {
    let mut num_runs_min = num_runs_min_from_matches(matches);
    let mut num_runs_max = num_runs_max_from_matches(matches);
    if num_runs_min > num_runs_max {
        if let Some(ValueSource::DefaultValue) = matches.value_source("num_runs_min") {
            num_runs_min = num_runs_max;
        }
        if let Some(ValueSource::DefaultValue) = matches.value_source("num_runs_max") {
            num_runs_max = num_runs_min;
        }
    }
    // OK to unwrap: All command-line arguments have default values, so an error cannot occur
    // in any of the associated functions called below.
    iproduct!(
        traceback_params_from_matches(matches),
        all_es_over_n0_db_from_matches(matches)
    )
    .map(|(traceback_param, es_over_n0_db)| sim::SimParams {
        num_info_bits_per_block: num_info_bits_per_block_from_matches(matches),
        traceback_param,
        normalization: normalization_from_matches(matches),
        soft_amplitude: soft_amplitude_from_matches(matches),
        es_over_n0_db,
        num_block_errors_min: num_block_errors_min_from_matches(matches),
        num_blocks_per_run: num_blocks_per_run_from_matches(matches),
        num_runs_min,
        num_runs_max,
    })
    .collect()
}

/// Returns number of information bits per block.
fn num_info_bits_per_block_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_info_bits_per_block").unwrap()
}

/// Returns all traceback parameters.
fn traceback_params_from_matches(matches: &ArgMatches) -> Vec<u32> {
    matches
        .get_many::<u32>("traceback_params")
        .unwrap()
        .copied()
        .collect()
}

/// Returns path metric normalization mode.
fn normalization_from_matches(matches: &ArgMatches) -> Normalization {
    match matches
        .get_one::<String>("normalization")
        .unwrap()
        .as_str()
    {
        "enabled" => Normalization::Enabled,
        "disabled" => Normalization::Disabled,
        _ => panic!("Invalid normalization mode"),
    }
}

/// Returns soft sample amplitude.
fn soft_amplitude_from_matches(matches: &ArgMatches) -> f64 {
    *matches.get_one("soft_amplitude").unwrap()
}

/// Returns all Es/N0 (dB) values.
fn all_es_over_n0_db_from_matches(matches: &ArgMatches) -> Vec<f64> {
    let first_snr_db: f64 = *matches.get_one("first_snr_db").unwrap();
    let snr_step_db: f64 = *matches.get_one("snr_step_db").unwrap();
    let num_snr: u32 = *matches.get_one("num_snr").unwrap();
    (0 .. num_snr)
        .map(|n| first_snr_db + snr_step_db * f64::from(n))
        .collect()
}

/// Returns desired minimum number of block errors.
fn num_block_errors_min_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_block_errors_min").unwrap()
}

/// Returns number of blocks to be transmitted per run.
fn num_blocks_per_run_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_blocks_per_run").unwrap()
}

/// Returns minimum number of runs of blocks to be simulated.
fn num_runs_min_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_runs_min").unwrap()
}

/// Returns maximum number of runs of blocks to be simulated.
fn num_runs_max_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_runs_max").unwrap()
}

/// Returns name of JSON file to which simulation results must be saved.
fn json_filename_from_matches(matches: &ArgMatches) -> String {
    matches
        .get_one::<String>("json_filename")
        .unwrap()
        .to_string()
}

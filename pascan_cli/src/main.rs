//! Interactive photoacoustic screening console.
//!
//! Trains the diagnostic model once at startup, then walks the
//! operator through one patient at a time: four band readings, each
//! with immediate feedback against the normal population, followed by
//! the calibrated diagnosis.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use log::info;

use pascan_core::synth::{
    generate, DEFAULT_CANCER_RATIO, DEFAULT_NOISE_STD, DEFAULT_SAMPLES, DEFAULT_SEED,
};
use pascan_core::{
    train, DiagnosticModel, RiskLabel, TrainConfig, BAND_NAMES, NORMAL_MEANS, NORMAL_STDS,
};

#[derive(Debug, Parser)]
#[command(
    name = "pascan",
    version,
    about = "Photoacoustic spectral cancer-risk screening console",
    long_about = "Trains a calibrated classifier on synthetic photoacoustic spectra at \
        startup, then scores patient readings interactively.\n\n\
        EXAMPLES:\n\
        \n  pascan                       Train with the demonstration defaults\n\
        \n  pascan --samples 5000 -v     Larger training set, info logging\n\
        \n  pascan --seed 7              Reproduce a specific training run"
)]
struct Cli {
    /// Number of synthetic training samples
    #[arg(long, default_value_t = DEFAULT_SAMPLES)]
    samples: usize,

    /// Fraction of cancer-labelled samples
    #[arg(long, default_value_t = DEFAULT_CANCER_RATIO)]
    cancer_ratio: f64,

    /// Standard deviation of the additive measurement noise
    #[arg(long, default_value_t = DEFAULT_NOISE_STD)]
    noise: f64,

    /// Seed for data generation and training
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Increase verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    println!("pascan – photoacoustic cancer-risk screening");
    println!("training on {} synthetic samples...", cli.samples);

    let dataset = generate(cli.samples, cli.cancer_ratio, cli.noise, cli.seed);
    let config = TrainConfig {
        seed: cli.seed,
        ..TrainConfig::default()
    };
    let model = match train(&dataset, &config) {
        Ok(model) => model,
        Err(err) => {
            eprintln!("training failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    info!(
        "model ready: validation roc_auc {:.3}, threshold {:.3} ({} train / {} validation rows)",
        model.summary.roc_auc, model.threshold, model.summary.n_train, model.summary.n_validation
    );
    println!(
        "model ready (threshold {:.2}); type 'exit' at any prompt to quit\n",
        model.threshold
    );

    match run_session(&model) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("console error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run_session(model: &DiagnosticModel) -> io::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut patient = 1u32;

    loop {
        println!("Patient {patient}: provide the four IR band readings.");

        let mut readings = Vec::with_capacity(BAND_NAMES.len());
        for (band, name) in BAND_NAMES.iter().enumerate() {
            let Some(value) = prompt_reading(&mut lines, name, band)? else {
                println!("Goodbye!");
                return Ok(());
            };
            readings.push(value);
        }

        match model.score(&readings) {
            Ok(diagnosis) => {
                println!();
                println!(
                    "Patient {patient}: probability {:.3} (threshold {:.2})",
                    diagnosis.probability, diagnosis.threshold
                );
                match diagnosis.risk {
                    RiskLabel::High => {
                        println!("HIGH RISK of cancer detection - further diagnosis advised")
                    }
                    RiskLabel::Low => println!("low risk of cancer detection"),
                }
            }
            Err(err) => println!("reading rejected: {err}"),
        }

        print!("\nPress Enter for the next patient or type 'exit' to quit: ");
        io::stdout().flush()?;
        match lines.next().transpose()? {
            None => {
                println!("Goodbye!");
                return Ok(());
            }
            Some(line) if is_quit(&line) => {
                println!("Goodbye!");
                return Ok(());
            }
            Some(_) => patient += 1,
        }
        println!();
    }
}

/// Prompt until a number arrives; `None` means the operator quit.
fn prompt_reading(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    name: &str,
    band: usize,
) -> io::Result<Option<f64>> {
    loop {
        print!("  {name}: ");
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            return Ok(None);
        };
        let entry = line.trim();
        if is_quit(entry) {
            return Ok(None);
        }

        match entry.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                println!("   {}", band_feedback(band, value));
                return Ok(Some(value));
            }
            _ => println!("   invalid input, please enter a number"),
        }
    }
}

fn is_quit(entry: &str) -> bool {
    matches!(entry.trim().to_lowercase().as_str(), "exit" | "q")
}

/// Position of a reading relative to the normal population's band range.
fn band_feedback(band: usize, value: f64) -> &'static str {
    let mean = NORMAL_MEANS[band];
    let std = NORMAL_STDS[band];
    if (value - mean).abs() <= std {
        "at normal level"
    } else if value > mean {
        "higher than normal level"
    } else {
        "lower than normal level"
    }
}

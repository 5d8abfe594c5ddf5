use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::{info, LevelFilter};
use sirca::mean_field::{Fractions, MeanField};
use sirca::reporters::census;
use sirca::*;

#[derive(Parser)]
#[command(name = "sirca")]
#[command(about = "SIR cellular automaton with an evolving pathogen", long_about = None)]
struct Cli {
    /// Infectiousness of the seeded cells
    #[arg(short = 'i', long)]
    infectiousness: Option<f64>,

    /// Infection duration in ticks
    #[arg(short = 'd', long)]
    infection_duration: Option<Tick>,

    /// Infection load at which the infection probability is 0.5
    #[arg(short = 'r', long)]
    h_inf: Option<f64>,

    /// Resistance duration in ticks
    #[arg(long)]
    resistance_duration: Option<Tick>,

    /// Fraction of cells infected at the start
    #[arg(long)]
    seed_density: Option<f64>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    /// Wrap both axes
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "bounded")]
    torus: bool,

    /// Hard grid edges
    #[arg(long, action = ArgAction::SetTrue)]
    bounded: bool,

    /// Random seed, drawn from the OS when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Compute cells on the rayon pool
    #[arg(long, action = ArgAction::SetTrue)]
    parallel: bool,

    /// JSON file with a model configuration, flags override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 200)]
    ticks: usize,

    /// Time series output
    #[arg(short, long, default_value = "output.csv")]
    output: PathBuf,

    /// Write a JSON snapshot of the final grid
    #[arg(long)]
    json: Option<PathBuf>,

    /// Print the final grid
    #[arg(long, action = ArgAction::SetTrue)]
    render: bool,

    /// -v info, -vv debug, -vvv trace
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn model_config(&self) -> Result<ModelConfig> {
        let mut config = match &self.config {
            Some(path) => ModelConfig::from_json_file(path)?,
            None => ModelConfig::default(),
        };
        if let Some(x) = self.infectiousness {
            config.infectiousness = x;
        }
        if let Some(x) = self.infection_duration {
            config.infection_duration = x;
        }
        if let Some(x) = self.h_inf {
            config.h_inf = x;
        }
        if let Some(x) = self.resistance_duration {
            config.resistance_duration = x;
        }
        if let Some(x) = self.seed_density {
            config.seed_density = x;
        }
        if let Some(x) = self.width {
            config.width = x;
        }
        if let Some(x) = self.height {
            config.height = x;
        }
        if self.torus {
            config.torus = true;
        }
        if self.bounded {
            config.torus = false;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.parallel {
            config.execution = ExecutionMode::Parallel;
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.model_config()?;
    let mut model = Model::new(config)?;

    let initial = Fractions::from_census(&census(model.cells()));
    let series = model.run_and_write_csv(cli.ticks, &cli.output)?;

    if let (Some(initial), Some(last)) = (initial, series.observations().last()) {
        let mut reference = MeanField::new(model.config(), initial);
        let expected = reference.trajectory(last.tick).pop().unwrap_or(initial);
        info!(
            "tick {}: S={:.3} I={:.3} R={:.3} (mean field S={:.3} I={:.3} R={:.3})",
            last.tick,
            last.susceptible,
            last.infected,
            last.resistant,
            expected.susceptible,
            expected.infected,
            expected.resistant
        );
    }

    if let Some(path) = &cli.json {
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer(file, &model.generate_json())?;
        info!("wrote snapshot to {}", path.display());
    }
    if cli.render {
        print!("{}", model.grid());
    }
    Ok(())
}

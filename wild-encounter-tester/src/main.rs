mod reports;
mod seeds;
mod simulation;
mod world;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use seeds::{resolve_seed_inputs, split_csv};
use simulation::{Scenario, ScenarioResult, Simulation, expand_scenarios};
use wild_encounter::{EncounterCatalog, EncounterConfig};

const SAMPLE_CATALOG: &str = include_str!("../../wild-encounter/data/catalog.json");

#[derive(Debug, Parser)]
#[command(name = "wild-encounter-tester", version = "0.1.0")]
#[command(about = "Seeded scenario runner for the wild encounter engine")]
struct Args {
    /// Scenarios to run (comma-separated, `all` for every scenario)
    #[arg(long, default_value = "walk")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated; decimal, 0x hex, or `default`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Steps (or polls) per scenario run
    #[arg(long, default_value_t = 500)]
    steps: usize,

    /// Encounter catalog JSON; the bundled sample catalog when omitted
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Engine configuration JSON; defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let (scenarios, unknown) = expand_scenarios(&split_csv(&args.scenarios));
    for name in &unknown {
        eprintln!("⚠️  Unknown scenario: {}", name.yellow());
    }
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let simulation = Simulation::new(
        load_catalog(args.catalog.as_ref())?,
        load_config(args.config.as_ref())?,
        args.steps,
        args.verbose,
    );

    let results = run_scenarios(&simulation, &scenarios, &seeds)?;
    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for scenario in Scenario::ALL {
        writeln!(
            output_target.writer(),
            "  {:15} - {}",
            scenario.key(),
            scenario.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🌿 Wild Encounter Tester".bright_cyan().bold());
    println!("{}", "========================".cyan());
}

fn load_catalog(path: Option<&PathBuf>) -> Result<EncounterCatalog> {
    let Some(path) = path else {
        return EncounterCatalog::from_json(SAMPLE_CATALOG).context("parse bundled catalog");
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    EncounterCatalog::from_json(&json)
        .with_context(|| format!("invalid catalog {}", path.display()))
}

fn load_config(path: Option<&PathBuf>) -> Result<EncounterConfig> {
    let Some(path) = path else {
        return Ok(EncounterConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    EncounterConfig::from_json(&json)
        .with_context(|| format!("invalid config {}", path.display()))
}

fn run_scenarios(
    simulation: &Simulation,
    scenarios: &[Scenario],
    seeds: &[u64],
) -> Result<Vec<ScenarioResult>> {
    println!("{}", "🧪 Running Scenarios".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let mut results = Vec::with_capacity(scenarios.len() * seeds.len());
    for scenario in scenarios {
        for seed in seeds {
            let result = simulation
                .run(*scenario, *seed)
                .with_context(|| format!("scenario {} seed {seed}", scenario.key()))?;
            let mark = if result.passed {
                "✅".green()
            } else {
                "❌".red()
            };
            println!(
                "{mark} [{} seed {}] {} encounters - {:?}",
                scenario.key(),
                seed,
                result.encounters,
                result.duration
            );
            results.push(result);
        }
    }
    Ok(results)
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            reports::generate_json_report(&mut output_target, results)?;
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Wild Encounter Scenario Results\n\n_No scenarios executed._"
                )?;
            } else {
                reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
        }
    }

    if args.report != "json" {
        let duration = start_time.elapsed();
        writeln!(&mut output_target)?;
        writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

//! ReserveFlow command-line entry point.
//!
//! Runs one or more seeded replications of a scenario and prints a
//! run summary, optionally exporting per-step snapshots to CSV.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use simulation::{run_many, stats, RunSummary, Scenario, StepFrequency};
use tracing::info;
use types::{Currency, SimulationResult};

/// ReserveFlow: multi-agent simulation of international reserve management
#[derive(Parser, Debug)]
#[command(name = "reserveflow")]
#[command(about = "Simulates central-bank reserve portfolios under stochastic FX and geopolitical risk")]
#[command(version)]
struct Args {
    /// Scenario preset: baseline, crisis, dedollarization, inflation-surge
    #[arg(long, env = "RESERVEFLOW_SCENARIO", default_value = "baseline")]
    scenario: Scenario,

    /// Number of steps to simulate
    #[arg(long, env = "RESERVEFLOW_STEPS", default_value_t = 365)]
    steps: u64,

    /// Base RNG seed (defaults to the scenario's default seed)
    #[arg(long, env = "RESERVEFLOW_SEED")]
    seed: Option<u64>,

    /// Step frequency: daily, weekly, monthly
    #[arg(long, env = "RESERVEFLOW_FREQUENCY", default_value = "daily")]
    frequency: StepFrequency,

    /// Independent replications, seeded base, base+1, ...
    #[arg(long, env = "RESERVEFLOW_REPLICATIONS", default_value_t = 1)]
    replications: usize,

    /// Run replications sequentially even when built with the parallel feature
    #[arg(long, env = "RESERVEFLOW_SEQUENTIAL")]
    sequential: bool,

    /// Write per-step snapshots of the first replication to this CSV file
    #[arg(long, env = "RESERVEFLOW_CSV")]
    csv: Option<PathBuf>,

    /// Print run summaries as JSON instead of the text digest
    #[arg(long, env = "RESERVEFLOW_JSON")]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = args.scenario.config().with_frequency(args.frequency);
    let seed = args.seed.unwrap_or(config.default_seed);
    let dt = config.dt();
    let replications = args.replications.max(1);

    info!(
        scenario = %args.scenario,
        steps = args.steps,
        seed,
        replications,
        "starting run"
    );

    let results = run_many(&config, args.steps, seed, replications, args.sequential)?;

    if let Some(path) = &args.csv {
        write_csv(path, &results[0])?;
        info!(path = %path.display(), "snapshot CSV written");
    }

    let summaries: Vec<RunSummary> = results
        .iter()
        .filter_map(|r| RunSummary::from_result(r, dt))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for summary in &summaries {
        println!("{summary}");
        println!();
    }
    if summaries.len() > 1 {
        print_aggregate(&summaries);
    }
    Ok(())
}

/// Cross-replication means of the headline figures.
fn print_aggregate(summaries: &[RunSummary]) {
    let mean_of = |f: fn(&RunSummary) -> f64| {
        let series: Vec<f64> = summaries.iter().map(f).collect();
        stats::mean(&series).unwrap_or(0.0)
    };

    println!("Aggregate over {} replications", summaries.len());
    println!(
        "  gold {:.2} USD/oz, SDR {:.4} USD, crisis {:.1}% of steps",
        mean_of(|s| s.final_gold_price),
        mean_of(|s| s.final_sdr_value),
        mean_of(|s| s.crisis_fraction) * 100.0
    );
    println!(
        "  reserves {:.1} bn USD, USD share {:.1}%, gold share {:.1}%",
        mean_of(|s| s.final_total_reserves_usd) / 1e9,
        mean_of(|s| s.final_usd_share) * 100.0,
        mean_of(|s| s.final_gold_share) * 100.0
    );
}

/// One row per step: market prices, aggregate reserves, and activity counts.
fn write_csv(path: &Path, result: &SimulationResult) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);

    write!(out, "step,regime,risk_index")?;
    for currency in Currency::NON_BASE {
        write!(out, ",{}", currency.code())?;
    }
    writeln!(
        out,
        ",usd_index,gold,silver,gold_silver_ratio,sdr,total_reserves_usd,usd_share,gold_share,interventions,rebalances"
    )?;

    // USD index is quoted against the run's first recorded rates.
    let Some(first) = result.snapshots.first() else {
        return out.flush();
    };
    let reference = &first.market.rates;
    for snapshot in &result.snapshots {
        let market = &snapshot.market;
        write!(
            out,
            "{},{},{}",
            snapshot.tick(),
            if market.regime.is_crisis() { "crisis" } else { "calm" },
            market.risk_index
        )?;
        for currency in Currency::NON_BASE {
            write!(out, ",{}", market.rates.get(currency))?;
        }
        writeln!(
            out,
            ",{},{},{},{},{},{},{},{},{},{}",
            market.rates.usd_index(reference),
            market.gold_price,
            market.silver_price,
            market.gold_silver_ratio(),
            market.sdr_value,
            snapshot.total_reserves_usd,
            snapshot.usd_share,
            snapshot.gold_share,
            snapshot.interventions,
            snapshot.rebalances
        )?;
    }
    out.flush()
}

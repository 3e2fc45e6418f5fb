//! Trendgate CLI: evaluate candle files, record outcomes, manage the day.
//!
//! Commands:
//! - `evaluate`: run the pipeline once for one instrument
//! - `batch`: evaluate every entry of a TOML manifest in parallel
//! - `outcome`: record a realized trade P&L against the session
//! - `session status` / `session reset`: inspect or reset the daily state
//! - `config check` / `config default`: validate or print configuration
//! - `synth`: write a seeded random-walk candle CSV
//!
//! Session state lives in a JSON file (`--state`) between invocations. A
//! command run on a new market-local day starts a fresh session.

mod inputs;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use inputs::{load_state, parse_now, save_state, AtmQuotes, BatchManifest};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trendgate_core::config::SignalConfig;
use trendgate_core::data::{load_candles, save_candles};
use trendgate_core::domain::CandleSeries;
use trendgate_core::engine::{Decision, EvaluationRequest, SignalOrchestrator};
use trendgate_core::premium::Quote;
use trendgate_core::risk::{DailySnapshot, TradeOutcome};
use trendgate_core::synthetic::random_walk;
use trendgate_core::TradingSession;

#[derive(Parser)]
#[command(
    name = "trendgate",
    about = "Trendgate CLI: multi-timeframe options signal pipeline"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. info, debug, trendgate_core=trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Configuration and session state shared by the stateful commands.
#[derive(Args)]
struct SessionArgs {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Session state file (JSON). Created when missing.
    #[arg(long, default_value = "session.json")]
    state: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once for one instrument.
    Evaluate {
        #[command(flatten)]
        session: SessionArgs,

        /// Instrument symbol (e.g., NIFTY, BANKNIFTY).
        #[arg(long)]
        instrument: String,

        /// Higher-timeframe candle CSV.
        #[arg(long)]
        htf: PathBuf,

        /// Lower-timeframe candle CSV.
        #[arg(long)]
        ltf: PathBuf,

        /// ATM call premium.
        #[arg(long)]
        call_premium: Option<f64>,

        /// ATM put premium.
        #[arg(long)]
        put_premium: Option<f64>,

        /// Underlying price for strike selection. Defaults to the last LTF close.
        #[arg(long)]
        spot: Option<f64>,

        /// Tradable capital.
        #[arg(long)]
        capital: f64,

        /// Evaluation time (RFC 3339). Defaults to now.
        #[arg(long)]
        now: Option<String>,

        /// Print the decision as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Evaluate every entry of a TOML manifest in parallel.
    Batch {
        #[command(flatten)]
        session: SessionArgs,

        /// Path to the batch manifest.
        #[arg(long)]
        manifest: PathBuf,

        /// Evaluation time (RFC 3339). Overrides the manifest's `now`.
        #[arg(long)]
        now: Option<String>,

        /// Print decisions as JSON lines.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Record a realized trade P&L.
    Outcome {
        #[command(flatten)]
        session: SessionArgs,

        /// Realized P&L (negative for a loss).
        #[arg(long, allow_hyphen_values = true)]
        pnl: f64,

        /// Time of the outcome (RFC 3339). Defaults to now.
        #[arg(long)]
        now: Option<String>,
    },
    /// Inspect or reset the daily session.
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Validate or print configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Write a seeded random-walk candle CSV.
    Synth {
        /// Symbol; also seeds the generator.
        #[arg(long)]
        symbol: String,

        /// First candle time (RFC 3339).
        #[arg(long)]
        start: String,

        /// Number of candles.
        #[arg(long, default_value_t = 200)]
        count: usize,

        /// Minutes between candles.
        #[arg(long, default_value_t = 5)]
        interval: i64,

        /// Opening price.
        #[arg(long, default_value_t = 22_000.0)]
        base: f64,

        /// Output CSV path.
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Print the current daily snapshot.
    Status {
        #[command(flatten)]
        session: SessionArgs,

        /// Print the snapshot as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Start a new session: counters zeroed, any pause lifted.
    Reset {
        #[command(flatten)]
        session: SessionArgs,

        /// Session date (YYYY-MM-DD). Defaults to today in market time.
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Parse and validate a config file, then print its hash.
    Check {
        /// Path to the TOML config file.
        path: PathBuf,
    },
    /// Print the default configuration as TOML.
    Default {
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    match cli.command {
        Commands::Evaluate {
            session,
            instrument,
            htf,
            ltf,
            call_premium,
            put_premium,
            spot,
            capital,
            now,
            json,
        } => {
            let quotes = AtmQuotes {
                instrument: instrument.clone(),
                call: call_premium.map(Quote::premium),
                put: put_premium.map(Quote::premium),
            };
            run_evaluate(&session, &instrument, &htf, &ltf, quotes, spot, capital, now, json)
        }
        Commands::Batch {
            session,
            manifest,
            now,
            json,
        } => run_batch(&session, &manifest, now, json),
        Commands::Outcome { session, pnl, now } => run_outcome(&session, pnl, now),
        Commands::Session { action } => match action {
            SessionAction::Status { session, json } => run_status(&session, json),
            SessionAction::Reset { session, date } => run_reset(&session, date),
        },
        Commands::Config { action } => match action {
            ConfigAction::Check { path } => run_config_check(&path),
            ConfigAction::Default { output } => run_config_default(output),
        },
        Commands::Synth {
            symbol,
            start,
            count,
            interval,
            base,
            output,
        } => run_synth(&symbol, &start, count, interval, base, &output),
    }
}

/// Logs go to stderr so stdout carries only decisions and reports.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> Result<SignalConfig> {
    match path {
        Some(p) => SignalConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(SignalConfig::default()),
    }
}

/// Build the orchestrator and resume the persisted session, rolling it over
/// when `now` falls on a later market-local day.
fn open_session(args: &SessionArgs, now: DateTime<Utc>) -> Result<TradingSession> {
    let orchestrator = SignalOrchestrator::new(load_config(args.config.as_deref())?)?;
    let today = orchestrator.session_date(now);
    let state = load_state(&args.state, today)?;
    let session = TradingSession::new(orchestrator, state);
    session.roll_to(now);
    Ok(session)
}

fn load_series(path: &Path, label: &str) -> Result<CandleSeries> {
    load_candles(path).with_context(|| format!("failed to load {label} candles"))
}

#[allow(clippy::too_many_arguments)]
fn run_evaluate(
    args: &SessionArgs,
    instrument: &str,
    htf_path: &Path,
    ltf_path: &Path,
    quotes: AtmQuotes,
    spot: Option<f64>,
    capital: f64,
    now: Option<String>,
    json: bool,
) -> Result<()> {
    if quotes.call.is_none() && quotes.put.is_none() {
        bail!("at least one of --call-premium or --put-premium is required");
    }
    let now = parse_now(now.as_deref())?;
    let htf = load_series(htf_path, "HTF")?;
    let ltf = load_series(ltf_path, "LTF")?;

    let session = open_session(args, now)?;
    let request = EvaluationRequest {
        instrument,
        htf: &htf,
        ltf: &ltf,
        spot,
        capital,
        now,
    };
    let decision = session.evaluate(&request, &quotes)?;
    print_decision(&decision, json)?;
    save_state(&args.state, &session.state())
}

fn run_batch(args: &SessionArgs, manifest_path: &Path, now: Option<String>, json: bool) -> Result<()> {
    let manifest = BatchManifest::from_file(manifest_path)?;
    if manifest.entries.is_empty() {
        bail!("manifest {} has no entries", manifest_path.display());
    }
    let now = parse_now(now.as_deref().or(manifest.now.as_deref()))?;

    let loaded = manifest
        .entries
        .iter()
        .map(|entry| {
            let htf = load_series(&entry.htf, "HTF")
                .with_context(|| format!("entry {}", entry.instrument))?;
            let ltf = load_series(&entry.ltf, "LTF")
                .with_context(|| format!("entry {}", entry.instrument))?;
            Ok((entry, htf, ltf))
        })
        .collect::<Result<Vec<_>>>()?;

    let session = open_session(args, now)?;
    info!(entries = loaded.len(), "evaluating batch");

    let results: Vec<_> = loaded
        .par_iter()
        .map(|(entry, htf, ltf)| {
            let request = EvaluationRequest {
                instrument: &entry.instrument,
                htf,
                ltf,
                spot: entry.spot,
                capital: manifest.capital,
                now,
            };
            (entry.instrument.as_str(), session.evaluate(&request, &entry.quotes()))
        })
        .collect();

    let mut signals = 0usize;
    let mut failures = 0usize;
    for (instrument, result) in &results {
        match result {
            Ok(decision) => {
                signals += usize::from(decision.is_signal());
                print_decision(decision, json)?;
            }
            Err(e) => {
                failures += 1;
                warn!(instrument = %instrument, error = %e, "evaluation failed");
                eprintln!("{instrument}: {e}");
            }
        }
    }
    save_state(&args.state, &session.state())?;

    if !json {
        println!();
        println!(
            "{} evaluated, {signals} signal(s), {failures} error(s)",
            results.len()
        );
    }
    if failures > 0 {
        bail!("{failures} of {} evaluations failed", results.len());
    }
    Ok(())
}

fn run_outcome(args: &SessionArgs, pnl: f64, now: Option<String>) -> Result<()> {
    let now = parse_now(now.as_deref())?;
    let session = open_session(args, now)?;
    session.record_outcome(TradeOutcome::new(pnl), now)?;
    save_state(&args.state, &session.state())?;
    print_snapshot(&session.snapshot());
    Ok(())
}

fn run_status(args: &SessionArgs, json: bool) -> Result<()> {
    let session = open_session(args, Utc::now())?;
    let snapshot = session.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }
    Ok(())
}

fn run_reset(args: &SessionArgs, date: Option<String>) -> Result<()> {
    let now = Utc::now();
    let session = open_session(args, now)?;
    let date = match date {
        Some(d) => NaiveDate::parse_from_str(&d, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{d}' (expected YYYY-MM-DD)"))?,
        None => session.orchestrator().session_date(now),
    };
    session.reset(date);
    save_state(&args.state, &session.state())?;
    println!("Session reset for {date}");
    Ok(())
}

fn run_config_check(path: &Path) -> Result<()> {
    let config = load_config(Some(path))?;
    config.validate()?;
    println!("Config OK: {}", path.display());
    println!("Hash:        {}", config.config_hash()?);
    println!(
        "Instruments: {}",
        config
            .instruments
            .iter()
            .map(|i| i.symbol.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

fn run_config_default(output: Option<PathBuf>) -> Result<()> {
    let toml = SignalConfig::default().to_toml()?;
    match output {
        Some(path) => {
            std::fs::write(&path, toml)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Default config written to: {}", path.display());
        }
        None => print!("{toml}"),
    }
    Ok(())
}

fn run_synth(
    symbol: &str,
    start: &str,
    count: usize,
    interval: i64,
    base: f64,
    output: &Path,
) -> Result<()> {
    if interval < 1 {
        bail!("--interval must be at least 1 minute");
    }
    if !(base.is_finite() && base > 0.0) {
        bail!("--base must be finite and positive");
    }
    let start = parse_now(Some(start))?;
    let series = random_walk(symbol, start, count, interval, base)?;
    save_candles(output, &series)?;
    println!(
        "Wrote {} candles for {symbol} to {}",
        series.len(),
        output.display()
    );
    Ok(())
}

fn print_decision(decision: &Decision, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(decision)?);
        return Ok(());
    }
    match decision {
        Decision::Signal(signal) => {
            println!("SIGNAL  {}", signal.headline());
            println!("  id:           {}", signal.id);
            println!("  trend:        {}", signal.reasons.trend);
            println!("  entry:        {}", signal.reasons.entry);
            println!("  confirmation: {}", signal.reasons.confirmation);
            let ladder: Vec<String> = signal
                .plan
                .take_profits
                .iter()
                .map(|tp| format!("{:.2} ({:.0}%)", tp.price, tp.fraction * 100.0))
                .collect();
            println!("  targets:      {}", ladder.join(", "));
            println!(
                "  risk:         {:.2} for {:.2} (RR {:.2}), investment {:.2}",
                signal.plan.risk_amount,
                signal.plan.reward_amount,
                signal.plan.risk_reward,
                signal.plan.total_investment
            );
        }
        Decision::NoSignal(no) => println!("NO SIGNAL  {no}"),
    }
    Ok(())
}

fn print_snapshot(s: &DailySnapshot) {
    let date = s
        .session_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".into());
    println!("Session:        {date}");
    match (&s.pause_reason, s.paused_until) {
        (Some(reason), Some(until)) => println!("Status:         PAUSED until {until} ({reason})"),
        _ => println!("Status:         OPEN"),
    }
    println!(
        "Signals:        {} sent, {} remaining",
        s.signals_sent, s.signals_remaining
    );
    println!(
        "Trades:         {} ({}W / {}L)",
        s.trades_taken, s.wins, s.losses
    );
    if let Some(rate) = s.win_rate {
        println!("Win Rate:       {:.1}%", rate * 100.0);
    }
    println!("Daily P&L:      {:.2}", s.daily_pnl);
    println!("Consec Losses:  {}", s.consecutive_losses);
}

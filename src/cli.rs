//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::fallback_adapter::FallbackDataPort;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::html_report_adapter::HtmlReportAdapter;
use crate::adapters::markdown_report::{render_markdown, MarkdownReportAdapter};
use crate::domain::config_validation::{bool_value, int_value, validate_scan_config};
use crate::domain::error::ScannerError;
use crate::domain::indicator_bank::{IndicatorBank, IndicatorParams};
use crate::domain::indicator_helpers::Smoothing;
use crate::domain::ranking::Ranker;
use crate::domain::rule::{RuleSet, ScoreRule};
use crate::domain::rule_parser::parse_entry;
use crate::domain::scan::{run_scan, ScanConfig, DEFAULT_TITLE, DEFAULT_TOP_K, DEFAULT_WORKERS};
use crate::domain::scoring::ScoringEngine;
use crate::domain::series::{DEFAULT_FETCH_LIMIT, MIN_SERIES_LEN};
use crate::domain::timeframe::{parse_timeframes, Timeframe};
use crate::domain::universe::{parse_symbols, resolve_groups, symbol_matches_quote, QuoteGroup};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "trendscan", about = "Rule-weighted trend-strength scanner")]
pub struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rank every quote group on every configured timeframe
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        top_k: Option<usize>,
        /// Restrict to these timeframes (label or code); repeatable
        #[arg(long)]
        timeframe: Vec<String>,
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Show the rule breakdown for one symbol
    Score {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long)]
        timeframe: String,
    },
    /// Validate and list the active rule table
    Rules {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        quote: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Scan {
            config,
            output,
            top_k,
            timeframe,
            workers,
        } => run_scan_command(
            &config,
            &ScanOverrides {
                output,
                top_k,
                workers,
                timeframes: timeframe,
            },
        ),
        Command::Score {
            config,
            symbol,
            timeframe,
        } => run_score(&config, &symbol, &timeframe),
        Command::Rules { config } => run_rules(&config),
        Command::ListSymbols { config, quote } => run_list_symbols(&config, quote.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Logs go to stderr so stdout carries only report output.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ScannerError> {
    FileConfigAdapter::from_file(path).map_err(|e| ScannerError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> ScannerError {
    ScannerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, ScannerError> {
    let value = int_value(config, section, key, default as i64)?;
    if value < 1 {
        return Err(invalid(section, key, format!("{} must be at least 1", key)));
    }
    Ok(value as usize)
}

pub fn build_scan_config(config: &dyn ConfigPort) -> Result<ScanConfig, ScannerError> {
    let timeframes = match config.get_string("scan", "timeframes") {
        Some(s) => parse_timeframes(&s).map_err(|e| invalid("scan", "timeframes", e.to_string()))?,
        None => Timeframe::defaults(),
    };

    Ok(ScanConfig {
        title: config
            .get_string("scan", "title")
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        timeframes,
        top_k: positive(config, "scan", "top_k", DEFAULT_TOP_K)?,
        fetch_limit: positive(config, "scan", "fetch_limit", DEFAULT_FETCH_LIMIT)?,
        min_bars: positive(config, "scan", "min_bars", MIN_SERIES_LEN)?,
        workers: positive(config, "scan", "workers", DEFAULT_WORKERS)?,
        strict_series: bool_value(config, "scan", "strict_series", false)?,
    })
}

pub fn build_indicator_params(config: &dyn ConfigPort) -> Result<IndicatorParams, ScannerError> {
    let defaults = IndicatorParams::default();
    let length = |key: &str, default: usize| positive(config, "indicators", key, default);

    let smoothing = match config.get_string("indicators", "smoothing") {
        Some(mode) => mode
            .parse::<Smoothing>()
            .map_err(|reason| invalid("indicators", "smoothing", reason))?,
        None => defaults.smoothing,
    };

    let params = IndicatorParams {
        smoothing,
        dmi_length: length("dmi_length", defaults.dmi_length)?,
        rsi_length: length("rsi_length", defaults.rsi_length)?,
        rsi_ma_length: length("rsi_ma_length", defaults.rsi_ma_length)?,
        macd_fast: length("macd_fast", defaults.macd_fast)?,
        macd_slow: length("macd_slow", defaults.macd_slow)?,
        macd_signal: length("macd_signal", defaults.macd_signal)?,
        conversion_length: length("conversion_length", defaults.conversion_length)?,
        base_length: length("base_length", defaults.base_length)?,
    };
    params.validate()?;
    Ok(params)
}

/// Rules from `[rules]` in file order, or the canonical table when the
/// section is absent or empty.
pub fn build_rule_set(config: &dyn ConfigPort) -> Result<RuleSet, ScannerError> {
    let entries = config.entries("rules");
    if entries.is_empty() {
        return Ok(RuleSet::canonical());
    }

    let mut rules = Vec::with_capacity(entries.len());
    for (name, definition) in entries {
        let kind = parse_entry(&definition).map_err(|e| {
            error!(
                rule = %name,
                "failed to parse rule:\n{}",
                e.display_with_context(&definition)
            );
            ScannerError::RuleParse(e)
        })?;
        rules.push(ScoreRule { name, kind });
    }
    RuleSet::new(rules)
}

pub fn build_ranker(config: &dyn ConfigPort, scan: &ScanConfig) -> Result<Ranker, ScannerError> {
    let params = build_indicator_params(config)?;
    let rules = build_rule_set(config)?;
    Ok(Ranker::new(
        IndicatorBank::new(params, scan.min_bars),
        ScoringEngine::new(rules),
        scan.ranker_options(),
    ))
}

/// Quote groups from `[universe]`: explicit per-quote lists keyed by the
/// lowercase quote, otherwise discovery through the data port.
pub fn build_quote_groups(
    config: &dyn ConfigPort,
    port: &dyn MarketDataPort,
) -> Result<Vec<QuoteGroup>, ScannerError> {
    let quotes = config
        .get_string("universe", "quotes")
        .ok_or_else(|| ScannerError::ConfigMissing {
            section: "universe".into(),
            key: "quotes".into(),
        })?;
    let quotes = parse_symbols(&quotes).map_err(|e| invalid("universe", "quotes", e.to_string()))?;

    let mut explicit = HashMap::new();
    for quote in &quotes {
        let key = quote.to_lowercase();
        if let Some(list) = config.get_string("universe", &key) {
            let symbols = parse_symbols(&list).map_err(|e| invalid("universe", &key, e.to_string()))?;
            explicit.insert(key, symbols);
        }
    }

    resolve_groups(&quotes, &explicit, port)
}

fn data_dir(config: &dyn ConfigPort, key: &str) -> Result<PathBuf, ScannerError> {
    config
        .get_string("data", key)
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| ScannerError::ConfigMissing {
            section: "data".into(),
            key: key.into(),
        })
}

/// CSV tree under `[data] dir`. With `include_spot_fallback`, candidates
/// whose perpetual series is missing or shorter than `min_bars` are read from
/// `[data] spot_dir` instead.
pub fn build_data_port(config: &dyn ConfigPort) -> Result<Box<dyn MarketDataPort>, ScannerError> {
    let perp = CsvAdapter::new(data_dir(config, "dir")?);
    if !bool_value(config, "data", "include_spot_fallback", false)? {
        return Ok(Box::new(perp));
    }

    let spot = CsvAdapter::new(data_dir(config, "spot_dir")?);
    let min_bars = positive(config, "scan", "min_bars", MIN_SERIES_LEN)?;
    info!(min_bars, "spot fallback enabled");
    Ok(Box::new(FallbackDataPort::new(perp, spot, min_bars)))
}

/// `.html`/`.htm` render through the HTML template; anything else is Markdown.
pub fn report_adapter(path: &Path) -> Box<dyn ReportPort> {
    let is_html = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));
    if is_html {
        Box::new(HtmlReportAdapter::new())
    } else {
        Box::new(MarkdownReportAdapter::new())
    }
}

#[derive(Debug, Default)]
pub struct ScanOverrides {
    pub output: Option<PathBuf>,
    pub top_k: Option<usize>,
    pub workers: Option<usize>,
    pub timeframes: Vec<String>,
}

pub fn apply_overrides(scan: &mut ScanConfig, overrides: &ScanOverrides) -> Result<(), ScannerError> {
    if let Some(top_k) = overrides.top_k {
        if top_k == 0 {
            return Err(invalid("scan", "top_k", "--top-k must be at least 1"));
        }
        scan.top_k = top_k;
    }
    if let Some(workers) = overrides.workers {
        if workers == 0 {
            return Err(invalid("scan", "workers", "--workers must be at least 1"));
        }
        scan.workers = workers;
    }
    scan.select_timeframes(&overrides.timeframes)
}

fn run_scan_command(config_path: &Path, overrides: &ScanOverrides) -> Result<(), ScannerError> {
    info!(config = %config_path.display(), "loading config");
    let config = load_config(config_path)?;
    validate_scan_config(&config)?;

    let mut scan = build_scan_config(&config)?;
    apply_overrides(&mut scan, overrides)?;
    let ranker = build_ranker(&config, &scan)?;
    info!(
        rules = ranker.engine().rules().len(),
        max_score = ranker.engine().max_score(),
        "rule table loaded"
    );

    let port = build_data_port(&config)?;
    let groups = build_quote_groups(&config, port.as_ref())?;
    let report = run_scan(port.as_ref(), &groups, &scan, &ranker)?;

    print!("{}", render_markdown(&report));

    let output = overrides
        .output
        .clone()
        .or_else(|| config.get_string("report", "output").map(PathBuf::from));
    if let Some(path) = output {
        let path_str = path.to_string_lossy();
        report_adapter(&path).write(&report, &path_str)?;
        info!(path = %path_str, ranked = report.total_ranked(), "report written");
    }
    Ok(())
}

fn run_score(config_path: &Path, symbol: &str, timeframe: &str) -> Result<(), ScannerError> {
    let config = load_config(config_path)?;
    validate_scan_config(&config)?;

    let scan = build_scan_config(&config)?;
    let tf = scan
        .timeframes
        .iter()
        .find(|tf| tf.matches(timeframe))
        .ok_or_else(|| {
            invalid(
                "scan",
                "timeframes",
                format!("timeframe '{}' is not configured", timeframe),
            )
        })?;
    let ranker = build_ranker(&config, &scan)?;
    let port = build_data_port(&config)?;

    let symbol = symbol.to_uppercase();
    let (series, market) = ranker.load_series(port.as_ref(), tf, &symbol)?;
    let snapshot = ranker.bank().compute(&series)?;
    let engine = ranker.engine();
    let hits = engine.breakdown(&snapshot);

    match market {
        Some(market) => println!("{} ({}) {}", symbol, market, tf),
        None => println!("{} {}", symbol, tf),
    }
    for hit in &hits {
        match hit.tier {
            Some(tier) => println!("  {:<28} {:>4}  (tier {})", hit.name, hit.weight, tier + 1),
            None => println!("  {:<28} {:>4}", hit.name, hit.weight),
        }
    }
    let total: u32 = hits.iter().map(|h| h.weight).sum();
    println!("Score: {}/{}", total, engine.max_score());
    Ok(())
}

fn run_rules(config_path: &Path) -> Result<(), ScannerError> {
    let config = load_config(config_path)?;
    let rules = build_rule_set(&config)?;

    println!("{:<28} {:>6}  Definition", "Rule", "Max");
    for rule in rules.rules() {
        println!("{:<28} {:>6}  {}", rule.name, rule.max_weight(), rule.kind);
    }
    println!("{} rules, maximum score {}", rules.len(), rules.max_score());
    Ok(())
}

fn run_list_symbols(config_path: &Path, quote: Option<&str>) -> Result<(), ScannerError> {
    let config = load_config(config_path)?;
    let port = build_data_port(&config)?;

    let symbols: Vec<String> = port
        .list_symbols()?
        .into_iter()
        .filter(|s| quote.is_none_or(|q| symbol_matches_quote(s, q)))
        .collect();

    if symbols.is_empty() {
        info!("no symbols found");
        return Ok(());
    }
    for symbol in &symbols {
        println!("{}", symbol);
    }
    info!(count = symbols.len(), "symbols listed");
    Ok(())
}

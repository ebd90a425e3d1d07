//! Scores every candidate of a timeframe and keeps the top K.
//!
//! Candidate-level failures (fetch errors, empty data, short series) are
//! logged and recorded as skips. Malformed series are skipped loudly, or
//! abort the ranking in strict mode.

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::domain::error::ScannerError;
use crate::domain::indicator_bank::IndicatorBank;
use crate::domain::market::Market;
use crate::domain::scoring::ScoringEngine;
use crate::domain::series::{DEFAULT_FETCH_LIMIT, Series};
use crate::domain::timeframe::Timeframe;
use crate::ports::data_port::{Fetched, MarketDataPort};

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub symbol: String,
    pub timeframe: String,
    pub score: u32,
    pub last_close: f64,
    /// Set when the data port distinguishes perpetual from spot candles.
    pub market: Option<Market>,
}

impl ScoreRecord {
    /// Symbol as shown in reports, e.g. `BTCUSDT (Perp)`.
    pub fn display_symbol(&self) -> String {
        match self.market {
            Some(market) => format!("{} ({})", self.symbol, market),
            None => self.symbol.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Fetch(String),
    NoData,
    InsufficientData { bars: usize, minimum: usize },
    Malformed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Fetch(reason) => write!(f, "fetch failed: {}", reason),
            SkipReason::NoData => write!(f, "no data"),
            SkipReason::InsufficientData { bars, minimum } => {
                write!(f, "only {} bars, minimum {} required", bars, minimum)
            }
            SkipReason::Malformed(reason) => write!(f, "malformed series: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCandidate {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub timeframe: Timeframe,
    /// Score descending, ties in candidate order. At most K entries.
    pub records: Vec<ScoreRecord>,
    pub skipped: Vec<SkippedCandidate>,
}

impl Ranking {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Stable sort by score descending, then truncate to `k`.
pub fn select_top_k(mut records: Vec<ScoreRecord>, k: usize) -> Vec<ScoreRecord> {
    records.sort_by(|a, b| b.score.cmp(&a.score));
    records.truncate(k);
    records
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankerOptions {
    pub fetch_limit: usize,
    pub workers: usize,
    pub strict_series: bool,
}

impl Default for RankerOptions {
    fn default() -> Self {
        Self {
            fetch_limit: DEFAULT_FETCH_LIMIT,
            workers: 4,
            strict_series: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ranker {
    bank: IndicatorBank,
    engine: ScoringEngine,
    options: RankerOptions,
}

impl Ranker {
    pub fn new(bank: IndicatorBank, engine: ScoringEngine, options: RankerOptions) -> Self {
        Self {
            bank,
            engine,
            options,
        }
    }

    pub fn bank(&self) -> &IndicatorBank {
        &self.bank
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Fetch, snapshot and score one candidate.
    pub fn score_candidate(
        &self,
        port: &dyn MarketDataPort,
        timeframe: &Timeframe,
        symbol: &str,
    ) -> Result<ScoreRecord, ScannerError> {
        let (series, market) = self.load_series(port, timeframe, symbol)?;
        let snapshot = self.bank.compute(&series)?;
        let score = self.engine.score(&snapshot);
        let last_close = series.last_close().ok_or_else(|| ScannerError::NoData {
            symbol: symbol.to_string(),
            timeframe: timeframe.label.clone(),
        })?;

        debug!(symbol, timeframe = %timeframe.label, score, ?market, "scored candidate");
        Ok(ScoreRecord {
            symbol: symbol.to_string(),
            timeframe: timeframe.label.clone(),
            score,
            last_close,
            market,
        })
    }

    /// Series for one candidate plus the venue it was read from.
    pub fn load_series(
        &self,
        port: &dyn MarketDataPort,
        timeframe: &Timeframe,
        symbol: &str,
    ) -> Result<(Series, Option<Market>), ScannerError> {
        let Fetched { bars, market } =
            port.fetch_tagged(symbol, timeframe, self.options.fetch_limit)?;
        if bars.is_empty() {
            return Err(ScannerError::NoData {
                symbol: symbol.to_string(),
                timeframe: timeframe.label.clone(),
            });
        }
        Ok((Series::new(symbol, timeframe.clone(), bars)?, market))
    }

    pub fn rank(
        &self,
        port: &dyn MarketDataPort,
        timeframe: &Timeframe,
        candidates: &[String],
        k: usize,
    ) -> Result<Ranking, ScannerError> {
        info!(
            timeframe = %timeframe,
            candidates = candidates.len(),
            top_k = k,
            "ranking candidates"
        );

        let outcomes = self.score_all(port, timeframe, candidates);

        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for (symbol, outcome) in candidates.iter().zip(outcomes) {
            match outcome {
                Ok(record) => records.push(record),
                Err(err) => {
                    let reason = self.classify(symbol, err)?;
                    skipped.push(SkippedCandidate {
                        symbol: symbol.clone(),
                        reason,
                    });
                }
            }
        }

        let records = select_top_k(records, k);
        info!(
            timeframe = %timeframe,
            ranked = records.len(),
            skipped = skipped.len(),
            "ranking complete"
        );

        Ok(Ranking {
            timeframe: timeframe.clone(),
            records,
            skipped,
        })
    }

    /// Results come back in candidate order regardless of worker count.
    fn score_all(
        &self,
        port: &dyn MarketDataPort,
        timeframe: &Timeframe,
        candidates: &[String],
    ) -> Vec<Result<ScoreRecord, ScannerError>> {
        let work = || {
            candidates
                .par_iter()
                .map(|symbol| self.score_candidate(port, timeframe, symbol))
                .collect::<Vec<_>>()
        };

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers.max(1))
            .build()
        {
            Ok(pool) => pool.install(work),
            Err(e) => {
                warn!(error = %e, "worker pool unavailable, using global pool");
                work()
            }
        }
    }

    /// Turn a candidate failure into a skip reason, or propagate it.
    fn classify(&self, symbol: &str, err: ScannerError) -> Result<SkipReason, ScannerError> {
        match err {
            ScannerError::Fetch { ref reason, .. } => {
                warn!(symbol, error = %err, "skipping candidate");
                Ok(SkipReason::Fetch(reason.clone()))
            }
            ScannerError::NoData { .. } => {
                warn!(symbol, error = %err, "skipping candidate");
                Ok(SkipReason::NoData)
            }
            ScannerError::InsufficientData { bars, minimum, .. } => {
                warn!(symbol, error = %err, "skipping candidate");
                Ok(SkipReason::InsufficientData { bars, minimum })
            }
            ScannerError::MalformedSeries { ref reason, .. } => {
                error!(symbol, error = %err, "malformed series");
                if self.options.strict_series {
                    Err(err)
                } else {
                    Ok(SkipReason::Malformed(reason.clone()))
                }
            }
            other => Err(other),
        }
    }
}

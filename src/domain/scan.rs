//! A scan ranks every quote group on every configured timeframe.

use chrono::{NaiveDateTime, Utc};
use tracing::info;

use crate::domain::error::ScannerError;
use crate::domain::ranking::{Ranker, RankerOptions, Ranking};
use crate::domain::series::{DEFAULT_FETCH_LIMIT, MIN_SERIES_LEN};
use crate::domain::timeframe::Timeframe;
use crate::domain::universe::QuoteGroup;
use crate::ports::data_port::MarketDataPort;

pub const DEFAULT_TITLE: &str = "Long-Trend Scanner";
pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub title: String,
    pub timeframes: Vec<Timeframe>,
    pub top_k: usize,
    pub fetch_limit: usize,
    pub min_bars: usize,
    pub workers: usize,
    pub strict_series: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            timeframes: Timeframe::defaults(),
            top_k: DEFAULT_TOP_K,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            min_bars: MIN_SERIES_LEN,
            workers: DEFAULT_WORKERS,
            strict_series: false,
        }
    }
}

impl ScanConfig {
    pub fn ranker_options(&self) -> RankerOptions {
        RankerOptions {
            fetch_limit: self.fetch_limit,
            workers: self.workers,
            strict_series: self.strict_series,
        }
    }

    /// Keep only the timeframes whose label or code matches one of `selected`
    /// (case-insensitive). An empty selection keeps everything.
    pub fn select_timeframes(&mut self, selected: &[String]) -> Result<(), ScannerError> {
        if selected.is_empty() {
            return Ok(());
        }
        for wanted in selected {
            if !self.timeframes.iter().any(|tf| tf.matches(wanted)) {
                return Err(ScannerError::ConfigInvalid {
                    section: "scan".to_string(),
                    key: "timeframes".to_string(),
                    reason: format!("timeframe '{}' is not configured", wanted),
                });
            }
        }
        self.timeframes
            .retain(|tf| selected.iter().any(|wanted| tf.matches(wanted)));
        Ok(())
    }
}

/// One quote group's rankings, one per timeframe in configured order.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSection {
    pub quote: String,
    pub rankings: Vec<Ranking>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub title: String,
    pub generated_at: NaiveDateTime,
    pub quotes: Vec<QuoteSection>,
}

impl ScanReport {
    pub fn total_ranked(&self) -> usize {
        self.quotes
            .iter()
            .flat_map(|q| &q.rankings)
            .map(|r| r.records.len())
            .sum()
    }
}

/// Quote groups in configured order, every timeframe within each group.
pub fn run_scan(
    port: &dyn MarketDataPort,
    groups: &[QuoteGroup],
    config: &ScanConfig,
    ranker: &Ranker,
) -> Result<ScanReport, ScannerError> {
    info!(
        timeframes = config.timeframes.len(),
        groups = groups.len(),
        top_k = config.top_k,
        "starting scan"
    );

    let mut quotes = Vec::with_capacity(groups.len());
    for group in groups {
        info!(quote = %group.quote, symbols = group.symbols.len(), "scanning quote group");
        let rankings = config
            .timeframes
            .iter()
            .map(|timeframe| ranker.rank(port, timeframe, &group.symbols, config.top_k))
            .collect::<Result<Vec<_>, _>>()?;
        quotes.push(QuoteSection {
            quote: group.quote.clone(),
            rankings,
        });
    }

    Ok(ScanReport {
        title: config.title.clone(),
        generated_at: Utc::now().naive_utc(),
        quotes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = ScanConfig::default();
        assert_eq!(config.top_k, 10);
        assert_eq!(config.fetch_limit, 200);
        assert_eq!(config.min_bars, 60);
        assert_eq!(config.timeframes.len(), 3);
        assert!(!config.strict_series);
    }

    #[test]
    fn ranker_options_follow_config() {
        let config = ScanConfig {
            fetch_limit: 150,
            workers: 2,
            strict_series: true,
            ..ScanConfig::default()
        };
        assert_eq!(
            config.ranker_options(),
            RankerOptions {
                fetch_limit: 150,
                workers: 2,
                strict_series: true
            }
        );
    }

    #[test]
    fn select_timeframes_by_label_or_code() {
        let mut config = ScanConfig::default();
        config
            .select_timeframes(&["daily".to_string(), "4H".to_string()])
            .unwrap();
        let labels: Vec<&str> = config.timeframes.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["Daily", "4H"]);

        let mut config = ScanConfig::default();
        config.select_timeframes(&["1w".to_string()]).unwrap();
        assert_eq!(config.timeframes[0].label, "Weekly");
    }

    #[test]
    fn total_ranked_counts_every_ranking() {
        let ranking = |n: usize| Ranking {
            timeframe: Timeframe::new("Daily", "1d"),
            records: (0..n)
                .map(|i| crate::domain::ranking::ScoreRecord {
                    symbol: format!("S{i}"),
                    timeframe: "Daily".into(),
                    score: 1,
                    last_close: 1.0,
                    market: None,
                })
                .collect(),
            skipped: vec![],
        };
        let report = ScanReport {
            title: "T".into(),
            generated_at: Utc::now().naive_utc(),
            quotes: vec![
                QuoteSection {
                    quote: "USDT".into(),
                    rankings: vec![ranking(2), ranking(3)],
                },
                QuoteSection {
                    quote: "BTC".into(),
                    rankings: vec![ranking(0)],
                },
            ],
        };
        assert_eq!(report.total_ranked(), 5);
    }

    #[test]
    fn select_unknown_timeframe_fails() {
        let mut config = ScanConfig::default();
        let err = config.select_timeframes(&["Monthly".to_string()]).unwrap_err();
        assert!(matches!(err, ScannerError::ConfigInvalid { .. }));
        assert_eq!(config.timeframes.len(), 3);
    }
}

//! Scan timeframes: a display label paired with the venue bar code.

use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Timeframe {
    pub label: String,
    pub code: String,
}

impl Timeframe {
    pub fn new(label: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            code: code.into(),
        }
    }

    /// Weekly, daily and four-hour bars.
    pub fn defaults() -> Vec<Timeframe> {
        vec![
            Timeframe::new("Weekly", "1w"),
            Timeframe::new("Daily", "1d"),
            Timeframe::new("4H", "4h"),
        ]
    }

    /// Case-insensitive match on label or code.
    pub fn matches(&self, name: &str) -> bool {
        self.label.eq_ignore_ascii_case(name) || self.code.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.code.to_uppercase())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeframeError {
    #[error("empty timeframe entry")]
    Empty,

    #[error("timeframe entry '{0}' must look like LABEL=CODE")]
    MissingCode(String),

    #[error("duplicate timeframe label: {0}")]
    DuplicateLabel(String),
}

/// Parse `Weekly=1w, Daily=1d, 4H=4h`. A bare `1d` uses the code as its label.
pub fn parse_timeframes(input: &str) -> Result<Vec<Timeframe>, TimeframeError> {
    let mut timeframes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(TimeframeError::Empty);
        }

        let (label, code) = match trimmed.split_once('=') {
            Some((label, code)) => (label.trim(), code.trim()),
            None => (trimmed, trimmed),
        };
        if label.is_empty() || code.is_empty() {
            return Err(TimeframeError::MissingCode(trimmed.to_string()));
        }

        if !seen.insert(label.to_lowercase()) {
            return Err(TimeframeError::DuplicateLabel(label.to_string()));
        }
        timeframes.push(Timeframe::new(label, code));
    }

    Ok(timeframes)
}

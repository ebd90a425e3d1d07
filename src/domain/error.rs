//! Domain error types.

/// A parse error with position information for rule parsing.
#[derive(Debug, Clone, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Top-level error type for trendscan.
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    RuleParse(#[from] ParseError),

    #[error("invalid rule: {reason}")]
    RuleInvalid { reason: String },

    #[error("fetch failed for {symbol} ({timeframe}): {reason}")]
    Fetch {
        symbol: String,
        timeframe: String,
        reason: String,
    },

    #[error("no data for {symbol} ({timeframe})")]
    NoData { symbol: String, timeframe: String },

    #[error("insufficient data for {symbol} ({timeframe}): have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        timeframe: String,
        bars: usize,
        minimum: usize,
    },

    #[error("malformed series for {symbol} ({timeframe}): {reason}")]
    MalformedSeries {
        symbol: String,
        timeframe: String,
        reason: String,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ScannerError> for std::process::ExitCode {
    fn from(err: &ScannerError) -> Self {
        let code: u8 = match err {
            ScannerError::Io(_) => 1,
            ScannerError::ConfigParse { .. }
            | ScannerError::ConfigMissing { .. }
            | ScannerError::ConfigInvalid { .. } => 2,
            ScannerError::Report { .. } => 3,
            ScannerError::RuleParse(_) | ScannerError::RuleInvalid { .. } => 4,
            ScannerError::Fetch { .. }
            | ScannerError::NoData { .. }
            | ScannerError::InsufficientData { .. }
            | ScannerError::MalformedSeries { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

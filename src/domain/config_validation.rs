//! Configuration validation.
//!
//! Validates all config fields before a scan runs. Missing optional keys fall
//! back to their defaults; present keys must hold sensible values.

use crate::domain::error::ScannerError;
use crate::domain::indicator_helpers::Smoothing;
use crate::domain::scan::{DEFAULT_TOP_K, DEFAULT_WORKERS};
use crate::domain::series::{DEFAULT_FETCH_LIMIT, MIN_SERIES_LEN};
use crate::domain::timeframe::parse_timeframes;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;

pub fn validate_scan_config(config: &dyn ConfigPort) -> Result<(), ScannerError> {
    validate_top_k(config)?;
    validate_workers(config)?;
    validate_bar_counts(config)?;
    bool_value(config, "scan", "strict_series", false)?;
    validate_timeframes(config)?;
    validate_quotes(config)?;
    validate_data_sources(config)?;
    validate_indicators(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> ScannerError {
    ScannerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Integer at `[section] key`, or `default` when absent. A value that does
/// not parse is an error, never the default.
pub fn int_value(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, ScannerError> {
    config
        .get_int(section, key)
        .map(|value| value.unwrap_or(default))
        .map_err(|reason| invalid(section, key, reason))
}

pub fn bool_value(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, ScannerError> {
    config
        .get_bool(section, key)
        .map(|value| value.unwrap_or(default))
        .map_err(|reason| invalid(section, key, reason))
}

fn validate_top_k(config: &dyn ConfigPort) -> Result<(), ScannerError> {
    if int_value(config, "scan", "top_k", DEFAULT_TOP_K as i64)? < 1 {
        return Err(invalid("scan", "top_k", "top_k must be at least 1"));
    }
    Ok(())
}

fn validate_workers(config: &dyn ConfigPort) -> Result<(), ScannerError> {
    if int_value(config, "scan", "workers", DEFAULT_WORKERS as i64)? < 1 {
        return Err(invalid("scan", "workers", "workers must be at least 1"));
    }
    Ok(())
}

fn validate_bar_counts(config: &dyn ConfigPort) -> Result<(), ScannerError> {
    let fetch_limit = int_value(config, "scan", "fetch_limit", DEFAULT_FETCH_LIMIT as i64)?;
    let min_bars = int_value(config, "scan", "min_bars", MIN_SERIES_LEN as i64)?;

    if fetch_limit < 1 {
        return Err(invalid(
            "scan",
            "fetch_limit",
            "fetch_limit must be at least 1",
        ));
    }
    if min_bars < 1 || min_bars > fetch_limit {
        return Err(invalid(
            "scan",
            "min_bars",
            format!("min_bars must be between 1 and fetch_limit ({})", fetch_limit),
        ));
    }
    Ok(())
}

fn validate_timeframes(config: &dyn ConfigPort) -> Result<(), ScannerError> {
    match config.get_string("scan", "timeframes") {
        None => Ok(()),
        Some(s) => parse_timeframes(&s)
            .map(|_| ())
            .map_err(|e| invalid("scan", "timeframes", e.to_string())),
    }
}

fn validate_quotes(config: &dyn ConfigPort) -> Result<(), ScannerError> {
    match config.get_string("universe", "quotes") {
        Some(s) if !s.trim().is_empty() => parse_symbols(&s)
            .map(|_| ())
            .map_err(|e| invalid("universe", "quotes", e.to_string())),
        _ => Err(ScannerError::ConfigMissing {
            section: "universe".to_string(),
            key: "quotes".to_string(),
        }),
    }
}

fn present(config: &dyn ConfigPort, section: &str, key: &str) -> bool {
    config
        .get_string(section, key)
        .is_some_and(|s| !s.trim().is_empty())
}

/// `dir` is always required; `spot_dir` only when the spot fallback is on.
fn validate_data_sources(config: &dyn ConfigPort) -> Result<(), ScannerError> {
    if !present(config, "data", "dir") {
        return Err(ScannerError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        });
    }
    if bool_value(config, "data", "include_spot_fallback", false)?
        && !present(config, "data", "spot_dir")
    {
        return Err(ScannerError::ConfigMissing {
            section: "data".to_string(),
            key: "spot_dir".to_string(),
        });
    }
    Ok(())
}

fn validate_indicators(config: &dyn ConfigPort) -> Result<(), ScannerError> {
    let keys = [
        ("dmi_length", 14),
        ("rsi_length", 14),
        ("rsi_ma_length", 14),
        ("macd_fast", 12),
        ("macd_slow", 26),
        ("macd_signal", 9),
        ("conversion_length", 9),
        ("base_length", 26),
    ];
    for (key, default) in keys {
        if int_value(config, "indicators", key, default)? < 1 {
            return Err(invalid(
                "indicators",
                key,
                format!("{} must be greater than 0", key),
            ));
        }
    }

    let fast = int_value(config, "indicators", "macd_fast", 12)?;
    let slow = int_value(config, "indicators", "macd_slow", 26)?;
    if fast >= slow {
        return Err(invalid(
            "indicators",
            "macd_fast",
            "macd_fast must be less than macd_slow",
        ));
    }

    if let Some(mode) = config.get_string("indicators", "smoothing") {
        mode.parse::<Smoothing>()
            .map_err(|reason| invalid("indicators", "smoothing", reason))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const BASE: &str = "[data]\ndir = ./data\n[universe]\nquotes = USDT, BTC\n";

    fn make_config(extra: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(&format!("{}{}", BASE, extra)).unwrap()
    }

    fn invalid_key(err: ScannerError) -> String {
        match err {
            ScannerError::ConfigInvalid { key, .. } => key,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn valid_scan_config_passes() {
        let config = make_config(
            r#"
[scan]
title = Long-Trend Scanner
timeframes = Weekly=1w, Daily=1d, 4H=4h
top_k = 10
fetch_limit = 200
min_bars = 60
workers = 4

[indicators]
dmi_length = 14
macd_fast = 12
macd_slow = 26
"#,
        );
        assert!(validate_scan_config(&config).is_ok());
    }

    #[test]
    fn defaults_pass() {
        assert!(validate_scan_config(&make_config("")).is_ok());
    }

    #[test]
    fn top_k_must_be_positive() {
        let err = validate_scan_config(&make_config("[scan]\ntop_k = 0\n")).unwrap_err();
        assert_eq!(invalid_key(err), "top_k");
    }

    #[test]
    fn workers_must_be_positive() {
        let err = validate_scan_config(&make_config("[scan]\nworkers = 0\n")).unwrap_err();
        assert_eq!(invalid_key(err), "workers");
    }

    #[test]
    fn min_bars_cannot_exceed_fetch_limit() {
        let err = validate_scan_config(&make_config("[scan]\nfetch_limit = 50\nmin_bars = 60\n"))
            .unwrap_err();
        assert_eq!(invalid_key(err), "min_bars");
    }

    #[test]
    fn malformed_timeframes_rejected() {
        let err = validate_scan_config(&make_config("[scan]\ntimeframes = Daily=1d,,\n"))
            .unwrap_err();
        assert_eq!(invalid_key(err), "timeframes");
    }

    #[test]
    fn quotes_required() {
        let config =
            FileConfigAdapter::from_string("[data]\ndir = ./data\n[universe]\n").unwrap();
        let err = validate_scan_config(&config).unwrap_err();
        assert!(matches!(err, ScannerError::ConfigMissing { key, .. } if key == "quotes"));
    }

    #[test]
    fn duplicate_quote_rejected() {
        let config = FileConfigAdapter::from_string(
            "[data]\ndir = ./data\n[universe]\nquotes = USDT, usdt\n",
        )
        .unwrap();
        let err = validate_scan_config(&config).unwrap_err();
        assert_eq!(invalid_key(err), "quotes");
    }

    #[test]
    fn data_dir_required() {
        let config = FileConfigAdapter::from_string("[universe]\nquotes = USDT\n").unwrap();
        let err = validate_scan_config(&config).unwrap_err();
        assert!(matches!(err, ScannerError::ConfigMissing { key, .. } if key == "dir"));
    }

    #[test]
    fn indicator_lengths_positive() {
        let err = validate_scan_config(&make_config("[indicators]\nrsi_length = 0\n"))
            .unwrap_err();
        assert_eq!(invalid_key(err), "rsi_length");
    }

    #[test]
    fn non_numeric_values_rejected() {
        for (extra, key) in [
            ("[scan]\ntop_k = ten\n", "top_k"),
            ("[scan]\nworkers = x\n", "workers"),
            ("[scan]\nmin_bars = 6O\n", "min_bars"),
            ("[indicators]\nrsi_length = 14.5\n", "rsi_length"),
        ] {
            let err = validate_scan_config(&make_config(extra)).unwrap_err();
            assert_eq!(invalid_key(err), key, "{extra}");
        }
    }

    #[test]
    fn non_boolean_strict_series_rejected() {
        let err = validate_scan_config(&make_config("[scan]\nstrict_series = sometimes\n"))
            .unwrap_err();
        assert_eq!(invalid_key(err), "strict_series");
    }

    #[test]
    fn int_value_defaults_only_when_absent() {
        let config = make_config("[scan]\ntop_k = 7\n");
        assert_eq!(int_value(&config, "scan", "top_k", 10).unwrap(), 7);
        assert_eq!(int_value(&config, "scan", "workers", 4).unwrap(), 4);
    }

    #[test]
    fn smoothing_must_be_known() {
        assert!(validate_scan_config(&make_config("[indicators]\nsmoothing = wilder\n")).is_ok());
        let err = validate_scan_config(&make_config("[indicators]\nsmoothing = ema\n"))
            .unwrap_err();
        assert_eq!(invalid_key(err), "smoothing");
    }

    #[test]
    fn spot_fallback_needs_spot_dir() {
        let config = FileConfigAdapter::from_string(
            "[data]\ndir = ./data\ninclude_spot_fallback = true\n[universe]\nquotes = USDT\n",
        )
        .unwrap();
        let err = validate_scan_config(&config).unwrap_err();
        assert!(matches!(err, ScannerError::ConfigMissing { key, .. } if key == "spot_dir"));

        let config = FileConfigAdapter::from_string(
            "[data]\ndir = ./data\nspot_dir = ./spot\ninclude_spot_fallback = yes\n\
             [universe]\nquotes = USDT\n",
        )
        .unwrap();
        assert!(validate_scan_config(&config).is_ok());
    }

    #[test]
    fn macd_fast_below_slow() {
        let err = validate_scan_config(&make_config(
            "[indicators]\nmacd_fast = 30\nmacd_slow = 26\n",
        ))
        .unwrap_err();
        assert_eq!(invalid_key(err), "macd_fast");
    }
}

//! Candidate universe: symbol lists grouped by quote currency.
//!
//! Groups come from explicit per-quote lists in configuration, or from
//! discovery through the data port filtered by quote.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::domain::error::ScannerError;
use crate::ports::data_port::MarketDataPort;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteGroup {
    pub quote: String,
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Comma list, uppercased, rejecting empty tokens and duplicates.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// `ETH/BTC` and `ETH-BTC` match on the second token, `ETHBTC` on the suffix.
pub fn symbol_matches_quote(symbol: &str, quote: &str) -> bool {
    let symbol = symbol.to_uppercase();
    let quote = quote.to_uppercase();

    if symbol.contains(|c: char| !c.is_alphanumeric()) {
        let mut tokens = symbol
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty());
        tokens.next();
        return tokens.next() == Some(quote.as_str());
    }

    symbol.len() > quote.len() && symbol.ends_with(&quote)
}

/// Build one group per quote, in quote order. `explicit` is keyed by
/// lowercase quote; quotes without a list are discovered from the port.
pub fn resolve_groups(
    quotes: &[String],
    explicit: &HashMap<String, Vec<String>>,
    port: &dyn MarketDataPort,
) -> Result<Vec<QuoteGroup>, ScannerError> {
    let mut discovered: Option<Vec<String>> = None;
    let mut groups = Vec::with_capacity(quotes.len());

    for quote in quotes {
        let symbols = match explicit.get(&quote.to_lowercase()) {
            Some(list) => list.clone(),
            None => {
                if discovered.is_none() {
                    discovered = Some(port.list_symbols()?);
                }
                discovered
                    .iter()
                    .flatten()
                    .filter(|s| symbol_matches_quote(s, quote))
                    .cloned()
                    .collect()
            }
        };

        if symbols.is_empty() {
            warn!(quote = %quote, "no symbols for quote");
        } else {
            info!(quote = %quote, symbols = symbols.len(), "resolved quote group");
        }
        groups.push(QuoteGroup {
            quote: quote.clone(),
            symbols,
        });
    }

    Ok(groups)
}

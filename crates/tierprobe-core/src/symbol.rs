//! Trading pair identification.
//!
//! The exchange addresses perpetual contracts as `BASE-QUOTE` (e.g., "BTC-USDT"),
//! while the public tier tables print them without a separator ("BTCUSDT").
//! `Symbol` normalizes both spellings so lookups agree.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quote currencies recognized when splitting an unseparated pair.
const KNOWN_QUOTES: &[&str] = &["USDT", "USDC"];

/// Normalized trading pair symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Normalize and validate a raw symbol.
    ///
    /// - Uppercases the input
    /// - Replaces `/` and `_` separators with `-`
    /// - Inserts `-` before a known quote currency when no separator is present
    pub fn parse(raw: &str) -> Result<Self> {
        let mut symbol = raw.trim().to_uppercase().replace(['/', '_'], "-");

        if symbol.is_empty() {
            return Err(CoreError::InvalidSymbol("empty symbol".to_string()));
        }

        if !symbol.contains('-') {
            if let Some(quote) = KNOWN_QUOTES
                .iter()
                .copied()
                .find(|q| symbol.len() > q.len() && symbol.ends_with(q))
            {
                let base_len = symbol.len() - quote.len();
                symbol.insert(base_len, '-');
            }
        }

        let valid = symbol
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()));
        if !valid {
            return Err(CoreError::InvalidSymbol(format!("'{raw}'")));
        }

        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_normalization() {
        assert_eq!(Symbol::parse("BTC-USDT").unwrap().as_str(), "BTC-USDT");
        assert_eq!(Symbol::parse("btcusdt").unwrap().as_str(), "BTC-USDT");
        assert_eq!(Symbol::parse("eth/usdt").unwrap().as_str(), "ETH-USDT");
        assert_eq!(Symbol::parse(" 1000PEPEUSDT ").unwrap().as_str(), "1000PEPE-USDT");
    }

    #[test]
    fn test_symbol_rejects_garbage() {
        assert!(Symbol::parse("").is_err());
        assert!(Symbol::parse("   ").is_err());
        assert!(Symbol::parse("BTC--USDT").is_err());
        assert!(Symbol::parse("BTC-US DT").is_err());
    }

    #[test]
    fn test_symbol_without_known_quote_kept() {
        // No quote suffix to split on: kept as a single token.
        assert_eq!(Symbol::parse("BTCEUR").unwrap().as_str(), "BTCEUR");
    }

    #[test]
    fn test_symbol_ordering_is_alphabetical() {
        let mut symbols = vec![
            Symbol::parse("SOL-USDT").unwrap(),
            Symbol::parse("BTC-USDT").unwrap(),
            Symbol::parse("ETH-USDT").unwrap(),
        ];
        symbols.sort();
        let names: Vec<_> = symbols.iter().map(Symbol::as_str).collect();
        assert_eq!(names, vec!["BTC-USDT", "ETH-USDT", "SOL-USDT"]);
    }
}

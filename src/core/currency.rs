//! Exchange rate abstractions and currency conversion

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Fetches exchange rates relative to a base currency.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Returns currency code -> multiplier relative to `base`.
    async fn fetch_rates(&self, base: &str) -> anyhow::Result<HashMap<String, f64>>;
}

#[derive(Debug, Error)]
pub enum RateFetchError {
    #[error("Failed to fetch exchange rates for {base}: {source}")]
    Provider {
        base: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Timed out after {timeout:?} fetching exchange rates for {base}")]
    Timeout { base: String, timeout: Duration },

    #[error("No usable exchange rates returned for {base}")]
    Empty { base: String },
}

/// Rates fetched for one pivot currency at one point in time.
#[derive(Debug, Clone)]
pub struct RateSnapshot {
    pub base: String,
    pub rates: HashMap<String, f64>,
    pub fetched_at: Instant,
}

impl RateSnapshot {
    pub fn new(base: &str, rates: HashMap<String, f64>) -> Self {
        Self {
            base: base.to_uppercase(),
            rates,
            fetched_at: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    pub fn is_fresh(&self, window: Duration) -> bool {
        self.age() <= window
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }
}

/// An amount converted for display, labelled with the identifier it was asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedAmount {
    pub amount: f64,
    pub identifier: String,
}

const SYMBOL_CODES: [(&str, &str); 5] = [
    ("$", "USD"),
    ("€", "EUR"),
    ("£", "GBP"),
    ("¥", "JPY"),
    ("₹", "INR"),
];

/// Maps a display identifier (symbol or three-letter code) to a currency code.
pub fn resolve_currency_code(identifier: &str) -> Option<String> {
    let identifier = identifier.trim();
    if let Some((_, code)) = SYMBOL_CODES.iter().find(|(symbol, _)| *symbol == identifier) {
        return Some(code.to_string());
    }
    if identifier.len() == 3 && identifier.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(identifier.to_ascii_uppercase());
    }
    None
}

/// The symbol conventionally used for a currency code, if known.
pub fn symbol_for_code(code: &str) -> Option<&'static str> {
    SYMBOL_CODES
        .iter()
        .find(|(_, c)| c.eq_ignore_ascii_case(code))
        .map(|(symbol, _)| *symbol)
}

/// Converts `amount` from `from` into the currency named by `to_identifier`.
///
/// `rates` are multipliers relative to the snapshot's pivot currency; the amount is
/// first divided into the pivot and then multiplied out. A source currency missing
/// from `rates` is treated as the pivot itself (rate 1.0). Returns `None` when there
/// are no rates, the target is not a known currency, or the target has no rate.
pub fn convert(
    amount: f64,
    from: &str,
    to_identifier: &str,
    rates: &HashMap<String, f64>,
) -> Option<ConvertedAmount> {
    if rates.is_empty() {
        return None;
    }
    let to_code = resolve_currency_code(to_identifier)?;

    let from_rate = rates.get(&from.to_uppercase()).copied().unwrap_or(1.0);
    let to_rate = *rates.get(&to_code)?;

    let pivot_amount = amount / from_rate;
    Some(ConvertedAmount {
        amount: pivot_amount * to_rate,
        identifier: to_identifier.to_string(),
    })
}

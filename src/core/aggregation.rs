//! Converts stored subscriptions into the sorted, totaled view shown to the user.

use crate::core::currency::convert;
use crate::core::sort::{SortCriterion, sort_subscriptions};
use crate::core::subscription::{DisplaySubscription, SubscriptionRecord};
use std::collections::HashMap;
use std::fmt::Display;
use tokio::time::Instant;

/// Sum of active subscriptions in the display currency.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonthlyTotal {
    pub amount: f64,
    pub currency: String,
}

impl Display for MonthlyTotal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_amount(self.amount, &self.currency))
    }
}

/// One derived state of the subscription list.
#[derive(Debug, Clone, Default)]
pub struct HomeView {
    pub subscriptions: Vec<DisplaySubscription>,
    pub monthly_total: MonthlyTotal,
    pub sort: SortCriterion,
    /// Fetch time of the rates used, `None` when every entry is in its base currency.
    pub rates_fetched_at: Option<Instant>,
}

/// Projects every record into `display_currency`.
///
/// Records that cannot be converted keep their base cost and currency.
pub fn to_display(
    records: &[SubscriptionRecord],
    display_currency: &str,
    rates: &HashMap<String, f64>,
) -> Vec<DisplaySubscription> {
    records
        .iter()
        .map(|record| {
            match convert(record.base_cost, &record.base_currency, display_currency, rates) {
                Some(converted) => DisplaySubscription {
                    record: record.clone(),
                    display_cost: converted.amount,
                    display_currency: converted.identifier,
                },
                None => DisplaySubscription {
                    record: record.clone(),
                    display_cost: record.base_cost,
                    display_currency: record.base_currency.clone(),
                },
            }
        })
        .collect()
}

/// Sums the active entries, labelled with the currency of the first active entry in
/// stored order, or `display_currency` when none is active.
///
/// Callers pass the list before sorting, so the label does not depend on sort order.
pub fn monthly_total(subscriptions: &[DisplaySubscription], display_currency: &str) -> MonthlyTotal {
    let active = || subscriptions.iter().filter(|s| s.is_active());

    let amount = active().map(|s| s.display_cost).sum();
    let currency = active()
        .next()
        .map(|s| s.display_currency.clone())
        .unwrap_or_else(|| display_currency.to_string());

    MonthlyTotal { amount, currency }
}

pub fn build_view(
    records: &[SubscriptionRecord],
    display_currency: &str,
    rates: &HashMap<String, f64>,
    sort: SortCriterion,
) -> HomeView {
    let mut subscriptions = to_display(records, display_currency, rates);
    let monthly_total = monthly_total(&subscriptions, display_currency);
    sort_subscriptions(&mut subscriptions, sort);

    HomeView {
        subscriptions,
        monthly_total,
        sort,
        rates_fetched_at: None,
    }
}

/// Formats an amount with two decimals next to a currency symbol or code.
pub fn format_amount(amount: f64, identifier: &str) -> String {
    let identifier = identifier.trim();
    let mut chars = identifier.chars();
    match (chars.next(), chars.next()) {
        (None, _) => format!("{amount:.2}"),
        (Some(symbol), None) if !symbol.is_alphanumeric() => format!("{symbol}{amount:.2}"),
        _ if identifier.len() == 3 && identifier.chars().all(|c| c.is_ascii_alphabetic()) => {
            format!("{amount:.2} {}", identifier.to_ascii_uppercase())
        }
        _ => format!("${amount:.2}"),
    }
}

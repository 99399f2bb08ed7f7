use crate::core::subscription::DisplaySubscription;
use anyhow::anyhow;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortCriterion {
    #[default]
    RenewalDateAscending,
    PriceAscending,
    PriceDescending,
    NameAscending,
}

impl Display for SortCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SortCriterion::RenewalDateAscending => "renewal",
                SortCriterion::PriceAscending => "price-asc",
                SortCriterion::PriceDescending => "price-desc",
                SortCriterion::NameAscending => "name",
            }
        )
    }
}

impl FromStr for SortCriterion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "renewal" | "date" => Ok(SortCriterion::RenewalDateAscending),
            "price-asc" | "price" => Ok(SortCriterion::PriceAscending),
            "price-desc" => Ok(SortCriterion::PriceDescending),
            "name" => Ok(SortCriterion::NameAscending),
            _ => Err(anyhow!("Invalid sort order: {}", s)),
        }
    }
}

/// Orders subscriptions in place. The sort is stable, so ties keep their input order.
pub fn sort_subscriptions(subscriptions: &mut [DisplaySubscription], criterion: SortCriterion) {
    match criterion {
        SortCriterion::RenewalDateAscending => {
            subscriptions.sort_by(|a, b| a.record.renewal_date.cmp(&b.record.renewal_date))
        }
        SortCriterion::PriceAscending => {
            subscriptions.sort_by(|a, b| a.display_cost.total_cmp(&b.display_cost))
        }
        SortCriterion::PriceDescending => {
            subscriptions.sort_by(|a, b| b.display_cost.total_cmp(&a.display_cost))
        }
        SortCriterion::NameAscending => {
            subscriptions.sort_by_cached_key(|s| s.record.name.to_lowercase())
        }
    }
}

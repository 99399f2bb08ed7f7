//! Subscription records and their display projection

use anyhow::{Result, anyhow, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

/// Currencies a subscription cost can be entered in.
pub const BASE_CURRENCY_OPTIONS: [&str; 5] = ["USD", "EUR", "GBP", "JPY", "INR"];

/// Days ahead of a renewal during which it is highlighted.
pub const RENEWAL_SOON_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    Paused,
    Canceled,
    PendingPayment,
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SubscriptionStatus::Active => "Active",
                SubscriptionStatus::Paused => "Paused",
                SubscriptionStatus::Canceled => "Canceled",
                SubscriptionStatus::PendingPayment => "Pending payment",
            }
        )
    }
}

impl FromStr for SubscriptionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "ACTIVE" => Ok(SubscriptionStatus::Active),
            "PAUSED" => Ok(SubscriptionStatus::Paused),
            "CANCELED" | "CANCELLED" => Ok(SubscriptionStatus::Canceled),
            "PENDING_PAYMENT" | "PENDING" => Ok(SubscriptionStatus::PendingPayment),
            _ => Err(anyhow!("Invalid subscription status: {}", s)),
        }
    }
}

/// A recurring subscription as the user entered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub renewal_date: NaiveDate,
    pub base_cost: f64,
    pub base_currency: String,
    pub status: SubscriptionStatus,
}

impl SubscriptionRecord {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// True when the next renewal falls in `[today, today + days)`.
    pub fn renews_within(&self, today: NaiveDate, days: i64) -> bool {
        let days_until = (self.renewal_date - today).num_days();
        (0..days).contains(&days_until)
    }
}

/// A record paired with its cost in the current display currency.
///
/// Built fresh on every recomputation; the wrapped record is never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySubscription {
    pub record: SubscriptionRecord,
    pub display_cost: f64,
    pub display_currency: String,
}

impl DisplaySubscription {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn is_active(&self) -> bool {
        self.record.is_active()
    }
}

/// Unvalidated input for creating or editing a subscription.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionDraft {
    pub id: Option<String>,
    pub name: String,
    pub cost: String,
    pub currency: String,
    pub renewal_date: Option<NaiveDate>,
    pub status: Option<SubscriptionStatus>,
    pub image_url: Option<String>,
}

impl SubscriptionDraft {
    /// Starts a draft pre-filled from an existing record.
    pub fn from_record(record: &SubscriptionRecord) -> Self {
        Self {
            id: Some(record.id.clone()),
            name: record.name.clone(),
            cost: record.base_cost.to_string(),
            currency: record.base_currency.clone(),
            renewal_date: Some(record.renewal_date),
            status: Some(record.status),
            image_url: record.image_url.clone(),
        }
    }

    /// Validates the draft. `today` is used when no renewal date was given.
    pub fn into_record(self, today: NaiveDate) -> Result<SubscriptionRecord> {
        let name = self.name.trim();
        if name.is_empty() {
            bail!("Subscription name cannot be empty");
        }

        let base_cost: f64 = self
            .cost
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid cost: {}", self.cost))?;
        if !base_cost.is_finite() || base_cost < 0.0 {
            bail!("Cost must be a non-negative amount: {}", self.cost);
        }

        let base_currency = self.currency.trim().to_uppercase();
        if !BASE_CURRENCY_OPTIONS.contains(&base_currency.as_str()) {
            bail!(
                "Unsupported currency: {} (expected one of {})",
                self.currency,
                BASE_CURRENCY_OPTIONS.join(", ")
            );
        }

        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(SubscriptionRecord {
            id,
            name: name.to_string(),
            image_url: self.image_url.filter(|url| !url.trim().is_empty()),
            renewal_date: self.renewal_date.unwrap_or(today),
            base_cost,
            base_currency,
            status: self.status.unwrap_or(SubscriptionStatus::Active),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(name: &str, cost: &str) -> SubscriptionDraft {
        SubscriptionDraft {
            name: name.to_string(),
            cost: cost.to_string(),
            currency: "usd".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            "active".parse::<SubscriptionStatus>().unwrap(),
            SubscriptionStatus::Active
        );
        assert_eq!(
            "pending-payment".parse::<SubscriptionStatus>().unwrap(),
            SubscriptionStatus::PendingPayment
        );
        assert_eq!(
            "CANCELED".parse::<SubscriptionStatus>().unwrap(),
            SubscriptionStatus::Canceled
        );
        assert!("expired".parse::<SubscriptionStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_to_stored_names() {
        let json = serde_json::to_string(&SubscriptionStatus::PendingPayment).unwrap();
        assert_eq!(json, "\"PENDING_PAYMENT\"");
    }

    #[test]
    fn test_draft_validation() {
        let today = date(2024, 5, 1);

        let record = draft("Music", " 9.99 ").into_record(today).unwrap();
        assert_eq!(record.name, "Music");
        assert_eq!(record.base_cost, 9.99);
        assert_eq!(record.base_currency, "USD");
        assert_eq!(record.renewal_date, today);
        assert_eq!(record.status, SubscriptionStatus::Active);
        assert!(!record.id.is_empty());

        assert!(draft("  ", "9.99").into_record(today).is_err());
        assert!(draft("Music", "nine").into_record(today).is_err());
        assert!(draft("Music", "-1").into_record(today).is_err());

        let mut unsupported = draft("Music", "1");
        unsupported.currency = "CHF".to_string();
        assert!(unsupported.into_record(today).is_err());
    }

    #[test]
    fn test_draft_keeps_existing_id() {
        let mut d = draft("Cloud", "5");
        d.id = Some("abc".to_string());
        let record = d.into_record(date(2024, 1, 1)).unwrap();
        assert_eq!(record.id, "abc");

        let round = SubscriptionDraft::from_record(&record)
            .into_record(date(2030, 1, 1))
            .unwrap();
        assert_eq!(round, record);
    }

    #[test]
    fn test_renews_within() {
        let today = date(2024, 5, 1);
        let mut record = draft("Video", "1").into_record(today).unwrap();

        assert!(record.renews_within(today, RENEWAL_SOON_DAYS));
        record.renewal_date = date(2024, 5, 7);
        assert!(record.renews_within(today, RENEWAL_SOON_DAYS));
        record.renewal_date = date(2024, 5, 8);
        assert!(!record.renews_within(today, RENEWAL_SOON_DAYS));
        record.renewal_date = date(2024, 4, 30);
        assert!(!record.renews_within(today, RENEWAL_SOON_DAYS));
    }
}

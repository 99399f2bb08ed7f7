use super::ui;
use crate::App;
use crate::core::aggregation::format_amount;
use crate::core::subscription::{SubscriptionDraft, SubscriptionRecord, SubscriptionStatus};
use crate::store::subscriptions::SubscriptionStore;
use anyhow::{Result, bail};
use chrono::NaiveDate;

/// Fields to overwrite on an existing subscription. `None` keeps the stored value.
///
/// A blank `image_url` removes the stored image.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionChanges {
    pub name: Option<String>,
    pub cost: Option<String>,
    pub currency: Option<String>,
    pub renewal_date: Option<NaiveDate>,
    pub status: Option<SubscriptionStatus>,
    pub image_url: Option<String>,
}

impl SubscriptionChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cost.is_none()
            && self.currency.is_none()
            && self.renewal_date.is_none()
            && self.status.is_none()
            && self.image_url.is_none()
    }

    pub fn apply_to(self, mut draft: SubscriptionDraft) -> SubscriptionDraft {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(cost) = self.cost {
            draft.cost = cost;
        }
        if let Some(currency) = self.currency {
            draft.currency = currency;
        }
        if let Some(date) = self.renewal_date {
            draft.renewal_date = Some(date);
        }
        if let Some(status) = self.status {
            draft.status = Some(status);
        }
        if let Some(url) = self.image_url {
            let url = url.trim();
            draft.image_url = (!url.is_empty()).then(|| url.to_string());
        }
        draft
    }
}

fn describe(record: &SubscriptionRecord) -> String {
    format!(
        "{} ({}, renews {}, {})",
        ui::style_text(&record.name, ui::StyleType::TotalLabel),
        format_amount(record.base_cost, &record.base_currency),
        record.renewal_date,
        record.status
    )
}

pub async fn add_subscription(
    store: &SubscriptionStore,
    draft: SubscriptionDraft,
    today: NaiveDate,
) -> Result<SubscriptionRecord> {
    let record = draft.into_record(today)?;
    if store.get(&record.id).await?.is_some() {
        bail!("A subscription with id {} already exists", record.id);
    }
    store.insert(record.clone()).await?;
    Ok(record)
}

pub async fn edit_subscription(
    store: &SubscriptionStore,
    id: &str,
    changes: SubscriptionChanges,
    today: NaiveDate,
) -> Result<SubscriptionRecord> {
    let Some(existing) = store.get(id).await? else {
        bail!("Subscription not found: {}", id);
    };
    let record = changes
        .apply_to(SubscriptionDraft::from_record(&existing))
        .into_record(today)?;
    store.update(record.clone()).await?;
    Ok(record)
}

pub async fn add(app: &App, draft: SubscriptionDraft, today: NaiveDate) -> Result<()> {
    let record = add_subscription(&app.subscriptions, draft, today).await?;
    println!("Added {}", describe(&record));
    println!("{}", ui::style_text(&format!("id: {}", record.id), ui::StyleType::Subtle));
    Ok(())
}

pub async fn edit(app: &App, id: &str, changes: SubscriptionChanges, today: NaiveDate) -> Result<()> {
    if changes.is_empty() {
        bail!("Nothing to change, pass at least one field to update");
    }
    let record = edit_subscription(&app.subscriptions, id, changes, today).await?;
    println!("Updated {}", describe(&record));
    Ok(())
}

pub async fn remove(app: &App, id: &str) -> Result<()> {
    if !app.subscriptions.delete(id).await? {
        bail!("Subscription not found: {}", id);
    }
    println!("Removed subscription {}", id);
    Ok(())
}

pub async fn demo(app: &App, today: NaiveDate) -> Result<()> {
    if app.subscriptions.seed_samples_if_empty(today).await? {
        println!(
            "{}",
            ui::style_text("Loaded sample subscriptions", ui::StyleType::Success)
        );
    } else {
        println!("Subscriptions already exist, leaving them untouched");
    }
    Ok(())
}

use super::ui;
use crate::App;
use crate::core::aggregation::{HomeView, MonthlyTotal, format_amount};
use crate::core::pipeline::Pipeline;
use crate::core::sort::SortCriterion;
use crate::core::subscription::RENEWAL_SOON_DAYS;
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::{Cell, Color};
use tracing::warn;

impl HomeView {
    pub fn display_as_table(&self, today: NaiveDate) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Name"),
            ui::header_cell("Status"),
            ui::header_cell("Renews"),
            ui::header_cell("Cost"),
            ui::header_cell("Entered as"),
            ui::header_cell("Id"),
        ]);

        for entry in &self.subscriptions {
            let record = &entry.record;
            let renews = if record.renews_within(today, RENEWAL_SOON_DAYS) {
                Cell::new(format!("{} (soon)", record.renewal_date)).fg(Color::Yellow)
            } else {
                Cell::new(record.renewal_date.to_string())
            };
            let converted = entry.display_currency != record.base_currency;

            table.add_row(vec![
                Cell::new(&record.name),
                ui::status_cell(record.status),
                renews,
                ui::amount_cell(format_amount(entry.display_cost, &entry.display_currency)),
                ui::format_optional_cell(converted.then_some(record.base_cost), |cost| {
                    format_amount(cost, &record.base_currency)
                }),
                Cell::new(&record.id).fg(Color::DarkGrey),
            ]);
        }

        let mut output = format!(
            "{} {}\n\n",
            ui::style_text("Subscriptions", ui::StyleType::Title),
            ui::style_text(&format!("(sorted by {})", self.sort), ui::StyleType::Subtle)
        );
        if self.subscriptions.is_empty() {
            output.push_str("No subscriptions yet. Add one with `subtrack add` or load samples with `subtrack demo`.");
        } else {
            output.push_str(&table.to_string());
        }
        output.push_str("\n\n");
        output.push_str(&self.monthly_total.display_line());
        if self.rates_fetched_at.is_none() && !self.subscriptions.is_empty() {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(
                    "Exchange rates unavailable, amounts shown in their entered currency",
                    ui::StyleType::Subtle
                )
            ));
        }
        output
    }

}

impl MonthlyTotal {
    pub fn display_line(&self) -> String {
        format!(
            "{}: {}",
            ui::style_text("Monthly total", ui::StyleType::TotalLabel),
            ui::style_text(&self.to_string(), ui::StyleType::TotalValue)
        )
    }
}

/// Fetches rates if needed and waits until the view has caught up with them.
pub async fn settled_view(pipeline: &Pipeline) -> HomeView {
    let pb = ui::new_spinner("Fetching exchange rates...");
    let refreshed = pipeline.refresh_rates().await;
    pb.finish_and_clear();

    match refreshed {
        Ok(snapshot) => pipeline
            .wait_for(|view| view.rates_fetched_at >= Some(snapshot.fetched_at))
            .await
            .unwrap_or_else(|| pipeline.current()),
        Err(e) => {
            warn!(error = %e, "Showing subscriptions without conversion");
            pipeline.current()
        }
    }
}

pub async fn run(app: &App, sort: SortCriterion, today: NaiveDate) -> Result<()> {
    let pipeline = app.pipeline(sort);
    let view = settled_view(&pipeline).await;
    println!("{}", view.display_as_table(today));
    Ok(())
}

pub async fn run_total(app: &App) -> Result<()> {
    let pipeline = app.pipeline(SortCriterion::default());
    settled_view(&pipeline).await;
    println!("{}", pipeline.monthly_total().display_line());
    Ok(())
}

use super::ui;
use crate::App;
use crate::core::currency::{RateSnapshot, resolve_currency_code, symbol_for_code};
use anyhow::Result;
use comfy_table::Cell;

impl RateSnapshot {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Currency"),
            ui::header_cell(&format!("Per 1 {}", self.base)),
        ]);

        let mut codes: Vec<_> = self.rates.iter().collect();
        codes.sort_by(|a, b| a.0.cmp(b.0));
        for (code, rate) in codes {
            let label = match symbol_for_code(code) {
                Some(symbol) => format!("{code} ({symbol})"),
                None => code.clone(),
            };
            table.add_row(vec![Cell::new(label), ui::amount_cell(format!("{rate:.4}"))]);
        }

        format!(
            "Exchange rates for {}\n\n{}\n\n{}",
            ui::style_text(&self.base, ui::StyleType::Title),
            table,
            ui::style_text(
                &format!("Fetched {}s ago", self.age().as_secs()),
                ui::StyleType::Subtle
            )
        )
    }
}

/// Base to show when none was asked for: the display currency, else the pivot.
pub fn default_base(app: &App) -> String {
    resolve_currency_code(&app.settings.current().currency)
        .unwrap_or_else(|| app.config.rates.pivot.to_uppercase())
}

pub async fn run(app: &App, base: Option<&str>) -> Result<()> {
    let base = match base {
        Some(base) => base.to_string(),
        None => default_base(app),
    };

    let pb = ui::new_spinner(&format!("Fetching exchange rates for {base}..."));
    let snapshot = app.rate_cache.get_rates(&base).await;
    pb.finish_and_clear();

    println!("{}", snapshot?.display_as_table());
    Ok(())
}

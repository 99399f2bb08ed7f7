use super::ui;
use crate::App;
use crate::core::currency::resolve_currency_code;
use crate::store::settings::{AppTheme, Settings};
use anyhow::Result;
use comfy_table::Cell;

pub enum SettingsCommand {
    Show,
    Currency(String),
    Theme(AppTheme),
    Language(String),
}

impl Settings {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Setting"), ui::header_cell("Value")]);
        table.add_row(vec![Cell::new("Display currency"), Cell::new(&self.currency)]);
        table.add_row(vec![Cell::new("Theme"), Cell::new(self.theme)]);
        table.add_row(vec![Cell::new("Language"), Cell::new(&self.language)]);
        table.to_string()
    }
}

pub async fn run(app: &App, command: SettingsCommand) -> Result<()> {
    let store = &app.settings;
    match command {
        SettingsCommand::Show => {}
        SettingsCommand::Currency(currency) => {
            store.set_display_currency(&currency).await?;
            if resolve_currency_code(&currency).is_none() {
                println!(
                    "{}",
                    ui::style_text(
                        &format!("{} is not a known currency, amounts will not be converted", currency.trim()),
                        ui::StyleType::Error
                    )
                );
            }
        }
        SettingsCommand::Theme(theme) => store.set_theme(theme).await?,
        SettingsCommand::Language(language) => store.set_language(&language).await?,
    }
    println!("{}", store.current().display_as_table());
    Ok(())
}

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use subtrack::AppCommand;
use subtrack::cli::edit::SubscriptionChanges;
use subtrack::cli::settings::SettingsCommand;
use subtrack::core::log::init_logging;
use subtrack::core::sort::SortCriterion;
use subtrack::core::subscription::{SubscriptionDraft, SubscriptionStatus};
use subtrack::store::settings::AppTheme;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct SubscriptionFields {
    /// Monthly cost in the subscription's own currency
    #[arg(long)]
    cost: Option<String>,

    /// Currency the cost is billed in (USD, EUR, GBP, JPY or INR)
    #[arg(long)]
    currency: Option<String>,

    /// Next renewal date (YYYY-MM-DD)
    #[arg(long)]
    renews: Option<NaiveDate>,

    /// active, paused, canceled or pending-payment
    #[arg(long)]
    status: Option<SubscriptionStatus>,

    /// Pass an empty value to remove the image
    #[arg(long)]
    image_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List subscriptions in the display currency
    List {
        /// renewal, price-asc, price-desc or name
        #[arg(short, long)]
        sort: Option<SortCriterion>,
    },
    /// Show the monthly total of active subscriptions
    Total,
    /// Add a subscription
    Add {
        name: String,
        #[command(flatten)]
        fields: SubscriptionFields,
    },
    /// Change fields of an existing subscription
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: SubscriptionFields,
    },
    /// Delete a subscription
    Remove { id: String },
    /// Load sample subscriptions into an empty store
    Demo,
    /// Show or change preferences
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommands>,
    },
    /// Log in to your account
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
        /// Keep the email for the next login
        #[arg(long)]
        remember_me: bool,
    },
    /// Forget the stored login
    Logout,
    /// Show exchange rates
    Rates {
        /// Base currency, defaults to the display currency
        #[arg(short, long)]
        base: Option<String>,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show current preferences
    Show,
    /// Set the display currency, as a symbol or a three-letter code
    Currency { currency: String },
    /// Set the theme (light, dark or system)
    Theme { theme: AppTheme },
    /// Set the language code
    Language { language: String },
}

impl From<SettingsCommands> for SettingsCommand {
    fn from(cmd: SettingsCommands) -> SettingsCommand {
        match cmd {
            SettingsCommands::Show => SettingsCommand::Show,
            SettingsCommands::Currency { currency } => SettingsCommand::Currency(currency),
            SettingsCommands::Theme { theme } => SettingsCommand::Theme(theme),
            SettingsCommands::Language { language } => SettingsCommand::Language(language),
        }
    }
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        match cmd {
            Commands::List { sort } => AppCommand::List { sort },
            Commands::Total => AppCommand::Total,
            Commands::Add { name, fields } => AppCommand::Add(SubscriptionDraft {
                id: None,
                name,
                cost: fields.cost.unwrap_or_default(),
                currency: fields.currency.unwrap_or_else(|| "USD".to_string()),
                renewal_date: fields.renews,
                status: fields.status,
                image_url: fields.image_url,
            }),
            Commands::Edit { id, name, fields } => AppCommand::Edit {
                id,
                changes: SubscriptionChanges {
                    name,
                    cost: fields.cost,
                    currency: fields.currency,
                    renewal_date: fields.renews,
                    status: fields.status,
                    image_url: fields.image_url,
                },
            },
            Commands::Remove { id } => AppCommand::Remove { id },
            Commands::Demo => AppCommand::Demo,
            Commands::Settings { command } => {
                AppCommand::Settings(command.map_or(SettingsCommand::Show, Into::into))
            }
            Commands::Login {
                email,
                password,
                remember_me,
            } => AppCommand::Login {
                email,
                password,
                remember_me,
            },
            Commands::Logout => AppCommand::Logout,
            Commands::Rates { base } => AppCommand::Rates { base },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => subtrack::cli::setup::setup_at_path(path),
            None => subtrack::cli::setup::setup(),
        },
        Some(cmd) => subtrack::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

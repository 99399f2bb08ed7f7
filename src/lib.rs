pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::edit::SubscriptionChanges;
use crate::cli::settings::SettingsCommand;
use crate::core::auth::{AuthApi, LoginService};
use crate::core::config::{AppConfig, RateProviderConfig, RateProviderKind};
use crate::core::currency::RateProvider;
use crate::core::pipeline::{Pipeline, PipelineDeps};
use crate::core::sort::SortCriterion;
use crate::core::subscription::SubscriptionDraft;
use crate::providers::{HttpAuthApi, OpenErApiProvider, RateCache, StaticRateProvider};
use crate::store::KeyValueStore;
use crate::store::session::SessionStore;
use crate::store::settings::SettingsStore;
use crate::store::subscriptions::SubscriptionStore;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    List { sort: Option<SortCriterion> },
    Total,
    Add(SubscriptionDraft),
    Edit { id: String, changes: SubscriptionChanges },
    Remove { id: String },
    Demo,
    Settings(SettingsCommand),
    Login {
        email: Option<String>,
        password: Option<String>,
        remember_me: bool,
    },
    Logout,
    Rates { base: Option<String> },
}

/// Stores and services shared by every command.
pub struct App {
    pub config: AppConfig,
    pub subscriptions: Arc<SubscriptionStore>,
    pub settings: Arc<SettingsStore>,
    pub session: Arc<SessionStore>,
    pub rate_cache: Arc<RateCache>,
}

impl App {
    /// Opens the on-disk store under the configured data path.
    pub fn open(config: AppConfig) -> Result<Self> {
        let data_path = config.default_data_path()?;
        let store = KeyValueStore::open(&data_path)?;
        Self::with_store(config, &store)
    }

    pub fn with_store(config: AppConfig, store: &KeyValueStore) -> Result<Self> {
        let provider = build_rate_provider(&config.providers.rates)?;
        let rate_cache = Arc::new(RateCache::with_settings(
            provider,
            config.rates.freshness(),
            config.rates.timeout(),
        ));

        Ok(Self {
            subscriptions: Arc::new(SubscriptionStore::open(store)?),
            settings: Arc::new(SettingsStore::open(store)?),
            session: Arc::new(SessionStore::open(store)?),
            rate_cache,
            config,
        })
    }

    pub fn pipeline(&self, sort: SortCriterion) -> Pipeline {
        Pipeline::spawn(PipelineDeps {
            subscriptions: self.subscriptions.observe_all(),
            display_currency: self.settings.observe_display_currency(),
            rate_cache: Arc::clone(&self.rate_cache),
            pivot: self.config.rates.pivot.clone(),
            sort,
        })
    }

    pub fn login_service(&self) -> Result<LoginService> {
        let base_url = self
            .config
            .providers
            .auth
            .base_url
            .as_deref()
            .context("No login service configured, set providers.auth.base_url")?;
        let api: Arc<dyn AuthApi> = Arc::new(HttpAuthApi::new(base_url)?);
        Ok(LoginService::new(api, Arc::clone(&self.session)))
    }
}

pub fn build_rate_provider(config: &RateProviderConfig) -> Result<Arc<dyn RateProvider>> {
    Ok(match config.kind {
        RateProviderKind::Http => {
            debug!("Using exchange rates from {}", config.base_url);
            Arc::new(OpenErApiProvider::new(&config.base_url)?)
        }
        RateProviderKind::Static => {
            debug!("Using built-in exchange rates");
            Arc::new(StaticRateProvider::new())
        }
    })
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    if let Some(path) = config_path {
        return AppConfig::load_from_path(path);
    }
    let default_path = AppConfig::default_config_path()?;
    if default_path.exists() {
        AppConfig::load()
    } else {
        debug!("No config at {}, using defaults", default_path.display());
        Ok(AppConfig::default())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Subscription tracker starting...");

    let config = load_config(config_path)?;
    debug!("Loaded config: {config:#?}");
    let app = App::open(config)?;

    match command {
        AppCommand::List { sort } => cli::list::run(&app, sort.unwrap_or_default(), today()).await,
        AppCommand::Total => cli::list::run_total(&app).await,
        AppCommand::Add(draft) => cli::edit::add(&app, draft, today()).await,
        AppCommand::Edit { id, changes } => cli::edit::edit(&app, &id, changes, today()).await,
        AppCommand::Remove { id } => cli::edit::remove(&app, &id).await,
        AppCommand::Demo => cli::edit::demo(&app, today()).await,
        AppCommand::Settings(command) => cli::settings::run(&app, command).await,
        AppCommand::Login {
            email,
            password,
            remember_me,
        } => cli::login::login(&app, email, password, remember_me).await,
        AppCommand::Logout => cli::login::logout(&app).await,
        AppCommand::Rates { base } => cli::rates::run(&app, base.as_deref()).await,
    }
}

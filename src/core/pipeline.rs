//! Keeps the home view current as subscriptions, currency, rates or sort order change.
//!
//! Each input is a `watch` channel holding its latest value. A dedicated task wakes on
//! any change, reads the latest value of every input and republishes the derived
//! [`HomeView`]. Only a change of display currency can lead to a rate fetch, and only
//! when the rates already held cannot serve the new currency.

use crate::core::aggregation::{HomeView, MonthlyTotal, build_view};
use crate::core::currency::{RateFetchError, RateSnapshot, resolve_currency_code};
use crate::core::sort::SortCriterion;
use crate::core::subscription::{DisplaySubscription, SubscriptionRecord};
use crate::providers::caching::RateCache;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct PipelineDeps {
    pub subscriptions: watch::Receiver<Vec<SubscriptionRecord>>,
    pub display_currency: watch::Receiver<String>,
    pub rate_cache: Arc<RateCache>,
    /// Base to fetch when the display currency is not a known code.
    pub pivot: String,
    pub sort: SortCriterion,
}

pub struct Pipeline {
    sort: watch::Sender<SortCriterion>,
    display_currency: watch::Receiver<String>,
    refresher: RateRefresher,
    view: watch::Receiver<HomeView>,
    task: JoinHandle<()>,
}

impl Pipeline {
    /// Computes the first view immediately, then keeps it current on a spawned task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(deps: PipelineDeps) -> Self {
        let PipelineDeps {
            subscriptions,
            display_currency,
            rate_cache,
            pivot,
            sort,
        } = deps;

        let (sort_tx, sort_rx) = watch::channel(sort);
        let (rates_tx, rates_rx) = watch::channel(None);
        let refresher = RateRefresher {
            cache: rate_cache,
            rates: Arc::new(rates_tx),
            pivot: pivot.to_uppercase(),
        };

        let mut inputs = Inputs {
            subscriptions,
            display_currency: display_currency.clone(),
            rates: rates_rx,
            sort: sort_rx,
        };
        let (initial, currency) = inputs.recompute();
        let (view_tx, view_rx) = watch::channel(initial);

        refresher.spawn_if_needed(&currency);
        let task = tokio::spawn(run(inputs, view_tx, refresher.clone(), currency));

        Self {
            sort: sort_tx,
            display_currency,
            refresher,
            view: view_rx,
            task,
        }
    }

    pub fn set_sort(&self, criterion: SortCriterion) {
        self.sort.send_if_modified(|current| {
            if *current == criterion {
                return false;
            }
            *current = criterion;
            true
        });
    }

    pub fn sort(&self) -> SortCriterion {
        *self.sort.borrow()
    }

    pub fn observe(&self) -> watch::Receiver<HomeView> {
        self.view.clone()
    }

    pub fn current(&self) -> HomeView {
        self.view.borrow().clone()
    }

    pub fn subscriptions(&self) -> Vec<DisplaySubscription> {
        self.view.borrow().subscriptions.clone()
    }

    pub fn monthly_total(&self) -> MonthlyTotal {
        self.view.borrow().monthly_total.clone()
    }

    /// Waits until the published view satisfies `predicate`.
    ///
    /// Returns `None` if the pipeline stopped first.
    pub async fn wait_for(&self, mut predicate: impl FnMut(&HomeView) -> bool) -> Option<HomeView> {
        let mut rx = self.view.clone();
        rx.wait_for(|view| predicate(view))
            .await
            .ok()
            .map(|view| view.clone())
    }

    /// Asks the rate cache for rates serving the current display currency.
    ///
    /// Within the freshness window this is answered from the cache.
    pub async fn refresh_rates(&self) -> Result<Arc<RateSnapshot>, RateFetchError> {
        let currency = self.display_currency.borrow().clone();
        self.refresher.refresh(&currency).await
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Inputs {
    subscriptions: watch::Receiver<Vec<SubscriptionRecord>>,
    display_currency: watch::Receiver<String>,
    rates: watch::Receiver<Option<Arc<RateSnapshot>>>,
    sort: watch::Receiver<SortCriterion>,
}

impl Inputs {
    /// Snapshots the latest value of every input and derives a view from them.
    fn recompute(&mut self) -> (HomeView, String) {
        let records = self.subscriptions.borrow_and_update().clone();
        let currency = self.display_currency.borrow_and_update().clone();
        let rates = self.rates.borrow_and_update().clone();
        let sort = *self.sort.borrow_and_update();

        let empty = HashMap::new();
        let mut view = build_view(
            &records,
            &currency,
            rates.as_ref().map_or(&empty, |snapshot| &snapshot.rates),
            sort,
        );
        view.rates_fetched_at = rates.as_ref().map(|snapshot| snapshot.fetched_at);
        (view, currency)
    }
}

async fn run(
    mut inputs: Inputs,
    view_tx: watch::Sender<HomeView>,
    refresher: RateRefresher,
    mut last_currency: String,
) {
    loop {
        let changed = tokio::select! {
            changed = inputs.subscriptions.changed() => changed,
            changed = inputs.display_currency.changed() => changed,
            changed = inputs.rates.changed() => changed,
            changed = inputs.sort.changed() => changed,
            _ = view_tx.closed() => break,
        };
        if changed.is_err() {
            debug!("Pipeline input closed, stopping");
            break;
        }

        let (view, currency) = inputs.recompute();
        view_tx.send_replace(view);

        if currency != last_currency {
            debug!("Display currency changed from {} to {}", last_currency, currency);
            refresher.spawn_if_needed(&currency);
            last_currency = currency;
        }
    }
}

#[derive(Clone)]
struct RateRefresher {
    cache: Arc<RateCache>,
    rates: Arc<watch::Sender<Option<Arc<RateSnapshot>>>>,
    pivot: String,
}

impl RateRefresher {
    fn base_for(&self, currency: &str) -> String {
        resolve_currency_code(currency).unwrap_or_else(|| self.pivot.clone())
    }

    /// True unless the published snapshot is fresh and already has the currency.
    fn needs_refresh(&self, currency: &str) -> bool {
        let base = self.base_for(currency);
        match self.rates.borrow().as_ref() {
            Some(snapshot) => {
                !(snapshot.is_fresh(self.cache.freshness()) && snapshot.contains(&base))
            }
            None => true,
        }
    }

    /// Starts a detached refresh. It is not cancelled with the pipeline, so a
    /// started fetch still lands in the shared cache.
    fn spawn_if_needed(&self, currency: &str) {
        if !self.needs_refresh(currency) {
            debug!("Held rates already serve {}", currency);
            return;
        }
        let this = self.clone();
        let currency = currency.to_string();
        tokio::spawn(async move {
            if let Err(e) = this.refresh(&currency).await {
                warn!(error = %e, "Exchange rates unavailable, showing entered currencies");
            }
        });
    }

    async fn refresh(&self, currency: &str) -> Result<Arc<RateSnapshot>, RateFetchError> {
        let snapshot = self.cache.get_rates(&self.base_for(currency)).await?;
        self.publish(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Publishes `snapshot` unless an equal or newer one is already out.
    fn publish(&self, snapshot: Arc<RateSnapshot>) {
        self.rates.send_if_modified(|current| match current {
            Some(held) if Arc::ptr_eq(held, &snapshot) || held.fetched_at > snapshot.fetched_at => {
                false
            }
            _ => {
                *current = Some(snapshot);
                true
            }
        });
    }
}

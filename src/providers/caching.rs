use crate::core::currency::{RateFetchError, RateProvider, RateSnapshot};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Keeps the most recent rate snapshot in front of a [`RateProvider`].
///
/// Only one snapshot is held: asking for a different base currency replaces it,
/// even when the cached one is still fresh. Fetches are serialized, so concurrent
/// callers wait for an in-flight fetch and then reuse its result.
pub struct RateCache {
    inner: Arc<dyn RateProvider>,
    freshness: Duration,
    timeout: Duration,
    slot: Mutex<Option<Arc<RateSnapshot>>>,
}

impl RateCache {
    pub fn new(inner: Arc<dyn RateProvider>) -> Self {
        Self::with_settings(inner, DEFAULT_FRESHNESS, DEFAULT_TIMEOUT)
    }

    pub fn with_settings(inner: Arc<dyn RateProvider>, freshness: Duration, timeout: Duration) -> Self {
        Self {
            inner,
            freshness,
            timeout,
            slot: Mutex::new(None),
        }
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// The snapshot currently held, fresh or not.
    pub async fn cached(&self) -> Option<Arc<RateSnapshot>> {
        self.slot.lock().await.clone()
    }

    pub async fn get_rates(&self, base: &str) -> Result<Arc<RateSnapshot>, RateFetchError> {
        let base = base.trim().to_uppercase();
        let mut slot = self.slot.lock().await;

        if let Some(snapshot) = slot.as_ref() {
            if snapshot.base == base && snapshot.is_fresh(self.freshness) && !snapshot.rates.is_empty()
            {
                debug!("Cache hit for rates: {}", base);
                return Ok(Arc::clone(snapshot));
            }
        }
        debug!("Cache miss for rates: {}", base);

        let fetched = match tokio::time::timeout(self.timeout, self.inner.fetch_rates(&base)).await {
            Ok(Ok(rates)) => rates,
            Ok(Err(source)) => return Err(RateFetchError::Provider { base, source }),
            Err(_) => {
                return Err(RateFetchError::Timeout {
                    base,
                    timeout: self.timeout,
                });
            }
        };

        let rates = usable_rates(fetched);
        if rates.is_empty() {
            return Err(RateFetchError::Empty { base });
        }

        info!(base = %base, count = rates.len(), "Fetched new exchange rates");
        let snapshot = Arc::new(RateSnapshot::new(&base, rates));
        *slot = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }
}

fn usable_rates(fetched: HashMap<String, f64>) -> HashMap<String, f64> {
    fetched
        .into_iter()
        .filter_map(|(code, rate)| {
            if rate.is_finite() && rate > 0.0 {
                Some((code.to_uppercase(), rate))
            } else {
                warn!("Ignoring invalid rate {} for {}", rate, code);
                None
            }
        })
        .collect()
}

use crate::core::subscription::{SubscriptionRecord, SubscriptionStatus};
use crate::store::{Edit, KeyValueCollection, KeyValueStore};
use anyhow::{Context, Result, bail};
use chrono::{Duration, NaiveDate};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info};

pub const COLLECTION: &str = "subscriptions";

/// Persists subscription records and publishes the full list after every write.
pub struct SubscriptionStore {
    collection: Arc<dyn KeyValueCollection>,
    records: watch::Sender<Vec<SubscriptionRecord>>,
    /// Held from apply until publish, so a slower writer never republishes an older list.
    writes: Mutex<()>,
}

impl SubscriptionStore {
    pub fn open(store: &KeyValueStore) -> Result<Self> {
        let collection = store.collection(COLLECTION)?;
        let initial = load_all(collection.as_ref())?;
        let (records, _) = watch::channel(initial);
        Ok(Self {
            collection,
            records,
            writes: Mutex::new(()),
        })
    }

    /// Live list of every stored record, ordered by id.
    pub fn observe_all(&self) -> watch::Receiver<Vec<SubscriptionRecord>> {
        self.records.subscribe()
    }

    pub fn all(&self) -> Vec<SubscriptionRecord> {
        self.records.borrow().clone()
    }

    pub async fn get(&self, id: &str) -> Result<Option<SubscriptionRecord>> {
        self.collection
            .get(id)?
            .map(|bytes| decode(id, &bytes))
            .transpose()
    }

    /// Inserts the record, replacing any record with the same id.
    pub async fn insert(&self, record: SubscriptionRecord) -> Result<()> {
        self.insert_all(vec![record]).await
    }

    pub async fn insert_all(&self, records: Vec<SubscriptionRecord>) -> Result<()> {
        let edits = records
            .iter()
            .map(|record| -> Result<Edit> {
                Ok(Edit::Put(record.id.clone(), serde_json::to_vec(record)?))
            })
            .collect::<Result<Vec<_>>>()?;
        let guard = self.lock_writes();
        self.write(&guard, edits)
    }

    /// Replaces an existing record. Fails when no record has that id.
    pub async fn update(&self, record: SubscriptionRecord) -> Result<()> {
        let edit = Edit::Put(record.id.clone(), serde_json::to_vec(&record)?);
        let guard = self.lock_writes();
        if self.collection.get(&record.id)?.is_none() {
            bail!("Subscription not found: {}", record.id);
        }
        self.write(&guard, vec![edit])
    }

    /// Deletes by id, returning whether a record was removed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let guard = self.lock_writes();
        if self.collection.get(id)?.is_none() {
            debug!("Nothing to delete for subscription {}", id);
            return Ok(false);
        }
        self.write(&guard, vec![Edit::Remove(id.to_string())])?;
        Ok(true)
    }

    /// Loads the sample subscriptions when the store holds nothing yet.
    pub async fn seed_samples_if_empty(&self, today: NaiveDate) -> Result<bool> {
        let edits = sample_subscriptions(today)
            .iter()
            .map(|record| -> Result<Edit> {
                Ok(Edit::Put(record.id.clone(), serde_json::to_vec(record)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let guard = self.lock_writes();
        if !self.collection.entries()?.is_empty() {
            return Ok(false);
        }
        info!("Store is empty, loading sample subscriptions");
        self.write(&guard, edits)?;
        Ok(true)
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self, _guard: &MutexGuard<'_, ()>, edits: Vec<Edit>) -> Result<()> {
        self.collection.apply(edits)?;
        let records = load_all(self.collection.as_ref())?;
        debug!("Publishing {} subscription(s)", records.len());
        self.records.send_replace(records);
        Ok(())
    }
}

fn decode(id: &str, bytes: &[u8]) -> Result<SubscriptionRecord> {
    serde_json::from_slice(bytes).with_context(|| format!("Corrupt subscription record: {id}"))
}

fn load_all(collection: &dyn KeyValueCollection) -> Result<Vec<SubscriptionRecord>> {
    collection
        .entries()?
        .iter()
        .map(|(id, bytes)| decode(id, bytes))
        .collect()
}

pub fn sample_subscriptions(today: NaiveDate) -> Vec<SubscriptionRecord> {
    let sample = |id: &str, name: &str, image: Option<&str>, days, cost, currency: &str, status| {
        SubscriptionRecord {
            id: id.to_string(),
            name: name.to_string(),
            image_url: image.map(str::to_string),
            renewal_date: today + Duration::days(days),
            base_cost: cost,
            base_currency: currency.to_string(),
            status,
        }
    };

    vec![
        sample(
            "1",
            "Streaming Service A",
            Some("https://via.placeholder.com/150/FF0000/FFFFFF?Text=ServiceA"),
            3,
            12.99,
            "USD",
            SubscriptionStatus::Active,
        ),
        sample(
            "2",
            "Music Platform B",
            Some("https://via.placeholder.com/150/00FF00/FFFFFF?Text=ServiceB"),
            8,
            9.99,
            "USD",
            SubscriptionStatus::PendingPayment,
        ),
        sample(
            "3",
            "Cloud Storage C",
            None,
            30,
            5.00,
            "EUR",
            SubscriptionStatus::Paused,
        ),
        sample(
            "4",
            "Gaming Subscription D",
            Some("https://via.placeholder.com/150/0000FF/FFFFFF?Text=ServiceD"),
            6,
            15.00,
            "USD",
            SubscriptionStatus::Canceled,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn store() -> SubscriptionStore {
        SubscriptionStore::open(&KeyValueStore::in_memory()).unwrap()
    }

    #[tokio::test]
    async fn test_insert_publishes_new_list() {
        let store = store();
        let mut rx = store.observe_all();
        assert!(rx.borrow_and_update().is_empty());

        let record = sample_subscriptions(today()).remove(0);
        store.insert(record.clone()).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), vec![record.clone()]);
        assert_eq!(store.get("1").await.unwrap(), Some(record));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = store();
        let mut record = sample_subscriptions(today()).remove(2);
        store.insert(record.clone()).await.unwrap();

        record.base_cost = 6.5;
        store.update(record.clone()).await.unwrap();
        assert_eq!(store.all()[0].base_cost, 6.5);

        let mut stranger = record.clone();
        stranger.id = "nope".to_string();
        assert!(store.update(stranger).await.is_err());

        assert!(store.delete("3").await.unwrap());
        assert!(!store.delete("3").await.unwrap());
        assert!(store.all().is_empty());
    }

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let store = store();
        assert!(store.seed_samples_if_empty(today()).await.unwrap());
        assert_eq!(store.all().len(), 4);
        assert!(!store.seed_samples_if_empty(today()).await.unwrap());
        assert_eq!(store.all().len(), 4);

        let cloud = store.get("3").await.unwrap().unwrap();
        assert_eq!(cloud.base_currency, "EUR");
        assert_eq!(cloud.renewal_date, today() + Duration::days(30));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_inserts_publish_every_record() {
        for _ in 0..50 {
            let store = Arc::new(store());
            let rx = store.observe_all();

            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let store = Arc::clone(&store);
                    tokio::spawn(async move {
                        let mut record = sample_subscriptions(today()).remove(0);
                        record.id = format!("{i:02}");
                        store.insert(record).await
                    })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            assert_eq!(store.all().len(), 16);
            assert_eq!(rx.borrow().len(), 16);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_seeding_loads_samples_once() {
        let store = Arc::new(store());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.seed_samples_if_empty(today()).await })
            })
            .collect();

        let mut seeded = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                seeded += 1;
            }
        }
        assert_eq!(seeded, 1);
        assert_eq!(store.all().len(), 4);
    }

    #[tokio::test]
    async fn test_records_persist_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let kv = KeyValueStore::open(dir.path()).unwrap();
            let store = SubscriptionStore::open(&kv).unwrap();
            store.insert_all(sample_subscriptions(today())).await.unwrap();
        }

        let kv = KeyValueStore::open(dir.path()).unwrap();
        let store = SubscriptionStore::open(&kv).unwrap();
        let ids: Vec<_> = store.all().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["1", "2", "3", "4"]);
    }
}

use crate::store::{Edit, KeyValueCollection};
use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::debug;

/// In-memory collection, used when nothing should touch the disk.
#[derive(Default)]
pub struct MemoryCollection {
    inner: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueCollection for MemoryCollection {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lock().get(key).cloned())
    }

    fn entries(&self) -> Result<Vec<(String, Vec<u8>)>> {
        Ok(self
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn apply(&self, edits: Vec<Edit>) -> Result<()> {
        let mut map = self.lock();
        debug!("Memory APPLY of {} edit(s)", edits.len());
        for edit in edits {
            match edit {
                Edit::Put(key, value) => {
                    map.insert(key, value);
                }
                Edit::Remove(key) => {
                    map.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.lock().clear();
        debug!("Memory CLEAR");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_collection_get_apply() {
        let collection = MemoryCollection::new();

        // Initially, collection is empty
        assert!(collection.get("key1").unwrap().is_none());

        collection
            .apply(vec![
                Edit::Put("b".to_string(), vec![2]),
                Edit::Put("a".to_string(), vec![1]),
                Edit::Remove("missing".to_string()),
            ])
            .unwrap();

        assert_eq!(collection.get("a").unwrap(), Some(vec![1]));
        assert_eq!(
            collection.entries().unwrap(),
            vec![("a".to_string(), vec![1]), ("b".to_string(), vec![2])]
        );
    }

    #[test]
    fn test_memory_collection_clear() {
        let collection = MemoryCollection::new();
        collection
            .apply(vec![Edit::Put("a".to_string(), vec![1])])
            .unwrap();

        collection.clear().unwrap();
        assert!(collection.entries().unwrap().is_empty());
    }
}

use crate::store::{Edit, KeyValueCollection};
use anyhow::{Context, Result};
use fjall::{Keyspace, PartitionHandle, PersistMode};
use tracing::debug;

/// A collection stored as one fjall partition.
pub struct DiskCollection {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn new(keyspace: Keyspace, partition: PartitionHandle) -> Self {
        Self {
            keyspace,
            partition,
        }
    }
}

impl KeyValueCollection for DiskCollection {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.partition.get(key.as_bytes())?;
        debug!("Store GET for key: {} (found: {})", key, value.is_some());
        Ok(value.map(|v| v.to_vec()))
    }

    fn entries(&self) -> Result<Vec<(String, Vec<u8>)>> {
        self.partition
            .iter()
            .map(|item| -> Result<(String, Vec<u8>)> {
                let (key, value) = item?;
                let key = String::from_utf8(key.to_vec()).context("Stored key is not UTF-8")?;
                Ok((key, value.to_vec()))
            })
            .collect()
    }

    fn apply(&self, edits: Vec<Edit>) -> Result<()> {
        let mut batch = self.keyspace.batch();
        for edit in &edits {
            match edit {
                Edit::Put(key, value) => batch.insert(&self.partition, key.as_bytes(), value.as_slice()),
                Edit::Remove(key) => batch.remove(&self.partition, key.as_bytes()),
            }
        }
        batch.commit()?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Store APPLY of {} edit(s)", edits.len());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let keys = self
            .entries()?
            .into_iter()
            .map(|(key, _)| Edit::Remove(key))
            .collect();
        self.apply(keys)
    }
}

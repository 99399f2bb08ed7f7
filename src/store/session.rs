use crate::store::{Edit, KeyValueCollection, KeyValueStore};
use anyhow::Result;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::debug;

pub const COLLECTION: &str = "session";

const REMEMBER_ME_KEY: &str = "remember_me";
const USER_EMAIL_KEY: &str = "user_email";
const USER_ID_KEY: &str = "user_id";

/// The remembered login. Credentials are only exposed when `remember_me` is set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserSession {
    pub email: Option<String>,
    pub user_id: Option<String>,
    pub remember_me: bool,
}

pub struct SessionStore {
    collection: Arc<dyn KeyValueCollection>,
    session: watch::Sender<UserSession>,
    writes: Mutex<()>,
}

impl SessionStore {
    pub fn open(store: &KeyValueStore) -> Result<Self> {
        let collection = store.collection(COLLECTION)?;
        let (session, _) = watch::channel(load(collection.as_ref())?);
        Ok(Self {
            collection,
            session,
            writes: Mutex::new(()),
        })
    }

    pub fn observe(&self) -> watch::Receiver<UserSession> {
        self.session.subscribe()
    }

    pub fn current(&self) -> UserSession {
        self.session.borrow().clone()
    }

    /// Stores the credentials when `remember_me` is set, otherwise forgets them.
    pub async fn save_session(&self, email: &str, user_id: &str, remember_me: bool) -> Result<()> {
        let mut edits = vec![remember_edit(remember_me)];
        if remember_me {
            edits.push(Edit::Put(USER_EMAIL_KEY.to_string(), email.as_bytes().to_vec()));
            edits.push(Edit::Put(USER_ID_KEY.to_string(), user_id.as_bytes().to_vec()));
        } else {
            edits.extend(forget_credentials());
        }
        self.write(edits)
    }

    pub async fn update_remember_me(&self, remember_me: bool) -> Result<()> {
        let mut edits = vec![remember_edit(remember_me)];
        if !remember_me {
            edits.extend(forget_credentials());
        }
        self.write(edits)
    }

    pub async fn clear_session(&self) -> Result<()> {
        let _guard = self.lock_writes();
        self.collection.clear()?;
        debug!("Session cleared");
        self.session.send_replace(load(self.collection.as_ref())?);
        Ok(())
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self, edits: Vec<Edit>) -> Result<()> {
        let _guard = self.lock_writes();
        self.collection.apply(edits)?;
        self.session.send_replace(load(self.collection.as_ref())?);
        Ok(())
    }
}

fn remember_edit(remember_me: bool) -> Edit {
    Edit::Put(REMEMBER_ME_KEY.to_string(), remember_me.to_string().into_bytes())
}

fn forget_credentials() -> [Edit; 2] {
    [
        Edit::Remove(USER_EMAIL_KEY.to_string()),
        Edit::Remove(USER_ID_KEY.to_string()),
    ]
}

fn read(collection: &dyn KeyValueCollection, key: &str) -> Result<Option<String>> {
    Ok(collection
        .get(key)?
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
}

fn load(collection: &dyn KeyValueCollection) -> Result<UserSession> {
    let remember_me = read(collection, REMEMBER_ME_KEY)?.is_some_and(|v| v == "true");
    if !remember_me {
        return Ok(UserSession::default());
    }
    Ok(UserSession {
        email: read(collection, USER_EMAIL_KEY)?,
        user_id: read(collection, USER_ID_KEY)?,
        remember_me,
    })
}

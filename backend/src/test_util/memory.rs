use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::db::users::{StoreError, UserStore};
use crate::models::user::User;

/// In-memory stand-in for the Mongo store, keyed by email like the real one.
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, User>>,
    ping_ok: AtomicBool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            ping_ok: AtomicBool::new(true),
        }
    }

    /// Make subsequent pings fail, as if the database went away.
    pub fn set_ping_ok(&self, ok: bool) {
        self.ping_ok.store(ok, Ordering::SeqCst);
    }

    pub async fn remove_by_email(&self, email: &str) {
        self.users.lock().await.remove(email);
    }

    pub async fn count(&self) -> usize {
        self.users.lock().await.len()
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn upsert_login(
        &self,
        email: &str,
        name: &str,
        picture_url: Option<&str>,
    ) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;
        let now = Utc::now();

        let user = users
            .entry(email.to_string())
            .and_modify(|u| {
                u.name = name.to_string();
                u.picture_url = picture_url.map(String::from);
                u.updated_at = now;
            })
            .or_insert_with(|| User {
                id: uuid::Uuid::new_v4().to_string(),
                email: email.to_string(),
                name: name.to_string(),
                picture_url: picture_url.map(String::from),
                created_at: now,
                updated_at: now,
            });

        Ok(user.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().await;
        Ok(users.values().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().await;
        Ok(users.get(email).cloned())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.ping_ok.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Database("ping failed".to_string()))
        }
    }
}

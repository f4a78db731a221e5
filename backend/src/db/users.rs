use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::doc;
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};

use crate::models::user::User;

/// Name of the users collection.
pub const USERS_COLLECTION: &str = "users";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("User upsert returned no document")]
    UpsertFailed,
}

impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Persistence operations needed by the auth flow.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Atomically insert-or-update a user keyed by email and return the
    /// resulting record. Insert assigns a fresh id and `created_at`; update
    /// keeps both and refreshes name, picture and `updated_at`.
    async fn upsert_login(
        &self,
        email: &str,
        name: &str,
        picture_url: Option<&str>,
    ) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Liveness probe against the backing store.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// MongoDB-backed user store.
pub struct MongoUserStore {
    db: Database,
}

impl MongoUserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn users(&self) -> Collection<User> {
        self.db.collection(USERS_COLLECTION)
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn upsert_login(
        &self,
        email: &str,
        name: &str,
        picture_url: Option<&str>,
    ) -> Result<User, StoreError> {
        let now = bson::DateTime::from_chrono(Utc::now());

        // One conditional write; the unique index on email collapses
        // concurrent first logins into a single insert.
        let update = doc! {
            "$set": {
                "email": email,
                "name": name,
                "picture_url": picture_url,
                "updated_at": now,
            },
            "$setOnInsert": {
                "id": uuid::Uuid::new_v4().to_string(),
                "created_at": now,
            },
        };

        let user = self
            .users()
            .find_one_and_update(doc! { "email": email }, update)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?;

        user.ok_or(StoreError::UpsertFailed)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users().find_one(doc! { "id": id }).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users().find_one(doc! { "email": email }).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

pub mod users;

use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Database, IndexModel};

use crate::config::MongoConfig;
use crate::db::users::USERS_COLLECTION;
use crate::models::user::User;

/// Connect to MongoDB, verify liveness and create the unique index the
/// upsert-by-email flow relies on.
///
/// The returned handles are passed down explicitly; `main` owns the client
/// and shuts it down when the server exits.
pub async fn connect(config: &MongoConfig) -> Result<(Client, Database), mongodb::error::Error> {
    let mut options = ClientOptions::parse(&config.uri).await?;
    options.server_selection_timeout = Some(Duration::from_secs(5));

    let client = Client::with_options(options)?;
    let db = client.database(&config.db_name);

    db.run_command(doc! { "ping": 1 }).await?;

    let email_index = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    db.collection::<User>(USERS_COLLECTION)
        .create_index(email_index)
        .await?;

    tracing::info!("Connected to MongoDB database {}", config.db_name);

    Ok((client, db))
}

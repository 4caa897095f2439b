pub mod images;
#[cfg(test)]
pub mod memory;
pub mod store;
pub mod users;

pub use images::MongoImageStore;
pub use store::*;
pub use users::MongoUserStore;

use crate::utils::AppError;
use mongodb::{Client, Collection, Database};
use std::time::Duration;
use tokio::sync::OnceCell;

pub const USERS: &str = "users";
pub const IMAGES: &str = "images";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, AppError> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Pool dimensionado para muitas invocações concorrentes
        client_options.max_pool_size = Some(50);
        client_options.min_pool_size = Some(10);
        client_options.max_idle_time = Some(Duration::from_secs(300));

        client_options.connect_timeout = Some(Duration::from_secs(60));
        client_options.server_selection_timeout = Some(Duration::from_secs(60));
        client_options.retry_writes = Some(true);
        client_options.retry_reads = Some(true);
        client_options.app_name = Some("imagenko-service".to_string());

        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);

        // Test connection
        db.run_command(mongodb::bson::doc! { "ping": 1 }).await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes the repositories rely on
    async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let users = self.collection::<mongodb::bson::Document>(USERS);
        for field in ["clerkId", "email", "username"] {
            let index = IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();

            match users.create_index(index).await {
                Ok(_) => log::info!("   ✅ Index created: users({}) unique", field),
                Err(e) => log::warn!("   ⚠️  Could not create users({}) index: {}", field, e),
            }
        }

        let images = self.collection::<mongodb::bson::Document>(IMAGES);
        for keys in [
            doc! { "author": 1 },
            doc! { "publicId": 1 },
            doc! { "updatedAt": -1 },
        ] {
            let label = keys.keys().cloned().collect::<Vec<_>>().join(", ");
            let index = IndexModel::builder().keys(keys).build();

            match images.create_index(index).await {
                Ok(_) => log::info!("   ✅ Index created: images({})", label),
                Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }
}

/// Conexão única e preguiçosa com o MongoDB.
///
/// The first `get` establishes the connection; callers arriving while it
/// is in flight await the same initialization instead of opening their
/// own. A failed attempt is not cached.
pub struct DatabaseConnector {
    uri: Option<String>,
    db_name: String,
    connection: OnceCell<MongoDB>,
}

impl DatabaseConnector {
    pub fn new(uri: Option<String>, db_name: impl Into<String>) -> Self {
        Self {
            uri,
            db_name: db_name.into(),
            connection: OnceCell::new(),
        }
    }

    pub async fn get(&self) -> Result<&MongoDB, AppError> {
        if let Some(db) = self.connection.get() {
            return Ok(db);
        }

        let uri = self.uri.as_deref().ok_or_else(|| {
            AppError::Configuration("Missing MONGODB_URL environment variable".to_string())
        })?;

        self.connection
            .get_or_try_init(|| async {
                log::info!("📊 Connecting to MongoDB database {}", self.db_name);
                match MongoDB::connect(uri, &self.db_name).await {
                    Ok(db) => {
                        log::info!("✅ Successfully connected to MongoDB");
                        Ok(db)
                    }
                    Err(e) => {
                        log::error!("❌ MongoDB connection error: {}", e);
                        Err(e)
                    }
                }
            })
            .await
    }

    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_missing_url_is_configuration_error() {
        let connector = DatabaseConnector::new(None, "imagenko_test");
        let result = connector.get().await;
        assert!(matches!(result, Err(AppError::Configuration(_))));
        assert!(!connector.is_connected());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_concurrent_get_shares_one_connection() {
        dotenv::dotenv().ok();
        let uri = std::env::var("MONGODB_URL").ok();
        let connector = Arc::new(DatabaseConnector::new(uri, "imagenko_test"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let connector = connector.clone();
                tokio::spawn(async move {
                    connector.get().await.map(|db| db as *const MongoDB as usize)
                })
            })
            .collect();

        let mut addresses = Vec::new();
        for handle in handles {
            addresses.push(handle.await.unwrap().unwrap());
        }
        addresses.dedup();
        assert_eq!(addresses.len(), 1);
    }
}

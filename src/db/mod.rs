use std::time::Duration;

use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};

use crate::{config::Config, errors::AppResult};

const APP_NAME: &str = "popquiz-server";
const SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the quiz database; cheap to clone, shares the client's pool.
#[derive(Clone)]
pub struct Database {
    client: Client,
    db_name: String,
}

impl Database {
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let mut options = ClientOptions::parse(&config.mongo_conn_string).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
        options.max_pool_size = Some(config.mongo_max_pool_size.max(1));
        options.min_pool_size = Some(config.mongo_max_pool_size.min(2));
        options.connect_timeout = Some(SELECTION_TIMEOUT);
        options.server_selection_timeout = Some(SELECTION_TIMEOUT);

        let database = Self {
            client: Client::with_options(options)?,
            db_name: config.mongo_db_name.clone(),
        };
        database.ping().await?;

        log::info!(
            "Connected to MongoDB database '{}' (pool up to {})",
            database.db_name,
            config.mongo_max_pool_size
        );
        Ok(database)
    }

    async fn ping(&self) -> AppResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    pub fn get_collection<T>(&self, collection_name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.database().collection(collection_name)
    }

    pub fn database(&self) -> mongodb::Database {
        self.client.database(&self.db_name)
    }

    /// Readiness check: a round trip to the server.
    pub async fn health_check(&self) -> AppResult<()> {
        self.ping().await.map_err(|e| {
            log::warn!("MongoDB health check failed: {}", e);
            e
        })
    }
}

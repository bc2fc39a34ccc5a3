pub mod mock;
pub mod seed;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::{AppConfig, Backend};
use crate::errors::AppError;

pub use mock::{MockData, MockStore};

/// Where the board's tables live. Cloning is cheap for both variants.
#[derive(Clone)]
pub enum Store {
    Postgres(PgPool),
    Mock(MockStore),
}

impl Store {
    /// An empty in-memory store.
    pub fn mock() -> Self {
        Store::Mock(MockStore::default())
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Postgres(_) => "postgres",
            Store::Mock(_) => "mock",
        }
    }
}

pub async fn init_pool(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// Open the configured backend, running migrations for Postgres.
pub async fn connect(config: &AppConfig) -> Result<Store, AppError> {
    match config.backend {
        Backend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| AppError::Validation("DATABASE_URL is required for the postgres backend".into()))?;
            let pool = init_pool(url).await?;
            run_migrations(&pool).await?;
            Ok(Store::Postgres(pool))
        }
        Backend::Mock => {
            log::warn!("Using the in-memory mock store; changes are lost on restart");
            Ok(Store::mock())
        }
    }
}

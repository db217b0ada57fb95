//! PostgreSQL price store.
//!
//! Connections come from a `deadpool-postgres` pool shared by every request.
//! An import checks one connection out, runs its inserts and the totals
//! query inside a single transaction, and commits. If anything fails the
//! transaction is dropped without committing, which rolls it back.

use async_trait::async_trait;
use deadpool_postgres::{Config, Pool, PoolConfig, Runtime};
use rust_decimal::Decimal;
use tokio_postgres::NoTls;

use super::schema;
use super::PriceStore;
use crate::api::logs::log_success;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::models::{AggregateResult, CandidateRecord, PersistedRecord};

/// Translate settings into a pool configuration. Separate fields are passed
/// through untouched, so credentials never need URL escaping.
fn pool_config(config: &StoreConfig) -> Config {
    let mut pg = Config::new();
    match &config.url {
        Some(url) => pg.url = Some(url.clone()),
        None => {
            pg.host = Some(config.host.clone());
            pg.port = Some(config.port);
            pg.user = Some(config.user.clone());
            pg.password = Some(config.password.clone());
            pg.dbname = Some(config.dbname.clone());
        }
    }
    pg.pool = Some(PoolConfig::new(config.pool_size));
    pg
}

/// Price store backed by PostgreSQL.
#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    /// Build the connection pool. No connection is opened until first use.
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let pool = pool_config(config)
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StoreError::Connection(format!("cannot create pool: {}", e)))?;

        Ok(Self { pool })
    }

    /// Build the pool, check the database answers, and create the table if
    /// it does not exist yet.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let store = Self::new(config)?;
        store.ensure_schema().await?;
        log_success(format!("Database ready at {}", config.masked_url()));
        Ok(store)
    }

    /// Create the `prices` table if absent.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let client = self.pool.get().await?;
        client.batch_execute(&schema::create_table_sql()).await?;
        Ok(())
    }
}

#[async_trait]
impl PriceStore for PostgresStore {
    async fn import_batch(&self, candidates: &[CandidateRecord]) -> StoreResult<AggregateResult> {
        let mut client = self.pool.get().await?;
        let client: &mut tokio_postgres::Client = &mut client;
        let transaction = client.transaction().await?;

        let insert = transaction.prepare(&schema::insert_sql()).await?;
        for candidate in candidates {
            transaction
                .execute(
                    &insert,
                    &[
                        &candidate.name,
                        &candidate.category,
                        &candidate.price,
                        &candidate.create_date,
                    ],
                )
                .await?;
        }

        let row = transaction.query_one(schema::aggregate_sql().as_str(), &[]).await?;
        let totals = AggregateResult {
            total_items: row.try_get::<_, i64>(0)?,
            total_categories: row.try_get::<_, i64>(1)?,
            total_price: row.try_get::<_, Decimal>(2)?,
        };

        transaction
            .commit()
            .await
            .map_err(|e| StoreError::Commit(e.to_string()))?;

        Ok(totals)
    }

    async fn fetch_all(&self) -> StoreResult<Vec<PersistedRecord>> {
        let client = self.pool.get().await?;
        let rows = client.query(schema::select_all_sql().as_str(), &[]).await?;

        rows.iter()
            .map(|row| -> StoreResult<PersistedRecord> {
                Ok(PersistedRecord {
                    id: row.try_get(0)?,
                    name: row.try_get(1)?,
                    category: row.try_get(2)?,
                    price: row.try_get(3)?,
                    create_date: row.try_get(4)?,
                })
            })
            .collect()
    }
}

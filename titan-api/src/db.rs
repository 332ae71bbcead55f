//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, and [`PgStore`],
//! the production implementation of the storage traits.
//!
//! A [`PgTx`] owns one pooled connection for its whole life and drives the
//! transaction with explicit `BEGIN` / `COMMIT` / `ROLLBACK`. Row locks are
//! plain `SELECT ... FOR UPDATE`, and uniqueness is enforced by the schema's
//! named constraints, which are mapped back to the keys in
//! [`titan_storage::constraints`].

use async_trait::async_trait;
use deadpool_postgres::{
    Config, ManagerConfig, Object, Pool, PoolConfig, PoolError, RecyclingMethod, Runtime,
};
use std::time::Duration;
use titan_core::{
    CardId, CardInstance, CardStatus, CardTemplate, CardVersion, ConfigError, EntityIdType,
    EnumParseError, OracleProvider, PrincipalId, ScanEvent, ScanEventId, StorageError, TemplateId,
    TitanError, TitanResult, AthleteId,
};
use titan_storage::{constraints, CardStore, CardTx, InstanceUpdate};
use tokio_postgres::error::SqlState;
use tokio_postgres::types::FromSql;
use tokio_postgres::{NoTls, Row};

/// Schema applied by [`PgStore::migrate`].
const SCHEMA: &str = include_str!("../migrations/0001_init.sql");

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Clone)]
pub struct DbConfig {
    /// Full connection URL; overrides the discrete fields when set
    pub url: Option<String>,
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// How long to wait for a pooled connection
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            dbname: "titan".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DATABASE_URL`: Connection URL, wins over everything below
    /// - `TITAN_DB_HOST`, `TITAN_DB_PORT`, `TITAN_DB_NAME`, `TITAN_DB_USER`,
    ///   `TITAN_DB_PASSWORD`: Discrete connection settings
    /// - `TITAN_DB_POOL_SIZE`: Maximum pool size (default: 16)
    /// - `TITAN_DB_TIMEOUT`: Seconds to wait for a connection (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let url = get("DATABASE_URL")
            .map(|raw| normalize_database_url(&raw))
            .transpose()?;

        Ok(Self {
            url,
            host: get("TITAN_DB_HOST").unwrap_or(defaults.host),
            port: parse_or("TITAN_DB_PORT", get("TITAN_DB_PORT"), defaults.port)?,
            dbname: get("TITAN_DB_NAME").unwrap_or(defaults.dbname),
            user: get("TITAN_DB_USER").unwrap_or(defaults.user),
            password: get("TITAN_DB_PASSWORD").unwrap_or(defaults.password),
            max_size: parse_or("TITAN_DB_POOL_SIZE", get("TITAN_DB_POOL_SIZE"), defaults.max_size)?,
            timeout: Duration::from_secs(parse_or(
                "TITAN_DB_TIMEOUT",
                get("TITAN_DB_TIMEOUT"),
                defaults.timeout.as_secs(),
            )?),
        })
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> TitanResult<Pool> {
        let mut cfg = Config::new();
        match &self.url {
            Some(url) => cfg.url = Some(url.clone()),
            None => {
                cfg.host = Some(self.host.clone());
                cfg.port = Some(self.port);
                cfg.dbname = Some(self.dbname.clone());
                cfg.user = Some(self.user.clone());
                cfg.password = Some(self.password.clone());
            }
        }

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        pool_cfg.timeouts.create = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls).map_err(|e| {
            StorageError::Backend {
                reason: format!("Failed to create pool: {}", e),
            }
            .into()
        })
    }
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("max_size", &self.max_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw.clone(),
            reason: "expected a non-negative integer".into(),
        }),
    }
}

/// Normalize a connection URL to the `postgresql://` scheme.
///
/// Accepts the short `postgres://` form and driver-qualified schemes such as
/// `postgresql+psycopg2://` left over from older deployments.
pub fn normalize_database_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        name: "DATABASE_URL".into(),
        value: "<redacted>".into(),
        reason: reason.into(),
    };

    let (scheme, rest) = raw
        .trim()
        .split_once("://")
        .ok_or_else(|| invalid("missing scheme"))?;
    let base = scheme.split('+').next().unwrap_or(scheme).to_lowercase();
    match base.as_str() {
        "postgres" | "postgresql" => Ok(format!("postgresql://{}", rest)),
        _ => Err(invalid("expected a postgres:// or postgresql:// URL")),
    }
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

/// Map a driver error onto the storage taxonomy.
fn storage_error(err: tokio_postgres::Error) -> TitanError {
    if let Some(db_error) = err.as_db_error() {
        let code = db_error.code();
        if code == &SqlState::UNIQUE_VIOLATION {
            let constraint = db_error.constraint().map(constraint_key).unwrap_or("unknown");
            tracing::debug!(constraint, "Unique violation");
            return StorageError::UniqueViolation {
                constraint: constraint.to_string(),
            }
            .into();
        }
        if code == &SqlState::T_R_SERIALIZATION_FAILURE
            || code == &SqlState::T_R_DEADLOCK_DETECTED
            || code == &SqlState::LOCK_NOT_AVAILABLE
        {
            tracing::warn!(code = code.code(), "Transaction aborted by the database");
            return StorageError::TransactionFailed {
                reason: db_error.message().to_string(),
            }
            .into();
        }
    }

    tracing::error!("Database error: {:?}", err);
    StorageError::Backend {
        reason: err.to_string(),
    }
    .into()
}

/// Waiting out the pool or hitting a closed pool is `Unavailable`; anything
/// else went wrong while creating a connection.
fn pool_error(err: PoolError) -> TitanError {
    tracing::error!("Connection pool error: {:?}", err);
    match err {
        PoolError::Timeout(_) | PoolError::Closed => StorageError::Unavailable {
            reason: format!("connection pool: {}", err),
        }
        .into(),
        other => StorageError::Backend {
            reason: format!("connection pool: {}", other),
        }
        .into(),
    }
}

/// Schema constraint name to the backend-neutral key.
fn constraint_key(name: &str) -> &str {
    match name {
        "uq_card_instances_tag_uid" => constraints::TAG_UID,
        "uq_card_instances_tag_external_id" => constraints::TAG_EXTERNAL_ID,
        "uq_card_instances_template_serial" => constraints::TEMPLATE_SERIAL,
        "uq_card_templates_sku_code" => constraints::SKU_CODE,
        "card_templates_pkey" | "card_instances_pkey" | "scan_events_pkey" => {
            constraints::PRIMARY_KEY
        }
        other => other,
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

const TEMPLATE_COLUMNS: &str = "template_id, athlete_id, version, external_group_id, sku_code, \
     edition_cap, minted_count, created_at";

const INSTANCE_COLUMNS: &str = "card_id, template_id, serial_no, tag_uid, tag_external_id, \
     last_ctr, status, owner_principal_id, created_at, updated_at";

const EVENT_COLUMNS: &str = "scan_id, card_id, tag_external_id, tag_uid, counter, authentic, \
     tamper_current, tamper_permanent, client_ip, user_agent, provider, created_at";

fn col<'a, T: FromSql<'a>>(row: &'a Row, name: &str) -> TitanResult<T> {
    row.try_get(name).map_err(storage_error)
}

fn decoded<T>(parsed: Result<T, EnumParseError>) -> TitanResult<T> {
    parsed.map_err(|e| {
        StorageError::Backend {
            reason: format!("corrupt row: {}", e),
        }
        .into()
    })
}

fn template_from_row(row: &Row) -> TitanResult<CardTemplate> {
    let version: String = col(row, "version")?;
    Ok(CardTemplate {
        template_id: TemplateId::new(col(row, "template_id")?),
        athlete_id: AthleteId::new(col(row, "athlete_id")?),
        version: decoded(CardVersion::from_db_str(&version))?,
        external_group_id: col(row, "external_group_id")?,
        sku_code: col(row, "sku_code")?,
        edition_cap: col(row, "edition_cap")?,
        minted_count: col(row, "minted_count")?,
        created_at: col(row, "created_at")?,
    })
}

fn instance_from_row(row: &Row) -> TitanResult<CardInstance> {
    let status: String = col(row, "status")?;
    let owner: Option<uuid::Uuid> = col(row, "owner_principal_id")?;
    Ok(CardInstance {
        card_id: CardId::new(col(row, "card_id")?),
        template_id: TemplateId::new(col(row, "template_id")?),
        serial_no: col(row, "serial_no")?,
        tag_uid: col(row, "tag_uid")?,
        tag_external_id: col(row, "tag_external_id")?,
        last_ctr: col(row, "last_ctr")?,
        status: decoded(CardStatus::from_db_str(&status))?,
        owner_principal_id: owner.map(PrincipalId::new),
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn event_from_row(row: &Row) -> TitanResult<ScanEvent> {
    let provider: String = col(row, "provider")?;
    Ok(ScanEvent {
        scan_id: ScanEventId::new(col(row, "scan_id")?),
        card_id: CardId::new(col(row, "card_id")?),
        tag_external_id: col(row, "tag_external_id")?,
        tag_uid: col(row, "tag_uid")?,
        counter: col(row, "counter")?,
        authentic: col(row, "authentic")?,
        tamper_current: col(row, "tamper_current")?,
        tamper_permanent: col(row, "tamper_permanent")?,
        client_ip: col(row, "client_ip")?,
        user_agent: col(row, "user_agent")?,
        provider: decoded(OracleProvider::from_db_str(&provider))?,
        created_at: col(row, "created_at")?,
    })
}

fn templates_from_rows(rows: &[Row]) -> TitanResult<Vec<CardTemplate>> {
    rows.iter().map(template_from_row).collect()
}

// ============================================================================
// POSTGRES STORE
// ============================================================================

/// PostgreSQL-backed [`CardStore`].
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> TitanResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Apply the schema. Every statement is idempotent.
    pub async fn migrate(&self) -> TitanResult<()> {
        let conn = self.conn().await?;
        conn.batch_execute(SCHEMA).await.map_err(storage_error)?;
        tracing::info!("Database schema is up to date");
        Ok(())
    }

    async fn conn(&self) -> TitanResult<Object> {
        self.pool.get().await.map_err(pool_error)
    }
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore")
            .field("pool_size", &self.pool_size())
            .finish()
    }
}

#[async_trait]
impl CardStore for PgStore {
    async fn begin(&self) -> TitanResult<Box<dyn CardTx>> {
        let conn = self.conn().await?;
        conn.batch_execute("BEGIN").await.map_err(storage_error)?;
        Ok(Box::new(PgTx { conn: Some(conn) }))
    }

    async fn ping(&self) -> TitanResult<()> {
        let conn = self.conn().await?;
        conn.query_one("SELECT 1", &[]).await.map_err(storage_error)?;
        Ok(())
    }

    async fn template_insert(&self, template: &CardTemplate) -> TitanResult<()> {
        template.validate()?;
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO card_templates (template_id, athlete_id, version, external_group_id, \
             sku_code, edition_cap, minted_count, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            &[
                &template.template_id.as_uuid(),
                &template.athlete_id.as_uuid(),
                &template.version.as_db_str(),
                &template.external_group_id,
                &template.sku_code,
                &template.edition_cap,
                &template.minted_count,
                &template.created_at,
            ],
        )
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn template_get(&self, id: TemplateId) -> TitanResult<Option<CardTemplate>> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {} FROM card_templates WHERE template_id = $1", TEMPLATE_COLUMNS);
        let row = conn
            .query_opt(&sql, &[&id.as_uuid()])
            .await
            .map_err(storage_error)?;
        row.as_ref().map(template_from_row).transpose()
    }

    async fn templates_list(&self) -> TitanResult<Vec<CardTemplate>> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {} FROM card_templates ORDER BY created_at, template_id",
            TEMPLATE_COLUMNS
        );
        let rows = conn.query(&sql, &[]).await.map_err(storage_error)?;
        templates_from_rows(&rows)
    }

    async fn instance_get(&self, id: CardId) -> TitanResult<Option<CardInstance>> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {} FROM card_instances WHERE card_id = $1", INSTANCE_COLUMNS);
        let row = conn
            .query_opt(&sql, &[&id.as_uuid()])
            .await
            .map_err(storage_error)?;
        row.as_ref().map(instance_from_row).transpose()
    }

    async fn instance_get_by_tag_uid(&self, tag_uid: &str) -> TitanResult<Option<CardInstance>> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {} FROM card_instances WHERE tag_uid = $1", INSTANCE_COLUMNS);
        let row = conn
            .query_opt(&sql, &[&tag_uid])
            .await
            .map_err(storage_error)?;
        row.as_ref().map(instance_from_row).transpose()
    }

    async fn instances_for_template(&self, id: TemplateId) -> TitanResult<Vec<CardInstance>> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {} FROM card_instances WHERE template_id = $1 ORDER BY serial_no",
            INSTANCE_COLUMNS
        );
        let rows = conn
            .query(&sql, &[&id.as_uuid()])
            .await
            .map_err(storage_error)?;
        rows.iter().map(instance_from_row).collect()
    }

    async fn instances_for_owner(&self, owner: PrincipalId) -> TitanResult<Vec<CardInstance>> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {} FROM card_instances WHERE owner_principal_id = $1 \
             ORDER BY created_at DESC, card_id DESC",
            INSTANCE_COLUMNS
        );
        let rows = conn
            .query(&sql, &[&owner.as_uuid()])
            .await
            .map_err(storage_error)?;
        rows.iter().map(instance_from_row).collect()
    }

    async fn scan_events_for_card(&self, id: CardId) -> TitanResult<Vec<ScanEvent>> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {} FROM scan_events WHERE card_id = $1 ORDER BY created_at, scan_id",
            EVENT_COLUMNS
        );
        let rows = conn
            .query(&sql, &[&id.as_uuid()])
            .await
            .map_err(storage_error)?;
        rows.iter().map(event_from_row).collect()
    }
}

// ============================================================================
// POSTGRES TRANSACTION
// ============================================================================

/// One open PostgreSQL transaction on a dedicated pooled connection.
pub struct PgTx {
    conn: Option<Object>,
}

impl PgTx {
    fn conn(&self) -> TitanResult<&Object> {
        self.conn.as_ref().ok_or_else(|| {
            StorageError::TransactionFailed {
                reason: "transaction already finished".into(),
            }
            .into()
        })
    }

    async fn finish(mut self: Box<Self>, statement: &str) -> TitanResult<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        match conn.batch_execute(statement).await {
            Ok(()) => Ok(()),
            Err(err) => {
                // Connection state is unknown; never hand it back to the pool.
                drop(Object::take(conn));
                Err(storage_error(err))
            }
        }
    }

    async fn fetch_templates(&self, sql: &str, key: &str) -> TitanResult<Vec<CardTemplate>> {
        let rows = self
            .conn()?
            .query(sql, &[&key])
            .await
            .map_err(storage_error)?;
        templates_from_rows(&rows)
    }
}

impl Drop for PgTx {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            // Closing the connection makes the server abort the open transaction.
            tracing::debug!("Transaction dropped without commit, discarding connection");
            drop(Object::take(conn));
        }
    }
}

#[async_trait]
impl CardTx for PgTx {
    async fn template_get(&mut self, id: TemplateId) -> TitanResult<Option<CardTemplate>> {
        let sql = format!("SELECT {} FROM card_templates WHERE template_id = $1", TEMPLATE_COLUMNS);
        let row = self
            .conn()?
            .query_opt(&sql, &[&id.as_uuid()])
            .await
            .map_err(storage_error)?;
        row.as_ref().map(template_from_row).transpose()
    }

    async fn templates_by_external_group(&mut self, group_id: &str) -> TitanResult<Vec<CardTemplate>> {
        let sql = format!(
            "SELECT {} FROM card_templates WHERE external_group_id = $1 ORDER BY created_at",
            TEMPLATE_COLUMNS
        );
        self.fetch_templates(&sql, group_id).await
    }

    async fn templates_by_sku(&mut self, sku_code: &str) -> TitanResult<Vec<CardTemplate>> {
        let sql = format!(
            "SELECT {} FROM card_templates WHERE sku_code = $1 ORDER BY created_at",
            TEMPLATE_COLUMNS
        );
        self.fetch_templates(&sql, sku_code).await
    }

    async fn template_lock(&mut self, id: TemplateId) -> TitanResult<Option<CardTemplate>> {
        let sql = format!(
            "SELECT {} FROM card_templates WHERE template_id = $1 FOR UPDATE",
            TEMPLATE_COLUMNS
        );
        let row = self
            .conn()?
            .query_opt(&sql, &[&id.as_uuid()])
            .await
            .map_err(storage_error)?;
        row.as_ref().map(template_from_row).transpose()
    }

    async fn template_set_minted_count(&mut self, id: TemplateId, minted_count: i64) -> TitanResult<()> {
        let updated = self
            .conn()?
            .execute(
                "UPDATE card_templates SET minted_count = $2 WHERE template_id = $1",
                &[&id.as_uuid(), &minted_count],
            )
            .await
            .map_err(storage_error)?;
        if updated == 0 {
            return Err(StorageError::NotFound {
                entity: "template",
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn instance_lock_by_tag_uid(&mut self, tag_uid: &str) -> TitanResult<Option<CardInstance>> {
        let sql = format!(
            "SELECT {} FROM card_instances WHERE tag_uid = $1 FOR UPDATE",
            INSTANCE_COLUMNS
        );
        let row = self
            .conn()?
            .query_opt(&sql, &[&tag_uid])
            .await
            .map_err(storage_error)?;
        row.as_ref().map(instance_from_row).transpose()
    }

    async fn instance_lock(&mut self, id: CardId) -> TitanResult<Option<CardInstance>> {
        let sql = format!(
            "SELECT {} FROM card_instances WHERE card_id = $1 FOR UPDATE",
            INSTANCE_COLUMNS
        );
        let row = self
            .conn()?
            .query_opt(&sql, &[&id.as_uuid()])
            .await
            .map_err(storage_error)?;
        row.as_ref().map(instance_from_row).transpose()
    }

    async fn instance_insert(&mut self, card: &CardInstance) -> TitanResult<()> {
        let owner = card.owner_principal_id.map(|p| p.as_uuid());
        self.conn()?
            .execute(
                "INSERT INTO card_instances (card_id, template_id, serial_no, tag_uid, \
                 tag_external_id, last_ctr, status, owner_principal_id, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
                &[
                    &card.card_id.as_uuid(),
                    &card.template_id.as_uuid(),
                    &card.serial_no,
                    &card.tag_uid,
                    &card.tag_external_id,
                    &card.last_ctr,
                    &card.status.as_db_str(),
                    &owner,
                    &card.created_at,
                    &card.updated_at,
                ],
            )
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn instance_update(&mut self, id: CardId, update: &InstanceUpdate) -> TitanResult<CardInstance> {
        let status = update.status.map(|s| s.as_db_str());
        let owner = update.owner_principal_id.map(|p| p.as_uuid());
        let sql = format!(
            "UPDATE card_instances SET \
             last_ctr = COALESCE($2, last_ctr), \
             status = COALESCE($3, status), \
             owner_principal_id = COALESCE($4, owner_principal_id), \
             updated_at = now() \
             WHERE card_id = $1 RETURNING {}",
            INSTANCE_COLUMNS
        );
        let row = self
            .conn()?
            .query_opt(&sql, &[&id.as_uuid(), &update.last_ctr, &status, &owner])
            .await
            .map_err(storage_error)?
            .ok_or_else(|| StorageError::NotFound {
                entity: "card",
                id: id.to_string(),
            })?;
        instance_from_row(&row)
    }

    async fn scan_event_insert(&mut self, event: &ScanEvent) -> TitanResult<()> {
        self.conn()?
            .execute(
                "INSERT INTO scan_events (scan_id, card_id, tag_external_id, tag_uid, counter, \
                 authentic, tamper_current, tamper_permanent, client_ip, user_agent, provider, \
                 created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
                &[
                    &event.scan_id.as_uuid(),
                    &event.card_id.as_uuid(),
                    &event.tag_external_id,
                    &event.tag_uid,
                    &event.counter,
                    &event.authentic,
                    &event.tamper_current,
                    &event.tamper_permanent,
                    &event.client_ip,
                    &event.user_agent,
                    &event.provider.as_db_str(),
                    &event.created_at,
                ],
            )
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> TitanResult<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(self: Box<Self>) -> TitanResult<()> {
        self.finish("ROLLBACK").await
    }
}

//! Application state for the clinic API

use anyhow::Result;
use booking_core::SlotPolicy;
use compliance_engine::ComplianceEngine;
use line_notify::LineClient;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub struct AppState {
    pub db: SqlitePool,
    pub engine: ComplianceEngine,
    pub slot_policy: SlotPolicy,
    pub line: Option<LineClient>,
    pub line_channel_secret: Option<String>,
}

impl AppState {
    pub async fn new() -> Result<Self> {
        let db_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:clinic.db?mode=rwc".into());

        tracing::info!("Connecting to database: {}", db_url);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        let slot_policy = match std::env::var("SLOT_DEFAULT_CAPACITY") {
            Ok(raw) => {
                let cap: u32 = raw.parse()?;
                SlotPolicy::DefaultCap(cap.max(1))
            }
            Err(_) => SlotPolicy::Unlimited,
        };

        // Missing LINE credentials disable notifications, not the server.
        let line = std::env::var("LINE_CHANNEL_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(LineClient::new);
        if line.is_none() {
            tracing::warn!("LINE_CHANNEL_ACCESS_TOKEN not set; notifications disabled");
        }
        let line_channel_secret = std::env::var("LINE_CHANNEL_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        Self::with_pool(pool, slot_policy, line, line_channel_secret).await
    }

    /// Build state over an existing pool. Tests use this with an in-memory
    /// database.
    pub async fn with_pool(
        pool: SqlitePool,
        slot_policy: SlotPolicy,
        line: Option<LineClient>,
        line_channel_secret: Option<String>,
    ) -> Result<Self> {
        Self::run_migrations(&pool).await?;
        Ok(Self {
            db: pool,
            engine: ComplianceEngine::new(),
            slot_policy,
            line,
            line_channel_secret,
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS compliance_keywords (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tenant_id INTEGER NOT NULL,
                keyword TEXT NOT NULL,
                severity TEXT NOT NULL,
                regulation_reference TEXT,
                description TEXT,
                created_at TEXT NOT NULL,
                UNIQUE(tenant_id, keyword)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS slot_limits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tenant_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                time_slot TEXT NOT NULL,
                max_capacity INTEGER NOT NULL,
                current_count INTEGER NOT NULL DEFAULT 0,
                UNIQUE(tenant_id, date, time_slot)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS appointments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tenant_id INTEGER NOT NULL,
                customer_name TEXT NOT NULL,
                customer_phone TEXT NOT NULL,
                line_user_id TEXT,
                date TEXT NOT NULL,
                time_slot TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                notes TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS approvals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tenant_id INTEGER NOT NULL,
                appointment_id INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                reviewed_by INTEGER,
                reviewed_at TEXT,
                reason TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reschedule_approvals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tenant_id INTEGER NOT NULL,
                appointment_id INTEGER NOT NULL,
                new_date TEXT NOT NULL,
                new_time TEXT NOT NULL,
                original_date TEXT NOT NULL,
                original_time TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                reviewed_by INTEGER,
                reviewed_at TEXT,
                reason TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        // Indexes for the hot lookups: pending queues and per-date slots.
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_approvals_pending
                ON approvals(tenant_id, status, created_at)
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_reschedules_pending
                ON reschedule_approvals(tenant_id, status, created_at)
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_appointments_slot
                ON appointments(tenant_id, date, time_slot)
            "#,
        )
        .execute(pool)
        .await?;

        tracing::info!("Migrations complete");
        Ok(())
    }
}

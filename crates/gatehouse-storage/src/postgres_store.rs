// Copyright 2024 Gatehouse Project
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Postgres-based implementations of `TemplateStore` and `AccessLogger` using SQLx and PgPool.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use gatehouse_core::errors::GatehouseError;
use gatehouse_core::event::{AccessEvent, AccessStatus};
use gatehouse_core::identity::{ContactDetails, EnrolledIdentity};
use gatehouse_core::store::{AccessLogger, TemplateStore};
use gatehouse_core::types::{IdentityId, TimeWindow};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

/// Creates the `enrolled_identities` and `access_events` tables if missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), GatehouseError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS enrolled_identities (
            id BIGSERIAL PRIMARY KEY,
            identity_id TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            encoding DOUBLE PRECISION[] NOT NULL,
            allowed_start TEXT NOT NULL,
            allowed_end TEXT NOT NULL,
            email TEXT,
            contact_info TEXT,
            date_of_birth TEXT,
            photo_path TEXT,
            enrolled_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| storage_error("create enrolled_identities", e))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS access_events (
            id BIGSERIAL PRIMARY KEY,
            identity_id TEXT,
            occurred_at TIMESTAMPTZ NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('GRANTED', 'DENIED')),
            reason TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| storage_error("create access_events", e))?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS access_events_identity_idx ON access_events (identity_id)",
    )
    .execute(pool)
    .await
    .map_err(|e| storage_error("create access_events_identity_idx", e))?;

    tracing::info!("gatehouse schema ready");
    Ok(())
}

fn storage_error(operation: &str, err: sqlx::Error) -> GatehouseError {
    tracing::error!(operation, error = %err, "database operation failed");
    GatehouseError::StorageUnavailable(format!("DB {} error: {}", operation, err))
}

fn row_error(column: &str, err: sqlx::Error) -> GatehouseError {
    GatehouseError::StorageUnavailable(format!("DB row get error ({}): {}", column, err))
}

fn identity_from_row(row: &PgRow) -> Result<EnrolledIdentity, GatehouseError> {
    let identity_id: String = row
        .try_get("identity_id")
        .map_err(|e| row_error("identity_id", e))?;
    let allowed_start: String = row
        .try_get("allowed_start")
        .map_err(|e| row_error("allowed_start", e))?;
    let allowed_end: String = row
        .try_get("allowed_end")
        .map_err(|e| row_error("allowed_end", e))?;
    Ok(EnrolledIdentity {
        identity_id: IdentityId::from(identity_id),
        display_name: row
            .try_get("display_name")
            .map_err(|e| row_error("display_name", e))?,
        encoding: row
            .try_get::<Vec<f64>, _>("encoding")
            .map_err(|e| row_error("encoding", e))?,
        window: TimeWindow::parse(&allowed_start, &allowed_end)?,
        contact: ContactDetails {
            email: row.try_get("email").map_err(|e| row_error("email", e))?,
            contact_info: row
                .try_get("contact_info")
                .map_err(|e| row_error("contact_info", e))?,
            date_of_birth: row
                .try_get("date_of_birth")
                .map_err(|e| row_error("date_of_birth", e))?,
            photo_path: row
                .try_get("photo_path")
                .map_err(|e| row_error("photo_path", e))?,
        },
        enrolled_at: row
            .try_get("enrolled_at")
            .map_err(|e| row_error("enrolled_at", e))?,
    })
}

fn event_from_row(row: &PgRow) -> Result<AccessEvent, GatehouseError> {
    let status: String = row.try_get("status").map_err(|e| row_error("status", e))?;
    Ok(AccessEvent {
        event_id: row.try_get("id").map_err(|e| row_error("id", e))?,
        identity_id: row
            .try_get::<Option<String>, _>("identity_id")
            .map_err(|e| row_error("identity_id", e))?
            .map(IdentityId::from),
        timestamp: row
            .try_get("occurred_at")
            .map_err(|e| row_error("occurred_at", e))?,
        status: status.parse()?,
        reason: row.try_get("reason").map_err(|e| row_error("reason", e))?,
    })
}

/// Postgres-backed TemplateStore.
///
/// Insertion order is the `BIGSERIAL` primary key; every read orders by it.
#[derive(Clone, Debug)]
pub struct PostgresTemplateStore {
    /// Connection pool to Postgres.
    pool: PgPool,
}

impl PostgresTemplateStore {
    /// Creates a new PostgresTemplateStore with the given PgPool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateStore for PostgresTemplateStore {
    async fn enroll(&self, identity: EnrolledIdentity) -> Result<(), GatehouseError> {
        let result = sqlx::query(
            r#"
            INSERT INTO enrolled_identities (identity_id, display_name, encoding, allowed_start, allowed_end, email, contact_info, date_of_birth, photo_path, enrolled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(identity.identity_id.as_str())
        .bind(&identity.display_name)
        .bind(identity.encoding.as_slice())
        .bind(identity.window.start_str())
        .bind(identity.window.end_str())
        .bind(identity.contact.email.as_deref())
        .bind(identity.contact.contact_info.as_deref())
        .bind(identity.contact.date_of_birth.as_deref())
        .bind(identity.contact.photo_path.as_deref())
        .bind(identity.enrolled_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(GatehouseError::DuplicateIdentity(identity.identity_id))
            }
            Err(e) => Err(storage_error("enroll", e)),
        }
    }

    async fn list_all(&self) -> Result<Vec<EnrolledIdentity>, GatehouseError> {
        let rows = sqlx::query(
            r#"
            SELECT identity_id, display_name, encoding, allowed_start, allowed_end, email, contact_info, date_of_birth, photo_path, enrolled_at FROM enrolled_identities ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("list_all", e))?;
        rows.iter().map(identity_from_row).collect()
    }

    async fn get(
        &self,
        identity_id: &IdentityId,
    ) -> Result<Option<EnrolledIdentity>, GatehouseError> {
        let row_opt = sqlx::query(
            r#"
            SELECT identity_id, display_name, encoding, allowed_start, allowed_end, email, contact_info, date_of_birth, photo_path, enrolled_at FROM enrolled_identities WHERE identity_id = $1
            "#,
        )
        .bind(identity_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("get", e))?;
        row_opt.as_ref().map(identity_from_row).transpose()
    }

    async fn count(&self) -> Result<usize, GatehouseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enrolled_identities")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("count", e))?;
        Ok(count as usize)
    }
}

/// Postgres-backed AccessLogger. Insert-only: this type issues no UPDATE or DELETE.
#[derive(Clone, Debug)]
pub struct PostgresAccessLogger {
    pool: PgPool,
}

impl PostgresAccessLogger {
    /// Creates a new PostgresAccessLogger with the given PgPool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessLogger for PostgresAccessLogger {
    async fn record(
        &self,
        identity_id: Option<IdentityId>,
        status: AccessStatus,
        reason: &str,
    ) -> Result<AccessEvent, GatehouseError> {
        let timestamp: DateTime<Utc> = Utc::now().trunc_subsecs(6);
        let event_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO access_events (identity_id, occurred_at, status, reason)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(identity_id.as_ref().map(IdentityId::as_str))
        .bind(timestamp)
        .bind(status.as_str())
        .bind(reason)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("record", e))?;

        Ok(AccessEvent {
            event_id,
            identity_id,
            timestamp,
            status,
            reason: reason.to_string(),
        })
    }

    async fn list_events(&self, limit: usize) -> Result<Vec<AccessEvent>, GatehouseError> {
        let rows = sqlx::query(
            r#"
            SELECT id, identity_id, occurred_at, status, reason FROM access_events ORDER BY id DESC LIMIT $1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("list_events", e))?;
        rows.iter().map(event_from_row).collect()
    }

    async fn events_for(
        &self,
        identity_id: &IdentityId,
    ) -> Result<Vec<AccessEvent>, GatehouseError> {
        let rows = sqlx::query(
            r#"
            SELECT id, identity_id, occurred_at, status, reason FROM access_events WHERE identity_id = $1 ORDER BY id DESC
            "#,
        )
        .bind(identity_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("events_for", e))?;
        rows.iter().map(event_from_row).collect()
    }
}

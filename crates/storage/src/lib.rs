use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};

use shared::domain::{OrderId, OrderState, PaymentState, ProposalId};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredProposal {
    pub id: ProposalId,
    pub valentine_name: String,
    pub custom_message: String,
    pub character_choice: String,
    pub created_at: DateTime<Utc>,
    pub accepted: Option<bool>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub paid: bool,
    pub payment_state: PaymentState,
}

#[derive(Debug, Clone)]
pub struct StoredOrder {
    pub order_id: OrderId,
    pub proposal_id: ProposalId,
    pub amount_minor: i64,
    pub currency: String,
    pub state: OrderState,
    pub created_at: DateTime<Utc>,
    pub payment_ref: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct StoredPricing {
    pub amount_minor: i64,
    pub currency: String,
    pub display_price: String,
    pub updated_at: Option<DateTime<Utc>>,
}

const PRICING_KEY: &str = "pricing";

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn insert_proposal(&self, proposal: &StoredProposal) -> Result<()> {
        sqlx::query(
            "INSERT INTO proposals
                 (id, valentine_name, custom_message, character_choice,
                  created_at, accepted, accepted_at, paid, payment_state)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&proposal.id.0)
        .bind(&proposal.valentine_name)
        .bind(&proposal.custom_message)
        .bind(&proposal.character_choice)
        .bind(proposal.created_at)
        .bind(proposal.accepted)
        .bind(proposal.accepted_at)
        .bind(proposal.paid)
        .bind(payment_state_text(proposal.payment_state))
        .execute(&self.pool)
        .await
        .context("failed to insert proposal")?;
        Ok(())
    }

    pub async fn load_proposal(&self, id: &ProposalId) -> Result<Option<StoredProposal>> {
        let row = sqlx::query(
            "SELECT id, valentine_name, custom_message, character_choice,
                    created_at, accepted, accepted_at, paid, payment_state
             FROM proposals WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(proposal_from_row))
    }

    pub async fn list_proposals(&self, limit: u32) -> Result<Vec<StoredProposal>> {
        let rows = sqlx::query(
            "SELECT id, valentine_name, custom_message, character_choice,
                    created_at, accepted, accepted_at, paid, payment_state
             FROM proposals ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(proposal_from_row).collect())
    }

    /// Stores the recipient's answer. `accepted_at` is stamped only for an
    /// affirmative answer. Returns false when the proposal does not exist.
    pub async fn record_answer(
        &self,
        id: &ProposalId,
        accepted: bool,
        answered_at: DateTime<Utc>,
    ) -> Result<bool> {
        let accepted_at = accepted.then_some(answered_at);
        let result = sqlx::query(
            "UPDATE proposals SET accepted = ?, accepted_at = ? WHERE id = ?",
        )
        .bind(accepted)
        .bind(accepted_at)
        .bind(&id.0)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_proposal_paid(&self, id: &ProposalId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE proposals SET paid = 1, payment_state = 'completed' WHERE id = ?",
        )
        .bind(&id.0)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_order(&self, order: &StoredOrder) -> Result<()> {
        sqlx::query(
            "INSERT INTO payment_orders
                 (order_id, proposal_id, amount_minor, currency, state,
                  created_at, payment_ref, paid_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.order_id.0)
        .bind(&order.proposal_id.0)
        .bind(order.amount_minor)
        .bind(&order.currency)
        .bind(order_state_text(order.state))
        .bind(order.created_at)
        .bind(&order.payment_ref)
        .bind(order.paid_at)
        .execute(&self.pool)
        .await
        .context("failed to insert payment order")?;
        Ok(())
    }

    pub async fn load_order(&self, order_id: &OrderId) -> Result<Option<StoredOrder>> {
        let row = sqlx::query(
            "SELECT order_id, proposal_id, amount_minor, currency, state,
                    created_at, payment_ref, paid_at
             FROM payment_orders WHERE order_id = ?",
        )
        .bind(&order_id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(order_from_row))
    }

    pub async fn mark_order_paid(
        &self,
        order_id: &OrderId,
        payment_ref: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE payment_orders SET state = 'paid', payment_ref = ?, paid_at = ?
             WHERE order_id = ?",
        )
        .bind(payment_ref)
        .bind(paid_at)
        .bind(&order_id.0)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn pricing(&self) -> Result<Option<StoredPricing>> {
        let row = sqlx::query(
            "SELECT amount_minor, currency, display_price, updated_at
             FROM pricing_settings WHERE key = ?",
        )
        .bind(PRICING_KEY)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| StoredPricing {
            amount_minor: r.get::<i64, _>(0),
            currency: r.get::<String, _>(1),
            display_price: r.get::<String, _>(2),
            updated_at: r.get::<Option<DateTime<Utc>>, _>(3),
        }))
    }

    pub async fn upsert_pricing(
        &self,
        amount_minor: i64,
        currency: &str,
        display_price: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO pricing_settings (key, amount_minor, currency, display_price, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                 amount_minor = excluded.amount_minor,
                 currency = excluded.currency,
                 display_price = excluded.display_price,
                 updated_at = excluded.updated_at",
        )
        .bind(PRICING_KEY)
        .bind(amount_minor)
        .bind(currency)
        .bind(display_price)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .context("failed to upsert pricing settings")?;
        Ok(())
    }
}

fn proposal_from_row(r: sqlx::sqlite::SqliteRow) -> StoredProposal {
    StoredProposal {
        id: ProposalId(r.get::<String, _>(0)),
        valentine_name: r.get::<String, _>(1),
        custom_message: r.get::<String, _>(2),
        character_choice: r.get::<String, _>(3),
        created_at: r.get::<DateTime<Utc>, _>(4),
        accepted: r.get::<Option<bool>, _>(5),
        accepted_at: r.get::<Option<DateTime<Utc>>, _>(6),
        paid: r.get::<bool, _>(7),
        payment_state: payment_state_from_text(&r.get::<String, _>(8)),
    }
}

fn order_from_row(r: sqlx::sqlite::SqliteRow) -> StoredOrder {
    StoredOrder {
        order_id: OrderId(r.get::<String, _>(0)),
        proposal_id: ProposalId(r.get::<String, _>(1)),
        amount_minor: r.get::<i64, _>(2),
        currency: r.get::<String, _>(3),
        state: match r.get::<String, _>(4).as_str() {
            "paid" => OrderState::Paid,
            _ => OrderState::Created,
        },
        created_at: r.get::<DateTime<Utc>, _>(5),
        payment_ref: r.get::<Option<String>, _>(6),
        paid_at: r.get::<Option<DateTime<Utc>>, _>(7),
    }
}

fn payment_state_text(state: PaymentState) -> &'static str {
    match state {
        PaymentState::Pending => "pending",
        PaymentState::Completed => "completed",
    }
}

fn payment_state_from_text(text: &str) -> PaymentState {
    match text {
        "completed" => PaymentState::Completed,
        _ => PaymentState::Pending,
    }
}

fn order_state_text(state: OrderState) -> &'static str {
    match state {
        OrderState::Created => "created",
        OrderState::Paid => "paid",
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

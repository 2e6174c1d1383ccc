//! Claims repository implementation
//!
//! A claim is stored across three tables (`claims`, `claim_items`,
//! `invoices`) and is always read and written as a [`ClaimGraph`].

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DatabaseError;

const CLAIM_COLUMNS: &str = r#"
    claim_id, applicant_id, department, theme_id, theme_name, description,
    activity_date, location, leader, status, reviewer_note, total_amount,
    created_at, updated_at
"#;

/// Claim status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "claim_status", rename_all = "snake_case")]
pub enum ClaimStatus {
    Draft,
    Submitted,
    Packed,
    Rejected,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Draft => "draft",
            ClaimStatus::Submitted => "submitted",
            ClaimStatus::Packed => "packed",
            ClaimStatus::Rejected => "rejected",
        }
    }
}

/// Row in `claims`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimRow {
    pub claim_id: Uuid,
    pub applicant_id: Uuid,
    pub department: String,
    pub theme_id: Option<Uuid>,
    pub theme_name: String,
    pub description: String,
    pub activity_date: Option<NaiveDate>,
    pub location: String,
    pub leader: String,
    pub status: ClaimStatus,
    pub reviewer_note: String,
    /// Ignored on write; recomputed from the stored items
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row in `claim_items`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    pub item_id: Uuid,
    pub claim_id: Uuid,
    /// Order of the item within its claim
    pub position: i32,
    pub name: String,
    pub quantity: i64,
    pub unit: String,
    pub price: Decimal,
    pub amount: Decimal,
}

/// Row in `invoices`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceRow {
    pub invoice_id: Uuid,
    pub item_id: Uuid,
    pub stored_path: String,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A claim with all of its items and their invoices
#[derive(Debug, Clone)]
pub struct ClaimGraph {
    pub claim: ClaimRow,
    /// Ordered by position
    pub items: Vec<ItemRow>,
    /// Ordered by upload time
    pub invoices: Vec<InvoiceRow>,
}

/// Filter for [`ClaimsRepository::find`]
///
/// A row matches when it passes every set filter, or when its applicant is
/// `include_owned_by`.
#[derive(Debug, Clone, Default)]
pub struct ClaimFilter {
    pub applicant_id: Option<Uuid>,
    pub department: Option<String>,
    /// Empty means any status
    pub statuses: Vec<ClaimStatus>,
    pub include_owned_by: Option<Uuid>,
}

/// Repository for claims with their items and invoices
#[derive(Debug, Clone)]
pub struct ClaimsRepository {
    pool: PgPool,
}

impl ClaimsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads one claim graph
    pub async fn get(&self, claim_id: Uuid) -> Result<ClaimGraph, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let claim = sqlx::query_as::<_, ClaimRow>(&format!(
            "SELECT {CLAIM_COLUMNS} FROM claims WHERE claim_id = $1"
        ))
        .bind(claim_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Claim", claim_id))?;

        let mut graphs = attach_children(&mut *tx, vec![claim]).await?;
        tx.commit().await?;

        graphs
            .pop()
            .ok_or_else(|| DatabaseError::not_found("Claim", claim_id))
    }

    /// Loads every matching claim graph, newest first, from one snapshot
    pub async fn find(&self, filter: &ClaimFilter) -> Result<Vec<ClaimGraph>, DatabaseError> {
        let statuses: Vec<String> = filter
            .statuses
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let claims = sqlx::query_as::<_, ClaimRow>(&format!(
            r#"
            SELECT {CLAIM_COLUMNS}
            FROM claims
            WHERE (
                    ($1::uuid IS NULL OR applicant_id = $1)
                AND ($2::text IS NULL OR department = $2)
                AND (cardinality($3::text[]) = 0 OR status::text = ANY($3))
            )
            OR ($4::uuid IS NOT NULL AND applicant_id = $4)
            ORDER BY created_at DESC, claim_id
            "#
        ))
        .bind(filter.applicant_id)
        .bind(filter.department.as_deref())
        .bind(&statuses)
        .bind(filter.include_owned_by)
        .fetch_all(&mut *tx)
        .await?;

        debug!(count = claims.len(), "Loaded claim headers");

        let graphs = attach_children(&mut *tx, claims).await?;
        tx.commit().await?;
        Ok(graphs)
    }

    /// Returns the id of the claim owning an invoice
    pub async fn find_claim_id_by_invoice(&self, invoice_id: Uuid) -> Result<Uuid, DatabaseError> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT i.claim_id
            FROM invoices v
            JOIN claim_items i ON i.item_id = v.item_id
            WHERE v.invoice_id = $1
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Invoice", invoice_id))
    }

    /// Writes a claim graph in one transaction
    ///
    /// Items and invoices of the claim that are not in `graph` are deleted.
    ///
    /// # Arguments
    ///
    /// * `graph` - The claim row with all of its items and invoices
    /// * `expected` - When set, the stored row is locked and must still have
    ///   this status, otherwise `DatabaseError::StaleWrite`
    ///
    /// # Returns
    ///
    /// The total recomputed from the stored items
    pub async fn save(
        &self,
        graph: &ClaimGraph,
        expected: Option<ClaimStatus>,
    ) -> Result<Decimal, DatabaseError> {
        let claim = &graph.claim;
        let mut tx = self.pool.begin().await?;

        if let Some(expected) = expected {
            lock_with_status(&mut *tx, claim.claim_id, expected).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO claims (
                claim_id, applicant_id, department, theme_id, theme_name, description,
                activity_date, location, leader, status, reviewer_note,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (claim_id) DO UPDATE SET
                theme_id = EXCLUDED.theme_id,
                theme_name = EXCLUDED.theme_name,
                description = EXCLUDED.description,
                activity_date = EXCLUDED.activity_date,
                location = EXCLUDED.location,
                leader = EXCLUDED.leader,
                status = EXCLUDED.status,
                reviewer_note = EXCLUDED.reviewer_note,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(claim.claim_id)
        .bind(claim.applicant_id)
        .bind(&claim.department)
        .bind(claim.theme_id)
        .bind(&claim.theme_name)
        .bind(&claim.description)
        .bind(claim.activity_date)
        .bind(&claim.location)
        .bind(&claim.leader)
        .bind(claim.status)
        .bind(&claim.reviewer_note)
        .bind(claim.created_at)
        .bind(claim.updated_at)
        .execute(&mut *tx)
        .await?;

        let item_ids: Vec<Uuid> = graph.items.iter().map(|i| i.item_id).collect();
        sqlx::query("DELETE FROM claim_items WHERE claim_id = $1 AND NOT (item_id = ANY($2))")
            .bind(claim.claim_id)
            .bind(&item_ids)
            .execute(&mut *tx)
            .await?;

        for item in &graph.items {
            sqlx::query(
                r#"
                INSERT INTO claim_items (item_id, claim_id, position, name, quantity, unit, price, amount)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (item_id) DO UPDATE SET
                    position = EXCLUDED.position,
                    name = EXCLUDED.name,
                    quantity = EXCLUDED.quantity,
                    unit = EXCLUDED.unit,
                    price = EXCLUDED.price,
                    amount = EXCLUDED.amount
                "#,
            )
            .bind(item.item_id)
            .bind(claim.claim_id)
            .bind(item.position)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(&item.unit)
            .bind(item.price)
            .bind(item.amount)
            .execute(&mut *tx)
            .await?;
        }

        let invoice_ids: Vec<Uuid> = graph.invoices.iter().map(|v| v.invoice_id).collect();
        sqlx::query("DELETE FROM invoices WHERE item_id = ANY($1) AND NOT (invoice_id = ANY($2))")
            .bind(&item_ids)
            .bind(&invoice_ids)
            .execute(&mut *tx)
            .await?;

        for invoice in &graph.invoices {
            sqlx::query(
                r#"
                INSERT INTO invoices (invoice_id, item_id, stored_path, file_name, uploaded_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (invoice_id) DO UPDATE SET
                    item_id = EXCLUDED.item_id,
                    stored_path = EXCLUDED.stored_path,
                    file_name = EXCLUDED.file_name
                "#,
            )
            .bind(invoice.invoice_id)
            .bind(invoice.item_id)
            .bind(&invoice.stored_path)
            .bind(&invoice.file_name)
            .bind(invoice.uploaded_at)
            .execute(&mut *tx)
            .await?;
        }

        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE claims
            SET total_amount = COALESCE(
                (SELECT SUM(amount) FROM claim_items WHERE claim_id = $1), 0
            )
            WHERE claim_id = $1
            RETURNING total_amount
            "#,
        )
        .bind(claim.claim_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            claim_id = %claim.claim_id,
            items = graph.items.len(),
            invoices = graph.invoices.len(),
            %total,
            "Saved claim graph"
        );
        Ok(total)
    }

    /// Deletes a claim; items and invoices cascade
    ///
    /// With `expected`, the claim is only deleted while it has that status.
    pub async fn delete(
        &self,
        claim_id: Uuid,
        expected: Option<ClaimStatus>,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        if let Some(expected) = expected {
            lock_with_status(&mut *tx, claim_id, expected).await?;
        }

        let result = sqlx::query("DELETE FROM claims WHERE claim_id = $1")
            .bind(claim_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Claim", claim_id));
        }
        tx.commit().await?;
        Ok(())
    }
}

/// Locks a claim row and checks its status
async fn lock_with_status(
    conn: &mut PgConnection,
    claim_id: Uuid,
    expected: ClaimStatus,
) -> Result<(), DatabaseError> {
    let stored = sqlx::query_scalar::<_, ClaimStatus>(
        "SELECT status FROM claims WHERE claim_id = $1 FOR UPDATE",
    )
    .bind(claim_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Claim", claim_id))?;

    if stored != expected {
        return Err(DatabaseError::StaleWrite(format!(
            "claim {claim_id} is {}, expected {}",
            stored.as_str(),
            expected.as_str()
        )));
    }
    Ok(())
}

/// Loads items and invoices for a batch of claim headers
async fn attach_children(
    conn: &mut PgConnection,
    claims: Vec<ClaimRow>,
) -> Result<Vec<ClaimGraph>, DatabaseError> {
    if claims.is_empty() {
        return Ok(Vec::new());
    }
    let claim_ids: Vec<Uuid> = claims.iter().map(|c| c.claim_id).collect();

    let items = sqlx::query_as::<_, ItemRow>(
        r#"
        SELECT item_id, claim_id, position, name, quantity, unit, price, amount
        FROM claim_items
        WHERE claim_id = ANY($1)
        ORDER BY claim_id, position
        "#,
    )
    .bind(&claim_ids)
    .fetch_all(&mut *conn)
    .await?;

    let item_ids: Vec<Uuid> = items.iter().map(|i| i.item_id).collect();
    let invoices = sqlx::query_as::<_, InvoiceRow>(
        r#"
        SELECT invoice_id, item_id, stored_path, file_name, uploaded_at
        FROM invoices
        WHERE item_id = ANY($1)
        ORDER BY uploaded_at, invoice_id
        "#,
    )
    .bind(&item_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut invoices_by_item: HashMap<Uuid, Vec<InvoiceRow>> = HashMap::new();
    for invoice in invoices {
        invoices_by_item.entry(invoice.item_id).or_default().push(invoice);
    }

    let mut items_by_claim: HashMap<Uuid, Vec<ItemRow>> = HashMap::new();
    for item in items {
        items_by_claim.entry(item.claim_id).or_default().push(item);
    }

    Ok(claims
        .into_iter()
        .map(|claim| {
            let items = items_by_claim.remove(&claim.claim_id).unwrap_or_default();
            let invoices = items
                .iter()
                .flat_map(|i| invoices_by_item.remove(&i.item_id).unwrap_or_default())
                .collect();
            ClaimGraph { claim, items, invoices }
        })
        .collect())
}

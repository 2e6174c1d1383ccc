//! PostgreSQL claim store
//!
//! Implements [`ClaimStore`] on top of [`ClaimsRepository`] and
//! [`ThemesRepository`]. Claims cross the seam as whole graphs, so a save
//! replaces the stored items and invoices and recomputes the stored total in
//! the same transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    ActivityDate, ClaimId, DomainPort, HealthCheckResult, HealthCheckable, InvoiceId, ItemId,
    Money, PortError, ThemeId, UserId,
};
use domain_claims::{
    ActivityTheme, Claim, ClaimDetails, ClaimQuery, ClaimRecord, ClaimStatus, ClaimStore, Invoice,
    Item, ItemRecord,
};

use crate::error::DatabaseError;
use crate::repositories::claims::{
    ClaimFilter, ClaimGraph, ClaimRow, ClaimStatus as DbClaimStatus, ClaimsRepository,
    InvoiceRow, ItemRow,
};
use crate::repositories::themes::{ThemeRow, ThemesRepository};

/// PostgreSQL-backed [`ClaimStore`]
#[derive(Debug, Clone)]
pub struct PostgresClaimStore {
    claims: ClaimsRepository,
    themes: ThemesRepository,
    pool: PgPool,
}

impl PostgresClaimStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            claims: ClaimsRepository::new(pool.clone()),
            themes: ThemesRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresClaimStore {}

#[async_trait]
impl HealthCheckable for PostgresClaimStore {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-claim-store").await
    }
}

#[async_trait]
impl ClaimStore for PostgresClaimStore {
    #[instrument(skip(self), fields(claim_id = %id))]
    async fn get_claim(&self, id: ClaimId) -> Result<Claim, PortError> {
        debug!("Fetching claim");
        let graph = self.claims.get(id.into()).await?;
        Ok(graph_to_claim(graph)?)
    }

    #[instrument(skip(self))]
    async fn find_claims(&self, query: ClaimQuery) -> Result<Vec<Claim>, PortError> {
        let filter = ClaimFilter {
            applicant_id: query.applicant_id.map(Uuid::from),
            department: query.department,
            statuses: query.statuses.into_iter().map(domain_to_db_status).collect(),
            include_owned_by: query.include_owned_by.map(Uuid::from),
        };

        let graphs = self.claims.find(&filter).await?;
        debug!(count = graphs.len(), "Found claims");

        graphs
            .into_iter()
            .map(|g| graph_to_claim(g).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn find_claim_by_invoice(&self, invoice_id: InvoiceId) -> Result<Claim, PortError> {
        let claim_id = self.claims.find_claim_id_by_invoice(invoice_id.into()).await?;
        let graph = self.claims.get(claim_id).await?;
        Ok(graph_to_claim(graph)?)
    }

    #[instrument(skip(self, claim), fields(claim_id = %claim.id(), status = %claim.status()))]
    async fn save_claim(&self, claim: &Claim, expected: Option<ClaimStatus>) -> Result<(), PortError> {
        let graph = claim_to_graph(claim)?;
        let stored_total = self
            .claims
            .save(&graph, expected.map(domain_to_db_status))
            .await?;
        debug!(%stored_total, "Saved claim");
        Ok(())
    }

    #[instrument(skip(self), fields(claim_id = %id))]
    async fn delete_claim(&self, id: ClaimId, expected: Option<ClaimStatus>) -> Result<(), PortError> {
        self.claims
            .delete(id.into(), expected.map(domain_to_db_status))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_theme(
        &self,
        name: &str,
        department: &str,
    ) -> Result<Option<ActivityTheme>, PortError> {
        let row = self.themes.find_by_key(name, department).await?;
        row.map(row_to_theme).transpose().map_err(PortError::from)
    }

    #[instrument(skip(self, theme), fields(theme = %theme.name, department = %theme.department))]
    async fn insert_theme(&self, theme: &ActivityTheme) -> Result<(), PortError> {
        let row = ThemeRow {
            theme_id: theme.id.into(),
            name: theme.name.clone(),
            department: theme.department.clone(),
            activity_date: to_naive(&theme.activity_date)?,
            created_at: theme.created_at,
        };
        self.themes.insert(&row).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_themes(&self, department: &str) -> Result<Vec<ActivityTheme>, PortError> {
        let rows = self.themes.list_by_department(department).await?;
        rows.into_iter()
            .map(|r| row_to_theme(r).map_err(PortError::from))
            .collect()
    }
}

fn db_to_domain_status(status: DbClaimStatus) -> ClaimStatus {
    match status {
        DbClaimStatus::Draft => ClaimStatus::Draft,
        DbClaimStatus::Submitted => ClaimStatus::Submitted,
        DbClaimStatus::Packed => ClaimStatus::Packed,
        DbClaimStatus::Rejected => ClaimStatus::Rejected,
    }
}

fn domain_to_db_status(status: ClaimStatus) -> DbClaimStatus {
    match status {
        ClaimStatus::Draft => DbClaimStatus::Draft,
        ClaimStatus::Submitted => DbClaimStatus::Submitted,
        ClaimStatus::Packed => DbClaimStatus::Packed,
        ClaimStatus::Rejected => DbClaimStatus::Rejected,
    }
}

fn from_naive(date: NaiveDate) -> Result<ActivityDate, DatabaseError> {
    ActivityDate::new(date.year(), date.month(), date.day())
        .map_err(|e| DatabaseError::corrupt(e.to_string()))
}

fn to_naive(date: &ActivityDate) -> Result<NaiveDate, DatabaseError> {
    date.to_naive()
        .ok_or_else(|| DatabaseError::corrupt(format!("Unrepresentable date {}", date)))
}

fn row_to_theme(row: ThemeRow) -> Result<ActivityTheme, DatabaseError> {
    Ok(ActivityTheme {
        id: ThemeId::from(row.theme_id),
        name: row.name,
        department: row.department,
        activity_date: from_naive(row.activity_date)?,
        created_at: row.created_at,
    })
}

/// Rebuilds a claim aggregate; amounts and the total are recomputed
fn graph_to_claim(graph: ClaimGraph) -> Result<Claim, DatabaseError> {
    let ClaimGraph { claim: row, items, invoices } = graph;

    let mut invoices_by_item: HashMap<Uuid, Vec<Invoice>> = HashMap::new();
    for invoice in invoices {
        invoices_by_item
            .entry(invoice.item_id)
            .or_default()
            .push(Invoice {
                id: InvoiceId::from(invoice.invoice_id),
                item_id: ItemId::from(invoice.item_id),
                stored_path: invoice.stored_path,
                file_name: invoice.file_name,
                uploaded_at: invoice.uploaded_at,
            });
    }

    let items = items
        .into_iter()
        .map(|item| {
            let quantity = u32::try_from(item.quantity).map_err(|_| {
                DatabaseError::corrupt(format!("Item {} has quantity {}", item.item_id, item.quantity))
            })?;
            Item::restore(ItemRecord {
                id: ItemId::from(item.item_id),
                claim_id: ClaimId::from(item.claim_id),
                name: item.name,
                quantity,
                unit: item.unit,
                price: Money::new(item.price),
                invoices: invoices_by_item.remove(&item.item_id).unwrap_or_default(),
            })
            .map_err(|e| DatabaseError::corrupt(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let activity_date = row.activity_date.map(from_naive).transpose()?;

    Ok(Claim::restore(ClaimRecord {
        id: ClaimId::from(row.claim_id),
        applicant_id: UserId::from(row.applicant_id),
        department: row.department,
        theme_id: row.theme_id.map(ThemeId::from),
        details: ClaimDetails {
            theme: row.theme_name,
            description: row.description,
            activity_date,
            location: row.location,
            leader: row.leader,
        },
        status: db_to_domain_status(row.status),
        reviewer_note: row.reviewer_note,
        items,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn claim_to_graph(claim: &Claim) -> Result<ClaimGraph, DatabaseError> {
    let details = claim.details();
    let claim_id: Uuid = claim.id().into();

    let activity_date = details.activity_date.as_ref().map(to_naive).transpose()?;

    let row = ClaimRow {
        claim_id,
        applicant_id: claim.applicant_id().into(),
        department: claim.department().to_string(),
        theme_id: claim.theme_id().map(Uuid::from),
        theme_name: details.theme.clone(),
        description: details.description.clone(),
        activity_date,
        location: details.location.clone(),
        leader: details.leader.clone(),
        status: domain_to_db_status(claim.status()),
        reviewer_note: claim.reviewer_note().to_string(),
        total_amount: claim.total_amount().amount(),
        created_at: claim.created_at(),
        updated_at: claim.updated_at(),
    };

    let mut items = Vec::with_capacity(claim.items().len());
    let mut invoices = Vec::new();
    for (position, item) in claim.items().iter().enumerate() {
        let position = i32::try_from(position)
            .map_err(|_| DatabaseError::corrupt("Too many items on one claim"))?;
        items.push(ItemRow {
            item_id: item.id().into(),
            claim_id,
            position,
            name: item.name().to_string(),
            quantity: i64::from(item.quantity()),
            unit: item.unit().to_string(),
            price: item.price().amount(),
            amount: item.amount().amount(),
        });
        invoices.extend(item.invoices().iter().map(|invoice| InvoiceRow {
            invoice_id: invoice.id.into(),
            item_id: item.id().into(),
            stored_path: invoice.stored_path.clone(),
            file_name: invoice.file_name.clone(),
            uploaded_at: invoice.uploaded_at,
        }));
    }

    Ok(ClaimGraph { claim: row, items, invoices })
}

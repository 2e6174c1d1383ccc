//! Export service: snapshot, render, package

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::Arc;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use core_kernel::{Timezone, UserId};
use domain_claims::visibility::export_query;
use domain_claims::{Actor, BlobStore, ClaimStore, UserDirectory};

use crate::error::ExportError;
use crate::grouping::{group_by_theme, ExportClaim, ThemeGroup};
use crate::narrative::NarrativeDocument;
use crate::receipts::{
    path_segment, plan_receipts, skipped_report, unique_name, ReceiptEntry, SkippedReceipt,
};
use crate::summary::{render_summary, summary_rows};

pub const SKIPPED_REPORT_NAME: &str = "00_skipped_receipts.txt";

/// A finished export
#[derive(Debug, Clone)]
pub struct ExportArchive {
    /// Suggested download name
    pub file_name: String,
    /// The zip archive
    pub bytes: Vec<u8>,
    pub theme_count: usize,
    /// Rows in the summary sheet
    pub row_count: usize,
    /// Receipts copied into the archive
    pub receipt_count: usize,
    /// Receipts that could not be read
    pub skipped: Vec<SkippedReceipt>,
}

/// Packages a lead's department into one archive
#[derive(Clone)]
pub struct ExportService {
    store: Arc<dyn ClaimStore>,
    users: Arc<dyn UserDirectory>,
    blobs: Arc<dyn BlobStore>,
    timezone: Timezone,
}

impl ExportService {
    pub fn new(
        store: Arc<dyn ClaimStore>,
        users: Arc<dyn UserDirectory>,
        blobs: Arc<dyn BlobStore>,
        timezone: Timezone,
    ) -> Self {
        Self {
            store,
            users,
            blobs,
            timezone,
        }
    }

    /// Exports every submitted or packed claim of the actor's department
    ///
    /// # Arguments
    ///
    /// * `actor` - The requesting lead; the department comes from here
    ///
    /// # Returns
    ///
    /// The zip bytes, its download name and the receipts that were skipped
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` unless the actor is a lead
    /// - `NoData` when the department has nothing to export
    ///
    /// A receipt that cannot be read is skipped, logged, and listed in
    /// `00_skipped_receipts.txt`; the rest of the export continues.
    pub async fn export_department(&self, actor: &Actor) -> Result<ExportArchive, ExportError> {
        let query = export_query(actor).map_err(|e| ExportError::PermissionDenied(e.to_string()))?;
        let department = actor.department.clone();

        let claims = self.store.find_claims(query).await?;
        if claims.is_empty() {
            return Err(ExportError::NoData { department });
        }

        let mut applicant_ids: Vec<UserId> = Vec::new();
        for claim in &claims {
            if !applicant_ids.contains(&claim.applicant_id()) {
                applicant_ids.push(claim.applicant_id());
            }
        }
        let users: HashMap<UserId, _> = self
            .users
            .get_users(&applicant_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let preparer = match users.get(&actor.user_id) {
            Some(user) => user.display_name().to_string(),
            None => self.users.get_user(actor.user_id).await?.display_name().to_string(),
        };

        let entries: Vec<ExportClaim> = claims
            .into_iter()
            .map(|claim| {
                let applicant = users.get(&claim.applicant_id());
                ExportClaim::new(claim, applicant)
            })
            .collect();
        let groups = group_by_theme(entries);

        let mut receipts: Vec<ReceiptEntry> = Vec::new();
        for (index, group) in groups.iter().enumerate() {
            receipts.extend(plan_receipts(index + 1, group));
        }
        let (files, skipped) = self.read_receipts(receipts).await;

        let rows = summary_rows(&groups);
        let summary = render_summary(&rows)?;
        let bytes = self.package(&department, &preparer, &groups, summary, &files, &skipped)?;

        let stamp = self.timezone.to_local(Utc::now()).format("%Y%m%d%H%M");
        let archive = ExportArchive {
            file_name: format!("expense_export_{}_{}.zip", path_segment(&department), stamp),
            bytes,
            theme_count: groups.len(),
            row_count: rows.len(),
            receipt_count: files.len(),
            skipped,
        };

        info!(
            department = %department,
            actor = %actor.user_id,
            themes = archive.theme_count,
            rows = archive.row_count,
            receipts = archive.receipt_count,
            skipped = archive.skipped.len(),
            size = archive.bytes.len(),
            "Export packaged"
        );
        Ok(archive)
    }

    /// Reads every planned receipt, isolating failures per file
    async fn read_receipts(
        &self,
        receipts: Vec<ReceiptEntry>,
    ) -> (Vec<(String, Vec<u8>)>, Vec<SkippedReceipt>) {
        let mut files = Vec::with_capacity(receipts.len());
        let mut skipped = Vec::new();
        for receipt in receipts {
            match self.blobs.get(&receipt.stored_path).await {
                Ok(bytes) => files.push((receipt.archive_path, bytes)),
                Err(e) => {
                    warn!(
                        stored_path = %receipt.stored_path,
                        archive_path = %receipt.archive_path,
                        error = %e,
                        "Skipping unreadable receipt"
                    );
                    skipped.push(SkippedReceipt {
                        archive_path: receipt.archive_path,
                        stored_path: receipt.stored_path,
                        reason: e.to_string(),
                    });
                }
            }
        }
        (files, skipped)
    }

    fn package(
        &self,
        department: &str,
        preparer: &str,
        groups: &[ThemeGroup],
        summary: Vec<u8>,
        files: &[(String, Vec<u8>)],
        skipped: &[SkippedReceipt],
    ) -> Result<Vec<u8>, ExportError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        if !skipped.is_empty() {
            zip.start_file(SKIPPED_REPORT_NAME, options)?;
            zip.write_all(skipped_report(skipped).as_bytes())?;
        }

        zip.start_file(
            format!("01_expense_summary_{}.xlsx", path_segment(department)),
            options,
        )?;
        zip.write_all(&summary)?;

        let mut statement_names = HashSet::new();
        for group in groups {
            let statement = NarrativeDocument::for_group(group, preparer).render_docx()?;
            let name = unique_name(
                &format!("02_activity_statement_{}.docx", path_segment(&group.name)),
                &mut statement_names,
            );
            zip.start_file(name, options)?;
            zip.write_all(&statement)?;
        }

        for (path, bytes) in files {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(bytes)?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

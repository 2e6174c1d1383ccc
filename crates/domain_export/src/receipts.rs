//! Receipt folder layout
//!
//! `receipts/{theme-index}-{theme}/{theme-index}.{item-index}-{item}/{file}`
//!
//! `theme-index` counts themes from 1 in export order. `item-index` counts
//! the items of a theme from 1 and keeps counting across its claims.

use serde::Serialize;
use std::collections::HashSet;

use crate::grouping::ThemeGroup;

pub const RECEIPTS_DIR: &str = "receipts";

/// One receipt to copy into the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptEntry {
    /// Path inside the archive
    pub archive_path: String,
    /// Key in blob storage
    pub stored_path: String,
}

/// A receipt left out of the archive because it could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedReceipt {
    pub archive_path: String,
    pub stored_path: String,
    pub reason: String,
}

/// Makes a name safe to use as one archive path segment
pub fn path_segment(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// Lays out the receipts of one theme
pub fn plan_receipts(theme_index: usize, group: &ThemeGroup) -> Vec<ReceiptEntry> {
    let theme_dir = format!(
        "{}/{}-{}",
        RECEIPTS_DIR,
        theme_index,
        path_segment(&group.name)
    );
    let mut entries = Vec::new();
    let mut item_index = 0usize;

    for entry in &group.claims {
        for item in entry.claim.items() {
            item_index += 1;
            let item_dir = format!(
                "{}/{}.{}-{}",
                theme_dir,
                theme_index,
                item_index,
                path_segment(item.name())
            );
            let mut taken = HashSet::new();
            for invoice in item.invoices() {
                let file_name = unique_name(&path_segment(&invoice.file_name), &mut taken);
                entries.push(ReceiptEntry {
                    archive_path: format!("{}/{}", item_dir, file_name),
                    stored_path: invoice.stored_path.clone(),
                });
            }
        }
    }
    entries
}

/// `scan.pdf`, then `scan (2).pdf`, `scan (3).pdf`, ...
pub(crate) fn unique_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }
    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
        _ => (name, ""),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{} ({}){}", stem, n, ext);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Text of `00_skipped_receipts.txt`
pub fn skipped_report(skipped: &[SkippedReceipt]) -> String {
    let mut report = format!(
        "{} receipt file(s) could not be read and were left out of this archive.\n\n",
        skipped.len()
    );
    for s in skipped {
        report.push_str(&format!(
            "{}\n    stored as {}\n    {}\n",
            s.archive_path, s.stored_path, s.reason
        ));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::{group_by_theme, ExportClaim};
    use chrono::NaiveDate;
    use core_kernel::UserId;
    use domain_claims::{Claim, ClaimDetails, Invoice, ItemLine};
    use rust_decimal_macros::dec;

    fn claim_with(theme: &str, items: &[(&str, Vec<&str>)]) -> ExportClaim {
        let mut claim = Claim::new(UserId::new(), "Arts", ClaimDetails::new(theme));
        let date = NaiveDate::from_ymd_opt(2024, 4, 21).unwrap();
        for (name, files) in items {
            let item_id = claim.add_item(&ItemLine::new(*name, 1, dec!(1.00))).unwrap();
            for file in files {
                claim.attach_invoice(Invoice::new(item_id, file, date)).unwrap();
            }
        }
        ExportClaim::new(claim, None)
    }

    #[test]
    fn test_example_paths() {
        let groups = group_by_theme(vec![claim_with(
            "Spring Gala",
            &[("Flowers", vec!["f.jpg"]), ("Banner", vec!["b.pdf"])],
        )]);
        let entries = plan_receipts(1, &groups[0]);
        assert_eq!(entries[0].archive_path, "receipts/1-Spring Gala/1.1-Flowers/f.jpg");
        assert_eq!(entries[1].archive_path, "receipts/1-Spring Gala/1.2-Banner/b.pdf");
    }

    #[test]
    fn test_item_index_continues_across_claims() {
        let groups = group_by_theme(vec![
            claim_with("Gala", &[("Flowers", vec!["a.jpg"]), ("Tape", vec![])]),
            claim_with("Gala", &[("Water", vec!["w.jpg"])]),
        ]);
        let entries = plan_receipts(2, &groups[0]);
        let paths: Vec<&str> = entries.iter().map(|e| e.archive_path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["receipts/2-Gala/2.1-Flowers/a.jpg", "receipts/2-Gala/2.3-Water/w.jpg"]
        );
    }

    #[test]
    fn test_duplicate_file_names_get_suffixes() {
        let groups = group_by_theme(vec![claim_with(
            "Gala",
            &[("Flowers", vec!["scan.pdf", "scan.pdf", "scan.pdf"])],
        )]);
        let names: Vec<String> = plan_receipts(1, &groups[0])
            .into_iter()
            .map(|e| e.archive_path.rsplit('/').next().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["scan.pdf", "scan (2).pdf", "scan (3).pdf"]);
    }

    #[test]
    fn test_path_segment_replaces_separators() {
        assert_eq!(path_segment("Cables/Adapters"), "Cables_Adapters");
        assert_eq!(path_segment("a\\b"), "a_b");
        assert_eq!(path_segment(".."), "_");
        assert_eq!(path_segment("  Gala "), "Gala");
    }

    #[test]
    fn test_skipped_report_lists_every_file() {
        let report = skipped_report(&[SkippedReceipt {
            archive_path: "receipts/1-Gala/1.1-Flowers/a.jpg".to_string(),
            stored_path: "invoices/2024/04/21/abcd1234_a.jpg".to_string(),
            reason: "Not found".to_string(),
        }]);
        assert!(report.starts_with("1 receipt file(s)"));
        assert!(report.contains("receipts/1-Gala/1.1-Flowers/a.jpg"));
    }
}

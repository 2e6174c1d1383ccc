//! Grouping of exportable claims by theme name

use core_kernel::{ActivityDate, Money};
use domain_claims::{Claim, User};

/// A claim together with what the documents print about its applicant
#[derive(Debug, Clone)]
pub struct ExportClaim {
    pub claim: Claim,
    pub applicant_name: String,
    /// Student or staff number; blank when unknown
    pub applicant_number: String,
}

impl ExportClaim {
    /// Pairs a claim with its applicant, if the directory knew them
    pub fn new(claim: Claim, applicant: Option<&User>) -> Self {
        match applicant {
            Some(user) => Self {
                applicant_name: user.display_name().to_string(),
                applicant_number: user.student_id.clone().unwrap_or_default(),
                claim,
            },
            None => Self {
                applicant_name: claim.applicant_id().to_string(),
                applicant_number: String::new(),
                claim,
            },
        }
    }
}

/// All exportable claims sharing one theme name
#[derive(Debug, Clone)]
pub struct ThemeGroup {
    pub name: String,
    pub claims: Vec<ExportClaim>,
}

impl ThemeGroup {
    /// Distinct leader names in first-seen order
    pub fn leaders(&self) -> Vec<&str> {
        distinct(self.claims.iter().map(|c| c.claim.details().leader.as_str()))
    }

    /// Distinct non-blank locations in first-seen order
    pub fn locations(&self) -> Vec<&str> {
        distinct(self.claims.iter().map(|c| c.claim.details().location.as_str()))
    }

    /// Date of the first claim that has one
    pub fn activity_date(&self) -> Option<ActivityDate> {
        self.claims.iter().find_map(|c| c.claim.details().activity_date)
    }

    /// Non-blank claim descriptions in claim order
    pub fn descriptions(&self) -> Vec<&str> {
        self.claims
            .iter()
            .map(|c| c.claim.details().description.as_str())
            .filter(|d| !d.trim().is_empty())
            .collect()
    }

    /// Sum of the claim totals
    pub fn total(&self) -> Money {
        self.claims.iter().map(|c| c.claim.total_amount()).sum()
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// Groups claims by their literal theme text
///
/// Groups appear in the order their first claim appears, and claims keep
/// their order inside a group. The linked theme record plays no part: two
/// claims with the same text share a group even if they point at different
/// theme records or none.
pub fn group_by_theme(claims: Vec<ExportClaim>) -> Vec<ThemeGroup> {
    let mut groups: Vec<ThemeGroup> = Vec::new();
    for entry in claims {
        let name = entry.claim.details().theme.clone();
        match groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.claims.push(entry),
            None => groups.push(ThemeGroup {
                name,
                claims: vec![entry],
            }),
        }
    }
    groups
}

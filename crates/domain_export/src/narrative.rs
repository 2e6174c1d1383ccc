//! Per-theme activity statement
//!
//! The statement is assembled as plain lines first, so its content can be
//! checked without opening a `.docx`, and then rendered with `docx-rs`.

use docx_rs::{AlignmentType, Docx, Paragraph, Run};
use std::io::Cursor;

use core_kernel::Money;
use crate::error::ExportError;
use crate::grouping::ThemeGroup;
use crate::summary::DATE_NOT_SET;

pub const TITLE: &str = "Student Activity Expense Statement";
pub const CURRENCY_SYMBOL: &str = "¥";

/// One applicant's block in the expense section
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeClaim {
    pub applicant: String,
    /// `"{name} {quantity} {unit} - ¥{amount}"` per item
    pub lines: Vec<String>,
}

/// Content of one theme's statement
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeDocument {
    pub theme: String,
    pub participants: String,
    pub preparer: String,
    /// Left blank for the preparer to fill in by hand
    pub contact: String,
    pub activity_date: String,
    pub locations: String,
    pub descriptions: Vec<String>,
    pub claims: Vec<NarrativeClaim>,
    pub total: Money,
}

impl NarrativeDocument {
    /// Builds the statement for a theme group prepared by `preparer`
    pub fn for_group(group: &ThemeGroup, preparer: &str) -> Self {
        let claims = group
            .claims
            .iter()
            .map(|entry| NarrativeClaim {
                applicant: entry.applicant_name.clone(),
                lines: entry
                    .claim
                    .items()
                    .iter()
                    .map(|item| {
                        format!(
                            "{} {} {} - {}",
                            item.name(),
                            item.quantity(),
                            item.unit(),
                            format_money(item.amount())
                        )
                    })
                    .collect(),
            })
            .collect();

        Self {
            theme: group.name.clone(),
            participants: group.leaders().join(", "),
            preparer: preparer.to_string(),
            contact: String::new(),
            activity_date: group
                .activity_date()
                .map(|d| d.to_string())
                .unwrap_or_else(|| DATE_NOT_SET.to_string()),
            locations: group.locations().join(", "),
            descriptions: group.descriptions().into_iter().map(str::to_string).collect(),
            claims,
            total: group.total(),
        }
    }

    /// The statement body, one entry per paragraph
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Activity theme: {}", self.theme),
            format!("Participants: {}", self.participants),
            format!("Prepared by: {}", self.preparer),
            format!("Contact: {}", self.contact),
            format!("Activity date: {}", self.activity_date),
            format!("Location: {}", self.locations),
            "Activity summary:".to_string(),
        ];
        lines.extend(self.descriptions.iter().cloned());
        lines.push(String::new());
        lines.push("Expenses:".to_string());
        for (index, claim) in self.claims.iter().enumerate() {
            lines.push(format!("{}. {}:", index + 1, claim.applicant));
            lines.extend(claim.lines.iter().map(|l| format!("    {}", l)));
        }
        lines.push(format!("Total: {}", format_money(self.total)));
        lines
    }

    /// Renders the statement as a Word document
    pub fn render_docx(&self) -> Result<Vec<u8>, ExportError> {
        let title = Paragraph::new()
            .add_run(Run::new().add_text(TITLE).bold().size(32))
            .align(AlignmentType::Center);

        let docx = self.lines().into_iter().fold(Docx::new().add_paragraph(title), |doc, line| {
            doc.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)))
        });

        let mut buffer = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut buffer)
            .map_err(|e| ExportError::render(format!("statement for {}", self.theme), e))?;
        Ok(buffer.into_inner())
    }
}

/// `¥1234.50`
pub fn format_money(amount: Money) -> String {
    format!("{}{}", CURRENCY_SYMBOL, amount)
}

//! Summary spreadsheet: one row per (claim, item)

use rust_xlsxwriter::{Format, Workbook};

use core_kernel::Money;
use crate::error::ExportError;
use crate::grouping::ThemeGroup;

/// Column headings of the summary sheet
pub const HEADERS: [&str; 11] = [
    "No.",
    "Activity theme",
    "Applicant",
    "Student ID",
    "Item",
    "Quantity",
    "Unit",
    "Unit price",
    "Amount",
    "Activity date",
    "Location",
];

const SHEET_NAME: &str = "Expense summary";

/// Printed when a claim carries no activity date
pub const DATE_NOT_SET: &str = "not set";

/// One line of the summary sheet
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    /// 1-based running number over the whole sheet
    pub sequence: u32,
    pub theme: String,
    pub applicant_name: String,
    pub applicant_number: String,
    pub item_name: String,
    pub quantity: u32,
    pub unit: String,
    pub unit_price: Money,
    pub amount: Money,
    pub activity_date: String,
    pub location: String,
}

/// Flattens the groups into rows: theme, then claim, then item
pub fn summary_rows(groups: &[ThemeGroup]) -> Vec<SummaryRow> {
    let mut rows = Vec::new();
    let mut sequence = 0u32;
    for group in groups {
        for entry in &group.claims {
            let details = entry.claim.details();
            let activity_date = details
                .activity_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| DATE_NOT_SET.to_string());
            for item in entry.claim.items() {
                sequence += 1;
                rows.push(SummaryRow {
                    sequence,
                    theme: group.name.clone(),
                    applicant_name: entry.applicant_name.clone(),
                    applicant_number: entry.applicant_number.clone(),
                    item_name: item.name().to_string(),
                    quantity: item.quantity(),
                    unit: item.unit().to_string(),
                    unit_price: item.price(),
                    amount: item.amount(),
                    activity_date: activity_date.clone(),
                    location: details.location.clone(),
                });
            }
        }
    }
    rows
}

/// Renders the rows as an xlsx workbook
///
/// Amounts are written as numbers with a `0.00` format so the sheet can be
/// summed; this is the only place they leave exact decimal arithmetic.
pub fn render_summary(rows: &[SummaryRow]) -> Result<Vec<u8>, ExportError> {
    let render_err = |e: rust_xlsxwriter::XlsxError| ExportError::render("summary spreadsheet", e);

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let money_format = Format::new().set_num_format("0.00");

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME).map_err(render_err)?;

    for (col, heading) in HEADERS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *heading, &header_format)
            .map_err(render_err)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let r = index as u32 + 1;
        sheet.write_number(r, 0, row.sequence).map_err(render_err)?;
        sheet.write_string(r, 1, &row.theme).map_err(render_err)?;
        sheet.write_string(r, 2, &row.applicant_name).map_err(render_err)?;
        sheet.write_string(r, 3, &row.applicant_number).map_err(render_err)?;
        sheet.write_string(r, 4, &row.item_name).map_err(render_err)?;
        sheet.write_number(r, 5, row.quantity).map_err(render_err)?;
        sheet.write_string(r, 6, &row.unit).map_err(render_err)?;
        sheet
            .write_number_with_format(r, 7, row.unit_price.to_f64(), &money_format)
            .map_err(render_err)?;
        sheet
            .write_number_with_format(r, 8, row.amount.to_f64(), &money_format)
            .map_err(render_err)?;
        sheet.write_string(r, 9, &row.activity_date).map_err(render_err)?;
        sheet.write_string(r, 10, &row.location).map_err(render_err)?;
    }

    sheet.set_column_width(1, 24).map_err(render_err)?;
    sheet.set_column_width(4, 24).map_err(render_err)?;
    sheet.set_column_width(9, 14).map_err(render_err)?;
    sheet.set_column_width(10, 20).map_err(render_err)?;

    workbook.save_to_buffer().map_err(render_err)
}

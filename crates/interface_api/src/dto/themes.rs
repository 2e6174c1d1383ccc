//! Theme lookup DTOs

use serde::Serialize;
use uuid::Uuid;

use domain_claims::ActivityTheme;

/// A theme with its date split for pre-filling the claim form
#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub id: Uuid,
    pub name: String,
    pub activity_date: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl From<&ActivityTheme> for ThemeResponse {
    fn from(theme: &ActivityTheme) -> Self {
        Self {
            id: *theme.id.as_uuid(),
            name: theme.name.clone(),
            activity_date: theme.activity_date.to_string(),
            year: theme.activity_date.year(),
            month: theme.activity_date.month(),
            day: theme.activity_date.day(),
        }
    }
}

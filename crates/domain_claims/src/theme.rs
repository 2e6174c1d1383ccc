//! Activity themes shared by the claims of one department

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ActivityDate, ThemeId};

/// A named activity within a department
///
/// `(name, department)` is unique in storage. Claims keep their own copy of
/// the name, so removing a theme never touches the claims that used it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTheme {
    pub id: ThemeId,
    pub name: String,
    pub department: String,
    /// Date shared by every claim filed under this theme
    pub activity_date: ActivityDate,
    pub created_at: DateTime<Utc>,
}

impl ActivityTheme {
    pub fn new(
        name: impl Into<String>,
        department: impl Into<String>,
        activity_date: ActivityDate,
    ) -> Self {
        Self {
            id: ThemeId::new_v7(),
            name: name.into(),
            department: department.into(),
            activity_date,
            created_at: Utc::now(),
        }
    }

    /// True when this theme is the one keyed by `(name, department)`
    pub fn is_keyed_by(&self, name: &str, department: &str) -> bool {
        self.name == name && self.department == department
    }
}

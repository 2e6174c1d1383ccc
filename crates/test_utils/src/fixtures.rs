//! Pre-built Test Fixtures
//!
//! Consistent users, forms and items so tests read the same across crates.

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use core_kernel::{ActivityDate, Money};
use domain_claims::{ActivityTheme, ClaimDetails, ItemLine, Role, User};

/// Department most fixtures live in
pub const ARTS: &str = "Arts";
/// A second department for cross-department checks
pub const SCIENCE: &str = "Science";

/// Fixture for users
pub struct UserFixtures;

impl UserFixtures {
    /// Applicant in Arts with a full name and student number
    pub fn amy() -> User {
        User::new("amy", Role::Applicant, ARTS)
            .with_full_name("Amy Chen")
            .with_student_id("20240001")
    }

    /// Applicant in Arts with neither full name nor student number
    pub fn bob() -> User {
        User::new("bob", Role::Applicant, ARTS)
    }

    /// Lead of Arts
    pub fn arts_lead() -> User {
        User::new("lee", Role::Lead, ARTS).with_full_name("Lee Ming")
    }

    /// Lead of Science
    pub fn science_lead() -> User {
        User::new("sam", Role::Lead, SCIENCE)
    }

    pub fn admin() -> User {
        User::new("root", Role::Admin, "Office")
    }
}

/// Fixture for claim forms, items and themes
pub struct ClaimFixtures;

impl ClaimFixtures {
    /// 2024-04-20
    pub fn gala_date() -> ActivityDate {
        ActivityDate::new(2024, 4, 20).unwrap()
    }

    /// Local date receipts are filed under
    pub fn upload_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 22).unwrap()
    }

    /// A complete, submittable claim form
    pub fn gala_details() -> ClaimDetails {
        ClaimDetails {
            theme: "Spring Gala".to_string(),
            description: "Stage decoration".to_string(),
            activity_date: Some(Self::gala_date()),
            location: "Main Hall".to_string(),
            leader: "Zhang Wei".to_string(),
        }
    }

    /// A form with only the theme filled in
    pub fn bare_details(theme: &str) -> ClaimDetails {
        ClaimDetails::new(theme)
    }

    /// Two flowers at 15.00 and a banner at 80.00
    pub fn gala_lines() -> Vec<ItemLine> {
        vec![
            ItemLine::new("Flowers", 2, dec!(15.00)).with_unit("bunch"),
            ItemLine::new("Banner", 1, dec!(80.00)),
        ]
    }

    /// Total of [`ClaimFixtures::gala_lines`]
    pub fn gala_total() -> Money {
        Money::new(dec!(110.00))
    }

    pub fn gala_theme(department: &str) -> ActivityTheme {
        ActivityTheme::new("Spring Gala", department, Self::gala_date())
    }
}

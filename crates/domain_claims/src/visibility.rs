//! Department visibility rules
//!
//! - Applicants see and edit only their own claims.
//! - Leads additionally see every non-draft claim of their own department
//!   and review the submitted ones.
//! - Admins manage accounts and never see claim content.
//!
//! Every refusal is a `PermissionDenied`, never an empty result.

use crate::claim::{Claim, ClaimStatus};
use crate::error::ClaimError;
use crate::ports::ClaimQuery;
use crate::user::Actor;
use crate::workflow::{ClaimAction, Performer};

/// Fails unless `actor` may read `claim`
pub fn ensure_can_view(actor: &Actor, claim: &Claim) -> Result<(), ClaimError> {
    if actor.is_admin() {
        return Err(ClaimError::denied("Administrators do not handle claim content"));
    }
    if claim.applicant_id() == actor.user_id {
        return Ok(());
    }
    if actor.is_lead()
        && claim.department() == actor.department
        && claim.status() != ClaimStatus::Draft
    {
        return Ok(());
    }
    Err(ClaimError::denied("This claim is outside your scope"))
}

/// Fails unless `actor` may perform `action` on `claim`
///
/// Only checks who is acting; whether the status allows the action is up to
/// the claim itself.
pub fn ensure_can_act(actor: &Actor, claim: &Claim, action: ClaimAction) -> Result<(), ClaimError> {
    match action.performer() {
        Performer::Owner => {
            if claim.applicant_id() != actor.user_id || actor.is_admin() {
                return Err(ClaimError::denied(format!(
                    "Only the applicant may {} this claim",
                    action
                )));
            }
        }
        Performer::DepartmentLead => {
            if !actor.is_lead() || claim.department() != actor.department {
                return Err(ClaimError::denied(format!(
                    "Only a lead of {} may {} this claim",
                    claim.department(),
                    action
                )));
            }
        }
    }
    Ok(())
}

/// The claims `actor` may list on the dashboard
pub fn listing_query(actor: &Actor) -> Result<ClaimQuery, ClaimError> {
    if actor.is_admin() {
        return Err(ClaimError::denied("Administrators do not handle claim content"));
    }
    if actor.is_lead() {
        Ok(ClaimQuery::visible_to_lead(actor.user_id, &actor.department))
    } else {
        Ok(ClaimQuery::owned_by(actor.user_id))
    }
}

/// The claims a lead may export: submitted or packed claims of their department
pub fn export_query(actor: &Actor) -> Result<ClaimQuery, ClaimError> {
    if !actor.is_lead() {
        return Err(ClaimError::denied("Only leads may export claims"));
    }
    Ok(ClaimQuery::exportable(&actor.department))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::ClaimDetails;
    use crate::user::{Role, User};
    use core_kernel::{ActivityDate, ThemeId};
    use rust_decimal_macros::dec;

    fn submitted_claim(owner: &User) -> Claim {
        let mut claim = Claim::new(
            owner.id,
            &owner.department,
            ClaimDetails {
                theme: "Spring Gala".to_string(),
                location: "Hall".to_string(),
                leader: "Zhang".to_string(),
                activity_date: Some(ActivityDate::new(2024, 4, 1).unwrap()),
                ..Default::default()
            },
        );
        claim
            .add_item(&crate::item::ItemLine::new("Flowers", 2, dec!(15.00)))
            .unwrap();
        let mut theme = crate::theme::ActivityTheme::new(
            "Spring Gala",
            &owner.department,
            ActivityDate::new(2024, 4, 1).unwrap(),
        );
        theme.id = ThemeId::new();
        claim.submit(&theme).unwrap();
        claim
    }

    #[test]
    fn test_lead_from_other_department_is_denied() {
        let applicant = User::new("amy", Role::Applicant, "Arts");
        let lead = User::new("sam", Role::Lead, "Sports");
        let claim = submitted_claim(&applicant);

        let err = ensure_can_view(&lead.actor(), &claim).unwrap_err();
        assert!(matches!(err, ClaimError::PermissionDenied(_)));
    }

    #[test]
    fn test_lead_sees_department_claims_but_not_drafts() {
        let applicant = User::new("amy", Role::Applicant, "Arts");
        let lead = User::new("lee", Role::Lead, "Arts");
        let claim = submitted_claim(&applicant);
        assert!(ensure_can_view(&lead.actor(), &claim).is_ok());

        let draft = Claim::new(applicant.id, "Arts", ClaimDetails::new("Gala"));
        assert!(ensure_can_view(&lead.actor(), &draft).is_err());
    }

    #[test]
    fn test_other_applicant_is_denied() {
        let owner = User::new("amy", Role::Applicant, "Arts");
        let other = User::new("bob", Role::Applicant, "Arts");
        let claim = submitted_claim(&owner);
        assert!(ensure_can_view(&other.actor(), &claim).is_err());
        assert!(ensure_can_view(&owner.actor(), &claim).is_ok());
    }

    #[test]
    fn test_admin_sees_no_claim_content() {
        let owner = User::new("amy", Role::Applicant, "Arts");
        let admin = User::new("root", Role::Admin, "Arts");
        let claim = submitted_claim(&owner);
        assert!(ensure_can_view(&admin.actor(), &claim).is_err());
        assert!(listing_query(&admin.actor()).is_err());
    }

    #[test]
    fn test_owner_cannot_review_own_claim_as_applicant() {
        let owner = User::new("amy", Role::Applicant, "Arts");
        let claim = submitted_claim(&owner);
        let err = ensure_can_act(&owner.actor(), &claim, ClaimAction::Approve).unwrap_err();
        assert!(matches!(err, ClaimError::PermissionDenied(_)));
    }

    #[test]
    fn test_lead_cannot_edit_someone_elses_claim() {
        let owner = User::new("amy", Role::Applicant, "Arts");
        let lead = User::new("lee", Role::Lead, "Arts");
        let claim = submitted_claim(&owner);
        assert!(ensure_can_act(&lead.actor(), &claim, ClaimAction::Edit).is_err());
        assert!(ensure_can_act(&lead.actor(), &claim, ClaimAction::Reject).is_ok());
    }

    #[test]
    fn test_export_is_for_leads_only() {
        let applicant = User::new("amy", Role::Applicant, "Arts");
        assert!(export_query(&applicant.actor()).is_err());
        let lead = User::new("lee", Role::Lead, "Arts");
        let query = export_query(&lead.actor()).unwrap();
        assert_eq!(query.department.as_deref(), Some("Arts"));
    }
}

//! # Access Control Policy
//!
//! Decides whether a principal may perform an operation on a target.
//!
//! Two independent checks gate every authenticated operation:
//!
//! 1. **Organization scope**: the target must live in the principal's
//!    organization. Holding the admin role never widens this.
//! 2. **Role**: the principal's role must satisfy the operation's rule.
//!
//! Decisions are pure functions of their inputs. Nothing is cached and
//! nothing is looked up, so the same inputs always yield the same answer.

use serde::{Deserialize, Serialize};
use tenancy_auth::Principal;

use crate::error::{AccessError, AccessResult};
use crate::operation::Operation;
use crate::target::Target;

/// Outcome of an access evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    Allow,
    Deny,
}

impl AccessDecision {
    /// Check if access was granted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

/// The access control evaluator.
///
/// | Operation                         | Rule                                  |
/// |-----------------------------------|---------------------------------------|
/// | create organization               | anyone                                |
/// | register member                   | anyone                                |
/// | register admin                    | admin of the target organization      |
/// | read own profile                  | the principal itself                  |
/// | read own organization             | any member of that organization       |
/// | list organizations                | any member; scoped to its own org     |
/// | read / update / delete user       | admin in org, or the user itself      |
/// | change role, list users           | admin in org                          |
/// | update / delete organization      | admin in org                          |
///
/// # Example
///
/// ```rust,no_run
/// use tenancy_auth::TokenService;
/// use tenancy_org::Role;
/// use tenancy_rbac::{AccessControl, Operation, Target};
/// use uuid::Uuid;
///
/// let tokens = TokenService::with_secret("secret").unwrap();
/// let org_id = Uuid::now_v7();
/// let token = tokens.issue(Uuid::now_v7(), org_id, Role::Admin).unwrap();
/// let admin = tokens.authenticate(&token).unwrap();
///
/// let decision = AccessControl::evaluate(
///     Some(&admin),
///     Operation::DeleteOrganization,
///     &Target::organization(org_id),
/// );
/// assert!(decision.is_allowed());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessControl;

impl AccessControl {
    /// Evaluate a request.
    ///
    /// # Arguments
    ///
    /// * `principal` - The verified caller, or `None` for anonymous requests
    /// * `operation` - The requested operation
    /// * `target` - The resource the operation acts on
    ///
    /// # Returns
    ///
    /// `Deny` whenever organization scope, role, or target shape does not
    /// fit. Anonymous callers are denied everything except the bootstrap
    /// operations.
    pub fn evaluate(
        principal: Option<&Principal>,
        operation: Operation,
        target: &Target,
    ) -> AccessDecision {
        if !operation.requires_authentication() {
            return AccessDecision::Allow;
        }

        let Some(principal) = principal else {
            return AccessDecision::Deny;
        };

        if target.kind() != operation.target_kind() {
            return AccessDecision::Deny;
        }

        let in_scope = target
            .organization_id()
            .is_some_and(|org_id| principal.in_organization(org_id));
        if !in_scope {
            return AccessDecision::Deny;
        }

        let role = principal.role();
        let is_self = target
            .user_id()
            .is_some_and(|user_id| principal.is_user(user_id));

        let allowed = if operation.requires_admin() {
            match operation {
                Operation::UpdateOrganization | Operation::DeleteOrganization => {
                    role.can_manage_organization()
                }
                _ => role.can_manage_members(),
            }
        } else {
            match operation {
                Operation::ReadOwnProfile => is_self,
                Operation::ReadUser | Operation::UpdateUser | Operation::DeleteUser => {
                    is_self || role.can_manage_members()
                }
                _ => true,
            }
        };

        if allowed {
            AccessDecision::Allow
        } else {
            AccessDecision::Deny
        }
    }

    /// Evaluate a request and convert the outcome into an error.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` if the operation needs a principal and none was given
    /// - `Forbidden` for every other denial
    pub fn authorize(
        principal: Option<&Principal>,
        operation: Operation,
        target: &Target,
    ) -> AccessResult<()> {
        if principal.is_none() && operation.requires_authentication() {
            return Err(AccessError::Unauthenticated);
        }

        match Self::evaluate(principal, operation, target) {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny => Err(AccessError::Forbidden),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::TargetKind;
    use tenancy_auth::TokenService;
    use tenancy_org::Role;
    use uuid::Uuid;

    fn principal(user_id: Uuid, org_id: Uuid, role: Role) -> Principal {
        let tokens = TokenService::with_secret("policy-test-secret").unwrap();
        let token = tokens.issue(user_id, org_id, role).unwrap();
        tokens.authenticate(&token).unwrap()
    }

    struct Fixture {
        org_a: Uuid,
        org_b: Uuid,
        admin_a: Principal,
        member_a: Principal,
        member_a_id: Uuid,
        other_member_a_id: Uuid,
        admin_b: Principal,
    }

    fn fixture() -> Fixture {
        let org_a = Uuid::now_v7();
        let org_b = Uuid::now_v7();
        let member_a_id = Uuid::now_v7();
        Fixture {
            org_a,
            org_b,
            admin_a: principal(Uuid::now_v7(), org_a, Role::Admin),
            member_a: principal(member_a_id, org_a, Role::Member),
            member_a_id,
            other_member_a_id: Uuid::now_v7(),
            admin_b: principal(Uuid::now_v7(), org_b, Role::Admin),
        }
    }

    fn allowed(principal: &Principal, operation: Operation, target: Target) -> bool {
        AccessControl::evaluate(Some(principal), operation, &target).is_allowed()
    }

    #[test]
    fn test_bootstrap_operations_allow_anonymous() {
        let org_id = Uuid::now_v7();
        assert!(AccessControl::evaluate(None, Operation::CreateOrganization, &Target::None)
            .is_allowed());
        assert!(AccessControl::evaluate(
            None,
            Operation::RegisterMember,
            &Target::organization(org_id)
        )
        .is_allowed());
    }

    #[test]
    fn test_anonymous_denied_elsewhere() {
        let org_id = Uuid::now_v7();
        let target = Target::organization(org_id);

        assert_eq!(
            AccessControl::evaluate(None, Operation::ReadOwnOrganization, &target),
            AccessDecision::Deny
        );
        assert_eq!(
            AccessControl::authorize(None, Operation::ReadOwnOrganization, &target),
            Err(AccessError::Unauthenticated)
        );
        assert_eq!(
            AccessControl::authorize(None, Operation::RegisterAdmin, &target),
            Err(AccessError::Unauthenticated)
        );
    }

    #[test]
    fn test_admin_manages_own_organization() {
        let f = fixture();
        let org = Target::organization(f.org_a);
        let user = Target::user(f.other_member_a_id, f.org_a);

        assert!(allowed(&f.admin_a, Operation::RegisterAdmin, org));
        assert!(allowed(&f.admin_a, Operation::ListOrganizationUsers, org));
        assert!(allowed(&f.admin_a, Operation::UpdateOrganization, org));
        assert!(allowed(&f.admin_a, Operation::DeleteOrganization, org));
        assert!(allowed(&f.admin_a, Operation::ReadUser, user));
        assert!(allowed(&f.admin_a, Operation::UpdateUser, user));
        assert!(allowed(&f.admin_a, Operation::DeleteUser, user));
        assert!(allowed(&f.admin_a, Operation::ChangeUserRole, user));
    }

    #[test]
    fn test_admin_operations_deny_members() {
        let f = fixture();

        for operation in Operation::all().into_iter().filter(Operation::requires_admin) {
            let target = match operation.target_kind() {
                TargetKind::User => Target::user(f.member_a_id, f.org_a),
                TargetKind::Organization => Target::organization(f.org_a),
                TargetKind::None => Target::None,
            };
            assert!(!allowed(&f.member_a, operation, target), "{operation} allowed a member");
            assert!(allowed(&f.admin_a, operation, target), "{operation} denied an admin");
        }
    }

    #[test]
    fn test_admin_never_crosses_organizations() {
        let f = fixture();
        let org = Target::organization(f.org_a);
        let user = Target::user(f.member_a_id, f.org_a);

        for operation in Operation::all()
            .into_iter()
            .filter(Operation::requires_authentication)
        {
            let target = match operation.target_kind() {
                crate::TargetKind::User => user,
                _ => org,
            };
            assert!(
                !allowed(&f.admin_b, operation, target),
                "{operation} crossed organizations"
            );
        }
    }

    #[test]
    fn test_member_acts_on_itself() {
        let f = fixture();
        let me = Target::user(f.member_a_id, f.org_a);

        assert!(allowed(&f.member_a, Operation::ReadOwnProfile, me));
        assert!(allowed(&f.member_a, Operation::ReadUser, me));
        assert!(allowed(&f.member_a, Operation::UpdateUser, me));
        assert!(allowed(&f.member_a, Operation::DeleteUser, me));
        assert!(!allowed(&f.member_a, Operation::ChangeUserRole, me));
    }

    #[test]
    fn test_member_denied_on_peers_and_organization() {
        let f = fixture();
        let peer = Target::user(f.other_member_a_id, f.org_a);
        let org = Target::organization(f.org_a);

        assert!(!allowed(&f.member_a, Operation::ReadUser, peer));
        assert!(!allowed(&f.member_a, Operation::UpdateUser, peer));
        assert!(!allowed(&f.member_a, Operation::DeleteUser, peer));
        assert!(!allowed(&f.member_a, Operation::ReadOwnProfile, peer));
        assert!(!allowed(&f.member_a, Operation::RegisterAdmin, org));
        assert!(!allowed(&f.member_a, Operation::ListOrganizationUsers, org));
        assert!(!allowed(&f.member_a, Operation::UpdateOrganization, org));
        assert!(!allowed(&f.member_a, Operation::DeleteOrganization, org));

        assert!(allowed(&f.member_a, Operation::ReadOwnOrganization, org));
        assert!(allowed(&f.member_a, Operation::ListOrganizations, org));
    }

    #[test]
    fn test_member_cannot_read_foreign_organization() {
        let f = fixture();
        assert!(!allowed(
            &f.member_a,
            Operation::ReadOwnOrganization,
            Target::organization(f.org_b)
        ));
    }

    #[test]
    fn test_mismatched_target_denied() {
        let f = fixture();

        assert!(!allowed(
            &f.admin_a,
            Operation::DeleteUser,
            Target::organization(f.org_a)
        ));
        assert!(!allowed(
            &f.admin_a,
            Operation::DeleteOrganization,
            Target::user(f.member_a_id, f.org_a)
        ));
        assert!(!allowed(&f.admin_a, Operation::ReadOwnOrganization, Target::None));
    }

    #[test]
    fn test_authorize_maps_denial_to_forbidden() {
        let f = fixture();
        let result = AccessControl::authorize(
            Some(&f.member_a),
            Operation::DeleteOrganization,
            &Target::organization(f.org_a),
        );
        assert_eq!(result, Err(AccessError::Forbidden));
        assert_eq!(AccessError::Forbidden.status_code(), 403);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let f = fixture();
        let target = Target::user(f.member_a_id, f.org_a);
        let first = AccessControl::evaluate(Some(&f.member_a), Operation::UpdateUser, &target);
        let second = AccessControl::evaluate(Some(&f.member_a), Operation::UpdateUser, &target);
        assert_eq!(first, second);
    }
}

/// Authorization helpers
///
/// Thin wrappers around [`Ability`] that turn a denied policy into an
/// [`AuthzError`], so route guards and handlers can use `?`.
///
/// # Example
///
/// ```
/// use northbridge_shared::auth::authorization::{require_all, require_on};
/// use northbridge_shared::auth::policy::{Ability, Action, Field, PolicyCheck, Resource, Subject};
/// use northbridge_shared::models::role::Role;
/// use uuid::Uuid;
///
/// let user_id = Uuid::new_v4();
/// let ability = Ability::for_principal(user_id, Role::User);
///
/// assert!(require_all(&ability, &[PolicyCheck::READ_PRODUCT]).is_ok());
/// assert!(require_all(&ability, &[PolicyCheck::CREATE_PRODUCT]).is_err());
///
/// let cart = Resource::new(Subject::Cart).with(Field::UserId, Some(user_id));
/// assert!(require_on(&ability, Action::Delete, &cart).is_ok());
/// ```

use super::policy::{Ability, Action, PolicyCheck, Resource, Subject};

/// Authorization error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// The principal's rules never allow this action on this subject
    #[error("You are not allowed to {action} {subject}")]
    Forbidden { action: Action, subject: Subject },

    /// The action is allowed in general but not on this particular record
    #[error("You are not allowed to {action} this {subject}")]
    NotOwner { action: Action, subject: Subject },
}

/// Requires a single type-level check
pub fn require(ability: &Ability, check: PolicyCheck) -> Result<(), AuthzError> {
    if ability.allows(check) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            action: check.action,
            subject: check.subject,
        })
    }
}

/// Requires every check to pass; the first failure is returned
pub fn require_all(ability: &Ability, checks: &[PolicyCheck]) -> Result<(), AuthzError> {
    checks.iter().try_for_each(|check| require(ability, *check))
}

/// Requires an instance-level check against a loaded record
pub fn require_on(ability: &Ability, action: Action, resource: &Resource) -> Result<(), AuthzError> {
    if ability.can_on(action, resource) {
        Ok(())
    } else {
        Err(AuthzError::NotOwner {
            action,
            subject: resource.subject,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::policy::Field;
    use crate::models::role::Role;
    use uuid::Uuid;

    #[test]
    fn test_require_all_reports_first_failure() {
        let ability = Ability::for_principal(Uuid::new_v4(), Role::Vendor);

        let result = require_all(
            &ability,
            &[PolicyCheck::READ_STORE, PolicyCheck::READ_ADMIN, PolicyCheck::READ_USER],
        );

        assert_eq!(
            result,
            Err(AuthzError::Forbidden {
                action: Action::Read,
                subject: Subject::Admin
            })
        );
    }

    #[test]
    fn test_require_all_empty_passes() {
        let ability = Ability::for_principal(Uuid::new_v4(), Role::User);
        assert!(require_all(&ability, &[]).is_ok());
    }

    #[test]
    fn test_require_on_foreign_record() {
        let ability = Ability::for_principal(Uuid::new_v4(), Role::User);
        let order = Resource::new(Subject::Order).with(Field::UserId, Some(Uuid::new_v4()));

        let err = require_on(&ability, Action::Update, &order).unwrap_err();
        assert_eq!(err.to_string(), "You are not allowed to update this Order");
    }

    #[test]
    fn test_forbidden_message() {
        let err = AuthzError::Forbidden {
            action: Action::Create,
            subject: Subject::Product,
        };
        assert_eq!(err.to_string(), "You are not allowed to create Product");
    }
}

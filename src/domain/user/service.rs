use super::model::{User, UserStatus};
use crate::domain::entity::Entity;
use crate::domain::DomainResult;
use crate::shared::DomainError;

/// Pre-condition guards for user status and booking eligibility.
pub struct UserDomainService;

impl UserDomainService {
    /// `actor` is the user performing the change; their role, not the
    /// target's, decides what is allowed.
    pub fn validate_status_change(
        actor: &User,
        target: &User,
        new_status: UserStatus,
    ) -> DomainResult<()> {
        if target.status() == new_status {
            return Ok(());
        }
        if !actor.is_admin() {
            if target.status() == UserStatus::Blocked {
                return Err(DomainError::validation(
                    "only an administrator can unblock a user",
                ));
            }
            if new_status == UserStatus::Blocked {
                return Err(DomainError::validation(
                    "only an administrator can block a user",
                ));
            }
            if !actor.same_identity(target) {
                return Err(DomainError::validation(
                    "users can only change their own status",
                ));
            }
        } else if !actor.is_active() {
            return Err(DomainError::validation(format!(
                "administrator {} is {} and cannot change user status",
                actor.id(),
                actor.status()
            )));
        }
        Ok(())
    }

    pub fn validate_can_reserve(user: &User) -> DomainResult<()> {
        if !user.is_active() {
            return Err(DomainError::validation(format!(
                "user {} is {} and cannot make reservations",
                user.id(),
                user.status()
            )));
        }
        if !user.has_quota() {
            return Err(DomainError::validation(format!(
                "user {} has no remaining reservation quota",
                user.id()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::UserRole;
    use crate::domain::value_objects::{Email, Password};

    fn user(name: &str, role: UserRole) -> User {
        User::new(
            name,
            Email::parse(&format!("{}@example.com", name)).unwrap(),
            Password::from_hash("$2b$04$hash"),
            role,
            1,
        )
        .unwrap()
    }

    fn allowed(actor: &User, target: &User, to: UserStatus) -> bool {
        UserDomainService::validate_status_change(actor, target, to).is_ok()
    }

    #[test]
    fn blocked_user_cannot_unblock_themselves() {
        let mut target = user("bob", UserRole::User);
        target.change_status(UserStatus::Blocked);
        let err = UserDomainService::validate_status_change(&target, &target, UserStatus::Active)
            .unwrap_err();
        assert!(err.to_string().contains("administrator"));
    }

    #[test]
    fn admin_can_unblock() {
        let admin = user("root", UserRole::Admin);
        let mut target = user("bob", UserRole::User);
        target.change_status(UserStatus::Blocked);
        assert!(allowed(&admin, &target, UserStatus::Active));
    }

    #[test]
    fn actor_role_gates_not_target_role() {
        // blocked admin being unblocked by a regular user
        let actor = user("carol", UserRole::User);
        let mut target = user("dave", UserRole::Admin);
        target.change_status(UserStatus::Blocked);
        assert!(!allowed(&actor, &target, UserStatus::Active));
    }

    #[test]
    fn user_may_deactivate_only_themselves() {
        let alice = user("alice", UserRole::User);
        let bob = user("bob", UserRole::User);
        assert!(allowed(&alice, &alice, UserStatus::Inactive));
        assert!(!allowed(&alice, &bob, UserStatus::Inactive));
        assert!(!allowed(&alice, &alice, UserStatus::Blocked));
    }

    #[test]
    fn inactive_admin_cannot_act() {
        let mut admin = user("root", UserRole::Admin);
        admin.change_status(UserStatus::Inactive);
        let target = user("bob", UserRole::User);
        assert!(!allowed(&admin, &target, UserStatus::Blocked));
    }

    #[test]
    fn reserving_requires_active_status_and_quota() {
        let mut u = user("erin", UserRole::User);
        assert!(UserDomainService::validate_can_reserve(&u).is_ok());
        u.consume_quota().unwrap();
        let err = UserDomainService::validate_can_reserve(&u).unwrap_err();
        assert!(err.to_string().contains("quota"));
        u.restore_quota();
        u.change_status(UserStatus::Inactive);
        assert!(UserDomainService::validate_can_reserve(&u).is_err());
    }
}

//! User domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::{Entity, UserId};
use crate::domain::value_objects::{Email, Password};
use crate::domain::DomainResult;
use crate::shared::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::User
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Inactive,
    Blocked,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Blocked => "BLOCKED",
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored form of a user, carrying status and remaining quota.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub password: Password,
    pub role: UserRole,
    pub status: UserStatus,
    pub reservation_quota: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Customer or administrator
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    name: String,
    email: Email,
    password: Password,
    role: UserRole,
    status: UserStatus,
    /// Remaining number of concurrent confirmed reservations.
    reservation_quota: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &UserId {
        &self.id
    }
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: Email,
        password: Password,
        role: UserRole,
        reservation_quota: u32,
    ) -> DomainResult<Self> {
        Self::with_id(UserId::generate(), name, email, password, role, reservation_quota)
    }

    pub fn with_id(
        id: UserId,
        name: impl Into<String>,
        email: Email,
        password: Password,
        role: UserRole,
        reservation_quota: u32,
    ) -> DomainResult<Self> {
        if id.is_blank() {
            return Err(DomainError::validation("user id must not be empty"));
        }
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("user name must not be empty"));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            name,
            email,
            password,
            role,
            status: UserStatus::Active,
            reservation_quota,
            created_at: now,
            updated_at: now,
        })
    }

    /// Trusted reconstruction from storage.
    pub fn restore(snapshot: UserSnapshot) -> DomainResult<Self> {
        if snapshot.id.is_blank() {
            return Err(DomainError::validation("user id must not be empty"));
        }
        if snapshot.name.trim().is_empty() {
            return Err(DomainError::validation("user name must not be empty"));
        }
        Ok(Self {
            id: snapshot.id,
            name: snapshot.name,
            email: snapshot.email,
            password: snapshot.password,
            role: snapshot.role,
            status: snapshot.status,
            reservation_quota: snapshot.reservation_quota,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        })
    }

    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            role: self.role,
            status: self.status,
            reservation_quota: self.reservation_quota,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password(&self) -> &Password {
        &self.password
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn status(&self) -> UserStatus {
        self.status
    }

    pub fn reservation_quota(&self) -> u32 {
        self.reservation_quota
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn has_quota(&self) -> bool {
        self.reservation_quota > 0
    }

    pub fn verify_password(&self, plain: &str) -> bool {
        self.password.verify(plain)
    }

    /// Apply a status already cleared by `UserDomainService`.
    pub fn change_status(&mut self, status: UserStatus) {
        if self.status != status {
            self.status = status;
            self.touch();
        }
    }

    pub fn change_password(&mut self, password: Password) {
        self.password = password;
        self.touch();
    }

    pub(crate) fn consume_quota(&mut self) -> DomainResult<()> {
        if self.reservation_quota == 0 {
            return Err(DomainError::validation(format!(
                "user {} has no remaining reservation quota",
                self.id
            )));
        }
        self.reservation_quota -= 1;
        self.touch();
        Ok(())
    }

    pub(crate) fn restore_quota(&mut self) {
        self.reservation_quota += 1;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(quota: u32) -> User {
        User::new(
            "Jane Doe",
            Email::parse("jane@example.com").unwrap(),
            Password::from_hash("$2b$04$hash"),
            UserRole::User,
            quota,
        )
        .unwrap()
    }

    #[test]
    fn new_user_is_active() {
        let u = sample_user(2);
        assert!(u.is_active());
        assert!(!u.is_admin());
        assert!(u.has_quota());
        assert_eq!(u.status(), UserStatus::Active);
    }

    #[test]
    fn blank_name_is_rejected() {
        let result = User::new(
            " ",
            Email::parse("jane@example.com").unwrap(),
            Password::from_hash("$2b$04$hash"),
            UserRole::User,
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn quota_is_consumed_and_restored() {
        let mut u = sample_user(1);
        u.consume_quota().unwrap();
        assert!(!u.has_quota());
        assert!(u.consume_quota().is_err());
        u.restore_quota();
        assert_eq!(u.reservation_quota(), 1);
    }

    #[test]
    fn blocked_user_is_not_active() {
        let mut u = sample_user(1);
        u.change_status(UserStatus::Blocked);
        assert!(!u.is_active());
    }

    #[test]
    fn snapshot_restores_blocked_user_with_spent_quota() {
        let mut u = sample_user(2);
        u.consume_quota().unwrap();
        u.change_status(UserStatus::Blocked);

        let restored = User::restore(u.snapshot()).unwrap();
        assert!(restored.same_identity(&u));
        assert_eq!(restored.status(), UserStatus::Blocked);
        assert_eq!(restored.reservation_quota(), 1);
        assert_eq!(restored.password().as_hash(), "$2b$04$hash");
        assert_eq!(restored.snapshot(), u.snapshot());
    }

    #[test]
    fn snapshot_serializes_the_hash_only() {
        let snapshot = sample_user(1).snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["password"], "$2b$04$hash");
        assert_eq!(json["status"], "ACTIVE");

        let back: UserSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
        assert!(!format!("{:?}", back).contains("$2b$"));
    }

    #[test]
    fn restore_rejects_blank_identity() {
        let mut snapshot = sample_user(1).snapshot();
        snapshot.id = UserId::new(" ");
        assert!(User::restore(snapshot).is_err());
    }
}

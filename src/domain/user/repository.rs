use async_trait::async_trait;

use super::model::User;
use crate::domain::entity::UserId;
use crate::domain::value_objects::Email;
use crate::domain::DomainResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Duplicate ids or e-mail addresses are rejected.
    async fn save(&self, user: User) -> DomainResult<()>;

    async fn find_by_id(&self, id: &UserId) -> DomainResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> DomainResult<Option<User>>;

    async fn update(&self, user: User) -> DomainResult<()>;
}

use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account row. The hash never leaves the auth module.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

//! Admin bootstrap.
//!
//! The API only lets admins create users, so the first admin comes from
//! here.

use anyhow::{Context, bail};
use registrar_models::{UserId, UserRole};
use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub external_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

pub async fn create_admin(db: &PgPool, admin: &NewAdmin) -> anyhow::Result<UserId> {
    if admin.external_id.trim().is_empty() {
        bail!("external id must not be empty");
    }
    if !admin.email.contains('@') {
        bail!("'{}' is not an email address", admin.email);
    }

    let id = sqlx::query_scalar::<_, UserId>(
        r#"INSERT INTO users (external_id, email, first_name, last_name, role, status)
           VALUES ($1, $2, $3, $4, $5, 'active')
           ON CONFLICT DO NOTHING
           RETURNING id"#,
    )
    .bind(admin.external_id.trim())
    .bind(admin.email.trim().to_lowercase())
    .bind(admin.first_name.trim())
    .bind(admin.last_name.trim())
    .bind(UserRole::Admin)
    .fetch_optional(db)
    .await
    .context("Failed to insert admin user")?;

    match id {
        Some(id) => Ok(id),
        None => bail!("a user with this external id or email already exists"),
    }
}

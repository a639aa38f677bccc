use anyhow::{bail, Result};
use chrono::Utc;
use common::Role;
use model::entities::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, Set};
use tracing::{info, trace};

use super::initdb::connect_and_migrate;
use crate::auth::hash_password;
use crate::helpers::converters::role_to_model;

/// Insert the user, or reset password and role when the username exists.
pub(crate) async fn upsert_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    role: Role,
) -> Result<user::Model> {
    let username = username.trim();
    if username.is_empty() {
        bail!("Username must not be empty");
    }
    if password.chars().count() < 6 {
        bail!("Password must be at least 6 characters");
    }
    let password_hash = hash_password(password)?;

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?;

    let saved = match existing {
        Some(found) => {
            let mut active = found.into_active_model();
            active.password_hash = Set(password_hash);
            active.role = Set(role_to_model(role));
            let updated = active.update(db).await?;
            info!("Updated existing user '{}' (ID {}) with role {}", updated.username, updated.id, role);
            updated
        }
        None => {
            let created = user::ActiveModel {
                username: Set(username.to_string()),
                password_hash: Set(password_hash),
                role: Set(role_to_model(role)),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await?;
            info!("Created user '{}' (ID {}) with role {}", created.username, created.id, role);
            created
        }
    };

    Ok(saved)
}

pub async fn seed_user(database_url: &str, username: &str, password: &str, role: Role) -> Result<()> {
    trace!("Entering seed_user function");
    let db = connect_and_migrate(database_url).await?;
    upsert_user(&db, username, password, role).await?;
    Ok(())
}

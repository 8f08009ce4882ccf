//! `users` table.

use std::collections::BTreeSet;

use async_trait::async_trait;
use moosicbox_json_utils::database::ToValue as _;
use precinct_access::StoreError;
use precinct_access::store::UserStore;
use precinct_identity_models::{NewUser, Role, User, UserId, UserProfile};
use switchy_database::{DatabaseValue, Row};

use crate::{SqliteStore, backend, corrupt};

fn opt_str(value: Option<&str>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, |s| DatabaseValue::String(s.to_string()))
}

fn opt_i64(value: Option<i64>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, DatabaseValue::Int64)
}

fn row_to_user(row: &Row) -> Result<User, StoreError> {
    let role: String = row.to_value("role").map_err(corrupt)?;
    let role = role
        .parse::<Role>()
        .map_err(|_| corrupt(format!("unknown role '{role}'")))?;
    let active: i64 = row.to_value("active").map_err(corrupt)?;

    let user = User {
        id: row.to_value("id").map_err(corrupt)?,
        role,
        created_by: row.to_value("created_by").map_err(corrupt)?,
        active: active != 0,
        profile: UserProfile {
            username: row.to_value("username").map_err(corrupt)?,
            email: row.to_value("email").map_err(corrupt)?,
            first_name: row.to_value("first_name").map_err(corrupt)?,
            last_name: row.to_value("last_name").map_err(corrupt)?,
            phone: row.to_value("phone").map_err(corrupt)?,
            badge_number: row.to_value("badge_number").map_err(corrupt)?,
        },
    };
    user.node().map_err(corrupt)?;
    Ok(user)
}

fn first_user(rows: &[Row]) -> Result<Option<User>, StoreError> {
    rows.first().map(row_to_user).transpose()
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let now = chrono::Utc::now().to_rfc3339();
        let p = &user.profile;

        let rows = self
            .db
            .query_raw_params(
                "INSERT INTO users (role, created_by, active, username, email, first_name,
                     last_name, phone, badge_number, created_at)
                 VALUES (?, ?, 1, ?, ?, ?, ?, ?, ?, ?)
                 RETURNING *",
                &[
                    DatabaseValue::String(user.node.role().to_string()),
                    opt_i64(user.node.parent()),
                    DatabaseValue::String(p.username.clone()),
                    opt_str(p.email.as_deref()),
                    opt_str(p.first_name.as_deref()),
                    opt_str(p.last_name.as_deref()),
                    opt_str(p.phone.as_deref()),
                    opt_str(p.badge_number.as_deref()),
                    DatabaseValue::String(now),
                ],
            )
            .await
            .map_err(backend)?;

        first_user(&rows)?.ok_or_else(|| backend("insert returned no row"))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let rows = self
            .db
            .query_raw_params("SELECT * FROM users WHERE id = ?", &[DatabaseValue::Int64(id)])
            .await
            .map_err(backend)?;
        first_user(&rows)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = self
            .db
            .query_raw_params("SELECT * FROM users ORDER BY id", &[])
            .await
            .map_err(backend)?;
        rows.iter().map(row_to_user).collect()
    }

    async fn update_profile(
        &self,
        id: UserId,
        profile: &UserProfile,
    ) -> Result<Option<User>, StoreError> {
        let rows = self
            .db
            .query_raw_params(
                "UPDATE users SET username = ?, email = ?, first_name = ?, last_name = ?,
                     phone = ?, badge_number = ?
                 WHERE id = ?
                 RETURNING *",
                &[
                    DatabaseValue::String(profile.username.clone()),
                    opt_str(profile.email.as_deref()),
                    opt_str(profile.first_name.as_deref()),
                    opt_str(profile.last_name.as_deref()),
                    opt_str(profile.phone.as_deref()),
                    opt_str(profile.badge_number.as_deref()),
                    DatabaseValue::Int64(id),
                ],
            )
            .await
            .map_err(backend)?;
        first_user(&rows)
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        // The boundary row is removed by `trg_users_delete_boundary`.
        let deleted = self
            .db
            .exec_raw_params("DELETE FROM users WHERE id = ?", &[DatabaseValue::Int64(id)])
            .await
            .map_err(backend)?;
        Ok(deleted > 0)
    }

    async fn children_of(&self, parent: UserId) -> Result<BTreeSet<UserId>, StoreError> {
        let rows = self
            .db
            .query_raw_params(
                "SELECT id FROM users WHERE created_by = ?",
                &[DatabaseValue::Int64(parent)],
            )
            .await
            .map_err(backend)?;
        rows.iter()
            .map(|row| row.to_value::<i64>("id").map_err(corrupt))
            .collect()
    }

    async fn count_users(&self) -> Result<u64, StoreError> {
        let rows = self
            .db
            .query_raw_params("SELECT COUNT(*) as cnt FROM users", &[])
            .await
            .map_err(backend)?;

        let count: i64 = rows.first().map_or(Ok(0), |r| r.to_value("cnt")).map_err(corrupt)?;
        u64::try_from(count).map_err(corrupt)
    }
}

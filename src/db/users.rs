use crate::db::models::{User, UserCreate, UserUpdate};
use crate::db::{Database, DbError};
use duckdb::{params, Connection, OptionalExt};
use tracing::info;

const USER_COLUMNS: &str = "id, name, email, address, role";

fn map_user(row: &duckdb::Row<'_>) -> duckdb::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        address: row.get(3)?,
        role: row.get(4)?,
    })
}

fn find_by(conn: &Connection, column: &str, value: &str) -> Result<Option<User>, DbError> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column);
    Ok(conn.query_row(&sql, [value], map_user).optional()?)
}

#[derive(Clone)]
pub struct UserService {
    db: Database,
}

impl UserService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<User>, DbError> {
        self.db
            .run(|conn| {
                let mut stmt =
                    conn.prepare(&format!("SELECT {} FROM users ORDER BY name", USER_COLUMNS))?;
                let users = stmt
                    .query_map([], map_user)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(users)
            })
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<User>, DbError> {
        let id = id.to_string();
        self.db.run(move |conn| find_by(conn, "id", &id)).await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let email = email.to_string();
        self.db.run(move |conn| find_by(conn, "email", &email)).await
    }

    /// Registers a user; new accounts always get the `user` role.
    pub async fn create(&self, data: UserCreate) -> Result<User, DbError> {
        data.validate().map_err(DbError::Invalid)?;

        self.db
            .run(move |conn| {
                if find_by(conn, "email", &data.email)?.is_some() {
                    return Err(DbError::Conflict(
                        "User with this email already exists".to_string(),
                    ));
                }

                let id = uuid::Uuid::new_v4().to_string();
                conn.execute(
                    "INSERT INTO users (id, name, email, address, role) VALUES (?, ?, ?, ?, 'user')",
                    params![id, data.name, data.email, data.address],
                )?;
                info!("User created successfully: {}", data.email);

                find_by(conn, "id", &id)?.ok_or_else(|| DbError::NotFound(format!("user {}", id)))
            })
            .await
    }

    /// Applies the provided fields; returns `None` when the user does not exist.
    pub async fn update(&self, id: &str, data: UserUpdate) -> Result<Option<User>, DbError> {
        data.validate().map_err(DbError::Invalid)?;
        let id = id.to_string();

        self.db
            .run(move |conn| {
                let Some(existing) = find_by(conn, "id", &id)? else {
                    return Ok(None);
                };

                if let Some(email) = &data.email {
                    if email != &existing.email && find_by(conn, "email", email)?.is_some() {
                        return Err(DbError::Conflict(
                            "User with this email already exists".to_string(),
                        ));
                    }
                }

                conn.execute(
                    "UPDATE users SET name = ?, email = ?, address = ? WHERE id = ?",
                    params![
                        data.name.unwrap_or(existing.name),
                        data.email.unwrap_or(existing.email),
                        data.address.or(existing.address),
                        id
                    ],
                )?;

                find_by(conn, "id", &id)
            })
            .await
    }

    /// Deletes the user together with their orders and order items.
    pub async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let id = id.to_string();

        self.db
            .run(move |conn| {
                conn.execute(
                    "DELETE FROM order_items WHERE order_id IN (SELECT id FROM orders WHERE user_id = ?)",
                    [&id],
                )?;
                conn.execute("DELETE FROM orders WHERE user_id = ?", [&id])?;
                let deleted = conn.execute("DELETE FROM users WHERE id = ?", [&id])?;
                Ok(deleted > 0)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str) -> UserCreate {
        UserCreate {
            name: name.to_string(),
            email: email.to_string(),
            address: Some("123 Main Street".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let users = UserService::new(Database::in_memory());
        let created = users.create(new_user("Ana", "ana@example.com")).await.unwrap();

        assert_eq!(created.role, "user");
        assert_eq!(users.get(&created.id).await.unwrap(), Some(created.clone()));
        assert_eq!(
            users.get_by_email("ana@example.com").await.unwrap(),
            Some(created)
        );
        assert_eq!(users.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let users = UserService::new(Database::in_memory());
        users.create(new_user("Ana", "ana@example.com")).await.unwrap();

        let result = users.create(new_user("Other", "ana@example.com")).await;
        assert!(matches!(result, Err(DbError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let users = UserService::new(Database::in_memory());
        let created = users.create(new_user("Ana", "ana@example.com")).await.unwrap();

        let updated = users
            .update(
                &created.id,
                UserUpdate {
                    name: Some("Ana Maria".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Ana Maria");
        assert_eq!(updated.email, "ana@example.com");
        assert_eq!(updated.address.as_deref(), Some("123 Main Street"));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let users = UserService::new(Database::in_memory());
        let created = users.create(new_user("Ana", "ana@example.com")).await.unwrap();

        assert!(users.delete(&created.id).await.unwrap());
        assert!(!users.delete(&created.id).await.unwrap());
        assert!(users.list().await.unwrap().is_empty());
    }
}

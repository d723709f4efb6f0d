use super::error::unique_violation;
use super::{DbConn, StoreError};
use crate::models::{now_rfc3339, User};

/// Repository for account rows.
pub struct UserRepository {
    conn: DbConn,
}

impl UserRepository {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }

    pub fn insert(&self, user: &User) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        if username_exists(&conn, &user.username, None)? {
            return Err(StoreError::Conflict("Username is already taken.".into()));
        }
        if email_exists(&conn, &user.email, None)? {
            return Err(StoreError::Conflict("Email is already registered.".into()));
        }
        conn.execute(
            r#"
            INSERT INTO users (id, username, email, password_hash, first_name, last_name, phone, city, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            (
                &user.id,
                &user.username,
                &user.email,
                &user.password_hash,
                &user.first_name,
                &user.last_name,
                &user.phone,
                &user.city,
                &user.created_at,
                &user.updated_at,
            ),
        )
        .map_err(|e| unique_violation(e, "Username or email is already taken."))?;
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("{SELECT_USER} WHERE id = ?1"))?;
        let mut rows = stmt.query_map([id], user_from_row)?;
        match rows.next() {
            Some(row) => row.map(Some).map_err(Into::into),
            None => Ok(None),
        }
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let needle = username.trim().to_lowercase();
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("{SELECT_USER} WHERE username = ?1"))?;
        let mut rows = stmt.query_map([needle], user_from_row)?;
        match rows.next() {
            Some(row) => row.map(Some).map_err(Into::into),
            None => Ok(None),
        }
    }

    /// Update the editable profile fields. Username stays fixed.
    pub fn update_profile(&self, user: &User) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        if email_exists(&conn, &user.email, Some(&user.id))? {
            return Err(StoreError::Conflict("Email is already registered.".into()));
        }
        let affected = conn
            .execute(
                r#"
                UPDATE users
                SET email = ?1, first_name = ?2, last_name = ?3, phone = ?4, city = ?5, updated_at = ?6
                WHERE id = ?7
                "#,
                (
                    &user.email,
                    &user.first_name,
                    &user.last_name,
                    &user.phone,
                    &user.city,
                    now_rfc3339(),
                    &user.id,
                ),
            )
            .map_err(|e| unique_violation(e, "Email is already registered."))?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub fn set_password_hash(&self, id: &str, password_hash: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(
            "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
            (password_hash, now_rfc3339(), id),
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Remove the account. Records, attachments and grants referencing it
    /// go with it via the foreign-key cascades.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub fn list_all(&self) -> Result<Vec<User>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("{SELECT_USER} ORDER BY username"))?;
        let rows = stmt.query_map([], user_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

const SELECT_USER: &str = "SELECT id, username, email, password_hash, first_name, last_name, phone, city, created_at, updated_at FROM users";

fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        phone: row.get(6)?,
        city: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn username_exists(
    conn: &rusqlite::Connection,
    username: &str,
    exclude_id: Option<&str>,
) -> Result<bool, StoreError> {
    let count: i64 = match exclude_id {
        Some(id) => conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?1 AND id != ?2",
            (username, id),
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?1",
            [username],
            |row| row.get(0),
        )?,
    };
    Ok(count > 0)
}

fn email_exists(
    conn: &rusqlite::Connection,
    email: &str,
    exclude_id: Option<&str>,
) -> Result<bool, StoreError> {
    let count: i64 = match exclude_id {
        Some(id) => conn.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ?1 AND id != ?2",
            (email, id),
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ?1",
            [email],
            |row| row.get(0),
        )?,
    };
    Ok(count > 0)
}

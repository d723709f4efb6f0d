use super::error::unique_violation;
use super::records::{get_record, grant_exists};
use super::{DbConn, StoreError};
use crate::access;
use crate::models::ShareGrant;

/// A grant row joined with the grantee's username, for the share page.
#[derive(Clone, Debug)]
pub struct GrantRow {
    pub id: String,
    pub grantee_username: String,
    pub created_at: String,
}

/// One counterpart in a sharing relationship and how many records are involved.
#[derive(Clone, Debug)]
pub struct SharePartner {
    pub username: String,
    pub shared_records: i64,
}

/// Repository for share grants. Grants are created and revoked by the
/// record owner only and never outlive the record they point at.
pub struct ShareRepository {
    conn: DbConn,
}

impl ShareRepository {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }

    /// Grant `grantee_id` read access to a record owned by `acting_user`.
    pub fn grant(
        &self,
        record_id: &str,
        acting_user: &str,
        grantee_id: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let record = get_record(&conn, record_id)?.ok_or(StoreError::NotFound)?;
        if !access::can_modify(acting_user, &record.owner_id) {
            return Err(StoreError::Forbidden);
        }
        if grantee_id == record.owner_id {
            return Err(StoreError::Invalid(
                "You cannot share a record with yourself.".into(),
            ));
        }
        let grant = ShareGrant::new(record_id, &record.owner_id, grantee_id);
        conn.execute(
            r#"
            INSERT INTO share_grants (id, record_id, owner_id, grantee_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            (
                &grant.id,
                &grant.record_id,
                &grant.owner_id,
                &grant.grantee_id,
                &grant.created_at,
            ),
        )
        .map_err(|e| unique_violation(e, "This record is already shared with that user."))?;
        Ok(())
    }

    /// Revoke a grant. Only the owner of the underlying record may do so.
    pub fn revoke(&self, grant_id: &str, acting_user: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let owner_id: String = match conn
            .query_row(
                "SELECT owner_id FROM share_grants WHERE id = ?1",
                [grant_id],
                |row| row.get(0),
            ) {
            Ok(owner_id) => owner_id,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Err(StoreError::NotFound),
            Err(e) => return Err(e.into()),
        };
        if !access::can_modify(acting_user, &owner_id) {
            return Err(StoreError::Forbidden);
        }
        conn.execute("DELETE FROM share_grants WHERE id = ?1", [grant_id])?;
        Ok(())
    }

    /// Grants on one record, visible to its owner only.
    pub fn grants_for_record(
        &self,
        record_id: &str,
        acting_user: &str,
    ) -> Result<Vec<GrantRow>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let record = get_record(&conn, record_id)?.ok_or(StoreError::NotFound)?;
        if !access::can_modify(acting_user, &record.owner_id) {
            return Err(StoreError::Forbidden);
        }
        let mut stmt = conn.prepare(
            r#"
            SELECT g.id, u.username, g.created_at
            FROM share_grants g
            JOIN users u ON u.id = g.grantee_id
            WHERE g.record_id = ?1
            ORDER BY u.username
            "#,
        )?;
        let rows = stmt.query_map([record_id], |row| {
            Ok(GrantRow {
                id: row.get(0)?,
                grantee_username: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn has_grant(&self, record_id: &str, user_id: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();
        grant_exists(&conn, record_id, user_id)
    }

    /// Users this owner shares records with, with per-user counts.
    pub fn partners_of_owner(&self, owner_id: &str) -> Result<Vec<SharePartner>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT u.username, COUNT(*)
            FROM share_grants g
            JOIN users u ON u.id = g.grantee_id
            WHERE g.owner_id = ?1
            GROUP BY u.username
            ORDER BY u.username
            "#,
        )?;
        let rows = stmt.query_map([owner_id], |row| {
            Ok(SharePartner {
                username: row.get(0)?,
                shared_records: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Users sharing records with this grantee, with per-user counts.
    pub fn owners_sharing_with(&self, grantee_id: &str) -> Result<Vec<SharePartner>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT u.username, COUNT(*)
            FROM share_grants g
            JOIN users u ON u.id = g.owner_id
            WHERE g.grantee_id = ?1
            GROUP BY u.username
            ORDER BY u.username
            "#,
        )?;
        let rows = stmt.query_map([grantee_id], |row| {
            Ok(SharePartner {
                username: row.get(0)?,
                shared_records: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

use super::error::unique_violation;
use super::{DbConn, StoreError};
use crate::access;
use crate::models::{now_rfc3339, Record, RecordDetails, RecordKind};

/// Sort order for record listings. The query parameter follows the
/// usual convention of a leading `-` for descending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordSort {
    #[default]
    UpdatedDesc,
    UpdatedAsc,
    NameAsc,
    NameDesc,
    CreatedDesc,
    CreatedAsc,
}

impl RecordSort {
    /// Parse a `sort` query parameter. Unknown values fall back to the default.
    pub fn from_param(s: &str) -> RecordSort {
        match s {
            "-updated" => RecordSort::UpdatedDesc,
            "updated" => RecordSort::UpdatedAsc,
            "name" => RecordSort::NameAsc,
            "-name" => RecordSort::NameDesc,
            "-created" => RecordSort::CreatedDesc,
            "created" => RecordSort::CreatedAsc,
            _ => RecordSort::default(),
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            RecordSort::UpdatedDesc => "-updated",
            RecordSort::UpdatedAsc => "updated",
            RecordSort::NameAsc => "name",
            RecordSort::NameDesc => "-name",
            RecordSort::CreatedDesc => "-created",
            RecordSort::CreatedAsc => "created",
        }
    }

    fn order_clause(&self) -> &'static str {
        match self {
            RecordSort::UpdatedDesc => "updated_at DESC",
            RecordSort::UpdatedAsc => "updated_at ASC",
            RecordSort::NameAsc => "name COLLATE NOCASE ASC",
            RecordSort::NameDesc => "name COLLATE NOCASE DESC",
            RecordSort::CreatedDesc => "created_at DESC",
            RecordSort::CreatedAsc => "created_at ASC",
        }
    }
}

/// A record visible through a grant, paired with its owner's username.
#[derive(Clone, Debug)]
pub struct SharedRecord {
    pub record: Record,
    pub owner_username: String,
}

/// Repository for record rows. Reads take the viewing user and enforce
/// the ownership/grant rules; mutations accept the owner only.
pub struct RecordRepository {
    conn: DbConn,
}

impl RecordRepository {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &Record) -> Result<(), StoreError> {
        let message = format!(
            "You already have a {} named \"{}\".",
            record.kind.label().to_lowercase(),
            record.name
        );
        let details_json = serde_json::to_string(&record.details)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO records (id, owner_id, kind, name, notes, details_json, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            (
                &record.id,
                &record.owner_id,
                record.kind.as_str(),
                &record.name,
                &record.notes,
                &details_json,
                &record.created_at,
                &record.updated_at,
            ),
        )
        .map_err(|e| unique_violation(e, &message))?;
        Ok(())
    }

    /// Update name, notes and details. The kind of a record never changes.
    pub fn update(&self, record: &Record, acting_user: &str) -> Result<(), StoreError> {
        let message = format!(
            "You already have a {} named \"{}\".",
            record.kind.label().to_lowercase(),
            record.name
        );
        let details_json = serde_json::to_string(&record.details)?;
        let conn = self.conn.lock().unwrap();
        let existing = get_record(&conn, &record.id)?.ok_or(StoreError::NotFound)?;
        if !access::can_modify(acting_user, &existing.owner_id) {
            return Err(StoreError::Forbidden);
        }
        conn.execute(
            r#"
            UPDATE records
            SET name = ?1, notes = ?2, details_json = ?3, updated_at = ?4
            WHERE id = ?5
            "#,
            (
                &record.name,
                &record.notes,
                &details_json,
                now_rfc3339(),
                &record.id,
            ),
        )
        .map_err(|e| unique_violation(e, &message))?;
        Ok(())
    }

    /// Delete a record. Attachment rows and share grants go with it
    /// via the foreign-key cascades.
    pub fn delete(&self, id: &str, acting_user: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let existing = get_record(&conn, id)?.ok_or(StoreError::NotFound)?;
        if !access::can_modify(acting_user, &existing.owner_id) {
            return Err(StoreError::Forbidden);
        }
        conn.execute("DELETE FROM records WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Fetch a record for mutation. Only the owner gets it back.
    pub fn fetch_owned(&self, id: &str, acting_user: &str) -> Result<Record, StoreError> {
        let conn = self.conn.lock().unwrap();
        let record = get_record(&conn, id)?.ok_or(StoreError::NotFound)?;
        if !access::can_modify(acting_user, &record.owner_id) {
            return Err(StoreError::Forbidden);
        }
        Ok(record)
    }

    /// Fetch a record for viewing. Owners and grantees get it back.
    pub fn fetch_readable(&self, id: &str, viewer: &str) -> Result<Record, StoreError> {
        let conn = self.conn.lock().unwrap();
        let record = get_record(&conn, id)?.ok_or(StoreError::NotFound)?;
        let has_grant = grant_exists(&conn, id, viewer)?;
        if !access::can_read(viewer, &record.owner_id, has_grant) {
            return Err(StoreError::Forbidden);
        }
        Ok(record)
    }

    pub fn list_for_owner(
        &self,
        owner_id: &str,
        kind: Option<RecordKind>,
        sort: RecordSort,
    ) -> Result<Vec<Record>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let order = sort.order_clause();
        match kind {
            Some(kind) => {
                let sql = format!(
                    "{SELECT_RECORD} WHERE owner_id = ?1 AND kind = ?2 ORDER BY {order}"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map((owner_id, kind.as_str()), record_from_row)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
            }
            None => {
                let sql = format!("{SELECT_RECORD} WHERE owner_id = ?1 ORDER BY {order}");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([owner_id], record_from_row)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
            }
        }
    }

    /// Records other users have shared with `grantee_id`, ordered by owner
    /// username so the caller can group them per owner.
    pub fn list_shared_with(&self, grantee_id: &str) -> Result<Vec<SharedRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT r.id, r.owner_id, r.kind, r.name, r.notes, r.details_json,
                   r.created_at, r.updated_at, u.username
            FROM records r
            JOIN share_grants g ON g.record_id = r.id
            JOIN users u ON u.id = r.owner_id
            WHERE g.grantee_id = ?1
            ORDER BY u.username, r.updated_at DESC
            "#,
        )?;
        let rows = stmt.query_map([grantee_id], |row| {
            let record = record_from_row(row)?;
            let owner_username: String = row.get(8)?;
            Ok(SharedRecord {
                record,
                owner_username,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn count_for_owner(&self, owner_id: &str) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE owner_id = ?1",
            [owner_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

const SELECT_RECORD: &str = "SELECT id, owner_id, kind, name, notes, details_json, created_at, updated_at FROM records";

fn record_from_row(row: &rusqlite::Row) -> rusqlite::Result<Record> {
    let kind_str: String = row.get(2)?;
    let details_json: String = row.get(5)?;
    let kind = RecordKind::from_str(&kind_str).unwrap_or(RecordKind::Task);
    Ok(Record {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        kind,
        name: row.get(3)?,
        notes: row.get(4)?,
        details: serde_json::from_str(&details_json)
            .unwrap_or_else(|_| RecordDetails::empty_for(kind)),
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub(super) fn get_record(
    conn: &rusqlite::Connection,
    id: &str,
) -> Result<Option<Record>, StoreError> {
    let mut stmt = conn.prepare(&format!("{SELECT_RECORD} WHERE id = ?1"))?;
    let mut rows = stmt.query_map([id], record_from_row)?;
    match rows.next() {
        Some(row) => row.map(Some).map_err(Into::into),
        None => Ok(None),
    }
}

pub(super) fn grant_exists(
    conn: &rusqlite::Connection,
    record_id: &str,
    user_id: &str,
) -> Result<bool, StoreError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM share_grants WHERE record_id = ?1 AND grantee_id = ?2",
        (record_id, user_id),
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

use super::error::unique_violation;
use super::records::{get_record, grant_exists};
use super::{DbConn, StoreError};
use crate::access;
use crate::models::Attachment;

/// An attachment row joined with the name of the record it belongs to.
#[derive(Clone, Debug)]
pub struct AttachmentWithRecord {
    pub attachment: Attachment,
    pub record_name: String,
}

/// Repository for attachment rows. The file bytes live on disk; this
/// layer only tracks metadata and enforces who may see or remove a row.
pub struct AttachmentRepository {
    conn: DbConn,
}

impl AttachmentRepository {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }

    /// Insert a row for a freshly uploaded file. The acting user must own
    /// the record the file hangs off.
    pub fn insert(&self, attachment: &Attachment, acting_user: &str) -> Result<(), StoreError> {
        let message = format!(
            "You already have a file named \"{}\".",
            attachment.file_name
        );
        let conn = self.conn.lock().unwrap();
        let record = get_record(&conn, &attachment.record_id)?.ok_or(StoreError::NotFound)?;
        if !access::can_modify(acting_user, &record.owner_id) {
            return Err(StoreError::Forbidden);
        }
        conn.execute(
            r#"
            INSERT INTO attachments (id, owner_id, record_id, file_name, stored_path, content_type, size_bytes, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            (
                &attachment.id,
                &attachment.owner_id,
                &attachment.record_id,
                &attachment.file_name,
                &attachment.stored_path,
                &attachment.content_type,
                attachment.size_bytes,
                &attachment.note,
                &attachment.created_at,
            ),
        )
        .map_err(|e| unique_violation(e, &message))?;
        Ok(())
    }

    /// Fetch an attachment for mutation. Only the owner gets it back.
    pub fn fetch_owned(&self, id: &str, acting_user: &str) -> Result<Attachment, StoreError> {
        let conn = self.conn.lock().unwrap();
        let attachment = get_attachment(&conn, id)?.ok_or(StoreError::NotFound)?;
        if !access::can_modify(acting_user, &attachment.owner_id) {
            return Err(StoreError::Forbidden);
        }
        Ok(attachment)
    }

    /// Fetch an attachment for download. A grant on the parent record
    /// extends to its files.
    pub fn fetch_readable(&self, id: &str, viewer: &str) -> Result<Attachment, StoreError> {
        let conn = self.conn.lock().unwrap();
        let attachment = get_attachment(&conn, id)?.ok_or(StoreError::NotFound)?;
        let has_grant = grant_exists(&conn, &attachment.record_id, viewer)?;
        if !access::can_read(viewer, &attachment.owner_id, has_grant) {
            return Err(StoreError::Forbidden);
        }
        Ok(attachment)
    }

    pub fn list_for_owner(&self, owner_id: &str) -> Result<Vec<AttachmentWithRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT a.id, a.owner_id, a.record_id, a.file_name, a.stored_path,
                   a.content_type, a.size_bytes, a.note, a.created_at, r.name
            FROM attachments a
            JOIN records r ON r.id = a.record_id
            WHERE a.owner_id = ?1
            ORDER BY a.created_at DESC
            "#,
        )?;
        let rows = stmt.query_map([owner_id], |row| {
            let attachment = attachment_from_row(row)?;
            let record_name: String = row.get(9)?;
            Ok(AttachmentWithRecord {
                attachment,
                record_name,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Attachments of one record. Callers check record visibility first.
    pub fn list_for_record(&self, record_id: &str) -> Result<Vec<Attachment>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare(&format!("{SELECT_ATTACHMENT} WHERE record_id = ?1 ORDER BY created_at DESC"))?;
        let rows = stmt.query_map([record_id], attachment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Remove the row and hand the caller the metadata so it can delete
    /// the file on disk as well.
    pub fn delete(&self, id: &str, acting_user: &str) -> Result<Attachment, StoreError> {
        let conn = self.conn.lock().unwrap();
        let attachment = get_attachment(&conn, id)?.ok_or(StoreError::NotFound)?;
        if !access::can_modify(acting_user, &attachment.owner_id) {
            return Err(StoreError::Forbidden);
        }
        conn.execute("DELETE FROM attachments WHERE id = ?1", [id])?;
        Ok(attachment)
    }

    pub fn count_for_owner(&self, owner_id: &str) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM attachments WHERE owner_id = ?1",
            [owner_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

const SELECT_ATTACHMENT: &str = "SELECT id, owner_id, record_id, file_name, stored_path, content_type, size_bytes, note, created_at FROM attachments";

fn attachment_from_row(row: &rusqlite::Row) -> rusqlite::Result<Attachment> {
    Ok(Attachment {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        record_id: row.get(2)?,
        file_name: row.get(3)?,
        stored_path: row.get(4)?,
        content_type: row.get(5)?,
        size_bytes: row.get(6)?,
        note: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn get_attachment(
    conn: &rusqlite::Connection,
    id: &str,
) -> Result<Option<Attachment>, StoreError> {
    let mut stmt = conn.prepare(&format!("{SELECT_ATTACHMENT} WHERE id = ?1"))?;
    let mut rows = stmt.query_map([id], attachment_from_row)?;
    match rows.next() {
        Some(row) => row.map(Some).map_err(Into::into),
        None => Ok(None),
    }
}

//! SQLite-backed persistence for users, records, attachments and share grants.
//!
//! Every read and mutation that touches another user's data goes through the
//! ownership checks in the individual repositories; handlers never run raw SQL.

mod attachments;
mod database;
mod error;
mod records;
mod shares;
mod users;

pub use attachments::{AttachmentRepository, AttachmentWithRecord};
pub use database::Database;
pub use error::StoreError;
pub use records::{RecordRepository, RecordSort, SharedRecord};
pub use shares::{GrantRow, SharePartner, ShareRepository};
pub use users::UserRepository;

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub(crate) type DbConn = Arc<Mutex<Connection>>;

pub mod attachments;
pub mod auth;
pub mod export;
pub mod helpers;
pub mod middleware;
pub mod profile;
pub mod records;
pub mod shares;

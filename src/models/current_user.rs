use serde::{Deserialize, Serialize};

/// The authenticated user attached to templates and the injected page context.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
}

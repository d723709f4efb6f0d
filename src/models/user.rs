use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. Optional profile fields default to empty strings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Stored lowercase; unique.
    pub username: String,
    /// Unique.
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub city: String,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn new(username: &str, email: &str, password_hash: &str) -> User {
        let now = super::now_rfc3339();
        User {
            id: Uuid::new_v4().to_string(),
            username: username.trim().to_lowercase(),
            email: email.trim().to_string(),
            password_hash: password_hash.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            phone: String::new(),
            city: String::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// "First Last (username)" when names are present, else the username.
    pub fn display_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {} ({})", self.first_name, self.last_name, self.username),
            (false, true) => format!("{} ({})", self.first_name, self.username),
            (true, false) => format!("{} ({})", self.last_name, self.username),
            (true, true) => self.username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_normalizes_username() {
        let user = User::new("  AnnaNowak1  ", "anna@example.com", "hash");
        assert_eq!(user.username, "annanowak1");
    }

    #[test]
    fn display_name_prefers_full_name() {
        let mut user = User::new("annanowak1", "anna@example.com", "hash");
        assert_eq!(user.display_name(), "annanowak1");
        user.first_name = "Anna".into();
        user.last_name = "Nowak".into();
        assert_eq!(user.display_name(), "Anna Nowak (annanowak1)");
    }
}

//! The ownership-plus-grant access rule, kept free of storage and web types
//! so the store can evaluate it on every read and mutation.

/// A user may read a record they own, or one that carries a share grant
/// naming them as grantee.
pub fn can_read(user_id: &str, owner_id: &str, has_grant: bool) -> bool {
    user_id == owner_id || has_grant
}

/// Updates and deletes are owner-only; a grant never confers write access.
pub fn can_modify(user_id: &str, owner_id: &str) -> bool {
    user_id == owner_id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_can_always_read() {
        assert!(can_read("u1", "u1", false));
        assert!(can_read("u1", "u1", true));
    }

    #[test]
    fn stranger_without_grant_cannot_read() {
        assert!(!can_read("u2", "u1", false));
    }

    #[test]
    fn grantee_can_read() {
        assert!(can_read("u2", "u1", true));
    }

    #[test]
    fn only_owner_can_modify() {
        assert!(can_modify("u1", "u1"));
        assert!(!can_modify("u2", "u1"));
    }
}

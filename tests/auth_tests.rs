use keepsake::auth;

#[test]
fn password_hash_verifies_roundtrip() {
    let hash = auth::generate_password_hash("correct horse battery");
    assert!(auth::verify_password(&hash, "correct horse battery"));
    assert!(!auth::verify_password(&hash, "wrong password"));
}

#[test]
fn password_hash_has_expected_shape() {
    let hash = auth::generate_password_hash("secret-enough");
    assert!(hash.starts_with("pbkdf2:sha256:"));
    let rest = hash.strip_prefix("pbkdf2:sha256:").unwrap();
    let parts: Vec<&str> = rest.split('$').collect();
    assert_eq!(parts.len(), 3);
    assert!(parts[0].parse::<u32>().is_ok());
    // 12 salt bytes and a 32-byte digest, hex encoded.
    assert_eq!(parts[1].len(), 24);
    assert_eq!(parts[2].len(), 64);
}

#[test]
fn two_hashes_of_the_same_password_differ() {
    let a = auth::generate_password_hash("secret-enough");
    let b = auth::generate_password_hash("secret-enough");
    assert_ne!(a, b);
    assert!(auth::verify_password(&a, "secret-enough"));
    assert!(auth::verify_password(&b, "secret-enough"));
}

#[test]
fn malformed_stored_hash_never_verifies() {
    assert!(!auth::verify_password("", "anything"));
    assert!(!auth::verify_password("plaintext", "plaintext"));
    assert!(!auth::verify_password("pbkdf2:sha256:abc$def", "anything"));
    assert!(!auth::verify_password("pbkdf2:sha256:notanumber$salt$hash", "anything"));
}

#[test]
fn session_ids_are_unique_hex() {
    let a = auth::random_session_id();
    let b = auth::random_session_id();
    assert_ne!(a, b);
    assert_eq!(a.len(), 32);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn username_rules() {
    assert!(auth::validate_username("annanowak1").is_ok());
    assert!(auth::validate_username("anna.nowak+1@home").is_ok());
    assert!(auth::validate_username("short").is_err());
    assert!(auth::validate_username("has spaces here").is_err());
    assert!(auth::validate_username("semi;colons;bad").is_err());
}

#[test]
fn email_rules() {
    assert!(auth::validate_email("anna@example.com").is_ok());
    assert!(auth::validate_email("  anna@example.com  ").is_ok());
    assert!(auth::validate_email("not-an-email").is_err());
    assert!(auth::validate_email("anna@nodot").is_err());
    assert!(auth::validate_email("@example.com").is_err());
}

#[test]
fn password_rules() {
    assert!(auth::validate_password("12345678").is_ok());
    assert!(auth::validate_password("1234567").is_err());
}

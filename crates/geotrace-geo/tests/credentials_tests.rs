use geotrace_geo::{CredentialError, Credentials};
use std::fs;
use tempfile::tempdir;

#[test]
fn loads_trimmed_token() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("token.json");
    fs::write(&path, r#"{"token": " abc123 "}"#).unwrap();

    let creds = Credentials::load(&path).unwrap();
    assert_eq!(creds.token(), "abc123");
    assert!(!format!("{creds:?}").contains("abc123"));
}

#[test]
fn missing_file_is_unreadable() {
    let dir = tempdir().unwrap();
    let err = Credentials::load(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, CredentialError::Unreadable { .. }));
}

#[test]
fn wrong_shape_is_malformed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("token.json");
    fs::write(&path, r#"{"api_key": "abc"}"#).unwrap();

    let err = Credentials::load(&path).unwrap_err();
    assert!(matches!(err, CredentialError::Malformed { .. }));
}

#[test]
fn blank_token_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("token.json");
    fs::write(&path, r#"{"token": "   "}"#).unwrap();

    let err = Credentials::load(&path).unwrap_err();
    assert!(matches!(err, CredentialError::EmptyToken(_)));
}

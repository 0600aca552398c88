use super::*;
use crate::dialect::Dialect;

#[test]
fn test_mask_string_and_number_literals() {
    let config = Dialect::Ansi.config();
    assert_eq!(
        mask_query("SELECT * FROM t WHERE a = 'abc' AND b > 42", config),
        "SELECT * FROM t WHERE a = ? AND b > ?"
    );
}

#[test]
fn test_mask_keeps_identifiers_with_digits() {
    let config = Dialect::Ansi.config();
    assert_eq!(
        mask_query("SELECT col1 FROM t2 WHERE \"x1\" = 1.5", config),
        "SELECT col1 FROM t2 WHERE \"x1\" = ?"
    );
}

#[test]
fn test_queries_differing_by_literals_share_hash() {
    let config = Dialect::Postgres.config();
    let first = mask_query("SELECT * FROM users WHERE id = 7", config);
    let second = mask_query("SELECT * FROM users WHERE id = 1234", config);
    assert_eq!(first, second);
    assert_eq!(query_hash(&first), query_hash(&second));

    let other = mask_query("SELECT * FROM orders WHERE id = 7", config);
    assert_ne!(query_hash(&first), query_hash(&other));
}

#[test]
fn test_query_hash_is_sha256_hex() {
    let hash = query_hash("SELECT 1");
    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(
        query_hash(""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn test_regex_fallback_masking() {
    assert_eq!(
        mask_with_regex("select 'it''s', 10, t1.c from t1"),
        "select ?, ?, t1.c from t1"
    );
}

#[test]
fn test_unterminated_string_uses_fallback() {
    let config = Dialect::Ansi.config();
    assert_eq!(mask_query("select 42 from t where a = 'oops", config), "select ? from t where a = 'oops");
}

#[test]
fn test_split_statements() {
    let config = Dialect::Ansi.config();
    let statements = split_statements(
        "SELECT ';' FROM a;\n-- trailing; comment\nINSERT INTO b SELECT * FROM a;\n;  ",
        config,
    )
    .unwrap();
    assert_eq!(
        statements,
        vec![
            "SELECT ';' FROM a".to_string(),
            "-- trailing; comment\nINSERT INTO b SELECT * FROM a".to_string(),
        ]
    );
}

#[test]
fn test_split_statements_tokenize_error() {
    let config = Dialect::Ansi.config();
    let err = split_statements("SELECT 'unterminated", config).unwrap_err();
    assert!(matches!(err, LineageError::Tokenize(_)));
}

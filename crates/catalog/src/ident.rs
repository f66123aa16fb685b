//! Lexical validation for database, table and column names.

use common::{DbError, DbResult, IdentifierIssue, IdentifierKind};

/// Checks `name` against the identifier rules.
///
/// A valid identifier is non-empty, at most `max_len` bytes, starts with an
/// ASCII letter or underscore and continues with ASCII letters, digits or
/// underscores only. Names made only of whitespace are reported as blank.
pub fn validate_identifier(name: &str, kind: IdentifierKind, max_len: usize) -> DbResult<()> {
    check(name, max_len).map_err(|issue| DbError::invalid_identifier(kind, name, issue))
}

fn check(name: &str, max_len: usize) -> Result<(), IdentifierIssue> {
    if name.is_empty() {
        return Err(IdentifierIssue::Empty);
    }
    if name.len() > max_len {
        return Err(IdentifierIssue::TooLong {
            len: name.len(),
            max: max_len,
        });
    }
    if name.chars().all(char::is_whitespace) {
        return Err(IdentifierIssue::Blank);
    }

    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(IdentifierIssue::InvalidStart(first));
        }
    }
    match chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        Some(bad) => Err(IdentifierIssue::InvalidCharacter(bad)),
        None => Ok(()),
    }
}

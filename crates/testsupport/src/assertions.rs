//! Assertion helpers keyed on error kind.
//!
//! Tests should branch on the structured error, not on message text; these
//! helpers panic with the actual result when the kind does not match.

use std::fmt::Debug;

use common::{ConflictError, DbError, DbResult, IdentifierIssue, SchemaError};

/// Assert that a result failed with an error whose message contains `needle`.
pub fn assert_error_contains<T: Debug>(result: DbResult<T>, needle: &str) {
    match result {
        Ok(value) => panic!("expected error containing '{needle}', got Ok({value:?})"),
        Err(err) => {
            let message = err.to_string();
            assert!(
                message.contains(needle),
                "error '{message}' does not contain '{needle}'"
            );
        }
    }
}

pub fn assert_already_exists<T: Debug>(result: DbResult<T>) {
    match result {
        Err(DbError::Conflict(ConflictError::AlreadyExists { .. })) => {}
        other => panic!("expected AlreadyExists, got {other:?}"),
    }
}

pub fn assert_not_found<T: Debug>(result: DbResult<T>) {
    match result {
        Err(DbError::Conflict(ConflictError::NotFound { .. })) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

pub fn assert_invalid_mode<T: Debug>(result: DbResult<T>) {
    match result {
        Err(DbError::Conflict(ConflictError::InvalidMode { .. })) => {}
        other => panic!("expected InvalidMode, got {other:?}"),
    }
}

pub fn assert_invalid_identifier<T: Debug>(result: DbResult<T>) {
    match result {
        Err(DbError::InvalidIdentifier { .. }) => {}
        other => panic!("expected InvalidIdentifier, got {other:?}"),
    }
}

pub fn assert_name_too_long<T: Debug>(result: DbResult<T>) {
    match result {
        Err(DbError::InvalidIdentifier {
            issue: IdentifierIssue::TooLong { .. },
            ..
        }) => {}
        other => panic!("expected TooLong, got {other:?}"),
    }
}

pub fn assert_schema_error<T: Debug>(result: DbResult<T>, expected: SchemaError) {
    match result {
        Err(DbError::Schema(actual)) => pretty_assertions::assert_eq!(actual, expected),
        other => panic!("expected schema error {expected:?}, got {other:?}"),
    }
}

pub fn assert_unknown_type<T: Debug>(result: DbResult<T>) {
    match result {
        Err(DbError::UnknownType { .. }) => {}
        other => panic!("expected UnknownType, got {other:?}"),
    }
}

/// Assert that the rendered error is short enough to log, whatever the input.
pub fn assert_message_bounded(err: &DbError, max: usize) {
    let message = err.to_string();
    assert!(
        message.len() <= max,
        "error message is {} bytes (max {max}): {}...",
        message.len(),
        &message[..message.char_indices().nth(80).map_or(message.len(), |(i, _)| i)]
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ObjectKind;

    #[test]
    fn matching_kinds_pass() {
        assert_already_exists::<()>(Err(
            ConflictError::already_exists(ObjectKind::Table, "t").into()
        ));
        assert_not_found::<()>(Err(ConflictError::not_found(ObjectKind::Table, "t").into()));
        assert_invalid_mode::<()>(Err(ConflictError::invalid_mode("bad").into()));
        assert_schema_error::<()>(Err(SchemaError::Empty.into()), SchemaError::Empty);
        assert_error_contains::<()>(Err(DbError::Storage("disk gone".into())), "disk");
    }

    #[test]
    #[should_panic(expected = "expected AlreadyExists")]
    fn mismatched_kind_panics() {
        assert_already_exists(Ok(1));
    }
}

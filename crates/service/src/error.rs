//! Error mapping from catalog failures to protocol error codes.

use common::{ConflictError, DbError, IdentifierIssue, ObjectKind};
use protocol::ErrorCode;

/// Map a catalog error to a protocol error code.
///
/// Errors that are not a `DbError` map to `ErrorCode::Unknown`.
pub fn map_error_to_code(err: &anyhow::Error) -> ErrorCode {
    match err.downcast_ref::<DbError>() {
        Some(db_err) => map_db_error(db_err),
        None => match err.downcast_ref::<ConflictError>() {
            Some(conflict) => map_conflict(conflict),
            None => ErrorCode::Unknown,
        },
    }
}

fn map_db_error(err: &DbError) -> ErrorCode {
    match err {
        DbError::InvalidIdentifier {
            issue: IdentifierIssue::TooLong { .. },
            ..
        } => ErrorCode::NameTooLong,
        DbError::InvalidIdentifier { .. } => ErrorCode::InvalidIdentifier,
        DbError::UnknownType { .. } => ErrorCode::UnknownType,
        DbError::Schema(_) => ErrorCode::InvalidSchema,
        DbError::Conflict(conflict) => map_conflict(conflict),
        DbError::ProtectedDatabase(_) => ErrorCode::ProtectedDatabase,
        DbError::Storage(_) => ErrorCode::StorageError,
        DbError::Io(_) => ErrorCode::IoError,
        DbError::Catalog(_) => ErrorCode::Unknown,
    }
}

fn map_conflict(err: &ConflictError) -> ErrorCode {
    match err {
        ConflictError::AlreadyExists {
            kind: ObjectKind::Database,
            ..
        } => ErrorCode::DuplicateDatabase,
        ConflictError::AlreadyExists {
            kind: ObjectKind::Table,
            ..
        } => ErrorCode::DuplicateTable,
        ConflictError::NotFound {
            kind: ObjectKind::Database,
            ..
        } => ErrorCode::DatabaseNotFound,
        ConflictError::NotFound {
            kind: ObjectKind::Table,
            ..
        } => ErrorCode::TableNotFound,
        ConflictError::InvalidMode { .. } => ErrorCode::InvalidConflictType,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use common::{IdentifierKind, SchemaError};
    use types::TypeError;

    fn code_of(err: DbError) -> i32 {
        map_error_to_code(&anyhow!(err)).code()
    }

    #[test]
    fn identifier_errors() {
        assert_eq!(
            code_of(DbError::invalid_identifier(
                IdentifierKind::Table,
                "1abc",
                IdentifierIssue::InvalidStart('1')
            )),
            3003
        );
        assert_eq!(
            code_of(DbError::invalid_identifier(
                IdentifierKind::Database,
                "aaaa",
                IdentifierIssue::TooLong { len: 4, max: 3 }
            )),
            3011
        );
    }

    #[test]
    fn schema_and_type_errors() {
        assert_eq!(code_of(SchemaError::Empty.into()), 3007);
        assert_eq!(
            code_of(DbError::unknown_type("c1", TypeError::Unknown("decimal".into()))),
            3032
        );
    }

    #[test]
    fn conflict_errors() {
        assert_eq!(
            code_of(ConflictError::already_exists(ObjectKind::Table, "t").into()),
            3017
        );
        assert_eq!(
            code_of(ConflictError::already_exists(ObjectKind::Database, "d").into()),
            3016
        );
        assert_eq!(
            code_of(ConflictError::not_found(ObjectKind::Table, "t").into()),
            3022
        );
        assert_eq!(
            code_of(ConflictError::not_found(ObjectKind::Database, "d").into()),
            3021
        );
        assert_eq!(code_of(ConflictError::invalid_mode("nope").into()), 3066);
    }

    #[test]
    fn bare_conflict_error_is_recognised() {
        let err = anyhow!(ConflictError::invalid_mode("nope"));
        assert_eq!(map_error_to_code(&err), ErrorCode::InvalidConflictType);
    }

    #[test]
    fn collaborator_errors() {
        assert_eq!(code_of(DbError::ProtectedDatabase("default".into())), 3071);
        assert_eq!(code_of(DbError::Storage("disk gone".into())), 7001);
        assert_eq!(code_of(DbError::Io(std::io::Error::other("disk full"))), 7002);
    }

    #[test]
    fn unknown_errors() {
        let err = anyhow!("some other error");
        assert_eq!(map_error_to_code(&err), ErrorCode::Unknown);
        assert_eq!(code_of(DbError::Catalog("corrupt".into())), 9999);
    }
}

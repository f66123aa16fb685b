//! Integration tests demonstrating testsupport usage.

use catalog::ConflictMode;
use common::{DbError, SchemaError};
use testsupport::{columns, prelude::*, test_catalog};

#[test]
fn macro_builds_tables() {
    test_catalog!(ctx, tables: {
        "users" => ["id" => "int64, primary key", "name" => "varchar"],
        "events" => ["at" => "int64", "payload" => "vector, 16, float"],
    });
    let db = ctx.default_database();
    let names: Vec<_> = db.list_tables().into_iter().map(|row| row.table).collect();
    assert_eq!(names, vec!["events".to_string(), "users".to_string()]);
    assert_eq!(ctx.storage().live_tables(), 2);
}

#[test]
fn invalid_names_are_rejected_everywhere() {
    test_catalog!(ctx);
    let db = ctx.default_database();
    for name in invalid_names() {
        assert_invalid_identifier(db.create_table(
            &name,
            Some(&sample_columns()),
            ConflictMode::Error,
        ));
        assert_invalid_identifier(db.drop_table(&name, ConflictMode::Ignore));
        assert_invalid_identifier(ctx.catalog().create_database(&name, ConflictMode::Error));
        let bad_column = columns![name.as_str() => "int"];
        assert_invalid_identifier(db.create_table("t", Some(&bad_column), ConflictMode::Error));
    }
    assert_eq!(db.table_count(), 0);
}

#[test]
fn malformed_conflict_args_never_parse() {
    for arg in malformed_conflict_args() {
        let err = ConflictMode::from_arg(Some(&arg)).unwrap_err();
        assert_message_bounded(&DbError::from(err), 200);
    }
}

#[test]
fn schema_failures_are_typed() {
    test_catalog!(ctx);
    let db = ctx.default_database();
    assert_schema_error(db.create_table("t", None, ConflictMode::Error), SchemaError::Empty);
    assert_schema_error(db.create_table("t", Some(&[]), ConflictMode::Error), SchemaError::Empty);
    let zero_dimension = columns!["c" => "vector,0,float"];
    assert_unknown_type(db.create_table("t", Some(&zero_dimension), ConflictMode::Error));
    assert_error_contains(
        db.create_table(
            "t",
            Some(&columns!["a" => "int, primary key", "b" => "int, primary key"]),
            ConflictMode::Error,
        ),
        "primary key",
    );
}

#[test]
fn deallocation_failure_keeps_the_table() {
    test_catalog!(ctx, tables: { "t" => ["c" => "int"] });
    let db = ctx.default_database();
    ctx.storage().fail_deallocations(true);
    assert_error_contains(db.drop_table("t", ConflictMode::Error), "injected");
    assert!(db.contains("t"));

    ctx.storage().fail_deallocations(false);
    db.drop_table("t", ConflictMode::Error).unwrap();
    assert_not_found(db.get_table("t"));
}

#[test]
fn replace_with_failing_release_keeps_the_old_entry() {
    test_catalog!(ctx, tables: { "t" => ["old" => "int"] });
    let db = ctx.default_database();
    let before = db.get_table("t").unwrap();

    ctx.storage().fail_deallocations(true);
    assert!(db
        .create_table("t", Some(&columns!["new" => "varchar"]), ConflictMode::Replace)
        .is_err());
    ctx.storage().fail_deallocations(false);

    let after = db.get_table("t").unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.schema.columns[0].name, "old");
    assert!(ctx.storage().is_live(before.storage));
}

#[test]
fn overlong_names_report_too_long() {
    let config = common::Config::builder().max_identifier_len(8).build();
    let ctx = TestCatalog::with_config(config).unwrap();
    assert_name_too_long(
        ctx.default_database()
            .create_table("nine_char", Some(&sample_columns()), ConflictMode::Error),
    );
}

#[test]
fn wide_tables_from_fixtures() {
    test_catalog!(ctx);
    let db = ctx.default_database();
    db.create_table("wide", Some(&mixed_columns(2_000)), ConflictMode::Error)
        .unwrap();
    assert_eq!(db.show_columns("wide").unwrap().len(), 2_000);
    let reloaded = ctx.reload().unwrap();
    let wide = reloaded.default_database().unwrap().get_table("wide").unwrap();
    assert_eq!(wide.column_count(), 2_000);
}

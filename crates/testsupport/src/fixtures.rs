//! Common column lists and request builders.

use catalog::ConflictArg;
use protocol::CatalogRequest;

/// Every scalar spelling the type registry accepts.
pub const SCALAR_SPECS: [&str; 19] = [
    "int", "int8", "tinyint", "int16", "smallint", "int32", "integer", "int64", "bigint",
    "int128", "hugeint", "float", "float32", "real", "double", "float64", "varchar", "string",
    "bool",
];

/// Build a column list from `(name, spec)` pairs.
pub fn specs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(name, spec)| (name.to_string(), spec.to_string()))
        .collect()
}

/// Three columns: an int64 primary key, a varchar and a float vector.
pub fn sample_columns() -> Vec<(String, String)> {
    specs(&[
        ("id", "int64, primary key"),
        ("name", "varchar"),
        ("embedding", "vector,128,float"),
    ])
}

/// `count` columns named `c0..` cycling through the scalar specs.
pub fn mixed_columns(count: usize) -> Vec<(String, String)> {
    (0..count)
        .map(|i| (format!("c{i}"), SCALAR_SPECS[i % SCALAR_SPECS.len()].to_string()))
        .collect()
}

pub fn create_table_request(
    database: &str,
    table: &str,
    columns: Option<Vec<(String, String)>>,
    conflict: Option<ConflictArg>,
) -> CatalogRequest {
    CatalogRequest::CreateTable {
        database: database.to_string(),
        table: table.to_string(),
        columns,
        conflict,
    }
}

pub fn drop_table_request(
    database: &str,
    table: &str,
    conflict: Option<ConflictArg>,
) -> CatalogRequest {
    CatalogRequest::DropTable {
        database: database.to_string(),
        table: table.to_string(),
        conflict,
    }
}

/// Conflict arguments that must be rejected by every operation.
pub fn malformed_conflict_args() -> Vec<ConflictArg> {
    vec![
        ConflictArg::Null,
        ConflictArg::Int(3),
        ConflictArg::Int(-1),
        ConflictArg::Int(i64::MAX),
        ConflictArg::Float(1.1),
        ConflictArg::Bool(false),
        ConflictArg::Text(String::new()),
        ConflictArg::Text("#@$@!%string".to_string()),
        ConflictArg::Text("数据库名".to_string()),
        ConflictArg::List(vec![ConflictArg::Int(0)]),
        ConflictArg::Map(vec![("mode".to_string(), ConflictArg::Int(0))]),
    ]
}

/// Names the identifier validator must reject.
pub fn invalid_names() -> Vec<String> {
    vec![
        String::new(),
        " ".to_string(),
        "12-s".to_string(),
        "12 s".to_string(),
        "(mn)".to_string(),
        "中文".to_string(),
        "%$#".to_string(),
        "a".repeat(65_536),
    ]
}

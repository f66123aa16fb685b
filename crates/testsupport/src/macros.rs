//! Test setup macros for reducing boilerplate across the catalog test suite.

/// Creates a [`TestCatalog`](crate::context::TestCatalog) with tables already
/// created in the default database.
///
/// # Syntax
///
/// ```text
/// test_catalog!(ctx_var)
/// test_catalog!(ctx_var, tables: { "name" => ["col" => "spec", ...], ... })
/// ```
///
/// # Examples
///
/// ```
/// use testsupport::test_catalog;
///
/// test_catalog!(ctx, tables: {
///     "users" => ["id" => "int64, primary key", "name" => "varchar"],
///     "events" => ["at" => "int64"],
/// });
/// assert_eq!(ctx.default_database().table_count(), 2);
/// ```
#[macro_export]
macro_rules! test_catalog {
    ($ctx:ident) => {
        let $ctx = $crate::context::TestCatalog::new().expect("failed to create test catalog");
    };
    (
        $ctx:ident,
        tables: { $($table:literal => [$($col:literal => $spec:literal),* $(,)?]),* $(,)? }
    ) => {
        let $ctx = $crate::context::TestCatalog::new().expect("failed to create test catalog");
        {
            let db = $ctx.default_database();
            $(
                db.create_table(
                    $table,
                    Some(&$crate::fixtures::specs(&[$(($col, $spec)),*])),
                    $crate::__private::ConflictMode::Error,
                )
                .expect(concat!("failed to create table ", $table));
            )*
        }
    };
}

/// Builds a `Vec<(String, String)>` column list from `name => spec` pairs.
///
/// ```
/// use testsupport::columns;
///
/// let cols = columns!["id" => "int, primary key", "v" => "vector,3,float"];
/// assert_eq!(cols[1].1, "vector,3,float");
/// ```
#[macro_export]
macro_rules! columns {
    ($($col:expr => $spec:expr),* $(,)?) => {
        vec![$(($col.to_string(), $spec.to_string())),*]
    };
}

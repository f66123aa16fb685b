//! Test support utilities for the catalog workspace.
//!
//! This crate provides testing infrastructure including:
//! - Isolated catalogs backed by a temporary directory
//! - A storage engine that fails on demand, for error-path tests
//! - Common column fixtures and request builders
//! - Property-based generators for identifiers and type specs
//! - Assertion helpers keyed on error kind
//!
//! # Example Usage
//!
//! ```
//! use testsupport::prelude::*;
//! use catalog::ConflictMode;
//!
//! let ctx = TestCatalog::new().unwrap();
//! let db = ctx.default_database();
//! db.create_table("users", Some(&sample_columns()), ConflictMode::Error).unwrap();
//! assert_already_exists(db.create_table("users", Some(&sample_columns()), ConflictMode::Error));
//! ```

pub mod assertions;
pub mod context;
pub mod fixtures;
mod macros;
pub mod proptest_generators;

/// Convenient re-exports for common testing patterns.
pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::context::*;
    pub use crate::fixtures::*;
}

#[doc(hidden)]
pub mod __private {
    pub use catalog::ConflictMode;
}

//! Property-based test generators using proptest.

use proptest::prelude::*;

use crate::fixtures::SCALAR_SPECS;

/// Names the identifier validator accepts: ASCII letter or `_`, then
/// letters, digits and `_`.
pub fn arb_valid_identifier() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,63}"
}

/// Names the identifier validator rejects.
pub fn arb_invalid_identifier() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[ \t]{1,8}",
        "[0-9][A-Za-z0-9_]{0,16}",
        "[A-Za-z_]{1,8}[-. $#@%()]{1,4}[A-Za-z0-9_]{0,8}",
        "[\u{4e00}-\u{4fff}]{1,8}",
    ]
}

/// Scalar type spellings, in any letter case, with surrounding spaces.
pub fn arb_scalar_spec() -> impl Strategy<Value = String> {
    (prop::sample::select(SCALAR_SPECS.to_vec()), any::<bool>(), " {0,2}").prop_map(
        |(spec, upper, pad)| {
            let spec = if upper { spec.to_ascii_uppercase() } else { spec.to_string() };
            format!("{pad}{spec}{pad}")
        },
    )
}

/// Vector specs with a valid dimension and scalar element.
pub fn arb_vector_spec(max_dimension: u32) -> impl Strategy<Value = String> {
    (1..=max_dimension, prop::sample::select(SCALAR_SPECS.to_vec()))
        .prop_map(|(dim, element)| format!("vector, {dim}, {element}"))
}

/// A column list with distinct names and at most one primary key.
pub fn arb_column_list(max_len: usize) -> impl Strategy<Value = Vec<(String, String)>> {
    (
        prop::collection::btree_set(arb_valid_identifier(), 1..=max_len),
        prop::collection::vec(arb_scalar_spec(), max_len),
        prop::option::of(0..max_len),
    )
        .prop_map(|(names, types, pk)| {
            names
                .into_iter()
                .zip(types)
                .enumerate()
                .map(|(i, (name, ty))| {
                    let ty = if pk == Some(i) { format!("{ty}, primary key") } else { ty };
                    (name, ty)
                })
                .collect()
        })
}

//! Column types supported by the catalog and the registry that parses
//! user-supplied type specifications such as `"int"` or `"vector, 128, float"`.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Largest vector dimension accepted by a default registry.
pub const DEFAULT_MAX_VECTOR_DIMENSION: u32 = 65_536;

#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ColumnType {
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    Float32,
    Float64,
    Varchar,
    Bool,
    Vector {
        element: Box<ColumnType>,
        dimension: u32,
    },
}

impl ColumnType {
    pub fn vector(element: ColumnType, dimension: u32) -> Self {
        ColumnType::Vector {
            element: Box::new(element),
            dimension,
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, ColumnType::Vector { .. })
    }

    /// Canonical lowercase name, without vector parameters.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Int8 => "int8",
            ColumnType::Int16 => "int16",
            ColumnType::Int32 => "int32",
            ColumnType::Int64 => "int64",
            ColumnType::Int128 => "int128",
            ColumnType::Float32 => "float32",
            ColumnType::Float64 => "float64",
            ColumnType::Varchar => "varchar",
            ColumnType::Bool => "bool",
            ColumnType::Vector { .. } => "vector",
        }
    }

    fn from_alias(token: &str) -> Option<Self> {
        let ty = match token {
            "int8" | "tinyint" => ColumnType::Int8,
            "int16" | "smallint" => ColumnType::Int16,
            "int" | "int32" | "integer" => ColumnType::Int32,
            "int64" | "bigint" => ColumnType::Int64,
            "int128" | "hugeint" => ColumnType::Int128,
            "float" | "float32" | "real" => ColumnType::Float32,
            "double" | "float64" => ColumnType::Float64,
            "varchar" | "string" => ColumnType::Varchar,
            "bool" | "boolean" => ColumnType::Bool,
            _ => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Vector { element, dimension } => {
                write!(f, "vector,{dimension},{element}")
            }
            scalar => f.write_str(scalar.name()),
        }
    }
}

impl FromStr for ColumnType {
    type Err = TypeError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        TypeRegistry::default().resolve(spec)
    }
}

/// Reasons a type specification can be rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown type '{0}'")]
    Unknown(String),
    #[error("malformed vector type '{spec}': {reason}")]
    MalformedVector { spec: String, reason: &'static str },
    #[error("vector dimension {dimension} is out of range 1..={max}")]
    InvalidDimension { dimension: i64, max: u32 },
    #[error("vector element type must be a scalar, got '{0}'")]
    NestedVector(String),
}

/// Resolves type specifications against the fixed alias table.
///
/// Scalars are a single case-insensitive token. Vectors are written as the
/// comma separated triple `vector, <dimension>, <element_type>`.
#[derive(Clone, Copy, Debug)]
pub struct TypeRegistry {
    max_vector_dimension: u32,
}

impl TypeRegistry {
    pub fn new(max_vector_dimension: u32) -> Self {
        Self {
            max_vector_dimension,
        }
    }

    pub fn max_vector_dimension(&self) -> u32 {
        self.max_vector_dimension
    }

    pub fn resolve(&self, spec: &str) -> Result<ColumnType, TypeError> {
        let tokens: Vec<&str> = spec.split(',').map(str::trim).collect();
        let head = tokens[0].to_ascii_lowercase();

        if head == "vector" {
            return self.resolve_vector(spec, &tokens);
        }
        if tokens.len() > 1 {
            return Err(TypeError::Unknown(clip(spec)));
        }
        ColumnType::from_alias(&head).ok_or_else(|| TypeError::Unknown(clip(spec)))
    }

    fn resolve_vector(&self, spec: &str, tokens: &[&str]) -> Result<ColumnType, TypeError> {
        if tokens.len() != 3 {
            return Err(TypeError::MalformedVector {
                spec: clip(spec),
                reason: "expected 'vector, <dimension>, <element_type>'",
            });
        }
        let dimension: i64 = tokens[1].parse().map_err(|_| TypeError::MalformedVector {
            spec: clip(spec),
            reason: "dimension must be an integer literal",
        })?;
        if dimension <= 0 || dimension > i64::from(self.max_vector_dimension) {
            return Err(TypeError::InvalidDimension {
                dimension,
                max: self.max_vector_dimension,
            });
        }
        let element_token = tokens[2].to_ascii_lowercase();
        if element_token == "vector" {
            return Err(TypeError::NestedVector(clip(tokens[2])));
        }
        let element = ColumnType::from_alias(&element_token)
            .ok_or_else(|| TypeError::Unknown(clip(tokens[2])))?;
        Ok(ColumnType::vector(element, dimension as u32))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VECTOR_DIMENSION)
    }
}

fn clip(text: &str) -> String {
    const MAX: usize = 64;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn resolves_every_alias() {
        let cases = [
            ("int", ColumnType::Int32),
            ("integer", ColumnType::Int32),
            ("int8", ColumnType::Int8),
            ("int16", ColumnType::Int16),
            ("int32", ColumnType::Int32),
            ("int64", ColumnType::Int64),
            ("int128", ColumnType::Int128),
            ("float", ColumnType::Float32),
            ("float32", ColumnType::Float32),
            ("double", ColumnType::Float64),
            ("float64", ColumnType::Float64),
            ("varchar", ColumnType::Varchar),
            ("bool", ColumnType::Bool),
        ];
        for (spec, expected) in cases {
            assert_eq!(spec.parse::<ColumnType>().unwrap(), expected, "{spec}");
        }
    }

    #[test]
    fn tokens_are_case_insensitive_and_trimmed() {
        assert_eq!("  INT ".parse::<ColumnType>().unwrap(), ColumnType::Int32);
        assert_eq!("Double".parse::<ColumnType>().unwrap(), ColumnType::Float64);
    }

    #[test]
    fn parses_vector_triples() {
        assert_eq!(
            "vector, 3, float".parse::<ColumnType>().unwrap(),
            ColumnType::vector(ColumnType::Float32, 3)
        );
        assert_eq!(
            "vector,128,float".parse::<ColumnType>().unwrap(),
            ColumnType::vector(ColumnType::Float32, 128)
        );
    }

    #[test]
    fn rejects_bad_vectors() {
        assert!(matches!(
            "vector".parse::<ColumnType>(),
            Err(TypeError::MalformedVector { .. })
        ));
        assert!(matches!(
            "vector, x, float".parse::<ColumnType>(),
            Err(TypeError::MalformedVector { .. })
        ));
        assert!(matches!(
            "vector, 0, float".parse::<ColumnType>(),
            Err(TypeError::InvalidDimension { dimension: 0, .. })
        ));
        assert!(matches!(
            "vector, -4, float".parse::<ColumnType>(),
            Err(TypeError::InvalidDimension { .. })
        ));
        assert!(matches!(
            "vector, 3, vector".parse::<ColumnType>(),
            Err(TypeError::NestedVector(_))
        ));
        assert!(matches!(
            "vector, 3, decimal".parse::<ColumnType>(),
            Err(TypeError::Unknown(_))
        ));
    }

    #[test]
    fn dimension_limit_comes_from_registry() {
        let registry = TypeRegistry::new(4);
        assert!(registry.resolve("vector, 4, int8").is_ok());
        assert_eq!(
            registry.resolve("vector, 5, int8"),
            Err(TypeError::InvalidDimension {
                dimension: 5,
                max: 4
            })
        );
    }

    #[test]
    fn rejects_garbage_tokens() {
        for spec in [
            "",
            " ",
            "int!@#",
            "123int",
            "int-varchar",
            "['int']",
            "{\"int\"}",
            "(\"int\")",
            "int, int",
        ] {
            assert!(spec.parse::<ColumnType>().is_err(), "accepted {spec:?}");
        }
    }

    #[test]
    fn display_round_trips_through_the_registry() {
        let ty = ColumnType::vector(ColumnType::Int16, 12);
        assert_eq!(ty.to_string(), "vector,12,int16");
        assert_eq!(ty.to_string().parse::<ColumnType>().unwrap(), ty);
    }

    #[test]
    fn error_messages_clip_long_specs() {
        let spec = "x".repeat(10_000);
        let err = spec.parse::<ColumnType>().unwrap_err();
        assert!(err.to_string().len() < 200);
    }

    #[test]
    fn serde_shape_is_stable() {
        let ty = ColumnType::vector(ColumnType::Float32, 3);
        let json = serde_json::to_string(&ty).unwrap();
        let back: ColumnType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ty);
    }

    proptest! {
        #[test]
        fn positive_dimensions_within_limit_parse(dim in 1u32..=DEFAULT_MAX_VECTOR_DIMENSION) {
            let spec = format!("vector, {dim}, double");
            let ty = spec.parse::<ColumnType>().unwrap();
            prop_assert_eq!(ty, ColumnType::vector(ColumnType::Float64, dim));
        }

        #[test]
        fn parsing_never_panics(spec in ".{0,40}") {
            let _ = spec.parse::<ColumnType>();
        }
    }
}

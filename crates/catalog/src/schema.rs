//! Column definitions, validated table schemas and the builder that turns
//! raw `name -> "type[, primary key]"` specifications into them.

use ahash::RandomState;
use common::{ColumnId, ColumnSummary, Config, DbError, DbResult, IdentifierKind, SchemaError};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use types::{ColumnType, TypeRegistry};

use crate::ident::validate_identifier;

type Map<K, V> = HashMap<K, V, RandomState>;

/// Describes a logical column within a table schema.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    pub primary_key: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            primary_key: false,
        }
    }

    pub fn primary(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            primary_key: true,
            ..Self::new(name, ty)
        }
    }

    pub fn summary(&self) -> ColumnSummary {
        ColumnSummary {
            name: self.name.clone(),
            column_type: self.ty.to_string(),
            primary_key: self.primary_key,
        }
    }
}

/// Column layout for a table, along with helpful lookup structures.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableSchema {
    pub columns: Vec<Column>,
    pub name_to_ordinal: Map<String, ColumnId>,
    pub primary_key: Option<ColumnId>,
}

impl TableSchema {
    pub fn try_new(columns: Vec<Column>) -> DbResult<Self> {
        if columns.is_empty() {
            return Err(SchemaError::Empty.into());
        }
        if columns.len() > common::MAX_COLUMNS {
            return Err(SchemaError::TooManyColumns {
                count: columns.len(),
                max: common::MAX_COLUMNS,
            }
            .into());
        }
        let mut name_to_ordinal = Map::default();
        let mut primary_key: Option<ColumnId> = None;
        for (idx, column) in columns.iter().enumerate() {
            let ordinal = idx as ColumnId;
            if name_to_ordinal
                .insert(column.name.clone(), ordinal)
                .is_some()
            {
                return Err(SchemaError::DuplicateColumn(column.name.clone()).into());
            }
            if column.primary_key {
                if let Some(first) = primary_key {
                    return Err(SchemaError::MultiplePrimaryKeys {
                        first: columns[first as usize].name.clone(),
                        second: column.name.clone(),
                    }
                    .into());
                }
                primary_key = Some(ordinal);
            }
        }
        Ok(Self {
            columns,
            name_to_ordinal,
            primary_key,
        })
    }

    /// Returns the ordinal for a column name.
    pub fn column_index(&self, name: &str) -> Option<ColumnId> {
        self.name_to_ordinal.get(name).copied()
    }

    /// Returns the column type for the provided ordinal.
    pub fn column_type(&self, ordinal: ColumnId) -> Option<&ColumnType> {
        self.columns.get(ordinal as usize).map(|c| &c.ty)
    }

    pub fn primary_key_column(&self) -> Option<&Column> {
        self.primary_key
            .and_then(|ordinal| self.columns.get(ordinal as usize))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Builds [`TableSchema`]s from raw column specifications.
///
/// Each specification pairs a column name with a type string such as
/// `"int"`, `"varchar, primary key"` or `"vector, 128, float"`. Entries are
/// processed in order; when a name repeats, the later definition replaces the
/// earlier one but keeps its position. Work is linear in the number of
/// entries.
#[derive(Clone, Debug)]
pub struct SchemaBuilder {
    registry: TypeRegistry,
    max_identifier_len: usize,
    max_columns: usize,
}

impl SchemaBuilder {
    pub fn new(config: &Config) -> Self {
        Self {
            registry: TypeRegistry::new(config.max_vector_dimension),
            max_identifier_len: config.max_identifier_len,
            max_columns: config.column_limit(),
        }
    }

    pub fn build(&self, columns: Option<&[(String, String)]>) -> DbResult<TableSchema> {
        let specs = match columns {
            Some(specs) if !specs.is_empty() => specs,
            _ => return Err(SchemaError::Empty.into()),
        };

        let mut defs: Vec<Column> = Vec::with_capacity(specs.len());
        let mut positions: Map<&str, usize> = Map::default();
        for (name, spec) in specs {
            let column = self.build_column(name, spec)?;
            match positions.get(name.as_str()) {
                Some(&pos) => defs[pos] = column,
                None => {
                    positions.insert(name.as_str(), defs.len());
                    defs.push(column);
                }
            }
        }

        if defs.len() > self.max_columns {
            return Err(SchemaError::TooManyColumns {
                count: defs.len(),
                max: self.max_columns,
            }
            .into());
        }
        TableSchema::try_new(defs)
    }

    fn build_column(&self, name: &str, spec: &str) -> DbResult<Column> {
        validate_identifier(name, IdentifierKind::Column, self.max_identifier_len)?;
        let (type_spec, primary_key) = split_primary_key(spec);
        let ty = self
            .registry
            .resolve(&type_spec)
            .map_err(|err| DbError::unknown_type(name, err))?;
        Ok(Column {
            name: name.to_string(),
            ty,
            primary_key,
        })
    }
}

/// Strips trailing `primary key` markers, returning the bare type spec.
fn split_primary_key(spec: &str) -> (String, bool) {
    let mut tokens: Vec<&str> = spec.split(',').collect();
    let mut primary_key = false;
    while tokens.len() > 1 && is_primary_key_marker(tokens[tokens.len() - 1]) {
        tokens.pop();
        primary_key = true;
    }
    (tokens.join(","), primary_key)
}

fn is_primary_key_marker(token: &str) -> bool {
    let mut words = token.split_whitespace();
    matches!(
        (words.next(), words.next(), words.next()),
        (Some(first), Some(second), None)
            if first.eq_ignore_ascii_case("primary") && second.eq_ignore_ascii_case("key")
    )
}

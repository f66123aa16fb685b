//! Conflict policy for create and drop operations.
//!
//! Callers hand over a loosely typed [`ConflictArg`]; it is parsed into the
//! closed [`ConflictMode`] before any namespace is touched, and the resolver
//! functions then decide what a create or drop should do given whether the
//! target already exists.

use std::{fmt, str::FromStr};

use common::{ConflictError, ObjectKind};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictMode {
    #[default]
    Error,
    Ignore,
    Replace,
}

impl ConflictMode {
    /// Numeric codes accepted at the boundary: 0 = Ignore, 1 = Error, 2 = Replace.
    pub fn from_code(code: i64) -> Result<Self, ConflictError> {
        match code {
            0 => Ok(ConflictMode::Ignore),
            1 => Ok(ConflictMode::Error),
            2 => Ok(ConflictMode::Replace),
            other => Err(ConflictError::invalid_mode(format!(
                "unknown conflict code {other}"
            ))),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            ConflictMode::Ignore => 0,
            ConflictMode::Error => 1,
            ConflictMode::Replace => 2,
        }
    }

    /// Parses a boundary value. A missing argument means `Error`.
    pub fn from_arg(arg: Option<&ConflictArg>) -> Result<Self, ConflictError> {
        match arg {
            None => Ok(ConflictMode::default()),
            Some(ConflictArg::Int(code)) => ConflictMode::from_code(*code),
            Some(ConflictArg::Text(text)) => text.parse(),
            Some(other) => Err(ConflictError::invalid_mode(format!(
                "expected a conflict mode, got {}",
                other.describe()
            ))),
        }
    }
}

impl FromStr for ConflictMode {
    type Err = ConflictError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(ConflictMode::Error),
            "ignore" | "ignore_if_exists" => Ok(ConflictMode::Ignore),
            "replace" | "replace_if_exists" => Ok(ConflictMode::Replace),
            _ => Err(ConflictError::invalid_mode(format!(
                "unrecognised conflict mode '{}'",
                common::clip_name(text)
            ))),
        }
    }
}

impl fmt::Display for ConflictMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictMode::Error => "error",
            ConflictMode::Ignore => "ignore",
            ConflictMode::Replace => "replace",
        })
    }
}

/// Conflict argument exactly as it arrived at the boundary, before parsing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ConflictArg {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<ConflictArg>),
    Map(Vec<(String, ConflictArg)>),
}

impl ConflictArg {
    fn describe(&self) -> &'static str {
        match self {
            ConflictArg::Null => "null",
            ConflictArg::Bool(_) => "a boolean",
            ConflictArg::Int(_) => "an integer",
            ConflictArg::Float(_) => "a float",
            ConflictArg::Text(_) => "a string",
            ConflictArg::List(_) => "a list",
            ConflictArg::Map(_) => "a mapping",
        }
    }
}

impl From<ConflictMode> for ConflictArg {
    fn from(mode: ConflictMode) -> Self {
        ConflictArg::Int(mode.code())
    }
}

/// What a create should do once the existence check has run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateAction {
    Proceed,
    NoOp,
    ReplaceExisting,
}

/// What a drop should do once the existence check has run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropAction {
    Proceed,
    NoOp,
}

pub fn resolve_create(
    kind: ObjectKind,
    name: &str,
    existing: bool,
    mode: ConflictMode,
) -> Result<CreateAction, ConflictError> {
    match (existing, mode) {
        (false, _) => Ok(CreateAction::Proceed),
        (true, ConflictMode::Error) => Err(ConflictError::already_exists(kind, name)),
        (true, ConflictMode::Ignore) => Ok(CreateAction::NoOp),
        (true, ConflictMode::Replace) => Ok(CreateAction::ReplaceExisting),
    }
}

/// Rejects modes that make no sense for a drop. Runs before any lookup.
pub fn check_drop_mode(mode: ConflictMode) -> Result<(), ConflictError> {
    match mode {
        ConflictMode::Replace => Err(ConflictError::invalid_mode(
            "replace is not a valid conflict type for drop",
        )),
        ConflictMode::Error | ConflictMode::Ignore => Ok(()),
    }
}

pub fn resolve_drop(
    kind: ObjectKind,
    name: &str,
    existing: bool,
    mode: ConflictMode,
) -> Result<DropAction, ConflictError> {
    check_drop_mode(mode)?;
    match (existing, mode) {
        (true, _) => Ok(DropAction::Proceed),
        (false, ConflictMode::Ignore) => Ok(DropAction::NoOp),
        (false, _) => Err(ConflictError::not_found(kind, name)),
    }
}

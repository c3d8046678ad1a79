//! Caller-supplied mapping callbacks and positional parameter sets.
//!
//! # Responsibility
//! - Define the binder/row-mapper/id-setter contracts generated code implements.
//! - Hold positional parameter values independently of any live statement,
//!   so batches can accumulate sets before execution.
//!
//! # Invariants
//! - The runtime never introspects entities; all field access goes through
//!   these callbacks.
//! - Positions are 1-based, matching SQL placeholder numbering.

use rusqlite::types::{ToSql, ToSqlOutput, Value};
use rusqlite::Row;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type MapperResult<T> = Result<T, MapperError>;

/// Failure raised by a binder, row mapper or id setter.
#[derive(Debug)]
pub struct MapperError {
    message: String,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl MapperError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for MapperError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {source}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Error for MapperError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn Error + 'static))
    }
}

impl From<rusqlite::Error> for MapperError {
    fn from(value: rusqlite::Error) -> Self {
        Self::with_source("sqlite value conversion failed", value)
    }
}

/// Highest placeholder number SQLite accepts (`SQLITE_MAX_VARIABLE_NUMBER`).
pub const MAX_PARAMETER_POSITION: usize = 32_766;

/// Positional parameter values for one statement execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: Vec<Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Appends the value for the next placeholder.
    pub fn push<T: ToSql + ?Sized>(&mut self, value: &T) -> MapperResult<()> {
        let position = self.values.len() + 1;
        if position > MAX_PARAMETER_POSITION {
            return Err(MapperError::new(format!(
                "parameter position {position} exceeds the limit of {MAX_PARAMETER_POSITION}"
            )));
        }
        let value = to_value(value, position)?;
        self.values.push(value);
        Ok(())
    }

    /// Sets the value at 1-based `position`, padding skipped slots with NULL.
    pub fn set<T: ToSql + ?Sized>(&mut self, position: usize, value: &T) -> MapperResult<()> {
        if position == 0 {
            return Err(MapperError::new(
                "parameter positions are 1-based; got 0",
            ));
        }
        if position > MAX_PARAMETER_POSITION {
            return Err(MapperError::new(format!(
                "parameter position {position} exceeds the limit of {MAX_PARAMETER_POSITION}"
            )));
        }
        let value = to_value(value, position)?;
        if self.values.len() < position {
            self.values.resize(position, Value::Null);
        }
        self.values[position - 1] = value;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

fn to_value<T: ToSql + ?Sized>(value: &T, position: usize) -> MapperResult<Value> {
    let output = value.to_sql().map_err(|err| {
        MapperError::with_source(format!("cannot convert parameter {position}"), err)
    })?;
    match output {
        ToSqlOutput::Borrowed(value) => Ok(value.into()),
        ToSqlOutput::Owned(value) => Ok(value),
        #[allow(unreachable_patterns)]
        _ => Err(MapperError::new(format!(
            "parameter {position} uses an unsupported sql output kind"
        ))),
    }
}

/// Binds an entity's fields to statement parameters.
pub trait ParameterBinder<E: ?Sized> {
    fn bind(&self, params: &mut Params, entity: &E) -> MapperResult<()>;

    /// Identity reported in binding errors.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<E: ?Sized, F> ParameterBinder<E> for F
where
    F: Fn(&mut Params, &E) -> MapperResult<()>,
{
    fn bind(&self, params: &mut Params, entity: &E) -> MapperResult<()> {
        self(params, entity)
    }
}

/// Binder for statements without placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoParams;

impl<E: ?Sized> ParameterBinder<E> for NoParams {
    fn bind(&self, _params: &mut Params, _entity: &E) -> MapperResult<()> {
        Ok(())
    }
}

/// Maps one result row to a value.
pub trait RowMapper<T> {
    fn map_row(&self, row: &Row<'_>) -> MapperResult<T>;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<T, F> RowMapper<T> for F
where
    F: Fn(&Row<'_>) -> MapperResult<T>,
{
    fn map_row(&self, row: &Row<'_>) -> MapperResult<T> {
        self(row)
    }
}

/// Key generated by the store for an auto-increment insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeneratedKey(i64);

impl GeneratedKey {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

/// Writes a generated key back onto the entity.
pub trait IdSetter<E: ?Sized> {
    fn set_id(&self, entity: &mut E, key: GeneratedKey) -> MapperResult<()>;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<E: ?Sized, F> IdSetter<E> for F
where
    F: Fn(&mut E, GeneratedKey) -> MapperResult<()>,
{
    fn set_id(&self, entity: &mut E, key: GeneratedKey) -> MapperResult<()> {
        self(entity, key)
    }
}

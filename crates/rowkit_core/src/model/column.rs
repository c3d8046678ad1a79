//! Column descriptors.
//!
//! # Responsibility
//! - Model the column variants (plain, primary key, business key, derived)
//!   as one tagged kind plus a flag record.
//!
//! # Invariants
//! - Primary keys are never nullable, always insertable, never updatable.
//! - Derived columns are neither insertable nor updatable and only make sense
//!   in SELECT projections.

use serde::{Deserialize, Serialize};

/// Per-column write/nullability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnFlags {
    pub nullable: bool,
    pub insertable: bool,
    pub updatable: bool,
}

impl ColumnFlags {
    /// Flags of a primary-key column.
    pub const KEY: Self = Self {
        nullable: false,
        insertable: true,
        updatable: false,
    };

    /// Flags of a derived (aggregate/function) column.
    pub const DERIVED: Self = Self {
        nullable: true,
        insertable: false,
        updatable: false,
    };

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn insertable(mut self, insertable: bool) -> Self {
        self.insertable = insertable;
        self
    }

    pub fn updatable(mut self, updatable: bool) -> Self {
        self.updatable = updatable;
        self
    }
}

impl Default for ColumnFlags {
    /// Non-nullable, insertable and updatable.
    fn default() -> Self {
        Self {
            nullable: false,
            insertable: true,
            updatable: true,
        }
    }
}

/// SQL function a derived column applies to its inner column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlFunction {
    Count,
    Min,
    Max,
    Sum,
    Avg,
}

impl SqlFunction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
        }
    }
}

/// Column role.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Single,
    PrimaryKey,
    /// Unique lookup column that is not the row identity.
    BusinessKey,
    /// `function(inner)`, e.g. `COUNT(age)`.
    Derived {
        function: SqlFunction,
        inner: Box<Column>,
    },
}

/// Immutable column descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    table: String,
    name: String,
    kind: ColumnKind,
    flags: ColumnFlags,
}

impl Column {
    /// Plain column owned by `table`.
    pub fn single(table: impl Into<String>, name: impl Into<String>, flags: ColumnFlags) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            kind: ColumnKind::Single,
            flags,
        }
    }

    /// Primary-key column. Flags are fixed to [`ColumnFlags::KEY`].
    pub fn primary_key(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            kind: ColumnKind::PrimaryKey,
            flags: ColumnFlags::KEY,
        }
    }

    /// Business-key column; insert/update participation follows `flags`.
    pub fn business_key(
        table: impl Into<String>,
        name: impl Into<String>,
        flags: ColumnFlags,
    ) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            kind: ColumnKind::BusinessKey,
            flags,
        }
    }

    /// Derived column wrapping `inner`. Keeps the inner column's table and name.
    pub fn derived(function: SqlFunction, inner: Column) -> Self {
        Self {
            table: inner.table.clone(),
            name: inner.name.clone(),
            kind: ColumnKind::Derived {
                function,
                inner: Box::new(inner),
            },
            flags: ColumnFlags::DERIVED,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning table.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    pub fn flags(&self) -> ColumnFlags {
        self.flags
    }

    pub fn is_nullable(&self) -> bool {
        self.flags.nullable
    }

    pub fn is_insertable(&self) -> bool {
        self.flags.insertable
    }

    pub fn is_updatable(&self) -> bool {
        self.flags.updatable
    }

    pub fn is_primary_key(&self) -> bool {
        matches!(self.kind, ColumnKind::PrimaryKey)
    }

    pub fn is_business_key(&self) -> bool {
        matches!(self.kind, ColumnKind::BusinessKey)
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.kind, ColumnKind::Derived { .. })
    }
}

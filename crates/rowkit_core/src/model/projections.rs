//! Constructors for derived (function) columns used in SELECT projections.

use crate::model::column::{Column, SqlFunction};

pub struct Projections;

impl Projections {
    pub fn count(column: &Column) -> Column {
        Column::derived(SqlFunction::Count, column.clone())
    }

    pub fn min(column: &Column) -> Column {
        Column::derived(SqlFunction::Min, column.clone())
    }

    pub fn max(column: &Column) -> Column {
        Column::derived(SqlFunction::Max, column.clone())
    }

    pub fn sum(column: &Column) -> Column {
        Column::derived(SqlFunction::Sum, column.clone())
    }

    pub fn avg(column: &Column) -> Column {
        Column::derived(SqlFunction::Avg, column.clone())
    }
}

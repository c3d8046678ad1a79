#![allow(dead_code)]

use rowkit_core::{
    Column, ColumnFlags, Database, DatabaseConfig, EntityDescriptor, GeneratedKey, MapperResult,
    Module, Params, Table,
};
use rusqlite::{Connection, Row};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const STUDENT_DDL: &str = "
    CREATE TABLE student (
        id INTEGER PRIMARY KEY,
        code TEXT NOT NULL UNIQUE,
        age INTEGER,
        created_at INTEGER NOT NULL,
        readonly TEXT NOT NULL DEFAULT 'fixed'
    );";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: i64,
    pub code: String,
    pub age: Option<i64>,
    pub created_at: i64,
}

impl Student {
    pub fn new(id: i64, code: &str, age: Option<i64>) -> Self {
        Self {
            id,
            code: code.to_string(),
            age,
            created_at: 1_700_000_000,
        }
    }
}

/// `id` primary key, `code` business key, `age` nullable, `created_at`
/// not updatable, `readonly` neither insertable nor updatable.
pub fn student_descriptor() -> EntityDescriptor {
    EntityDescriptor::new(
        "Student",
        Table::new("student"),
        vec![
            Column::primary_key("student", "id"),
            Column::business_key("student", "code", ColumnFlags::default()),
            Column::single("student", "age", ColumnFlags::default().nullable(true)),
            Column::single(
                "student",
                "created_at",
                ColumnFlags::default().updatable(false),
            ),
            Column::single(
                "student",
                "readonly",
                ColumnFlags::default().insertable(false).updatable(false),
            ),
        ],
    )
    .unwrap()
}

pub fn school_module() -> Module {
    Module::new(
        "school",
        None,
        vec![student_descriptor().auto_increment().unwrap()],
    )
    .unwrap()
}

/// Temp SQLite file with the student table and a database over it.
pub struct SchoolFixture {
    pub dir: TempDir,
    pub path: PathBuf,
    pub database: Database,
}

pub fn school_fixture() -> SchoolFixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("school.db");
    create_schema(&path);

    let database = Database::open(DatabaseConfig::new(&path), school_module()).unwrap();
    SchoolFixture {
        dir,
        path,
        database,
    }
}

pub fn create_schema(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(STUDENT_DDL).unwrap();
}

pub fn count_students(path: &Path) -> i64 {
    let conn = Connection::open(path).unwrap();
    conn.query_row("SELECT COUNT(*) FROM student", [], |row| row.get(0))
        .unwrap()
}

/// Binds `id, code, age, created_at`.
pub fn bind_student_insert(params: &mut Params, student: &Student) -> MapperResult<()> {
    params.push(&student.id)?;
    params.push(&student.code)?;
    params.push(&student.age)?;
    params.push(&student.created_at)
}

/// Binds `code, age, created_at` for auto-increment inserts.
pub fn bind_student_generated(params: &mut Params, student: &Student) -> MapperResult<()> {
    params.push(&student.code)?;
    params.push(&student.age)?;
    params.push(&student.created_at)
}

/// Binds `code, age` then `id`.
pub fn bind_student_update(params: &mut Params, student: &Student) -> MapperResult<()> {
    params.push(&student.code)?;
    params.push(&student.age)?;
    params.push(&student.id)
}

pub fn bind_student_id(params: &mut Params, student: &Student) -> MapperResult<()> {
    params.push(&student.id)
}

pub fn bind_id(params: &mut Params, id: &i64) -> MapperResult<()> {
    params.push(id)
}

pub fn set_student_id(student: &mut Student, key: GeneratedKey) -> MapperResult<()> {
    student.id = key.value();
    Ok(())
}

/// Maps `id, code, age, created_at, readonly` projections.
pub fn map_student(row: &Row<'_>) -> MapperResult<Student> {
    Ok(Student {
        id: row.get(0)?,
        code: row.get(1)?,
        age: row.get(2)?,
        created_at: row.get(3)?,
    })
}

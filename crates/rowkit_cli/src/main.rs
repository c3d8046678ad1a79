//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `rowkit_core` linkage by printing the core version.
//! - Given a module descriptor JSON file, print the SQL every entity
//!   compiles to, optionally qualified by a config's schema override.
//!
//! Usage: `rowkit [MODULE_JSON [CONFIG_JSON]]`

use clap::Parser;
use log::error;
use rowkit_core::logging::init_from_config;
use rowkit_core::{
    core_version, init_stderr_logging, resolve_schema, EntitySql, Module, RowkitConfig,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rowkit")]
#[command(about = "Compile rowkit module descriptors into SQL", long_about = None)]
#[command(version)]
struct Args {
    /// Module descriptor JSON; without it only the core version is printed.
    module_json: Option<PathBuf>,
    /// Config JSON supplying logging and the schema override.
    config_json: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={message}");
            eprintln!("rowkit: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let config = match &args.config_json {
        Some(path) => Some(RowkitConfig::load(path).map_err(|err| err.to_string())?),
        None => None,
    };
    match config.as_ref().and_then(|config| config.logging.as_ref()) {
        Some(logging) => init_from_config(logging)?,
        None => init_stderr_logging("warn")?,
    }

    println!("rowkit_core version={}", core_version());

    let Some(module_path) = &args.module_json else {
        return Ok(());
    };
    let json = std::fs::read_to_string(module_path)
        .map_err(|err| format!("cannot read `{}`: {err}", module_path.display()))?;
    let module = Module::from_json(&json).map_err(|err| err.to_string())?;
    let schema_override = config
        .as_ref()
        .and_then(|config| config.database.schema.as_deref());

    for entity in module.entities() {
        let schema = resolve_schema(schema_override, entity.table(), &module);
        let sql = EntitySql::build(entity, schema).map_err(|err| err.to_string())?;
        print_entity(entity.name(), &sql);
    }
    Ok(())
}

fn print_entity(name: &str, sql: &EntitySql) {
    println!();
    println!("[{name}]");
    println!("insert={}", sql.insert());
    if let Some(insert) = sql.insert_auto_increment() {
        println!("insert_auto_increment={insert}");
    }
    if let Some(update) = sql.update() {
        println!("update={update}");
    }
    println!("delete={}", sql.delete());
    println!("select_by_id={}", sql.select_by_id());
    if let Some(select) = sql.select_by_business_key() {
        println!("select_by_business_key={select}");
    }
    println!("select_all={}", sql.select_all());
}

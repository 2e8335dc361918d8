//! Command-line host for the store.
//!
//! # Responsibility
//! - Open a store file, exercise scalar and list operations, print results.
//! - Optionally export the HTML report of the whole database.
//!
//! Usage: `easystore_cli [DB_PATH] [REPORT_PATH]`
//!
//! Logging is enabled when `EASYSTORE_LOG_DIR` is set (absolute path);
//! `EASYSTORE_LOG_LEVEL` overrides the build-mode default level.

use easystore_core::{default_log_level, init_logging, EasyStore};
use serde_json::json;
use std::error::Error;
use std::process::ExitCode;

const DEFAULT_DB_PATH: &str = "easy.db";

fn main() -> ExitCode {
    if let Ok(log_dir) = std::env::var("EASYSTORE_LOG_DIR") {
        let level = std::env::var("EASYSTORE_LOG_LEVEL")
            .unwrap_or_else(|_| default_log_level().to_string());
        if let Err(err) = init_logging(&level, &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
    let report_path = args.next();

    match run(&db_path, report_path.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(db_path: &str, report_path: Option<&str>) -> Result<(), Box<dyn Error>> {
    let store = EasyStore::open(db_path)?;
    println!("easystore_core version={}", easystore_core::core_version());

    store.set_scalar("name", "Zhang San")?;
    store.set_scalar("age", &25)?;
    store.set_scalar("hobbies", &json!(["reading", "swimming", "coding"]))?;

    println!("name: {}", store.get_scalar("name")?);
    println!("age: {}", store.get_scalar("age")?);
    println!("hobbies: {}", store.get_scalar("hobbies")?);
    if store.key_exists("name")? {
        println!("key 'name' exists");
    }

    println!("all scalars:");
    for record in store.all_items()? {
        println!("  {}: {}", record.key, record.value);
    }

    store.list_replace_all::<i64>("numbers", &[])?;
    for i in 0..5_i64 {
        store.list_append("numbers", &(i * 2))?;
    }
    println!("numbers: {:?}", store.list_get_all("numbers")?);
    println!("numbers length: {}", store.list_len("numbers")?);

    store.list_set_item("numbers", 2, &100)?;
    println!("after numbers[2] = 100: {:?}", store.list_get_all("numbers")?);
    println!("numbers[0] = {}", store.list_get_item("numbers", 0)?);

    store.list_remove("numbers", 1)?;
    println!("after removing numbers[1]: {:?}", store.list_get_all("numbers")?);

    store.set("tasks", &json!(["write docs", "ship release"]))?;
    let tasks = store.list_view("tasks");
    tasks.set(3, &"celebrate")?;
    println!("tasks: {:?}", tasks.to_vec()?);

    if let Some(path) = report_path {
        let report = store.html_report()?;
        std::fs::write(path, report)
            .map_err(|err| format!("failed to write report `{path}`: {err}"))?;
        println!("report written to {path}");
    }

    Ok(())
}

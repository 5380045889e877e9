use sqlease::config::{default_config_path, load_config};
use sqlease::{DatabaseHandle, SqleaseError, StatementRunner};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

const USAGE: &str = "Usage: sqlease [--config PATH] <command> [SQL | @FILE]

Commands:
  exec   Run a SPLIT-separated script, logging the first failure as fatal
  write  Run a SPLIT-separated script, reporting the first failure
  read   Print the first column of the first row (empty if no rows)
  query  Print all rows as JSON
  path   Print the SQLite store path
  delete Delete the SQLite store file";

fn main() -> ExitCode {
    // Initialize the logging system using tracing subscriber
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<String, String> {
    let (config_path, rest) = match args {
        [flag, path, rest @ ..] if flag == "--config" => (PathBuf::from(path), rest),
        rest => (
            default_config_path().ok_or("no configuration directory; pass --config")?,
            rest,
        ),
    };

    let (command, sql) = match rest {
        [command] => (command.as_str(), None),
        [command, sql] => (command.as_str(), Some(read_sql(sql)?)),
        _ => return Err(USAGE.to_string()),
    };

    info!("Loading configuration from {:?}", config_path);
    let handle = load_config(&config_path)
        .and_then(|config| config.open())
        .map_err(|e| e.to_string())?;
    info!("Opened {} database", handle.engine());

    execute(&handle, command, sql.as_deref()).map_err(|e| e.to_string())
}

fn read_sql(arg: &str) -> Result<String, String> {
    match arg.strip_prefix('@') {
        Some(file) => std::fs::read_to_string(file).map_err(|e| format!("{}: {}", file, e)),
        None => Ok(arg.to_string()),
    }
}

fn execute(handle: &DatabaseHandle, command: &str, sql: Option<&str>) -> sqlease::Result<String> {
    let need_sql = || {
        sql.ok_or_else(|| SqleaseError::Config(format!("`{}` needs an SQL argument", command)))
    };

    match command {
        // A failed script exits with status 1, never with a panic
        "exec" => match handle.write_update(need_sql()?) {
            Ok(done) => Ok(done.to_string()),
            Err(e) => {
                error!("Update failed: {}", e);
                Err(e)
            }
        },
        "write" => Ok(handle.write_update(need_sql()?)?.to_string()),
        "read" => handle.read_data(need_sql()?),
        "query" => {
            let rs = handle.get_result_set(need_sql()?)?;
            serde_json::to_string_pretty(&rs).map_err(|e| SqleaseError::Config(e.to_string()))
        }
        "path" => Ok(sqlite(handle, command)?.file_path().display().to_string()),
        "delete" => Ok(sqlite(handle, command)?.delete_file()?.to_string()),
        other => Err(SqleaseError::Config(format!("unknown command `{}`\n\n{}", other, USAGE))),
    }
}

fn sqlite<'a>(handle: &'a DatabaseHandle, command: &str) -> sqlease::Result<&'a sqlease::Sqlite> {
    handle
        .as_sqlite()
        .ok_or_else(|| SqleaseError::Config(format!("`{}` only applies to SQLite stores", command)))
}

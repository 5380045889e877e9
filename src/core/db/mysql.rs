/// MySQL Handle Module
///
/// Network databases: the `MySqlBuilder`, the validated `NetworkConfig` and
/// the `MySql` handle. Validation is always available; opening connections
/// requires the `mysql` feature.

use crate::core::error::{MissingField, ValidationError};
use crate::core::Result;
use std::fmt;
use tracing::warn;

#[cfg(feature = "mysql")]
use crate::core::db::connection::{Database, ResultSet, Session};
#[cfg(feature = "mysql")]
use crate::core::{DriverError, SqleaseError};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: &str = "3306";

/// Parameters identifying a MySQL server and schema.
#[derive(Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub host: String,
    pub port: String,
    /// Schema to select; may be absent and created later with `create_schema`
    pub schema: Option<String>,
    pub username: String,
    pub password: Option<String>,
    /// Environment variable holding the password
    pub password_env: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT.to_string(),
            schema: None,
            username: String::new(),
            password: None,
            password_env: None,
        }
    }
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("schema", &self.schema)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("password_env", &self.password_env)
            .finish()
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

impl NetworkConfig {
    /// Required fields that are empty, in reporting order.
    pub fn missing_fields(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        if self.host.is_empty() {
            missing.push(MissingField::Host);
        }
        if self.port.is_empty() {
            missing.push(MissingField::Port);
        }
        if self.username.is_empty() {
            missing.push(MissingField::Username);
        }
        if blank(&self.password) && blank(&self.password_env) {
            missing.push(MissingField::Password);
        }
        missing
    }

    /// Password to present right now.
    ///
    /// A non-empty literal password takes precedence over the environment
    /// variable, even when both are set. Otherwise the variable is read on
    /// every call, yielding an empty string if it is unset.
    pub fn resolve_password(&self) -> String {
        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            return password.to_string();
        }
        match self.password_env.as_deref().filter(|e| !e.is_empty()) {
            Some(var) => std::env::var(var).unwrap_or_default(),
            None => String::new(),
        }
    }
}

/// Staging object for a `MySql` handle.
#[derive(Debug, Clone, Default)]
pub struct MySqlBuilder {
    config: NetworkConfig,
}

impl MySqlBuilder {
    /// Starts from `localhost:3306` with no credentials
    pub fn new() -> Self {
        Self::default()
    }

    /// Host name or IP address
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.config.port = port.into();
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.config.schema = Some(schema.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Name of the environment variable that holds the password, e.g. `SQL_PASSWORD`
    pub fn password_env(mut self, var: impl Into<String>) -> Self {
        self.config.password_env = Some(var.into());
        self
    }

    /// Validates the staged fields and returns the handle.
    ///
    /// Only the presence of a password or an environment variable name is
    /// checked. An environment variable that is unset still passes; it is
    /// logged and resolves to an empty password when connecting.
    ///
    /// # Errors
    ///
    /// `SqleaseError::Validation` listing every missing field.
    pub fn build(self) -> Result<MySql> {
        let config = self.config;

        let missing = config.missing_fields();
        if !missing.is_empty() {
            return Err(ValidationError::new(missing).into());
        }

        if blank(&config.password) {
            if let Some(var) = config.password_env.as_deref() {
                if std::env::var_os(var).is_none() {
                    warn!("Password environment variable {} is not set", var);
                }
            }
        }

        Ok(MySql { config })
    }
}

/// Handle on a MySQL server.
#[derive(Debug, Clone)]
pub struct MySql {
    config: NetworkConfig,
}

impl MySql {
    pub fn builder() -> MySqlBuilder {
        MySqlBuilder::new()
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn schema(&self) -> Option<&str> {
        self.config.schema.as_deref()
    }

    /// `mysql://host:port/schema`, without credentials
    pub fn connection_url(&self) -> String {
        format!(
            "mysql://{}:{}/{}",
            self.config.host,
            self.config.port,
            self.schema().unwrap_or_default()
        )
    }
}

#[cfg(feature = "mysql")]
impl MySql {
    fn opts(&self, schema: Option<&str>) -> Result<::mysql::OptsBuilder> {
        let port: u16 = self
            .config
            .port
            .parse()
            .map_err(|e| SqleaseError::Connectivity {
                target: self.connection_url(),
                source: Box::new(e),
            })?;

        Ok(::mysql::OptsBuilder::new()
            .ip_or_hostname(Some(self.config.host.clone()))
            .tcp_port(port)
            .user(Some(self.config.username.clone()))
            .pass(Some(self.config.resolve_password()))
            .db_name(schema.filter(|s| !s.is_empty())))
    }

    fn open(&self, schema: Option<&str>) -> Result<::mysql::Conn> {
        let opts = self.opts(schema)?;
        ::mysql::Conn::new(opts).map_err(|e| SqleaseError::Connectivity {
            target: self.connection_url(),
            source: Box::new(e),
        })
    }

    /// Creates `schema` on the server if it is absent and selects it for
    /// later connections.
    ///
    /// Returns `false` (and logs the error) if the server connection or the
    /// statement fails.
    pub fn create_schema(&mut self, schema: &str) -> bool {
        use ::mysql::prelude::Queryable;

        let statement = format!("CREATE SCHEMA IF NOT EXISTS {}", schema);
        let result = self.open(None).and_then(|mut conn| {
            conn.query_drop(&statement)
                .map_err(|e| SqleaseError::Statement {
                    index: 0,
                    statement: statement.clone(),
                    source: Box::new(e),
                })
        });

        match result {
            Ok(()) => {
                tracing::info!("Schema {} is ready", schema);
                self.config.schema = Some(schema.to_string());
                true
            }
            Err(e) => {
                tracing::error!("Could not create schema {}: {}", schema, e);
                false
            }
        }
    }
}

#[cfg(feature = "mysql")]
impl Database for MySql {
    type Session = ::mysql::Conn;

    fn connect(&self) -> Result<::mysql::Conn> {
        self.open(self.schema())
    }
}

#[cfg(feature = "mysql")]
impl Session for ::mysql::Conn {
    fn execute(&mut self, sql: &str) -> std::result::Result<u64, DriverError> {
        ::mysql::prelude::Queryable::query_drop(self, sql)?;
        Ok(self.affected_rows())
    }

    fn query(&mut self, sql: &str) -> std::result::Result<ResultSet, DriverError> {
        let result = ::mysql::prelude::Queryable::query_iter(self, sql)?;

        // Column metadata arrives before any row, so an empty result keeps its names.
        let columns: Vec<String> = result
            .columns()
            .as_ref()
            .iter()
            .map(|c| c.name_str().into_owned())
            .collect();

        let mut rows = Vec::new();
        for row in result {
            rows.push(row_values(row?));
        }

        Ok(ResultSet::new(columns, rows))
    }
}

#[cfg(feature = "mysql")]
fn row_values(row: ::mysql::Row) -> Vec<Option<String>> {
    row.unwrap().into_iter().map(mysql_value).collect()
}

/// Renders a MySQL value the way a string column accessor would.
#[cfg(feature = "mysql")]
fn mysql_value(value: ::mysql::Value) -> Option<String> {
    use ::mysql::Value;

    match value {
        Value::NULL => None,
        Value::Bytes(b) => Some(String::from_utf8_lossy(&b).into_owned()),
        Value::Int(i) => Some(i.to_string()),
        Value::UInt(u) => Some(u.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Double(d) => Some(d.to_string()),
        Value::Date(y, mo, d, h, mi, s, 0) => Some(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            y, mo, d, h, mi, s
        )),
        Value::Date(y, mo, d, h, mi, s, us) => Some(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
            y, mo, d, h, mi, s, us
        )),
        Value::Time(negative, days, h, mi, s, us) => {
            let sign = if negative { "-" } else { "" };
            let hours = days * 24 + u32::from(h);
            if us == 0 {
                Some(format!("{}{:02}:{:02}:{:02}", sign, hours, mi, s))
            } else {
                Some(format!("{}{:02}:{:02}:{:02}.{:06}", sign, hours, mi, s, us))
            }
        }
    }
}

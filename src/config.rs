//! Layered configuration: an optional YAML file, then the process
//! environment (keys lower-cased), then caller overrides. Later layers win.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_yaml::Value;
use tracing::{debug, info, warn};

use crate::domain::{
    error::{ConfigLoadError, SettingError},
    models::DbSettings,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Text(s) => f.write_str(s),
            ConfigValue::Integer(i) => write!(f, "{}", i),
            ConfigValue::Float(x) => write!(f, "{}", x),
            ConfigValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Text(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Text(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

pub type ConfigLayer = BTreeMap<String, ConfigValue>;

/// Read-only view over the merged layers for one processing attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationBag {
    values: ConfigLayer,
}

impl ConfigurationBag {
    pub fn from_layers<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = ConfigLayer>,
    {
        let mut values = ConfigLayer::new();
        for layer in layers {
            values.extend(layer);
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.values.get(key).map(ToString::to_string)
    }

    pub fn require_text(&self, key: &str) -> Result<String, SettingError> {
        self.text(key).ok_or_else(|| SettingError::Missing(key.to_string()))
    }

    pub fn require_parsed<T>(&self, key: &str) -> Result<T, SettingError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.require_text(key)?;
        raw.trim().parse::<T>().map_err(|e| SettingError::Invalid {
            key: key.to_string(),
            reason: format!("{:?}: {}", raw, e),
        })
    }

    /// A separator token such as `newline` or `delimiter`, with escapes expanded.
    pub fn require_token(&self, key: &str) -> Result<String, SettingError> {
        let token = unescape_token(&self.require_text(key)?);
        if token.is_empty() {
            return Err(SettingError::Invalid {
                key: key.to_string(),
                reason: "separator must not be empty".to_string(),
            });
        }
        Ok(token)
    }

    pub fn db_settings(&self) -> Result<DbSettings, SettingError> {
        Ok(DbSettings {
            host: self.require_text("db_host")?,
            port: self.require_parsed("db_port")?,
            name: self.require_text("db_name")?,
            user: self.require_text("db_user")?,
            password: self.require_text("db_pass")?,
        })
    }
}

/// Where the environment layer comes from.
#[derive(Debug, Clone, Default)]
pub enum Environment {
    #[default]
    Process,
    Fixed(Vec<(String, String)>),
}

impl Environment {
    fn layer(&self) -> ConfigLayer {
        match self {
            Environment::Process => std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .map(|(k, v)| (k.to_lowercase(), ConfigValue::Text(v)))
                .collect(),
            Environment::Fixed(vars) => vars
                .iter()
                .map(|(k, v)| (k.to_lowercase(), ConfigValue::Text(v.clone())))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolver {
    file_path: PathBuf,
    environment: Environment,
}

impl ConfigResolver {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            environment: Environment::Process,
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Never fails: file problems degrade to an empty layer and a log line.
    pub fn resolve(&self, overrides: &ConfigLayer) -> ConfigurationBag {
        let file_layer = match load_file_layer(&self.file_path) {
            Ok(Some(layer)) => {
                debug!("Loaded {} keys from {}", layer.len(), self.file_path.display());
                layer
            }
            Ok(None) => {
                info!("No configuration file present at {}", self.file_path.display());
                ConfigLayer::new()
            }
            Err(e) => {
                warn!("Ignoring configuration file: {}", e);
                ConfigLayer::new()
            }
        };

        ConfigurationBag::from_layers([file_layer, self.environment.layer(), overrides.clone()])
    }
}

/// `Ok(None)` when the file does not exist.
pub fn load_file_layer(path: &Path) -> Result<Option<ConfigLayer>, ConfigLoadError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigLoadError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if raw.trim().is_empty() {
        return Ok(Some(ConfigLayer::new()));
    }

    let document: Value = serde_yaml::from_str(&raw).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let mapping = match document {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Ok(Some(ConfigLayer::new())),
        _ => return Err(ConfigLoadError::NotAMapping(path.to_path_buf())),
    };

    let mut layer = ConfigLayer::new();
    for (key, value) in mapping {
        let key = match key {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                warn!("Skipping non-scalar configuration key {:?}", other);
                continue;
            }
        };
        match value {
            Value::Null => debug!("Skipping null configuration value for {}", key),
            Value::Sequence(_) | Value::Mapping(_) => {
                warn!("Skipping nested configuration value for {}", key)
            }
            scalar => {
                if let Some(value) = to_config_value(scalar) {
                    layer.insert(key, value);
                }
            }
        }
    }
    Ok(Some(layer))
}

fn to_config_value(value: Value) -> Option<ConfigValue> {
    match value {
        Value::String(s) => Some(ConfigValue::Text(s)),
        Value::Bool(b) => Some(ConfigValue::Boolean(b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(ConfigValue::Integer(i))
            } else if n.is_u64() {
                Some(ConfigValue::Text(n.to_string()))
            } else {
                n.as_f64().map(ConfigValue::Float)
            }
        }
        Value::Tagged(tagged) => to_config_value(tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Expands `\n`, `\r`, `\t` and `\\`. Other backslashes are kept as written.
pub fn unescape_token(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

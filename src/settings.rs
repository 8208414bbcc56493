//! Runtime settings: command line, environment and an optional config file.
//!
//! Values are layered with the `config` crate, later layers winning:
//!
//! 1. built-in defaults
//! 2. the file given with `--config` (TOML)
//! 3. `VERSIONWATCH_*` environment variables
//! 4. command-line flags, or their plain environment variables (`WAIT`,
//!    `PORT`, `KAFKA_BROKERS`, `KAFKA_TOPIC`, `KAFKA_SCHEMA_REGISTRY_URL`, ...)

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A source could not be read or deserialized.
    #[error("load settings failed: {0}")]
    Load(#[from] ConfigError),

    /// A duration string has no known unit or no valid number.
    #[error("invalid duration '{0}': expected a number followed by ns, us, ms, s, m or h")]
    Duration(String),

    /// A required value is missing or empty.
    #[error("{0} is required")]
    Missing(&'static str),

    /// A value is present but not usable.
    #[error("{field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Parser, Debug, Default)]
#[command(name = "versionwatch")]
#[command(about = "Collects available versions of an application and publishes them to a Kafka topic")]
pub struct Args {
    /// Time to wait before the next version collect (e.g. "1h", "30m", "90s")
    #[arg(long, env = "WAIT")]
    pub wait: Option<String>,

    /// Port the metrics endpoint listens on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Kafka brokers (comma-separated)
    #[arg(long, env = "KAFKA_BROKERS")]
    pub kafka_brokers: Option<String>,

    /// Kafka topic the versions are published to
    #[arg(long, env = "KAFKA_TOPIC")]
    pub kafka_topic: Option<String>,

    /// Schema registry URL
    #[arg(long, env = "KAFKA_SCHEMA_REGISTRY_URL")]
    pub kafka_schema_registry_url: Option<String>,

    /// Fixed schema id; skips the schema registry
    #[arg(long, env = "SCHEMA_ID")]
    pub schema_id: Option<u32>,

    /// Base URL of the Docker registry holding the catalog
    #[arg(long)]
    pub catalog_url: Option<String>,

    /// Repository whose tags are collected
    #[arg(long)]
    pub catalog_repository: Option<String>,

    /// Application name stamped on every version
    #[arg(long)]
    pub application_name: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(deserialize_with = "deserialize_duration")]
    pub wait: Duration,
    pub port: u16,
    pub kafka_brokers: String,
    pub kafka_topic: String,
    #[serde(default)]
    pub kafka_schema_registry_url: Option<String>,
    #[serde(default)]
    pub schema_id: Option<u32>,
    pub catalog_url: String,
    pub catalog_repository: String,
    pub application_name: String,
}

impl Settings {
    /// Merge every source and validate the result.
    pub fn load(args: &Args) -> Result<Self, SettingsError> {
        Self::load_with_env(args, Environment::with_prefix("VERSIONWATCH"))
    }

    fn load_with_env(args: &Args, env: Environment) -> Result<Self, SettingsError> {
        let mut builder = Config::builder()
            .set_default("wait", "1h")?
            .set_default("port", 9003)?
            .set_default("kafka_brokers", "")?
            .set_default("kafka_topic", "")?
            .set_default("catalog_url", "https://gcr.io")?
            .set_default("catalog_repository", "google_containers/hyperkube-amd64")?
            .set_default("application_name", "Kubernetes")?;

        if let Some(path) = &args.config {
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        let settings: Settings = builder
            .add_source(env)
            .set_override_option("wait", args.wait.clone())?
            .set_override_option("port", args.port.map(i64::from))?
            .set_override_option("kafka_brokers", args.kafka_brokers.clone())?
            .set_override_option("kafka_topic", args.kafka_topic.clone())?
            .set_override_option(
                "kafka_schema_registry_url",
                args.kafka_schema_registry_url.clone(),
            )?
            .set_override_option("schema_id", args.schema_id.map(i64::from))?
            .set_override_option("catalog_url", args.catalog_url.clone())?
            .set_override_option("catalog_repository", args.catalog_repository.clone())?
            .set_override_option("application_name", args.application_name.clone())?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the process cannot run with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.wait.is_zero() {
            return Err(SettingsError::Invalid {
                field: "wait",
                reason: "must be greater than zero",
            });
        }
        if self.port == 0 {
            return Err(SettingsError::Invalid {
                field: "port",
                reason: "must not be 0",
            });
        }
        if self.kafka_brokers.trim().is_empty() {
            return Err(SettingsError::Missing("kafka brokers"));
        }
        if self.kafka_topic.trim().is_empty() {
            return Err(SettingsError::Missing("kafka topic"));
        }
        let has_registry = self
            .kafka_schema_registry_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());
        if !has_registry && self.schema_id.is_none() {
            return Err(SettingsError::Missing("kafka schema registry url"));
        }
        if self.catalog_url.trim().is_empty() {
            return Err(SettingsError::Missing("catalog url"));
        }
        if self.application_name.trim().is_empty() {
            return Err(SettingsError::Missing("application name"));
        }
        Ok(())
    }
}

/// Suffix to nanoseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
    ("m", 60_000_000_000.0),
    ("h", 3_600_000_000_000.0),
];

/// Parse duration strings like "1h", "30m", "1.5s", "250ms", "16.958µs"
pub fn parse_duration(s: &str) -> Result<Duration, SettingsError> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str
                .trim()
                .parse()
                .map_err(|_| SettingsError::Duration(s.to_string()))?;
            if !val.is_finite() || val < 0.0 {
                return Err(SettingsError::Duration(s.to_string()));
            }
            return Ok(Duration::from_nanos((val * multiplier) as u64));
        }
    }

    Err(SettingsError::Duration(s.to_string()))
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn required_args() -> Args {
        Args {
            kafka_brokers: Some("localhost:9092".to_string()),
            kafka_topic: Some("versions".to_string()),
            kafka_schema_registry_url: Some("http://localhost:8081".to_string()),
            ..Args::default()
        }
    }

    fn no_env() -> Environment {
        Environment::with_prefix("VERSIONWATCH").source(Some(HashMap::new()))
    }

    fn env(vars: &[(&str, &str)]) -> Environment {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        Environment::with_prefix("VERSIONWATCH").source(Some(vars))
    }

    #[test]
    fn test_parse_hours_and_minutes() {
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(1800));
    }

    #[test]
    fn test_parse_seconds() {
        let d = parse_duration("29.992671083s").unwrap();
        assert!((d.as_secs_f64() - 29.992671083).abs() < 0.0001);
    }

    #[test]
    fn test_parse_milliseconds() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn test_parse_microseconds() {
        assert_eq!(parse_duration("16.958µs").unwrap().as_nanos(), 16958);
        assert_eq!(parse_duration("5us").unwrap().as_nanos(), 5000);
    }

    #[test]
    fn test_parse_nanoseconds() {
        assert_eq!(parse_duration("0ns").unwrap().as_nanos(), 0);
    }

    #[test]
    fn parse_rejects_unknown_and_negative() {
        assert!(matches!(parse_duration("10"), Err(SettingsError::Duration(_))));
        assert!(matches!(parse_duration("1d"), Err(SettingsError::Duration(_))));
        assert!(matches!(parse_duration("-1s"), Err(SettingsError::Duration(_))));
        assert!(matches!(parse_duration("abcs"), Err(SettingsError::Duration(_))));
    }

    #[test]
    fn defaults_apply() {
        let settings = Settings::load_with_env(&required_args(), no_env()).unwrap();

        assert_eq!(settings.wait, Duration::from_secs(3600));
        assert_eq!(settings.port, 9003);
        assert_eq!(settings.catalog_url, "https://gcr.io");
        assert_eq!(settings.catalog_repository, "google_containers/hyperkube-amd64");
        assert_eq!(settings.application_name, "Kubernetes");
        assert_eq!(settings.schema_id, None);
    }

    #[test]
    fn cli_overrides_environment() {
        let args = Args {
            port: Some(9100),
            wait: Some("5m".to_string()),
            ..required_args()
        };
        let settings =
            Settings::load_with_env(&args, env(&[("VERSIONWATCH_PORT", "9200")])).unwrap();

        assert_eq!(settings.port, 9100);
        assert_eq!(settings.wait, Duration::from_secs(300));
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::load_with_env(
            &required_args(),
            env(&[
                ("VERSIONWATCH_PORT", "9200"),
                ("VERSIONWATCH_APPLICATION_NAME", "nginx"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.port, 9200);
        assert_eq!(settings.application_name, "nginx");
    }

    #[test]
    fn config_file_is_layered_under_environment() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
wait = "10m"
port = 9300
kafka_brokers = "kafka-1:9092,kafka-2:9092"
kafka_topic = "file-topic"
schema_id = 5
"#
        )
        .unwrap();

        let args = Args {
            config: Some(file.path().to_path_buf()),
            ..Args::default()
        };
        let settings = Settings::load_with_env(
            &args,
            env(&[("VERSIONWATCH_KAFKA_TOPIC", "env-topic")]),
        )
        .unwrap();

        assert_eq!(settings.wait, Duration::from_secs(600));
        assert_eq!(settings.port, 9300);
        assert_eq!(settings.kafka_brokers, "kafka-1:9092,kafka-2:9092");
        assert_eq!(settings.kafka_topic, "env-topic");
        assert_eq!(settings.schema_id, Some(5));
        assert_eq!(settings.kafka_schema_registry_url, None);
    }

    #[test]
    fn missing_config_file_fails() {
        let args = Args {
            config: Some(PathBuf::from("/nonexistent/versionwatch.toml")),
            ..required_args()
        };
        let err = Settings::load_with_env(&args, no_env()).unwrap_err();
        assert!(matches!(err, SettingsError::Load(_)));
    }

    #[test]
    fn invalid_wait_fails_to_load() {
        let args = Args {
            wait: Some("soon".to_string()),
            ..required_args()
        };
        let err = Settings::load_with_env(&args, no_env()).unwrap_err();
        assert!(matches!(err, SettingsError::Load(_)));
    }

    #[test]
    fn validate_rejects_each_missing_value() {
        let base = Settings::load_with_env(&required_args(), no_env()).unwrap();

        let mut settings = base.clone();
        settings.kafka_brokers = String::new();
        assert_eq!(settings.validate().unwrap_err().to_string(), "kafka brokers is required");

        let mut settings = base.clone();
        settings.kafka_topic = " ".to_string();
        assert_eq!(settings.validate().unwrap_err().to_string(), "kafka topic is required");

        let mut settings = base.clone();
        settings.kafka_schema_registry_url = None;
        assert_eq!(
            settings.validate().unwrap_err().to_string(),
            "kafka schema registry url is required"
        );

        let mut settings = base.clone();
        settings.port = 0;
        assert_eq!(settings.validate().unwrap_err().to_string(), "port must not be 0");

        let mut settings = base;
        settings.wait = Duration::ZERO;
        assert_eq!(
            settings.validate().unwrap_err().to_string(),
            "wait must be greater than zero"
        );
    }

    #[test]
    fn static_schema_id_replaces_registry_url() {
        let args = Args {
            kafka_schema_registry_url: None,
            schema_id: Some(3),
            ..required_args()
        };
        let settings = Settings::load_with_env(&args, no_env()).unwrap();
        assert_eq!(settings.schema_id, Some(3));
    }

    #[test]
    fn missing_brokers_fails_to_load() {
        let args = Args {
            kafka_brokers: None,
            ..required_args()
        };
        let err = Settings::load_with_env(&args, no_env()).unwrap_err();
        assert!(matches!(err, SettingsError::Missing("kafka brokers")));
    }

    #[test]
    fn cli_flags_parse() {
        let args = Args::try_parse_from([
            "versionwatch",
            "--wait",
            "2h",
            "--port",
            "9010",
            "--kafka-brokers",
            "k:9092",
            "--kafka-topic",
            "t",
            "--kafka-schema-registry-url",
            "http://r:8081",
        ])
        .unwrap();

        assert_eq!(args.wait.as_deref(), Some("2h"));
        assert_eq!(args.port, Some(9010));
        assert_eq!(args.kafka_topic.as_deref(), Some("t"));
    }
}

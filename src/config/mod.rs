use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub message_broker: MessageBrokerConfig,
    #[serde(default)]
    pub files: FilesConfig,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// API server address
    #[serde(default = "default_api_address")]
    pub address: String,
    /// API server port
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_api_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    5001
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Static file serving configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilesConfig {
    /// Directory that `/app/<folder>/<camera_id>/<filename>` is resolved against
    #[serde(default = "default_files_root")]
    pub root: PathBuf,
}

fn default_files_root() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Message broker (RabbitMQ) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageBrokerConfig {
    /// Broker host name
    #[serde(default = "default_rabbitmq_host")]
    pub host: String,
    /// Broker AMQP port
    #[serde(default = "default_rabbitmq_port")]
    pub port: u16,
    #[serde(default = "default_rabbitmq_username")]
    pub username: String,
    #[serde(default = "default_rabbitmq_password")]
    pub password: String,
    /// Virtual host
    #[serde(default = "default_rabbitmq_vhost")]
    pub vhost: String,
    /// Heartbeat interval in seconds
    #[serde(default = "default_rabbitmq_heartbeat")]
    pub heartbeat_secs: u16,
    /// Fanout exchange the framers are bound to
    #[serde(default = "default_rabbitmq_exchange")]
    pub exchange: String,
    /// Durable queue receiving audit events
    #[serde(default = "default_rabbitmq_audit_queue")]
    pub audit_queue: String,
}

fn default_rabbitmq_host() -> String {
    "localhost".to_string()
}

fn default_rabbitmq_port() -> u16 {
    5672
}

fn default_rabbitmq_username() -> String {
    "guest".to_string()
}

fn default_rabbitmq_password() -> String {
    "guest".to_string()
}

fn default_rabbitmq_vhost() -> String {
    "/".to_string()
}

fn default_rabbitmq_heartbeat() -> u16 {
    600 // 10 minutes
}

fn default_rabbitmq_exchange() -> String {
    "rtspurl_for_framer".to_string()
}

fn default_rabbitmq_audit_queue() -> String {
    "vms_logs".to_string()
}

impl MessageBrokerConfig {
    /// AMQP URI for this configuration, heartbeat included.
    pub fn uri(&self) -> String {
        // The default vhost "/" has to be percent-encoded in the URI path.
        let vhost = self.vhost.replace('%', "%25").replace('/', "%2f");
        format!(
            "amqp://{}:{}@{}:{}/{}?heartbeat={}",
            self.username, self.password, self.host, self.port, vhost, self.heartbeat_secs
        )
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: default_api_address(),
            port: default_api_port(),
            log_level: default_log_level(),
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: default_files_root(),
        }
    }
}

impl Default for MessageBrokerConfig {
    fn default() -> Self {
        Self {
            host: default_rabbitmq_host(),
            port: default_rabbitmq_port(),
            username: default_rabbitmq_username(),
            password: default_rabbitmq_password(),
            vhost: default_rabbitmq_vhost(),
            heartbeat_secs: default_rabbitmq_heartbeat(),
            exchange: default_rabbitmq_exchange(),
            audit_queue: default_rabbitmq_audit_queue(),
        }
    }
}

/// Load configuration from a file or use default
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => {
            let config_str = std::fs::read_to_string(path)
                .context(format!("Failed to read config file: {:?}", path))?;

            let config = if path.extension().map_or(false, |ext| ext == "json") {
                serde_json::from_str(&config_str).context("Failed to parse JSON config")?
            } else if path.extension().map_or(false, |ext| ext == "toml") {
                toml::from_str(&config_str).context("Failed to parse TOML config")?
            } else {
                return Err(anyhow::anyhow!("Unsupported config file format"));
            };

            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

/// Apply `VMS_*` environment variables on top of a loaded configuration
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(address) = lookup("VMS_API_ADDRESS") {
        config.api.address = address;
    }
    if let Some(port) = lookup("VMS_API_PORT") {
        config.api.port = port
            .parse()
            .context(format!("Invalid VMS_API_PORT: {}", port))?;
    }

    let broker = &mut config.message_broker;
    if let Some(host) = lookup("VMS_BROKER_HOST") {
        broker.host = host;
    }
    if let Some(port) = lookup("VMS_BROKER_PORT") {
        broker.port = port
            .parse()
            .context(format!("Invalid VMS_BROKER_PORT: {}", port))?;
    }
    if let Some(username) = lookup("VMS_BROKER_USERNAME") {
        broker.username = username;
    }
    if let Some(password) = lookup("VMS_BROKER_PASSWORD") {
        broker.password = password;
    }
    if let Some(vhost) = lookup("VMS_BROKER_VHOST") {
        broker.vhost = vhost;
    }
    if let Some(heartbeat) = lookup("VMS_BROKER_HEARTBEAT_SECS") {
        broker.heartbeat_secs = heartbeat
            .parse()
            .context(format!("Invalid VMS_BROKER_HEARTBEAT_SECS: {}", heartbeat))?;
    }

    if let Some(root) = lookup("VMS_FILES_ROOT") {
        config.files.root = PathBuf::from(root);
    }

    Ok(())
}

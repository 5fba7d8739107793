use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub todo: TodoConfig,
    #[serde(default)]
    pub promo: PromoConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TodoConfig {
    #[serde(default = "default_todo_port")]
    pub port: u16,
}

impl Default for TodoConfig {
    fn default() -> Self {
        Self { port: default_todo_port() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromoConfig {
    #[serde(default = "default_promo_port")]
    pub port: u16,
    /// Number of codes produced by `POST /seed-promocodes`.
    #[serde(default = "default_seed_count")]
    pub seed_count: usize,
}

impl Default for PromoConfig {
    fn default() -> Self {
        Self { port: default_promo_port(), seed_count: default_seed_count() }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            data_dir: default_data_dir(),
            namespace: default_namespace(),
        }
    }
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_todo_port() -> u16 { 8081 }
fn default_promo_port() -> u16 { 8082 }
fn default_seed_count() -> usize { 50 }
fn default_data_dir() -> String { "data".into() }
fn default_namespace() -> String { "default".into() }

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

/// Build a config purely from environment variables, starting from defaults.
pub fn from_env() -> Result<AppConfig> {
    from_vars(|key| std::env::var(key).ok())
}

/// Same as [`from_env`], reading variables through `lookup`.
/// A variable that is set but does not parse is an error, not a silent default.
pub fn from_vars<F>(lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = AppConfig::default();
    if let Some(host) = lookup("SERVER_HOST") {
        cfg.server.host = host;
    }
    if let Some(w) = parse_var::<usize>(&lookup, "TOKIO_WORKER_THREADS")? {
        cfg.server.worker_threads = Some(w);
    }
    if let Some(p) = parse_var::<u16>(&lookup, "TODO_PORT")? {
        cfg.todo.port = p;
    }
    if let Some(p) = parse_var::<u16>(&lookup, "PROMO_PORT")? {
        cfg.promo.port = p;
    }
    if let Some(backend) = parse_var::<StoreBackend>(&lookup, "STORE_BACKEND")? {
        cfg.store.backend = backend;
    }
    if let Some(dir) = lookup("STORE_DIR") {
        cfg.store.data_dir = dir;
    }
    if let Some(ns) = lookup("STORE_NAMESPACE") {
        cfg.store.namespace = ns;
    }
    Ok(cfg)
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("{key}={raw:?} 无效: {e}")),
        None => Ok(None),
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(StoreBackend::File),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("unknown store backend {other:?}, expected file or memory")),
        }
    }
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`); fall back to env vars only when the file does not exist.
    pub fn load_or_env() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_or_env_from(&path)
    }

    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_env_from(path: &str) -> Result<Self> {
        let mut cfg = match std::fs::read_to_string(path) {
            Ok(content) => load_from_str(&content).map_err(|e| anyhow!("{path}: {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => from_env()?,
            Err(e) => return Err(anyhow!("{path}: {e}")),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize();
        if self.todo.port == 0 || self.promo.port == 0 {
            return Err(anyhow!("todo.port / promo.port 必须在 1..=65535 范围内"));
        }
        if self.promo.seed_count == 0 {
            return Err(anyhow!("promo.seed_count 必须 >= 1"));
        }
        self.store.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(anyhow!("store.namespace 不能为空"));
        }
        // 命名空间会被用作文件名
        if self.namespace.contains(['/', '\\']) || self.namespace.contains("..") {
            return Err(anyhow!("store.namespace 不能包含路径分隔符"));
        }
        if self.backend == StoreBackend::File && self.data_dir.trim().is_empty() {
            return Err(anyhow!("store.data_dir 为空；file 后端需要数据目录"));
        }
        Ok(())
    }
}

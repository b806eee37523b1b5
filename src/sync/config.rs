use crate::error::SyncError;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_API_BASE: &str = "https://api.notion.com/v1";
pub const DEFAULT_API_VERSION: &str = "2022-06-28";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionConfig {
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub api_base: String,
    pub api_version: String,
    pub request_timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CollectionsConfig {
    pub books: String,
    pub years: String,
    /// Target of log-append mode; falls back to `years`.
    pub log: Option<String>,
}

impl CollectionsConfig {
    pub fn log_collection(&self) -> &str {
        match self.log.as_deref() {
            Some(id) if !id.trim().is_empty() => id,
            _ => &self.years,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyNames {
    pub title: String,
    pub status: String,
    pub finished_date: String,
    pub books_read: String,
    pub most_recent: String,
    pub least_recent: String,
    pub log_book: String,
    pub log_date: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            title: "Name".to_string(),
            status: "Status".to_string(),
            finished_date: "Fim".to_string(),
            books_read: "Books Read".to_string(),
            most_recent: "Most Recent".to_string(),
            least_recent: "Least Recent".to_string(),
            log_book: "Book".to_string(),
            log_date: "Date Read".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusLabels {
    pub finished: String,
    pub not_started: String,
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self {
            finished: "Lido".to_string(),
            not_started: "Não iniciado".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Number of newest not-started books to flag; 0 clears every flag.
    pub most_recent: usize,
    /// Number of oldest not-started books to flag; 0 clears every flag.
    pub least_recent: usize,
    /// Off when the books database has no such checkbox property.
    pub most_recent_enabled: bool,
    pub least_recent_enabled: bool,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            most_recent: 2,
            least_recent: 2,
            most_recent_enabled: true,
            least_recent_enabled: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    #[default]
    Relation,
    Log,
}

impl LinkMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkMode::Relation => "relation",
            LinkMode::Log => "log",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "relation" => Some(LinkMode::Relation),
            "log" => Some(LinkMode::Log),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LinkConfig {
    pub mode: LinkMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromoteConfig {
    pub enabled: bool,
}

impl Default for PromoteConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    pub notion: NotionConfig,
    pub collections: CollectionsConfig,
    pub properties: PropertyNames,
    pub labels: StatusLabels,
    pub ranking: RankingConfig,
    pub link: LinkConfig,
    pub promote: PromoteConfig,
}

impl SyncConfig {
    pub fn token(&self) -> Result<&str> {
        match self.notion.token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(SyncError::MissingSetting("NOTION_TOKEN").into()),
        }
    }

    /// Collection ids are only needed once a run touches the store.
    pub fn require_collections(&self) -> Result<()> {
        if self.collections.books.trim().is_empty() {
            return Err(SyncError::MissingSetting("BOOKS_DATABASE_ID").into());
        }
        let (target, setting) = match self.link.mode {
            LinkMode::Relation => (self.collections.years.as_str(), "YEARS_DATABASE_ID"),
            LinkMode::Log => (self.collections.log_collection(), "LOG_DATABASE_ID"),
        };
        if target.trim().is_empty() {
            return Err(SyncError::MissingSetting(setting).into());
        }
        Ok(())
    }
}

type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn env_non_empty(get: EnvLookup<'_>, var: &str) -> Option<String> {
    match get(var) {
        Some(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn env_or_string(get: EnvLookup<'_>, var: &str, fallback: &str) -> String {
    env_non_empty(get, var).unwrap_or_else(|| fallback.to_string())
}

fn env_or_string_first(get: EnvLookup<'_>, vars: &[&str], fallback: &str) -> String {
    vars.iter()
        .find_map(|var| env_non_empty(get, var))
        .unwrap_or_else(|| fallback.to_string())
}

fn env_or_u64(get: EnvLookup<'_>, var: &str, fallback: u64) -> u64 {
    match get(var) {
        Some(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        None => fallback,
    }
}

fn env_or_usize(get: EnvLookup<'_>, var: &str, fallback: usize) -> usize {
    match get(var) {
        Some(v) => v.trim().parse::<usize>().ok().unwrap_or(fallback),
        None => fallback,
    }
}

fn env_or_bool(get: EnvLookup<'_>, var: &str, fallback: bool) -> bool {
    match get(var) {
        Some(v) => match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "on" => true,
            "0" | "false" | "FALSE" | "no" | "off" => false,
            _ => fallback,
        },
        None => fallback,
    }
}

fn validate(cfg: &SyncConfig) -> Result<()> {
    let base = cfg.notion.api_base.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(anyhow!("invalid notion api base: must be an http(s) url"));
    }
    if cfg.notion.api_version.trim().is_empty() {
        return Err(anyhow!("invalid notion api version: cannot be empty"));
    }
    if cfg.notion.request_timeout_secs == 0 {
        return Err(anyhow!("invalid request timeout: must be >= 1 second"));
    }
    if cfg.labels.finished.trim().is_empty() || cfg.labels.not_started.trim().is_empty() {
        return Err(anyhow!("invalid status labels: finished and not_started cannot be empty"));
    }
    if cfg.labels.finished == cfg.labels.not_started {
        return Err(anyhow!("invalid status labels: finished and not_started must differ"));
    }
    let props = &cfg.properties;
    for (key, value) in [
        ("title", &props.title),
        ("status", &props.status),
        ("finished_date", &props.finished_date),
        ("books_read", &props.books_read),
        ("most_recent", &props.most_recent),
        ("least_recent", &props.least_recent),
        ("log_book", &props.log_book),
        ("log_date", &props.log_date),
    ] {
        if value.trim().is_empty() {
            return Err(anyhow!("invalid property name for `{key}`: cannot be empty"));
        }
    }
    if cfg.ranking.most_recent_enabled
        && cfg.ranking.least_recent_enabled
        && props.most_recent == props.least_recent
    {
        return Err(anyhow!(
            "invalid ranking: most_recent and least_recent passes cannot share one property"
        ));
    }
    Ok(())
}

pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("SHELF_SYNC_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let home = dirs::home_dir()?;
    Some(home.join(".shelf-sync").join("config.toml"))
}

fn parse_file_config(raw: &str) -> Result<SyncConfig> {
    toml::from_str(raw).map_err(|err| SyncError::InvalidConfig(err.to_string()).into())
}

fn read_file_config() -> Result<SyncConfig> {
    let Some(path) = resolve_config_path() else {
        return Ok(SyncConfig::default());
    };
    if !path.exists() {
        return Ok(SyncConfig::default());
    }

    let raw = fs::read_to_string(&path)
        .map_err(|err| SyncError::InvalidConfig(format!("{}: {err}", path.display())))?;
    parse_file_config(&raw).map_err(|err| anyhow!("failed to parse {}: {err}", path.display()))
}

fn apply_env_overrides(cfg: &mut SyncConfig, get: EnvLookup<'_>) {
    if let Some(token) = env_non_empty(get, "NOTION_TOKEN") {
        cfg.notion.token = Some(token);
    }
    cfg.notion.api_base = env_or_string(get, "NOTION_API_BASE", &cfg.notion.api_base);
    cfg.notion.api_version = env_or_string(get, "NOTION_VERSION", &cfg.notion.api_version);
    cfg.notion.request_timeout_secs = env_or_u64(
        get,
        "SHELF_SYNC_REQUEST_TIMEOUT_SECS",
        cfg.notion.request_timeout_secs,
    );

    cfg.collections.books = env_or_string_first(
        get,
        &["BOOKS_DATABASE_ID", "DATABASE_A_ID"],
        &cfg.collections.books,
    );
    cfg.collections.years = env_or_string_first(
        get,
        &["YEARS_DATABASE_ID", "DATABASE_B_ID"],
        &cfg.collections.years,
    );
    if let Some(log) = env_non_empty(get, "LOG_DATABASE_ID") {
        cfg.collections.log = Some(log);
    }

    cfg.labels.finished = env_or_string(get, "SHELF_SYNC_FINISHED_LABEL", &cfg.labels.finished);
    cfg.labels.not_started =
        env_or_string(get, "SHELF_SYNC_NOT_STARTED_LABEL", &cfg.labels.not_started);
    cfg.ranking.most_recent = env_or_usize(get, "SHELF_SYNC_MOST_RECENT", cfg.ranking.most_recent);
    cfg.ranking.least_recent =
        env_or_usize(get, "SHELF_SYNC_LEAST_RECENT", cfg.ranking.least_recent);
    cfg.ranking.most_recent_enabled = env_or_bool(
        get,
        "SHELF_SYNC_MOST_RECENT_ENABLED",
        cfg.ranking.most_recent_enabled,
    );
    cfg.ranking.least_recent_enabled = env_or_bool(
        get,
        "SHELF_SYNC_LEAST_RECENT_ENABLED",
        cfg.ranking.least_recent_enabled,
    );
    cfg.promote.enabled = env_or_bool(get, "SHELF_SYNC_PROMOTE", cfg.promote.enabled);
    if let Some(mode) = env_non_empty(get, "SHELF_SYNC_LINK_MODE").and_then(|m| LinkMode::parse(&m))
    {
        cfg.link.mode = mode;
    }
}

pub fn load_config() -> Result<SyncConfig> {
    let mut cfg = read_file_config()?;
    apply_env_overrides(&mut cfg, &|var: &str| env::var(var).ok());
    validate(&cfg)?;
    Ok(cfg)
}

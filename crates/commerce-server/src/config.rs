use std::path::{Component, Path, PathBuf};

use commerce_core::error::AppError;
use commerce_core::models::{SkipPolicy, SourceKind};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_TITLE: &str = "J.Crew men sweaters";

/// Server settings, read from `COMMERCE_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Root for `/v1/process/from-file` paths.
    pub data_dir: PathBuf,
    /// Snapshot the `/commerce.txt` artifact is generated from.
    pub source: PathBuf,
    pub source_kind: SourceKind,
    /// Where the generated artifact is written.
    pub output: PathBuf,
    pub title: String,
    pub robots: PathBuf,
    pub skip_policy: SkipPolicy,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset and blank values take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("COMMERCE_PORT") {
            None => DEFAULT_PORT,
            Some(raw) => raw.parse::<u16>().ok().filter(|p| *p != 0).ok_or_else(|| {
                AppError::ConfigError(format!(
                    "Invalid COMMERCE_PORT '{raw}': must be an integer between 1 and 65535"
                ))
            })?,
        };

        let data_dir = get("COMMERCE_DATA_DIR").map_or_else(|| PathBuf::from("data"), PathBuf::from);
        let source = get("COMMERCE_SOURCE")
            .map_or_else(|| data_dir.join("jcrew_mens_sweaters.html"), PathBuf::from);
        let output = get("COMMERCE_OUTPUT")
            .map_or_else(|| data_dir.join("commerce.txt"), PathBuf::from);

        let source_kind = match get("COMMERCE_SOURCE_KIND") {
            Some(raw) => raw
                .parse::<SourceKind>()
                .map_err(|e| AppError::ConfigError(format!("Invalid COMMERCE_SOURCE_KIND: {e}")))?,
            None => SourceKind::from_path(&source).ok_or_else(|| {
                AppError::ConfigError(format!(
                    "Cannot infer the kind of {}; set COMMERCE_SOURCE_KIND",
                    source.display()
                ))
            })?,
        };

        let skip_policy = match get("COMMERCE_SKIP_POLICY") {
            Some(raw) => raw
                .parse::<SkipPolicy>()
                .map_err(|e| AppError::ConfigError(format!("Invalid COMMERCE_SKIP_POLICY: {e}")))?,
            None => SkipPolicy::default(),
        };

        Ok(Self {
            port,
            data_dir,
            source,
            source_kind,
            output,
            title: get("COMMERCE_TITLE").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            robots: get("COMMERCE_ROBOTS").map_or_else(|| PathBuf::from("robots.txt"), PathBuf::from),
            skip_policy,
        })
    }

    /// Resolve a caller-supplied path inside the data directory.
    ///
    /// Only plain relative paths are accepted: absolute paths and `..`
    /// segments are rejected so requests cannot leave `data_dir`.
    pub fn data_path(&self, relative: &str) -> Result<PathBuf, AppError> {
        let relative = relative.trim();
        if relative.is_empty() {
            return Err(AppError::InvalidRequest("path must not be empty".into()));
        }

        let path = Path::new(relative);
        let escapes = path.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(AppError::InvalidRequest(format!(
                "path '{relative}' must be relative to the data directory"
            )));
        }

        Ok(self.data_dir.join(path))
    }
}

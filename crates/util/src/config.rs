use std::{env, fmt, path::PathBuf};

pub const DEFAULT_WEB_ROOT: &str = "wwwroot";

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Returns `true` when the current environment should behave as development.
    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Returns the canonical name used for logging labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Connection details for the document store holding reviews.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStoreConfig {
    pub connection_string: String,
    pub database_name: String,
    pub collection_name: String,
}

/// Which review backend the application should run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Memory,
    Document(DocumentStoreConfig),
}

impl StoreConfig {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Document(_) => "document",
        }
    }
}

/// Remote blob storage location for static images.
///
/// Either field may be blank; resolvers treat a blank field as "not configured".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobConfig {
    pub base_url: String,
    pub container_name: String,
}

impl BlobConfig {
    pub fn new(base_url: impl Into<String>, container_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            container_name: container_name.into(),
        }
    }

    /// Returns `true` when both the base URL and the container are non-blank.
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty() && !self.container_name.trim().is_empty()
    }

    pub fn container_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.container_name.trim_matches('/')
        )
    }
}

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub store: StoreConfig,
    pub blob: Option<BlobConfig>,
    pub web_root: PathBuf,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&env_value)?;

        let store = store_from_env()?;

        let base_url = non_blank_var("BLOB_BASE_URL");
        let container_name = non_blank_var("BLOB_CONTAINER_NAME");
        let blob = if base_url.is_some() || container_name.is_some() {
            Some(BlobConfig::new(
                base_url.unwrap_or_default(),
                container_name.unwrap_or_default(),
            ))
        } else {
            None
        };

        let web_root = non_blank_var("WEB_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WEB_ROOT));

        Ok(Self {
            environment,
            store,
            blob,
            web_root,
        })
    }
}

fn store_from_env() -> Result<StoreConfig, ConfigError> {
    let values = [
        ("DOCUMENT_STORE_URL", non_blank_var("DOCUMENT_STORE_URL")),
        ("DOCUMENT_STORE_DATABASE", non_blank_var("DOCUMENT_STORE_DATABASE")),
        ("DOCUMENT_STORE_COLLECTION", non_blank_var("DOCUMENT_STORE_COLLECTION")),
    ];

    match values {
        [(_, None), (_, None), (_, None)] => Ok(StoreConfig::Memory),
        [(_, Some(url)), (_, Some(database)), (_, Some(collection))] => {
            Ok(StoreConfig::Document(DocumentStoreConfig {
                connection_string: url,
                database_name: database,
                collection_name: collection,
            }))
        }
        partial => {
            let missing = partial
                .iter()
                .filter(|(_, value)| value.is_none())
                .map(|(key, _)| *key)
                .collect::<Vec<_>>()
                .join(", ");
            Err(ConfigError::IncompleteDocumentStore(missing))
        }
    }
}

fn non_blank_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Errors that can occur during configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    InvalidEnvironment(String),
    IncompleteDocumentStore(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvironment(value) => write!(
                f,
                "APP_ENV must be one of 'development', 'production', or 'test' (got {value})"
            ),
            Self::IncompleteDocumentStore(missing) => write!(
                f,
                "document store is partially configured, missing: {missing}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors surfaced by parsers and loaders.
///
/// Recognition itself never fails: missing data degrades to empty results.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Layout parse error: {0}")]
    LayoutParse(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Layout has no keys")]
    EmptyLayout,

    #[error("Dictionary has no usable words")]
    EmptyDictionary,
}

pub type Result<T> = std::result::Result<T, Error>;

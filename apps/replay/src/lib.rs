//! Swipe Replay - drives `swipe-core` from recorded or synthesized traces.

pub mod cli;
pub mod report;
pub mod trace;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use swipe_core::{EngineConfig, FsLoader, Strategy, SwipeEngine};

/// Loads the config file (or defaults) and applies a strategy override.
pub fn load_config(path: Option<&Path>, strategy: Option<&str>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => {
            EngineConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if let Some(name) = strategy {
        config.strategy = name.parse::<Strategy>()?;
    }
    config.validate()?;
    Ok(config)
}

/// `data_dir` first, then the default search directories.
pub fn loader_for(data_dir: Option<PathBuf>) -> FsLoader {
    let mut dirs = Vec::new();
    dirs.extend(data_dir);
    dirs.extend(FsLoader::default_dirs());
    FsLoader::new(dirs)
}

pub fn build_engine(config: EngineConfig, loader: &FsLoader, layout: &str) -> Result<SwipeEngine> {
    let engine = SwipeEngine::from_source(config, loader, layout)?;
    info!(
        layout = engine.layout().name(),
        keys = engine.key_count(),
        words = engine.word_count(),
        strategy = ?engine.strategy(),
        "Engine ready"
    );
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_strategy_override() {
        let config = load_config(None, Some("template")).unwrap();
        assert_eq!(config.strategy, Strategy::Template);
        assert!(load_config(None, Some("neural")).is_err());
    }

    #[test]
    fn test_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "strategy = \"template\"\n[scoring]\nmax_candidates = 3").unwrap();
        let config = load_config(Some(file.path()), None).unwrap();
        assert_eq!(config.strategy, Strategy::Template);
        assert_eq!(config.scoring.max_candidates, 3);
    }

    #[test]
    fn test_data_dir_is_searched_first() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader_for(Some(dir.path().to_path_buf()));
        assert_eq!(loader.search_dirs()[0], dir.path());
    }
}

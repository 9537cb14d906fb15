//! Layout and dictionary loading from a list of search directories.
//!
//! Each directory is tried in order: `layouts/<name>.json`,
//! `dict/words.txt` and an optional `dict/freq.tsv` next to it.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::keyboard::Layout;

pub const DATA_DIR_ENV: &str = "SWIPE_CORE_DATA_DIR";
const APP_DIR: &str = "swipe-core";
const WORDS_FILE: &str = "dict/words.txt";
const FREQ_FILE: &str = "dict/freq.tsv";

/// Supplies validated layout and dictionary structures to the engine.
pub trait DataSource {
    fn load_layout(&self, name: &str) -> Result<Layout>;

    fn load_dictionary(&self) -> Result<Dictionary>;

    /// Falls back to the built-in QWERTY for `"qwerty"`, otherwise to an
    /// empty layout.
    fn load_layout_or_empty(&self, name: &str) -> Layout {
        match self.load_layout(name) {
            Ok(layout) => layout,
            Err(e) if name == "qwerty" => {
                info!(error = %e, "Using built-in qwerty layout");
                Layout::qwerty()
            }
            Err(e) => {
                warn!(layout = name, error = %e, "Layout unavailable, continuing without keys");
                Layout::empty()
            }
        }
    }

    fn load_dictionary_or_empty(&self) -> Dictionary {
        self.load_dictionary().unwrap_or_else(|e| {
            warn!(error = %e, "Dictionary unavailable, recognition will return no candidates");
            Dictionary::new()
        })
    }
}

#[derive(Debug, Clone)]
pub struct FsLoader {
    search_dirs: Vec<PathBuf>,
}

impl Default for FsLoader {
    fn default() -> Self {
        Self::new(Self::default_dirs())
    }
}

impl FsLoader {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    /// `$SWIPE_CORE_DATA_DIR`, `./data`, the user data dir, then system dirs.
    pub fn default_dirs() -> Vec<PathBuf> {
        let mut dirs_list = Vec::new();
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            dirs_list.push(PathBuf::from(dir));
        }
        dirs_list.push(PathBuf::from("data"));
        if let Some(dir) = dirs::data_dir() {
            dirs_list.push(dir.join(APP_DIR));
        }
        dirs_list.push(PathBuf::from("/usr/local/share").join(APP_DIR));
        dirs_list.push(PathBuf::from("/usr/share").join(APP_DIR));
        dirs_list
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// First existing `dir/relative` across the search directories.
    pub fn find(&self, relative: impl AsRef<Path>) -> Option<PathBuf> {
        let relative = relative.as_ref();
        self.search_dirs
            .iter()
            .map(|dir| dir.join(relative))
            .find(|path| path.is_file())
    }

    fn require(&self, relative: &str) -> Result<PathBuf> {
        self.find(relative).ok_or_else(|| {
            Error::NotFound(format!(
                "{relative} in any of {}",
                self.search_dirs
                    .iter()
                    .map(|d| d.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
    }
}

impl DataSource for FsLoader {
    fn load_layout(&self, name: &str) -> Result<Layout> {
        let path = self.require(&format!("layouts/{name}.json"))?;
        let layout = Layout::from_json_str(&std::fs::read_to_string(&path)?)?;
        info!(path = %path.display(), keys = layout.len(), "Loaded layout");
        Ok(layout)
    }

    fn load_dictionary(&self) -> Result<Dictionary> {
        let words_path = self.require(WORDS_FILE)?;
        let words = std::fs::read_to_string(&words_path)?;

        // the frequency table must sit next to the word list it describes
        let freq_path = words_path
            .parent()
            .and_then(Path::parent)
            .map(|root| root.join(FREQ_FILE))
            .filter(|p| p.is_file());
        let freq = freq_path.as_deref().and_then(read_optional);

        let dictionary = Dictionary::from_sources(&words, freq.as_deref());
        if dictionary.is_empty() {
            return Err(Error::EmptyDictionary);
        }
        info!(
            path = %words_path.display(),
            words = dictionary.len(),
            frequencies = freq.is_some(),
            "Loaded dictionary"
        );
        Ok(dictionary)
    }
}

/// Reads a supplementary file. Unreadable files are skipped and invalid UTF-8
/// only spoils the lines it appears on.
fn read_optional(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Skipping unreadable frequency file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_find_walks_search_dirs_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write(second.path(), "dict/words.txt", "hello\n");
        let loader = FsLoader::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]);
        assert_eq!(loader.find(WORDS_FILE), Some(second.path().join(WORDS_FILE)));

        write(first.path(), "dict/words.txt", "world\n");
        assert_eq!(loader.find(WORDS_FILE), Some(first.path().join(WORDS_FILE)));
    }

    #[test]
    fn test_missing_files_are_not_found() {
        let dir = TempDir::new().unwrap();
        let loader = FsLoader::new(vec![dir.path().to_path_buf()]);
        assert!(matches!(loader.load_dictionary(), Err(Error::NotFound(_))));
        assert!(matches!(loader.load_layout("dvorak"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_default_dirs_include_local_data() {
        assert!(FsLoader::default_dirs().contains(&PathBuf::from("data")));
    }
}

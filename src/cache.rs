use color_eyre::Result;
use std::fs;
use std::path::{Path, PathBuf};

pub const LOG_FILE: &str = "lscan.log";

/// Registry of known cache files
const CACHE_FILES: &[&str] = &[LOG_FILE];

/// Manages cache directory and cache file operations
#[derive(Clone)]
pub struct CacheManager {
    pub(crate) cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(app_name: &str) -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine cache directory"))?
            .join(app_name);

        Ok(Self { cache_dir })
    }

    /// Create a CacheManager with a custom directory (primarily for testing)
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn cache_file(&self, filename: &str) -> PathBuf {
        self.cache_dir.join(filename)
    }

    /// Default location of the log file.
    pub fn log_file(&self) -> PathBuf {
        self.cache_file(LOG_FILE)
    }

    pub fn ensure_cache_dir(&self) -> Result<()> {
        if !self.cache_dir.exists() {
            fs::create_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }

    /// Remove every registered cache file. Files that cannot be removed are
    /// reported and skipped.
    pub fn clear_all(&self) -> Result<()> {
        for filename in CACHE_FILES {
            let file_path = self.cache_file(filename);
            if file_path.exists() {
                if let Err(e) = fs::remove_file(&file_path) {
                    eprintln!("Warning: Could not remove cache file {}: {}", filename, e);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_all_removes_log() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::with_dir(dir.path().join("lscan"));
        cache.ensure_cache_dir().unwrap();
        fs::write(cache.log_file(), "x").unwrap();
        fs::write(cache.cache_file("keep.txt"), "y").unwrap();

        cache.clear_all().unwrap();
        assert!(!cache.log_file().exists());
        assert!(cache.cache_file("keep.txt").exists());
    }
}

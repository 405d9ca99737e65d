//! Offline package cache
//!
//! Search results are kept in a text file in [`PackageList`]'s cache format
//! so later runs can show them without a backend.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use pk_config::Config;
use pk_errors::Error;
use pk_types::PackageList;
use tokio::fs;

#[derive(Debug, Clone)]
pub struct PackageCache {
    path: PathBuf,
}

impl PackageCache {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache at the configured location
    ///
    /// # Errors
    ///
    /// Returns an error if no path is configured and the system config
    /// directory cannot be determined.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Ok(Self::new(config.cache_path()?))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached list. A missing file is an empty cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains a malformed
    /// line.
    pub async fn load(&self) -> Result<PackageList, Error> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => Ok(PackageList::from_cache_str(&text)?),
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(PackageList::new()),
            Err(err) => Err(Error::io_with_path(&err, &self.path)),
        }
    }

    /// Replace the cache contents with `list`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory or file cannot be written.
    pub async fn save(&self, list: &PackageList) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io_with_path(&e, parent))?;
        }
        fs::write(&self.path, list.to_cache_string())
            .await
            .map_err(|e| Error::io_with_path(&e, &self.path))?;
        tracing::debug!(path = %self.path.display(), packages = list.len(), "saved package cache");
        Ok(())
    }

    /// Merge `results` into the cache, skipping packages already present,
    /// and return the merged list.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be read or written.
    pub async fn update(&self, results: &PackageList) -> Result<PackageList, Error> {
        let mut cached = self.load().await?;
        let added = results.iter().filter(|item| cached.add_item(item)).count();
        if added > 0 {
            self.save(&cached).await?;
        }
        tracing::debug!(added, total = cached.len(), "updated package cache");
        Ok(cached)
    }

    /// Delete the cache file. Clearing a missing cache succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub async fn clear(&self) -> Result<(), Error> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::io_with_path(&err, &self.path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pk_types::InfoKind;
    use tempfile::TempDir;

    fn list(ids: &[&str]) -> PackageList {
        let mut list = PackageList::new();
        for id in ids {
            list.add(InfoKind::Available, id, Some("cached")).unwrap();
        }
        list
    }

    #[tokio::test]
    async fn test_missing_cache_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = PackageCache::new(dir.path().join("absent.txt"));
        assert!(cache.load().await.unwrap().is_empty());
        cache.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let cache = PackageCache::new(dir.path().join("nested/dir/cache.txt"));
        cache.save(&list(&["gnome;1.23;i386;data"])).await.unwrap();

        let loaded = cache.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get_item(0).unwrap().summary(), Some("cached"));
    }

    #[tokio::test]
    async fn test_update_skips_known_packages() {
        let dir = TempDir::new().unwrap();
        let cache = PackageCache::new(dir.path().join("cache.txt"));
        cache.save(&list(&["glib2;2.14.0;i386;fedora"])).await.unwrap();

        let merged = cache
            .update(&list(&["glib2;2.14.0;i386;updates", "gtk2;2.11.6;i386;fedora"]))
            .await
            .unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(
            merged.get_item(0).unwrap().package_id().data(),
            "fedora"
        );
        assert_eq!(cache.load().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_cache_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.txt");
        std::fs::write(&path, "installed\tnot-an-id\tsummary").unwrap();

        let err = PackageCache::new(path).load().await.unwrap_err();
        assert!(matches!(err, Error::Package(_)));
    }

    #[tokio::test]
    async fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let cache = PackageCache::new(dir.path().join("cache.txt"));
        cache.save(&list(&["gnome;1.23;i386;data"])).await.unwrap();
        cache.clear().await.unwrap();
        assert!(!cache.path().exists());
    }
}

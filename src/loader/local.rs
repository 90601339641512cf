use crate::error::{Error, Result};
use crate::loader::interface::ArchetypeLoader;
use std::path::{Path, PathBuf};

/// Loader for archetypes already on the local filesystem.
pub struct LocalLoader<P: AsRef<Path>> {
    path: P,
}

impl<P: AsRef<Path>> LocalLoader<P> {
    pub fn new(path: P) -> Self {
        Self { path }
    }
}

impl<P: AsRef<Path>> ArchetypeLoader for LocalLoader<P> {
    /// # Errors
    /// * `Error::ArchetypeNotFound` if the path doesn't exist
    fn load(&self) -> Result<PathBuf> {
        let path = self.path.as_ref();
        if !path.exists() {
            return Err(Error::ArchetypeNotFound { path: path.display().to_string() });
        }
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn loads_existing_directory() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(LocalLoader::new(temp_dir.path()).load().unwrap(), temp_dir.path());
    }

    #[test]
    fn missing_directory_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        assert!(matches!(
            LocalLoader::new(&missing).load(),
            Err(Error::ArchetypeNotFound { .. })
        ));
    }
}

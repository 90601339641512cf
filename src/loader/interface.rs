use crate::error::Result;
use std::path::PathBuf;

/// Trait for obtaining a local archetype directory from some source.
pub trait ArchetypeLoader {
    /// Returns the path of the archetype root on the local filesystem.
    fn load(&self) -> Result<PathBuf>;
}

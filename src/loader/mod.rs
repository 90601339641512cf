use crate::error::Result;
use crate::loader::git::GitLoader;
use crate::loader::interface::ArchetypeLoader;
use crate::loader::local::LocalLoader;
use crate::prompt::Prompter;
use std::path::PathBuf;

pub mod git;
pub mod interface;
pub mod local;

/// Represents the source location of an archetype.
#[derive(Debug, PartialEq, Eq)]
pub enum ArchetypeSource {
    /// Local filesystem archetype path
    FileSystem(PathBuf),
    /// Git repository URL (HTTPS or SSH)
    Git(String),
}

impl std::fmt::Display for ArchetypeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchetypeSource::FileSystem(path) => {
                write!(f, "local path: '{}'", path.display())
            }
            ArchetypeSource::Git(repo) => write!(f, "git repository: '{repo}'"),
        }
    }
}

impl ArchetypeSource {
    pub fn from_string(s: &str) -> Self {
        if GitLoader::<&str>::is_git_url(s) {
            Self::Git(s.to_string())
        } else {
            Self::FileSystem(PathBuf::from(s))
        }
    }

    /// Makes the archetype available locally and returns its root.
    pub fn load(self, prompt: &dyn Prompter, skip_overwrite_check: bool) -> Result<PathBuf> {
        match self {
            ArchetypeSource::Git(repo) => {
                GitLoader::new(prompt, repo, skip_overwrite_check).load()
            }
            ArchetypeSource::FileSystem(path) => LocalLoader::new(path).load(),
        }
    }
}

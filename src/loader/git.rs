use crate::error::{Error, Result};
use crate::loader::interface::ArchetypeLoader;
use crate::prompt::Prompter;
use log::debug;
use std::fs;
use std::path::PathBuf;
use url::Url;

/// Loader for archetypes published as git repositories.
pub struct GitLoader<'a, S: AsRef<str>> {
    prompt: &'a dyn Prompter,
    repo: S,
    skip_overwrite_check: bool,
}

impl<'a, S: AsRef<str>> GitLoader<'a, S> {
    pub fn new(prompt: &'a dyn Prompter, repo: S, skip_overwrite_check: bool) -> Self {
        Self { prompt, repo, skip_overwrite_check }
    }

    /// HTTPS and git:// URLs, and scp-like `git@host:path` addresses.
    pub fn is_git_url(s: &str) -> bool {
        if let Ok(url) = Url::parse(s) {
            if url.scheme() == "https" || url.scheme() == "git" {
                return true;
            }
        }
        s.starts_with("git@")
    }

    /// Directory the repository is cloned into: its last path segment
    /// without a `.git` suffix.
    pub fn clone_dir(repo_url: &str) -> PathBuf {
        let name = repo_url
            .trim_end_matches('/')
            .rsplit(['/', ':'])
            .next()
            .unwrap_or("archetype")
            .trim_end_matches(".git");
        PathBuf::from(if name.is_empty() { "archetype" } else { name })
    }
}

impl<S: AsRef<str>> ArchetypeLoader for GitLoader<'_, S> {
    /// Clones the repository into the working directory, reusing an existing
    /// clone unless the user agrees to replace it.
    fn load(&self) -> Result<PathBuf> {
        let repo_url = self.repo.as_ref();
        let clone_path = Self::clone_dir(repo_url);

        if clone_path.exists() {
            let replace = self.prompt.confirm(
                self.skip_overwrite_check,
                format!("Directory '{}' already exists. Replace it?", clone_path.display()),
            )?;
            if replace {
                fs::remove_dir_all(&clone_path).map_err(Error::IoError)?;
            } else {
                debug!("Using existing directory '{}'.", clone_path.display());
                return Ok(clone_path);
            }
        }

        debug!("Cloning repository '{}' to '{}'.", repo_url, clone_path.display());

        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, _allowed_types| {
            git2::Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
        });

        let mut fetch_opts = git2::FetchOptions::new();
        fetch_opts.remote_callbacks(callbacks);

        let mut builder = git2::build::RepoBuilder::new();
        builder.fetch_options(fetch_opts);
        builder.clone(repo_url, &clone_path)?;
        Ok(clone_path)
    }
}

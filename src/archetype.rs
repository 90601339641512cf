//! Archetype layout.
//! An archetype directory holds the descriptor at
//! `META-INF/maven/archetype-metadata.xml` and the template tree under
//! `archetype-resources/`.

use indexmap::IndexMap;
use log::debug;
use std::path::{Path, PathBuf};

use crate::constants::{DESCRIPTOR_FILE, RESOURCES_DIR};
use crate::descriptor::{load_descriptor, Descriptor};
use crate::error::{Error, Result};
use crate::generator::{generate, GeneratedProject};
use crate::variables::{bind_variables, Variables};

/// A loaded archetype: its descriptor plus the location of its templates.
#[derive(Debug, Clone)]
pub struct Archetype {
    root: PathBuf,
    descriptor: Descriptor,
}

impl Archetype {
    /// Opens the archetype rooted at `root` and loads its descriptor.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::ArchetypeNotFound { path: root.display().to_string() });
        }
        let descriptor = load_descriptor(root.join(DESCRIPTOR_FILE))?;
        debug!(
            "Opened archetype '{}' at {}",
            descriptor.name.as_deref().unwrap_or("unnamed"),
            root.display()
        );
        Ok(Self { root: root.to_path_buf(), descriptor })
    }

    /// Directory holding `META-INF/` and `archetype-resources/`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// The template tree, `<root>/archetype-resources`.
    pub fn resource_root(&self) -> PathBuf {
        self.root.join(RESOURCES_DIR)
    }

    /// Generates a project into `<output_dir>/<artifactId>`.
    pub fn generate<P: AsRef<Path>>(
        &self,
        output_dir: P,
        variables: &Variables,
    ) -> Result<GeneratedProject> {
        generate(self.resource_root(), &self.descriptor, output_dir, variables)
    }
}

/// Generates a project from the archetype at `archetype_dir` with the three
/// core coordinates, non-interactively.
pub fn generate_project<A, O>(
    archetype_dir: A,
    output_dir: O,
    group_id: &str,
    artifact_id: &str,
    version: &str,
) -> Result<GeneratedProject>
where
    A: AsRef<Path>,
    O: AsRef<Path>,
{
    let archetype = Archetype::open(archetype_dir)?;
    let supplied: IndexMap<String, String> = [
        ("groupId", group_id),
        ("artifactId", artifact_id),
        ("version", version),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let variables = bind_variables(archetype.descriptor(), supplied, None)?;
    archetype.generate(output_dir, &variables)
}

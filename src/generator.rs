//! Project generation.
//! Copies every fileset of an archetype into a fresh project directory,
//! substituting placeholders in text files, and renders the project pom.
//!
//! Generation is not transactional: on failure the destination is left as
//! far as it got. Callers needing atomicity generate into a temporary
//! location and rename it on success.

use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::POM_FILE;
use crate::descriptor::{Descriptor, FilesetRule};
use crate::error::{Error, Result};
use crate::resolver::resolve_fileset;
use crate::substitute::{placeholders, substitute, UnboundPolicy};
use crate::variables::Variables;

/// One file written into the generated project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub source: PathBuf,
    pub target: PathBuf,
    /// Whether the file belongs to a packaged (source) fileset.
    pub packaged: bool,
    /// Whether placeholders were substituted, as opposed to a verbatim copy.
    pub substituted: bool,
}

/// Result of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProject {
    /// `<output_dir>/<artifactId>`
    pub root: PathBuf,
    /// Fileset directories created in the project, in descriptor order.
    pub directories: Vec<PathBuf>,
    /// Files written, in the order they were written. The pom comes last.
    pub files: Vec<GeneratedFile>,
}

impl GeneratedProject {
    /// Path of the rendered project pom.
    pub fn pom(&self) -> PathBuf {
        self.root.join(POM_FILE)
    }
}

fn copy_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::FileCopy { path: path.display().to_string(), source }
}

/// Fails when `root` exists and is anything but an empty directory.
pub fn ensure_destination(root: &Path) -> Result<()> {
    if !root.exists() {
        return Ok(());
    }
    let is_empty_dir =
        root.is_dir() && fs::read_dir(root).map_err(Error::IoError)?.next().is_none();
    if is_empty_dir {
        Ok(())
    } else {
        Err(Error::DestinationExists { path: root.display().to_string() })
    }
}

fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(copy_error(path))
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    fs::write(path, content).map_err(copy_error(path))
}

fn copy_file(source: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        create_dir_all(parent)?;
    }
    fs::copy(source, target).map(|_| ()).map_err(copy_error(target))
}

/// Text is valid UTF-8 without NUL bytes; anything else is copied verbatim.
fn as_text(content: &[u8]) -> Option<&str> {
    std::str::from_utf8(content).ok().filter(|text| !text.contains('\0'))
}

fn substitutes_encoding(rule: &FilesetRule) -> bool {
    rule.encoding.as_deref().is_none_or(|encoding| {
        let encoding = encoding.to_ascii_lowercase();
        encoding == "utf-8" || encoding == "utf8"
    })
}

/// Copies one template file, substituting placeholders when `filtered` and
/// the content is text. Returns whether substitution happened.
fn copy_template(
    source: &Path,
    target: &Path,
    filtered: bool,
    variables: &Variables,
) -> Result<bool> {
    if filtered {
        let content = fs::read(source).map_err(copy_error(source))?;
        if let Some(text) = as_text(&content) {
            let rendered = substitute(text, variables, UnboundPolicy::Keep, source)?;
            write_file(target, rendered.as_bytes())?;
            return Ok(true);
        }
        debug!("'{}' is binary, copying verbatim", source.display());
    }
    copy_file(source, target)?;
    Ok(false)
}

/// Renders the project pom from `<resource_root>/pom.xml`. Every
/// non-property placeholder in it must be bound.
fn render_pom(resource_root: &Path, project_root: &Path, variables: &Variables) -> Result<GeneratedFile> {
    let source = resource_root.join(POM_FILE);
    let target = project_root.join(POM_FILE);
    let template = fs::read_to_string(&source).map_err(copy_error(&source))?;
    let rendered = substitute(&template, variables, UnboundPolicy::Fail, &source)?;

    let remaining = placeholders(&rendered);
    if !remaining.is_empty() {
        debug!("Build properties left in pom: {}", remaining.join(", "));
    }

    write_file(&target, rendered.as_bytes())?;
    Ok(GeneratedFile { source, target, packaged: false, substituted: true })
}

/// Generates a project from the template tree at `resource_root`.
///
/// The project is created at `<output_dir>/<artifactId>`, which must not
/// exist or be an empty directory. Every fileset directory is created even
/// when it selects no files. When filesets overlap, the first rule to select
/// a target writes it.
///
/// # Arguments
/// * `resource_root` - Template tree holding the fileset directories and `pom.xml`
/// * `descriptor` - Fileset rules, applied in order
/// * `output_dir` - Directory the project directory is created in
/// * `variables` - Bindings substituted into filtered text files
///
/// # Returns
/// * `Result<GeneratedProject>` - The project root, its directories and the files written
///
/// # Errors
/// * `Error::MissingVariable` / `Error::InvalidVariable` if `variables` is incomplete
/// * `Error::DestinationExists` if the project directory exists and is not empty
/// * `Error::UnboundVariable` if `pom.xml` references an unbound variable
/// * `Error::FileCopy` if a file or directory cannot be read or written
pub fn generate<R, O>(
    resource_root: R,
    descriptor: &Descriptor,
    output_dir: O,
    variables: &Variables,
) -> Result<GeneratedProject>
where
    R: AsRef<Path>,
    O: AsRef<Path>,
{
    let resource_root = resource_root.as_ref();
    variables.ensure_required(descriptor)?;

    let root = output_dir.as_ref().join(variables.artifact_id()?);
    ensure_destination(&root)?;
    info!("Generating project into {}", root.display());
    create_dir_all(&root)?;

    let mut project = GeneratedProject { root: root.clone(), directories: Vec::new(), files: Vec::new() };
    let mut written: HashSet<PathBuf> = HashSet::new();

    for rule in &descriptor.rules {
        let directory = root.join(&rule.directory);
        create_dir_all(&directory)?;
        project.directories.push(directory);

        let filtered = rule.filtered && substitutes_encoding(rule);
        for file in resolve_fileset(resource_root, rule)? {
            if file.relative == Path::new(POM_FILE) {
                warn!("Skipping '{}', the pom is rendered separately", file.relative.display());
                continue;
            }
            let target = root.join(&file.relative);
            if !written.insert(target.clone()) {
                warn!("Skipping '{}', already generated by an earlier fileSet", file.relative.display());
                continue;
            }

            let substituted = copy_template(&file.source, &target, filtered, variables)?;
            debug!(
                "{} '{}'",
                if substituted { "Rendered" } else { "Copied" },
                target.display()
            );
            project.files.push(GeneratedFile {
                source: file.source,
                target,
                packaged: rule.packaged,
                substituted,
            });
        }
    }

    project.files.push(render_pom(resource_root, &root, variables)?);
    info!("Generated {} file(s) in {}", project.files.len(), root.display());
    Ok(project)
}

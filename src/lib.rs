//! archetyper generates new projects from Maven-style archetypes.
//! An archetype is a descriptor listing filesets plus a template tree; a
//! generation copies the selected files into a fresh project directory and
//! substitutes `${groupId}`, `${artifactId}`, `${version}` and friends.

/// Archetype directory layout and the one-call generation entry point
pub mod archetype;

/// Build tool invocation behind a narrow trait
pub mod build_tool;

/// Command-line interface module for the archetyper binary
pub mod cli;

/// Common constants
pub mod constants;

/// Archetype descriptor (archetype-metadata.xml) parsing and serialization
pub mod descriptor;

/// Error types and handling
pub mod error;

/// Project generation from a descriptor and a template tree
pub mod generator;

/// Archetype sources: local directories and git repositories
pub mod loader;

/// Interactive prompting for unbound properties
pub mod prompt;

/// Fileset to template file resolution
pub mod resolver;

/// `${name}` placeholder substitution
pub mod substitute;

/// Variable binding from answers, definitions and prompts
pub mod variables;

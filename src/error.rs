//! Error handling for archetyper.
//! Defines the error kinds surfaced by descriptor loading, project generation
//! and the build tool integration.

use std::io;
use thiserror::Error;

/// All errors produced by archetyper.
///
/// Every variant carries the offending path, variable name or command so the
/// failure can be diagnosed without rerunning in verbose mode.
#[derive(Error, Debug)]
pub enum Error {
    /// The descriptor is not a well-formed XML document.
    #[error("Malformed archetype descriptor '{path}': {reason}.")]
    MalformedDescriptor { path: String, reason: String },

    /// A fileSet entry of the descriptor cannot be turned into a rule.
    /// `index` is the position of the offending fileSet, when there is one.
    #[error("Invalid {}: {reason}.", describe_rule(.index))]
    InvalidRule { index: Option<usize>, reason: String },

    /// A required template variable was not supplied.
    #[error("Missing required variable '{name}'.")]
    MissingVariable { name: String },

    /// A variable was supplied but cannot be used as given.
    #[error("Invalid value for variable '{name}': {reason}.")]
    InvalidVariable { name: String, reason: String },

    /// Template content references a placeholder with no bound value.
    #[error("Unbound variable '${{{name}}}' in '{path}'.")]
    UnboundVariable { name: String, path: String },

    #[error("Destination '{path}' already exists and is not empty.")]
    DestinationExists { path: String },

    /// I/O failure while copying or writing a generated file.
    #[error("Failed to copy '{path}': {source}.")]
    FileCopy {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The build tool exited unsuccessfully.
    #[error("Command '{command}' failed with {}.", describe_exit(.code))]
    ExternalProcess { command: String, code: Option<i32> },

    #[error("Archetype '{path}' does not exist.")]
    ArchetypeNotFound { path: String },

    /// Answers supplied through a file or stdin could not be parsed.
    #[error("Answers error: {0}.")]
    AnswersError(String),

    #[error("Prompt error: {0}.")]
    PromptError(String),

    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    #[error("Git error: {0}.")]
    Git2Error(#[from] git2::Error),
}

fn describe_rule(index: &Option<usize>) -> String {
    match index {
        Some(index) => format!("fileSet #{index}"),
        None => "fileSet rules".to_string(),
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}

//! Command-line interface implementation for archetyper.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser};
use std::path::PathBuf;

/// Command-line arguments structure for archetyper.
#[derive(Parser, Debug)]
#[command(author, version, about = "archetyper: generate projects from Maven-style archetypes", long_about = None)]
pub struct Args {
    /// Path to the archetype directory or git repository URL
    #[arg(value_name = "ARCHETYPE")]
    pub archetype: String,

    /// Directory the project directory (named after the artifactId) is created in
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// groupId of the generated project
    #[arg(long, value_name = "GROUP_ID")]
    pub group_id: Option<String>,

    /// artifactId of the generated project, also its directory name
    #[arg(long, value_name = "ARTIFACT_ID")]
    pub artifact_id: Option<String>,

    /// version of the generated project
    #[arg(long, value_name = "VERSION")]
    pub project_version: Option<String>,

    /// Additional property, e.g. -Dpackage=com.example.lib
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE")]
    pub defines: Vec<String>,

    /// JSON or YAML file with property values
    #[arg(long, value_name = "FILE")]
    pub answers: Option<PathBuf>,

    /// Read property values as JSON from stdin
    #[arg(short, long)]
    pub stdin: bool,

    /// Prompt for properties that were not supplied
    #[arg(short, long)]
    pub interactive: bool,

    /// Replace an existing clone of a git archetype without asking.
    #[arg(long)]
    pub skip_overwrite_check: bool,

    /// Build goals to run in the generated project, e.g. --build verify
    #[arg(long, value_name = "GOAL", num_args = 1..)]
    pub build: Vec<String>,

    /// Maven executable used by --build
    #[arg(long, value_name = "PATH", default_value = "mvn")]
    pub mvn: PathBuf,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}

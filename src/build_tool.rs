//! Build tool integration.
//! The generator itself never shells out; running a build in the generated
//! project goes through the narrow [`BuildTool`] interface.

use log::debug;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Something that runs a build with arguments inside a directory.
pub trait BuildTool {
    /// Human readable command line, used in error messages.
    fn describe(&self, args: &[String]) -> String;

    /// Runs the tool and returns its exit code, `None` when the process was
    /// terminated without one.
    fn run(&self, args: &[String], working_dir: &Path) -> Result<Option<i32>>;
}

/// Invokes a Maven executable in batch mode with inherited stdio.
#[derive(Debug, Clone)]
pub struct MavenInvoker {
    executable: PathBuf,
}

impl MavenInvoker {
    pub fn new<P: Into<PathBuf>>(executable: P) -> Self {
        Self { executable: executable.into() }
    }
}

impl Default for MavenInvoker {
    fn default() -> Self {
        Self::new("mvn")
    }
}

impl BuildTool for MavenInvoker {
    fn describe(&self, args: &[String]) -> String {
        std::iter::once(self.executable.display().to_string())
            .chain(std::iter::once("--batch-mode".to_string()))
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn run(&self, args: &[String], working_dir: &Path) -> Result<Option<i32>> {
        debug!("Running '{}' in {}", self.describe(args), working_dir.display());
        let status = Command::new(&self.executable)
            .arg("--batch-mode")
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(Error::IoError)?;
        Ok(status.code())
    }
}

/// Runs `tool` and turns an unsuccessful exit into [`Error::ExternalProcess`].
pub fn run_build_tool(tool: &dyn BuildTool, args: &[String], working_dir: &Path) -> Result<()> {
    match tool.run(args, working_dir)? {
        Some(0) => Ok(()),
        code => Err(Error::ExternalProcess { command: tool.describe(args), code }),
    }
}

//! Interactive prompting.
//! Used to bind variables that were not supplied on the command line and to
//! confirm destructive actions.

use dialoguer::{Confirm, Input};

use crate::error::{Error, Result};

/// Source of interactive answers.
pub trait Prompter {
    /// Asks for the value of variable `name`, offering `default` if any.
    fn ask(&self, name: &str, default: Option<String>) -> Result<String>;

    /// Asks a yes/no question. `skip` answers yes without asking.
    fn confirm(&self, skip: bool, _prompt: String) -> Result<bool> {
        Ok(skip)
    }
}

/// Terminal prompter backed by dialoguer.
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for DialoguerPrompter {
    fn ask(&self, name: &str, default: Option<String>) -> Result<String> {
        let mut input = Input::<String>::new().with_prompt(format!("Define value for property '{name}'"));
        if let Some(default) = default {
            input = input.default(default);
        }
        input.interact_text().map_err(|e| Error::PromptError(e.to_string()))
    }

    fn confirm(&self, skip: bool, prompt: String) -> Result<bool> {
        if skip {
            return Ok(true);
        }
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| Error::PromptError(e.to_string()))
    }
}

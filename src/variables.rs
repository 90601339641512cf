//! Template variable binding.
//! Collects values from answer files, stdin, `-D` definitions and prompts,
//! and checks that every variable a generation needs is bound.

use indexmap::IndexMap;
use log::debug;
use std::io::Read;
use std::path::{Component, Path};

use crate::cli::Args;
use crate::constants::{PACKAGE_VARIABLE, REQUIRED_VARIABLES};
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::prompt::Prompter;
use crate::substitute::{substitute, UnboundPolicy};

/// Variable name to value bindings for one generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    values: IndexMap<String, String>,
}

impl Variables {
    /// Binds the three core coordinates.
    pub fn new<G, A, V>(group_id: G, artifact_id: A, version: V) -> Self
    where
        G: Into<String>,
        A: Into<String>,
        V: Into<String>,
    {
        let mut variables = Self::default();
        variables.insert("groupId", group_id);
        variables.insert("artifactId", artifact_id);
        variables.insert("version", version);
        variables
    }

    /// Takes `values` as they are, without defaults or checks.
    pub fn from_map(values: IndexMap<String, String>) -> Self {
        Self { values }
    }

    /// Binds `name`, replacing any previous value but keeping its position.
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The bound `artifactId`, which names the project directory.
    pub fn artifact_id(&self) -> Result<&str> {
        self.get("artifactId").ok_or_else(|| Error::MissingVariable {
            name: "artifactId".to_string(),
        })
    }

    /// Checks the core coordinates and every property `descriptor` requires.
    ///
    /// Values are taken verbatim: only the empty string counts as unset.
    pub fn ensure_required(&self, descriptor: &Descriptor) -> Result<()> {
        let extra = descriptor.required_properties.iter().map(|p| p.key.as_str());
        for name in REQUIRED_VARIABLES.into_iter().chain(extra) {
            match self.get(name) {
                None => return Err(Error::MissingVariable { name: name.to_string() }),
                Some(value) if value.is_empty() => {
                    return Err(Error::InvalidVariable {
                        name: name.to_string(),
                        reason: "value is empty".to_string(),
                    })
                }
                Some(_) => {}
            }
        }

        let artifact_id = self.artifact_id()?;
        let mut components = Path::new(artifact_id).components();
        let single_component = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_component {
            return Err(Error::InvalidVariable {
                name: "artifactId".to_string(),
                reason: format!("'{artifact_id}' must be a plain directory name"),
            });
        }
        Ok(())
    }
}

/// Parses a `-D key=value` definition.
pub fn parse_define(definition: &str) -> Result<(String, String)> {
    match definition.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(Error::AnswersError(format!(
            "invalid definition '{definition}', expected key=value"
        ))),
    }
}

fn scalar_to_string(key: &str, value: serde_json::Value) -> Result<String> {
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::AnswersError(format!(
            "value of '{key}' must be a string, number or boolean, got {other}"
        ))),
    }
}

/// Parses answers given as a JSON or YAML object of scalars.
///
/// JSON is tried first; YAML is the fallback.
pub fn parse_answers(content: &str) -> Result<IndexMap<String, String>> {
    if content.trim().is_empty() {
        return Ok(IndexMap::new());
    }

    let raw: IndexMap<String, serde_json::Value> = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(_) => serde_yaml::from_str(content)
            .map_err(|e| Error::AnswersError(format!("invalid answers format: {e}")))?,
    };

    raw.into_iter()
        .map(|(key, value)| {
            let value = scalar_to_string(&key, value)?;
            Ok((key, value))
        })
        .collect()
}

/// Reads a JSON or YAML answers file.
pub fn load_answers_file<P: AsRef<Path>>(path: P) -> Result<IndexMap<String, String>> {
    let path = path.as_ref();
    debug!("Loading answers from {}", path.display());
    let content = std::fs::read_to_string(path).map_err(Error::IoError)?;
    parse_answers(&content)
}

pub fn load_answers_from_stdin() -> Result<IndexMap<String, String>> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    parse_answers(&buffer)
}

/// Merges every property source named by `args` into one map.
///
/// Later sources override earlier ones: the answers file, answers on stdin,
/// `-D` definitions, then the explicit `--group-id`, `--artifact-id` and
/// `--project-version` flags.
///
/// # Arguments
/// * `args` - Parsed command line arguments
///
/// # Returns
/// * `Result<IndexMap<String, String>>` - Property values in first-seen order
///
/// # Errors
/// * `Error::IoError` if the answers file or stdin cannot be read
/// * `Error::AnswersError` if answers are malformed or a definition lacks `=`
pub fn collect_properties(args: &Args) -> Result<IndexMap<String, String>> {
    let mut properties = IndexMap::new();

    if let Some(answers) = &args.answers {
        properties.extend(load_answers_file(answers)?);
    }
    if args.stdin {
        properties.extend(load_answers_from_stdin()?);
    }
    for definition in &args.defines {
        let (key, value) = parse_define(definition)?;
        properties.insert(key, value);
    }

    let explicit = [
        ("groupId", &args.group_id),
        ("artifactId", &args.artifact_id),
        ("version", &args.project_version),
    ];
    for (name, value) in explicit {
        if let Some(value) = value {
            properties.insert(name.to_string(), value.clone());
        }
    }
    Ok(properties)
}

/// Produces the final bindings for `descriptor` from the supplied values.
///
/// Core coordinates never fall back to defaults: when one is missing it is
/// prompted for if a `prompter` is given, otherwise binding fails. `package`
/// defaults to `groupId`. Extra required properties use, in order, the
/// supplied value, a prompt answer, then their descriptor default with
/// placeholders substituted against what is already bound.
///
/// # Arguments
/// * `descriptor` - Descriptor whose required properties must be bound
/// * `supplied` - Values from answers, definitions and flags
/// * `prompter` - Asks for missing values when given
///
/// # Returns
/// * `Result<Variables>` - Bindings that passed `Variables::ensure_required`
///
/// # Errors
/// * `Error::MissingVariable` if a value is missing and cannot be prompted for
/// * `Error::InvalidVariable` if a value is empty or `artifactId` is not a plain name
/// * `Error::PromptError` if prompting fails
pub fn bind_variables(
    descriptor: &Descriptor,
    supplied: IndexMap<String, String>,
    prompter: Option<&dyn Prompter>,
) -> Result<Variables> {
    let mut variables = Variables::default();

    for name in REQUIRED_VARIABLES {
        let value = match (supplied.get(name), prompter) {
            (Some(value), _) => value.clone(),
            (None, Some(prompter)) => prompter.ask(name, None)?,
            (None, None) => return Err(Error::MissingVariable { name: name.to_string() }),
        };
        variables.insert(name, value);
    }

    for (name, value) in &supplied {
        if !variables.contains(name) {
            variables.insert(name.as_str(), value.as_str());
        }
    }

    for property in &descriptor.required_properties {
        if variables.contains(&property.key) {
            continue;
        }
        let default = match &property.default_value {
            Some(default) => Some(substitute(
                default,
                &variables,
                UnboundPolicy::Keep,
                Path::new(&property.key),
            )?),
            None => None,
        };
        let value = match (prompter, default) {
            (Some(prompter), default) => prompter.ask(&property.key, default)?,
            (None, Some(default)) => default,
            (None, None) => {
                return Err(Error::MissingVariable { name: property.key.clone() })
            }
        };
        variables.insert(property.key.as_str(), value);
    }

    if !variables.contains(PACKAGE_VARIABLE) {
        let group_id = variables.get("groupId").unwrap_or_default().to_string();
        variables.insert(PACKAGE_VARIABLE, group_id);
    }

    variables.ensure_required(descriptor)?;
    Ok(variables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::RequiredProperty;

    struct FixedPrompter;

    impl Prompter for FixedPrompter {
        fn ask(&self, name: &str, default: Option<String>) -> Result<String> {
            Ok(default.unwrap_or_else(|| format!("prompted-{name}")))
        }
    }

    fn supplied(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn descriptor_with(properties: Vec<RequiredProperty>) -> Descriptor {
        Descriptor { required_properties: properties, ..Descriptor::default() }
    }

    #[test]
    fn missing_core_variable_fails_without_prompter() {
        let result = bind_variables(
            &Descriptor::default(),
            supplied(&[("groupId", "g"), ("artifactId", "a")]),
            None,
        );
        match result {
            Err(Error::MissingVariable { name }) => assert_eq!(name, "version"),
            other => panic!("Expected MissingVariable, got {other:?}"),
        }
    }

    #[test]
    fn prompter_fills_missing_core_variables() {
        let variables = bind_variables(
            &Descriptor::default(),
            supplied(&[("groupId", "g"), ("artifactId", "a")]),
            Some(&FixedPrompter),
        )
        .unwrap();
        assert_eq!(variables.get("version"), Some("prompted-version"));
    }

    #[test]
    fn package_defaults_to_group_id() {
        let variables = bind_variables(
            &Descriptor::default(),
            supplied(&[("groupId", "com.example"), ("artifactId", "a"), ("version", "1")]),
            None,
        )
        .unwrap();
        assert_eq!(variables.get("package"), Some("com.example"));
    }

    #[test]
    fn property_defaults_are_substituted() {
        let descriptor = descriptor_with(vec![
            RequiredProperty { key: "moduleName".into(), default_value: Some("${groupId}.${artifactId}".into()) },
            RequiredProperty { key: "javaVersion".into(), default_value: Some("21".into()) },
        ]);
        let variables = bind_variables(
            &descriptor,
            supplied(&[("groupId", "g"), ("artifactId", "lib"), ("version", "1"), ("javaVersion", "17")]),
            None,
        )
        .unwrap();
        assert_eq!(variables.get("moduleName"), Some("g.lib"));
        assert_eq!(variables.get("javaVersion"), Some("17"));
    }

    #[test]
    fn required_property_without_default_must_be_supplied() {
        let descriptor =
            descriptor_with(vec![RequiredProperty { key: "owner".into(), default_value: None }]);
        let result = bind_variables(
            &descriptor,
            supplied(&[("groupId", "g"), ("artifactId", "a"), ("version", "1")]),
            None,
        );
        assert!(matches!(result, Err(Error::MissingVariable { name }) if name == "owner"));
    }

    #[test]
    fn artifact_id_must_be_a_plain_name() {
        for bad in ["../escape", "nested/name", "/abs", ""] {
            let variables = Variables::new("g", bad, "1");
            assert!(
                matches!(
                    variables.ensure_required(&Descriptor::default()),
                    Err(Error::InvalidVariable { .. })
                ),
                "'{bad}' should be rejected"
            );
        }
        assert!(Variables::new("g", "lib", "1").ensure_required(&Descriptor::default()).is_ok());
    }

    #[test]
    fn whitespace_values_are_kept_verbatim() {
        let variables = bind_variables(
            &Descriptor::default(),
            supplied(&[("groupId", "com.example"), ("artifactId", "lib"), ("version", " ")]),
            None,
        )
        .unwrap();
        assert_eq!(variables.get("version"), Some(" "));

        let variables = Variables::new("com.example", "lib", "");
        match variables.ensure_required(&Descriptor::default()) {
            Err(Error::InvalidVariable { name, .. }) => assert_eq!(name, "version"),
            other => panic!("Expected InvalidVariable, got {other:?}"),
        }
    }

    #[test]
    fn explicit_flags_override_defines_which_override_answers() {
        use clap::Parser;

        let temp_dir = tempfile::TempDir::new().unwrap();
        let answers = temp_dir.path().join("answers.yaml");
        std::fs::write(
            &answers,
            "groupId: answers\nartifactId: answers-lib\nversion: '0.1'\nowner: team\n",
        )
        .unwrap();

        let args = Args::try_parse_from([
            "archetyper",
            "archetype",
            "out",
            "--answers",
            answers.to_str().unwrap(),
            "-DgroupId=define",
            "-DartifactId=define-lib",
            "--group-id",
            "flag",
        ])
        .unwrap();

        let properties = collect_properties(&args).unwrap();
        assert_eq!(properties.get("groupId").map(String::as_str), Some("flag"));
        assert_eq!(properties.get("artifactId").map(String::as_str), Some("define-lib"));
        assert_eq!(properties.get("version").map(String::as_str), Some("0.1"));
        assert_eq!(properties.get("owner").map(String::as_str), Some("team"));
    }

    #[test]
    fn parses_json_and_yaml_answers() {
        let json = parse_answers(r#"{"groupId": "g", "version": 2, "flag": true}"#).unwrap();
        assert_eq!(json.get("version").map(String::as_str), Some("2"));
        assert_eq!(json.get("flag").map(String::as_str), Some("true"));

        let yaml = parse_answers("groupId: g\nartifactId: lib\n").unwrap();
        assert_eq!(yaml.get("artifactId").map(String::as_str), Some("lib"));

        assert!(matches!(parse_answers("groupId: [1, 2]"), Err(Error::AnswersError(_))));
        assert!(parse_answers("  ").unwrap().is_empty());
    }

    #[test]
    fn parses_defines() {
        assert_eq!(parse_define("a=b=c").unwrap(), ("a".to_string(), "b=c".to_string()));
        assert!(parse_define("novalue").is_err());
        assert!(parse_define("=x").is_err());
    }
}

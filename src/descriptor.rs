//! Archetype descriptor loading.
//! Parses `archetype-metadata.xml` into an ordered list of [`FilesetRule`]s
//! and the extra properties the archetype requires.
//!
//! The parser never resolves external entities and never fetches DTDs or
//! schemas: DOCTYPE declarations are skipped and any entity reference other
//! than the XML predefined ones is rejected.

use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Component, Path};

use log::debug;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::constants::STANDARD_DIRECTORIES;
use crate::error::{Error, Result};
use crate::resolver::FilesetMatcher;

/// One `fileSet` entry of the descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesetRule {
    /// Source directory relative to the template root, `""` for the root itself.
    pub directory: String,
    /// Glob patterns relative to `directory`; empty means every file.
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    /// Compiled/packaged sources rather than plain resources.
    pub packaged: bool,
    /// Whether placeholders are substituted in matched text files.
    pub filtered: bool,
    pub encoding: Option<String>,
}

/// A `requiredProperty` beyond the core coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredProperty {
    pub key: String,
    pub default_value: Option<String>,
}

/// Parsed, immutable archetype descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Descriptor {
    pub name: Option<String>,
    pub rules: Vec<FilesetRule>,
    pub required_properties: Vec<RequiredProperty>,
}

impl Descriptor {
    /// Rules whose files are packaged sources.
    pub fn sources(&self) -> impl Iterator<Item = &FilesetRule> {
        self.rules.iter().filter(|rule| rule.packaged)
    }

    /// Rules whose files are plain resources.
    pub fn resources(&self) -> impl Iterator<Item = &FilesetRule> {
        self.rules.iter().filter(|rule| !rule.packaged)
    }

    /// The first rule for `directory`, in descriptor order.
    pub fn rule(&self, directory: &str) -> Option<&FilesetRule> {
        self.rules.iter().find(|rule| rule.directory == directory)
    }

    /// Checks that the four standard Maven directories are all declared.
    pub fn ensure_standard_layout(&self) -> Result<()> {
        for directory in STANDARD_DIRECTORIES {
            if self.rule(directory).is_none() {
                return Err(Error::InvalidRule {
                    index: None,
                    reason: format!("no fileSet declares the standard directory '{directory}'"),
                });
            }
        }
        Ok(())
    }

    /// Serializes the descriptor back to archetype-metadata XML.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 4);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_failed)?;

        let mut root = BytesStart::new("archetype-descriptor");
        if let Some(name) = &self.name {
            root.push_attribute(("name", name.as_str()));
        }
        writer.write_event(Event::Start(root)).map_err(write_failed)?;

        if !self.required_properties.is_empty() {
            start(&mut writer, "requiredProperties")?;
            for property in &self.required_properties {
                let mut element = BytesStart::new("requiredProperty");
                element.push_attribute(("key", property.key.as_str()));
                match &property.default_value {
                    Some(default_value) => {
                        writer.write_event(Event::Start(element)).map_err(write_failed)?;
                        write_simple(&mut writer, "defaultValue", default_value)?;
                        end(&mut writer, "requiredProperty")?;
                    }
                    None => writer.write_event(Event::Empty(element)).map_err(write_failed)?,
                }
            }
            end(&mut writer, "requiredProperties")?;
        }

        start(&mut writer, "fileSets")?;
        for rule in &self.rules {
            let mut element = BytesStart::new("fileSet");
            element.push_attribute(("filtered", if rule.filtered { "true" } else { "false" }));
            element.push_attribute(("packaged", if rule.packaged { "true" } else { "false" }));
            if let Some(encoding) = &rule.encoding {
                element.push_attribute(("encoding", encoding.as_str()));
            }
            writer.write_event(Event::Start(element)).map_err(write_failed)?;
            write_simple(&mut writer, "directory", &rule.directory)?;
            write_list(&mut writer, "includes", "include", &rule.includes)?;
            write_list(&mut writer, "excludes", "exclude", &rule.excludes)?;
            end(&mut writer, "fileSet")?;
        }
        end(&mut writer, "fileSets")?;
        end(&mut writer, "archetype-descriptor")?;

        String::from_utf8(writer.into_inner().into_inner()).map_err(write_failed)
    }
}

fn write_failed<E: std::fmt::Display>(err: E) -> Error {
    Error::IoError(std::io::Error::other(format!("descriptor serialization failed: {err}")))
}

fn start(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag))).map_err(write_failed)
}

fn end(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(tag))).map_err(write_failed)
}

fn write_simple(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, value: &str) -> Result<()> {
    start(writer, tag)?;
    writer.write_event(Event::Text(BytesText::new(value))).map_err(write_failed)?;
    end(writer, tag)
}

fn write_list(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    outer: &str,
    inner: &str,
    values: &[String],
) -> Result<()> {
    if values.is_empty() {
        return Ok(());
    }
    start(writer, outer)?;
    for value in values {
        write_simple(writer, inner, value)?;
    }
    end(writer, outer)
}

/// Reads and parses the descriptor at `path`, requiring the standard layout.
///
/// # Arguments
/// * `path` - Path to `archetype-metadata.xml`
///
/// # Returns
/// * `Result<Descriptor>` - The parsed descriptor
///
/// # Errors
/// * `Error::MalformedDescriptor` if the file cannot be read or is not well-formed XML
/// * `Error::InvalidRule` if a fileSet is invalid or a standard directory is not declared
pub fn load_descriptor<P: AsRef<Path>>(path: P) -> Result<Descriptor> {
    let path = path.as_ref();
    debug!("Loading archetype descriptor from {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|e| Error::MalformedDescriptor {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let descriptor = parse_descriptor(&content, &path.display().to_string())?;
    descriptor.ensure_standard_layout()?;
    debug!("Loaded {} fileSet rule(s)", descriptor.rules.len());
    Ok(descriptor)
}

/// A fileSet whose children are still being read.
#[derive(Default)]
struct PendingRule {
    directory: Option<String>,
    includes: Vec<String>,
    excludes: Vec<String>,
    packaged: Option<String>,
    filtered: Option<String>,
    encoding: Option<String>,
}

/// Parses descriptor XML. `origin` names the document in error messages.
///
/// Only structural validation happens here: every fileSet needs a
/// `directory`, boolean attributes must be `true`/`false`, patterns must be
/// valid globs and a directory appears at most once per category.
pub fn parse_descriptor(xml: &str, origin: &str) -> Result<Descriptor> {
    let malformed = |reason: String| Error::MalformedDescriptor {
        path: origin.to_string(),
        reason,
    };

    let mut reader = Reader::from_str(xml);
    let mut descriptor = Descriptor::default();
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut saw_root = false;
    let mut pending: Option<PendingRule> = None;
    let mut pending_property: Option<RequiredProperty> = None;
    let mut rule_index = 0;

    loop {
        let event = reader.read_event().map_err(|e| {
            malformed(format!("{e} (at byte {})", reader.buffer_position()))
        })?;

        // Self-closing elements are handled as a start immediately followed by an end.
        let (opened, closes_now) = match &event {
            Event::Start(e) => (Some(e.clone()), false),
            Event::Empty(e) => (Some(e.clone()), true),
            _ => (None, false),
        };

        if let Some(element) = opened {
            let name = local_name(element.local_name().as_ref());
            if stack.is_empty() {
                if saw_root {
                    return Err(malformed(format!("second root element <{name}>")));
                }
                saw_root = true;
                descriptor.name = attribute(&element, "name").map_err(&malformed)?;
            }
            text.clear();

            match name.as_str() {
                "fileSet" => {
                    pending = Some(PendingRule {
                        packaged: attribute(&element, "packaged").map_err(&malformed)?,
                        filtered: attribute(&element, "filtered").map_err(&malformed)?,
                        encoding: attribute(&element, "encoding").map_err(&malformed)?,
                        ..PendingRule::default()
                    });
                }
                "requiredProperty" => {
                    let key = attribute(&element, "key").map_err(&malformed)?.unwrap_or_default();
                    pending_property = Some(RequiredProperty { key, default_value: None });
                }
                _ => {}
            }
            stack.push(name);

            if !closes_now {
                continue;
            }
        }

        match event {
            Event::Text(e) => {
                let value = e.decode().map_err(|e| malformed(e.to_string()))?;
                if stack.is_empty() && !value.trim().is_empty() {
                    return Err(malformed("text outside of the root element".to_string()));
                }
                text.push_str(&value);
            }
            Event::CData(e) => {
                let value = e.decode().map_err(|e| malformed(e.to_string()))?;
                text.push_str(&value);
            }
            Event::GeneralRef(e) => {
                let name = e.decode().map_err(|e| malformed(e.to_string()))?;
                let resolved = resolve_reference(&name).ok_or_else(|| {
                    malformed(format!("undeclared entity reference '&{name};'"))
                })?;
                text.push_str(&resolved);
            }
            Event::DocType(_) => debug!("Ignoring DOCTYPE declaration in {origin}"),
            Event::Start(_) => {}
            Event::End(_) | Event::Empty(_) => {
                let name = stack.pop().unwrap_or_default();
                let parent = stack.last().map(String::as_str);
                let value = text.trim().to_string();
                text.clear();

                match (name.as_str(), parent) {
                    ("directory", Some("fileSet")) => {
                        if let Some(rule) = pending.as_mut() {
                            rule.directory = Some(value);
                        }
                    }
                    ("include", Some("includes")) => {
                        if let Some(rule) = pending.as_mut() {
                            rule.includes.push(value);
                        }
                    }
                    ("exclude", Some("excludes")) => {
                        if let Some(rule) = pending.as_mut() {
                            rule.excludes.push(value);
                        }
                    }
                    ("defaultValue", Some("requiredProperty")) => {
                        if let Some(property) = pending_property.as_mut() {
                            property.default_value = Some(value);
                        }
                    }
                    ("requiredProperty", _) => {
                        if let Some(property) = pending_property.take() {
                            if property.key.is_empty() {
                                return Err(malformed(
                                    "requiredProperty without a 'key' attribute".to_string(),
                                ));
                            }
                            descriptor.required_properties.push(property);
                        }
                    }
                    ("fileSet", _) => {
                        if let Some(raw) = pending.take() {
                            let rule = finish_rule(raw, rule_index)?;
                            descriptor.rules.push(rule);
                            rule_index += 1;
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(format!("unexpected end of document, <{open}> is not closed")));
    }
    if !saw_root {
        return Err(malformed("document has no root element".to_string()));
    }

    ensure_unique_directories(&descriptor.rules)?;
    Ok(descriptor)
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Reads an attribute by local name, unescaping its value.
fn attribute(element: &BytesStart, key: &str) -> std::result::Result<Option<String>, String> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.local_name().as_ref() == key.as_bytes() {
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            let value = quick_xml::escape::unescape(&raw).map_err(|e| e.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Resolves the five predefined entities and character references. Nothing
/// else is ever expanded.
fn resolve_reference(name: &str) -> Option<String> {
    let predefined = match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => None,
    };
    if let Some(c) = predefined {
        return Some(c.to_string());
    }

    let code = if let Some(hex) = name.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = name.strip_prefix('#') {
        dec.parse().ok()?
    } else {
        return None;
    };
    char::from_u32(code).map(String::from)
}

fn parse_flag(value: Option<String>, attr: &str, default: bool, index: usize) -> Result<bool> {
    match value.as_deref().map(str::trim) {
        None => Ok(default),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(Error::InvalidRule {
            index: Some(index),
            reason: format!("attribute '{attr}' must be \"true\" or \"false\", got \"{other}\""),
        }),
    }
}

fn normalize_directory(raw: &str, index: usize) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    let directory = if trimmed == "." { "" } else { trimmed };

    let escapes_root = Path::new(directory)
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes_root {
        return Err(Error::InvalidRule {
            index: Some(index),
            reason: format!("directory '{raw}' must stay inside the template root"),
        });
    }
    Ok(directory.to_string())
}

fn finish_rule(raw: PendingRule, index: usize) -> Result<FilesetRule> {
    let directory = raw.directory.ok_or_else(|| Error::InvalidRule {
        index: Some(index),
        reason: "missing <directory> element".to_string(),
    })?;

    let rule = FilesetRule {
        directory: normalize_directory(&directory, index)?,
        includes: raw.includes.into_iter().filter(|p| !p.is_empty()).collect(),
        excludes: raw.excludes.into_iter().filter(|p| !p.is_empty()).collect(),
        packaged: parse_flag(raw.packaged, "packaged", false, index)?,
        filtered: parse_flag(raw.filtered, "filtered", true, index)?,
        encoding: raw.encoding,
    };

    FilesetMatcher::new(&rule).map_err(|e| Error::InvalidRule {
        index: Some(index),
        reason: format!("invalid pattern: {e}"),
    })?;

    Ok(rule)
}

fn ensure_unique_directories(rules: &[FilesetRule]) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, rule) in rules.iter().enumerate() {
        if !seen.insert((rule.packaged, rule.directory.as_str())) {
            let category = if rule.packaged { "source" } else { "resource" };
            return Err(Error::InvalidRule {
                index: Some(index),
                reason: format!(
                    "directory '{}' is declared twice among {category} fileSets",
                    rule.directory
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <archetype-descriptor xmlns="http://maven.apache.org/plugins/maven-archetype-plugin/archetype-descriptor/1.1.0" name="demo">
          <requiredProperties>
            <requiredProperty key="javaVersion"><defaultValue>21</defaultValue></requiredProperty>
            <requiredProperty key="owner"/>
          </requiredProperties>
          <fileSets>
            <fileSet filtered="true" packaged="true">
              <directory>src/main/java</directory>
              <includes><include>**/*.java</include></includes>
            </fileSet>
            <fileSet packaged="false">
              <directory>src/main/resources</directory>
              <excludes><exclude>**/*.bak</exclude></excludes>
            </fileSet>
            <fileSet filtered="false">
              <directory/>
              <includes><include>.gitignore</include></includes>
            </fileSet>
          </fileSets>
        </archetype-descriptor>
    "#;

    #[test]
    fn parses_rules_in_document_order() {
        let descriptor = parse_descriptor(SAMPLE, "sample").unwrap();
        assert_eq!(descriptor.name.as_deref(), Some("demo"));
        assert_eq!(descriptor.rules.len(), 3);

        let java = &descriptor.rules[0];
        assert_eq!(java.directory, "src/main/java");
        assert_eq!(java.includes, vec!["**/*.java"]);
        assert!(java.packaged);
        assert!(java.filtered);

        let resources = &descriptor.rules[1];
        assert!(!resources.packaged);
        assert!(resources.includes.is_empty());
        assert_eq!(resources.excludes, vec!["**/*.bak"]);

        let root = &descriptor.rules[2];
        assert_eq!(root.directory, "");
        assert!(!root.filtered);
    }

    #[test]
    fn parses_required_properties() {
        let descriptor = parse_descriptor(SAMPLE, "sample").unwrap();
        assert_eq!(
            descriptor.required_properties,
            vec![
                RequiredProperty { key: "javaVersion".into(), default_value: Some("21".into()) },
                RequiredProperty { key: "owner".into(), default_value: None },
            ]
        );
    }

    #[test]
    fn missing_directory_is_an_invalid_rule() {
        let xml = r#"<archetype-descriptor><fileSets>
            <fileSet packaged="true"><directory>src/main/java</directory></fileSet>
            <fileSet packaged="true"><includes><include>*</include></includes></fileSet>
        </fileSets></archetype-descriptor>"#;
        match parse_descriptor(xml, "x") {
            Err(Error::InvalidRule { index, reason }) => {
                assert_eq!(index, Some(1));
                assert!(reason.contains("directory"));
            }
            other => panic!("Expected InvalidRule, got {other:?}"),
        }
    }

    #[test]
    fn unclosed_document_is_malformed() {
        let xml = "<archetype-descriptor><fileSets><fileSet>";
        assert!(matches!(
            parse_descriptor(xml, "x"),
            Err(Error::MalformedDescriptor { .. })
        ));
    }

    #[test]
    fn mismatched_tags_are_malformed() {
        let xml = "<archetype-descriptor><fileSets></fileSet></archetype-descriptor>";
        assert!(matches!(
            parse_descriptor(xml, "x"),
            Err(Error::MalformedDescriptor { .. })
        ));
    }

    #[test]
    fn empty_document_is_malformed() {
        assert!(matches!(parse_descriptor("", "x"), Err(Error::MalformedDescriptor { .. })));
    }

    #[test]
    fn external_entities_are_never_resolved() {
        let xml = r#"<?xml version="1.0"?>
            <!DOCTYPE foo [ <!ENTITY xxe SYSTEM "file:///etc/passwd"> ]>
            <archetype-descriptor><fileSets>
              <fileSet><directory>&xxe;</directory></fileSet>
            </fileSets></archetype-descriptor>"#;
        match parse_descriptor(xml, "x") {
            Err(Error::MalformedDescriptor { reason, .. }) => assert!(reason.contains("xxe")),
            other => panic!("Expected MalformedDescriptor, got {other:?}"),
        }
    }

    #[test]
    fn predefined_entities_are_expanded() {
        let xml = r#"<d><fileSet><directory>a &amp; b&#x2F;c</directory></fileSet></d>"#;
        let descriptor = parse_descriptor(xml, "x").unwrap();
        assert_eq!(descriptor.rules[0].directory, "a & b/c");
    }

    #[test]
    fn duplicate_directory_in_same_category_is_rejected() {
        let xml = r#"<d>
            <fileSet packaged="false"><directory>src/main/resources</directory></fileSet>
            <fileSet packaged="false"><directory>src/main/resources</directory></fileSet>
        </d>"#;
        assert!(matches!(parse_descriptor(xml, "x"), Err(Error::InvalidRule { index: Some(1), .. })));

        let xml = r#"<d>
            <fileSet packaged="true"><directory>src/main/java</directory></fileSet>
            <fileSet packaged="false"><directory>src/main/java</directory></fileSet>
        </d>"#;
        assert!(parse_descriptor(xml, "x").is_ok());
    }

    #[test]
    fn rejects_bad_flags_and_escaping_directories() {
        let xml = r#"<d><fileSet packaged="yes"><directory>src</directory></fileSet></d>"#;
        assert!(matches!(parse_descriptor(xml, "x"), Err(Error::InvalidRule { .. })));

        let xml = r#"<d><fileSet><directory>../outside</directory></fileSet></d>"#;
        assert!(matches!(parse_descriptor(xml, "x"), Err(Error::InvalidRule { .. })));

        let xml = r#"<d><fileSet><directory>src</directory><includes><include>[</include></includes></fileSet></d>"#;
        assert!(matches!(parse_descriptor(xml, "x"), Err(Error::InvalidRule { .. })));
    }

    #[test]
    fn standard_layout_requires_all_four_directories() {
        let descriptor = parse_descriptor(SAMPLE, "sample").unwrap();
        match descriptor.ensure_standard_layout() {
            Err(err @ Error::InvalidRule { index: None, .. }) => {
                assert_eq!(
                    err.to_string(),
                    "Invalid fileSet rules: no fileSet declares the standard directory 'src/test/java'."
                );
            }
            other => panic!("Expected InvalidRule, got {other:?}"),
        }
    }

    #[test]
    fn serialized_descriptor_parses_back_to_the_same_rules() {
        let descriptor = parse_descriptor(SAMPLE, "sample").unwrap();
        let xml = descriptor.to_xml().unwrap();
        assert!(xml.contains(r#"<fileSet filtered="true" packaged="true">"#));
        assert_eq!(parse_descriptor(&xml, "serialized").unwrap(), descriptor);
    }
}

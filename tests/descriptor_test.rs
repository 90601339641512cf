use archetyper::constants::{DESCRIPTOR_FILE, STANDARD_DIRECTORIES};
use archetyper::descriptor::{load_descriptor, parse_descriptor};
use archetyper::error::Error;
use std::path::PathBuf;

fn bundled_descriptor() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("archetype").join(DESCRIPTOR_FILE)
}

#[test]
fn test_bundled_descriptor_exists() {
    assert!(bundled_descriptor().is_file());
}

#[test]
fn test_bundled_descriptor_covers_standard_directories() {
    let descriptor = load_descriptor(bundled_descriptor()).unwrap();
    assert!(descriptor.rules.len() >= 4);
    for directory in STANDARD_DIRECTORIES {
        assert!(descriptor.rule(directory).is_some(), "missing fileSet for {directory}");
    }
}

#[test]
fn test_bundled_sources_are_packaged() {
    let descriptor = load_descriptor(bundled_descriptor()).unwrap();
    assert!(descriptor.rule("src/main/java").unwrap().packaged);
    assert!(descriptor.rule("src/test/java").unwrap().packaged);
    assert!(!descriptor.rule("src/main/resources").unwrap().packaged);
    assert!(!descriptor.rule("src/test/resources").unwrap().packaged);

    let sources: Vec<_> = descriptor.sources().map(|r| r.directory.as_str()).collect();
    assert_eq!(sources, vec!["src/main/java", "src/test/java"]);
}

#[test]
fn test_reserialized_descriptor_keeps_the_rules() {
    let descriptor = load_descriptor(bundled_descriptor()).unwrap();
    let reparsed = parse_descriptor(&descriptor.to_xml().unwrap(), "reserialized").unwrap();
    reparsed.ensure_standard_layout().unwrap();
    assert_eq!(reparsed.rules, descriptor.rules);
}

#[test]
fn test_missing_descriptor_file_is_malformed() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let result = load_descriptor(temp_dir.path().join("archetype-metadata.xml"));
    assert!(matches!(result, Err(Error::MalformedDescriptor { .. })));
}

#[test]
fn test_load_requires_standard_layout() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("archetype-metadata.xml");
    std::fs::write(
        &path,
        r#"<archetype-descriptor><fileSets>
             <fileSet packaged="true"><directory>src/main/java</directory></fileSet>
           </fileSets></archetype-descriptor>"#,
    )
    .unwrap();
    assert!(matches!(load_descriptor(&path), Err(Error::InvalidRule { .. })));
}

//! Common constants used throughout archetyper.

/// Descriptor location relative to the archetype root
pub const DESCRIPTOR_FILE: &str = "META-INF/maven/archetype-metadata.xml";

/// Template tree location relative to the archetype root
pub const RESOURCES_DIR: &str = "archetype-resources";

/// The project descriptor rendered by the generator itself
pub const POM_FILE: &str = "pom.xml";

/// Variables every generation must bind, in prompt order
pub const REQUIRED_VARIABLES: [&str; 3] = ["groupId", "artifactId", "version"];

/// Directories every descriptor must declare a fileSet for
pub const STANDARD_DIRECTORIES: [&str; 4] =
    ["src/main/java", "src/test/java", "src/main/resources", "src/test/resources"];

/// Extra variable bound to `groupId` when not supplied
pub const PACKAGE_VARIABLE: &str = "package";

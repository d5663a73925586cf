//! Well-known lopper configuration file names.

use std::path::Path;

/// Repository configuration files probed during auto-discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFile {
    /// `.lopper.yml`
    DotYml,
    /// `.lopper.yaml`
    DotYaml,
    /// `lopper.json`
    Json,
}

impl ConfigFile {
    /// Discovery order; the first existing file wins.
    pub const DISCOVERY_ORDER: [ConfigFile; 3] =
        [ConfigFile::DotYml, ConfigFile::DotYaml, ConfigFile::Json];

    /// Get the string representation of the file name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DotYml => ".lopper.yml",
            Self::DotYaml => ".lopper.yaml",
            Self::Json => "lopper.json",
        }
    }
}

impl AsRef<Path> for ConfigFile {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for ConfigFile {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! CLI configuration (`hostbind.toml`).
//!
//! ```toml
//! [search]
//! page_size = 100
//!
//! [output]
//! pretty = true
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostbindConfig {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Hosts pulled from the inventory per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    hostbind_binder::DEFAULT_PAGE_SIZE
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    #[serde(default)]
    pub pretty: bool,
}

impl HostbindConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: HostbindConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        if config.search.page_size == 0 {
            anyhow::bail!("[search].page_size must be at least 1");
        }
        Ok(config)
    }

    /// Config from `path`, or defaults when none was given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_without_file() {
        let config = HostbindConfig::load(None).unwrap();
        assert_eq!(config.search.page_size, 100);
        assert!(!config.output.pretty);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[search]
page_size = 25

[output]
pretty = true
"#;
        let config: HostbindConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.search.page_size, 25);
        assert!(config.output.pretty);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config: HostbindConfig = toml::from_str("[output]\npretty = true\n").unwrap();
        assert_eq!(config.search.page_size, 100);
    }

    #[test]
    fn from_file_rejects_zero_page_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[search]\npage_size = 0").unwrap();
        assert!(HostbindConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[search]\npage_size = 7").unwrap();
        let config = HostbindConfig::from_file(file.path()).unwrap();
        assert_eq!(config.search.page_size, 7);
    }
}

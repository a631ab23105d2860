//! `staticize init`: write a commented config file.

use anyhow::{Context, Result, bail};
use std::fs;

use crate::config::SiteConfig;
use crate::log;

/// Write the config template to `config.config_path`.
///
/// An existing file is only replaced with `force`.
pub fn write_config(config: &SiteConfig, force: bool) -> Result<()> {
    let path = &config.config_path;
    if path.exists() && !force {
        bail!("{} already exists, pass --force to overwrite it", path.display());
    }

    let content = format!(
        "# staticize configuration (v{})\n\n{}",
        env!("CARGO_PKG_VERSION"),
        SiteConfig::template()
    );
    fs::write(path, content)
        .with_context(|| format!("Failed to write config file '{}'", path.display()))?;

    log!("init"; "wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &tempfile::TempDir) -> SiteConfig {
        SiteConfig {
            config_path: dir.path().join("staticize.toml"),
            root: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_writes_template() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = config_in(&dir);
        write_config(&config, false).unwrap();

        let content = fs::read_to_string(&config.config_path).unwrap();
        assert!(content.starts_with("# staticize configuration"));
        assert!(content.contains("[build]"));
        assert!(toml::from_str::<SiteConfig>(&content).is_ok());
    }

    #[test]
    fn test_refuses_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = config_in(&dir);
        fs::write(&config.config_path, "# mine").unwrap();

        assert!(write_config(&config, false).is_err());
        assert_eq!(fs::read_to_string(&config.config_path).unwrap(), "# mine");

        write_config(&config, true).unwrap();
        assert!(fs::read_to_string(&config.config_path).unwrap().contains("[site]"));
    }
}

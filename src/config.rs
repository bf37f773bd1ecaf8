//! Parses config file

use std::{
    fs::OpenOptions,
    io::Read,
    path::{Path, PathBuf},
};

use std::env;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub overwrite_vmat: Option<bool>,
    pub rename_textures: Option<bool>,
    pub remove_vtf: Option<bool>,
}

pub static CONFIG_FILE_NAME: &str = "config.toml";

/// Parse `config.toml` in the same folder as the binary
///
/// A missing file is not an error, everything in it has a default.
pub fn parse_config() -> eyre::Result<Config> {
    let path = match env::current_exe() {
        Ok(path) => path
            .parent()
            .map(|parent| parent.join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME)),
        Err(_) => PathBuf::from(CONFIG_FILE_NAME),
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    parse_config_from_file(path.as_path())
}

pub fn parse_config_from_file(path: &Path) -> eyre::Result<Config> {
    let mut file = OpenOptions::new().read(true).open(path.as_os_str())?;
    let mut buffer = String::new();

    file.read_to_string(&mut buffer)?;

    let config: Config = toml::from_str(&buffer)?;

    Ok(config)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partial_config_parses() {
        let config: Config = toml::from_str("overwrite_vmat = false").unwrap();

        assert_eq!(config.overwrite_vmat, Some(false));
        assert_eq!(config.rename_textures, None);
    }

    #[test]
    fn empty_config_parses() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.overwrite_vmat, None);
    }
}

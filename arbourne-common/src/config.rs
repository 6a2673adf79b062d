//! Configuration loading and data folder resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Name of the SQLite database file inside the data folder.
pub const DATABASE_FILE: &str = "arbourne.db";

/// Default listen address when nothing else is configured.
pub const DEFAULT_BIND: &str = "127.0.0.1:8310";

/// Resolve the data folder, priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`data_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(folder) = config.get("data_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(folder);
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    default_data_folder()
}

/// Full path to the database file inside `data_folder`, creating the folder
/// if it does not exist yet.
pub fn database_path(data_folder: &PathBuf) -> Result<PathBuf> {
    std::fs::create_dir_all(data_folder)?;
    Ok(data_folder.join(DATABASE_FILE))
}

/// Locate the platform configuration file, if any
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // ~/.config/arbourne/config.toml first, then /etc/arbourne/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("arbourne").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/arbourne/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("arbourne").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// OS-dependent default data folder
fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("arbourne"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\arbourne"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("arbourne"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/arbourne"))
    } else {
        dirs::data_local_dir()
            .map(|d| d.join("arbourne"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/arbourne"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_arg_wins() {
        let folder = resolve_data_folder(Some("/tmp/arbourne-test"), "ARBOURNE_TEST_UNSET_VAR");
        assert_eq!(folder, PathBuf::from("/tmp/arbourne-test"));
    }

    #[test]
    fn env_var_wins_over_default() {
        std::env::set_var("ARBOURNE_TEST_DATA_VAR", "/tmp/arbourne-env");
        let folder = resolve_data_folder(None, "ARBOURNE_TEST_DATA_VAR");
        std::env::remove_var("ARBOURNE_TEST_DATA_VAR");
        assert_eq!(folder, PathBuf::from("/tmp/arbourne-env"));
    }

    #[test]
    fn database_path_creates_folder() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("nested").join("data");
        let db = database_path(&folder).unwrap();
        assert!(folder.exists());
        assert!(db.ends_with(DATABASE_FILE));
    }
}

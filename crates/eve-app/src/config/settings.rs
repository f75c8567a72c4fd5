//! Settings parser for .eve/config.toml

use std::path::Path;

use super::types::Settings;
use eve_core::prelude::*;

const CONFIG_FILENAME: &str = "config.toml";
/// Directory holding the inspector config, relative to the config root.
pub const EVE_DIR: &str = ".eve";

/// Load settings from `.eve/config.toml` under `config_root`.
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(config_root: &Path) -> Settings {
    let config_path = config_root.join(EVE_DIR).join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Create `.eve/config.toml` with commented defaults if it is missing.
pub fn init_config_dir(config_root: &Path) -> Result<()> {
    let eve_dir = config_root.join(EVE_DIR);

    if !eve_dir.exists() {
        std::fs::create_dir_all(&eve_dir)
            .map_err(|e| Error::config(format!("Failed to create .eve dir: {}", e)))?;
        info!("Created .eve directory");
    }

    let config_path = eve_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        std::fs::write(&config_path, generate_default_config())
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Created default config.toml");
    }

    Ok(())
}

const CONFIG_HEADER: &str = "# EVE inspector configuration\n\n";

fn generate_default_config() -> String {
    format!(
        r#"{CONFIG_HEADER}[summary]
expand_level = 2            # Tree depth opened after a rebuild
highlight_debounce_ms = 200 # Quiet period before a hover highlight is sent
highlight_selection = "Global Highlight"
size_limit = 0              # Most summary nodes shown (0 = unlimited)

[ged]
default_color = "cyan"
string_width_px = 250
# palette = ["gold", "darkorange", "rgb(102,51,0)"]

[colors]
# ROOT colour index = CSS colour
# 41 = "rgb(204, 198, 170)"

# Extra editor schemas:
# [[schema]]
# class = "REveStraightLineSet"
# sub = ["REveElement"]
# entries = [{{ name = "LineWidth", type = "Number" }}]
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_settings_defaults() {
        let temp = tempdir().unwrap();
        let settings = load_settings(temp.path());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_settings_custom() {
        let temp = tempdir().unwrap();
        let eve_dir = temp.path().join(".eve");
        std::fs::create_dir_all(&eve_dir).unwrap();
        std::fs::write(
            eve_dir.join("config.toml"),
            "[summary]\nhighlight_debounce_ms = 50\n",
        )
        .unwrap();

        let settings = load_settings(temp.path());
        assert_eq!(settings.summary.highlight_debounce_ms, 50);
        assert_eq!(settings.summary.expand_level, 2);
    }

    #[test]
    fn test_load_settings_invalid_toml() {
        let temp = tempdir().unwrap();
        let eve_dir = temp.path().join(".eve");
        std::fs::create_dir_all(&eve_dir).unwrap();
        std::fs::write(eve_dir.join("config.toml"), "not valid toml {{{{").unwrap();

        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_init_config_dir() {
        let temp = tempdir().unwrap();
        init_config_dir(temp.path()).unwrap();

        let path = temp.path().join(".eve/config.toml");
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Settings = toml::from_str(&content).expect("Default config should be valid TOML");
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    fn test_init_config_dir_keeps_existing_file() {
        let temp = tempdir().unwrap();
        let eve_dir = temp.path().join(".eve");
        std::fs::create_dir_all(&eve_dir).unwrap();
        std::fs::write(eve_dir.join("config.toml"), "[ged]\nstring_width_px = 300\n").unwrap();

        init_config_dir(temp.path()).unwrap();
        assert_eq!(load_settings(temp.path()).ged.string_width_px, 300);
    }
}

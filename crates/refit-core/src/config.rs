//! Configuration tree for the customization engine.
//!
//! Root configuration struct and nested section types with full defaults,
//! YAML file loading, and validation. Every leaf defaults to "feature off",
//! so a missing key never disables loading and never crashes the engine.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Root config
// ---------------------------------------------------------------------------

/// Root configuration for a refit run.
///
/// Unknown keys in the file are ignored; absent keys take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sidebar: SidebarConfig,
    pub control_strip: ControlStripConfig,
    pub workspace: WorkspaceSection,
    pub logging: LoggingSection,
}

impl Config {
    /// Validates the entire configuration, returning an error message on
    /// failure. Tab names are lookup keys for lower-cased labels, so they
    /// must themselves be lower-case and free of whitespace.
    pub fn validate(&self) -> Result<(), String> {
        match self.logging.level.to_lowercase().trim() {
            "" | "trace" | "debug" | "info" | "warn" | "warning" | "error" | "fatal" => {}
            _ => {
                return Err(
                    "logging.level must be one of trace, debug, info, warn, error, fatal".into(),
                )
            }
        }
        match self.logging.format.to_lowercase().trim() {
            "" | "console" | "json" => {}
            _ => return Err("logging.format must be one of console, json".into()),
        }

        for name in self.sidebar.tabs.keys() {
            if name.trim().is_empty() {
                return Err("sidebar.tabs contains an empty tab name".into());
            }
            if name.chars().any(|c| c.is_whitespace()) {
                return Err(format!("sidebar.tabs.{name:?} must not contain whitespace"));
            }
            if name.chars().any(|c| c.is_uppercase()) {
                return Err(format!(
                    "sidebar.tabs.{name:?} must be lower-case (tab labels are lower-cased before lookup)"
                ));
            }
        }

        Ok(())
    }

    /// Look up the configuration entry for a tab by its lower-cased label.
    /// `None` means the tab is unconfigured and must be left untouched.
    pub fn tab(&self, name: &str) -> Option<&TabConfig> {
        self.sidebar.tabs.get(name)
    }
}

// ---------------------------------------------------------------------------
// Section configs
// ---------------------------------------------------------------------------

/// Sidebar (tab rail) options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SidebarConfig {
    /// Hide the entire sidebar unconditionally.
    pub hide: bool,
    pub if_one_workspace: IfOneWorkspaceConfig,
    pub workspace_switcher: WorkspaceSwitcherConfig,
    /// Per-tab options keyed by lower-cased tab label. Unlisted tabs are
    /// left exactly as the host renders them.
    pub tabs: BTreeMap<String, TabConfig>,
}

/// Options that apply only when exactly one workspace is signed in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IfOneWorkspaceConfig {
    pub hide_sidebar: bool,
    pub add_workspace_button: AddWorkspaceButtonConfig,
    pub home_tab: HomeTabConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddWorkspaceButtonConfig {
    /// Mirror an "add workspace" affordance into the secondary navigation.
    pub create_nav_button: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HomeTabConfig {
    /// Keep a home mirror button in the DOM at all times, visible only while
    /// the current location indicates an active search.
    pub create_nav_button_on_search: bool,
}

/// Workspace-switcher control options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkspaceSwitcherConfig {
    pub hide: bool,
    /// Rewire the switcher so activating it lands on the home tab instead of
    /// opening the switcher menu.
    pub click_to_go_home: bool,
    pub highlight: bool,
    /// Mirror the non-current workspaces as dedicated switch buttons.
    pub add_other_workspace_buttons: bool,
}

/// Per-tab options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TabConfig {
    /// Visually suppress the tab in the rail.
    pub hide: bool,
    /// Mirror the tab into the secondary navigation area.
    pub create_nav_button: bool,
    /// Mirror the tab, but keep the mirror visible only during search.
    pub create_nav_button_on_search: bool,
}

/// Bottom control-strip options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ControlStripConfig {
    /// Relocate the control strip into the tab rail whenever the host
    /// recreates it.
    pub move_up: bool,
    pub create_button: CreateButtonConfig,
    pub avatar: AvatarConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateButtonConfig {
    pub hide: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Relocate the avatar/status container into the top navigation.
    pub move_to_nav: bool,
}

/// Workspace-pane cosmetics.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkspaceSection {
    /// Remove the rounded workspace chrome so the pane meets the window edge.
    pub square_off: bool,
}

/// Logging section, resolved into a [`crate::logging::LoggingConfig`] by the
/// CLI (CLI flags override these values).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub format: String,
}

// ---------------------------------------------------------------------------
// File loading
// ---------------------------------------------------------------------------

/// Load config with defaults < (optional) config file precedence. An
/// explicitly named file that cannot be read or parsed is a hard error; a
/// missing file in the default search path silently yields defaults.
pub fn load_config(config_file: Option<&str>) -> Result<(Config, Option<PathBuf>), String> {
    let explicit = config_file
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);

    let (path_to_try, explicit_path) = match explicit {
        Some(path) => (Some(path), true),
        None => (find_config_file(), false),
    };

    if let Some(path) = path_to_try {
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let cfg = parse_config(&text)?;
                return Ok((cfg, Some(path)));
            }
            Err(err) => {
                if explicit_path {
                    return Err(format!("failed to load config file: {err}"));
                }
            }
        }
    }

    Ok((Config::default(), None))
}

/// Parse a YAML configuration document and validate it.
pub fn parse_config(text: &str) -> Result<Config, String> {
    let cfg: Config = serde_yaml::from_str(text).map_err(|err| format!("parse config: {err}"))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Search for a configuration file in the standard locations.
/// Returns `None` if no config file is found.
pub fn find_config_file() -> Option<PathBuf> {
    for dir in config_search_paths() {
        let candidate = dir.join("config.yaml");
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            paths.push(Path::new(&xdg).join("refit"));
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        if !home.trim().is_empty() {
            paths.push(Path::new(&home).join(".config/refit"));
        }
    }
    paths.push(PathBuf::from("."));

    paths
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_all_off() {
        let cfg = Config::default();
        assert!(!cfg.sidebar.hide);
        assert!(!cfg.sidebar.if_one_workspace.hide_sidebar);
        assert!(!cfg.sidebar.workspace_switcher.click_to_go_home);
        assert!(cfg.sidebar.tabs.is_empty());
        assert!(!cfg.control_strip.move_up);
        assert!(!cfg.control_strip.create_button.hide);
        assert!(!cfg.control_strip.avatar.move_to_nav);
        assert!(!cfg.workspace.square_off);
    }

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn parse_partial_document() {
        let cfg = parse_config(
            r#"
sidebar:
  workspace_switcher:
    highlight: true
  tabs:
    home:
      hide: true
      create_nav_button_on_search: true
    dms:
      create_nav_button: true
workspace:
  square_off: true
"#,
        )
        .unwrap();

        assert!(cfg.sidebar.workspace_switcher.highlight);
        assert!(cfg.workspace.square_off);
        let home = cfg.tab("home").unwrap();
        assert!(home.hide);
        assert!(!home.create_nav_button);
        assert!(home.create_nav_button_on_search);
        let dms = cfg.tab("dms").unwrap();
        assert!(!dms.hide);
        assert!(dms.create_nav_button);
        assert!(cfg.tab("activity").is_none());
        // Sections the document never mentions stay at their defaults.
        assert!(!cfg.sidebar.hide);
        assert!(!cfg.control_strip.move_up);
    }

    #[test]
    fn parse_ignores_unknown_keys() {
        let cfg = parse_config(
            r#"
sidebar:
  hide: true
future_section:
  anything: goes
"#,
        )
        .unwrap();
        assert!(cfg.sidebar.hide);
    }

    #[test]
    fn validate_rejects_upper_case_tab_name() {
        let mut cfg = Config::default();
        cfg.sidebar.tabs.insert("Home".into(), TabConfig::default());
        let err = match cfg.validate() {
            Ok(()) => panic!("expected error"),
            Err(err) => err,
        };
        assert!(err.contains("lower-case"), "err={err}");
    }

    #[test]
    fn validate_rejects_tab_name_with_whitespace() {
        let mut cfg = Config::default();
        cfg.sidebar
            .tabs
            .insert("direct messages".into(), TabConfig::default());
        let err = match cfg.validate() {
            Ok(()) => panic!("expected error"),
            Err(err) => err,
        };
        assert!(err.contains("whitespace"), "err={err}");
    }

    #[test]
    fn validate_rejects_bad_log_level() {
        let mut cfg = Config::default();
        cfg.logging.level = "bogus".into();
        let err = match cfg.validate() {
            Ok(()) => panic!("expected error"),
            Err(err) => err,
        };
        assert!(err.contains("logging.level"), "err={err}");
    }

    #[test]
    fn load_config_missing_explicit_file_is_hard_error() {
        let err = match load_config(Some("/nonexistent/refit-config.yaml")) {
            Ok(_) => panic!("expected error"),
            Err(err) => err,
        };
        assert!(err.contains("failed to load config file"), "err={err}");
    }
}

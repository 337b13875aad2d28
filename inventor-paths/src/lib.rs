//! XDG Base Directory paths for inventor.
//!
//! CLI tools should use XDG paths for cross-platform consistency,
//! not platform-native paths.

use std::path::PathBuf;

/// Get the inventor config directory.
///
/// Returns `$XDG_CONFIG_HOME/inventor` if set, otherwise `~/.config/inventor`.
///
/// # Examples
///
/// ```
/// use inventor_paths::config_dir;
///
/// let config_file = config_dir().join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("inventor")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config/inventor")
    } else {
        PathBuf::from(".config/inventor")
    }
}

/// Get the inventor data directory.
///
/// Returns `$XDG_DATA_HOME/inventor` if set, otherwise `~/.local/share/inventor`.
pub fn data_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join("inventor")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".local/share/inventor")
    } else {
        PathBuf::from(".local/share/inventor")
    }
}

/// Directory third-party plugin packages are installed into.
///
/// This is the package-manager root consulted for every non-built-in plugin.
pub fn package_root() -> PathBuf {
    data_dir().join("packages")
}

/// Directory the built-in plugins ship in.
///
/// Resolves to `<exe dir>/../lib/inventor/plugins`, falling back to the
/// data directory when the executable location is unknown.
pub fn builtin_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().and_then(|bin| bin.parent()).map(|p| p.to_path_buf()))
        .map(|prefix| prefix.join("lib/inventor/plugins"))
        .unwrap_or_else(|| data_dir().join("builtin"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_ends_with_inventor() {
        let path = config_dir();
        assert!(
            path.ends_with("inventor"),
            "config_dir should end with 'inventor'"
        );
    }

    #[test]
    fn test_package_root_is_under_data_dir() {
        let root = package_root();
        assert!(root.ends_with("packages"));
        assert!(root.parent().is_some_and(|p| p.ends_with("inventor")));
    }

    #[test]
    fn test_builtin_root_ends_with_plugins_dir() {
        let root = builtin_root();
        assert!(root.ends_with("lib/inventor/plugins") || root.ends_with("builtin"));
    }

    #[test]
    fn test_dirs_respect_xdg_env() {
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", "/tmp/test-config");
            std::env::set_var("XDG_DATA_HOME", "/tmp/test-data");
        }
        assert_eq!(config_dir(), PathBuf::from("/tmp/test-config/inventor"));
        assert_eq!(data_dir(), PathBuf::from("/tmp/test-data/inventor"));
        assert_eq!(
            package_root(),
            PathBuf::from("/tmp/test-data/inventor/packages")
        );
        unsafe {
            std::env::remove_var("XDG_CONFIG_HOME");
            std::env::remove_var("XDG_DATA_HOME");
        }
    }
}

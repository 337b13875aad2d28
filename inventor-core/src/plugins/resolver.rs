//! Plugin list resolution
//!
//! Turns the built-in plugin list and the configured plugin list into an
//! ordered, de-duplicated list of [`PluginDescriptor`]s. Built-ins always come
//! first; the first occurrence of a package name wins.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Packages that ship with inventor and are always registered
pub const BUILTIN_PLUGINS: &[&str] = &["inventor-plugin-plugin", "inventor-plugin-app"];

/// Prefixes stripped from a package name to obtain the plugin command name
const NAME_PREFIXES: &[&str] = &["inventor-plugin-", "plugin-"];

/// One entry of the `plugins` config list.
///
/// Either a bare package name or a `[package, options]` pair:
///
/// ```toml
/// plugins = ["inventor-plugin-docs", ["inventor-plugin-lint", { strict = true }]]
/// ```
///
/// A one-element list (`["inventor-plugin-docs"]`) is the bare form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, try_from = "RawConfigEntry")]
pub enum PluginConfigEntry {
    Name(String),
    WithOptions(String, toml::Value),
}

/// Either config form as written, before its shape is checked
#[derive(Deserialize)]
#[serde(untagged)]
enum RawConfigEntry {
    Name(String),
    List(Vec<toml::Value>),
}

impl TryFrom<RawConfigEntry> for PluginConfigEntry {
    type Error = String;

    fn try_from(raw: RawConfigEntry) -> Result<Self, Self::Error> {
        let items = match raw {
            RawConfigEntry::Name(name) => return Ok(Self::Name(name)),
            RawConfigEntry::List(items) => items,
        };
        let mut items = items.into_iter();
        let name = match items.next() {
            Some(toml::Value::String(name)) => name,
            _ => return Err("plugin entry must start with a package name".to_string()),
        };
        match (items.next(), items.next()) {
            (None, _) => Ok(Self::Name(name)),
            (Some(options), None) => Ok(Self::WithOptions(name, options)),
            (Some(_), Some(_)) => Err(format!(
                "plugin entry for '{name}' takes at most one options value"
            )),
        }
    }
}

impl PluginConfigEntry {
    pub fn package_name(&self) -> &str {
        match self {
            Self::Name(name) | Self::WithOptions(name, _) => name,
        }
    }

    pub fn options(&self) -> Option<&toml::Value> {
        match self {
            Self::Name(_) => None,
            Self::WithOptions(_, options) => Some(options),
        }
    }
}

impl From<&str> for PluginConfigEntry {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

/// A plugin slated for registration
#[derive(Debug, Clone, PartialEq)]
pub struct PluginDescriptor {
    pub package_name: String,
    /// Command name derived from the package name, `None` if underivable
    pub plugin_name: Option<String>,
    /// Whether this package comes from the built-in list
    pub builtin: bool,
    /// Per-plugin options from config, handed to the plugin constructor
    pub options: Option<toml::Value>,
}

impl PluginDescriptor {
    fn from_entry(entry: &PluginConfigEntry, builtin: bool) -> Self {
        let package_name = entry.package_name().to_string();
        Self {
            plugin_name: plugin_name_of(&package_name),
            package_name,
            builtin,
            options: entry.options().cloned(),
        }
    }
}

/// Entries for [`BUILTIN_PLUGINS`]
pub fn builtin_entries() -> Vec<PluginConfigEntry> {
    BUILTIN_PLUGINS.iter().map(|&name| name.into()).collect()
}

pub fn is_builtin(package_name: &str) -> bool {
    BUILTIN_PLUGINS.contains(&package_name)
}

/// Derive the plugin command name from a package name.
///
/// An optional `@scope/` is dropped, then one of the known prefixes must
/// match: `@acme/plugin-app` and `inventor-plugin-app` both yield `app`.
pub fn plugin_name_of(package_name: &str) -> Option<String> {
    let base = match package_name.strip_prefix('@') {
        Some(scoped) => scoped.split_once('/')?.1,
        None => package_name,
    };
    let name = NAME_PREFIXES
        .iter()
        .find_map(|prefix| base.strip_prefix(prefix))?;
    (!name.is_empty()).then(|| name.to_string())
}

/// Merge built-in and configured plugins into registration order.
///
/// Built-ins come first, then configured entries in their given order.
/// Repeated package names keep their first occurrence; a configured entry
/// naming a built-in does not move or duplicate it.
pub fn resolve_plugins(
    builtins: &[PluginConfigEntry],
    configured: &[PluginConfigEntry],
) -> Vec<PluginDescriptor> {
    let mut seen = HashSet::new();
    let tagged = builtins
        .iter()
        .map(|entry| (entry, true))
        .chain(configured.iter().map(|entry| (entry, false)));

    let mut descriptors = Vec::new();
    for (entry, builtin) in tagged {
        if !seen.insert(entry.package_name()) {
            tracing::debug!(package = entry.package_name(), "Duplicate plugin entry ignored");
            continue;
        }
        descriptors.push(PluginDescriptor::from_entry(entry, builtin));
    }
    descriptors
}

/// Keep only the descriptors whose plugin name equals `name` exactly
pub fn filter_by_name(descriptors: Vec<PluginDescriptor>, name: &str) -> Vec<PluginDescriptor> {
    descriptors
        .into_iter()
        .filter(|d| d.plugin_name.as_deref() == Some(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(descriptors: &[PluginDescriptor]) -> Vec<&str> {
        descriptors.iter().map(|d| d.package_name.as_str()).collect()
    }

    #[test]
    fn test_plugin_name_of_prefixed() {
        assert_eq!(plugin_name_of("inventor-plugin-app"), Some("app".into()));
        assert_eq!(plugin_name_of("plugin-docs"), Some("docs".into()));
    }

    #[test]
    fn test_plugin_name_of_scoped() {
        assert_eq!(plugin_name_of("@acme/plugin-deploy"), Some("deploy".into()));
        assert_eq!(
            plugin_name_of("@acme/inventor-plugin-lint"),
            Some("lint".into())
        );
    }

    #[test]
    fn test_plugin_name_of_underivable() {
        assert_eq!(plugin_name_of("left-pad"), None);
        assert_eq!(plugin_name_of("inventor-plugin-"), None);
        assert_eq!(plugin_name_of("@acme"), None);
        assert_eq!(plugin_name_of(""), None);
    }

    #[test]
    fn test_builtins_come_first() {
        let configured = vec!["plugin-docs".into(), "plugin-lint".into()];
        let resolved = resolve_plugins(&builtin_entries(), &configured);
        assert_eq!(
            names(&resolved),
            vec![
                "inventor-plugin-plugin",
                "inventor-plugin-app",
                "plugin-docs",
                "plugin-lint"
            ]
        );
        assert!(resolved[0].builtin);
        assert!(!resolved[2].builtin);
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        let configured = vec![
            "plugin-docs".into(),
            "inventor-plugin-app".into(),
            PluginConfigEntry::WithOptions("plugin-docs".into(), toml::Value::Boolean(true)),
        ];
        let resolved = resolve_plugins(&builtin_entries(), &configured);
        assert_eq!(
            names(&resolved),
            vec!["inventor-plugin-plugin", "inventor-plugin-app", "plugin-docs"]
        );
        assert!(resolved[1].builtin);
        assert!(resolved[2].options.is_none());
    }

    #[test]
    fn test_options_are_carried() {
        let mut table = toml::map::Map::new();
        table.insert("strict".into(), toml::Value::Boolean(true));
        let configured = vec![PluginConfigEntry::WithOptions(
            "plugin-lint".into(),
            toml::Value::Table(table),
        )];
        let resolved = resolve_plugins(&[], &configured);
        let options = resolved[0].options.as_ref().and_then(|o| o.get("strict"));
        assert_eq!(options, Some(&toml::Value::Boolean(true)));
    }

    #[test]
    fn test_filter_by_name_is_exact() {
        let configured = vec!["plugin-app-extra".into()];
        let resolved = resolve_plugins(&builtin_entries(), &configured);
        let filtered = filter_by_name(resolved, "app");
        assert_eq!(names(&filtered), vec!["inventor-plugin-app"]);
    }

    #[test]
    fn test_filter_by_unknown_name_is_empty() {
        let resolved = resolve_plugins(&builtin_entries(), &[]);
        assert!(filter_by_name(resolved, "nope").is_empty());
    }

    #[test]
    fn test_underivable_name_survives_resolution() {
        let resolved = resolve_plugins(&[], &["left-pad".into()]);
        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].plugin_name.is_none());
    }

    #[test]
    fn test_config_entry_deserializes_both_forms() {
        #[derive(Deserialize)]
        struct Wrapper {
            plugins: Vec<PluginConfigEntry>,
        }
        let parsed: Wrapper = toml::from_str(
            r#"plugins = ["plugin-docs", ["plugin-lint", { strict = true }]]"#,
        )
        .unwrap();
        assert_eq!(parsed.plugins[0], PluginConfigEntry::Name("plugin-docs".into()));
        assert_eq!(parsed.plugins[1].package_name(), "plugin-lint");
        assert!(parsed.plugins[1].options().is_some());
    }

    #[derive(Deserialize)]
    struct PluginList {
        plugins: Vec<PluginConfigEntry>,
    }

    #[test]
    fn test_config_entry_single_element_list() {
        let parsed: PluginList =
            toml::from_str(r#"plugins = [["plugin-docs"], "plugin-lint"]"#).unwrap();
        assert_eq!(parsed.plugins[0], PluginConfigEntry::Name("plugin-docs".into()));
        assert!(parsed.plugins[0].options().is_none());
        assert_eq!(parsed.plugins[1].package_name(), "plugin-lint");
    }

    #[test]
    fn test_config_entry_rejects_bad_lists() {
        assert!(toml::from_str::<PluginList>("plugins = [[]]").is_err());
        assert!(toml::from_str::<PluginList>("plugins = [[1, 2]]").is_err());
        assert!(toml::from_str::<PluginList>(r#"plugins = [["a", {}, {}]]"#).is_err());
    }

    #[test]
    fn test_is_builtin() {
        assert!(is_builtin("inventor-plugin-app"));
        assert!(!is_builtin("plugin-docs"));
    }
}

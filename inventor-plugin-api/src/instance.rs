//! PluginInstance - a constructed plugin plus everything the host knows about it

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::Plugin;
use crate::capability::Capabilities;
use crate::context::ExecContext;
use crate::error::PluginError;

/// Filesystem locations derived from a plugin's entry path.
///
/// Given `<pkg>/lib/index.so`, actions live in `<pkg>/lib/actions/` and
/// templates in `<pkg>/templates/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginPaths {
    pub entry_path: PathBuf,
    pub template_path: PathBuf,
    pub action_path: PathBuf,
}

impl PluginPaths {
    pub fn from_entry(entry_path: impl Into<PathBuf>) -> Self {
        let entry_path = entry_path.into();
        let lib_dir = entry_path.parent().unwrap_or(Path::new("")).to_path_buf();
        let package_dir = lib_dir.parent().unwrap_or(Path::new("")).to_path_buf();
        Self {
            template_path: package_dir.join("templates"),
            action_path: lib_dir.join("actions"),
            entry_path,
        }
    }
}

/// A live plugin, owned by the host for one run and shared with its actions
pub struct PluginInstance {
    package_name: String,
    plugin_name: String,
    paths: PluginPaths,
    options: Option<toml::Value>,
    capabilities: Capabilities,
    plugin: Box<dyn Plugin>,
}

impl PluginInstance {
    pub fn new(
        package_name: impl Into<String>,
        plugin_name: impl Into<String>,
        paths: PluginPaths,
        options: Option<toml::Value>,
        capabilities: Capabilities,
        plugin: Box<dyn Plugin>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            plugin_name: plugin_name.into(),
            paths,
            options,
            capabilities,
            plugin,
        }
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Name the plugin is invoked by on the command line
    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    pub fn description(&self) -> String {
        self.plugin.description()
    }

    pub fn entry_path(&self) -> &Path {
        &self.paths.entry_path
    }

    pub fn template_path(&self) -> &Path {
        &self.paths.template_path
    }

    pub fn action_path(&self) -> &Path {
        &self.paths.action_path
    }

    pub fn paths(&self) -> &PluginPaths {
        &self.paths
    }

    pub fn plugin(&self) -> &dyn Plugin {
        self.plugin.as_ref()
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Options configured for this plugin (`["pkg", { ... }]` in config)
    pub fn options<T: DeserializeOwned>(&self) -> Result<Option<T>, PluginError> {
        self.options
            .clone()
            .map(|value| value.try_into())
            .transpose()
            .map_err(|e: toml::de::Error| PluginError::config(e.to_string()))
    }

    // ─── Templates ───────────────────────────────────────────────────

    pub fn template_dir(&self, template_name: &str) -> PathBuf {
        self.paths.template_path.join(template_name)
    }

    /// Render the `template_name` template directory into `destination`
    /// (relative to the context's working directory)
    pub async fn render_template(
        &self,
        ctx: &ExecContext,
        template_name: &str,
        destination: impl AsRef<Path>,
        data: &Value,
    ) -> Result<(), PluginError> {
        let template_dir = self.template_dir(template_name);
        let destination_dir = ctx.resolve(destination);
        self.capabilities
            .templates()?
            .render_dir(&template_dir, &destination_dir, data)
            .await
    }

    pub async fn render_template_file(
        &self,
        ctx: &ExecContext,
        template_name: &str,
        template_file: &str,
        destination_file: impl AsRef<Path>,
        data: &Value,
    ) -> Result<(), PluginError> {
        let template_file = self.template_dir(template_name).join(template_file);
        let destination_file = ctx.resolve(destination_file);
        self.capabilities
            .templates()?
            .render_file(&template_file, &destination_file, data)
            .await
    }

    // ─── Package manager ─────────────────────────────────────────────

    pub async fn init_package(&self, ctx: &ExecContext) -> Result<(), PluginError> {
        self.capabilities.package_manager()?.init(ctx.cwd()).await
    }

    pub async fn install(&self, ctx: &ExecContext) -> Result<(), PluginError> {
        self.capabilities.package_manager()?.install(ctx.cwd()).await
    }

    pub async fn add_dependencies(
        &self,
        ctx: &ExecContext,
        packages: &[String],
        dev: bool,
    ) -> Result<(), PluginError> {
        self.capabilities
            .package_manager()?
            .add_dependencies(ctx.cwd(), packages, dev)
            .await
    }

    pub async fn remove_dependencies(
        &self,
        ctx: &ExecContext,
        packages: &[String],
        dev: bool,
    ) -> Result<(), PluginError> {
        self.capabilities
            .package_manager()?
            .remove_dependencies(ctx.cwd(), packages, dev)
            .await
    }

    // ─── Version control ─────────────────────────────────────────────

    pub async fn git_init(&self, ctx: &ExecContext) -> Result<(), PluginError> {
        let vcs = self.capabilities.version_control()?;
        if vcs.is_repo(ctx.cwd()).await? {
            tracing::debug!(cwd = %ctx.cwd().display(), "Already a repository, skipping init");
            return Ok(());
        }
        vcs.init(ctx.cwd()).await
    }

    pub async fn install_hooks(&self, ctx: &ExecContext) -> Result<(), PluginError> {
        self.capabilities.hooks()?.install(ctx.cwd()).await
    }
}

impl fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginInstance")
            .field("package_name", &self.package_name)
            .field("plugin_name", &self.plugin_name)
            .field("paths", &self.paths)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Capability, TemplateRenderer, VersionControl};
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::sync::{Arc, Mutex};

    struct AppPlugin;

    impl Plugin for AppPlugin {
        fn description(&self) -> String {
            "Application scaffolding".into()
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    }

    #[async_trait]
    impl TemplateRenderer for RecordingRenderer {
        async fn render_dir(&self, from: &Path, to: &Path, _data: &Value) -> Result<(), PluginError> {
            self.calls.lock().unwrap().push((from.into(), to.into()));
            Ok(())
        }

        async fn render_file(&self, from: &Path, to: &Path, _data: &Value) -> Result<(), PluginError> {
            self.calls.lock().unwrap().push((from.into(), to.into()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeGit {
        repo: bool,
        inits: Mutex<u32>,
    }

    #[async_trait]
    impl VersionControl for FakeGit {
        async fn init(&self, _cwd: &Path) -> Result<(), PluginError> {
            *self.inits.lock().unwrap() += 1;
            Ok(())
        }

        async fn is_repo(&self, _cwd: &Path) -> Result<bool, PluginError> {
            Ok(self.repo)
        }

        async fn commit(&self, _cwd: &Path, _message: &str) -> Result<(), PluginError> {
            Ok(())
        }
    }

    fn instance(capabilities: Capabilities, options: Option<toml::Value>) -> PluginInstance {
        PluginInstance::new(
            "inventor-plugin-app",
            "app",
            PluginPaths::from_entry("/pkgs/inventor-plugin-app/lib/index.so"),
            options,
            capabilities,
            Box::new(AppPlugin),
        )
    }

    #[test]
    fn test_paths_from_entry() {
        let paths = PluginPaths::from_entry("/pkgs/app/lib/index.so");
        assert_eq!(paths.action_path, PathBuf::from("/pkgs/app/lib/actions"));
        assert_eq!(paths.template_path, PathBuf::from("/pkgs/app/templates"));
        assert_eq!(paths.entry_path, PathBuf::from("/pkgs/app/lib/index.so"));
    }

    #[test]
    fn test_accessors() {
        let plugin = instance(Capabilities::default(), None);
        assert_eq!(plugin.plugin_name(), "app");
        assert_eq!(plugin.package_name(), "inventor-plugin-app");
        assert_eq!(plugin.description(), "Application scaffolding");
        assert_eq!(
            plugin.template_dir("react"),
            PathBuf::from("/pkgs/inventor-plugin-app/templates/react")
        );
    }

    #[test]
    fn test_typed_options() {
        #[derive(Deserialize)]
        struct AppOptions {
            kind: String,
        }

        let value: toml::Value = toml::from_str(r#"kind = "react-webpack""#).unwrap();
        let plugin = instance(Capabilities::default(), Some(value));
        let opts: AppOptions = plugin.options().unwrap().unwrap();
        assert_eq!(opts.kind, "react-webpack");

        let bare = instance(Capabilities::default(), None);
        assert!(bare.options::<AppOptions>().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_render_template_resolves_against_context() {
        let renderer = Arc::new(RecordingRenderer::default());
        let plugin = instance(Capabilities::new().with_templates(renderer.clone()), None);
        let ctx = ExecContext::new("/work");

        plugin
            .render_template(&ctx, "react", "my-app", &Value::Null)
            .await
            .unwrap();

        let calls = renderer.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            (
                PathBuf::from("/pkgs/inventor-plugin-app/templates/react"),
                PathBuf::from("/work/my-app")
            )
        );
    }

    #[tokio::test]
    async fn test_missing_capability_is_reported() {
        let plugin = instance(Capabilities::default(), None);
        let ctx = ExecContext::new("/work");
        let err = plugin.install(&ctx).await.unwrap_err();
        assert!(matches!(
            err,
            PluginError::Unavailable(Capability::PackageManager)
        ));
    }

    #[tokio::test]
    async fn test_git_init_skips_existing_repo() {
        let git = Arc::new(FakeGit {
            repo: true,
            ..Default::default()
        });
        let plugin = instance(Capabilities::new().with_version_control(git.clone()), None);
        plugin.git_init(&ExecContext::new("/work")).await.unwrap();
        assert_eq!(*git.inits.lock().unwrap(), 0);

        let fresh = Arc::new(FakeGit::default());
        let plugin = instance(Capabilities::new().with_version_control(fresh.clone()), None);
        plugin.git_init(&ExecContext::new("/work")).await.unwrap();
        assert_eq!(*fresh.inits.lock().unwrap(), 1);
    }
}

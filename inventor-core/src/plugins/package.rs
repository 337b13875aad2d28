//! Package resolution: package name to entry module path
//!
//! Installed packages live in one directory each:
//!
//! ```text
//! <root>/<package-name>/
//!   package.toml        # optional, [package] name / version / description / main
//!   lib/index.so        # entry module (default location)
//!   lib/actions/*.so    # action modules
//!   templates/          # plugin templates
//! ```
//!
//! Built-in packages resolve under the built-in root, everything else under
//! the user package root.

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use super::error::ResolveError;

/// Metadata file looked up in each package directory
pub const PACKAGE_MANIFEST: &str = "package.toml";

/// Locates a package's entry module
pub trait PackageResolver: Send + Sync {
    fn resolve_entry(&self, package_name: &str, builtin: bool) -> Result<PathBuf, ResolveError>;
}

/// Contents of `package.toml`
#[derive(Debug, Clone, Deserialize)]
pub struct PackageMetadata {
    pub package: PackageSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageSection {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Entry module path relative to the package directory
    #[serde(default)]
    pub main: Option<PathBuf>,
}

impl PackageMetadata {
    pub fn parse(package_name: &str, content: &str) -> Result<Self, ResolveError> {
        toml::from_str(content).map_err(|e| ResolveError::Metadata {
            package: package_name.to_string(),
            message: e.to_string(),
        })
    }
}

/// Resolves packages from directories on disk
#[derive(Debug, Clone)]
pub struct FsPackageResolver {
    builtin_root: PathBuf,
    package_root: PathBuf,
    extension: String,
}

impl FsPackageResolver {
    /// `extension` is the module file extension used for the default entry
    pub fn new(
        builtin_root: impl Into<PathBuf>,
        package_root: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            builtin_root: builtin_root.into(),
            package_root: package_root.into(),
            extension: extension.into(),
        }
    }

    pub fn builtin_root(&self) -> &Path {
        &self.builtin_root
    }

    pub fn package_root(&self) -> &Path {
        &self.package_root
    }

    /// Default entry module path, relative to the package directory
    pub fn default_entry(&self) -> PathBuf {
        PathBuf::from("lib").join(format!("index.{}", self.extension))
    }

    fn package_dir(&self, package_name: &str, builtin: bool) -> Result<PathBuf, ResolveError> {
        if package_name.is_empty() || !is_contained(Path::new(package_name)) {
            return Err(ResolveError::InvalidName {
                package: package_name.to_string(),
            });
        }
        let root = if builtin {
            &self.builtin_root
        } else {
            &self.package_root
        };
        Ok(root.join(package_name))
    }

    fn read_metadata(&self, package_name: &str, dir: &Path) -> Result<Option<PackageMetadata>, ResolveError> {
        let manifest = dir.join(PACKAGE_MANIFEST);
        if !manifest.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&manifest)?;
        let metadata = PackageMetadata::parse(package_name, &content)?;
        if metadata.package.name != package_name {
            tracing::warn!(
                package = package_name,
                declared = %metadata.package.name,
                "Package name in {} does not match its directory",
                PACKAGE_MANIFEST
            );
        }
        Ok(Some(metadata))
    }
}

impl PackageResolver for FsPackageResolver {
    fn resolve_entry(&self, package_name: &str, builtin: bool) -> Result<PathBuf, ResolveError> {
        let dir = self.package_dir(package_name, builtin)?;
        if !dir.is_dir() {
            return Err(ResolveError::NotInstalled {
                package: package_name.to_string(),
                dir,
            });
        }

        let main = self
            .read_metadata(package_name, &dir)?
            .and_then(|m| m.package.main);
        let relative = match main {
            Some(main) if is_contained(&main) => main,
            Some(main) => {
                return Err(ResolveError::Metadata {
                    package: package_name.to_string(),
                    message: format!("main must stay inside the package: {}", main.display()),
                });
            }
            None => self.default_entry(),
        };

        let entry = dir.join(relative);
        if !entry.is_file() {
            return Err(ResolveError::EntryMissing {
                package: package_name.to_string(),
                path: entry,
            });
        }
        tracing::debug!(package = package_name, entry = %entry.display(), "Resolved plugin entry");
        Ok(entry)
    }
}

/// True when `path` is relative and never climbs out of its base
fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

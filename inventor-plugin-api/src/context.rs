//! ExecContext - the working environment an action runs in
//!
//! The working directory is a value owned by the context rather than process
//! state. Changing it is scoped: [`ExecContext::enter`] borrows the context
//! mutably and restores the previous directory when the guard drops, and
//! [`ExecContext::run_task`] hands the task its own child context.

use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

/// Execution context threaded through every action invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecContext {
    cwd: PathBuf,
    home_dir: Option<PathBuf>,
    username: Option<String>,
}

impl ExecContext {
    /// Create a context rooted at `cwd`
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            home_dir: None,
            username: None,
        }
    }

    /// Capture the process environment once, at startup
    pub fn from_process() -> std::io::Result<Self> {
        let username = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok();
        Ok(Self {
            cwd: std::env::current_dir()?,
            home_dir: dirs::home_dir(),
            username,
        })
    }

    pub fn with_home_dir(mut self, home_dir: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(home_dir.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Current working directory
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn home_dir(&self) -> Option<&Path> {
        self.home_dir.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Resolve `path` against the working directory.
    ///
    /// Absolute paths are returned unchanged.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.cwd.join(path)
    }

    /// Switch the working directory until the returned guard drops
    ///
    /// # Example
    /// ```
    /// use inventor_plugin_api::ExecContext;
    ///
    /// let mut ctx = ExecContext::new("/work");
    /// {
    ///     let scope = ctx.enter("app");
    ///     assert_eq!(scope.cwd(), std::path::Path::new("/work/app"));
    /// }
    /// assert_eq!(ctx.cwd(), std::path::Path::new("/work"));
    /// ```
    pub fn enter(&mut self, dir: impl AsRef<Path>) -> CwdScope<'_> {
        let next = self.resolve(dir);
        let previous = std::mem::replace(&mut self.cwd, next);
        CwdScope {
            ctx: self,
            previous: Some(previous),
        }
    }

    /// Run `task` in `dir` (or the current directory).
    ///
    /// The task receives its own context; `self` is left untouched whether the
    /// task succeeds, fails or panics.
    pub async fn run_task<T, E, F, Fut>(&self, dir: Option<&Path>, task: F) -> Result<T, E>
    where
        F: FnOnce(ExecContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut child = self.clone();
        if let Some(dir) = dir {
            child.cwd = self.resolve(dir);
        }
        tracing::debug!(cwd = %child.cwd.display(), "Running scoped task");
        task(child).await
    }
}

/// Guard returned by [`ExecContext::enter`]
pub struct CwdScope<'a> {
    ctx: &'a mut ExecContext,
    previous: Option<PathBuf>,
}

impl Deref for CwdScope<'_> {
    type Target = ExecContext;

    fn deref(&self) -> &ExecContext {
        self.ctx
    }
}

impl DerefMut for CwdScope<'_> {
    fn deref_mut(&mut self) -> &mut ExecContext {
        self.ctx
    }
}

impl Drop for CwdScope<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.ctx.cwd = previous;
        }
    }
}

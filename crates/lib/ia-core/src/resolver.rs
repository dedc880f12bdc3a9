//! Resolution of the `ia` executable and its invocation mode.
//!
//! On Windows the Python installers ship `ia.exe` inside a `Scripts`
//! directory that is often missing from `PATH`, and `ia` on `PATH` may be a
//! batch shim that only runs through `cmd`. Resolution walks a fixed chain of
//! probes looking for a native executable and only falls back to
//! shell-mediated invocation when every probe misses. The result is computed
//! once and reused for the life of the resolver.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

const DEFAULT_PROGRAM: &str = "ia";
const DEFAULT_NATIVE_PROGRAM: &str = "ia.exe";
const DEFAULT_SCRIPTS_DIR: &str = "Scripts";
const PYENV_ROOT_VARS: &[&str] = &["PYENV", "PYENV_ROOT", "PYENV_HOME"];
const PIN_FILE: &str = "version";
const VERSIONS_DIR: &str = "versions";
const NATIVE_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Which program to run and whether a shell sits in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExecutable {
    pub command: OsString,
    pub use_shell: bool,
}

impl ResolvedExecutable {
    #[must_use]
    pub fn direct(command: impl Into<OsString>) -> Self {
        Self {
            command: command.into(),
            use_shell: false,
        }
    }

    #[must_use]
    pub fn shell(command: impl Into<OsString>) -> Self {
        Self {
            command: command.into(),
            use_shell: true,
        }
    }

    /// Human-readable form used in log lines and error messages.
    #[must_use]
    pub fn display(&self) -> String {
        self.command.to_string_lossy().into_owned()
    }
}

/// Inputs for the probe chain.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Bare program name, used directly on non-shim platforms and for the shell fallback.
    pub program: String,
    /// Native executable name searched for on shim platforms.
    pub native_program: String,
    /// Subdirectory of a Python install that holds console scripts.
    pub scripts_dir: String,
    /// Known-good executable; skips probing entirely.
    pub explicit_path: Option<PathBuf>,
    /// Whether installers on this platform produce shell shims.
    pub shim_platform: bool,
    /// pyenv-win style root containing `version` and `versions/`.
    pub manager_root: Option<PathBuf>,
    /// Conventional install roots, probed along with their immediate subdirectories.
    pub install_dirs: Vec<PathBuf>,
    pub probe_timeout: Duration,
}

impl ResolverConfig {
    /// Builds the probe inputs for the current host.
    #[must_use]
    pub fn from_env() -> Self {
        let shim_platform = cfg!(windows);
        let (manager_root, install_dirs) = if shim_platform {
            (pyenv_root_from_env(), install_dirs_from_env())
        } else {
            (None, Vec::new())
        };

        Self {
            program: DEFAULT_PROGRAM.to_string(),
            native_program: DEFAULT_NATIVE_PROGRAM.to_string(),
            scripts_dir: DEFAULT_SCRIPTS_DIR.to_string(),
            explicit_path: None,
            shim_platform,
            manager_root,
            install_dirs,
            probe_timeout: NATIVE_PROBE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_explicit_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_path = path;
        self
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Lazily resolves and memoizes the executable.
///
/// The first call to [`ExecutableResolver::resolve`] runs the probe chain;
/// concurrent first callers wait on the same initialization and every later
/// call returns the cached value. There is no re-resolution on failure.
#[derive(Debug)]
pub struct ExecutableResolver {
    config: ResolverConfig,
    resolved: OnceCell<ResolvedExecutable>,
}

impl ExecutableResolver {
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            resolved: OnceCell::new(),
        }
    }

    /// Returns the cached executable, resolving it on first use.
    pub async fn resolve(&self) -> &ResolvedExecutable {
        self.resolved
            .get_or_init(|| resolve_uncached(&self.config))
            .await
    }

    /// Returns the cached executable without triggering resolution.
    #[must_use]
    pub fn resolved(&self) -> Option<&ResolvedExecutable> {
        self.resolved.get()
    }
}

async fn resolve_uncached(config: &ResolverConfig) -> ResolvedExecutable {
    if let Some(path) = &config.explicit_path {
        debug!(path = %path.display(), "using configured ia executable");
        return ResolvedExecutable::direct(path.as_os_str());
    }

    if !config.shim_platform {
        return ResolvedExecutable::direct(&config.program);
    }

    if native_responds(&config.native_program, config.probe_timeout).await {
        debug!(program = %config.native_program, "native ia executable found on PATH");
        return ResolvedExecutable::direct(&config.native_program);
    }

    if let Some(root) = &config.manager_root {
        if let Some(found) = pinned_version_executable(root, config).await {
            debug!(path = %found.display(), "ia found in pinned pyenv version");
            return ResolvedExecutable::direct(found);
        }
        if let Some(found) = any_version_executable(root, config).await {
            debug!(path = %found.display(), "ia found in installed pyenv version");
            return ResolvedExecutable::direct(found);
        }
    }

    if let Some(found) = install_dir_executable(config).await {
        debug!(path = %found.display(), "ia found in conventional install directory");
        return ResolvedExecutable::direct(found);
    }

    warn!(
        program = %config.program,
        "no native ia executable found; falling back to shell invocation. \
         Argument safety now depends on input validation alone"
    );
    ResolvedExecutable::shell(&config.program)
}

async fn native_responds(program: &str, probe_timeout: Duration) -> bool {
    let mut command = Command::new(program);
    command
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    let Ok(mut child) = command.spawn() else {
        return false;
    };
    matches!(
        tokio::time::timeout(probe_timeout, child.wait()).await,
        Ok(Ok(status)) if status.success()
    )
}

async fn pinned_version_executable(root: &Path, config: &ResolverConfig) -> Option<PathBuf> {
    let pin = tokio::fs::read_to_string(root.join(PIN_FILE)).await.ok()?;
    let pin = pin.lines().map(str::trim).find(|line| !line.is_empty())?;
    version_dirs(root)
        .await
        .into_iter()
        .filter(|dir| {
            dir.file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with(pin))
        })
        .map(|dir| scripts_executable(&dir, config))
        .find(|candidate| candidate.is_file())
}

async fn any_version_executable(root: &Path, config: &ResolverConfig) -> Option<PathBuf> {
    version_dirs(root)
        .await
        .into_iter()
        .map(|dir| scripts_executable(&dir, config))
        .find(|candidate| candidate.is_file())
}

async fn install_dir_executable(config: &ResolverConfig) -> Option<PathBuf> {
    for base in &config.install_dirs {
        let direct = scripts_executable(base, config);
        if direct.is_file() {
            return Some(direct);
        }
        for sub in subdirectories(base).await {
            let candidate = scripts_executable(&sub, config);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Installed versions, newest name first.
async fn version_dirs(root: &Path) -> Vec<PathBuf> {
    let mut dirs = subdirectories(&root.join(VERSIONS_DIR)).await;
    dirs.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    dirs
}

async fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return found;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.file_type().await.is_ok_and(|kind| kind.is_dir()) {
            found.push(entry.path());
        }
    }
    found.sort();
    found
}

fn scripts_executable(dir: &Path, config: &ResolverConfig) -> PathBuf {
    dir.join(&config.scripts_dir).join(&config.native_program)
}

fn pyenv_root_from_env() -> Option<PathBuf> {
    PYENV_ROOT_VARS
        .iter()
        .filter_map(env::var_os)
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            env::var_os("USERPROFILE")
                .map(|home| PathBuf::from(home).join(".pyenv").join("pyenv-win"))
        })
}

fn install_dirs_from_env() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(local) = env::var_os("LOCALAPPDATA") {
        dirs.push(PathBuf::from(local).join("Programs").join("Python"));
    }
    if let Some(roaming) = env::var_os("APPDATA") {
        dirs.push(PathBuf::from(roaming).join("Python"));
    }
    if let Some(home) = env::var_os("USERPROFILE") {
        dirs.push(
            PathBuf::from(home)
                .join("AppData")
                .join("Local")
                .join("Programs")
                .join("Python"),
        );
    }
    dirs.push(PathBuf::from(r"C:\Python"));
    dirs.push(PathBuf::from(r"C:\Program Files\Python"));
    dirs
}

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

mod archive;
mod check;
mod download;
mod task;

pub use crate::archive::{Archive, ArchiveFormat};
pub use crate::check::ToolchainCheck;
pub use crate::download::DownloadManager;
pub use crate::task::TaskRunner;

/// Name of the directory tools are installed into, relative to the root.
pub const TOOLS_DIR: &str = "tools";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Toolchain {
    url: String,
    dir: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new(Self::EE_GCC_URL, Self::EE_GCC_DIR)
    }
}

impl Toolchain {
    const EE_GCC_DIR: &'static str = "ee-gcc2.95.2-274";
    const EE_GCC_URL: &'static str =
        "https://github.com/decompme/compilers/releases/download/compilers/ee-gcc2.95.2-274.tar.xz";

    pub fn new(url: impl Into<String>, dir: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            dir: dir.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Top level directory inside the archive that gets installed.
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// File name the archive is stored under, the last segment of the url
    /// without query or fragment.
    pub fn archive_name(&self) -> Result<&str> {
        let path = self.url.split(['?', '#']).next().unwrap_or_default();
        let name = path.rsplit('/').next().unwrap_or_default();
        anyhow::ensure!(!name.is_empty(), "url {} has no file name", self.url);
        Ok(name)
    }
}

#[derive(Parser, Debug, Default)]
#[clap(author, version, about, long_about = None)]
pub struct SetupArgs {
    /// Directory containing `tools/`. Defaults to the parent of the
    /// directory this tool was built from, fixed at build time. Set it
    /// when running an installed binary.
    #[clap(long)]
    pub root: Option<PathBuf>,
    /// Directory the archive is downloaded into. Defaults to the
    /// system temp dir.
    #[clap(long)]
    pub scratch_dir: Option<PathBuf>,
    /// Url of the toolchain archive
    #[clap(long)]
    pub url: Option<String>,
    /// Directory inside the archive to install
    #[clap(long)]
    pub dir: Option<String>,
    /// Use verbose output
    #[clap(long, short)]
    pub verbose: bool,
}

#[derive(Clone, Debug)]
pub struct SetupEnv {
    root: PathBuf,
    scratch_dir: PathBuf,
    toolchain: Toolchain,
    verbose: bool,
}

impl SetupEnv {
    pub fn new(args: SetupArgs) -> Result<Self> {
        let root = resolve_root(args.root.as_deref())?;
        let scratch_dir = args.scratch_dir.unwrap_or_else(std::env::temp_dir);
        let default = Toolchain::default();
        let toolchain = Toolchain::new(
            args.url.unwrap_or_else(|| default.url().into()),
            args.dir.unwrap_or_else(|| default.dir().into()),
        );
        tracing::debug!(root = %root.display(), scratch = %scratch_dir.display(), "resolved setup env");
        Ok(Self {
            root,
            scratch_dir,
            toolchain,
            verbose: args.verbose,
        })
    }

    pub fn tools_dir(&self) -> PathBuf {
        self.root.join(TOOLS_DIR)
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Where the toolchain directory ends up once installed.
    pub fn toolchain_dir(&self) -> PathBuf {
        self.tools_dir().join(self.toolchain.dir())
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// Resolves the installation root. Without an override this is the parent of
/// the directory the tool was built from.
pub fn resolve_root(root: Option<&Path>) -> Result<PathBuf> {
    let root = if let Some(root) = root {
        root.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .context("tool directory has no parent")?
            .to_path_buf()
    };
    dunce::canonicalize(&root)
        .with_context(|| format!("failed to resolve installation root {}", root.display()))
}

/// Runs the whole setup: download, install, cleanup, check. Stops at the
/// first failing step.
pub fn setup(env: &SetupEnv) -> Result<()> {
    let toolchain = env.toolchain();
    let tools_dir = env.tools_dir();
    let mut runner = TaskRunner::new(4, env.verbose());

    let archive = runner.run_task(&format!("Downloading {}", toolchain.url()), true, || {
        DownloadManager::new()?.fetch(toolchain, env.scratch_dir())
    })?;

    let descr = format!(
        "Extracting {} into {}",
        toolchain.dir(),
        tools_dir.display()
    );
    runner.run_task(&descr, false, || archive.install(toolchain.dir(), &tools_dir))?;

    let descr = format!("Removing {}", archive.path().display());
    runner.run_task(&descr, false, || archive.remove())?;

    let check = runner.run_task("Checking toolchain", false, || {
        ToolchainCheck::new(&env.toolchain_dir())
    })?;
    print!("{}", check);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_name() {
        let toolchain = Toolchain::default();
        assert_eq!(toolchain.archive_name().unwrap(), "ee-gcc2.95.2-274.tar.xz");
        let toolchain = Toolchain::new("http://host/a/b.tar.gz?token=1#frag", "b");
        assert_eq!(toolchain.archive_name().unwrap(), "b.tar.gz");
        assert!(Toolchain::new("http://host/dir/", "dir").archive_name().is_err());
    }

    #[test]
    fn test_default_root_is_parent_of_crate() {
        let root = resolve_root(None).unwrap();
        let krate = dunce::canonicalize(env!("CARGO_MANIFEST_DIR")).unwrap();
        assert_eq!(krate.parent().unwrap(), root);
    }

    #[test]
    fn test_root_help_mentions_build_time() {
        use clap::CommandFactory;
        let command = SetupArgs::command();
        let root = command
            .get_arguments()
            .find(|arg| arg.get_id() == "root")
            .unwrap();
        let help = root.get_long_help().or(root.get_help()).unwrap().to_string();
        assert!(help.contains("fixed at build time"));
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(resolve_root(Some(&missing)).is_err());
    }

    #[test]
    fn test_env_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let env = SetupEnv::new(SetupArgs {
            root: Some(dir.path().into()),
            ..Default::default()
        })
        .unwrap();
        let root = dunce::canonicalize(dir.path()).unwrap();
        assert_eq!(env.tools_dir(), root.join("tools"));
        assert_eq!(env.toolchain_dir(), root.join("tools").join("ee-gcc2.95.2-274"));
        assert_eq!(env.scratch_dir(), std::env::temp_dir());
        assert_eq!(env.toolchain(), &Toolchain::default());
    }
}

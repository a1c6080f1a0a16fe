use anyhow::Result;
use std::path::{Path, PathBuf};

const COMPILER: &str = "ee-gcc.exe";

/// Result of inspecting an installed toolchain directory.
#[derive(Debug)]
pub struct ToolchainCheck {
    dir: PathBuf,
    compiler: Option<PathBuf>,
    wine: Option<Result<PathBuf>>,
}

impl ToolchainCheck {
    /// Fails if `dir` is missing, or if it has a `bin` directory without the
    /// compiler driver in it.
    pub fn new(dir: &Path) -> Result<Self> {
        anyhow::ensure!(dir.is_dir(), "toolchain not installed at {}", dir.display());
        let bin = dir.join("bin");
        let compiler = if bin.is_dir() {
            let compiler = bin.join(COMPILER);
            anyhow::ensure!(
                compiler.is_file(),
                "compiler driver missing at {}",
                compiler.display()
            );
            Some(compiler)
        } else {
            None
        };
        // the driver is a windows executable, linux runs it through wine
        let wine = if compiler.is_some() && cfg!(target_os = "linux") {
            let wine = which::which("wine").map_err(anyhow::Error::from);
            if wine.is_err() {
                tracing::warn!("wine not found, {} can't be run", COMPILER);
            }
            Some(wine)
        } else {
            None
        };
        Ok(Self {
            dir: dir.to_path_buf(),
            compiler,
            wine,
        })
    }

    /// Command line prefix that invokes the compiler on this host.
    pub fn compiler_command(&self) -> Option<String> {
        let compiler = self.compiler.as_ref()?;
        Some(if self.wine.is_some() {
            format!("wine {}", compiler.display())
        } else {
            compiler.display().to_string()
        })
    }
}

impl std::fmt::Display for ToolchainCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "{:20} {}", "toolchain", self.dir.display())?;
        if let Some(command) = self.compiler_command() {
            writeln!(f, "{:20} {}", "compiler", command)?;
        }
        match &self.wine {
            Some(Ok(path)) => writeln!(f, "{:20} {}", "wine", path.display())?,
            Some(Err(_)) => writeln!(f, "{:20} not found", "wine")?,
            None => {}
        }
        Ok(())
    }
}

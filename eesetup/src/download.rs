use crate::{Archive, Toolchain};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use reqwest::blocking::Client;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub struct DownloadManager {
    client: Client,
}

impl DownloadManager {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("eesetup/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Downloads `url` to `dest`. Nothing is verified beyond the http status.
    pub fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let pb = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stdout())
        .with_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {prefix:.bold} [{elapsed}] {wide_bar:.green} {bytes}/{total_bytes} {msg}")?
                .progress_chars("█▇▆▅▄▃▂▁  ")
        );
        let file_name = dest
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        pb.set_prefix(file_name);
        pb.set_message("📥 downloading");

        tracing::debug!(%url, dest = %dest.display(), "downloading");
        let mut resp = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("GET {} failed", url))?;
        anyhow::ensure!(
            resp.status().is_success(),
            "GET {} returned status code {}",
            url,
            resp.status()
        );
        let len = resp.content_length().unwrap_or_default();
        pb.set_length(len);

        let file = File::create(dest)
            .with_context(|| format!("failed to create {}", dest.display()))?;
        let dest = BufWriter::new(file);
        std::io::copy(&mut resp, &mut pb.wrap_write(dest))?;
        pb.finish_with_message("📥 downloaded");

        Ok(())
    }

    /// Downloads the toolchain archive into `scratch_dir`, keeping the remote
    /// file name.
    pub fn fetch(&self, toolchain: &Toolchain, scratch_dir: &Path) -> Result<Archive> {
        std::fs::create_dir_all(scratch_dir)
            .with_context(|| format!("failed to create {}", scratch_dir.display()))?;
        let archive = Archive::new(scratch_dir.join(toolchain.archive_name()?))?;
        self.download(toolchain.url(), archive.path())?;
        tracing::info!(archive = %archive.path().display(), "downloaded toolchain");
        Ok(archive)
    }
}

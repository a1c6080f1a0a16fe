use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use liblzma::read::XzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use zstd::Decoder;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArchiveFormat {
    Tar,
    TarGz,
    TarXz,
    TarZst,
}

impl ArchiveFormat {
    pub fn from_file_name(name: &str) -> Result<Self> {
        const SUFFIXES: &[(&str, ArchiveFormat)] = &[
            (".tar", ArchiveFormat::Tar),
            (".tar.gz", ArchiveFormat::TarGz),
            (".tgz", ArchiveFormat::TarGz),
            (".tar.xz", ArchiveFormat::TarXz),
            (".txz", ArchiveFormat::TarXz),
            (".tar.zst", ArchiveFormat::TarZst),
            (".tzst", ArchiveFormat::TarZst),
        ];
        SUFFIXES
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix))
            .map(|(_, format)| *format)
            .with_context(|| format!("unsupported archive format {}", name))
    }
}

/// A downloaded archive. Consumed by [`Archive::remove`].
#[derive(Debug)]
pub struct Archive {
    path: PathBuf,
    format: ArchiveFormat,
}

impl Archive {
    pub fn new(path: PathBuf) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("invalid archive path {}", path.display()))?;
        let format = ArchiveFormat::from_file_name(name)?;
        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extracts the top level directory `dir` of the archive into `dest`,
    /// keeping the paths the entries have inside the archive. Everything
    /// outside of `dir` is skipped.
    pub fn install(&self, dir: &str, dest: &Path) -> Result<()> {
        let mut components = Path::new(dir).components();
        anyhow::ensure!(
            matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            ),
            "{} is not a plain directory name",
            dir
        );
        let file = File::open(&self.path)
            .with_context(|| format!("failed to open archive {}", self.path.display()))?;
        let reader = BufReader::new(file);
        // gzip members and xz streams may be concatenated
        let unpacked = match self.format {
            ArchiveFormat::Tar => unpack_dir(reader, dir, dest),
            ArchiveFormat::TarGz => unpack_dir(MultiGzDecoder::new(reader), dir, dest),
            ArchiveFormat::TarXz => unpack_dir(XzDecoder::new_multi_decoder(reader), dir, dest),
            ArchiveFormat::TarZst => Decoder::new(reader)
                .map_err(anyhow::Error::from)
                .and_then(|decoder| unpack_dir(decoder, dir, dest)),
        }
        .with_context(|| format!("failed to extract {}", self.path.display()))?;
        anyhow::ensure!(
            unpacked > 0,
            "archive {} contains no directory {}",
            self.path.display(),
            dir
        );
        tracing::info!(%dir, dest = %dest.display(), entries = unpacked, "installed");
        Ok(())
    }

    pub fn remove(self) -> Result<()> {
        std::fs::remove_file(&self.path)
            .with_context(|| format!("failed to remove {}", self.path.display()))
    }
}

fn unpack_dir<R: Read>(reader: R, dir: &str, dest: &Path) -> Result<usize> {
    let mut archive = tar::Archive::new(reader);
    let mut unpacked = 0;
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        if !is_in_dir(&path, dir) {
            continue;
        }
        if unpacked == 0 {
            std::fs::create_dir_all(dest)
                .with_context(|| format!("failed to create {}", dest.display()))?;
        }
        tracing::trace!(path = %path.display(), "unpacking");
        entry.unpack_in(dest)?;
        unpacked += 1;
    }
    Ok(unpacked)
}

fn is_in_dir(path: &Path, dir: &str) -> bool {
    path.components()
        .find(|component| *component != Component::CurDir)
        .map(|component| component.as_os_str() == dir)
        .unwrap_or_default()
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use atomic_write_file::AtomicWriteFile;
use log::debug;
use tempfile::TempDir;
use zip::{ZipWriter, write::SimpleFileOptions};

use super::{BoxRead, FileWrite, ReadWriter, Reader, dir::DirReadWriter, is_hidden};

/// Collects files in a temporary directory, and writes them into a ZIP
/// archive on [ReadWriter::close]. Any existing archive at the destination is
/// replaced.
///
/// The temporary directory is removed when this value is dropped, whether or
/// not the archive was written.
pub struct ZipReadWriter {
    dest_path: PathBuf,
    // Only held so that the directory lives until `close` or drop.
    #[allow(dead_code)]
    tempdir: TempDir,
    read_writer: DirReadWriter,
}

impl ZipReadWriter {
    pub fn new(path: &Path) -> Result<Self> {
        let tempdir = TempDir::new().context("creating temporary directory for ZIP output")?;
        let read_writer = DirReadWriter::new(tempdir.path());

        Ok(Self {
            dest_path: path.to_owned(),
            tempdir,
            read_writer,
        })
    }
}

impl<'a> Reader<'a> for ZipReadWriter {
    fn open_read(&self, path: &Path) -> Result<BoxRead<'a>> {
        self.read_writer.open_read(path)
    }

    fn iter_files(&self) -> Box<dyn Iterator<Item = Result<PathBuf>> + 'a> {
        self.read_writer.iter_files()
    }
}

impl<'a> ReadWriter<'a> for ZipReadWriter {
    fn open_write(&self, path: &Path) -> Result<FileWrite<'a>> {
        self.read_writer.open_write(path)
    }

    fn close(self: Box<ZipReadWriter>) -> Result<()> {
        let file = AtomicWriteFile::open(&self.dest_path)
            .with_context(|| format!("opening {:?} for writing", self.dest_path))?;
        let mut zip_writer = ZipWriter::new(file);

        let mut paths = self
            .read_writer
            .iter_files()
            .collect::<Result<Vec<PathBuf>>>()?;
        paths.sort();

        for path in paths {
            if is_hidden(&path) {
                debug!("Leaving hidden file {path:?} out of the archive.");
                continue;
            }
            let entry_name = normalise_path_slashes(&path)?;
            zip_writer.start_file(entry_name, SimpleFileOptions::default())?;
            let mut r = self.read_writer.open_read(&path)?;
            std::io::copy(&mut r, &mut zip_writer)?;
        }

        // Complete writing the new ZIP archive, and commit the atomic file it
        // was writing to.
        let file = zip_writer.finish()?;
        file.commit()?;

        Ok(())
    }
}

/// Normalise a [Path] to use forward slashes, for uniformity of ZIP file entry
/// names between platforms.
fn normalise_path_slashes(p: &Path) -> Result<String> {
    Ok(p.to_str()
        .ok_or_else(|| anyhow!("could not convert path {:?} to UTF-8 string", p))?
        .replace('\\', "/"))
}

use std::{
    fmt::Debug,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Result, anyhow};
use atomic_write_file::AtomicWriteFile;

use super::{
    BoxRead, FileWrite, FileWriteImpl, FilesIoError, ReadWriter, Reader, join_relative,
};

/// Reads and writes files under a directory on the filesystem.
#[derive(Debug)]
pub struct DirReadWriter {
    dir_path: PathBuf,
}

impl DirReadWriter {
    pub fn new<P>(dir_path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            dir_path: dir_path.into(),
        }
    }
}

impl<'a> Reader<'a> for DirReadWriter {
    fn open_read(&self, path: &Path) -> Result<BoxRead<'a>> {
        let full_path = join_relative(&self.dir_path, path)?;

        match File::open(full_path) {
            Ok(f) => Ok(Box::new(f)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(anyhow!(FilesIoError::NotFound))
            }
            Err(e) => Err(anyhow!(e)),
        }
    }

    fn iter_files(&self) -> Box<dyn Iterator<Item = Result<PathBuf>> + 'a> {
        let dir_path = self.dir_path.to_owned();
        Box::new(
            walkdir::WalkDir::new(&dir_path)
                .follow_links(false)
                .same_file_system(true)
                .into_iter()
                .filter_map(move |dir_entry| match dir_entry {
                    Err(e) => match e.io_error() {
                        // NotFound for dir_path implies no entries at all,
                        // which is not an error, just an empty reader.
                        Some(io_err)
                            if io_err.kind() == std::io::ErrorKind::NotFound
                                && e.path() == Some(&dir_path) =>
                        {
                            None
                        }
                        _ => Some(Err(anyhow!(e))),
                    },
                    Ok(dir_entry) if dir_entry.file_type().is_file() => {
                        match dir_entry.path().strip_prefix(&dir_path) {
                            Err(e) => Some(Err(anyhow!(e))),
                            Ok(rel_path) => Some(Ok(rel_path.to_owned())),
                        }
                    }
                    _ => None,
                }),
        )
    }
}

impl<'a> ReadWriter<'a> for DirReadWriter {
    fn open_write(&self, path: &Path) -> Result<FileWrite<'a>> {
        let full_path = join_relative(&self.dir_path, path)?;

        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = AtomicWriteFile::open(&full_path)?;
        Ok(FileWrite::new(DirFileWrite { full_path, file }))
    }

    fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// Pending write of a single file. The file appears at `full_path` only on
/// commit.
struct DirFileWrite {
    full_path: PathBuf,
    file: AtomicWriteFile,
}

impl Debug for DirFileWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirFileWrite")
            .field("full_path", &self.full_path)
            .finish()
    }
}

impl<'a> FileWriteImpl<'a> for DirFileWrite {
    fn commit(self: Box<Self>) -> Result<()> {
        self.file.commit()?;
        Ok(())
    }

    fn discard(self: Box<Self>) -> Result<()> {
        self.file.discard()?;
        Ok(())
    }
}

impl Write for DirFileWrite {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

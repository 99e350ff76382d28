use std::{
    collections::HashMap,
    fmt::Debug,
    io::{Cursor, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::{Result, anyhow};

use super::{
    BoxRead, FileWrite, FileWriteImpl, FilesIoError, ReadWriter, Reader, check_fully_relative,
};

type FileMap = HashMap<PathBuf, Arc<[u8]>>;

/// Shared storage for [MemReadWriter]s. Clones share the same files.
#[derive(Clone, Debug, Default)]
pub struct MemFilesHandle {
    file_map: Arc<Mutex<FileMap>>,
}

impl MemFilesHandle {
    fn lock(&self) -> Result<MutexGuard<'_, FileMap>> {
        self.file_map
            .lock()
            .map_err(|e| anyhow!("failed to lock file map: {}", e))
    }

    /// Returns the committed content of `path` as UTF-8 text.
    pub fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self.lock()?;
        let buf = files.get(path).ok_or(FilesIoError::NotFound)?;
        Ok(String::from_utf8(buf.to_vec())?)
    }
}

/// Keeps files in memory.
pub struct MemReadWriter {
    files: MemFilesHandle,
}

impl MemReadWriter {
    pub fn new(files: MemFilesHandle) -> Self {
        Self { files }
    }
}

impl<'a> Reader<'a> for MemReadWriter {
    fn open_read(&self, path: &Path) -> Result<BoxRead<'a>> {
        check_fully_relative(path)?;
        match self.files.lock()?.get(path) {
            None => Err(anyhow!(FilesIoError::NotFound)),
            Some(buf) => Ok(Box::new(Cursor::new(buf.clone()))),
        }
    }

    fn iter_files(&self) -> Box<dyn Iterator<Item = Result<PathBuf>> + 'a> {
        match self.files.lock() {
            Ok(files) => {
                let paths: Vec<_> = files.keys().cloned().map(Ok).collect();
                Box::new(paths.into_iter())
            }
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }
}

impl<'a> ReadWriter<'a> for MemReadWriter {
    fn open_write(&self, path: &Path) -> Result<FileWrite<'a>> {
        check_fully_relative(path)?;
        Ok(FileWrite::new(MemFileWrite {
            files: self.files.clone(),
            path: path.to_owned(),
            buf: Vec::new(),
        }))
    }

    fn close(self: Box<MemReadWriter>) -> Result<()> {
        Ok(())
    }
}

struct MemFileWrite {
    files: MemFilesHandle,
    path: PathBuf,
    buf: Vec<u8>,
}

impl Debug for MemFileWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemFileWrite")
            .field("path", &self.path)
            .finish()
    }
}

impl<'a> FileWriteImpl<'a> for MemFileWrite {
    fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        this.files.lock()?.insert(this.path, this.buf.into());
        Ok(())
    }

    fn discard(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

impl Write for MemFileWrite {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

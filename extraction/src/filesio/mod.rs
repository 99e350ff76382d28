//! Output file collections: a directory tree or a ZIP archive.

mod dir;
mod mem;
#[cfg(test)]
mod tests;
mod zip;

use std::{
    error::Error,
    ffi::OsStr,
    fmt::{Debug, Display},
    io::{Read, Write},
    path::{Component, Path, PathBuf},
};

use anyhow::{Result, anyhow};

pub use dir::DirReadWriter;
pub use mem::{MemFilesHandle, MemReadWriter};
pub use zip::ZipReadWriter;

pub type BoxRead<'a> = Box<dyn Read + 'a>;

/// A file being written into a collection. Its content only becomes visible
/// once committed.
pub trait FileWriteImpl<'a>: Debug + Write + 'a {
    fn commit(self: Box<Self>) -> Result<()>;
    fn discard(self: Box<Self>) -> Result<()>;
}

pub struct FileWrite<'a> {
    delegate: Box<dyn FileWriteImpl<'a>>,
}

impl<'a> FileWrite<'a> {
    fn new<T>(delegate: T) -> Self
    where
        T: FileWriteImpl<'a>,
    {
        Self {
            delegate: Box::new(delegate),
        }
    }

    /// Makes the written content visible in the collection.
    pub fn commit(self) -> Result<()> {
        self.delegate.commit()
    }

    /// Drops the written content, leaving the collection unchanged.
    pub fn discard(self) -> Result<()> {
        self.delegate.discard()
    }
}

impl Debug for FileWrite<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.delegate.fmt(f)
    }
}

impl Write for FileWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.delegate.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.delegate.flush()
    }
}

/// Concrete error type returned by `filesio` implementations for cases that
/// might reasonably be handled by callers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilesIoError {
    NonRelativePath(NonRelativePathType),
    NotFound,
}

impl Display for FilesIoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use FilesIoError::*;
        match self {
            NonRelativePath(t) => write!(
                f,
                "path is not relative because it contains a {} component",
                t
            ),
            NotFound => write!(f, "file not found"),
        }
    }
}

impl Error for FilesIoError {}

/// Type of path `Component` causing a path to be non-relative.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NonRelativePathType {
    Prefix,
    RootDir,
    ParentDir,
}

impl Display for NonRelativePathType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use NonRelativePathType::*;
        match self {
            Prefix => write!(f, "prefix"),
            RootDir => write!(f, "root directory"),
            ParentDir => write!(f, "parent directory"),
        }
    }
}

/// Read access to the files in a collection.
pub trait Reader<'a> {
    /// Opens a committed file for reading.
    fn open_read(&self, path: &Path) -> Result<BoxRead<'a>>;

    /// Iterates over all committed files. The order is undefined.
    fn iter_files(&self) -> Box<dyn Iterator<Item = Result<PathBuf>> + 'a>;
}

/// Read and write access to the files in a collection.
pub trait ReadWriter<'a>: Reader<'a> {
    /// Opens a file for writing. `path` must be strictly relative.
    fn open_write(&self, path: &Path) -> Result<FileWrite<'a>>;

    /// Completes all writing. For archives, this is when the archive itself
    /// is written.
    fn close(self: Box<Self>) -> Result<()>;
}

/// Kind of output collection.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum IoType {
    /// A directory tree of files.
    Dir,
    /// A single ZIP archive.
    Zip,
}

impl IoType {
    /// Returns `io_type` if given, otherwise guesses from `path`: an existing
    /// directory is [IoType::Dir], an existing file or a `.zip` suffix is
    /// [IoType::Zip], anything else is [IoType::Dir].
    pub fn resolve_auto(io_type: Option<IoType>, path: &Path) -> IoType {
        if let Some(io_type) = io_type {
            return io_type;
        }
        if path.is_dir() {
            IoType::Dir
        } else if path.is_file() {
            IoType::Zip
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
        {
            IoType::Zip
        } else {
            IoType::Dir
        }
    }

    /// Opens a [ReadWriter] of this type over `path`.
    pub fn new_read_writer(self, path: &Path) -> Result<Box<dyn ReadWriter<'static>>> {
        Ok(match self {
            IoType::Dir => Box::new(DirReadWriter::new(path)),
            IoType::Zip => Box::new(ZipReadWriter::new(path)?),
        })
    }
}

/// Returns an error if `path` is not strictly relative. That is, it has no
/// prefix, root or parent (`..`) component.
fn check_fully_relative(path: &Path) -> Result<()> {
    for component in path.components() {
        let non_relative = match component {
            Component::Prefix(_) => NonRelativePathType::Prefix,
            Component::RootDir => NonRelativePathType::RootDir,
            Component::ParentDir => NonRelativePathType::ParentDir,
            Component::CurDir | Component::Normal(_) => continue,
        };
        return Err(anyhow!(FilesIoError::NonRelativePath(non_relative)));
    }
    Ok(())
}

/// Returns `true` if any component of `path` is hidden (starts with `.`).
fn is_hidden(path: &Path) -> bool {
    path.components().any(|component| match component {
        Component::Normal(name) => name
            .to_str()
            .is_some_and(|name| name.starts_with('.')),
        _ => false,
    })
}

/// Joins `path` onto `dir` after checking it is strictly relative.
fn join_relative(dir: &Path, path: &Path) -> Result<PathBuf> {
    check_fully_relative(path)?;
    if path.as_os_str() == OsStr::new("") {
        return Err(anyhow!("empty output path"));
    }
    Ok(dir.join(path))
}

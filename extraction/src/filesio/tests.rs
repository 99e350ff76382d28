use std::{
    fmt::Debug,
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use anyhow::Result;
use googletest::{
    assert_that,
    matchers::{eq, err, ok, unordered_elements_are},
};
use tempfile::{TempDir, tempdir};
use test_casing::test_casing;
use testutils::anyhow_downcasts_to;
use zip::ZipArchive;

use super::{
    BoxRead, FilesIoError, IoType, MemFilesHandle, MemReadWriter, NonRelativePathType,
    ReadWriter, Reader, check_fully_relative, dir::DirReadWriter, is_hidden, zip::ZipReadWriter,
};

type BoxReadWriter = Box<dyn ReadWriter<'static>>;

/// Provides fresh read-writers over the same underlying storage.
trait IoTestEnvironment {
    fn make_read_writer(&self) -> BoxReadWriter;
}

struct DirTestEnvironment {
    temp_dir: TempDir,
}

impl IoTestEnvironment for DirTestEnvironment {
    fn make_read_writer(&self) -> BoxReadWriter {
        Box::new(DirReadWriter::new(self.temp_dir.path().join("dir")))
    }
}

struct MemTestEnvironment {
    handle: MemFilesHandle,
}

impl IoTestEnvironment for MemTestEnvironment {
    fn make_read_writer(&self) -> BoxReadWriter {
        Box::new(MemReadWriter::new(self.handle.clone()))
    }
}

struct ZipTestEnvironment {
    temp_dir: TempDir,
}

impl IoTestEnvironment for ZipTestEnvironment {
    fn make_read_writer(&self) -> BoxReadWriter {
        Box::new(
            ZipReadWriter::new(&self.temp_dir.path().join("archive.zip"))
                .expect("ZipReadWriter::new should not fail"),
        )
    }
}

struct IoTestType {
    name: &'static str,
    new: &'static dyn Fn() -> Result<Box<dyn IoTestEnvironment>>,
}

impl IoTestType {
    fn new_env(&self) -> Box<dyn IoTestEnvironment> {
        (self.new)().expect("should not fail")
    }
}

impl Debug for IoTestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn new_dir_env() -> Result<Box<dyn IoTestEnvironment>> {
    Ok(Box::new(DirTestEnvironment {
        temp_dir: tempdir()?,
    }))
}

fn new_mem_env() -> Result<Box<dyn IoTestEnvironment>> {
    Ok(Box::new(MemTestEnvironment {
        handle: MemFilesHandle::default(),
    }))
}

fn new_zip_env() -> Result<Box<dyn IoTestEnvironment>> {
    Ok(Box::new(ZipTestEnvironment {
        temp_dir: tempdir()?,
    }))
}

const IO_TYPES: &[IoTestType] = &[
    IoTestType {
        name: "Dir",
        new: &new_dir_env,
    },
    IoTestType {
        name: "Mem",
        new: &new_mem_env,
    },
    IoTestType {
        name: "Zip",
        new: &new_zip_env,
    },
];

#[test_casing(3, IO_TYPES)]
fn empty_read_writer_has_no_files(io_type: &IoTestType) {
    let read_writer = io_type.new_env().make_read_writer();
    assert_that!(iter_files(read_writer.as_ref()), unordered_elements_are![]);
}

#[test_casing(3, IO_TYPES)]
fn open_read_missing_file_returns_not_found_err(io_type: &IoTestType) {
    let read_writer = io_type.new_env().make_read_writer();
    assert_that!(
        read_writer.open_read(Path::new("not-exist")).map(|_| ()),
        err(anyhow_downcasts_to::<FilesIoError, _>(eq(
            FilesIoError::NotFound
        ))),
    );
}

#[test_casing(3, IO_TYPES)]
fn read_writer_reads_committed_files(io_type: &IoTestType) {
    let test_io = io_type.new_env();
    let read_writer = test_io.make_read_writer();
    let files: Vec<(&Path, &[u8])> = vec![
        (Path::new("file.csv"), b"file contents"),
        (Path::new("subdir/other.csv"), b"other contents"),
    ];

    for (path, contents) in &files {
        let mut w = read_writer.open_write(path).expect("should open");
        w.write_all(contents).expect("should write");
        w.commit().expect("should commit");
    }

    for (path, contents) in &files {
        let mut r = read_writer.open_read(path).expect("should open");
        assert_that!(read_vec(&mut r), ok(eq(contents)));
    }
    assert_that!(
        iter_files(read_writer.as_ref()),
        unordered_elements_are![
            ok(eq(Path::new("file.csv"))),
            ok(eq(Path::new("subdir/other.csv"))),
        ]
    );

    read_writer.close().expect("should close");
}

#[test_casing(3, IO_TYPES)]
fn discarded_files_do_not_exist(io_type: &IoTestType) {
    let test_io = io_type.new_env();
    let read_writer = test_io.make_read_writer();
    let discarded = Path::new("subdir/discarded.csv");
    let committed = Path::new("committed.csv");

    let mut w = read_writer.open_write(discarded).expect("should open");
    w.write_all(b"ignored content").expect("should write");
    w.discard().expect("should discard");
    let w = read_writer.open_write(committed).expect("should open");
    w.commit().expect("should commit");

    assert_that!(
        read_writer.open_read(discarded).map(|_| ()),
        err(anyhow_downcasts_to::<FilesIoError, _>(eq(
            FilesIoError::NotFound
        ))),
    );
    assert_that!(
        iter_files(read_writer.as_ref()),
        unordered_elements_are![ok(eq(committed))]
    );

    read_writer.close().expect("should close");
}

#[test_casing(3, IO_TYPES)]
fn open_write_rejects_non_relative_path(io_type: &IoTestType) {
    let read_writer = io_type.new_env().make_read_writer();
    assert_that!(
        read_writer.open_write(Path::new("../escape.csv")),
        err(anyhow_downcasts_to::<FilesIoError, _>(eq(
            FilesIoError::NonRelativePath(NonRelativePathType::ParentDir)
        ))),
    );
}

#[test]
fn zip_close_writes_archive_without_hidden_files() -> Result<()> {
    let temp_dir = tempdir()?;
    let zip_path = temp_dir.path().join("out.zip");

    let read_writer: BoxReadWriter = Box::new(ZipReadWriter::new(&zip_path)?);
    for path in ["a.csv", "nested/b.csv", ".hidden.csv", ".git/config"] {
        let mut w = read_writer.open_write(Path::new(path))?;
        w.write_all(path.as_bytes())?;
        w.commit()?;
    }
    read_writer.close()?;

    let mut archive = ZipArchive::new(File::open(&zip_path)?)?;
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    assert_that!(
        names,
        unordered_elements_are![eq("a.csv"), eq("nested/b.csv")]
    );

    let mut content = String::new();
    archive.by_name("nested/b.csv")?.read_to_string(&mut content)?;
    assert_that!(content, eq("nested/b.csv"));
    Ok(())
}

#[test]
fn zip_dropped_without_close_writes_nothing() -> Result<()> {
    let temp_dir = tempdir()?;
    let zip_path = temp_dir.path().join("out.zip");

    {
        let read_writer = ZipReadWriter::new(&zip_path)?;
        let mut w = read_writer.open_write(Path::new("a.csv"))?;
        w.write_all(b"content")?;
        w.commit()?;
    }

    assert_that!(zip_path.exists(), eq(false));
    Ok(())
}

#[test]
fn dir_commit_writes_file_under_root() -> Result<()> {
    let temp_dir = tempdir()?;
    let read_writer = DirReadWriter::new(temp_dir.path());

    let mut w = read_writer.open_write(Path::new("deep/er/out.csv"))?;
    w.write_all(b"a,b")?;
    assert_that!(temp_dir.path().join("deep/er/out.csv").exists(), eq(false));
    w.commit()?;

    assert_that!(
        std::fs::read_to_string(temp_dir.path().join("deep/er/out.csv"))?,
        eq("a,b")
    );
    Ok(())
}

const VALID_RELATIVE_PATHS: &[&str] = &[r#"foo"#, r#"foo/bar"#, r#"./foo"#];

#[test_casing(3, VALID_RELATIVE_PATHS)]
fn test_is_fully_relative(path: &str) {
    assert_that!(check_fully_relative(Path::new(path)), ok(eq(&())));
}

const INVALID_RELATIVE_PATHS: &[(&str, FilesIoError)] = &[
    (
        r#"/foo"#,
        FilesIoError::NonRelativePath(NonRelativePathType::RootDir),
    ),
    (
        r#"../foo"#,
        FilesIoError::NonRelativePath(NonRelativePathType::ParentDir),
    ),
    (
        r#"foo/../bar"#,
        FilesIoError::NonRelativePath(NonRelativePathType::ParentDir),
    ),
];

#[test_casing(3, INVALID_RELATIVE_PATHS)]
fn test_invalid_relative_path(path: &str, expect_error: &FilesIoError) {
    assert_that!(
        check_fully_relative(Path::new(path)),
        err(anyhow_downcasts_to::<FilesIoError, _>(eq(*expect_error))),
    );
}

#[test]
fn hidden_paths() {
    assert_that!(is_hidden(Path::new(".a.csv")), eq(true));
    assert_that!(is_hidden(Path::new("dir/.git/x")), eq(true));
    assert_that!(is_hidden(Path::new("dir/a.csv")), eq(false));
    assert_that!(is_hidden(Path::new("./a.csv")), eq(false));
}

#[test]
fn io_type_resolves_from_path() -> Result<()> {
    let temp_dir = tempdir()?;
    let existing_file = temp_dir.path().join("existing");
    File::create(&existing_file)?;

    assert_that!(
        IoType::resolve_auto(Some(IoType::Zip), temp_dir.path()),
        eq(IoType::Zip)
    );
    assert_that!(IoType::resolve_auto(None, temp_dir.path()), eq(IoType::Dir));
    assert_that!(IoType::resolve_auto(None, &existing_file), eq(IoType::Zip));
    assert_that!(
        IoType::resolve_auto(None, &temp_dir.path().join("new.ZIP")),
        eq(IoType::Zip)
    );
    assert_that!(
        IoType::resolve_auto(None, &temp_dir.path().join("new")),
        eq(IoType::Dir)
    );
    Ok(())
}

// Utility code for tests:

fn read_vec(r: &mut BoxRead) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    r.read_to_end(&mut buf)?;
    Ok(buf)
}

fn iter_files(reader: &dyn ReadWriter<'static>) -> Vec<Result<PathBuf>> {
    reader.iter_files().collect()
}

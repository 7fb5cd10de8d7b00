//! Re-openable mesh sources.
//!
//! The loader reads its input twice, so it takes something it can open per pass
//! rather than a single-use reader.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Cursor},
    path::{Path, PathBuf},
};

/// A mesh input that can be opened any number of times, each time from the start.
pub trait MeshSource {
    /// Human-readable name used in errors and logs.
    fn name(&self) -> String;

    /// Open a fresh reader positioned at the first byte.
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>>;
}

impl MeshSource for str {
    fn name(&self) -> String {
        "<memory>".to_string()
    }

    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        Ok(Box::new(Cursor::new(self.as_bytes())))
    }
}

impl MeshSource for String {
    fn name(&self) -> String {
        self.as_str().name()
    }

    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        self.as_str().open()
    }
}

impl MeshSource for [u8] {
    fn name(&self) -> String {
        "<memory>".to_string()
    }

    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        Ok(Box::new(Cursor::new(self)))
    }
}

impl MeshSource for Vec<u8> {
    fn name(&self) -> String {
        self.as_slice().name()
    }

    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        self.as_slice().open()
    }
}

impl<T: MeshSource + ?Sized> MeshSource for &T {
    fn name(&self) -> String {
        (**self).name()
    }

    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        (**self).open()
    }
}

/// An OBJ file on disk, opened once per pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MeshSource for FileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        let file = File::open(&self.path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(source: &dyn MeshSource) -> String {
        let mut out = String::new();
        let mut reader = source.open().expect("open");
        io::Read::read_to_string(&mut reader, &mut out).expect("read");
        out
    }

    #[test]
    fn memory_sources_reopen_from_start() {
        let text = "v 1 2 3\n";
        assert_eq!(read_all(&text), text);
        assert_eq!(read_all(&text), text);

        let bytes = text.as_bytes().to_vec();
        assert_eq!(read_all(&bytes), text);
        assert_eq!(bytes.name(), "<memory>");
    }

    #[test]
    fn missing_file_fails_to_open() {
        let source = FileSource::new("/definitely/not/here/vessel.obj");
        assert!(source.open().is_err());
        assert!(source.name().ends_with("vessel.obj"));
    }
}

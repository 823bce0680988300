use std::ffi::OsString;
use std::fs::File;
use std::io;
use std::io::{BufRead, BufReader, BufWriter, IoSlice, IoSliceMut, Read, Write};
use std::path::{Path, PathBuf};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use crate::enums::Compression;

const GZIP_EXTENSION: &str = "gz";

/// Appends `.gz` to `path`
pub(crate) fn compressed_path(path: impl AsRef<Path>) -> PathBuf {
    let mut name = OsString::from(path.as_ref().as_os_str());
    name.push(".");
    name.push(GZIP_EXTENSION);
    PathBuf::from(name)
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case(GZIP_EXTENSION))
}

/// A line reader over a plain or a gzip compressed file.
pub enum ArtifactReader {
    Plain(BufReader<File>),
    Gzip(BufReader<GzDecoder<File>>),
}

impl ArtifactReader {
    /// Opens `path` as it is, the compression is guessed from the extension.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::options().read(true).open(path)?;
        if is_gzip(path) {
            Ok(Self::Gzip(BufReader::new(GzDecoder::new(file))))
        } else {
            Ok(Self::Plain(BufReader::new(file)))
        }
    }

    /// Opens `path`, falls back to the compressed variant `path.gz`.
    /// Returns [None] if neither exists.
    pub fn open_artifact(path: impl AsRef<Path>) -> io::Result<Option<(Self, PathBuf)>> {
        let path = path.as_ref();
        if path.exists() {
            return Ok(Some((Self::open(path)?, path.to_path_buf())))
        }
        let compressed = compressed_path(path);
        if compressed.exists() {
            return Ok(Some((Self::open(&compressed)?, compressed)))
        }
        Ok(None)
    }
}

impl Read for ArtifactReader {
    delegate::delegate! {
        to match self {
            ArtifactReader::Plain(a) => a,
            ArtifactReader::Gzip(b) => b,
        } {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
            fn read_vectored(&mut self, bufs: &mut [IoSliceMut<'_>]) -> io::Result<usize>;
            fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize>;
            fn read_to_string(&mut self, buf: &mut String) -> io::Result<usize>;
            fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;
        }
    }
}

impl BufRead for ArtifactReader {
    delegate::delegate! {
        to match self {
            ArtifactReader::Plain(a) => a,
            ArtifactReader::Gzip(b) => b,
        } {
            fn fill_buf(&mut self) -> io::Result<&[u8]>;
            fn consume(&mut self, amt: usize);
        }
    }
}

/// A writer to a plain or a gzip compressed file.
/// Has to be [finished](ArtifactWriter::finish), otherwise the gzip trailer may be lost.
pub enum ArtifactWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl ArtifactWriter {
    /// Creates the file for `path`. When compressing `.gz` is appended to the path.
    pub fn create(path: impl AsRef<Path>, compression: Compression) -> io::Result<(Self, PathBuf)> {
        let path = match compression {
            Compression::None => path.as_ref().to_path_buf(),
            Compression::Gzip => compressed_path(path),
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = BufWriter::new(File::options().create(true).write(true).truncate(true).open(&path)?);
        let writer = match compression {
            Compression::None => Self::Plain(file),
            Compression::Gzip => Self::Gzip(GzEncoder::new(file, flate2::Compression::default())),
        };
        Ok((writer, path))
    }

    pub fn finish(self) -> io::Result<()> {
        match self {
            ArtifactWriter::Plain(mut outp) => {
                outp.flush()
            }
            ArtifactWriter::Gzip(outp) => {
                outp.finish()?.flush()
            }
        }
    }
}

impl Write for ArtifactWriter {
    delegate::delegate! {
        to match self {
            ArtifactWriter::Plain(a) => a,
            ArtifactWriter::Gzip(b) => b,
        } {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
            fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize>;
            fn flush(&mut self) -> io::Result<()>;
            fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;
            fn write_fmt(&mut self, fmt: std::fmt::Arguments<'_>) -> io::Result<()>;
        }
    }
}

// Source reader for raw PCM files
// Bounded reads at arbitrary byte offsets of a seekable stream

use std::fs::File;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

#[derive(Debug)]
pub struct SourceReader<R> {
    inner: R,
    len: u64,
}

impl SourceReader<File> {
    /// Open a file and measure its length
    ///
    /// Unbuffered: every read seeks first, so a buffer would only over-read.
    pub fn open(path: &Path) -> io::Result<Self> {
        Self::from_reader(File::open(path)?)
    }
}

impl<R: Read + Seek> SourceReader<R> {
    /// Wrap any seekable stream; its length is taken by seeking to the end
    pub fn from_reader(mut inner: R) -> io::Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self { inner, len })
    }

    /// Total bytes in the source
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read up to `buf.len()` bytes starting at `offset`
    ///
    /// Returns the number of bytes actually read. Fewer than requested only
    /// happens at the end of the stream, which is not an error.
    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

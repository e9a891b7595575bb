//! Read a bounded prefix of a stream once, then replay it ahead of the rest.
//!
//! [`ReplayReader`] hands out a capped [`ScanView`] that records everything it
//! yields. Once scanning is done, the source turns into a reader that yields the
//! recorded bytes followed by whatever the underlying reader still has, so a
//! decoder sees the stream from its starting position no matter how far the scan got.
//! [`Replay`] does this for plain readers, [`SeekableReplay`] for decoders that need to seek.

use std::io::{self, BufRead, Read, Seek, SeekFrom};

/// How much [`SeekableReplay`] pulls from the underlying reader at a time
const CHUNK: usize = 8 * 1024;

/// Records a capped prefix of `inner` so that it can be read again later.
pub struct ReplayReader<R> {
    inner: R,
    recorded: Vec<u8>,
    limit: u64,
}

impl<R: Read> ReplayReader<R> {
    /// `limit` caps the total number of bytes all scan views may read,
    /// and therefore the size of the recording buffer.
    pub fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            recorded: Vec::new(),
            limit,
        }
    }

    /// Returns a reader over the not-yet-recorded part of the stream.
    ///
    /// Views share the cap: a second view continues where the first one stopped.
    pub fn scan_view(&mut self) -> ScanView<'_, R> {
        ScanView { source: self }
    }

    /// Bytes read through scan views so far.
    pub fn recorded(&self) -> &[u8] {
        &self.recorded
    }

    /// Ends scanning; the returned reader starts over from the first recorded byte.
    pub fn into_replay(self) -> Replay<R> {
        Replay {
            recorded: self.recorded,
            pos: 0,
            inner: self.inner,
        }
    }

    /// Like [`into_replay`](Self::into_replay), but seekable.
    ///
    /// At most `max_len` bytes of the whole stream, recorded prefix included, are ever buffered;
    /// reading or seeking past that fails with [`io::ErrorKind::OutOfMemory`].
    pub fn into_seekable(self, max_len: u64) -> SeekableReplay<R> {
        SeekableReplay {
            buf: self.recorded,
            pos: 0,
            inner: self.inner,
            exhausted: false,
            max_len,
        }
    }

    fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.recorded.len() as u64)
    }
}

/// Capped, recording view over a [`ReplayReader`]. Reports end of stream once the cap is hit.
pub struct ScanView<'a, R> {
    source: &'a mut ReplayReader<R>,
}

impl<R: Read> Read for ScanView<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let max = self.source.remaining().min(buf.len() as u64) as usize;
        if max == 0 {
            return Ok(0);
        }
        let n = self.source.inner.read(&mut buf[..max])?;
        self.source.recorded.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

/// Yields the recorded prefix, then the remainder of the underlying reader.
pub struct Replay<R> {
    recorded: Vec<u8>,
    pos: usize,
    inner: R,
}

impl<R: Read> Read for Replay<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pending = &self.recorded[self.pos..];
        if pending.is_empty() {
            return self.inner.read(buf);
        }
        let n = pending.len().min(buf.len());
        buf[..n].copy_from_slice(&pending[..n]);
        self.pos += n;
        Ok(n)
    }
}

/// Seekable view of the whole stream, recorded prefix first.
///
/// The rest of the stream is pulled in only as reads and seeks reach it,
/// so a decoder that stops after the header leaves the remainder unread.
/// Pulled bytes stay buffered to allow seeking back.
pub struct SeekableReplay<R> {
    buf: Vec<u8>,
    pos: u64,
    inner: R,
    exhausted: bool,
    max_len: u64,
}

impl<R: Read> SeekableReplay<R> {
    /// Bytes taken from the stream so far, recorded prefix included.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Appends the next chunk of the stream. Returns `false` at the end of it.
    fn pull(&mut self) -> io::Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        // asking for one byte past the limit tells a stream that ends right at it from a longer one
        let room = self.max_len.saturating_sub(self.buf.len() as u64);
        let want = room.clamp(1, CHUNK as u64) as usize;

        let start = self.buf.len();
        self.buf.resize(start + want, 0);
        let read = loop {
            match self.inner.read(&mut self.buf[start..]) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => break other,
            }
        };
        let n = match read {
            Ok(n) => n,
            Err(e) => {
                self.buf.truncate(start);
                return Err(e);
            }
        };
        self.buf.truncate(start + n);

        if n == 0 {
            self.exhausted = true;
            return Ok(false);
        }
        if self.buf.len() as u64 > self.max_len {
            return Err(too_large());
        }
        Ok(true)
    }
}

fn too_large() -> io::Error {
    io::Error::new(
        io::ErrorKind::OutOfMemory,
        "input is larger than the allocation limit",
    )
}

impl<R: Read> BufRead for SeekableReplay<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        while self.pos >= self.buf.len() as u64 {
            if !self.pull()? {
                break;
            }
        }
        let start = self.pos.min(self.buf.len() as u64) as usize;
        Ok(&self.buf[start..])
    }

    fn consume(&mut self, amt: usize) {
        self.pos += amt as u64;
    }
}

impl<R: Read> Read for SeekableReplay<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl<R: Read> Seek for SeekableReplay<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (base, offset) = match pos {
            SeekFrom::Start(n) => {
                self.pos = n;
                return Ok(n);
            }
            SeekFrom::Current(offset) => (self.pos, offset),
            SeekFrom::End(offset) => {
                while self.pull()? {}
                (self.buf.len() as u64, offset)
            }
        };
        match base.checked_add_signed(offset) {
            Some(n) => {
                self.pos = n;
                Ok(n)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}

//! Byte-bounded reader used to frame block payloads.

use std::io::{self, Read};

use crate::BufferError;

/// Scratch buffer size for [`LimitedReader::skip_remaining`]. Skipping never
/// allocates in proportion to the region size.
const SKIP_CHUNK: usize = 8 * 1024;

/// Wraps another reader and caps how many bytes may be read through it.
///
/// While no limit is set the wrapper is transparent. Once a limit is armed
/// with [`set_limit`](LimitedReader::set_limit), reads clamp to the bytes
/// remaining in the region and report end-of-stream when it is exhausted,
/// which lets the caller parse a length-delimited payload without ever
/// overrunning it.
pub struct LimitedReader<R> {
    inner: R,
    limit: Option<u64>,
}

impl<R: Read> LimitedReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, limit: None }
    }

    /// Bounds subsequent reads to `limit` bytes.
    pub fn set_limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    /// Removes the bound; subsequent reads pass through unclamped.
    pub fn clear_limit(&mut self) {
        self.limit = None;
    }

    /// Bytes left in the bounded region. `None` when no limit is armed.
    pub fn remaining(&self) -> Option<u64> {
        self.limit
    }

    /// Consumes and discards everything left in the bounded region.
    ///
    /// Reads in fixed-size chunks so a hostile length never translates into
    /// a matching allocation. Returns [`BufferError::Truncated`] when the
    /// underlying stream ends before the region does.
    pub fn skip_remaining(&mut self) -> Result<(), BufferError> {
        let Some(mut remaining) = self.limit else {
            return Ok(());
        };
        let mut scratch = [0u8; SKIP_CHUNK];
        while remaining > 0 {
            let want = remaining.min(SKIP_CHUNK as u64) as usize;
            let n = self.inner.read(&mut scratch[..want])?;
            if n == 0 {
                self.limit = Some(remaining);
                return Err(BufferError::Truncated);
            }
            remaining -= n as u64;
            self.limit = Some(remaining);
        }
        Ok(())
    }
}

impl<R: Read> Read for LimitedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let buf = match self.limit {
            None => buf,
            Some(0) => return Ok(0),
            Some(remaining) => {
                let cap = remaining.min(buf.len() as u64) as usize;
                &mut buf[..cap]
            }
        };
        let n = self.inner.read(buf)?;
        if let Some(remaining) = &mut self.limit {
            *remaining -= n as u64;
        }
        Ok(n)
    }
}

//! Per-call transfer descriptor.

use crate::Errno;

/// A read request: where to read from, how much was asked for, where to put it.
///
/// The offset is kept signed, as a file offset is. `resid` is the byte count the
/// caller declared, which may exceed what the destination can actually hold;
/// [`Uio::move_out`] reports that as [`Errno::Fault`].
#[derive(Debug)]
pub struct Uio<'a> {
    offset: i64,
    resid: usize,
    buf: &'a mut [u8],
    filled: usize,
}

impl<'a> Uio<'a> {
    /// A request for `buf.len()` bytes at `offset`.
    #[must_use]
    pub fn new(buf: &'a mut [u8], offset: i64) -> Self {
        let resid = buf.len();
        Self::with_resid(buf, offset, resid)
    }

    /// A request whose declared length differs from the destination size.
    #[must_use]
    pub const fn with_resid(buf: &'a mut [u8], offset: i64, resid: usize) -> Self {
        Self {
            offset,
            resid,
            buf,
            filled: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn offset(&self) -> i64 {
        self.offset
    }

    #[inline]
    #[must_use]
    pub const fn resid(&self) -> usize {
        self.resid
    }

    /// Bytes moved into the destination so far.
    #[inline]
    #[must_use]
    pub const fn transferred(&self) -> usize {
        self.filled
    }

    /// The part of the destination that has been written.
    #[must_use]
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.filled]
    }

    /// Copies up to `resid` bytes of `src` into the destination and advances
    /// the offset by the amount copied.
    ///
    /// # Errors
    /// [`Errno::Fault`] if the destination has no room for the copy. Nothing is
    /// written in that case.
    pub fn move_out(&mut self, src: &[u8]) -> Result<(), Errno> {
        let n = src.len().min(self.resid);
        let end = self.filled.checked_add(n).ok_or(Errno::Fault)?;
        let dst = self.buf.get_mut(self.filled..end).ok_or(Errno::Fault)?;
        let step = i64::try_from(n).map_err(|_| Errno::Fault)?;
        let offset = self.offset.checked_add(step).ok_or(Errno::Inval)?;

        dst.copy_from_slice(&src[..n]);
        self.filled = end;
        self.resid -= n;
        self.offset = offset;
        Ok(())
    }
}

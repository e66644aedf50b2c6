// Little-endian byte cursor over a memory-mapped index file
//
// Every read is bounds-checked against the underlying slice; running off the
// end of a file is reported as a corrupt index rather than a panic.

use crate::error::{IndexError, Result};
use std::path::Path;

pub(crate) struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
    path: &'a Path,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(data: &'a [u8], path: &'a Path) -> Self {
        ByteCursor {
            data,
            offset: 0,
            path,
        }
    }

    #[inline]
    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes not yet consumed
    pub(crate) fn remaining(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self.offset.checked_add(len).filter(|&end| end <= self.data.len());
        match end {
            Some(end) => {
                let bytes = &self.data[self.offset..end];
                self.offset = end;
                Ok(bytes)
            }
            None => Err(IndexError::corrupt(
                self.path,
                format!(
                    "truncated while reading {} ({} bytes needed at offset {}, file has {})",
                    what,
                    len,
                    self.offset,
                    self.data.len()
                ),
            )),
        }
    }

    pub(crate) fn read_i32(&mut self, what: &str) -> Result<i32> {
        let bytes = self.take(4, what)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn read_u32(&mut self, what: &str) -> Result<u32> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn read_u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    /// Skip `len` bytes; `len` is computed in u64 so overflow surfaces here
    pub(crate) fn skip(&mut self, len: u64, what: &str) -> Result<()> {
        let len = usize::try_from(len).map_err(|_| {
            IndexError::corrupt(self.path, format!("{} size {} does not fit in memory", what, len))
        })?;
        self.take(len, what).map(|_| ())
    }

    /// Read the leading format sentinel shared by all index files
    pub(crate) fn expect_sentinel(&mut self, expected: i32) -> Result<()> {
        let found = self.read_i32("format sentinel")?;
        if found != expected {
            return Err(IndexError::corrupt(
                self.path,
                format!(
                    "leading sentinel is {} (expected {}); wrong endianness or not an index file",
                    found, expected
                ),
            ));
        }
        Ok(())
    }
}

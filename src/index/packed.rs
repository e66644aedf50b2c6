// Packed-sequence store (`.4.ebwt`)
//
// Holds only the unambiguous bases of the whole index, four per byte, two
// bits per base, lowest bit pair first. Ambiguous positions are never stored.

use crate::defaults::BASES;
use crate::error::{IndexError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::ops::Deref;
use std::path::Path;

enum Backing {
    /// Read-only map of the packed file, shared by every query
    Mapped(Mmap),
    /// Bytes assembled in memory
    Owned(Vec<u8>),
}

impl Deref for Backing {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Backing::Mapped(mmap) => mmap,
            Backing::Owned(bytes) => bytes,
        }
    }
}

/// Immutable 2-bit packed buffer of unambiguous bases
pub struct PackedSequence {
    data: Backing,
    base_count: u64,
}

impl PackedSequence {
    /// Memory-map `path`, which must hold exactly `ceil(base_count / 4)` bytes
    pub fn map(path: &Path, base_count: u64) -> Result<Self> {
        let file = File::open(path)?;
        let actual = file.metadata()?.len();
        let expected = base_count.div_ceil(4);
        if actual != expected {
            return Err(IndexError::corrupt(
                path,
                format!(
                    "packed sequence is {} bytes but run records describe {} bases ({} bytes)",
                    actual, base_count, expected
                ),
            ));
        }

        // SAFETY: the map is read-only and the index files are never written
        // while an index is open.
        let mmap = unsafe { Mmap::map(&file)? };
        log::debug!(
            "Memory-mapped {}: {} bytes ({:.1} MB)",
            path.display(),
            mmap.len(),
            mmap.len() as f64 / 1024.0 / 1024.0
        );

        Ok(PackedSequence {
            data: Backing::Mapped(mmap),
            base_count,
        })
    }

    /// Wrap packed bytes already in memory
    pub fn from_bytes(bytes: Vec<u8>, base_count: u64) -> Result<Self> {
        let expected = base_count.div_ceil(4);
        if bytes.len() as u64 != expected {
            return Err(IndexError::corrupt(
                "<in-memory>",
                format!(
                    "packed buffer is {} bytes but {} bases need {}",
                    bytes.len(),
                    base_count,
                    expected
                ),
            ));
        }
        Ok(PackedSequence {
            data: Backing::Owned(bytes),
            base_count,
        })
    }

    /// Number of unambiguous bases stored
    pub fn base_count(&self) -> u64 {
        self.base_count
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Decode the base at `packed_position` as one of `A`, `C`, `G`, `T`.
    ///
    /// # Panics
    /// If `packed_position >= base_count()`.
    #[inline]
    pub fn read_base(&self, packed_position: u64) -> u8 {
        assert!(
            packed_position < self.base_count,
            "packed position {} out of range ({} unambiguous bases)",
            packed_position,
            self.base_count
        );
        let byte = self.data[(packed_position >> 2) as usize];
        let shift = (packed_position & 3) << 1;
        BASES[((byte >> shift) & 3) as usize]
    }

    /// Append `count` bases starting at `packed_position` to `out`
    #[inline]
    pub(crate) fn extend_bases(&self, out: &mut String, packed_position: u64, count: u64) {
        for pos in packed_position..packed_position + count {
            out.push(self.read_base(pos) as char);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_low_bits_first() {
        // 0b11_10_01_00 = A C G T
        let packed = PackedSequence::from_bytes(vec![0b1110_0100, 0b0000_0011], 5).unwrap();
        let decoded: Vec<u8> = (0..5).map(|p| packed.read_base(p)).collect();
        assert_eq!(decoded, b"ACGTT");
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_read_past_end_panics() {
        // Byte exists but the fifth base is padding
        let packed = PackedSequence::from_bytes(vec![0, 0], 5).unwrap();
        packed.read_base(5);
    }

    #[test]
    fn test_from_bytes_rejects_wrong_size() {
        assert!(PackedSequence::from_bytes(vec![0; 3], 5).is_err());
        assert!(PackedSequence::from_bytes(Vec::new(), 0).is_ok());
    }

    #[test]
    fn test_map_checks_file_size() -> std::io::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("ref.4.ebwt");
        let mut file = File::create(&path)?;
        file.write_all(&[0b0101_0101, 0b1111_1111])?;
        drop(file);

        let packed = PackedSequence::map(&path, 8).unwrap();
        assert_eq!(packed.byte_len(), 2);
        assert_eq!(packed.read_base(0), b'C');
        assert_eq!(packed.read_base(7), b'T');

        match PackedSequence::map(&path, 12) {
            Err(IndexError::CorruptIndex { .. }) => {}
            other => panic!("expected CorruptIndex, got {:?}", other.map(|p| p.base_count())),
        }
        Ok(())
    }
}

// BED-like region lists and batch stretch retrieval
//
// Lines are `name  start  end` (0-based, half-open, tab or space separated);
// extra columns are ignored, blank lines and `#` comments are skipped.
// Files ending in `.gz` are decompressed on the fly.

use crate::error::Result;
use crate::index::ReferenceIndex;
use flate2::read::MultiGzDecoder;
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    pub start: u64,
    pub end: u64,
}

impl Region {
    /// Span in bases; saturates so oversized regions are rejected at query time
    pub fn len(&self) -> usize {
        usize::try_from(self.end - self.start).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Open a region list, transparently decompressing `.gz` files
pub fn open_regions(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let reader: Box<dyn Read> = if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(Box::new(BufReader::new(reader)))
}

/// Parse every region in `reader`
pub fn parse_regions<R: BufRead>(reader: R) -> io::Result<Vec<Region>> {
    let mut regions = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let invalid = |msg: &str| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("region line {}: {}: {}", line_no + 1, msg, trimmed),
            )
        };

        let mut fields = trimmed.split_whitespace();
        let name = fields.next().ok_or_else(|| invalid("missing name"))?;
        let start: u64 = fields
            .next()
            .ok_or_else(|| invalid("missing start"))?
            .parse()
            .map_err(|_| invalid("invalid start"))?;
        let end: u64 = fields
            .next()
            .ok_or_else(|| invalid("missing end"))?
            .parse()
            .map_err(|_| invalid("invalid end"))?;
        if end < start {
            return Err(invalid("end before start"));
        }
        regions.push(Region {
            name: name.to_string(),
            start,
            end,
        });
    }
    Ok(regions)
}

/// Resolve every region in parallel; results keep input order
pub fn fetch_regions(index: &ReferenceIndex, regions: &[Region]) -> Vec<Result<String>> {
    regions
        .par_iter()
        .map(|r| index.get_stretch(&r.name, r.start, r.len()))
        .collect()
}

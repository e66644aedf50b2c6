// Layout parser for the small (32-bit offset) index
//
// Two files describe where every unambiguous base lives:
// - `.1.ebwt` carries the reference names behind a large encoded body that
//   is skipped with the exact block-padding arithmetic of the index builder
// - `.3.ebwt` carries one run record per unambiguous stretch
//
// The parsed layout is an arena: names get dense integer ids, and the run
// records plus both cumulative tables are flat arrays in which each
// reference owns one contiguous range.

use super::cursor::ByteCursor;
use crate::defaults::{FORMAT_SENTINEL, UNMAPPED_NAME};
use crate::error::{IndexError, Result};
use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// One ambiguous-gap-then-unambiguous-run segment of a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunRecord {
    /// Ambiguous bases immediately preceding the run
    pub gap_before: u32,
    /// Unambiguous bases in the run
    pub run_length: u32,
    /// Set on the first record of every reference
    pub starts_new_reference: bool,
}

impl RunRecord {
    pub fn new(gap_before: u32, run_length: u32, starts_new_reference: bool) -> Self {
        RunRecord {
            gap_before,
            run_length,
            starts_new_reference,
        }
    }

    /// Reference-coordinate span covered by this record (gap + run)
    #[inline]
    pub fn span(&self) -> u64 {
        self.gap_before as u64 + self.run_length as u64
    }
}

/// Scalar header fields of `.1.ebwt`
///
/// Only used to compute how many bytes separate the header from the
/// reference-name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LayoutHeader {
    pub sequence_length: u32,
    pub line_rate: i32,
    pub lines_per_side: i32,
    pub ftab_chars: i32,
}

impl LayoutHeader {
    /// Size in bytes of the encoded index body.
    ///
    /// The body is stored as pairs of sides; each side holds `side_sz` bytes,
    /// 8 of which are occurrence counters, and the final pair is padded out.
    /// Returns `None` when the parameters cannot describe a real index.
    pub(crate) fn encoded_body_len(&self) -> Option<u64> {
        if !(0..32).contains(&self.line_rate) || self.lines_per_side <= 0 {
            return None;
        }
        let bwt_sz = self.sequence_length as u64 / 4 + 1;
        let line_sz = 1u64 << self.line_rate;
        let side_sz = line_sz.checked_mul(self.lines_per_side as u64)?;
        if side_sz <= 8 {
            return None;
        }
        let side_bwt_sz = side_sz - 8;
        let num_side_pairs = bwt_sz.div_ceil(2 * side_bwt_sz);
        num_side_pairs.checked_mul(2)?.checked_mul(side_sz)
    }

    /// Number of 4-byte entries in the k-mer lookup table (`ftab`)
    pub(crate) fn ftab_entries(&self) -> Option<u64> {
        if !(0..=16).contains(&self.ftab_chars) {
            return None;
        }
        Some((1u64 << (2 * self.ftab_chars)) + 1)
    }

    /// Number of 4-byte entries in the extended lookup table (`eftab`)
    pub(crate) fn eftab_entries(&self) -> Option<u64> {
        if !(0..=16).contains(&self.ftab_chars) {
            return None;
        }
        Some(self.ftab_chars as u64 * 2)
    }
}

/// Names and declared lengths recovered from `.1.ebwt`
#[derive(Debug)]
pub(crate) struct NameTable {
    pub declared_lengths: Vec<i32>,
    pub names: Vec<String>,
}

/// Parse `.1.ebwt` up to and including the reference-name table
pub(crate) fn parse_name_table(data: &[u8], path: &Path) -> Result<NameTable> {
    let mut cursor = ByteCursor::new(data, path);
    cursor.expect_sentinel(FORMAT_SENTINEL)?;

    let sequence_length = cursor.read_u32("sequence length")?;
    let line_rate = cursor.read_i32("line rate")?;
    let lines_per_side = cursor.read_i32("lines per side")?;
    // Suffix-array sampling rate; irrelevant to sequence retrieval
    cursor.skip(4, "offset rate")?;
    let ftab_chars = cursor.read_i32("ftab chars")?;
    cursor.skip(4, "flags")?;
    let header = LayoutHeader {
        sequence_length,
        line_rate,
        lines_per_side,
        ftab_chars,
    };
    log::debug!("{}: {:?}", path.display(), header);

    let nref = cursor.read_u32("reference count")? as usize;
    let mut declared_lengths = Vec::with_capacity(nref.min(data.len() / 4));
    for _ in 0..nref {
        declared_lengths.push(cursor.read_i32("reference length")?);
    }

    // Fragment starts are (first unambiguous base, reference id, offset)
    // triples; whole-reference retrieval never needs them
    let nfrag = cursor.read_u32("fragment count")?;
    cursor.skip(nfrag as u64 * 3 * 4, "fragment starts")?;

    let body_len = header.encoded_body_len().ok_or_else(|| {
        IndexError::corrupt(
            path,
            format!(
                "invalid body geometry (line_rate={}, lines_per_side={})",
                header.line_rate, header.lines_per_side
            ),
        )
    })?;
    let (ftab_entries, eftab_entries) = header
        .ftab_entries()
        .zip(header.eftab_entries())
        .ok_or_else(|| {
            IndexError::corrupt(path, format!("invalid ftab_chars {}", header.ftab_chars))
        })?;
    log::debug!(
        "{}: skipping {} fragments, {} body bytes, ftab={} eftab={} entries",
        path.display(),
        nfrag,
        body_len,
        ftab_entries,
        eftab_entries
    );

    cursor.skip(body_len, "encoded body")?;
    cursor.skip(4, "zOff")?;
    cursor.skip(5 * 4, "fchr")?;
    cursor.skip(ftab_entries * 4, "ftab")?;
    cursor.skip(eftab_entries * 4, "eftab")?;
    log::debug!("{}: name table starts at byte {}", path.display(), cursor.offset());

    let names = parse_names(cursor.remaining(), path)?;
    if names.len() != nref {
        return Err(IndexError::corrupt(
            path,
            format!("header declares {} references but {} names follow", nref, names.len()),
        ));
    }

    Ok(NameTable {
        declared_lengths,
        names,
    })
}

/// Read newline-delimited names until end of data, a NUL-led line or an
/// empty token. Only the first whitespace-delimited token of a line is kept.
fn parse_names(mut data: &[u8], path: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    while let Some(&first) = data.first() {
        if first == 0 {
            break;
        }
        let line_end = data.iter().position(|&b| b == b'\n').unwrap_or(data.len());
        let line = &data[..line_end];
        data = data.get(line_end + 1..).unwrap_or(&[]);

        let Some(token) = line
            .split(|b| b.is_ascii_whitespace() || *b == 0)
            .find(|t| !t.is_empty())
        else {
            break;
        };
        let name = std::str::from_utf8(token).map_err(|_| {
            IndexError::corrupt(path, format!("reference name #{} is not valid UTF-8", names.len()))
        })?;
        names.push(name.to_string());
    }
    Ok(names)
}

/// Parse `.3.ebwt` into its run records
pub(crate) fn parse_run_records(data: &[u8], path: &Path) -> Result<Vec<RunRecord>> {
    let mut cursor = ByteCursor::new(data, path);
    cursor.expect_sentinel(FORMAT_SENTINEL)?;

    let nrecs = cursor.read_u32("run record count")? as usize;
    // 9 bytes per record; don't trust the count for the allocation
    let mut records = Vec::with_capacity(nrecs.min(cursor.remaining().len() / 9));
    for _ in 0..nrecs {
        let gap_before = cursor.read_u32("run record gap")?;
        let run_length = cursor.read_u32("run record length")?;
        let flag = cursor.read_u8("run record flag")?;
        records.push(RunRecord::new(gap_before, run_length, flag != 0));
    }
    if !cursor.remaining().is_empty() {
        log::debug!(
            "{}: {} trailing bytes after {} run records",
            path.display(),
            cursor.remaining().len(),
            nrecs
        );
    }
    Ok(records)
}

/// Per-reference run tables for the whole index
#[derive(Debug, Clone)]
pub struct ReferenceLayout {
    names: Vec<String>,
    ids: HashMap<String, usize>,
    declared_lengths: Vec<u64>,
    lengths: Vec<u64>,
    ranges: Vec<Range<usize>>,
    records: Vec<RunRecord>,
    ref_offsets: Vec<u64>,
    packed_offsets: Vec<u64>,
    total_unambiguous: u64,
}

impl ReferenceLayout {
    /// Build the layout from both metadata files
    pub(crate) fn parse(
        layout_data: &[u8],
        layout_path: &Path,
        runs_data: &[u8],
        runs_path: &Path,
    ) -> Result<Self> {
        let table = parse_name_table(layout_data, layout_path)?;
        let records = parse_run_records(runs_data, runs_path)?;
        let mut layout = Self::build(table.names, records, runs_path)?;

        for (id, &declared) in table.declared_lengths.iter().enumerate() {
            // Written signed; lengths past i32::MAX come back negative
            let declared = declared as u32 as u64;
            if declared != layout.lengths[id] {
                log::debug!(
                    "{}: declared length {} differs from run-table length {}",
                    layout.names[id],
                    declared,
                    layout.lengths[id]
                );
            }
            layout.declared_lengths[id] = declared;
        }
        Ok(layout)
    }

    /// Build the layout from names and run records already in memory.
    ///
    /// Records are assigned to names in order: every record flagged
    /// `starts_new_reference` opens the next name. A fully ambiguous
    /// reference therefore has to come after every reference with records.
    pub fn from_records(names: Vec<String>, records: Vec<RunRecord>) -> Result<Self> {
        Self::build(names, records, Path::new("<in-memory>"))
    }

    fn build(names: Vec<String>, records: Vec<RunRecord>, path: &Path) -> Result<Self> {
        let nref = names.len();
        let mut ids = HashMap::with_capacity(nref);
        for (id, name) in names.iter().enumerate() {
            if name == UNMAPPED_NAME {
                return Err(IndexError::corrupt(
                    path,
                    format!("reference #{} is named {}, which denotes unmapped", id, name),
                ));
            }
            if ids.insert(name.clone(), id).is_some() {
                return Err(IndexError::corrupt(
                    path,
                    format!("reference name {} appears more than once", name),
                ));
            }
        }

        let mut lengths = vec![0u64; nref];
        let mut ranges = vec![0..0; nref];
        let mut ref_offsets = Vec::with_capacity(records.len());
        let mut packed_offsets = Vec::with_capacity(records.len());

        let mut current: Option<usize> = None;
        let mut next_name = 0usize;
        let mut running_length = 0u64;
        let mut running_unambiguous = 0u64;

        for (i, rec) in records.iter().enumerate() {
            if rec.starts_new_reference {
                if let Some(id) = current {
                    lengths[id] = running_length;
                    ranges[id].end = i;
                }
                if next_name >= nref {
                    return Err(IndexError::corrupt(
                        path,
                        format!(
                            "run record {} starts reference #{} but only {} names exist",
                            i,
                            next_name + 1,
                            nref
                        ),
                    ));
                }
                current = Some(next_name);
                ranges[next_name] = i..i;
                next_name += 1;
                running_length = 0;
            }
            if current.is_none() {
                return Err(IndexError::corrupt(
                    path,
                    "first run record does not start a reference",
                ));
            }
            ref_offsets.push(running_length);
            packed_offsets.push(running_unambiguous);
            running_length += rec.span();
            running_unambiguous += rec.run_length as u64;
        }
        if let Some(id) = current {
            lengths[id] = running_length;
            ranges[id].end = records.len();
        }

        // Holds by construction; kept as the final consistency check over
        // the per-reference tables
        let assigned: usize = ranges.iter().map(|r| r.len()).sum();
        if assigned != records.len() || ref_offsets.len() != records.len() {
            return Err(IndexError::corrupt(
                path,
                format!(
                    "{} run records but {} assigned to references",
                    records.len(),
                    assigned
                ),
            ));
        }
        // Records carry no reference id, so only the trailing names can be
        // left without records
        if next_name < nref {
            log::warn!(
                "last {} of {} references (from {}) have no run records; queries against them return only N",
                nref - next_name,
                nref,
                names[next_name]
            );
        }

        Ok(ReferenceLayout {
            declared_lengths: lengths.clone(),
            names,
            ids,
            lengths,
            ranges,
            records,
            ref_offsets,
            packed_offsets,
            total_unambiguous: running_unambiguous,
        })
    }

    /// Reference names in index order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn id(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    pub fn reference_count(&self) -> usize {
        self.names.len()
    }

    /// Total reference length (ambiguous + unambiguous) recomputed from the runs
    pub fn length(&self, id: usize) -> u64 {
        self.lengths[id]
    }

    /// Length recorded in the index header, or the recomputed length for
    /// layouts built in memory
    pub fn declared_length(&self, id: usize) -> u64 {
        self.declared_lengths[id]
    }

    pub fn runs(&self, id: usize) -> &[RunRecord] {
        &self.records[self.ranges[id].clone()]
    }

    /// Reference-coordinate start of each run record of `id`
    pub fn ref_offsets(&self, id: usize) -> &[u64] {
        &self.ref_offsets[self.ranges[id].clone()]
    }

    /// Packed-store position of each run record of `id`
    pub fn packed_offsets(&self, id: usize) -> &[u64] {
        &self.packed_offsets[self.ranges[id].clone()]
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Unambiguous bases across all references
    pub fn total_unambiguous(&self) -> u64 {
        self.total_unambiguous
    }

    /// Exact size the packed-sequence file must have
    pub fn packed_byte_len(&self) -> u64 {
        self.total_unambiguous.div_ceil(4)
    }
}

/// Path of one index file: the suffix is appended to the prefix verbatim
pub(crate) fn index_file(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

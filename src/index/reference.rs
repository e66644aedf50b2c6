// Reference index: layout tables plus the packed store, and stretch retrieval
//
// The index is built once and never mutated. Queries are pure functions of
// the immutable state, so one `ReferenceIndex` can serve any number of
// threads without locking.

use super::layout::{ReferenceLayout, RunRecord, index_file};
use super::packed::PackedSequence;
use crate::defaults::{
    AMBIGUOUS_BASE, LARGE_LAYOUT_SUFFIX, LARGE_RUNS_SUFFIX, LAYOUT_SUFFIX, MAX_STRETCH_LENGTH,
    PACKED_SUFFIX, RUNS_SUFFIX,
};
use crate::error::{IndexError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

/// Queryable reference index
pub struct ReferenceIndex {
    layout: ReferenceLayout,
    packed: PackedSequence,
}

impl ReferenceIndex {
    /// Open the small index with the given prefix (`PREFIX.{1,3,4}.ebwt`)
    ///
    /// Parsing runs to completion before the index is returned; any
    /// inconsistency aborts the whole load.
    pub fn open(prefix: impl AsRef<Path>) -> Result<Self> {
        let prefix = prefix.as_ref();
        let start = Instant::now();

        let runs_path = index_file(prefix, RUNS_SUFFIX);
        let layout_path = index_file(prefix, LAYOUT_SUFFIX);
        let packed_path = index_file(prefix, PACKED_SUFFIX);

        if !runs_path.exists() {
            let large = index_file(prefix, LARGE_RUNS_SUFFIX).exists()
                || index_file(prefix, LARGE_LAYOUT_SUFFIX).exists();
            let detail = if large {
                format!(
                    "found a large (64-bit offset) index, which is not supported; expected {}",
                    runs_path.display()
                )
            } else {
                format!("{} not found", runs_path.display())
            };
            return Err(IndexError::MissingIndexFormat {
                prefix: prefix.to_path_buf(),
                detail,
            });
        }
        for required in [&layout_path, &packed_path] {
            if !required.exists() {
                return Err(IndexError::MissingIndexFormat {
                    prefix: prefix.to_path_buf(),
                    detail: format!("{} not found", required.display()),
                });
            }
        }

        let layout = {
            // Both metadata maps are dropped once the tables are built
            let layout_map = map_file(&layout_path)?;
            let runs_map = map_file(&runs_path)?;
            ReferenceLayout::parse(&layout_map, &layout_path, &runs_map, &runs_path)?
        };
        let packed = PackedSequence::map(&packed_path, layout.total_unambiguous())?;

        log::info!(
            "Index {} loaded in {:.3}s ({} references, {} run records, {} unambiguous bases)",
            prefix.display(),
            start.elapsed().as_secs_f64(),
            layout.reference_count(),
            layout.record_count(),
            layout.total_unambiguous()
        );

        Ok(ReferenceIndex { layout, packed })
    }

    /// Assemble an index from a layout and a packed store built elsewhere
    pub fn from_parts(layout: ReferenceLayout, packed: PackedSequence) -> Result<Self> {
        if packed.base_count() != layout.total_unambiguous() {
            return Err(IndexError::corrupt(
                "<in-memory>",
                format!(
                    "packed store holds {} bases but run records describe {}",
                    packed.base_count(),
                    layout.total_unambiguous()
                ),
            ));
        }
        Ok(ReferenceIndex { layout, packed })
    }

    pub fn layout(&self) -> &ReferenceLayout {
        &self.layout
    }

    pub fn packed(&self) -> &PackedSequence {
        &self.packed
    }

    /// Reference names in order of first appearance in the index
    pub fn reference_names(&self) -> &[String] {
        self.layout.names()
    }

    pub fn reference_id(&self, name: &str) -> Option<usize> {
        self.layout.id(name)
    }

    fn require_id(&self, name: &str) -> Result<usize> {
        self.layout
            .id(name)
            .ok_or_else(|| IndexError::UnknownReference(name.to_string()))
    }

    /// Total length of `name` in bases, ambiguous positions included
    pub fn reference_length(&self, name: &str) -> Result<u64> {
        Ok(self.layout.length(self.require_id(name)?))
    }

    /// Length of `name` as recorded in the index header
    pub fn declared_length(&self, name: &str) -> Result<u64> {
        Ok(self.layout.declared_length(self.require_id(name)?))
    }

    pub fn run_records(&self, name: &str) -> Result<&[RunRecord]> {
        Ok(self.layout.runs(self.require_id(name)?))
    }

    pub fn total_unambiguous_bases(&self) -> u64 {
        self.packed.base_count()
    }

    /// Retrieve `length` bases of `name` starting at 0-based `start`.
    ///
    /// Ambiguous positions, and anything past the last unambiguous run of
    /// the reference, come back as `N`; the result always has exactly
    /// `length` characters. Lengths above `MAX_STRETCH_LENGTH`, or ones the
    /// allocator refuses, are `InvalidQuery`.
    pub fn get_stretch(&self, name: &str, start: u64, length: usize) -> Result<String> {
        let id = self.require_id(name)?;
        self.stretch(id, start, length)
    }

    /// Same as [`get_stretch`](Self::get_stretch) addressed by reference id;
    /// `None` for an unknown id
    pub fn get_stretch_by_id(
        &self,
        id: usize,
        start: u64,
        length: usize,
    ) -> Option<Result<String>> {
        (id < self.layout.reference_count()).then(|| self.stretch(id, start, length))
    }

    // Binary search finds the record holding `start`; the span is then walked
    // record by record. Most queries touch one or two records, so the walk is
    // linear in the records spanned rather than searched again.
    fn stretch(&self, id: usize, start: u64, length: usize) -> Result<String> {
        if length > MAX_STRETCH_LENGTH {
            return Err(IndexError::InvalidQuery(format!(
                "stretch of {} bases exceeds the {} base limit",
                length, MAX_STRETCH_LENGTH
            )));
        }
        let mut out = String::new();
        out.try_reserve_exact(length).map_err(|e| {
            IndexError::InvalidQuery(format!("cannot allocate a {} base stretch: {}", length, e))
        })?;
        let runs = self.layout.runs(id);
        let ref_offsets = self.layout.ref_offsets(id);
        let packed_offsets = self.layout.packed_offsets(id);

        let mut remaining = length as u64;
        let mut pos = start;

        if !runs.is_empty() && remaining > 0 {
            // Rightmost record whose start is <= `start`; ref_offsets[0] == 0
            let first = ref_offsets.partition_point(|&o| o <= start).saturating_sub(1);
            let mut off = ref_offsets[first];
            let mut buf_off = packed_offsets[first];

            for rec in &runs[first..] {
                // Gap phase
                off += rec.gap_before as u64;
                if pos < off {
                    let n = (off - pos).min(remaining);
                    push_ambiguous(&mut out, n);
                    pos += n;
                    remaining -= n;
                }
                if remaining == 0 {
                    break;
                }

                // Unambiguous phase; `pos >= off` here
                let run_end = off + rec.run_length as u64;
                if pos < run_end {
                    buf_off += pos - off;
                    let n = (run_end - pos).min(remaining);
                    self.packed.extend_bases(&mut out, buf_off, n);
                    buf_off += n;
                    pos += n;
                    remaining -= n;
                } else {
                    buf_off += rec.run_length as u64;
                }
                off = run_end;
                if remaining == 0 {
                    break;
                }
            }
        }

        // Past the last unambiguous run of the reference
        push_ambiguous(&mut out, remaining);
        Ok(out)
    }
}

fn push_ambiguous(out: &mut String, count: u64) {
    out.extend(std::iter::repeat_n(AMBIGUOUS_BASE, count as usize));
}

fn map_file(path: &Path) -> Result<Mmap> {
    let file = File::open(path)?;
    // SAFETY: read-only map of an index file that is not modified while open
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(mmap)
}

#[cfg(test)]
#[path = "reference_test.rs"]
mod reference_test;

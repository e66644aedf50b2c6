// Synthetic index fixtures for unit tests
//
// References are written as plain strings; any non-ACGT character is treated
// as ambiguous, exactly as the index builder would.

use super::layout::{LayoutHeader, ReferenceLayout, RunRecord};
use super::packed::PackedSequence;
use super::reference::ReferenceIndex;

pub(crate) const LINE_RATE: i32 = 6;
pub(crate) const LINES_PER_SIDE: i32 = 2;
pub(crate) const FTAB_CHARS: i32 = 2;

pub(crate) struct Encoded {
    pub names: Vec<String>,
    pub records: Vec<RunRecord>,
    pub packed: Vec<u8>,
    pub base_count: u64,
    pub total_length: u64,
}

fn base_code(b: u8) -> Option<u8> {
    match b {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// Split each reference into run records and pack its unambiguous bases
pub(crate) fn encode(refs: &[(&str, &str)]) -> Encoded {
    let mut records = Vec::new();
    let mut packed = Vec::new();
    let mut base_count = 0u64;
    let mut total_length = 0u64;

    let mut recordless: Option<&str> = None;
    for (name, seq) in refs {
        total_length += seq.len() as u64;
        let records_before = records.len();
        let mut first = true;
        let mut gap = 0u32;
        let mut run = 0u32;
        for &b in seq.as_bytes() {
            match base_code(b) {
                Some(code) => {
                    if base_count % 4 == 0 {
                        packed.push(0);
                    }
                    let last = packed.len() - 1;
                    packed[last] |= code << ((base_count % 4) * 2);
                    base_count += 1;
                    run += 1;
                }
                None => {
                    if run > 0 {
                        records.push(RunRecord::new(gap, run, first));
                        first = false;
                        gap = 0;
                        run = 0;
                    }
                    gap += 1;
                }
            }
        }
        // Trailing ambiguous bases are not recorded
        if run > 0 {
            records.push(RunRecord::new(gap, run, first));
        }

        // The run table cannot place a fully ambiguous reference before one
        // with records; its records would be read as the earlier name's
        if records.len() == records_before {
            if recordless.is_none() {
                recordless = Some(*name);
            }
        } else if let Some(empty) = recordless {
            panic!("fully ambiguous reference {} precedes {}, which has run records", empty, name);
        }
    }

    Encoded {
        names: refs.iter().map(|(n, _)| n.to_string()).collect(),
        records,
        packed,
        base_count,
        total_length,
    }
}

pub(crate) fn in_memory_index(refs: &[(&str, &str)]) -> ReferenceIndex {
    let enc = encode(refs);
    let layout = ReferenceLayout::from_records(enc.names, enc.records).unwrap();
    let packed = PackedSequence::from_bytes(enc.packed, enc.base_count).unwrap();
    ReferenceIndex::from_parts(layout, packed).unwrap()
}

/// Bytes of a `.1.ebwt` file with zero-filled tables
pub(crate) fn layout_file(refs: &[(&str, &str)]) -> Vec<u8> {
    let enc = encode(refs);
    let header = LayoutHeader {
        sequence_length: enc.total_length as u32,
        line_rate: LINE_RATE,
        lines_per_side: LINES_PER_SIDE,
        ftab_chars: FTAB_CHARS,
    };

    let mut out = Vec::new();
    let push_i32 = |out: &mut Vec<u8>, v: i32| out.extend_from_slice(&v.to_le_bytes());
    let push_u32 = |out: &mut Vec<u8>, v: u32| out.extend_from_slice(&v.to_le_bytes());

    push_i32(&mut out, 1);
    push_u32(&mut out, header.sequence_length);
    push_i32(&mut out, LINE_RATE);
    push_i32(&mut out, LINES_PER_SIDE);
    push_i32(&mut out, 5); // offRate
    push_i32(&mut out, FTAB_CHARS);
    push_i32(&mut out, -1); // flags

    push_u32(&mut out, refs.len() as u32);
    for (_, seq) in refs {
        push_u32(&mut out, seq.len() as u32);
    }

    push_u32(&mut out, enc.records.len() as u32);
    out.resize(out.len() + enc.records.len() * 12, 0);

    let body = header.encoded_body_len().unwrap() as usize;
    let tables = 4 + 5 * 4
        + header.ftab_entries().unwrap() as usize * 4
        + header.eftab_entries().unwrap() as usize * 4;
    // Non-zero filler so a miscounted skip lands on garbage, not on names
    out.resize(out.len() + body + tables, 0xAB);

    for (name, _) in refs {
        out.extend_from_slice(name.as_bytes());
        out.push(b'\n');
    }
    out.push(0);
    out
}

/// Bytes of a `.3.ebwt` file
pub(crate) fn runs_file(records: &[RunRecord]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&1i32.to_le_bytes());
    out.extend_from_slice(&(records.len() as u32).to_le_bytes());
    for rec in records {
        out.extend_from_slice(&rec.gap_before.to_le_bytes());
        out.extend_from_slice(&rec.run_length.to_le_bytes());
        out.push(rec.starts_new_reference as u8);
    }
    out
}

// Writes small `.1/.3/.4.ebwt` indexes for integration tests.
//
// Sequences are plain strings; anything other than ACGT is ambiguous.

#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const LINE_RATE: i32 = 6;
pub const LINES_PER_SIDE: i32 = 2;
pub const FTAB_CHARS: i32 = 3;

pub struct IndexFiles {
    pub prefix: PathBuf,
    pub layout: Vec<u8>,
    pub runs: Vec<u8>,
    pub packed: Vec<u8>,
}

impl IndexFiles {
    /// Build the three files for `refs` without touching disk
    pub fn build(dir: &Path, name: &str, refs: &[(&str, &str)]) -> Self {
        let mut runs: Vec<(u32, u32, bool)> = Vec::new();
        let mut packed = Vec::new();
        let mut base_count = 0u64;
        let mut total_len = 0u32;

        for (_, seq) in refs {
            total_len += seq.len() as u32;
            let (mut first, mut gap, mut run) = (true, 0u32, 0u32);
            for b in seq.bytes() {
                let code = match b {
                    b'A' => Some(0u8),
                    b'C' => Some(1),
                    b'G' => Some(2),
                    b'T' => Some(3),
                    _ => None,
                };
                match code {
                    Some(code) => {
                        if base_count % 4 == 0 {
                            packed.push(0u8);
                        }
                        *packed.last_mut().unwrap() |= code << ((base_count % 4) * 2);
                        base_count += 1;
                        run += 1;
                    }
                    None => {
                        if run > 0 {
                            runs.push((gap, run, first));
                            first = false;
                            gap = 0;
                            run = 0;
                        }
                        gap += 1;
                    }
                }
            }
            if run > 0 {
                runs.push((gap, run, first));
            }
        }

        // .3.ebwt
        let mut runs_bytes = Vec::new();
        runs_bytes.extend_from_slice(&1i32.to_le_bytes());
        runs_bytes.extend_from_slice(&(runs.len() as u32).to_le_bytes());
        for &(gap, run, first) in &runs {
            runs_bytes.extend_from_slice(&gap.to_le_bytes());
            runs_bytes.extend_from_slice(&run.to_le_bytes());
            runs_bytes.push(first as u8);
        }

        // .1.ebwt
        let mut layout = Vec::new();
        for v in [1i32, total_len as i32, LINE_RATE, LINES_PER_SIDE, 5, FTAB_CHARS, -1] {
            layout.extend_from_slice(&v.to_le_bytes());
        }
        layout.extend_from_slice(&(refs.len() as u32).to_le_bytes());
        for (_, seq) in refs {
            layout.extend_from_slice(&(seq.len() as u32).to_le_bytes());
        }
        layout.extend_from_slice(&(runs.len() as u32).to_le_bytes());
        layout.resize(layout.len() + runs.len() * 12, 0);

        let bwt_sz = total_len as usize / 4 + 1;
        let side_sz = (1usize << LINE_RATE) * LINES_PER_SIDE as usize;
        let side_bwt_sz = side_sz - 8;
        let num_side_pairs = (bwt_sz + 2 * side_bwt_sz - 1) / (2 * side_bwt_sz);
        let ebwt_tot_len = num_side_pairs * 2 * side_sz;
        let ftab_len = (1usize << (FTAB_CHARS * 2)) + 1;
        let eftab_len = FTAB_CHARS as usize * 2;
        let skipped = ebwt_tot_len + 4 + 5 * 4 + ftab_len * 4 + eftab_len * 4;
        layout.resize(layout.len() + skipped, 0xCD);

        for (name, _) in refs {
            layout.extend_from_slice(name.as_bytes());
            layout.push(b'\n');
        }
        layout.push(0);

        IndexFiles {
            prefix: dir.join(name),
            layout,
            runs: runs_bytes,
            packed,
        }
    }

    pub fn path(&self, suffix: &str) -> PathBuf {
        PathBuf::from(format!("{}{}", self.prefix.display(), suffix))
    }

    pub fn write(&self) -> io::Result<&Path> {
        fs::write(self.path(".1.ebwt"), &self.layout)?;
        fs::write(self.path(".3.ebwt"), &self.runs)?;
        fs::write(self.path(".4.ebwt"), &self.packed)?;
        Ok(&self.prefix)
    }
}

/// Write an index for `refs` under `dir` and return its prefix
pub fn write_index(dir: &Path, name: &str, refs: &[(&str, &str)]) -> io::Result<PathBuf> {
    let files = IndexFiles::build(dir, name, refs);
    files.write()?;
    Ok(files.prefix)
}

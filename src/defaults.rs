// src/defaults.rs

// Index file suffixes (small index, 32-bit offsets)
pub const LAYOUT_SUFFIX: &str = ".1.ebwt";
pub const RUNS_SUFFIX: &str = ".3.ebwt";
pub const PACKED_SUFFIX: &str = ".4.ebwt";

// Large index (64-bit offsets), only looked up to report it as unsupported
pub const LARGE_LAYOUT_SUFFIX: &str = ".1.ebwtl";
pub const LARGE_RUNS_SUFFIX: &str = ".3.ebwtl";

// Both index files open with this little-endian i32
pub const FORMAT_SENTINEL: i32 = 1;

// Base decoding
pub const BASES: [u8; 4] = *b"ACGT";
pub const AMBIGUOUS_BASE: char = 'N';

// Longest stretch returned by one query; no small-index reference is longer
pub const MAX_STRETCH_LENGTH: usize = u32::MAX as usize;

// Naming table
pub const ORDINAL_WIDTH: usize = 12;
pub const UNMAPPED_NAME: &str = "*";

// CLI
pub const VERBOSITY: u8 = 3;

// Splice-site motif calls
//
// An intron's strand can be read off its terminal dinucleotides. Only the
// canonical and the two common minor classes are recognised:
//
//   plus:  GT-AG, GC-AG, AT-AC
//   minus: CT-AC, CT-GC, GT-AT  (reverse complements of the above)

use crate::error::Result;
use crate::index::ReferenceIndex;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Plus,
    Minus,
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
        }
    }
}

const PLUS_MOTIFS: [(&str, &str); 3] = [("GT", "AG"), ("GC", "AG"), ("AT", "AC")];
const MINUS_MOTIFS: [(&str, &str); 3] = [("CT", "AC"), ("CT", "GC"), ("GT", "AT")];

/// Terminal dinucleotides of an intron in reference orientation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunctionMotif {
    /// First two intron bases
    pub left: String,
    /// Last two intron bases
    pub right: String,
}

impl JunctionMotif {
    /// Strand implied by the motif, or `None` when it is non-canonical
    pub fn strand(&self) -> Option<Strand> {
        let matches = |motifs: &[(&str, &str)]| {
            motifs
                .iter()
                .any(|&(l, r)| l == self.left && r == self.right)
        };
        if matches(&PLUS_MOTIFS) {
            Some(Strand::Plus)
        } else if matches(&MINUS_MOTIFS) {
            Some(Strand::Minus)
        } else {
            None
        }
    }
}

/// Read the motif of the intron spanning 1-based inclusive `[start, end]`.
///
/// Introns shorter than 4 bases have overlapping dinucleotides and are
/// read as-is.
pub fn junction_motif(
    index: &ReferenceIndex,
    reference: &str,
    start: u64,
    end: u64,
) -> Result<JunctionMotif> {
    let left = index.get_stretch(reference, start.saturating_sub(1), 2)?;
    let right = index.get_stretch(reference, end.saturating_sub(2), 2)?;
    Ok(JunctionMotif { left, right })
}

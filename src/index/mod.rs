// Reference index reading
//
// - layout: `.1.ebwt` / `.3.ebwt` parsing into per-reference run tables
// - packed: the 2-bit packed store of unambiguous bases (`.4.ebwt`)
// - reference: the assembled index and stretch retrieval

mod cursor;
pub mod layout;
pub mod packed;
pub mod reference;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use layout::{ReferenceLayout, RunRecord};
pub use packed::PackedSequence;
pub use reference::ReferenceIndex;

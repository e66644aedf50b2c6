pub mod defaults;
pub mod error; // IndexError taxonomy
pub mod index; // Index parsing, packed store, stretch retrieval
pub mod motif; // Splice-site dinucleotide calls
pub mod naming; // Length-ordered sortable reference ordinals
pub mod regions; // BED-like region lists for batch retrieval

pub use error::{IndexError, Result};
pub use index::{PackedSequence, ReferenceIndex, ReferenceLayout, RunRecord};
pub use naming::NamingTable;

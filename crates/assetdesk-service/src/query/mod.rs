//! Sorting, filtering, and selection over listing snapshots.
//!
//! Everything here is a pure function of its inputs.

pub mod entry;
pub mod filter;
pub mod selection;
pub mod sort;

pub use entry::{EntryId, ListEntry, Listable};
pub use filter::{filter, search, DateRange, FilterCriteria, SizeRange};
pub use selection::SelectionState;
pub use sort::sort;

//! Derived tables.
//!
//! Secondary-lookup views over a base `Table`. They own no storage of
//! their own: every call composes relations and delegates to the base
//! table's filter.

mod map;
mod multimap;
mod multimap_mk;


// re-exports
pub use map::MapTable;
pub use multimap::MultimapTable;
pub use multimap_mk::MultimapMkTable;

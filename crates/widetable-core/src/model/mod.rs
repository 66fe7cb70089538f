//! Static shape metadata: column types, key declarations and the per-table
//! snapshot built once when a table is constructed.

pub mod column;
pub mod info;
pub mod keys;

#[cfg(test)]
mod tests;

//! Core runtime for WideTable: values, record traits, key metadata, statement
//! generation, table façades, derived lookup tables, the row scanner and an
//! in-memory execution engine.
#![warn(unreachable_pub)]

extern crate self as widetable;

#[macro_use]
mod macros;

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod traits;
pub mod types;
pub mod value;

pub use error::Error;

///
/// CONSTANTS
///

/// Placeholder bound in place of an empty text/blob clustering value.
///
/// The store rejects empty clustering components, so writes substitute this
/// marker and the scanner rewrites it back to empty on the way out.
pub const CLUSTERING_SENTINEL: &str = "<widetable.clustering-sentinel>";

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No executors, stores or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{
            KeySpace,
            options::{ClusteringOrderColumn, ColumnDirection, Compressor, Options},
            relation::{Relation, eq, gt, gte, in_list, lt, lte},
            table::{Filter, Table},
        },
        model::keys::Keys,
        traits::{FieldValue, Record, ToFields},
        types::{Counter, Timestamp},
        value::{FieldMap, Value},
    };
}

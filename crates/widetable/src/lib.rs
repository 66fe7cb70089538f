//! ## Crate layout
//! - `core`: values, record traits, keys, statements, tables, derived
//!   tables, the row scanner and the in-memory execution engine.
//! - `Record`: derive macro building a record's field table.
//!
//! The `prelude` module carries the vocabulary needed to declare records
//! and work with tables.

pub use widetable_core as core;

// module paths used by derive output
pub use widetable_core::{
    CLUSTERING_SENTINEL, Error, config, db, error, model, obs, traits, types, value,
};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Macros
//

#[doc(hidden)]
pub use widetable_core::__impl_record_shapes;
pub use widetable_core::field_map;
pub use widetable_derive::Record;

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        db::{
            KeySpace, Op,
            derived::{MapTable, MultimapMkTable, MultimapTable},
            executor::{QueryExecutor, RowIter},
            options::{ClusteringOrderColumn, ColumnDirection, Compressor, Options},
            relation::{Relation, eq, gt, gte, in_list, lt, lte},
            table::{Filter, Table},
        },
        model::keys::Keys,
        traits::{Destination as _, FieldValue as _, Record, ToFields as _},
        types::{Counter, Timestamp},
        value::{FieldMap, Value},
    };
    pub use crate::{Record, field_map};
}

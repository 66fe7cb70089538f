use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

///
/// ColumnDirection
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnDirection {
    #[default]
    Asc,
    Desc,
}

impl Display for ColumnDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("ASC"),
            Self::Desc => f.write_str("DESC"),
        }
    }
}

///
/// ClusteringOrderColumn
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ClusteringOrderColumn {
    pub direction: ColumnDirection,
    pub column: String,
}

impl ClusteringOrderColumn {
    #[must_use]
    pub fn new(direction: ColumnDirection, column: impl AsRef<str>) -> Self {
        Self {
            direction,
            column: column.as_ref().to_ascii_lowercase(),
        }
    }
}

impl Display for ClusteringOrderColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.direction)
    }
}

///
/// Compressor
///
/// Table compression hint applied at create time.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compressor {
    Deflate,
    Lz4,
    Snappy,
    Zstd,
}

impl Compressor {
    #[must_use]
    pub const fn class(self) -> &'static str {
        match self {
            Self::Deflate => "DeflateCompressor",
            Self::Lz4 => "LZ4Compressor",
            Self::Snappy => "SnappyCompressor",
            Self::Zstd => "ZstdCompressor",
        }
    }
}

///
/// Options
///
/// Per-call overrides for a table chain. Unset values inherit from the base
/// they are merged over; `merge` never mutates either side.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Overrides the declared table name.
    pub table_name: Option<String>,

    /// Caps returned rows.
    pub limit: Option<u32>,

    /// Result order, and the create-time clustering order.
    pub clustering_order: Vec<ClusteringOrderColumn>,

    pub compact_storage: bool,
    pub compressor: Option<Compressor>,

    /// Row time-to-live for inserts and updates, in seconds.
    pub ttl: Option<u32>,

    /// Column projection for reads; empty selects every table column.
    pub select: Vec<String>,

    pub allow_filtering: bool,
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    /// A zero limit means "no limit".
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = if limit == 0 { None } else { Some(limit) };
        self
    }

    #[must_use]
    pub fn with_clustering_order(
        mut self,
        order: impl IntoIterator<Item = ClusteringOrderColumn>,
    ) -> Self {
        self.clustering_order = order.into_iter().collect();
        self
    }

    #[must_use]
    pub const fn with_compact_storage(mut self) -> Self {
        self.compact_storage = true;
        self
    }

    #[must_use]
    pub const fn with_compressor(mut self, compressor: Compressor) -> Self {
        self.compressor = Some(compressor);
        self
    }

    #[must_use]
    pub const fn with_ttl(mut self, seconds: u32) -> Self {
        self.ttl = Some(seconds);
        self
    }

    #[must_use]
    pub fn with_select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.select = fields
            .into_iter()
            .map(|field| field.as_ref().to_ascii_lowercase())
            .collect();
        self
    }

    #[must_use]
    pub const fn with_allow_filtering(mut self) -> Self {
        self.allow_filtering = true;
        self
    }

    /// Layer `over` on top of `self`: every option set in `over` wins,
    /// flags are sticky once set on either side.
    #[must_use]
    pub fn merge(&self, over: &Self) -> Self {
        Self {
            table_name: over.table_name.clone().or_else(|| self.table_name.clone()),
            limit: over.limit.or(self.limit),
            clustering_order: if over.clustering_order.is_empty() {
                self.clustering_order.clone()
            } else {
                over.clustering_order.clone()
            },
            compact_storage: self.compact_storage || over.compact_storage,
            compressor: over.compressor.or(self.compressor),
            ttl: over.ttl.or(self.ttl),
            select: if over.select.is_empty() {
                self.select.clone()
            } else {
                over.select.clone()
            },
            allow_filtering: self.allow_filtering || over.allow_filtering,
        }
    }
}

///
/// TESTS
///

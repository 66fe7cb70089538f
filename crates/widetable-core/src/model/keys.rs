///
/// Keys
///
/// Primary-key declaration for one table.
///
/// - `partition_keys` decide row placement and must be non-empty.
/// - `clustering_columns` order rows inside a partition and may be empty.
/// - `compound` renders a key without clustering columns as
///   `PRIMARY KEY (a, b)` (first key partitions) instead of the composite
///   partition `PRIMARY KEY ((a, b))`.
///
/// Names are lower-cased on construction; order is significant.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Keys {
    pub partition_keys: Vec<String>,
    pub clustering_columns: Vec<String>,
    pub compound: bool,
}

impl Keys {
    /// Declare the partition keys.
    #[must_use]
    pub fn new<I, S>(partition_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            partition_keys: lower(partition_keys),
            clustering_columns: Vec::new(),
            compound: false,
        }
    }

    /// Declare the clustering columns.
    #[must_use]
    pub fn clustering<I, S>(mut self, clustering_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.clustering_columns = lower(clustering_columns);
        self
    }

    #[must_use]
    pub const fn with_compound(mut self) -> Self {
        self.compound = true;
        self
    }

    /// Partition keys followed by clustering columns, in declared order.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.partition_keys
            .iter()
            .chain(&self.clustering_columns)
            .map(String::as_str)
    }

    #[must_use]
    pub fn is_key(&self, field: &str) -> bool {
        self.all().any(|key| key.eq_ignore_ascii_case(field))
    }

    #[must_use]
    pub fn is_clustering(&self, field: &str) -> bool {
        self.clustering_columns
            .iter()
            .any(|key| key.eq_ignore_ascii_case(field))
    }

    /// Re-normalize names that were assigned directly to the public fields.
    #[must_use]
    pub(crate) fn normalized(self) -> Self {
        Self {
            partition_keys: lower(self.partition_keys),
            clustering_columns: lower(self.clustering_columns),
            compound: self.compound,
        }
    }
}

fn lower<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| name.as_ref().to_ascii_lowercase())
        .collect()
}

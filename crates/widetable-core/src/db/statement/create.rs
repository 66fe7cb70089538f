use crate::{
    db::{
        options::{ClusteringOrderColumn, Compressor, Options},
        statement::{StatementError, qualified},
    },
    model::{column::ColumnType, info::TableInfo, keys::Keys},
};

///
/// CreateTableStatement
///

#[derive(Clone, Debug, PartialEq)]
pub struct CreateTableStatement {
    pub(crate) keyspace: String,
    pub(crate) table: String,
    columns: Vec<(String, ColumnType)>,
    keys: Keys,
    clustering_order: Vec<ClusteringOrderColumn>,
    compact_storage: bool,
    compressor: Option<Compressor>,
    if_not_exists: bool,
}

impl CreateTableStatement {
    /// Validate the table shape and build the statement.
    ///
    /// Fails when the keys do not fit the field set, an ordering column is
    /// not a clustering column, or a field has no known column type.
    pub fn new(
        info: &TableInfo,
        table: &str,
        options: &Options,
        if_not_exists: bool,
    ) -> Result<Self, StatementError> {
        let keys = info.keys();

        if keys.partition_keys.is_empty() {
            return Err(StatementError::NoPartitionKeys {
                table: table.to_string(),
            });
        }

        if let Some(key) = keys.all().find(|key| !info.has_field(key)) {
            return Err(StatementError::UnknownKey {
                table: table.to_string(),
                key: key.to_string(),
            });
        }

        if let Some(col) = options
            .clustering_order
            .iter()
            .find(|col| !keys.is_clustering(&col.column))
        {
            return Err(StatementError::InvalidClusteringOrder {
                table: table.to_string(),
                column: col.column.clone(),
            });
        }

        let columns = info
            .fields()
            .iter()
            .zip(info.field_types())
            .map(|(field, ty)| match ty {
                Some(ty) => Ok((field.clone(), ty.clone())),
                None => Err(StatementError::UnknownColumnType {
                    table: table.to_string(),
                    field: field.clone(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            keyspace: info.keyspace().to_string(),
            table: table.to_string(),
            columns,
            keys: keys.clone(),
            clustering_order: options.clustering_order.clone(),
            compact_storage: options.compact_storage,
            compressor: options.compressor,
            if_not_exists,
        })
    }

    #[must_use]
    pub fn columns(&self) -> &[(String, ColumnType)] {
        &self.columns
    }

    #[must_use]
    pub const fn keys(&self) -> &Keys {
        &self.keys
    }

    #[must_use]
    pub fn clustering_order(&self) -> &[ClusteringOrderColumn] {
        &self.clustering_order
    }

    #[must_use]
    pub const fn if_not_exists(&self) -> bool {
        self.if_not_exists
    }

    #[must_use]
    pub fn query(&self) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|(field, ty)| format!("{field} {ty}"))
            .collect();
        lines.push(self.primary_key());

        let mut cql = format!(
            "CREATE TABLE {}{} ({})",
            if self.if_not_exists {
                "IF NOT EXISTS "
            } else {
                ""
            },
            qualified(&self.keyspace, &self.table),
            lines.join(", ")
        );

        let with = self.table_options();
        if !with.is_empty() {
            cql.push_str(" WITH ");
            cql.push_str(&with.join(" AND "));
        }

        cql
    }

    fn primary_key(&self) -> String {
        let partition = self.keys.partition_keys.join(", ");

        if self.keys.clustering_columns.is_empty() {
            if self.keys.compound {
                return format!("PRIMARY KEY ({partition})");
            }
            return format!("PRIMARY KEY (({partition}))");
        }

        format!(
            "PRIMARY KEY (({partition}), {})",
            self.keys.clustering_columns.join(", ")
        )
    }

    fn table_options(&self) -> Vec<String> {
        let mut with = Vec::new();

        if !self.clustering_order.is_empty() {
            let order: Vec<String> = self
                .clustering_order
                .iter()
                .map(ToString::to_string)
                .collect();
            with.push(format!("CLUSTERING ORDER BY ({})", order.join(", ")));
        }
        if self.compact_storage {
            with.push("COMPACT STORAGE".to_string());
        }
        if let Some(compressor) = self.compressor {
            with.push(format!("compression = {{'class': '{}'}}", compressor.class()));
        }

        with
    }
}

///
/// DropTableStatement
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DropTableStatement {
    pub(crate) keyspace: String,
    pub(crate) table: String,
}

impl DropTableStatement {
    #[must_use]
    pub fn new(keyspace: &str, table: &str) -> Self {
        Self {
            keyspace: keyspace.to_string(),
            table: table.to_string(),
        }
    }

    #[must_use]
    pub fn query(&self) -> String {
        format!(
            "DROP TABLE IF EXISTS {}",
            qualified(&self.keyspace, &self.table)
        )
    }
}

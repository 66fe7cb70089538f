use crate::{
    db::{
        options::ClusteringOrderColumn,
        relation::Relation,
        statement::{qualified, relation_values, where_clause},
    },
    value::Value,
};

///
/// SelectStatement
///
/// Row-returning read. `fields` is the projection and also the field order
/// the scanner walks when decoding each row.
///

#[derive(Clone, Debug, PartialEq)]
pub struct SelectStatement {
    pub(crate) keyspace: String,
    pub(crate) table: String,
    fields: Vec<String>,
    relations: Vec<Relation>,
    order_by: Vec<ClusteringOrderColumn>,
    limit: Option<u32>,
    allow_filtering: bool,
}

impl SelectStatement {
    #[must_use]
    pub fn new<I, S>(keyspace: &str, table: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keyspace: keyspace.to_string(),
            table: table.to_string(),
            fields: fields
                .into_iter()
                .map(|f| f.as_ref().to_ascii_lowercase())
                .collect(),
            relations: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            allow_filtering: false,
        }
    }

    #[must_use]
    pub fn with_relations(mut self, relations: Vec<Relation>) -> Self {
        self.relations = relations;
        self
    }

    #[must_use]
    pub fn with_order_by(mut self, order_by: Vec<ClusteringOrderColumn>) -> Self {
        self.order_by = order_by;
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub const fn with_allow_filtering(mut self, allow: bool) -> Self {
        self.allow_filtering = allow;
        self
    }

    #[must_use]
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    #[must_use]
    pub fn order_by(&self) -> &[ClusteringOrderColumn] {
        &self.order_by
    }

    #[must_use]
    pub const fn limit(&self) -> Option<u32> {
        self.limit
    }

    #[must_use]
    pub fn query(&self) -> String {
        let projection = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(", ")
        };

        let mut cql = format!(
            "SELECT {projection} FROM {}{}",
            qualified(&self.keyspace, &self.table),
            where_clause(&self.relations),
        );

        if !self.order_by.is_empty() {
            let order: Vec<String> = self.order_by.iter().map(ToString::to_string).collect();
            cql.push_str(&format!(" ORDER BY {}", order.join(", ")));
        }
        if let Some(limit) = self.limit {
            cql.push_str(&format!(" LIMIT {limit}"));
        }
        if self.allow_filtering {
            cql.push_str(" ALLOW FILTERING");
        }

        cql
    }

    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        relation_values(&self.relations).collect()
    }
}

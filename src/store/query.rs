//! Read descriptions understood by every [`crate::store::Store`].

use serde_json::Value;

/// Which columns a query returns.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selection {
    /// `select *`
    #[default]
    All,
    Columns(Vec<String>),
}

/// A row predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Case-insensitive LIKE with `%`/`_` wildcards.
    ILike { column: String, pattern: String },
    Eq { column: String, value: Value },
    In { column: String, values: Vec<Value> },
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::ILike { column, .. } | Filter::Eq { column, .. } | Filter::In { column, .. } => {
                column
            }
        }
    }
}

/// Sort order on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// One read against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub selection: Selection,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    /// Start a `select *` query on a table.
    pub fn table<S: Into<String>>(table: S) -> Self {
        Query {
            table: table.into(),
            selection: Selection::All,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Restrict the returned columns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection = Selection::Columns(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn ilike<C: Into<String>, P: Into<String>>(mut self, column: C, pattern: P) -> Self {
        self.filters.push(Filter::ILike {
            column: column.into(),
            pattern: pattern.into(),
        });
        self
    }

    pub fn eq<C: Into<String>, V: Into<Value>>(mut self, column: C, value: V) -> Self {
        self.filters.push(Filter::Eq {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn is_in<C, I, V>(mut self, column: C, values: I) -> Self
    where
        C: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filters.push(Filter::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn order_by<C: Into<String>>(mut self, column: C, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True for an unfiltered `limit 1` read, the shape used to sample a
    /// table's columns.
    pub fn is_sample(&self) -> bool {
        self.filters.is_empty() && self.limit == Some(1)
    }

    /// Human-readable description for logs.
    pub fn description(&self) -> String {
        let mut parts = vec![format!("table:{}", self.table)];
        for filter in &self.filters {
            parts.push(match filter {
                Filter::ILike { column, pattern } => format!("{column} ilike '{pattern}'"),
                Filter::Eq { column, value } => format!("{column} = {value}"),
                Filter::In { column, values } => format!("{column} in [{}]", values.len()),
            });
        }
        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            parts.push(format!("order:{} {}", order.column, direction));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("limit:{limit}"));
        }
        format!("Query({})", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_builder() {
        let query = Query::table("syn_words")
            .columns(["hitza", "sinonimoak"])
            .ilike("hitza", "etx%")
            .eq("active", true)
            .order_by("hitza", true)
            .limit(200);

        assert_eq!(query.table, "syn_words");
        assert_eq!(
            query.selection,
            Selection::Columns(vec!["hitza".to_string(), "sinonimoak".to_string()])
        );
        assert_eq!(query.filters.len(), 2);
        assert_eq!(query.filters[1].column(), "active");
        assert_eq!(query.limit, Some(200));
        assert!(!query.is_sample());
    }

    #[test]
    fn test_sample_shape() {
        assert!(Query::table("diccionario").limit(1).is_sample());
        assert!(!Query::table("diccionario").limit(2).is_sample());
    }

    #[test]
    fn test_description() {
        let query = Query::table("t").is_in("ref", vec![json!("1"), json!("2")]).limit(5);
        assert_eq!(query.description(), "Query(table:t, ref in [2], limit:5)");
    }
}

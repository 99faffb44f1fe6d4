use std::cmp::Ordering;

use serde_json::Value;

use crate::db::Row;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Column projection, filters, ordering and limit for a table-scoped call.
///
/// Used as-is for selects and as the row filter for updates and deletes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub columns: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = Some(columns.to_string());
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn is_in<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filters.push(Filter::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn order(mut self, column: &str) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending: true,
        });
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending: false,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|filter| match filter {
            Filter::Eq(column, value) => row.get(column).is_some_and(|v| v == value),
            Filter::In(column, values) => row.get(column).is_some_and(|v| values.contains(v)),
        })
    }

    /// Sorts rows in place. Nulls sort last, as Postgres does for ascending order.
    pub fn sort(&self, rows: &mut [Row]) {
        if self.order.is_empty() {
            return;
        }
        rows.sort_by(|a, b| {
            for order in &self.order {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column));
                let ordering = if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    /// Keeps only the projected columns. `*` or no projection keeps everything.
    pub fn project(&self, row: Row) -> Row {
        let Some(columns) = self.columns.as_deref() else {
            return row;
        };
        let wanted: Vec<&str> = columns.split(',').map(str::trim).collect();
        if wanted.contains(&"*") {
            return row;
        }
        row.into_iter()
            .filter(|(key, _)| wanted.contains(&key.as_str()))
            .collect()
    }

    /// PostgREST query-string parameters for this query.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(columns) = &self.columns {
            params.push(("select".to_string(), columns.replace(' ', "")));
        }
        for filter in &self.filters {
            match filter {
                Filter::Eq(column, value) => {
                    params.push((column.clone(), format!("eq.{}", scalar(value))));
                }
                Filter::In(column, values) => {
                    let list: Vec<String> = values.iter().map(quoted).collect();
                    params.push((column.clone(), format!("in.({})", list.join(","))));
                }
            }
        }
        if !self.order.is_empty() {
            let order: Vec<String> = self
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
                .collect();
            params.push(("order".to_string(), order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn quoted(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        other => scalar(other),
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => Row::new(),
        }
    }

    #[test]
    fn renders_postgrest_params() {
        let query = Query::new()
            .columns("id, category")
            .eq("wedding_id", "w1")
            .is_in("category", ["Hair", "DJ"])
            .order("name")
            .limit(1);
        assert_eq!(
            query.to_params(),
            vec![
                ("select".to_string(), "id,category".to_string()),
                ("wedding_id".to_string(), "eq.w1".to_string()),
                ("category".to_string(), "in.(\"Hair\",\"DJ\")".to_string()),
                ("order".to_string(), "name.asc".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn filters_and_sorts_rows() {
        let query = Query::new().eq("wedding_id", "w1").order("name");
        let mut rows = vec![
            row(json!({"name": "Zoe", "wedding_id": "w1"})),
            row(json!({"name": null, "wedding_id": "w1"})),
            row(json!({"name": "Anna", "wedding_id": "w1"})),
            row(json!({"name": "Bob", "wedding_id": "w2"})),
        ];
        rows.retain(|r| query.matches(r));
        query.sort(&mut rows);
        let names: Vec<_> = rows.iter().map(|r| r["name"].clone()).collect();
        assert_eq!(names, vec![json!("Anna"), json!("Zoe"), Value::Null]);
    }

    #[test]
    fn projection_keeps_listed_columns() {
        let query = Query::new().columns("id,name");
        let projected = query.project(row(json!({"id": "g1", "name": "Anna", "email": "a@x"})));
        assert_eq!(projected.len(), 2);
        assert!(!projected.contains_key("email"));
    }
}

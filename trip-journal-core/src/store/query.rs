//! Query constraints understood by every document store.

use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

use super::Document;

/// Sort direction for [`Constraint::OrderBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ascending => write!(f, "asc"),
            Direction::Descending => write!(f, "desc"),
        }
    }
}

/// A single composable query constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Keep documents whose top-level `field` equals `value`
    WhereEq { field: String, value: Value },
    /// Sort by a top-level field
    OrderBy { field: String, direction: Direction },
    /// Return at most this many documents
    Limit(usize),
}

impl Constraint {
    pub fn where_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Constraint::WhereEq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn order_by(field: impl Into<String>, direction: Direction) -> Self {
        Constraint::OrderBy {
            field: field.into(),
            direction,
        }
    }

    pub fn limit(n: usize) -> Self {
        Constraint::Limit(n)
    }
}

/// Constraints folded into filters, sort keys and a limit.
///
/// Filters are conjunctive, sort keys apply in the order given and the last
/// limit wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub sorts: Vec<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn from_constraints(constraints: &[Constraint]) -> Self {
        let mut query = Query::default();
        for constraint in constraints {
            match constraint {
                Constraint::WhereEq { field, value } => {
                    query.filters.push((field.clone(), value.clone()))
                }
                Constraint::OrderBy { field, direction } => {
                    query.sorts.push((field.clone(), *direction))
                }
                Constraint::Limit(n) => query.limit = Some(*n),
            }
        }
        query
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|(field, expected)| {
            let actual = doc.get(field).unwrap_or(&Value::Null);
            compare_values(actual, expected) == Ordering::Equal
        })
    }

    /// Filter, sort and truncate a set of documents in memory.
    pub fn apply<K>(&self, docs: impl IntoIterator<Item = (K, Document)>) -> Vec<(K, Document)> {
        let mut selected: Vec<(K, Document)> =
            docs.into_iter().filter(|(_, doc)| self.matches(doc)).collect();

        if !self.sorts.is_empty() {
            // stable sort keeps storage order between equal keys
            selected.sort_by(|(_, a), (_, b)| self.compare(a, b));
        }
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }

    fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for (field, direction) in &self.sorts {
            let left = a.get(field).unwrap_or(&Value::Null);
            let right = b.get(field).unwrap_or(&Value::Null);
            let ordering = match direction {
                Direction::Ascending => compare_values(left, right),
                Direction::Descending => compare_values(right, left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: type rank first, then value.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.total_cmp(&y)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ordering = compare_values(left, right);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            let mut left: Vec<_> = x.iter().collect();
            let mut right: Vec<_> = y.iter().collect();
            left.sort_by(|a, b| a.0.cmp(b.0));
            right.sort_by(|a, b| a.0.cmp(b.0));
            for ((lk, lv), (rk, rv)) in left.iter().zip(right.iter()) {
                let ordering = lk.cmp(rk).then_with(|| compare_values(lv, rv));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            left.len().cmp(&right.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_from_constraints_last_limit_wins() {
        let query = Query::from_constraints(&[
            Constraint::limit(10),
            Constraint::where_eq("tripId", "t1"),
            Constraint::order_by("orderNumber", Direction::Ascending),
            Constraint::limit(2),
        ]);

        assert_eq!(query.filters, vec![("tripId".to_string(), json!("t1"))]);
        assert_eq!(
            query.sorts,
            vec![("orderNumber".to_string(), Direction::Ascending)]
        );
        assert_eq!(query.limit, Some(2));
    }

    #[test]
    fn test_apply_filters_sorts_and_limits() {
        let docs = vec![
            ("a", doc(json!({"tripId": "t1", "orderNumber": 3}))),
            ("b", doc(json!({"tripId": "t2", "orderNumber": 1}))),
            ("c", doc(json!({"tripId": "t1", "orderNumber": 1}))),
            ("d", doc(json!({"tripId": "t1", "orderNumber": 2}))),
        ];

        let query = Query::from_constraints(&[
            Constraint::where_eq("tripId", "t1"),
            Constraint::order_by("orderNumber", Direction::Ascending),
            Constraint::limit(2),
        ]);
        let keys: Vec<&str> = query.apply(docs).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["c", "d"]);
    }

    #[test]
    fn test_secondary_sort_breaks_ties() {
        let docs = vec![
            ("a", doc(json!({"category": "food", "amount": 5}))),
            ("b", doc(json!({"category": "fuel", "amount": 50}))),
            ("c", doc(json!({"category": "food", "amount": 20}))),
        ];

        let query = Query::from_constraints(&[
            Constraint::order_by("category", Direction::Ascending),
            Constraint::order_by("amount", Direction::Descending),
        ]);
        let keys: Vec<&str> = query.apply(docs).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_missing_field_sorts_as_null() {
        let docs = vec![
            ("a", doc(json!({"checkIn": "2025-03-02"}))),
            ("b", doc(json!({}))),
        ];

        let query = Query::from_constraints(&[Constraint::order_by("checkIn", Direction::Ascending)]);
        let keys: Vec<&str> = query.apply(docs).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_integer_and_float_compare_numerically() {
        assert_eq!(compare_values(&json!(2), &json!(2.0)), Ordering::Equal);
        assert_eq!(compare_values(&json!(10), &json!(9.5)), Ordering::Greater);
        assert_eq!(compare_values(&json!(-1), &json!(3)), Ordering::Less);
    }

    #[test]
    fn test_type_rank_orders_mixed_values() {
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(100), &json!("1")), Ordering::Less);
        assert_eq!(compare_values(&json!("z"), &json!([])), Ordering::Less);
    }
}

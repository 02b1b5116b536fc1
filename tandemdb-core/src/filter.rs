//! Filter expressions over document metadata.
//!
//! Filters narrow the documents a metadata-store scan visits, e.g. which
//! documents `update_embeddings` re-embeds. Similarity queries do not apply
//! them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;
use crate::meta::Meta;

/// A filter expression that can be evaluated against metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub(crate) condition: FilterCondition,
}

impl Filter {
    /// Creates a filter for a specific field.
    ///
    /// # Example
    ///
    /// ```
    /// use tandemdb_core::Filter;
    ///
    /// let filter = Filter::field("category").eq("faq");
    /// ```
    pub fn field(name: &str) -> FieldFilter {
        FieldFilter {
            field_name: name.to_string(),
        }
    }

    /// Creates a filter from a condition.
    pub fn from_condition(condition: FilterCondition) -> Self {
        Self { condition }
    }

    /// Builds the classic `{field: [allowed values]}` filter: every listed
    /// field must hold one of its allowed values.
    ///
    /// Returns `None` for an empty map, which means "no filter".
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use tandemdb_core::{Filter, Meta};
    ///
    /// let mut lists = HashMap::new();
    /// lists.insert("name".to_string(), vec!["some".into(), "more".into()]);
    /// let filter = Filter::from_value_lists(lists).unwrap();
    ///
    /// assert!(filter.matches(&Meta::new().with_field("name", "more")));
    /// assert!(!filter.matches(&Meta::new().with_field("name", "other")));
    /// ```
    pub fn from_value_lists(lists: HashMap<String, Vec<Value>>) -> Option<Self> {
        let mut fields: Vec<_> = lists.into_iter().collect();
        // Deterministic shape regardless of map iteration order.
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        fields
            .into_iter()
            .map(|(field, values)| Filter::from_condition(FilterCondition::In(field, values)))
            .reduce(Filter::and)
    }

    /// Combines this filter with another using AND.
    pub fn and(self, other: Filter) -> Self {
        Self {
            condition: FilterCondition::And(Box::new(self.condition), Box::new(other.condition)),
        }
    }

    /// Combines this filter with another using OR.
    pub fn or(self, other: Filter) -> Self {
        Self {
            condition: FilterCondition::Or(Box::new(self.condition), Box::new(other.condition)),
        }
    }

    /// Negates this filter.
    #[allow(clippy::should_implement_trait)]
    pub fn negate(self) -> Self {
        Self {
            condition: FilterCondition::Not(Box::new(self.condition)),
        }
    }

    /// Evaluates the filter against metadata.
    pub fn matches(&self, meta: &Meta) -> bool {
        self.condition.matches(meta)
    }

    /// Evaluates the filter against a document's metadata.
    #[inline]
    pub fn matches_document(&self, document: &Document) -> bool {
        self.matches(&document.meta)
    }
}

/// Builder for field-specific filter conditions.
#[derive(Debug)]
pub struct FieldFilter {
    field_name: String,
}

impl FieldFilter {
    /// Field equals value.
    pub fn eq<V: Into<Value>>(self, value: V) -> Filter {
        Filter::from_condition(FilterCondition::Eq(self.field_name, value.into()))
    }

    /// Field not equals value.
    pub fn ne<V: Into<Value>>(self, value: V) -> Filter {
        Filter::from_condition(FilterCondition::Ne(self.field_name, value.into()))
    }

    /// Field greater than value.
    pub fn gt<V: Into<Value>>(self, value: V) -> Filter {
        Filter::from_condition(FilterCondition::Gt(self.field_name, value.into()))
    }

    /// Field greater than or equal to value.
    pub fn gte<V: Into<Value>>(self, value: V) -> Filter {
        Filter::from_condition(FilterCondition::Gte(self.field_name, value.into()))
    }

    /// Field less than value.
    pub fn lt<V: Into<Value>>(self, value: V) -> Filter {
        Filter::from_condition(FilterCondition::Lt(self.field_name, value.into()))
    }

    /// Field less than or equal to value.
    pub fn lte<V: Into<Value>>(self, value: V) -> Filter {
        Filter::from_condition(FilterCondition::Lte(self.field_name, value.into()))
    }

    /// Field value is in the given list.
    pub fn contained_in<V: Into<Value>>(self, values: Vec<V>) -> Filter {
        let values: Vec<Value> = values.into_iter().map(|v| v.into()).collect();
        Filter::from_condition(FilterCondition::In(self.field_name, values))
    }

    /// Field (as string) contains the given substring.
    pub fn contains(self, substring: &str) -> Filter {
        Filter::from_condition(FilterCondition::Contains(
            self.field_name,
            substring.to_string(),
        ))
    }

    /// Field exists.
    pub fn exists(self) -> Filter {
        Filter::from_condition(FilterCondition::Exists(self.field_name))
    }
}

/// The filter condition variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterCondition {
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    In(String, Vec<Value>),
    Contains(String, String),
    Exists(String),
    And(Box<FilterCondition>, Box<FilterCondition>),
    Or(Box<FilterCondition>, Box<FilterCondition>),
    Not(Box<FilterCondition>),
}

impl FilterCondition {
    /// Evaluates this condition against metadata.
    pub fn matches(&self, meta: &Meta) -> bool {
        match self {
            FilterCondition::Eq(field, value) => {
                meta.get(field).map(|v| v == value).unwrap_or(false)
            }
            FilterCondition::Ne(field, value) => {
                meta.get(field).map(|v| v != value).unwrap_or(true)
            }
            FilterCondition::Gt(field, value) => {
                compare_values(meta.get(field), value, |a, b| a > b)
            }
            FilterCondition::Gte(field, value) => {
                compare_values(meta.get(field), value, |a, b| a >= b)
            }
            FilterCondition::Lt(field, value) => {
                compare_values(meta.get(field), value, |a, b| a < b)
            }
            FilterCondition::Lte(field, value) => {
                compare_values(meta.get(field), value, |a, b| a <= b)
            }
            FilterCondition::In(field, values) => meta
                .get(field)
                .map(|v| values.contains(v))
                .unwrap_or(false),
            FilterCondition::Contains(field, substring) => meta
                .get_str(field)
                .map(|s| s.contains(substring))
                .unwrap_or(false),
            FilterCondition::Exists(field) => meta.contains_key(field),
            FilterCondition::And(a, b) => a.matches(meta) && b.matches(meta),
            FilterCondition::Or(a, b) => a.matches(meta) || b.matches(meta),
            FilterCondition::Not(c) => !c.matches(meta),
        }
    }
}

fn compare_values<F>(field_value: Option<&Value>, target: &Value, cmp: F) -> bool
where
    F: Fn(f64, f64) -> bool,
{
    match (field_value, target) {
        (Some(Value::Number(a)), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(av), Some(bv)) => cmp(av, bv),
            _ => false,
        },
        _ => false,
    }
}

//! Query parameter and filter accumulation, and canonical query rendering.
//!
//! # Design
//! `Query` holds two maps: plain parameters (`count`, `page`, ...) and
//! filters, which render under the reserved `filter` namespace. Arrays are
//! deduplicated and sorted the moment they are stored, so rendering is a
//! pure read. The rendered string has its `key=value` pairs sorted
//! lexically: two builders holding the same state always produce the same
//! URI, whatever order the values were set in.
//!
//! Wire format:
//! ```text
//! ?count=10&filter[display_name]=Ann&role[0]=member&role[1]=owner
//! ```

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Unreserved characters per RFC 3986 pass through; all else is escaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Name of the query namespace filters render under.
pub const FILTER_NAMESPACE: &str = "filter";

/// A single query value.
///
/// Ordering is total: booleans sort before integers, integers before text.
/// Integers compare numerically and text compares lexically, so arrays of
/// mixed values still sort the same way every time.
///
/// Unsigned values above `i64::MAX` are kept as their decimal text so they
/// render unchanged. There is no float variant: floats have no total order,
/// so callers pass them as text in the format they want on the wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

macro_rules! scalar_from_int {
    ($($t:ty),*) => {$(
        impl From<$t> for Scalar {
            fn from(n: $t) -> Self {
                Scalar::Int(i64::from(n))
            }
        }
    )*};
}

scalar_from_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! scalar_from_wide_int {
    ($($t:ty),*) => {$(
        impl From<$t> for Scalar {
            fn from(n: $t) -> Self {
                match i64::try_from(n) {
                    Ok(n) => Scalar::Int(n),
                    Err(_) => Scalar::Text(n.to_string()),
                }
            }
        }
    )*};
}

scalar_from_wide_int!(u64, usize, isize);

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

/// A stored parameter or filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    One(Scalar),
    /// Always deduplicated and sorted.
    Many(Vec<Scalar>),
}

impl ParamValue {
    /// Build an array value, deduplicating and sorting it.
    pub fn many<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        ParamValue::Many(sorted_unique(values.into_iter().map(Into::into).collect()))
    }

    fn into_vec(self) -> Vec<Scalar> {
        match self {
            ParamValue::One(s) => vec![s],
            ParamValue::Many(v) => v,
        }
    }

    fn normalized(self) -> Self {
        match self {
            ParamValue::Many(v) => ParamValue::Many(sorted_unique(v)),
            one => one,
        }
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::many(values)
    }
}

impl<T: Into<Scalar>, const N: usize> From<[T; N]> for ParamValue {
    fn from(values: [T; N]) -> Self {
        ParamValue::many(values)
    }
}

macro_rules! param_from_scalar {
    ($($t:ty),*) => {$(
        impl From<$t> for ParamValue {
            fn from(v: $t) -> Self {
                ParamValue::One(v.into())
            }
        }
    )*};
}

param_from_scalar!(
    Scalar, bool, &str, String, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize
);

fn sorted_unique(mut values: Vec<Scalar>) -> Vec<Scalar> {
    values.sort();
    values.dedup();
    values
}

/// Accumulated query state for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: BTreeMap<String, ParamValue>,
    filters: BTreeMap<String, ParamValue>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one parameter.
    ///
    /// Without `merge`, or when the key has no value yet, the new value
    /// replaces the old one. With `merge` and an existing value, both sides
    /// become arrays and the stored value is their sorted union.
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<ParamValue>, merge: bool) {
        let key = key.into();
        let value = value.into();
        let stored = match self.params.remove(&key) {
            Some(current) if merge => {
                let mut union = current.into_vec();
                union.extend(value.into_vec());
                let merged = ParamValue::Many(sorted_unique(union));
                tracing::trace!(key = %key, value = ?merged, "merged query parameter");
                merged
            }
            _ => value.normalized(),
        };
        self.params.insert(key, stored);
    }

    /// Apply `set_param` to every pair, in iteration order.
    pub fn set_params<I, K, V>(&mut self, pairs: I, merge: bool)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        for (key, value) in pairs {
            self.set_param(key, value, merge);
        }
    }

    /// Set one filter, replacing any previous value for the key.
    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.filters.insert(key.into(), value.into().normalized());
    }

    pub fn set_filters<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        for (key, value) in pairs {
            self.set_filter(key, value);
        }
    }

    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    pub fn filter(&self, key: &str) -> Option<&ParamValue> {
        self.filters.get(key)
    }

    pub fn params(&self) -> &BTreeMap<String, ParamValue> {
        &self.params
    }

    pub fn filters(&self) -> &BTreeMap<String, ParamValue> {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.filters.is_empty()
    }

    /// Render the canonical query string, `?` included, or `""` when there
    /// is nothing to render.
    ///
    /// A parameter named `filter` is shadowed by the filter namespace and
    /// never rendered.
    pub fn render(&self) -> String {
        let mut pairs = Vec::new();

        for (key, value) in &self.params {
            if key == FILTER_NAMESPACE {
                tracing::warn!("query parameter `filter` is shadowed by the filter namespace");
                continue;
            }
            push_pairs(&mut pairs, encode(key), value);
        }
        for (key, value) in &self.filters {
            push_pairs(&mut pairs, format!("{FILTER_NAMESPACE}[{}]", encode(key)), value);
        }

        pairs.sort();
        if pairs.is_empty() {
            String::new()
        } else {
            format!("?{}", pairs.join("&"))
        }
    }
}

fn push_pairs(pairs: &mut Vec<String>, key: String, value: &ParamValue) {
    match value {
        ParamValue::One(scalar) => pairs.push(format!("{key}={}", encode(&scalar.to_string()))),
        ParamValue::Many(values) => {
            for (i, scalar) in values.iter().enumerate() {
                pairs.push(format!("{key}[{i}]={}", encode(&scalar.to_string())));
            }
        }
    }
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_renders_nothing() {
        assert_eq!(Query::new().render(), "");
    }

    #[test]
    fn usize_and_u64_values_are_accepted() {
        let count: usize = 25;
        let page: u64 = 3;
        let mut query = Query::new();
        query.set_param("count", count, false);
        query.set_param("page", page, false);
        query.set_param("big", u64::MAX, false);
        assert_eq!(query.param("count"), Some(&ParamValue::One(Scalar::Int(25))));
        assert_eq!(
            query.render(),
            "?big=18446744073709551615&count=25&page=3"
        );
    }

    #[test]
    fn render_is_independent_of_insertion_order() {
        let mut first = Query::new();
        first.set_params([("b", 2), ("a", 1)], false);
        first.set_filters([("z", "x")]);

        let mut second = Query::new();
        second.set_filters([("z", "x")]);
        second.set_params([("a", 1), ("b", 2)], false);

        assert_eq!(first.render(), "?a=1&b=2&filter[z]=x");
        assert_eq!(first.render(), second.render());
    }

    #[test]
    fn merge_coerces_scalars_into_sorted_array() {
        let mut query = Query::new();
        query.set_param("key", 1, false);
        query.set_param("key", 2, true);
        assert_eq!(query.param("key"), Some(&ParamValue::many([1, 2])));

        query.set_param("key", vec![3, 2, 2], false);
        assert_eq!(
            query.param("key"),
            Some(&ParamValue::Many(vec![Scalar::Int(2), Scalar::Int(3)]))
        );
    }

    #[test]
    fn merge_without_prior_value_just_stores() {
        let mut query = Query::new();
        query.set_param("count", 10, true);
        assert_eq!(query.param("count"), Some(&ParamValue::One(Scalar::Int(10))));
    }

    #[test]
    fn merge_unions_arrays_without_duplicates() {
        let mut query = Query::new();
        query.set_param("tag", ["b", "a"], false);
        query.set_param("tag", ["c", "a"], true);
        assert_eq!(query.param("tag"), Some(&ParamValue::many(["a", "b", "c"])));
    }

    #[test]
    fn mixed_arrays_sort_numbers_before_text() {
        let value = ParamValue::many(vec![
            Scalar::from("b"),
            Scalar::from(10),
            Scalar::from("a"),
            Scalar::from(2),
            Scalar::from(true),
        ]);
        assert_eq!(
            value,
            ParamValue::Many(vec![
                Scalar::Bool(true),
                Scalar::Int(2),
                Scalar::Int(10),
                Scalar::Text("a".to_string()),
                Scalar::Text("b".to_string()),
            ])
        );
    }

    #[test]
    fn filters_replace_previous_value() {
        let mut query = Query::new();
        query.set_filter("display_name", "Ann");
        query.set_filter("display_name", "Bob");
        assert_eq!(query.render(), "?filter[display_name]=Bob");
    }

    #[test]
    fn arrays_render_with_indexed_brackets() {
        let mut query = Query::new();
        query.set_param("role", ["owner", "member"], false);
        query.set_filter("ids", [3, 1]);
        assert_eq!(
            query.render(),
            "?filter[ids][0]=1&filter[ids][1]=3&role[0]=member&role[1]=owner"
        );
    }

    #[test]
    fn values_and_keys_are_percent_encoded() {
        let mut query = Query::new();
        query.set_param("q", "a b&c=d", false);
        query.set_filter("mail host", "x@y.org");
        assert_eq!(query.render(), "?filter[mail%20host]=x%40y.org&q=a%20b%26c%3Dd");
    }

    #[test]
    fn filter_param_is_shadowed_by_namespace() {
        let mut query = Query::new();
        query.set_param("filter", "ignored", false);
        query.set_filter("a", 1);
        assert_eq!(query.render(), "?filter[a]=1");
    }

    #[test]
    fn empty_array_renders_no_pairs() {
        let mut query = Query::new();
        query.set_param("role", Vec::<&str>::new(), false);
        assert!(!query.is_empty());
        assert_eq!(query.render(), "");
    }
}

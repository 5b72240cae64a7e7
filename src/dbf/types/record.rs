//! Record shapes and the builder capability that produces them.

use std::collections::HashMap;

use super::value::Value;

/// Default record shape: field values keyed by name, in on-disk column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Self { fields }
    }

    /// Looks up a value by field name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn into_inner(self) -> Vec<(String, Value)> {
        self.fields
    }
}

impl std::ops::Index<&str> for Record {
    type Output = Value;

    fn index(&self, name: &str) -> &Value {
        match self.get(name) {
            Some(value) => value,
            None => panic!("no field named {:?} in record", name),
        }
    }
}

/// Builds the externally visible record from the decoded `(name, value)` pairs.
///
/// Implemented for [`DefaultBuilder`], [`MapBuilder`], [`PairsBuilder`] and any
/// `Fn(Vec<(String, Value)>) -> R` closure.
pub trait RecordBuilder {
    type Output;

    fn build(&self, fields: Vec<(String, Value)>) -> Self::Output;
}

/// Produces [`Record`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBuilder;

impl RecordBuilder for DefaultBuilder {
    type Output = Record;

    fn build(&self, fields: Vec<(String, Value)>) -> Record {
        Record::new(fields)
    }
}

/// Produces an unordered `HashMap`; a duplicate field name keeps the last value.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapBuilder;

impl RecordBuilder for MapBuilder {
    type Output = HashMap<String, Value>;

    fn build(&self, fields: Vec<(String, Value)>) -> Self::Output {
        fields.into_iter().collect()
    }
}

/// Hands back the raw pair list.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairsBuilder;

impl RecordBuilder for PairsBuilder {
    type Output = Vec<(String, Value)>;

    fn build(&self, fields: Vec<(String, Value)>) -> Self::Output {
        fields
    }
}

impl<F, R> RecordBuilder for F
where
    F: Fn(Vec<(String, Value)>) -> R,
{
    type Output = R;

    fn build(&self, fields: Vec<(String, Value)>) -> R {
        self(fields)
    }
}

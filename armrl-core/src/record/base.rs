//! Key-value records of training metrics.
use crate::error::ArmRlError;
use chrono::prelude::{DateTime, Local};
use std::collections::{
    hash_map::{IntoIter, Iter, Keys},
    HashMap,
};

/// Value stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single value, typically a loss or a return.
    Scalar(f32),

    /// A timestamp.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array, e.g., an observation.
    Array1(Vec<f32>),

    /// A text value.
    String(String),
}

/// A container of named values.
///
/// ```rust
/// use armrl_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("loss_critic", 0.5);
/// record.insert("eps", RecordValue::Scalar(0.9));
/// assert_eq!(record.get_scalar("eps").unwrap(), 0.9);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Returns an iterator that consumes the record.
    pub fn into_iter_in_record(self) -> IntoIter<String, RecordValue> {
        self.0.into_iter()
    }

    /// Gets a reference to the value of the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges two records. Values of `record` win on duplicate keys.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Merges another record into this one in place.
    pub fn merge_inplace(&mut self, record: Record) {
        self.0.extend(record.0);
    }

    /// Gets a scalar value.
    pub fn get_scalar(&self, k: &str) -> Result<f32, ArmRlError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(ArmRlError::RecordValueTypeError("Scalar".to_string())),
            None => Err(ArmRlError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a 1-dimensional array.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, ArmRlError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v.clone()),
            Some(_) => Err(ArmRlError::RecordValueTypeError("Array1".to_string())),
            None => Err(ArmRlError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a string value.
    pub fn get_string(&self, k: &str) -> Result<String, ArmRlError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(ArmRlError::RecordValueTypeError("String".to_string())),
            None => Err(ArmRlError::RecordKeyError(k.to_string())),
        }
    }

    /// Returns `true` if the record has no value.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_errors() {
        let mut record = Record::from_scalar("a", 1.0);
        record.insert("b", RecordValue::String("x".into()));
        assert_eq!(record.get_scalar("a"), Ok(1.0));
        assert_eq!(
            record.get_scalar("b"),
            Err(ArmRlError::RecordValueTypeError("Scalar".into()))
        );
        assert_eq!(
            record.get_scalar("c"),
            Err(ArmRlError::RecordKeyError("c".into()))
        );
    }

    #[test]
    fn test_merge_overwrites() {
        let r = Record::from_scalar("a", 1.0).merge(Record::from_scalar("a", 2.0));
        assert_eq!(r.get_scalar("a"), Ok(2.0));
        assert_eq!(r.len(), 1);
    }
}

//! Record storage and aggregation.
use super::{Record, RecordValue};
use log::warn;
use std::collections::HashSet;
use xxhash_rust::xxh3::Xxh3Builder;

/// Stores records and aggregates them on request.
///
/// Scalars seen more than once are summarized as `<key>_min`, `<key>_max`,
/// `<key>_mean` and `<key>_median`. For other value types the most recent
/// value is kept.
#[derive(Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &[f32]) -> f32 {
    vs.iter().copied().fold(f32::INFINITY, f32::min)
}

fn max(vs: &[f32]) -> f32 {
    vs.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

fn mean(vs: &[f32]) -> f32 {
    vs.iter().sum::<f32>() / vs.len() as f32
}

fn median(mut vs: Vec<f32>) -> f32 {
    vs.sort_by(|x, y| x.total_cmp(y));
    vs[vs.len() / 2]
}

impl RecordStorage {
    /// Creates a new empty storage.
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn get_keys(&self) -> HashSet<String, Xxh3Builder> {
        let mut keys = HashSet::<String, Xxh3Builder>::default();
        for record in self.data.iter() {
            for k in record.keys() {
                keys.insert(k.clone());
            }
        }
        keys
    }

    fn latest(&self, key: &str) -> Option<&RecordValue> {
        self.data.iter().rev().find_map(|r| r.get(key))
    }

    fn values(&self, key: &str) -> Vec<f32> {
        self
            .data
            .iter()
            .filter_map(|record| match record.get(key) {
                Some(RecordValue::Scalar(v)) => Some(*v),
                Some(v) => {
                    warn!("Non-scalar value for {} was ignored: {:?}", key, v);
                    None
                }
                None => None,
            })
            .collect()
    }

    fn scalar(&self, key: &str) -> Record {
        let vs = self.values(key);
        if vs.len() == 1 {
            Record::from_scalar(key, vs[0])
        } else {
            Record::from_slice(&[
                (format!("{}_min", key), RecordValue::Scalar(min(&vs))),
                (format!("{}_max", key), RecordValue::Scalar(max(&vs))),
                (format!("{}_mean", key), RecordValue::Scalar(mean(&vs))),
                (format!("{}_median", key), RecordValue::Scalar(median(vs))),
            ])
        }
    }

    /// Aggregates all stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        self.aggregate_with(Self::scalar)
    }

    /// Aggregates all stored records into the mean of each scalar, keeping
    /// the key as is, and clears the storage.
    ///
    /// The key set does not depend on how many times a key was stored, so
    /// sinks writing one series per key get a single series.
    pub fn aggregate_mean(&mut self) -> Record {
        self.aggregate_with(|s, key| Record::from_scalar(key, mean(&s.values(key))))
    }

    fn aggregate_with(&mut self, scalar: impl Fn(&Self, &str) -> Record) -> Record {
        let mut record = Record::empty();

        for key in self.get_keys().iter() {
            let r = match self.latest(key) {
                Some(RecordValue::Scalar(..)) => scalar(self, key),
                Some(value) => Record::from_slice(&[(key.as_str(), value.clone())]),
                None => continue,
            };
            record.merge_inplace(r);
        }

        self.data.clear();
        record
    }
}

//! Writes scalar metrics as `Wall time,Step,Value` CSV files.
use super::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder};
use chrono::Local;
use csv::Writer;
use log::warn;
use std::{
    collections::HashMap,
    fs::File,
    path::{Path, PathBuf},
};

/// Writes every scalar to its own CSV file in a directory.
///
/// The layout is the one of the CSV export of metrics tools, so the files can
/// be read back by [`LearningCurve::from_csv`](crate::curve::LearningCurve::from_csv).
/// The file name is the key with `/` replaced by `_`. On flush, each key is
/// written as the mean of the values stored since the last flush.
pub struct CsvRecorder {
    dir: PathBuf,
    writers: HashMap<String, Writer<File>>,
    storage: RecordStorage,
    step_key: String,
}

impl CsvRecorder {
    /// Constructs the recorder. `dir` is created if it does not exist.
    pub fn new(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            writers: HashMap::new(),
            storage: RecordStorage::new(),
            step_key: "opt_steps".to_string(),
        })
    }

    /// Path of the file for the given key.
    pub fn path_of(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", key.replace('/', "_")))
    }

    fn write_row(&mut self, key: &str, step: i64, value: f32) -> anyhow::Result<()> {
        if !self.writers.contains_key(key) {
            let mut wtr = Writer::from_path(self.path_of(key))?;
            wtr.write_record(["Wall time", "Step", "Value"])?;
            self.writers.insert(key.to_string(), wtr);
        }
        if let Some(wtr) = self.writers.get_mut(key) {
            let wall_time = Local::now().timestamp_millis() as f64 / 1000.0;
            wtr.write_record(&[wall_time.to_string(), step.to_string(), value.to_string()])?;
            wtr.flush()?;
        }
        Ok(())
    }

    fn write_at(&mut self, record: &Record, step: i64) {
        for (k, v) in record.iter() {
            if let RecordValue::Scalar(v) = v {
                if *k != self.step_key {
                    if let Err(e) = self.write_row(k, step, *v) {
                        warn!("Failed to write {} to csv: {}", k, e);
                    }
                }
            }
        }
    }
}

impl Recorder for CsvRecorder {
    /// Writes the scalars of the record at the step given by `opt_steps`.
    ///
    /// Records without `opt_steps` are ignored.
    fn write(&mut self, record: Record) {
        match record.get_scalar(&self.step_key) {
            Ok(step) => self.write_at(&record, step as i64),
            Err(_) => warn!("Record without {} was ignored", self.step_key),
        }
    }
}

impl AggregateRecorder for CsvRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let record = self.storage.aggregate_mean();
        self.write_at(&record, step);
    }
}

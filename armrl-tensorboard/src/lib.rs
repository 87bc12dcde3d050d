//! Writes armrl metrics as TFRecord event files read by TensorBoard.
use armrl_core::record::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder};
use log::warn;
use std::path::Path;
use tensorboard_rs::summary_writer::SummaryWriter;

/// Write records to TFRecord.
pub struct TensorboardRecorder {
    writer: SummaryWriter,
    step_key: String,
    ignore_unsupported_value: bool,
    storage: RecordStorage,
}

impl TensorboardRecorder {
    /// Construct a [`TensorboardRecorder`].
    ///
    /// TFRecord will be stored in `logdir`.
    pub fn new<P: AsRef<Path>>(logdir: P) -> Self {
        Self {
            writer: SummaryWriter::new(logdir),
            step_key: "opt_steps".to_string(),
            ignore_unsupported_value: true,
            storage: RecordStorage::new(),
        }
    }

    /// Construct a [`TensorboardRecorder`] warning about values which can not be written.
    ///
    /// TFRecord will be stored in `logdir`.
    pub fn new_with_check_unsupported_value<P: AsRef<Path>>(logdir: P) -> Self {
        Self {
            ignore_unsupported_value: false,
            ..Self::new(logdir)
        }
    }

    fn write_at(&mut self, record: &Record, step: usize) {
        for (k, v) in record.iter() {
            if *k == self.step_key {
                continue;
            }
            match v {
                RecordValue::Scalar(v) => self.writer.add_scalar(k, *v, step),
                RecordValue::DateTime(_) => {}
                _ => {
                    if !self.ignore_unsupported_value {
                        warn!("Unsupported value was not written: {}", k);
                    }
                }
            }
        }
        self.writer.flush();
    }
}

impl Recorder for TensorboardRecorder {
    /// Write a given [`Record`] into a TFRecord at the step given by `opt_steps`.
    ///
    /// This method handles [`RecordValue::Scalar`]. [`RecordValue::DateTime`] is
    /// discarded. Records without `opt_steps` are ignored.
    fn write(&mut self, record: Record) {
        match record.get_scalar(&self.step_key) {
            Ok(step) => self.write_at(&record, step as usize),
            Err(_) => warn!("Record without {} was ignored", self.step_key),
        }
    }
}

impl AggregateRecorder for TensorboardRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let record = self.storage.aggregate();
        self.write_at(&record, step.max(0) as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_writes_event_file() -> anyhow::Result<()> {
        let dir = TempDir::new("tensorboard")?;
        let mut recorder = TensorboardRecorder::new(dir.path());
        recorder.store(Record::from_scalar("loss", 1.0));
        recorder.store(Record::from_scalar("loss", 3.0));
        recorder.flush(10);
        recorder.write(Record::from_slice(&[
            ("opt_steps", RecordValue::Scalar(20.0)),
            ("eval_reward", RecordValue::Scalar(5.0)),
        ]));

        let n_files = std::fs::read_dir(dir.path())?.count();
        assert!(n_files > 0);
        Ok(())
    }
}

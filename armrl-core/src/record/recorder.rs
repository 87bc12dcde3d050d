use super::Record;

/// Writes a record to an output destination with [`Recorder::write`].
pub trait Recorder {
    /// Write a record to the [`Recorder`].
    fn write(&mut self, record: Record);
}

/// Stores records, then writes values aggregated over them.
///
/// [`Trainer`](crate::Trainer) stores a record at every step and flushes
/// every `flush_record_interval` optimization steps.
pub trait AggregateRecorder {
    /// Store the record.
    fn store(&mut self, record: Record);

    /// Writes values aggregated from the stored records.
    ///
    /// `step` is the x-axis of the written values, usually the number of
    /// optimization steps.
    fn flush(&mut self, step: i64);
}

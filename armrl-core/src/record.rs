//! Records of training metrics and their output destinations.
//!
//! A [`Record`] holds named values. A [`Recorder`] writes a record somewhere,
//! an [`AggregateRecorder`] stores records and writes their aggregation on
//! flush.
//!
//! ```rust
//! use armrl_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("env_steps", RecordValue::Scalar(100.0));
//! record.insert("obs", RecordValue::Array1(vec![0.0, 0.5]));
//! ```
mod base;
mod buffered_recorder;
mod csv_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use csv_recorder::CsvRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use storage::RecordStorage;

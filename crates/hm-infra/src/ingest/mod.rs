mod json_records;

pub use json_records::{load_records, parse_records, RecordBatch};

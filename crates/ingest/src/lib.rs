//! Reading booking tables from CSV, joining them into session rows, and
//! writing perk assignments back out.

pub mod join;
pub mod loader;
pub mod writer;

pub use join::join_tables;
pub use loader::{read_file, read_records, LineRecord, LoadReport, Validate};
pub use writer::AssignmentWriter;

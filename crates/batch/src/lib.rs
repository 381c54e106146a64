pub mod manager;
pub mod processor;
pub mod summary;

#[cfg(test)]
mod test_support;

pub use manager::{BatchManager, BatchOutput};
pub use processor::UserProcessor;
pub use summary::RunSummary;

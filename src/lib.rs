pub mod aggregator;
pub mod bucket;
pub mod cli;
pub mod error;
pub mod event;
pub mod input;
pub mod percentile;
pub mod report;
pub mod stream_reader;
pub mod summary_reader;
pub mod timestamp;
pub mod utils;

pub mod edit_distance;
pub mod fluency;
pub mod grouping;
pub mod metrics;
pub mod report;
pub mod summary;
pub mod tokenization;

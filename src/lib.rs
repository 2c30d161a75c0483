pub mod alignment;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

pub use alignment::report::{aggregate_reports, compute_case_report, CaseReport, Report};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use pipeline::builder::ReadingAnalyzerBuilder;
pub use pipeline::runtime::ReadingAnalyzer;
pub use pipeline::traits::{FluencyAnalyzer, SequenceAligner, Tokenizer};
pub use pipeline::{analyze_reading, analyze_request_json};
pub use types::{
    AlignmentReport, AnalysisInput, AnalysisRequest, AnalysisResult, FluencyReport, Metrics,
    WordTimestamp,
};

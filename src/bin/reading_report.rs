use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use voxidria_reading::alignment::report::Meta;
use voxidria_reading::{
    aggregate_reports, compute_case_report, AnalysisConfig, AnalysisInput, AnalysisRequest,
    CaseReport, ReadingAnalyzer, ReadingAnalyzerBuilder, Report,
};

#[path = "reading_report/json_report_formatter.rs"]
mod json_report_formatter;
#[path = "reading_report/text_report_formatter.rs"]
mod text_report_formatter;

const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Parser)]
#[command(name = "reading_report")]
#[command(about = "Score a batch of read-aloud transcripts against their reference passages")]
struct Args {
    #[arg(
        long,
        env = "READING_REPORT_CASES_FILE",
        default_value = "test-data/report_cases.json"
    )]
    cases_file: PathBuf,
    #[arg(long, env = "READING_REPORT_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "READING_REPORT_OUT")]
    out: Option<PathBuf>,
    /// Comma-separated case ids to keep.
    #[arg(long, env = "READING_REPORT_IDS", value_delimiter = ',')]
    ids: Vec<String>,
    #[arg(long, env = "READING_REPORT_LIMIT")]
    limit: Option<usize>,
    #[arg(long, env = "READING_REPORT_OFFSET", default_value_t = 0)]
    offset: usize,
    #[arg(long, env = "READING_REPORT_SILENCE_THRESHOLD_MS")]
    silence_threshold_ms: Option<u64>,
    #[arg(
        long,
        env = "READING_REPORT_FORMAT",
        value_enum,
        default_value_t = OutputFormat::Json
    )]
    output_format: OutputFormat,
}

#[derive(Debug, Deserialize)]
struct Case {
    id: String,
    #[serde(flatten)]
    request: AnalysisRequest,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    let cases_path = resolve_path(&repo_root, &args.cases_file);
    let config_path = args.config.as_ref().map(|path| resolve_path(&repo_root, path));
    let mut config = match config_path.as_ref() {
        Some(path) => AnalysisConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(threshold) = args.silence_threshold_ms {
        config.silence_threshold_ms = threshold;
    }

    let mut cases = load_cases(&cases_path)?;
    if !args.ids.is_empty() {
        let known: HashSet<&str> = cases.iter().map(|case| case.id.as_str()).collect();
        let mut missing = args
            .ids
            .iter()
            .filter(|id| !known.contains(id.as_str()))
            .cloned()
            .collect::<Vec<_>>();
        missing.sort();
        if !missing.is_empty() {
            tracing::warn!(missing = ?missing, "requested case ids not found in cases file");
        }
        cases.retain(|case| args.ids.contains(&case.id));
    }
    if args.offset > 0 {
        cases = cases.into_iter().skip(args.offset).collect();
    }
    if let Some(limit) = args.limit {
        cases.truncate(limit);
    }
    if cases.is_empty() {
        return Err("No cases selected after applying filters/offset/limit.".to_string());
    }

    let silence_threshold_ms = config.silence_threshold_ms;
    let analyzer = ReadingAnalyzerBuilder::new(config)
        .build()
        .map_err(|err| format!("Failed to build ReadingAnalyzer: {err}"))?;

    let progress = ProgressBar::new(cases.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    progress.set_message("starting...");

    let mut case_reports: Vec<CaseReport> = Vec::with_capacity(cases.len());
    let mut lib_work_elapsed = Duration::ZERO;
    for case in cases {
        progress.set_message(case.id.clone());
        let started = Instant::now();
        let report = analyze_case(&analyzer, silence_threshold_ms, case)?;
        lib_work_elapsed += started.elapsed();
        case_reports.push(report);
        progress.inc(1);
    }
    progress.finish_with_message("analysis pass complete");

    let avg_case_ms = lib_work_elapsed.as_secs_f64() * 1000.0 / case_reports.len() as f64;
    tracing::info!(
        cases = case_reports.len(),
        elapsed_ms = lib_work_elapsed.as_secs_f64() * 1000.0,
        avg_case_ms,
        "analysis pass complete"
    );

    let aggregates = aggregate_reports(&case_reports);
    let report = Report {
        schema_version: REPORT_SCHEMA_VERSION,
        meta: Meta {
            generated_at: Utc::now().to_rfc3339(),
            config_path: config_path.map(|path| path.to_string_lossy().into_owned()),
            silence_threshold_ms,
            case_count: case_reports.len(),
        },
        cases: case_reports,
        aggregates,
    };

    match args.output_format {
        OutputFormat::Json => {
            let out_path = resolve_out_path(&repo_root, args.out.as_ref());
            json_report_formatter::write_report(&out_path, &report)?;
            println!("{}", out_path.display());
        }
        OutputFormat::Text => {
            let rendered = text_report_formatter::render_report(&report);
            match args.out.as_ref() {
                Some(path) => {
                    let out_path = resolve_path(&repo_root, path);
                    text_report_formatter::write_report(&out_path, &rendered)?;
                    println!("{}", out_path.display());
                }
                None => print!("{rendered}"),
            }
        }
    }
    Ok(())
}

fn analyze_case(
    analyzer: &ReadingAnalyzer,
    default_threshold_ms: u64,
    case: Case,
) -> Result<CaseReport, String> {
    let threshold = match case.request.silence_threshold_ms {
        Some(value) => u64::try_from(value).map_err(|_| {
            format!("{}: silenceThresholdMs must be non-negative, got {value}", case.id)
        })?,
        None => default_threshold_ms,
    };
    let input = AnalysisInput::from(case.request);
    let has_timestamps = input.word_timestamps.is_some();
    let result = analyzer
        .analyze_with_threshold(&input, threshold)
        .map_err(|err| format!("{}: analysis failed: {err}", case.id))?;
    compute_case_report(&case.id, &result, has_timestamps)
        .map_err(|err| format!("{}: report failed: {err}", case.id))
}

fn load_cases(path: &Path) -> Result<Vec<Case>, String> {
    require_path_exists(path, "Missing cases file.")?;
    let data = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read cases file '{}': {err}", path.display()))?;
    let cases: Vec<Case> = serde_json::from_str(&data)
        .map_err(|err| format!("Failed to parse cases file '{}': {err}", path.display()))?;

    let mut seen = HashSet::with_capacity(cases.len());
    for case in &cases {
        if !seen.insert(case.id.as_str()) {
            return Err(format!(
                "Duplicate case id '{}' in '{}'.",
                case.id,
                path.display()
            ));
        }
    }
    Ok(cases)
}

fn resolve_out_path(repo_root: &Path, out: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = out {
        return resolve_path(repo_root, path);
    }

    let run_id = Utc::now().format("%Y%m%dT%H%M%SZ");
    repo_root
        .join("target")
        .join("reading_reports")
        .join(format!("reading-report-{run_id}.json"))
}

fn resolve_path(repo_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        repo_root.join(path)
    }
}

fn require_path_exists(path: &Path, message: &str) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    Err(format!("{message} Missing path: {}", path.display()))
}

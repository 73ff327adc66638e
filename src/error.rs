//! Error types shared by the loading and reporting pipeline.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("required column `{column}` is missing from the workbook")]
    MissingColumn { column: String },

    #[error("unrecognized period: year {year}, month `{month}`")]
    MalformedPeriod { year: i32, month: String },

    #[error("division undefined for {what}: denominator is zero")]
    DivisionUndefined { what: String },

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("workbook {} has no sheets or no header row", .0.display())]
    EmptyWorkbook(PathBuf),

    #[error("unsupported input format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

pub type Result<T> = std::result::Result<T, ReportError>;

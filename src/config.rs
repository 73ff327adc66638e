//! JSON configuration with defaults for every field.

use crate::error::{ReportError, Result};
use crate::normalize::TrustedDaysTable;
use crate::types::DataTrust;
use crate::util::parse_month;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

fn default_data_path() -> PathBuf {
    PathBuf::from("Master_Energy_Monthly_FINAL_WITH_COST.xlsx")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_preview_rows() -> usize {
    3
}

fn default_trust_levels() -> Vec<DataTrust> {
    vec![DataTrust::High, DataTrust::Medium]
}

fn default_trusted_days() -> BTreeMap<String, u32> {
    [
        ("June", 18),
        ("July", 31),
        ("August", 31),
        ("September", 30),
        ("October", 31),
        ("November", 30),
        ("December", 24),
    ]
    .into_iter()
    .map(|(m, d)| (m.to_string(), d))
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Monthly workbook (xlsx/xls/ods/csv)
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Sheet name; first sheet when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,

    /// Where CSV/JSON outputs are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Rows shown per table in the terminal preview
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    #[serde(default = "default_trust_levels")]
    pub default_trust_levels: Vec<DataTrust>,

    /// Verified days per billing month, keyed by month name
    #[serde(default = "default_trusted_days")]
    pub trusted_days: BTreeMap<String, u32>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            sheet: None,
            output_dir: default_output_dir(),
            preview_rows: default_preview_rows(),
            default_trust_levels: default_trust_levels(),
            trusted_days: default_trusted_days(),
        }
    }
}

impl ReportConfig {
    pub fn trusted_days_table(&self) -> Result<TrustedDaysTable> {
        let mut days = BTreeMap::new();
        for (name, count) in &self.trusted_days {
            let month = parse_month(name)
                .ok_or_else(|| ReportError::Config(format!("unknown month `{name}` in trusted_days")))?;
            if days.insert(month, *count).is_some() {
                return Err(ReportError::Config(format!(
                    "month `{name}` listed twice in trusted_days"
                )));
            }
        }
        Ok(TrustedDaysTable::new(days))
    }
}

/// Read the config at `path`, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<ReportConfig> {
    let Some(path) = path else {
        return Ok(ReportConfig::default());
    };
    let content = std::fs::read_to_string(path)?;
    let config: ReportConfig = serde_json::from_str(&content)
        .map_err(|e| ReportError::Config(format!("failed to parse {}: {e}", path.display())))?;
    config.trusted_days_table()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_builtin_table() {
        let config = load_config(None).unwrap();
        assert_eq!(config.trusted_days_table().unwrap(), TrustedDaysTable::default());
        assert_eq!(config.default_trust_levels, vec![DataTrust::High, DataTrust::Medium]);
    }

    #[test]
    fn partial_file_is_filled_with_defaults() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, r#"{{"sheet": "Monthly", "trusted_days": {{"jan": 20, "Feb": 28}}}}"#).unwrap();
        let config = load_config(Some(f.path())).unwrap();
        assert_eq!(config.sheet.as_deref(), Some("Monthly"));
        assert_eq!(config.preview_rows, 3);
        let table = config.trusted_days_table().unwrap();
        assert_eq!(table.get(1), Some(20));
        assert_eq!(table.get(2), Some(28));
        assert_eq!(table.get(6), None);
    }

    #[test]
    fn unknown_month_is_a_config_error() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, r#"{{"trusted_days": {{"Juneuary": 10}}}}"#).unwrap();
        assert!(matches!(load_config(Some(f.path())), Err(ReportError::Config(_))));
    }

    #[test]
    fn same_month_twice_is_a_config_error() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, r#"{{"trusted_days": {{"June": 10, "jun": 12}}}}"#).unwrap();
        assert!(matches!(load_config(Some(f.path())), Err(ReportError::Config(_))));
    }
}

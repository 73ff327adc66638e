use crate::error::Result;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn render_table<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    match render_table(rows, max_rows) {
        Some(table) => println!("{}\n", table),
        None => println!("(no rows)\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BucketRow;

    fn rows() -> Vec<BucketRow> {
        vec![
            BucketRow {
                coupling: "Before".to_string(),
                months: 3,
                grid_import_kwh: "370".to_string(),
                solar_self_kwh: "0".to_string(),
                solar_generated_kwh: "0".to_string(),
            },
            BucketRow {
                coupling: "After".to_string(),
                months: 8,
                grid_import_kwh: "1,200".to_string(),
                solar_self_kwh: "900".to_string(),
                solar_generated_kwh: "1,500".to_string(),
            },
        ]
    }

    #[test]
    fn csv_uses_renamed_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buckets.csv");
        write_csv(&path, &rows()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Coupling,Months,GridImportKWh,SolarSelfKWh,SolarGenKWh")
        );
        assert_eq!(lines.next(), Some("Before,3,370,0,0"));
        assert_eq!(lines.next(), Some("After,8,\"1,200\",900,\"1,500\""));
    }

    #[test]
    fn preview_is_truncated() {
        let table = render_table(&rows(), 1).unwrap();
        assert!(table.contains("Before"));
        assert!(!table.contains("After"));
        assert!(render_table::<BucketRow>(&[], 5).is_none());
    }
}

//! Tabular export of payloads to spreadsheet (CSV) files.
//!
//! A payload here is a list of uniform mappings, as returned by the list
//! operations. Each named table becomes one file in the output directory,
//! which stands in for "one sheet per dataset/parameter group".

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::metadata::MetadataSnapshot;

/// Writes each named table to `<dir>/<name>.csv`, creating `dir` as needed.
///
/// The header is the sorted union of the keys occurring in any row, so rows
/// with missing fields export as empty cells instead of failing.
pub fn write_tables(
    dir: &Path,
    tables: &BTreeMap<String, Vec<Map<String, Value>>>,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(tables.len());
    for (name, rows) in tables {
        let path = dir.join(format!("{}.csv", sanitize_name(name)));
        write_table(&path, rows)?;
        written.push(path);
    }
    Ok(written)
}

fn write_table(path: &Path, rows: &[Map<String, Value>]) -> Result<()> {
    let mut columns = BTreeSet::new();
    for row in rows {
        columns.extend(row.keys().cloned());
    }

    let mut out = BufWriter::new(File::create(path)?);

    let header: Vec<String> = columns.iter().map(|c| csv_field(c)).collect();
    writeln!(out, "{}", header.join(","))?;

    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| csv_field(&cell_text(row.get(c))))
            .collect();
        writeln!(out, "{}", cells.join(","))?;
    }

    out.flush()?;
    Ok(())
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn csv_field(text: &str) -> String {
    if text.contains(',') || text.contains('"') || text.contains('\n') || text.contains('\r') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl MetadataSnapshot {
    /// Flattens the snapshot into named tables: one `<dataset>` table of
    /// parameter descriptors, plus one `<dataset>.<parameter>` table of
    /// permitted values per parameter.
    pub fn tables(&self) -> BTreeMap<String, Vec<Map<String, Value>>> {
        let mut tables = BTreeMap::new();
        for (dataset, parameters) in &self.datasets {
            let descriptors: Vec<_> = parameters.values().map(|p| p.details.clone()).collect();
            tables.insert(dataset.clone(), descriptors);

            for (parameter, meta) in parameters {
                tables.insert(format!("{}.{}", dataset, parameter), meta.values.clone());
            }
        }
        tables
    }

    /// Writes the whole snapshot under `dir`, one CSV file per table.
    pub fn export_csv(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        write_tables(dir, &self.tables())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ParameterMetadata;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn tables_write_one_file_each_with_union_headers() {
        let dir = tempfile::tempdir().unwrap();
        let mut tables = BTreeMap::new();
        tables.insert(
            "NIPA".to_string(),
            vec![
                as_map(json!({"Key": "T10101", "Desc": "GDP"})),
                as_map(json!({"Key": "T10105", "Note": "current dollars"})),
            ],
        );

        let written = write_tables(dir.path(), &tables).unwrap();
        assert_eq!(written, vec![dir.path().join("NIPA.csv")]);

        let text = std::fs::read_to_string(&written[0]).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Desc,Key,Note"));
        assert_eq!(lines.next(), Some("GDP,T10101,"));
        assert_eq!(lines.next(), Some(",T10105,current dollars"));
    }

    #[test]
    fn fields_with_commas_and_quotes_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let mut tables = BTreeMap::new();
        tables.insert(
            "values".to_string(),
            vec![as_map(
                json!({"Desc": "Billions of dollars, \"annual\" rate"}),
            )],
        );

        let written = write_tables(dir.path(), &tables).unwrap();
        let text = std::fs::read_to_string(&written[0]).unwrap();
        assert!(
            text.contains("\"Billions of dollars, \"\"annual\"\" rate\""),
            "unexpected output: {}",
            text
        );
    }

    #[test]
    fn non_string_cells_render_as_json_scalars() {
        let dir = tempfile::tempdir().unwrap();
        let mut tables = BTreeMap::new();
        tables.insert(
            "mixed".to_string(),
            vec![as_map(json!({"AllValue": true, "MultipleAccepted": 0}))],
        );

        let written = write_tables(dir.path(), &tables).unwrap();
        let text = std::fs::read_to_string(&written[0]).unwrap();
        assert!(text.lines().nth(1).unwrap().contains("true"));
        assert!(text.lines().nth(1).unwrap().contains('0'));
    }

    #[test]
    fn snapshot_flattens_to_descriptor_and_value_tables() {
        let mut snapshot = MetadataSnapshot::default();
        let mut params = BTreeMap::new();
        params.insert(
            "Year".to_string(),
            ParameterMetadata {
                details: as_map(json!({"ParameterName": "Year"})),
                values: vec![as_map(json!({"Key": "2024"}))],
            },
        );
        snapshot.datasets.insert("NIPA".to_string(), params);

        let tables = snapshot.tables();
        assert_eq!(
            tables.keys().collect::<Vec<_>>(),
            vec!["NIPA", "NIPA.Year"]
        );
        assert_eq!(tables["NIPA"].len(), 1);
        assert_eq!(tables["NIPA.Year"][0]["Key"], "2024");
    }

    #[test]
    fn file_names_are_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let mut tables = BTreeMap::new();
        tables.insert("Regional/Income".to_string(), Vec::new());

        let written = write_tables(dir.path(), &tables).unwrap();
        assert_eq!(written, vec![dir.path().join("Regional_Income.csv")]);
    }
}

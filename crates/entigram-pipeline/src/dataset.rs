//! Dataset loading and the annotated-CSV output.

use std::path::Path;

use entigram_core::{defaults, Error, Result, RowId, SourceRow};

/// An in-memory text dataset with stable row ids in file order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub rows: Vec<SourceRow>,
}

impl Dataset {
    pub fn from_rows(rows: Vec<SourceRow>) -> Self {
        Self { rows }
    }

    /// Load a CSV, keeping only `column` and assigning row ids in file
    /// order. A missing column is a dataset error naming the column and the
    /// headers actually present.
    pub fn load_csv(path: &Path, column: &str) -> Result<Self> {
        let mut reader =
            csv::Reader::from_path(path).map_err(|e| Error::Dataset(e.to_string()))?;
        let headers = reader
            .headers()
            .map_err(|e| Error::Dataset(e.to_string()))?
            .clone();
        let column_idx = headers.iter().position(|h| h == column).ok_or_else(|| {
            Error::Dataset(format!(
                "column {column:?} not found in csv headers ({})",
                headers.iter().collect::<Vec<_>>().join(", ")
            ))
        })?;

        let mut rows = Vec::new();
        for (id, record) in reader.records().enumerate() {
            let record = record.map_err(|e| Error::Dataset(e.to_string()))?;
            let text = record.get(column_idx).unwrap_or("").to_string();
            rows.push(SourceRow::new(id as RowId, text));
        }
        Ok(Self { rows })
    }

    /// Write the annotated dataset into `dir` as a single-`text`-column CSV.
    /// Row order equals row id order, which the viewer relies on.
    pub fn write_annotated_csv(&self, dir: &Path) -> Result<()> {
        let path = dir.join(defaults::ANNOTATED_CSV_FILE);
        let mut writer =
            csv::Writer::from_path(path).map_err(|e| Error::Dataset(e.to_string()))?;
        writer
            .write_record([defaults::TEXT_COLUMN])
            .map_err(|e| Error::Dataset(e.to_string()))?;
        for row in &self.rows {
            writer
                .write_record([row.text.as_str()])
                .map_err(|e| Error::Dataset(e.to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_csv_selects_column_and_numbers_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.csv");
        std::fs::write(&path, "id,notes\n10,covid spread\n11,flu season\n").unwrap();

        let dataset = Dataset::load_csv(&path, "notes").unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows[0], SourceRow::new(0, "covid spread"));
        assert_eq!(dataset.rows[1], SourceRow::new(1, "flu season"));
    }

    #[test]
    fn test_load_csv_missing_column_names_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.csv");
        std::fs::write(&path, "id,notes\n10,text\n").unwrap();

        let err = Dataset::load_csv(&path, "text").unwrap_err();
        match err {
            Error::Dataset(msg) => {
                assert!(msg.contains("\"text\""));
                assert!(msg.contains("notes"));
            }
            other => panic!("expected Dataset error, got {other:?}"),
        }
    }

    #[test]
    fn test_write_annotated_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = Dataset::from_rows(vec![
            SourceRow::new(0, "first row"),
            SourceRow::new(1, "second, with comma"),
        ]);
        dataset.write_annotated_csv(dir.path()).unwrap();

        let reloaded = Dataset::load_csv(
            &dir.path().join(entigram_core::defaults::ANNOTATED_CSV_FILE),
            entigram_core::defaults::TEXT_COLUMN,
        )
        .unwrap();
        assert_eq!(reloaded.rows, dataset.rows);
    }
}

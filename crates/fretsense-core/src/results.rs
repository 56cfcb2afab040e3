use crate::stats::ImageStatistics;

/// One measurement row.
#[derive(Clone, Debug)]
pub struct ResultRow {
    /// Sample label in batch mode.
    pub file: Option<String>,
    pub label: String,
    pub statistics: ImageStatistics,
}

/// Append-only table of measurements.
#[derive(Clone, Debug, Default)]
pub struct ResultsTable {
    rows: Vec<ResultRow>,
}

const COLUMNS: [&str; 8] = [
    "Label", "Count", "Valid", "Mean", "Median", "StdDev", "Min", "Max",
];

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: Option<String>, label: impl Into<String>, statistics: ImageStatistics) {
        self.rows.push(ResultRow {
            file,
            label: label.into(),
            statistics,
        });
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as tab-separated text. The "File" column only appears when a
    /// row carries a file label.
    pub fn to_tsv(&self) -> String {
        let with_file = self.rows.iter().any(|r| r.file.is_some());
        let mut out = String::new();

        if with_file {
            out.push_str("File\t");
        }
        out.push_str(&COLUMNS.join("\t"));
        out.push('\n');

        for row in &self.rows {
            if with_file {
                out.push_str(row.file.as_deref().unwrap_or(""));
                out.push('\t');
            }
            let s = &row.statistics;
            out.push_str(&format!(
                "{}\t{}\t{}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\n",
                row.label, s.pixel_count, s.valid_count, s.mean, s.median, s.std_dev, s.min, s.max
            ));
        }
        out
    }
}

//! Recipient table loading
//!
//! Recipients come from a CSV file with a header row. Each field of
//! [`RecipientRecord`] is taken from the first header in its candidate list
//! that the file has, so tables exported by older tooling (`usdot`,
//! `company_name`, `form_path`, `invoice_path`) load unchanged.

use std::{
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::Context;
use courier_common::{RecipientRecord, RequiredField, tracing};
use serde::Deserialize;

/// Where recipients are read from, and which of them to keep.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipientSourceConfig {
    /// CSV file with a header row
    pub path: PathBuf,

    /// Keep only rows whose primary document lies inside this directory
    #[serde(default)]
    pub primary_dir: Option<PathBuf>,

    /// Keep only rows whose secondary document lies inside this directory.
    /// Ignored when `primary_dir` is set.
    #[serde(default)]
    pub secondary_dir: Option<PathBuf>,
}

/// Header names accepted for each field, in priority order.
const fn candidates(field: RequiredField) -> &'static [&'static str] {
    match field {
        RequiredField::Identifier => &["identifier", "usdot"],
        RequiredField::OrganizationName => &["organization_name", "company_name"],
        RequiredField::ContactName => &["contact_name"],
        RequiredField::Email => &["email"],
        RequiredField::PrimaryDocumentPath => &["primary_document_path", "form_path"],
        RequiredField::SecondaryDocumentPath => &["secondary_document_path", "invoice_path"],
    }
}

/// Column index for every field, or `None` when the table lacks all candidates.
struct ColumnMap([(RequiredField, Option<usize>); 6]);

impl ColumnMap {
    fn new(headers: &csv::StringRecord) -> Self {
        Self(RequiredField::ALL.map(|field| {
            let column = candidates(field).iter().find_map(|candidate| {
                headers
                    .iter()
                    .position(|header| header.trim().eq_ignore_ascii_case(candidate))
            });
            if column.is_none() {
                tracing::warn!(
                    field = %field,
                    candidates = ?candidates(field),
                    "Recipient table has no column for field, every record will be incomplete"
                );
            }
            (field, column)
        }))
    }

    fn record(&self, row: &csv::StringRecord) -> RecipientRecord {
        let mut record = RecipientRecord::default();

        for (field, column) in &self.0 {
            let value = column
                .and_then(|index| row.get(index))
                .map(clean)
                .unwrap_or_default();

            match field {
                RequiredField::Identifier => record.identifier = value,
                RequiredField::OrganizationName => record.organization_name = value,
                RequiredField::ContactName => record.contact_name = value,
                RequiredField::Email => record.email = value,
                RequiredField::PrimaryDocumentPath => record.primary_document_path = value,
                RequiredField::SecondaryDocumentPath => record.secondary_document_path = value,
            }
        }

        record
    }
}

/// Trim and flatten embedded line breaks to spaces.
fn clean(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse recipients from CSV text.
///
/// Rows that cannot be parsed are logged and skipped.
///
/// # Errors
/// If the header row cannot be read.
pub fn read_recipients<R: Read>(reader: R) -> anyhow::Result<Vec<RecipientRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(reader);

    let headers = reader.headers().context("Cannot read header row")?.clone();
    let columns = ColumnMap::new(&headers);

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        match row {
            Ok(row) => records.push(columns.record(&row)),
            Err(e) => tracing::warn!(row = line + 1, error = %e, "Skipping malformed row"),
        }
    }

    Ok(records)
}

/// Whether `path` lies inside `directory`, resolving symlinks where the
/// paths exist.
fn is_inside_dir(path: &Path, directory: &Path) -> bool {
    let resolve = |p: &Path| {
        std::fs::canonicalize(p)
            .or_else(|_| std::path::absolute(p))
            .unwrap_or_else(|_| p.to_path_buf())
    };

    resolve(path).starts_with(resolve(directory))
}

/// Apply the directory filters from `config` to `records`.
#[must_use]
pub fn filter_by_directory(
    records: Vec<RecipientRecord>,
    config: &RecipientSourceConfig,
) -> Vec<RecipientRecord> {
    let (directory, field) = match (&config.primary_dir, &config.secondary_dir) {
        (Some(dir), _) => (dir.as_path(), RequiredField::PrimaryDocumentPath),
        (None, Some(dir)) => (dir.as_path(), RequiredField::SecondaryDocumentPath),
        (None, None) => {
            tracing::debug!("Applying no directory filter to recipients");
            return records;
        }
    };

    let before = records.len();
    let kept: Vec<_> = records
        .into_iter()
        .filter(|record| {
            let path = record.field(field);
            !path.is_empty() && is_inside_dir(Path::new(path), directory)
        })
        .collect();

    tracing::debug!(
        directory = %directory.display(),
        kept = kept.len(),
        dropped = before - kept.len(),
        "Filtered recipients by document directory"
    );

    kept
}

/// Load and filter the recipient table described by `config`.
///
/// # Errors
/// If the file cannot be read or has no readable header row. This is
/// fatal for a run.
pub async fn load_recipients(
    config: &RecipientSourceConfig,
) -> anyhow::Result<Vec<RecipientRecord>> {
    let content = tokio::fs::read(&config.path)
        .await
        .with_context(|| format!("Cannot open recipient table {}", config.path.display()))?;

    let records = read_recipients(content.as_slice())
        .with_context(|| format!("Cannot read recipient table {}", config.path.display()))?;
    tracing::info!(
        path = %config.path.display(),
        "Loaded {} recipient(s)",
        records.len()
    );

    Ok(filter_by_directory(records, config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_reads_canonical_headers() {
        let csv = "identifier,organization_name,contact_name,email,primary_document_path,secondary_document_path,notes\n\
                   100,ACME,Jane,jane@acme.test,/f/a.pdf,/i/a.pdf,ignored\n";

        let records = read_recipients(csv.as_bytes()).unwrap();

        assert_eq!(
            records,
            vec![RecipientRecord {
                identifier: "100".to_string(),
                organization_name: "ACME".to_string(),
                contact_name: "Jane".to_string(),
                email: "jane@acme.test".to_string(),
                primary_document_path: "/f/a.pdf".to_string(),
                secondary_document_path: "/i/a.pdf".to_string(),
            }]
        );
    }

    #[test]
    fn test_legacy_headers_are_accepted() {
        let csv = "usdot,company_name,contact_name,email,form_path,invoice_path\n\
                   7,Carrier,Pat,pat@c.test,/f/7.pdf,/i/7.pdf\n";

        let record = &read_recipients(csv.as_bytes()).unwrap()[0];

        assert_eq!(record.identifier, "7");
        assert_eq!(record.organization_name, "Carrier");
        assert_eq!(record.primary_document_path, "/f/7.pdf");
        assert!(record.is_complete());
    }

    #[test]
    fn test_canonical_header_wins_over_legacy() {
        let csv = "usdot,identifier\n1,2\n";
        let record = &read_recipients(csv.as_bytes()).unwrap()[0];
        assert_eq!(record.identifier, "2");
    }

    #[test]
    fn test_missing_column_leaves_field_empty() {
        let csv = "identifier,email\n1,a@b.test\n";
        let record = &read_recipients(csv.as_bytes()).unwrap()[0];

        assert_eq!(record.contact_name, "");
        assert!(!record.is_complete());
    }

    #[test]
    fn test_values_are_trimmed_and_flattened() {
        let csv = "identifier,organization_name\n\"  1 \",\"ACME\nHAULING \"\n";
        let record = &read_recipients(csv.as_bytes()).unwrap()[0];

        assert_eq!(record.identifier, "1");
        assert_eq!(record.organization_name, "ACME HAULING");
    }

    #[test]
    fn test_short_rows_are_kept() {
        let csv = "identifier,email\n1\n";
        let records = read_recipients(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].email, "");
    }

    #[test]
    fn test_directory_filter() {
        let dir = TempDir::new().unwrap();
        let forms = dir.path().join("forms");
        std::fs::create_dir(&forms).unwrap();

        let inside = RecipientRecord {
            identifier: "1".to_string(),
            primary_document_path: forms.join("a.pdf").display().to_string(),
            ..RecipientRecord::default()
        };
        let outside = RecipientRecord {
            identifier: "2".to_string(),
            primary_document_path: dir.path().join("b.pdf").display().to_string(),
            ..RecipientRecord::default()
        };
        let config = RecipientSourceConfig {
            path: PathBuf::new(),
            primary_dir: Some(forms),
            secondary_dir: None,
        };

        let kept = filter_by_directory(vec![inside, outside], &config);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].identifier, "1");
    }

    #[tokio::test]
    async fn test_unreadable_table_is_an_error() {
        let config = RecipientSourceConfig {
            path: PathBuf::from("/definitely/not/recipients.csv"),
            primary_dir: None,
            secondary_dir: None,
        };
        assert!(load_recipients(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_load_reads_and_filters_table() {
        let dir = TempDir::new().unwrap();
        let forms = dir.path().join("forms");
        std::fs::create_dir(&forms).unwrap();
        let table = dir.path().join("recipients.csv");
        std::fs::write(
            &table,
            format!(
                "usdot,email,form_path\n1,a@x.test,{}\n2,b@x.test,{}\n",
                forms.join("1.pdf").display(),
                dir.path().join("2.pdf").display()
            ),
        )
        .unwrap();

        let config = RecipientSourceConfig {
            path: table,
            primary_dir: Some(forms),
            secondary_dir: None,
        };
        let records = load_recipients(&config).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier, "1");
        assert_eq!(records[0].email, "a@x.test");
    }
}

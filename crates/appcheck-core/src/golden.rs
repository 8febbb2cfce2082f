//! Golden dataset loading.
//!
//! CSV files need a header row with `question` and `golden_answer` columns.
//! Header names are matched case-insensitively ignoring `_`, `-` and spaces,
//! so `goldenAnswer` and `Golden Answer` also work. Files ending in `.json`
//! are read as an array of `{question, golden_answer}` objects.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::domain::{DatasetError, GoldenCase};

const QUESTION_COLUMN: &str = "question";
const GOLDEN_COLUMN: &str = "golden_answer";

/// Loaded dataset plus provenance for report artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenDataset {
    pub path: PathBuf,
    /// Hex SHA-256 of the source file.
    pub digest: String,
    pub cases: Vec<GoldenCase>,
}

impl GoldenDataset {
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

fn normalize_header(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

fn find_column(
    headers: &csv::StringRecord,
    path: &Path,
    column: &'static str,
    aliases: &[&str],
) -> Result<usize, DatasetError> {
    headers
        .iter()
        .position(|h| {
            let h = normalize_header(h);
            h == normalize_header(column) || aliases.contains(&h.as_str())
        })
        .ok_or_else(|| DatasetError::MissingColumn {
            path: path.to_path_buf(),
            column,
        })
}

fn validate_case(path: &Path, row: usize, case: &GoldenCase) -> Result<(), DatasetError> {
    let invalid = |message: &str| DatasetError::InvalidCase {
        path: path.to_path_buf(),
        row,
        message: message.to_string(),
    };
    if case.question.trim().is_empty() {
        return Err(invalid("empty question"));
    }
    if case.golden_answer.trim().is_empty() {
        return Err(invalid("empty golden answer"));
    }
    Ok(())
}

fn parse_csv(path: &Path, bytes: &[u8]) -> Result<Vec<GoldenCase>, DatasetError> {
    let csv_error = |e: csv::Error| DatasetError::Csv {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers().map_err(csv_error)?.clone();
    let question_idx = find_column(&headers, path, QUESTION_COLUMN, &[])?;
    let golden_idx = find_column(&headers, path, GOLDEN_COLUMN, &["golden"])?;

    let mut cases = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let row = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(cases.len() + 2);
        let case = GoldenCase::new(
            record.get(question_idx).unwrap_or_default(),
            record.get(golden_idx).unwrap_or_default(),
        );
        validate_case(path, row, &case)?;
        cases.push(case);
    }
    Ok(cases)
}

fn parse_json(path: &Path, bytes: &[u8]) -> Result<Vec<GoldenCase>, DatasetError> {
    let cases: Vec<GoldenCase> =
        serde_json::from_slice(bytes).map_err(|source| DatasetError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    for (idx, case) in cases.iter().enumerate() {
        validate_case(path, idx + 1, case)?;
    }
    Ok(cases)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Load a golden dataset from CSV or JSON.
pub fn load_golden(path: impl AsRef<Path>) -> Result<GoldenDataset, DatasetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let cases = if is_json(path) {
        parse_json(path, &bytes)?
    } else {
        parse_csv(path, &bytes)?
    };

    if cases.is_empty() {
        return Err(DatasetError::Empty {
            path: path.to_path_buf(),
        });
    }

    let digest = hex::encode(Sha256::digest(&bytes));
    debug!(path = ?path, cases = cases.len(), digest = %digest, "Loaded golden dataset");

    Ok(GoldenDataset {
        path: path.to_path_buf(),
        digest,
        cases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("golden_answer"), "goldenanswer");
        assert_eq!(normalize_header("goldenAnswer"), "goldenanswer");
        assert_eq!(normalize_header(" Golden Answer "), "goldenanswer");
    }

    #[test]
    fn test_parse_csv_with_quoted_commas() {
        let csv = "question,golden_answer\n\"What is RAG, briefly?\",\"Retrieval, then generation\"\n";
        let cases = parse_csv(Path::new("golden.csv"), csv.as_bytes()).expect("parse");
        assert_eq!(
            cases,
            vec![GoldenCase::new("What is RAG, briefly?", "Retrieval, then generation")]
        );
    }

    #[test]
    fn test_parse_csv_column_order_and_extra_columns() {
        let csv = "id,goldenAnswer,Question\n1,Paris,Capital of France?\n";
        let cases = parse_csv(Path::new("golden.csv"), csv.as_bytes()).expect("parse");
        assert_eq!(cases[0], GoldenCase::new("Capital of France?", "Paris"));
    }

    #[test]
    fn test_parse_csv_missing_column() {
        let csv = "question,answer\nq,a\n";
        let err = parse_csv(Path::new("golden.csv"), csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::MissingColumn {
                column: "golden_answer",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_csv_empty_question_names_row() {
        let csv = "question,golden_answer\nq1,a1\n ,a2\n";
        let err = parse_csv(Path::new("golden.csv"), csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidCase { row: 3, .. }));
    }

    #[test]
    fn test_parse_json_accepts_camel_case() {
        let json = r#"[{"question":"q","goldenAnswer":"a"},{"question":"q2","golden_answer":"b"}]"#;
        let cases = parse_json(Path::new("golden.json"), json.as_bytes()).expect("parse");
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[1].golden_answer, "b");
    }

    #[test]
    fn test_is_json_by_extension() {
        assert!(is_json(Path::new("golden.JSON")));
        assert!(!is_json(Path::new("golden.csv")));
        assert!(!is_json(Path::new("golden")));
    }
}

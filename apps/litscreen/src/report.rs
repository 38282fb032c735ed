//! # Report Writer
//!
//! Persists a [`ScreeningReport`] as JSONL, CSV and PRISMA JSON files.
//!
//! | File | Content |
//! |---|---|
//! | `unified_all.{jsonl,csv}` | merged records |
//! | `screened_candidates.csv` | stage-1 screened in, with match flags |
//! | `excluded_non_mv_weaning.csv` | stage-1 screened out, with reasons |
//! | `abstract_check.{jsonl,csv}` | stage-2 kept |
//! | `abstract_dropped.jsonl` | stage-2 dropped |
//! | `rescue_candidates.{jsonl,csv}` | rescue retained (when rescue ran) |
//! | `rescue_confirmed_excluded.jsonl` | rescue confirmed (when rescue ran) |
//! | `prisma_counts.json` | PRISMA counts, pretty printed |

use litscreen_core::{
    AbstractScreened, CanonicalRecord, ExcludeReason, ScreenError, ScreeningReport, TitleScreened,
};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Columns shared by every CSV.
pub const BASE_COLUMNS: [&str; 8] = [
    "source", "id", "title", "authors", "year", "doi", "url", "venue",
];

const TITLE_FLAG_COLUMNS: [&str; 3] = ["match_mv", "match_weaning", "match_rl"];

const ABSTRACT_COLUMNS: [&str; 5] = [
    "abstract",
    "match_mv_abs",
    "match_wean_abs",
    "match_rl_abs",
    "decision",
];

/// Separator for the CSV `authors` column.
pub const AUTHOR_SEPARATOR: &str = "; ";

// =============================================================================
// ROW RENDERING
// =============================================================================

fn base_row(record: &CanonicalRecord) -> Vec<String> {
    vec![
        record.source.as_str().to_string(),
        record.native_id.clone(),
        record.title.clone(),
        record.authors.join(AUTHOR_SEPARATOR),
        record.year.map(|y| y.to_string()).unwrap_or_default(),
        record.doi.clone().unwrap_or_default(),
        record.url.clone().unwrap_or_default(),
        record.venue.clone(),
    ]
}

fn title_row(screened: &TitleScreened) -> Vec<String> {
    let mut row = base_row(&screened.record);
    row.extend([
        screened.evidence.match_mv.to_string(),
        screened.evidence.match_weaning.to_string(),
        screened.evidence.match_rl.to_string(),
    ]);
    row
}

fn abstract_row(screened: &AbstractScreened) -> Vec<String> {
    let mut row = base_row(screened.record());
    row.extend([
        screened.abstract_text.clone(),
        screened.evidence.match_mv_abs.to_string(),
        screened.evidence.match_wean_abs.to_string(),
        screened.evidence.match_rl_abs.to_string(),
        screened.decision.as_str().to_string(),
    ]);
    row
}

// =============================================================================
// WRITERS
// =============================================================================

/// Write one JSON document per line.
pub fn write_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ScreenError> {
    let file = std::fs::File::create(path)
        .map_err(|e| ScreenError::Io(format!("Cannot create '{}': {}", path.display(), e)))?;
    let mut out = std::io::BufWriter::new(file);

    for row in rows {
        serde_json::to_writer(&mut out, row)
            .map_err(|e| ScreenError::Serialization(format!("JSONL encode error: {}", e)))?;
        out.write_all(b"\n")
            .map_err(|e| ScreenError::Io(format!("JSONL write error: {}", e)))?;
    }
    out.flush()
        .map_err(|e| ScreenError::Io(format!("JSONL write error: {}", e)))
}

/// Write a CSV with `header`, rendering each row with `render`.
///
/// The header is written even when there are no rows.
pub fn write_csv<T, F>(
    path: &Path,
    header: &[&str],
    rows: &[T],
    render: F,
) -> Result<(), ScreenError>
where
    F: Fn(&T) -> Vec<String>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .map_err(|e| ScreenError::Io(format!("Cannot create '{}': {}", path.display(), e)))?;

    writer
        .write_record(header)
        .map_err(|e| ScreenError::Io(format!("CSV write error: {}", e)))?;
    for row in rows {
        writer
            .write_record(render(row))
            .map_err(|e| ScreenError::Io(format!("CSV write error: {}", e)))?;
    }
    writer
        .flush()
        .map_err(|e| ScreenError::Io(format!("CSV write error: {}", e)))
}

fn columns(extra: &[&'static str]) -> Vec<&'static str> {
    BASE_COLUMNS.iter().chain(extra).copied().collect()
}

/// Write canonical records as `<stem>.jsonl` and `<stem>.csv`.
pub fn write_records(
    out_dir: &Path,
    stem: &str,
    records: &[CanonicalRecord],
) -> Result<Vec<PathBuf>, ScreenError> {
    let jsonl = out_dir.join(format!("{}.jsonl", stem));
    let csv = out_dir.join(format!("{}.csv", stem));
    write_jsonl(&jsonl, records)?;
    write_csv(&csv, &BASE_COLUMNS, records, base_row)?;
    Ok(vec![jsonl, csv])
}

/// Write every report file into `out_dir`, creating it when needed.
///
/// Returns the written paths in write order.
pub fn write_report(
    out_dir: &Path,
    report: &ScreeningReport,
) -> Result<Vec<PathBuf>, ScreenError> {
    std::fs::create_dir_all(out_dir).map_err(|e| {
        ScreenError::Io(format!(
            "Cannot create output directory '{}': {}",
            out_dir.display(),
            e
        ))
    })?;

    let mut written = write_records(out_dir, "unified_all", &report.merge.records)?;

    let path = out_dir.join("screened_candidates.csv");
    write_csv(
        &path,
        &columns(&TITLE_FLAG_COLUMNS),
        &report.title_stage.screened_in,
        title_row,
    )?;
    written.push(path);

    let path = out_dir.join("excluded_non_mv_weaning.csv");
    let mut header = columns(&TITLE_FLAG_COLUMNS);
    header.push("auto_exclude_reason");
    write_csv(&path, &header, &report.title_stage.screened_out, |s| {
        let mut row = title_row(s);
        row.push(ExcludeReason::join(&s.auto_exclude_reason));
        row
    })?;
    written.push(path);

    let abstract_header = columns(&ABSTRACT_COLUMNS);
    written.extend(write_abstract_pair(
        out_dir,
        "abstract_check",
        &abstract_header,
        &report.abstract_stage.kept,
    )?);

    let path = out_dir.join("abstract_dropped.jsonl");
    write_jsonl(&path, &report.abstract_stage.dropped)?;
    written.push(path);

    if let Some(rescue) = &report.rescue_stage {
        written.extend(write_abstract_pair(
            out_dir,
            "rescue_candidates",
            &abstract_header,
            &rescue.candidates,
        )?);

        let path = out_dir.join("rescue_confirmed_excluded.jsonl");
        write_jsonl(&path, &rescue.confirmed_excluded)?;
        written.push(path);
    }

    let path = out_dir.join("prisma_counts.json");
    let prisma = serde_json::to_string_pretty(&report.prisma)
        .map_err(|e| ScreenError::Serialization(format!("PRISMA encode error: {}", e)))?;
    std::fs::write(&path, prisma)
        .map_err(|e| ScreenError::Io(format!("Cannot write '{}': {}", path.display(), e)))?;
    written.push(path);

    tracing::info!(files = written.len(), dir = %out_dir.display(), "Report written");
    Ok(written)
}

fn write_abstract_pair(
    out_dir: &Path,
    stem: &str,
    header: &[&str],
    rows: &[AbstractScreened],
) -> Result<Vec<PathBuf>, ScreenError> {
    let jsonl = out_dir.join(format!("{}.jsonl", stem));
    let csv = out_dir.join(format!("{}.csv", stem));
    write_jsonl(&jsonl, rows)?;
    write_csv(&csv, header, rows, abstract_row)?;
    Ok(vec![jsonl, csv])
}

// =============================================================================
// CANDIDATE TABLES
// =============================================================================

/// A CSV file with a `title` column, kept as raw string records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTable {
    pub headers: csv::StringRecord,
    pub title_column: usize,
    pub rows: Vec<csv::StringRecord>,
}

impl CandidateTable {
    /// Title cell of `row`, `""` when the row is short.
    #[must_use]
    pub fn title<'r>(&self, row: &'r csv::StringRecord) -> &'r str {
        row.get(self.title_column).unwrap_or_default()
    }
}

/// Read a candidates CSV. The header must contain `title` in any case.
pub fn read_candidate_table(path: &Path) -> Result<CandidateTable, ScreenError> {
    let mut reader = csv::ReaderBuilder::new()
        .from_path(path)
        .map_err(|e| ScreenError::Io(format!("Cannot open '{}': {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| ScreenError::Serialization(format!("CSV header error: {}", e)))?
        .clone();
    let title_column = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("title"))
        .ok_or_else(|| {
            ScreenError::Serialization(format!(
                "'{}' has no title column (found: {})",
                path.display(),
                headers.iter().collect::<Vec<_>>().join(", ")
            ))
        })?;

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let row = result
            .map_err(|e| ScreenError::Serialization(format!("line {}: {}", line + 2, e)))?;
        rows.push(row);
    }

    Ok(CandidateTable {
        headers,
        title_column,
        rows,
    })
}

/// Write raw rows under `headers`.
pub fn write_candidate_rows(
    path: &Path,
    headers: &csv::StringRecord,
    rows: &[csv::StringRecord],
) -> Result<(), ScreenError> {
    let header: Vec<&str> = headers.iter().collect();
    write_csv(path, &header, rows, |r| r.iter().map(str::to_string).collect())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use litscreen_core::{AbstractResolver, Pipeline, ScreeningConfig, Source};

    fn report() -> ScreeningReport {
        let records = vec![
            CanonicalRecord::new(Source::Scopus, "s1")
                .with_title("Deep reinforcement learning for ventilator weaning")
                .with_authors(["A One", "B Two"])
                .with_year(Some(2020))
                .with_doi("10.1/a"),
            CanonicalRecord::new(Source::Arxiv, "x1").with_title("Protein folding"),
        ];
        Pipeline::new(ScreeningConfig::default(), AbstractResolver::empty())
            .expect("pipeline")
            .run(records)
    }

    #[test]
    fn writes_every_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let written = write_report(dir.path(), &report()).expect("write");

        let names: Vec<String> = written
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert!(names.contains(&"unified_all.jsonl".to_string()));
        assert!(names.contains(&"excluded_non_mv_weaning.csv".to_string()));
        assert!(names.contains(&"rescue_confirmed_excluded.jsonl".to_string()));
        assert_eq!(names.last().map(String::as_str), Some("prisma_counts.json"));
        for path in &written {
            assert!(path.exists(), "{} missing", path.display());
        }
    }

    #[test]
    fn csv_joins_authors_and_adds_flags() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_report(dir.path(), &report()).expect("write");

        let csv =
            std::fs::read_to_string(dir.path().join("screened_candidates.csv")).expect("read");
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("source,id,title,authors,year,doi,url,venue,match_mv,match_weaning,match_rl")
        );
        let row = lines.next().expect("row");
        assert!(row.contains("A One; B Two"));
        assert!(row.ends_with("true,true,true"));
    }

    #[test]
    fn excluded_csv_carries_reason() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_report(dir.path(), &report()).expect("write");

        let csv = std::fs::read_to_string(dir.path().join("excluded_non_mv_weaning.csv"))
            .expect("read");
        assert!(csv.lines().nth(1).is_some_and(|l| l.ends_with("\"no_mv,no_weaning\"")));
    }

    #[test]
    fn empty_csv_still_has_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.csv");
        write_csv::<CanonicalRecord, _>(&path, &BASE_COLUMNS, &[], base_row).expect("write");
        let text = std::fs::read_to_string(&path).expect("read");
        assert_eq!(text, "source,id,title,authors,year,doi,url,venue\n");
    }

    #[test]
    fn candidate_table_finds_title_case_insensitively() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("candidates.csv");
        std::fs::write(&path, "id,Title,year\n1,Ventilator weaning,2020\n2,A review,2019\n")
            .expect("write");

        let table = read_candidate_table(&path).expect("read");
        assert_eq!(table.title_column, 1);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.title(&table.rows[1]), "A review");

        let out = dir.path().join("kept.csv");
        write_candidate_rows(&out, &table.headers, &table.rows[..1]).expect("write");
        let text = std::fs::read_to_string(&out).expect("read");
        assert_eq!(text, "id,Title,year\n1,Ventilator weaning,2020\n");
    }

    #[test]
    fn candidate_table_requires_title() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("candidates.csv");
        std::fs::write(&path, "id,name\n1,x\n").expect("write");
        assert!(matches!(
            read_candidate_table(&path),
            Err(ScreenError::Serialization(_))
        ));
    }
}

//! CSV ingest and reshape.
//!
//! Turns a score table into a clean, sorted list of [`ScorePoint`]s.
//! Two layouts are accepted and detected from the headers:
//!
//! - **long**: `country, year, score[, change]`, one observation per row
//! - **wide**: `country` plus one column per year (`2000, 2001, ...`)
//!
//! Design goals:
//! - **Strict schema** for the headers (clear errors + exit code 2)
//! - **Cell-level tolerance**: empty or non-numeric scores are skipped and
//!   counted, duplicates become row errors, neither is fatal
//! - **Deterministic output**: points sorted by country then year

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::{DatasetStats, ScorePoint};
use crate::error::AppError;

const COUNTRY_ALIASES: [&str; 3] = ["country", "country_name", "country name"];
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

/// Table layout resolved from the headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableLayout {
    Long {
        year: usize,
        score: usize,
        change: Option<usize>,
    },
    /// `(column index, year)` for every year column, in header order.
    Wide { years: Vec<(usize, i32)> },
}

impl TableLayout {
    pub fn name(&self) -> &'static str {
        match self {
            TableLayout::Long { .. } => "long",
            TableLayout::Wide { .. } => "wide",
        }
    }
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub country: Option<String>,
    pub message: String,
}

/// Ingest output: sorted points + stats + what was skipped.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub points: Vec<ScorePoint>,
    pub layout: &'static str,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    /// Score cells that became points.
    pub cells_used: usize,
    /// Empty or non-numeric score cells.
    pub cells_skipped: usize,
}

/// Load a score table from disk.
pub fn load_score_points(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let data = read_score_points(file)?;
    info!(
        path = %path.display(),
        layout = data.layout,
        points = data.points.len(),
        countries = data.stats.n_countries,
        skipped_cells = data.cells_skipped,
        row_errors = data.row_errors.len(),
        "ingested score table"
    );
    Ok(data)
}

/// Parse a score table from any reader.
pub fn read_score_points<R: Read>(input: R) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let country_idx = COUNTRY_ALIASES
        .iter()
        .find_map(|name| header_map.get(*name).copied())
        .ok_or_else(|| AppError::new(2, "Missing required column: `country`"))?;
    let layout = detect_layout(&headers, &header_map)?;

    // (point, line) so duplicates can be reported against their source line.
    let mut raw: Vec<(ScorePoint, usize)> = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut cells_skipped = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    country: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let Some(country) = get_optional(&record, country_idx) else {
            row_errors.push(RowError {
                line,
                country: None,
                message: "Missing required value: `country`".to_string(),
            });
            continue;
        };

        match &layout {
            TableLayout::Long { year, score, change } => {
                let year_cell = get_optional(&record, *year).unwrap_or("");
                let Ok(year) = year_cell.parse::<i32>() else {
                    row_errors.push(RowError {
                        line,
                        country: Some(country.to_string()),
                        message: format!("Invalid year '{year_cell}'"),
                    });
                    continue;
                };
                let Some(score) = parse_opt_f64(get_optional(&record, *score)) else {
                    cells_skipped += 1;
                    continue;
                };
                let change = change.and_then(|c| parse_opt_f64(get_optional(&record, c)));
                raw.push((
                    ScorePoint {
                        country: country.to_string(),
                        year,
                        score,
                        change,
                    },
                    line,
                ));
            }
            TableLayout::Wide { years } => {
                for &(col, year) in years {
                    match parse_opt_f64(get_optional(&record, col)) {
                        Some(score) => raw.push((
                            ScorePoint {
                                country: country.to_string(),
                                year,
                                score,
                                change: None,
                            },
                            line,
                        )),
                        None => cells_skipped += 1,
                    }
                }
            }
        }
    }

    let points = dedupe_and_fill_changes(raw, &mut row_errors);
    if !row_errors.is_empty() {
        warn!(count = row_errors.len(), "row errors during ingest");
    }

    let stats = DatasetStats::from_points(&points)
        .ok_or_else(|| AppError::new(3, "No valid score observations remain after ingest."))?;

    Ok(IngestedData {
        cells_used: points.len(),
        points,
        layout: layout.name(),
        stats,
        row_errors,
        rows_read,
        cells_skipped,
    })
}

fn detect_layout(headers: &StringRecord, header_map: &HashMap<String, usize>) -> Result<TableLayout, AppError> {
    if let (Some(&year), Some(&score)) = (header_map.get("year"), header_map.get("score")) {
        return Ok(TableLayout::Long {
            year,
            score,
            change: header_map.get("change").copied(),
        });
    }

    let years: Vec<(usize, i32)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            let year = normalize_header_name(name).parse::<i32>().ok()?;
            YEAR_RANGE.contains(&year).then_some((idx, year))
        })
        .collect();
    if !years.is_empty() {
        return Ok(TableLayout::Wide { years });
    }

    Err(AppError::new(
        2,
        "Unrecognized table layout: expected `year` + `score` columns (long) or year-named columns (wide).",
    ))
}

/// Sort by (country, year), drop duplicate pairs, and fill missing changes
/// from the previous observed score.
fn dedupe_and_fill_changes(raw: Vec<(ScorePoint, usize)>, row_errors: &mut Vec<RowError>) -> Vec<ScorePoint> {
    let mut by_key: BTreeMap<(String, i32), ScorePoint> = BTreeMap::new();
    for (point, line) in raw {
        let key = (point.country.clone(), point.year);
        if by_key.contains_key(&key) {
            row_errors.push(RowError {
                line,
                country: Some(point.country),
                message: format!("Duplicate observation for year {}", point.year),
            });
            continue;
        }
        by_key.insert(key, point);
    }

    let mut points: Vec<ScorePoint> = by_key.into_values().collect();
    for i in 1..points.len() {
        if points[i].change.is_none() && points[i].country == points[i - 1].country {
            points[i].change = Some(points[i].score - points[i - 1].score);
        }
    }
    points
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_optional(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let v = s?.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_table_with_bom_and_gaps() {
        let csv = "\u{feff}Country,2019,2020,2021\nChile,70.5,,72.0\nPeru,65,66,n/a\n";
        let data = read_score_points(csv.as_bytes()).unwrap();
        assert_eq!(data.layout, "wide");
        assert_eq!(data.rows_read, 2);
        assert_eq!(data.cells_used, 4);
        assert_eq!(data.cells_skipped, 2);

        let chile: Vec<&ScorePoint> = data.points.iter().filter(|p| p.country == "Chile").collect();
        assert_eq!(chile[0].year, 2019);
        assert_eq!(chile[0].change, None);
        // Gap year: change is against the previous observed score.
        assert_eq!(chile[1].year, 2021);
        assert_eq!(chile[1].change, Some(1.5));
        assert_eq!(data.stats.n_countries, 2);
    }

    #[test]
    fn long_table_sorted_and_keeps_given_changes() {
        let csv = "country,year,score,change\nB,2021,61,\nA,2021,55,9.0\nA,2020,50,\nB,2020,60,\n";
        let data = read_score_points(csv.as_bytes()).unwrap();
        assert_eq!(data.layout, "long");
        let keys: Vec<(&str, i32)> = data.points.iter().map(|p| (p.country.as_str(), p.year)).collect();
        assert_eq!(keys, vec![("A", 2020), ("A", 2021), ("B", 2020), ("B", 2021)]);
        assert_eq!(data.points[1].change, Some(9.0));
        assert_eq!(data.points[3].change, Some(1.0));
    }

    #[test]
    fn duplicates_and_bad_years_are_row_errors() {
        let csv = "country,year,score\nA,2020,50\nA,2020,51\nA,twenty,52\n,2021,40\n";
        let data = read_score_points(csv.as_bytes()).unwrap();
        assert_eq!(data.points.len(), 1);
        assert_eq!(data.points[0].score, 50.0);
        assert_eq!(data.row_errors.len(), 3);
        assert!(data.row_errors.iter().any(|e| e.message.contains("Duplicate")));
        assert!(data.row_errors.iter().any(|e| e.message.contains("twenty")));
    }

    #[test]
    fn schema_errors_exit_2_and_empty_data_exits_3() {
        let err = read_score_points("name,score\nA,1\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let err = read_score_points("country,notes\nA,x\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let err = read_score_points("country,2020\nA,\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}

use std::collections::HashMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::MergeError;
use crate::table::{RawTable, fragment_root, is_blank_table, parse_table};

/// Header the site leaves blank over the match-result column.
pub const RAW_RESULT_COLUMN: &str = "Unnamed: 6";
pub const RESULT_COLUMN: &str = "Result";
pub const WON_COLUMN: &str = "Won";
pub const SCORE_COLUMN: &str = "Score";

static DEFEAT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bd\.").expect("defeat regex"));
static COUNTRY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("country regex"));
static MADE_FACED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*/\s*(\d+)$").expect("made/faced regex"));

const DATE_FORMATS: [&str; 2] = ["%d-%b-%Y", "%Y-%m-%d"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Bool,
    Int,
    Percent,
    Float,
    Date,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
    pub values: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchTable {
    columns: Vec<Column>,
    rows: usize,
}

impl MatchTable {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|col| col.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|col| col.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn row(&self, idx: usize) -> Option<Vec<(&str, &Cell)>> {
        if idx >= self.rows {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|col| (col.name.as_str(), &col.values[idx]))
                .collect(),
        )
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<(&str, &Cell)>> + '_ {
        (0..self.rows).filter_map(move |idx| self.row(idx))
    }
}

/// Merges the fragments captured from one page, in capture order.
///
/// The first fragment decides whether there is anything to merge: blank means
/// the URL was bad, a paragraph means the filters matched nothing.
pub fn merge(fragments: &[String]) -> Result<MatchTable, MergeError> {
    let first = fragments.first().map(String::as_str).unwrap_or_default();
    match fragment_root(first).as_deref() {
        None => return Err(MergeError::EmptyResult),
        Some("p") => return Err(MergeError::NoMatches),
        Some("table") if is_blank_table(first) => return Err(MergeError::EmptyResult),
        Some("table") => {}
        Some(other) => {
            return Err(MergeError::UnexpectedPage {
                found: other.to_string(),
            });
        }
    }

    let mut joined = parse_table(first)?;
    for (index, fragment) in fragments.iter().enumerate().skip(1) {
        let next = parse_table(fragment)?;
        joined = inner_join(joined, next, index)?;
    }
    // The last row only holds a "more matches" link.
    joined.rows.pop();
    debug!(
        fragments = fragments.len(),
        rows = joined.rows.len(),
        columns = joined.columns.len(),
        "joined table fragments"
    );

    let result_idx = find_result_column(&joined)
        .ok_or_else(|| MergeError::MissingColumn(RAW_RESULT_COLUMN.to_string()))?;
    joined.columns[result_idx] = RESULT_COLUMN.to_string();

    let won = derive_won(&joined, result_idx)?;
    build_table(joined, won)
}

/// Inner join on every column the two tables share. Left row order is kept;
/// matching right rows follow in their own order. Empty cells match each other.
fn inner_join(left: RawTable, right: RawTable, index: usize) -> Result<RawTable, MergeError> {
    let shared: Vec<(usize, usize)> = left
        .columns
        .iter()
        .enumerate()
        .filter_map(|(li, name)| right.column_index(name).map(|ri| (li, ri)))
        .collect();
    if shared.is_empty() {
        return Err(MergeError::Join { index });
    }
    let right_extra: Vec<usize> = (0..right.columns.len())
        .filter(|ri| !shared.iter().any(|(_, shared_ri)| shared_ri == ri))
        .collect();

    let mut by_key: HashMap<Vec<Option<&str>>, Vec<usize>> = HashMap::new();
    for (row_idx, row) in right.rows.iter().enumerate() {
        let key = shared.iter().map(|(_, ri)| row[*ri].as_deref()).collect();
        by_key.entry(key).or_default().push(row_idx);
    }

    let mut rows = Vec::new();
    for left_row in &left.rows {
        let key: Vec<Option<&str>> = shared.iter().map(|(li, _)| left_row[*li].as_deref()).collect();
        let Some(matches) = by_key.get(&key) else {
            continue;
        };
        for right_idx in matches {
            let right_row = &right.rows[*right_idx];
            let mut row = left_row.clone();
            row.extend(right_extra.iter().map(|ri| right_row[*ri].clone()));
            rows.push(row);
        }
    }

    let mut columns = left.columns;
    columns.extend(right_extra.iter().map(|ri| right.columns[*ri].clone()));
    Ok(RawTable { columns, rows })
}

fn find_result_column(table: &RawTable) -> Option<usize> {
    table.column_index(RAW_RESULT_COLUMN).or_else(|| {
        // Fall back to a blank-headed column that reads like results.
        table.columns.iter().enumerate().find_map(|(idx, name)| {
            let looks_like_results = name.starts_with("Unnamed: ")
                && table
                    .rows
                    .iter()
                    .any(|row| row[idx].as_deref().is_some_and(|v| DEFEAT_RE.is_match(v)));
            looks_like_results.then_some(idx)
        })
    })
}

/// A match is won when the defeat marker precedes the opponent's country tag:
/// `d. Roger Federer [SUI]` is a win, `Roger Federer [SUI] d.` a loss.
pub fn result_is_win(text: &str, row: usize) -> Result<bool, MergeError> {
    let unparseable = |reason| MergeError::UnparseableResult {
        row,
        reason,
        text: text.to_string(),
    };
    let defeats: Vec<usize> = DEFEAT_RE.find_iter(text).map(|m| m.start()).collect();
    let [defeat] = defeats[..] else {
        return Err(unparseable("losing player is unclear"));
    };
    let countries: Vec<usize> = COUNTRY_RE.find_iter(text).map(|m| m.start()).collect();
    let [country] = countries[..] else {
        return Err(unparseable("opponent country is unclear"));
    };
    Ok(defeat < country)
}

fn derive_won(table: &RawTable, result_idx: usize) -> Result<Vec<Cell>, MergeError> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let text = cells[result_idx].as_deref().unwrap_or_default();
            result_is_win(text, row).map(Cell::Bool)
        })
        .collect()
}

fn build_table(table: RawTable, won: Vec<Cell>) -> Result<MatchTable, MergeError> {
    let row_count = table.rows.len();
    let score_idx = table
        .column_index(SCORE_COLUMN)
        .ok_or_else(|| MergeError::MissingColumn(SCORE_COLUMN.to_string()))?;

    let mut columns = Vec::with_capacity(table.columns.len() + 2);
    for (idx, name) in table.columns.iter().enumerate() {
        if idx == score_idx {
            columns.push(Column {
                name: WON_COLUMN.to_string(),
                kind: ColumnType::Bool,
                values: won.clone(),
            });
        }
        let raw: Vec<Option<&str>> = table.rows.iter().map(|row| row[idx].as_deref()).collect();
        columns.extend(type_column(name, &raw)?);
    }

    Ok(MatchTable {
        columns,
        rows: row_count,
    })
}

/// Types one raw column by its first non-empty value. Composite `made/faced`
/// columns split in two; a column whose later values disagree stays text.
fn type_column(name: &str, raw: &[Option<&str>]) -> Result<Vec<Column>, MergeError> {
    let Some(first) = raw.iter().flatten().next() else {
        return Ok(vec![text_column(name, raw)]);
    };

    if name == RESULT_COLUMN || name == SCORE_COLUMN {
        return Ok(vec![text_column(name, raw)]);
    }
    if first.ends_with('%') {
        if let Some(values) = parse_all(raw, parse_percent) {
            for value in values.iter().flatten() {
                if !(0.0..=100.0).contains(value) {
                    return Err(MergeError::PercentOutOfRange {
                        column: name.to_string(),
                        value: *value,
                    });
                }
            }
            return Ok(vec![Column {
                name: name.to_string(),
                kind: ColumnType::Percent,
                values: values.into_iter().map(|v| v.map_or(Cell::Null, Cell::Float)).collect(),
            }]);
        }
    } else if MADE_FACED_RE.is_match(first) {
        if let Some(pairs) = parse_all(raw, parse_made_faced) {
            let (made, faced): (Vec<Cell>, Vec<Cell>) = pairs
                .into_iter()
                .map(|pair| match pair {
                    Some((made, faced)) => (Cell::Int(made), Cell::Int(faced)),
                    None => (Cell::Null, Cell::Null),
                })
                .unzip();
            return Ok(vec![
                Column {
                    name: format!("{name} Made"),
                    kind: ColumnType::Int,
                    values: made,
                },
                Column {
                    name: format!("{name} Faced"),
                    kind: ColumnType::Int,
                    values: faced,
                },
            ]);
        }
    } else if parse_number(first).is_some() {
        if let Some(values) = parse_all(raw, parse_number) {
            let integral = values
                .iter()
                .flatten()
                .all(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64);
            let (kind, cells) = if integral {
                let cells = values.into_iter().map(|v| v.map_or(Cell::Null, |v| Cell::Int(v as i64)));
                (ColumnType::Int, cells.collect())
            } else {
                let cells = values.into_iter().map(|v| v.map_or(Cell::Null, Cell::Float));
                (ColumnType::Float, cells.collect())
            };
            return Ok(vec![Column {
                name: name.to_string(),
                kind,
                values: cells,
            }]);
        }
    } else if parse_date(first).is_some() {
        if let Some(values) = parse_all(raw, parse_date) {
            return Ok(vec![Column {
                name: name.to_string(),
                kind: ColumnType::Date,
                values: values.into_iter().map(|v| v.map_or(Cell::Null, Cell::Date)).collect(),
            }]);
        }
    }

    Ok(vec![text_column(name, raw)])
}

fn parse_all<T>(raw: &[Option<&str>], parse: impl Fn(&str) -> Option<T>) -> Option<Vec<Option<T>>> {
    raw.iter()
        .map(|cell| match cell {
            Some(text) => parse(text).map(Some),
            None => Some(None),
        })
        .collect()
}

/// Finite numbers only; `NaN` and `inf` spellings stay text.
fn parse_number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_percent(text: &str) -> Option<f64> {
    parse_number(text.strip_suffix('%')?.trim())
}

fn parse_made_faced(text: &str) -> Option<(i64, i64)> {
    let caps = MADE_FACED_RE.captures(text)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

fn text_column(name: &str, raw: &[Option<&str>]) -> Column {
    Column {
        name: name.to_string(),
        kind: ColumnType::Text,
        values: raw
            .iter()
            .map(|cell| cell.map_or(Cell::Null, |text| Cell::Text(text.to_string())))
            .collect(),
    }
}

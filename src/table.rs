use std::collections::HashSet;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::error::MergeError;

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("table selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("row selector"));
static HEAD_ROW: Lazy<Selector> =
    Lazy::new(|| Selector::parse("thead tr").expect("head row selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").expect("cell selector"));

/// Largest `colspan` honoured, as in HTML's own limit.
const MAX_COLSPAN: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col == name)
    }
}

pub fn fragment_root(html: &str) -> Option<String> {
    if html.trim().is_empty() {
        return None;
    }
    let fragment = Html::parse_fragment(html);
    let root = fragment
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .next()?;
    Some(root.value().name().to_ascii_lowercase())
}

pub fn is_blank_table(html: &str) -> bool {
    let fragment = Html::parse_fragment(html);
    fragment.select(&ROW).next().is_none()
}

/// Parses the first table in `html`. Empty header cells become `Unnamed: <i>`
/// and repeated names get a `.1`, `.2` suffix. A cell spanning several columns
/// repeats its text in each.
pub fn parse_table(html: &str) -> Result<RawTable, MergeError> {
    let fragment = Html::parse_fragment(html);
    let table = fragment
        .select(&TABLE)
        .next()
        .ok_or_else(|| MergeError::UnexpectedPage {
            found: fragment_root(html).unwrap_or_default(),
        })?;

    let header_row = table.select(&HEAD_ROW).next().or_else(|| {
        table.select(&ROW).find(|row| {
            let mut cells = row.select(&CELL).peekable();
            cells.peek().is_some() && cells.all(|cell| cell.value().name() == "th")
        })
    });
    let mut header = header_row
        .map(|row| row_cells(row, MAX_COLSPAN))
        .unwrap_or_default();
    let limit = if header.is_empty() { MAX_COLSPAN } else { header.len() };

    let mut rows = Vec::new();
    for row in table.select(&ROW) {
        if Some(row.id()) == header_row.map(|h| h.id()) || in_thead(row) {
            continue;
        }
        let cells = row_cells(row, limit);
        if !cells.is_empty() {
            rows.push(cells);
        }
    }

    let width = if header.is_empty() {
        rows.iter().map(Vec::len).max().unwrap_or(0)
    } else {
        header.len()
    };
    header.resize(width, None);
    for row in &mut rows {
        row.resize(width, None);
    }
    let columns = name_columns(&header);

    Ok(RawTable { columns, rows })
}

fn in_thead(row: ElementRef<'_>) -> bool {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().name() == "thead")
}

fn row_cells(row: ElementRef<'_>, limit: usize) -> Vec<Option<String>> {
    let mut cells = Vec::new();
    for cell in row.select(&CELL) {
        if cells.len() >= limit {
            break;
        }
        let text = cell_text(cell);
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .clamp(1, MAX_COLSPAN)
            .min(limit - cells.len());
        cells.extend(std::iter::repeat_n(text, span));
    }
    cells
}

fn cell_text(cell: ElementRef<'_>) -> Option<String> {
    let joined = cell.text().collect::<String>().replace('\u{a0}', " ");
    let text = joined.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() { None } else { Some(text) }
}

fn name_columns(header: &[Option<String>]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::with_capacity(header.len());
    let mut taken: HashSet<String> = HashSet::with_capacity(header.len());
    for (idx, name) in header.iter().enumerate() {
        let base = name.clone().unwrap_or_else(|| format!("Unnamed: {idx}"));
        let mut candidate = base.clone();
        let mut n = 1;
        while taken.contains(&candidate) {
            candidate = format!("{base}.{n}");
            n += 1;
        }
        taken.insert(candidate.clone());
        columns.push(candidate);
    }
    columns
}

//! HTML table helpers shared by the scraping sources.
//!
//! Columns are resolved by header text first. Each source also carries a
//! versioned positional layout used when a page has no recognizable header.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

// Selector::parse() only fails on invalid CSS; these are constants.
static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());

/// Positional column layout, used when header resolution fails.
#[derive(Debug)]
pub struct PositionalLayout<F: 'static> {
    /// Layout identifier reported in logs and schema errors
    pub version: &'static str,
    /// Exact number of cells a data row must have
    pub width: usize,
    pub columns: &'static [(F, usize)],
}

/// Where a [`ColumnMap`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutSource {
    Header,
    Positional(&'static str),
}

/// Field → cell index mapping for one table.
#[derive(Debug, Clone)]
pub struct ColumnMap<F> {
    columns: Vec<(F, usize)>,
    pub source: LayoutSource,
    /// Rows must have exactly this many cells (positional layouts only)
    pub required_width: Option<usize>,
}

impl<F: Copy + PartialEq> ColumnMap<F> {
    /// Resolve fields from header labels. For each field the first alias
    /// present in the header wins.
    pub fn from_header(header: &[String], aliases: &[(F, &[&str])]) -> Self {
        let normalized: Vec<String> = header.iter().map(|h| normalize_label(h)).collect();
        let mut columns = Vec::new();

        for (field, names) in aliases {
            let found = names.iter().find_map(|name| {
                let wanted = normalize_label(name);
                normalized.iter().position(|h| *h == wanted)
            });
            if let Some(idx) = found {
                columns.push((*field, idx));
            }
        }

        Self {
            columns,
            source: LayoutSource::Header,
            required_width: None,
        }
    }

    pub fn positional(layout: &PositionalLayout<F>) -> Self {
        Self {
            columns: layout.columns.to_vec(),
            source: LayoutSource::Positional(layout.version),
            required_width: Some(layout.width),
        }
    }

    pub fn index(&self, field: F) -> Option<usize> {
        self.columns
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, idx)| *idx)
    }

    pub fn covers(&self, required: &[F]) -> bool {
        required.iter().all(|f| self.index(*f).is_some())
    }

    /// Whether a row with `cell_count` cells can be read with this map.
    pub fn accepts_width(&self, cell_count: usize) -> bool {
        match self.required_width {
            Some(width) => cell_count == width,
            None => self
                .columns
                .iter()
                .all(|(_, idx)| *idx < cell_count),
        }
    }
}

/// Lowercased alphanumerics only, so "Logged At ⇧", "LoggedAt" and
/// "logged at" compare equal.
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Text content with whitespace runs collapsed to single spaces.
pub fn cell_text(cell: &ElementRef) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Non-empty text nodes of a cell. `<br>`-separated values come back as
/// separate entries.
pub fn cell_segments(cell: &ElementRef) -> Vec<String> {
    cell.text()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Rows that belong to `table` itself, skipping rows of nested tables.
pub fn direct_rows<'a>(table: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    table
        .select(&ROW_SELECTOR)
        .filter(|row| belongs_to(row, &table))
        .collect()
}

/// `th`/`td` children of a row, in order.
pub fn row_cells<'a>(row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
        .collect()
}

/// A header row has cells and all of them are `th`.
pub fn is_header_row(cells: &[ElementRef]) -> bool {
    !cells.is_empty() && cells.iter().all(|c| c.value().name() == "th")
}

/// Data rows of `table` as cell lists; header rows are dropped.
pub fn data_rows<'a>(table: ElementRef<'a>) -> Vec<Vec<ElementRef<'a>>> {
    direct_rows(table)
        .into_iter()
        .map(row_cells)
        .filter(|cells| !cells.is_empty() && !is_header_row(cells))
        .collect()
}

/// First table in the document whose header row resolves all `required`
/// fields.
pub fn find_table_by_header<'a, F: Copy + PartialEq>(
    document: &'a Html,
    aliases: &[(F, &[&str])],
    required: &[F],
) -> Option<(ElementRef<'a>, ColumnMap<F>)> {
    find_header_table_among(document.select(&TABLE_SELECTOR), aliases, required)
}

/// Like [`find_table_by_header`], restricted to the given candidate tables.
pub fn find_header_table_among<'a, F: Copy + PartialEq>(
    tables: impl IntoIterator<Item = ElementRef<'a>>,
    aliases: &[(F, &[&str])],
    required: &[F],
) -> Option<(ElementRef<'a>, ColumnMap<F>)> {
    tables.into_iter().find_map(|table| {
        let header = direct_rows(table)
            .into_iter()
            .map(row_cells)
            .find(|cells| is_header_row(cells))?;
        let labels: Vec<String> = header.iter().map(cell_text).collect();
        let columns = ColumnMap::from_header(&labels, aliases);
        columns.covers(required).then_some((table, columns))
    })
}

/// Tables inside any element matching `container`, in document order.
pub fn tables_within<'a>(document: &'a Html, container: &Selector) -> Vec<ElementRef<'a>> {
    let mut tables: Vec<ElementRef<'a>> = Vec::new();
    for scope in document.select(container) {
        for t in scope.select(&TABLE_SELECTOR) {
            if !tables.iter().any(|seen| seen.id() == t.id()) {
                tables.push(t);
            }
        }
    }
    tables
}

/// Descendant tables of `element`, excluding `element` itself.
pub fn nested_tables<'a>(element: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    element
        .select(&TABLE_SELECTOR)
        .filter(|t| t.id() != element.id())
        .collect()
}

fn belongs_to(row: &ElementRef, table: &ElementRef) -> bool {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
        .is_some_and(|el| el.id() == table.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Col {
        Name,
        Ip,
    }

    const ALIASES: &[(Col, &[&str])] = &[(Col::Name, &["Subdomain", "Host"]), (Col::Ip, &["IP"])];

    #[test]
    fn test_normalize_label_ignores_spacing_and_arrows() {
        assert_eq!(normalize_label("Logged At ⇧"), "loggedat");
        assert_eq!(normalize_label("LoggedAt"), "loggedat");
        assert_eq!(normalize_label("crt.sh ID"), "crtshid");
    }

    #[test]
    fn test_header_resolution_with_reordered_columns() {
        let header = vec!["IP".to_string(), "#".to_string(), "Host".to_string()];
        let map = ColumnMap::from_header(&header, ALIASES);
        assert_eq!(map.index(Col::Ip), Some(0));
        assert_eq!(map.index(Col::Name), Some(2));
        assert_eq!(map.source, LayoutSource::Header);
        assert!(map.accepts_width(3));
        assert!(!map.accepts_width(2));
    }

    #[test]
    fn test_direct_rows_skip_nested_table_rows() {
        let html = Html::parse_document(
            "<table id=outer><tr><th>Certificates</th><td><table id=inner>\
             <tr><th>Subdomain</th><th>IP</th></tr>\
             <tr><td>a.example.com</td><td>1.1.1.1</td></tr>\
             </table></td></tr></table>",
        );
        let outer = html
            .select(&Selector::parse("#outer").unwrap())
            .next()
            .unwrap();
        assert_eq!(direct_rows(outer).len(), 1);

        let (table, map) = find_table_by_header(&html, ALIASES, &[Col::Name, Col::Ip]).unwrap();
        assert_eq!(table.value().id(), Some("inner"));
        assert_eq!(map.index(Col::Ip), Some(1));
        assert_eq!(data_rows(table).len(), 1);
    }

    #[test]
    fn test_tables_within_container_only() {
        let html = Html::parse_document(
            "<table id=nav><tr><th>Subdomain</th><th>IP</th></tr></table>\
             <div class=well><table id=results><tr><th>Host</th><th>IP</th></tr>\
             <tr><td>a.example.com</td><td>192.0.2.1</td></tr></table></div>",
        );
        let scoped = tables_within(&html, &Selector::parse(".well").unwrap());
        assert_eq!(scoped.len(), 1);

        let (table, _) = find_header_table_among(scoped, ALIASES, &[Col::Name, Col::Ip]).unwrap();
        assert_eq!(table.value().id(), Some("results"));

        let (first, _) = find_table_by_header(&html, ALIASES, &[Col::Name, Col::Ip]).unwrap();
        assert_eq!(first.value().id(), Some("nav"));
    }

    #[test]
    fn test_cell_segments_split_on_br() {
        let html = Html::parse_fragment("<table><tr><td>a.example.com<br>www.a.example.com</td></tr></table>");
        let td = html.select(&Selector::parse("td").unwrap()).next().unwrap();
        assert_eq!(cell_segments(&td), vec!["a.example.com", "www.a.example.com"]);
        assert_eq!(cell_text(&td), "a.example.com www.a.example.com");
    }
}

//! Plain-text rendering of tables and pager lines.

use markflow_shared::{PageInfo, ResourceStatus};

/// Column-aligned text table.
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    /// Table with the given column headers.
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|header| header.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; missing cells render empty, extra cells are dropped.
    pub fn row(&mut self, cells: Vec<String>) {
        let mut cells = cells;
        cells.resize(self.headers.len(), String::new());
        self.rows.push(cells);
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True without data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render with a header rule. An empty table renders `empty_text`.
    pub fn render(&self, empty_text: &str) -> String {
        if self.rows.is_empty() {
            return empty_text.to_string();
        }
        let widths: Vec<usize> = (0..self.headers.len())
            .map(|column| {
                self.rows
                    .iter()
                    .map(|row| row[column].chars().count())
                    .chain(std::iter::once(self.headers[column].chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = vec![line(&self.headers)];
        out.push(
            widths
                .iter()
                .map(|width| "-".repeat(*width))
                .collect::<Vec<_>>()
                .join("  "),
        );
        out.extend(self.rows.iter().map(|row| line(row)));
        out.join("\n")
    }
}

/// `page 2/5 (47 total)  « ‹ 1 [2] 3 4 5 › »` with unavailable moves shown
/// as `-`.
pub fn pager_line(info: &PageInfo) -> String {
    let controls = info.controls();
    let arrow = |enabled: bool, symbol: &'static str| if enabled { symbol } else { "-" };
    let pages = info
        .window()
        .map(|page| {
            if page == info.page {
                format!("[{page}]")
            } else {
                page.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "page {}/{} ({} total)  {} {} {} {} {}",
        info.page,
        info.total_pages,
        info.total,
        arrow(controls.first, "«"),
        arrow(controls.prev, "‹"),
        pages,
        arrow(controls.next, "›"),
        arrow(controls.last, "»"),
    )
}

/// Status label with a marker while still processing.
pub fn status_cell(status: &ResourceStatus) -> String {
    if status.is_processing() {
        format!("{} …", status.label())
    } else {
        status.label().to_string()
    }
}

/// Optional value, or `-`.
pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

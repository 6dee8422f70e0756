use crate::schema::FinancialStatement;

pub const LABEL_HEADER: &str = "Description";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<String>,
    /// Subtotal or total row, drawn with emphasis
    pub emphasized: bool,
}

/// A statement laid out for display: label column first, then one column per year.
///
/// Cell text is copied as-is; no number parsing or formatting happens here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementTable {
    pub title: String,
    pub header: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl StatementTable {
    pub fn from_statement(statement: &FinancialStatement) -> Self {
        let mut header = Vec::with_capacity(statement.years.len() + 1);
        header.push(LABEL_HEADER.to_string());
        header.extend(statement.years.iter().cloned());

        let rows = statement
            .rows
            .iter()
            .map(|row| {
                let mut cells = Vec::with_capacity(header.len());
                cells.push(row.label.clone());
                cells.extend(row.values.iter().cloned());
                TableRow {
                    cells,
                    emphasized: row.is_total(),
                }
            })
            .collect();

        Self {
            title: statement.title.clone(),
            header,
            rows,
        }
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Aligned plain-text table. Totals are upper-cased with a rule above them.
    pub fn render_text(&self) -> String {
        let widths = self.column_widths();
        let rule: String = widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-");

        let mut lines = Vec::with_capacity(self.rows.len() * 2 + 2);
        lines.push(format_line(&self.header, &widths));
        lines.push(rule.replace('-', "="));

        for row in &self.rows {
            if row.emphasized {
                lines.push(rule.clone());
                let mut cells = row.cells.clone();
                if let Some(label) = cells.first_mut() {
                    *label = label.to_uppercase();
                }
                lines.push(format_line(&cells, &widths));
            } else {
                lines.push(format_line(&row.cells, &widths));
            }
        }

        lines
            .into_iter()
            .map(|l| l.trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// GitHub-flavoured pipe table with total rows in bold.
    pub fn render_markdown(&self) -> String {
        let columns = self.render_width();
        let mut rows = Vec::with_capacity(self.rows.len() + 2);

        let mut header = String::from("|");
        for i in 0..columns {
            let cell = self.header.get(i).map_or("", |s| s.as_str());
            header.push_str(&format!(" {} |", escape_pipe(cell)));
        }
        rows.push(header);

        let mut sep = String::from("| --- |");
        for _ in 1..columns {
            sep.push_str(" ---: |");
        }
        rows.push(sep);

        for row in &self.rows {
            let mut line = String::from("|");
            for i in 0..columns {
                let cell = escape_pipe(row.cells.get(i).map_or("", |s| s.as_str()));
                if row.emphasized && !cell.is_empty() {
                    line.push_str(&format!(" **{}** |", cell));
                } else {
                    line.push_str(&format!(" {} |", cell));
                }
            }
            rows.push(line);
        }

        rows.join("\n")
    }

    // Ragged rows keep their extra values, so the widest row decides.
    fn render_width(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.cells.len())
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0)
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths = vec![0; self.render_width()];
        let all_rows = std::iter::once(&self.header).chain(self.rows.iter().map(|r| &r.cells));
        for cells in all_rows {
            for (i, cell) in cells.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
        widths
    }
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    widths
        .iter()
        .enumerate()
        .map(|(i, width)| {
            let cell = cells.get(i).map_or("", |s| s.as_str());
            if i == 0 {
                format!("{:<width$}", cell, width = width)
            } else {
                format!("{:>width$}", cell, width = width)
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn escape_pipe(cell: &str) -> String {
    cell.replace('|', "\\|")
}

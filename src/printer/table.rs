use comfy_table::Table;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TableData {
    pub headers: Vec<String>,
    /// A cell may span several lines, separated by `\n`.
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    pub fn render(&self) -> Table {
        let mut table = Table::new();
        table.set_header(self.headers.clone());
        for row in &self.rows {
            table.add_row(row.clone());
        }
        table
    }
}

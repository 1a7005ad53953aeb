//! In-memory table model
//!
//! A [`RowSet`] owns the column schema and every row of the table. Rows store
//! their cells positionally against that schema; anything written under a name
//! the schema does not know lands in a per-row stray map that is never persisted.

use std::collections::BTreeMap;

/// Column names of a table in their original order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
    url_idx: usize,
    manifest_idx: usize,
}

impl Schema {
    /// Builds a schema from header names
    ///
    /// Returns `None` if `url_column` is not among the headers. The manifest
    /// column is appended when absent.
    pub fn new(
        mut columns: Vec<String>,
        url_column: &str,
        manifest_column: &str,
    ) -> Option<Self> {
        let url_idx = columns.iter().position(|c| c == url_column)?;
        let manifest_idx = match columns.iter().position(|c| c == manifest_column) {
            Some(idx) => idx,
            None => {
                columns.push(manifest_column.to_string());
                columns.len() - 1
            }
        };

        Some(Self {
            columns,
            url_idx,
            manifest_idx,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn url_column(&self) -> &str {
        &self.columns[self.url_idx]
    }

    pub fn manifest_column(&self) -> &str {
        &self.columns[self.manifest_idx]
    }
}

/// One record of the table
///
/// A missing cell (`None`) comes from a short CSV record and is written back
/// as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<Option<String>>,
    stray: BTreeMap<String, String>,
}

impl Row {
    pub fn new(cells: Vec<Option<String>>) -> Self {
        Self {
            cells,
            stray: BTreeMap::new(),
        }
    }

    /// Value at a schema position, empty if missing
    pub fn cell(&self, idx: usize) -> &str {
        self.cells
            .get(idx)
            .and_then(|c| c.as_deref())
            .unwrap_or("")
    }

    /// Values rendered for output, one per schema column
    pub fn rendered(&self, width: usize) -> Vec<&str> {
        (0..width).map(|idx| self.cell(idx)).collect()
    }

    /// Fields set under names outside the schema
    pub fn stray(&self) -> &BTreeMap<String, String> {
        &self.stray
    }

    fn set_cell(&mut self, idx: usize, value: String) {
        if self.cells.len() <= idx {
            self.cells.resize(idx + 1, None);
        }
        self.cells[idx] = Some(value);
    }
}

/// A unit of work derived from a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Original row index in the table
    pub index: usize,

    /// Trimmed source page URL
    pub url: String,

    /// Label used in progress messages
    pub display_name: String,
}

/// Result of deriving tasks from a [`RowSet`]
#[derive(Debug, Clone, Default)]
pub struct TaskPlan {
    pub tasks: Vec<Task>,

    /// Indices at or after the resume offset that have no url
    pub skipped: Vec<usize>,
}

/// The whole table held in memory
#[derive(Debug, Clone)]
pub struct RowSet {
    schema: Schema,
    rows: Vec<Row>,
}

impl RowSet {
    pub fn new(schema: Schema, rows: Vec<Row>) -> Self {
        Self { schema, rows }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Reads a field of a row by column name
    pub fn get(&self, index: usize, column: &str) -> Option<&str> {
        let row = self.rows.get(index)?;
        match self.schema.position(column) {
            Some(idx) => Some(row.cell(idx)),
            None => row.stray.get(column).map(String::as_str),
        }
    }

    /// Writes a field of a row by column name
    ///
    /// Unknown columns go to the row's stray map, so the schema never grows.
    /// Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, column: &str, value: impl Into<String>) {
        let value = value.into();
        let position = self.schema.position(column);
        let len = self.rows.len();
        let Some(row) = self.rows.get_mut(index) else {
            tracing::warn!("Ignoring write to row {} (table has {} rows)", index, len);
            return;
        };

        match position {
            Some(idx) => row.set_cell(idx, value),
            None => {
                row.stray.insert(column.to_string(), value);
            }
        }
    }

    /// Trimmed url of a row, empty if missing
    pub fn url(&self, index: usize) -> &str {
        self.rows
            .get(index)
            .map(|row| row.cell(self.schema.url_idx).trim())
            .unwrap_or("")
    }

    pub fn manifest(&self, index: usize) -> &str {
        self.rows
            .get(index)
            .map(|row| row.cell(self.schema.manifest_idx))
            .unwrap_or("")
    }

    pub fn set_manifest(&mut self, index: usize, value: impl Into<String>) {
        let column = self.schema.manifest_column().to_string();
        self.set(index, &column, value);
    }

    /// Builds the task list for rows at or after `resume_from`
    pub fn plan_tasks(&self, resume_from: usize) -> TaskPlan {
        let mut plan = TaskPlan::default();

        for (index, row) in self.rows.iter().enumerate().skip(resume_from) {
            let url = self.url(index);
            if url.is_empty() {
                tracing::warn!("Row {} has no URL, skipping", index + 1);
                plan.skipped.push(index);
                continue;
            }

            let display_name = match row.cell(0).trim() {
                "" => format!("item {}", index + 1),
                name => name.to_string(),
            };

            plan.tasks.push(Task {
                index,
                url: url.to_string(),
                display_name,
            });
        }

        plan
    }
}

//! Table module for the CSV work list
//!
//! This module handles:
//! - Loading the full table into an ordered, schema-aligned [`RowSet`]
//! - Deriving the pending task list from a resume offset
//! - Atomically rewriting the table from memory on each flush

mod csv_io;
mod row;

pub use csv_io::{load_table, write_table};
pub use row::{Row, RowSet, Schema, Task, TaskPlan};

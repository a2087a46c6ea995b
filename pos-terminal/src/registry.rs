//! Table State Registry
//!
//! Holds the outlet's table directory and drives status through
//! [`TableStatus::apply`]. The registry never talks to the service itself;
//! the terminal feeds it listings and pushes accepted transitions outward.

use crate::error::{EngineError, EngineResult};
use shared::models::{Table, TableEvent, TableStatus};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct TableRegistry {
    outlet_id: i64,
    tables: HashMap<i64, Table>,
}

impl TableRegistry {
    pub fn new(outlet_id: i64) -> Self {
        Self {
            outlet_id,
            tables: HashMap::new(),
        }
    }

    pub fn outlet_id(&self) -> i64 {
        self.outlet_id
    }

    /// Replace the directory with a fresh listing
    ///
    /// Tables of other outlets are dropped.
    pub fn load(&mut self, tables: Vec<Table>) {
        self.tables = tables
            .into_iter()
            .filter(|t| t.outlet_id == self.outlet_id)
            .map(|t| (t.id, t))
            .collect();
    }

    /// Merge a partial listing (e.g. one department) into the directory
    pub fn refresh(&mut self, tables: Vec<Table>) {
        for table in tables {
            if table.outlet_id == self.outlet_id {
                self.tables.insert(table.id, table);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Look up a selectable table of the active outlet
    pub fn select(&self, table_id: i64) -> EngineResult<&Table> {
        self.tables
            .get(&table_id)
            .filter(|t| t.outlet_id == self.outlet_id)
            .ok_or(EngineError::TableNotFound(table_id))
    }

    pub fn status(&self, table_id: i64) -> EngineResult<TableStatus> {
        self.select(table_id).map(|t| t.status)
    }

    /// Overwrite the status with the service's view
    pub fn set_status(&mut self, table_id: i64, status: TableStatus) -> EngineResult<()> {
        let table = self
            .tables
            .get_mut(&table_id)
            .ok_or(EngineError::TableNotFound(table_id))?;
        table.status = status;
        table.is_billed = status == TableStatus::Billed;
        Ok(())
    }

    /// Compute the status an event would lead to, without applying it
    pub fn preview(&self, table_id: i64, event: TableEvent) -> EngineResult<TableStatus> {
        let current = self.status(table_id)?;
        Ok(current.apply(event)?)
    }

    /// Apply a lifecycle event
    pub fn apply(&mut self, table_id: i64, event: TableEvent) -> EngineResult<TableStatus> {
        let next = self.preview(table_id, event)?;
        self.set_status(table_id, next)?;
        if next == TableStatus::Vacant {
            if let Some(table) = self.tables.get_mut(&table_id) {
                table.pax = None;
            }
        }
        tracing::debug!(table_id, ?event, status = %next, "Table status changed");
        Ok(next)
    }

    pub fn set_pax(&mut self, table_id: i64, pax: Option<u32>) -> EngineResult<()> {
        let table = self
            .tables
            .get_mut(&table_id)
            .ok_or(EngineError::TableNotFound(table_id))?;
        table.pax = pax;
        Ok(())
    }

    /// Tables of one department, ordered by name
    pub fn list_by_department(&self, department_id: i64) -> Vec<Table> {
        let mut tables: Vec<Table> = self
            .tables
            .values()
            .filter(|t| t.department_id == department_id)
            .cloned()
            .collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        tables
    }

    pub fn all(&self) -> Vec<Table> {
        let mut tables: Vec<Table> = self.tables.values().cloned().collect();
        tables.sort_by_key(|t| t.id);
        tables
    }
}

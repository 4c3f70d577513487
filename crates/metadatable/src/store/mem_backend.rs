use super::backend::{RowBackend, StoredRow};
use crate::error::{MetadataError, Result};
use std::cell::RefCell;
use uuid::Uuid;

/// In-memory row backend.
///
/// Uses `RefCell` for interior mutability since hosts are single-threaded.
/// Rows are kept in a `Vec` so loads come back in insertion order.
#[derive(Default)]
pub struct MemBackend {
    rows: RefCell<Vec<StoredRow>>,
    simulate_write_error: RefCell<bool>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }
}

impl RowBackend for MemBackend {
    fn load_rows(&self, owner_id: &Uuid) -> Result<Vec<StoredRow>> {
        let rows = self.rows.borrow();
        Ok(rows
            .iter()
            .filter(|row| row.owner_id == *owner_id)
            .cloned()
            .collect())
    }

    fn write_row(&self, row: &StoredRow) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(MetadataError::Store("Simulated write error".to_string()));
        }
        let mut rows = self.rows.borrow_mut();
        match rows.iter_mut().find(|existing| existing.id == row.id) {
            Some(existing) => *existing = row.clone(),
            None => rows.push(row.clone()),
        }
        Ok(())
    }

    fn delete_row(&self, id: &Uuid) -> Result<()> {
        let mut rows = self.rows.borrow_mut();
        let before = rows.len();
        rows.retain(|row| row.id != *id);
        if rows.len() == before {
            return Err(MetadataError::RowNotFound(*id));
        }
        Ok(())
    }
}

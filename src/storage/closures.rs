//! Monthly closure repository for JSON storage
//!
//! Enforces the `(month, year)` uniqueness of closures: the lookup and the
//! insert happen under the repository lock and the cross-process file lock,
//! against a fresh read of the file, so concurrent callers for the same
//! month (threads or processes) all end up with the same row.

use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::LedgerError;
use crate::models::MonthlyClosure;

use super::file_io::{read_json, write_json_atomic};
use super::lock::FileLock;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub(super) struct ClosureData {
    closures: Vec<MonthlyClosure>,
}

/// Outcome of an idempotent closure insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosureInsert {
    /// The closure was written
    Inserted(MonthlyClosure),
    /// A closure for the same month already existed and is returned unchanged
    Existing(MonthlyClosure),
}

impl ClosureInsert {
    pub fn into_inner(self) -> MonthlyClosure {
        match self {
            Self::Inserted(closure) | Self::Existing(closure) => closure,
        }
    }
}

/// Keep the oldest row of each month
fn first_per_month(mut rows: Vec<MonthlyClosure>) -> Vec<MonthlyClosure> {
    rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    let mut unique: Vec<MonthlyClosure> = Vec::with_capacity(rows.len());
    for closure in rows {
        if !unique.iter().any(|c| c.key() == closure.key()) {
            unique.push(closure);
        }
    }
    unique
}

/// Repository for monthly closures
pub struct ClosureRepository {
    path: PathBuf,
    data: RwLock<Vec<MonthlyClosure>>,
}

impl ClosureRepository {
    /// Create a new closure repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(Vec::new()),
        }
    }

    /// Load closures from disk
    ///
    /// If the file holds several rows for the same month the oldest wins.
    pub fn load(&self) -> Result<(), LedgerError> {
        let file_data: ClosureData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        *data = first_per_month(file_data.closures);

        Ok(())
    }

    /// Get the closure for a month, if one exists
    pub fn get(&self, month: u32, year: i32) -> Result<Option<MonthlyClosure>, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.iter().find(|c| c.matches(month, year)).cloned())
    }

    /// Insert a closure unless its month is already closed
    pub fn insert_if_absent(&self, closure: MonthlyClosure) -> Result<ClosureInsert, LedgerError> {
        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let _lock = FileLock::acquire(&self.path)?;

        let file_data: ClosureData = read_json(&self.path)?;
        let mut rows = first_per_month(file_data.closures);

        if let Some(existing) = rows.iter().find(|c| c.key() == closure.key()) {
            let existing = existing.clone();
            *data = rows;
            return Ok(ClosureInsert::Existing(existing));
        }

        rows.push(closure.clone());
        write_json_atomic(&self.path, &ClosureData { closures: rows.clone() })?;

        *data = rows;
        Ok(ClosureInsert::Inserted(closure))
    }

    /// Get all closures, most recent period first
    pub fn get_all(&self) -> Result<Vec<MonthlyClosure>, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut closures = data.clone();
        closures.sort_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)));
        Ok(closures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, MonthPeriod};
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, ClosureRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = ClosureRepository::new(temp_dir.path().join("closures.json"));
        (temp_dir, repo)
    }

    fn closure(month: u32, income: i64) -> MonthlyClosure {
        MonthlyClosure::from_totals(
            MonthPeriod::new(2025, month).unwrap(),
            Money::from_units(income),
            Money::zero(),
        )
    }

    #[test]
    fn test_insert_then_existing() {
        let (_temp_dir, repo) = create_test_repo();

        let first = repo.insert_if_absent(closure(5, 100)).unwrap();
        assert!(matches!(first, ClosureInsert::Inserted(_)));

        let second = repo.insert_if_absent(closure(5, 999)).unwrap();
        assert!(matches!(second, ClosureInsert::Existing(_)));
        assert_eq!(second.into_inner(), first.into_inner());
        assert_eq!(repo.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_get_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        repo.insert_if_absent(closure(4, 10)).unwrap();
        repo.insert_if_absent(closure(5, 20)).unwrap();

        let repo2 = ClosureRepository::new(temp_dir.path().join("closures.json"));
        repo2.load().unwrap();
        let may = repo2.get(5, 2025).unwrap().unwrap();
        assert_eq!(may.income, Money::from_units(20));
        assert!(repo2.get(6, 2025).unwrap().is_none());

        let all = repo2.get_all().unwrap();
        assert_eq!(all[0].month, 5);
        assert_eq!(all[1].month, 4);
    }

    #[test]
    fn test_stale_handle_sees_closure_written_elsewhere() {
        let (temp_dir, repo_a) = create_test_repo();
        let repo_b = ClosureRepository::new(temp_dir.path().join("closures.json"));
        repo_a.load().unwrap();
        repo_b.load().unwrap();

        let from_a = repo_a.insert_if_absent(closure(4, 10)).unwrap().into_inner();
        let from_b = repo_b.insert_if_absent(closure(4, 20)).unwrap();

        assert!(matches!(from_b, ClosureInsert::Existing(_)));
        assert_eq!(from_b.into_inner(), from_a);
        assert_eq!(repo_b.get_all().unwrap().len(), 1);
        assert_eq!(repo_b.get(4, 2025).unwrap(), Some(from_a));
    }

    #[test]
    fn test_load_drops_duplicate_keys() {
        let (temp_dir, repo) = create_test_repo();
        let older = closure(5, 1);
        let mut newer = closure(5, 2);
        newer.created_at = older.created_at + chrono::Duration::seconds(5);
        let file_data = ClosureData {
            closures: vec![newer, older.clone()],
        };
        write_json_atomic(temp_dir.path().join("closures.json"), &file_data).unwrap();

        repo.load().unwrap();
        assert_eq!(repo.get_all().unwrap().len(), 1);
        assert_eq!(repo.get(5, 2025).unwrap(), Some(older));
    }
}

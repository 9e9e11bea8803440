use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::catalog::Catalog;
use crate::rows::RowStack;
use crate::settings::AppSettings;

// ── Application State ──────────────────────────────────────────────

/// Shared state for one panel session: the loaded catalog, the live rows,
/// and the last status line.
pub struct AppState {
    /// Directory holding the catalog and stack documents.
    pub data_dir: PathBuf,
    pub catalog: Mutex<Catalog>,
    pub rows: Mutex<RowStack>,
    /// Last user-facing status message (run results, clamp warnings, ...).
    pub output: Mutex<String>,
    pub settings: Mutex<Option<AppSettings>>,
}

impl AppState {
    /// Build state for a data directory, loading the catalog fail-soft.
    pub fn open(data_dir: &Path) -> Self {
        let catalog = Catalog::load(&crate::paths::catalog_path(data_dir));
        Self {
            data_dir: data_dir.to_path_buf(),
            catalog: Mutex::new(catalog),
            rows: Mutex::new(RowStack::new()),
            output: Mutex::new(String::new()),
            settings: Mutex::new(None),
        }
    }

    pub fn catalog_path(&self) -> PathBuf {
        crate::paths::catalog_path(&self.data_dir)
    }

    pub fn stacks_path(&self) -> PathBuf {
        crate::paths::stacks_path(&self.data_dir)
    }

    /// Read-only access to the catalog. Locks the mutex for the duration of `f`.
    pub fn with_catalog<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Catalog) -> R,
    {
        let guard = self.catalog.lock();
        f(&guard)
    }

    /// Read-only access to the rows.
    pub fn with_rows<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&RowStack) -> R,
    {
        let guard = self.rows.lock();
        f(&guard)
    }

    /// Mutating access to the rows.
    pub fn with_rows_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut RowStack) -> R,
    {
        let mut guard = self.rows.lock();
        f(&mut guard)
    }

    /// Replace the status line.
    pub fn set_output(&self, message: &str) {
        *self.output.lock() = message.to_string();
    }

    pub fn output(&self) -> String {
        self.output.lock().clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::catalog::{save_catalog, ActionDefinition};

    #[test]
    fn open_loads_the_catalog_from_the_data_dir() {
        let dir = std::env::temp_dir().join("stackdeck_test_state_open");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        save_catalog(
            &crate::paths::catalog_path(&dir),
            &[ActionDefinition::new("Go To Start", "GtStart")],
        )
        .unwrap();

        let state = AppState::open(&dir);
        assert_eq!(state.with_catalog(Catalog::len), 1);
        state.with_rows_mut(|rows| {
            let position = rows.add_row(&state.catalog.lock());
            assert_eq!(position, 0);
        });
        assert_eq!(state.with_rows(RowStack::len), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }
}

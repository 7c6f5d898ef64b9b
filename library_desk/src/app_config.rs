use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;

use library_catalog::catalog_storage::{
    CatalogStorage, CsvCatalogStorage, XlsxCatalogStorage, DEFAULT_SHEET_NAME,
};

pub const CONFIG_FILE_NAME: &str = "library_desk.toml";
const ENV_PREFIX: &str = "LIBRARY_DESK";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Workbook holding the catalog table, a `.csv` path selects a plain CSV file
    pub catalog_path: PathBuf,
    /// Workbook sheet with the catalog table
    pub sheet_name: String,
    /// Default log filter, `RUST_LOG` takes precedence
    pub log_level: String,
    /// Catalog size from which recommendations log a cost warning
    pub large_catalog_warning: usize,
}

impl AppConfig {
    /// Reads `library_desk.toml` from the working directory if present, then
    /// `LIBRARY_DESK_*` environment variables
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE_NAME))
    }

    pub fn load_from(config_file: &Path) -> anyhow::Result<Self> {
        config::Config::builder()
            .set_default("catalog_path", "Data.xlsx")?
            .set_default("sheet_name", DEFAULT_SHEET_NAME)?
            .set_default("log_level", "info")?
            .set_default("large_catalog_warning", 5000_i64)?
            .add_source(config::File::from(config_file).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn catalog_storage(&self) -> Arc<dyn CatalogStorage> {
        let is_csv = self
            .catalog_path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));
        if is_csv {
            Arc::new(CsvCatalogStorage::new(self.catalog_path.clone()))
        } else {
            Arc::new(XlsxCatalogStorage::new(
                self.catalog_path.clone(),
                self.sheet_name.clone(),
            ))
        }
    }
}

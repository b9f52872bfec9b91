use crate::error::{FunifierError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct AppPaths;

impl AppPaths {
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| FunifierError::Config("Cannot determine data directory".to_string()))?
            .join("funifier-lottery");

        create_dir(&data_dir)?;
        Ok(data_dir)
    }

    pub fn log_dir() -> Result<PathBuf> {
        let log_dir = Self::data_dir()?.join("logs");
        create_dir(&log_dir)?;
        Ok(log_dir)
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .map_err(|e| FunifierError::Config(format!("cannot create {}: {}", dir.display(), e)))
}

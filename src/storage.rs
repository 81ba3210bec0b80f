use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub data_dir: PathBuf,
    pub download_dir: PathBuf,
    pub duckdb_path: PathBuf,
    pub meta_path: PathBuf,
}

impl StoragePaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir: PathBuf = data_dir.into();
        let download_dir = data_dir.join("downloads");
        let duckdb_path = data_dir.join("codes.duckdb");
        let meta_path = data_dir.join("meta.json");

        Self {
            data_dir,
            download_dir,
            duckdb_path,
            meta_path,
        }
    }

    /// Where a downloaded seed file is kept, named after the last URL path segment.
    pub fn downloaded_seed(&self, url: &str) -> PathBuf {
        let name = url
            .split(['?', '#'])
            .next()
            .and_then(|u| u.rsplit('/').next())
            .filter(|s| !s.is_empty())
            .unwrap_or("seed.json");
        self.download_dir.join(name)
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.download_dir)?;
        Ok(())
    }
}

pub fn file_present_nonempty(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(m) => m.is_file() && m.len() > 0,
        Err(_) => false,
    }
}

use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::export;

pub const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    pub database_file: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            database_file: "scancheck.sqlite3".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportSettings {
    /// Default output file; a `.csv` name writes CSV instead of xlsx.
    pub file_name: String,
    pub sheet_name: String,
    /// chrono strftime pattern for the `Date` column.
    pub date_format: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            file_name: "inspections.xlsx".into(),
            sheet_name: "Inspections".into(),
            date_format: "%Y-%m-%d %H:%M:%S".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub store: StoreSettings,
    pub export: ExportSettings,
}

impl Settings {
    /// Reads settings from `path`.
    ///
    /// A missing file yields defaults. A malformed file or an invalid value
    /// is logged and replaced by its default; only an unreadable file is an
    /// error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let mut settings: Settings = match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(
                    "Ignoring malformed settings file {}: {err}",
                    path.display()
                );
                Self::default()
            }
        };

        settings.sanitize();
        Ok(settings)
    }

    fn sanitize(&mut self) {
        if self.store.database_file.trim().is_empty() {
            warn!("store.databaseFile is empty; using default");
            self.store = StoreSettings::default();
        }
        if self.export.file_name.trim().is_empty() {
            warn!("export.fileName is empty; using default");
            self.export.file_name = ExportSettings::default().file_name;
        }
        if !export::is_valid_sheet_name(&self.export.sheet_name) {
            warn!(
                "export.sheetName {:?} is not a valid worksheet name; using default",
                self.export.sheet_name
            );
            self.export.sheet_name = ExportSettings::default().sheet_name;
        }
        if !is_valid_date_format(&self.export.date_format) {
            warn!(
                "export.dateFormat {:?} is not a valid strftime pattern; using default",
                self.export.date_format
            );
            self.export.date_format = ExportSettings::default().date_format;
        }
    }

    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.store.database_file)
    }

    pub fn default_export_path(&self) -> PathBuf {
        PathBuf::from(&self.export.file_name)
    }
}

fn is_valid_date_format(pattern: &str) -> bool {
    !pattern.is_empty() && StrftimeItems::new(pattern).all(|item| !matches!(item, Item::Error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join(SETTINGS_FILE_NAME)).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, r#"{ "export": { "fileName": "line-3.csv" } }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.export.file_name, "line-3.csv");
        assert_eq!(settings.export.date_format, ExportSettings::default().date_format);
        assert_eq!(settings.store, StoreSettings::default());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());
    }

    #[test]
    fn invalid_date_format_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, r#"{ "export": { "dateFormat": "%Q" } }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.export.date_format, ExportSettings::default().date_format);
    }

    #[test]
    fn invalid_sheet_name_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, r#"{ "export": { "sheetName": "Line [3]" } }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.export.sheet_name, "Inspections");
    }

    #[test]
    fn custom_sheet_name_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, r#"{ "export": { "sheetName": "Leituras" } }"#).unwrap();

        assert_eq!(Settings::load(&path).unwrap().export.sheet_name, "Leituras");
    }

    #[test]
    fn database_path_is_under_data_dir() {
        let settings = Settings::default();
        assert_eq!(
            settings.database_path(Path::new("/data")),
            Path::new("/data").join("scancheck.sqlite3")
        );
    }
}

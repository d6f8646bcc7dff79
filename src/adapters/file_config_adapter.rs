//! INI configuration adapter.

use crate::domain::error::FlowbandError;
use crate::ports::config_port::{parse_bool, ConfigPort};
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    ini: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FlowbandError> {
        let path = path.as_ref();
        let mut ini = Ini::new();
        ini.load(path).map_err(|reason| FlowbandError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { ini })
    }

    pub fn from_string(content: &str) -> Result<Self, FlowbandError> {
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|reason| FlowbandError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { ini })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini.get(section, key).filter(|v| !v.trim().is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.ini
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.ini
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.ini
            .get(section, key)
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    const SAMPLE: &str = r#"
[bands]
surge = 0.55
strong_inflow = 0.12

[traps]
min_elapsed_minutes = 20

[scan]
exclude_st = yes
boards = main, chinext

[sqlite]
path = /var/lib/flowband/snapshots.db
"#;

    #[test]
    fn reads_typed_values() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_double("bands", "surge", 0.0), 0.55);
        assert_eq!(adapter.get_int("traps", "min_elapsed_minutes", 0), 20);
        assert!(adapter.get_bool("scan", "exclude_st", false));
        assert_eq!(
            adapter.get_string("sqlite", "path"),
            Some("/var/lib/flowband/snapshots.db".to_string())
        );
    }

    #[test]
    fn missing_keys_fall_back() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("bands", "missing"), None);
        assert_eq!(adapter.get_string("nosection", "key"), None);
        assert_eq!(adapter.get_int("traps", "missing", 42), 42);
        assert_eq!(adapter.get_double("bands", "missing", 9.5), 9.5);
        assert!(adapter.get_bool("scan", "missing", true));
    }

    #[test]
    fn unparseable_numbers_fall_back() {
        let adapter =
            FileConfigAdapter::from_string("[bands]\nsurge = lots\n[traps]\nmin_elapsed_minutes = x\n")
                .unwrap();
        assert_eq!(adapter.get_double("bands", "surge", 0.5), 0.5);
        assert_eq!(adapter.get_int("traps", "min_elapsed_minutes", 15), 15);
    }

    #[test]
    fn bool_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[scan]\na = true\nb = On\nc = 1\nd = no\ne = off\nf = maybe\n",
        )
        .unwrap();
        assert!(adapter.get_bool("scan", "a", false));
        assert!(adapter.get_bool("scan", "b", false));
        assert!(adapter.get_bool("scan", "c", false));
        assert!(!adapter.get_bool("scan", "d", true));
        assert!(!adapter.get_bool("scan", "e", true));
        assert!(adapter.get_bool("scan", "f", true));
    }

    #[test]
    fn blank_value_is_absent() {
        let adapter = FileConfigAdapter::from_string("[calendar]\nholidays =\n").unwrap();
        assert_eq!(adapter.get_string("calendar", "holidays"), None);
        assert!(adapter.get_list("calendar", "holidays").is_empty());
    }

    #[test]
    fn list_values_split_on_commas() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_list("scan", "boards"), vec!["main", "chinext"]);
    }

    #[test]
    fn from_file_reads_config() {
        let file = temp_config(SAMPLE);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_double("bands", "strong_inflow", 0.0), 0.12);
    }

    #[test]
    fn from_file_missing_is_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/flowband.ini").err().unwrap();
        assert!(matches!(err, FlowbandError::ConfigParse { .. }));
        assert_eq!(err.exit_status(), 2);
    }
}

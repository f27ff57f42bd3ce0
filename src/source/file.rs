/// Local JSON file source.
///
/// Reads the same payload `/api/data` would return (a JSON array of flat
/// records) from disk. A file has no aggregate endpoints, so dashboards
/// built on it always aggregate locally.
use std::fs;
use std::path::{Path, PathBuf};

use super::{
    CountMap, CrossTabRow, DataSource, Endpoint, LoadError, RawRecord, ReasonsAnalysis,
    parse_records,
};

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn no_endpoint(&self, endpoint: Endpoint) -> LoadError {
        LoadError::SourceUnavailable {
            endpoint: format!("{}{}", self.path.display(), endpoint.path()),
            reason: "file sources do not serve aggregate endpoints".to_string(),
        }
    }
}

impl DataSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch_records(&self) -> Result<Vec<RawRecord>, LoadError> {
        let location = self.describe();
        let content = fs::read_to_string(&self.path).map_err(|e| LoadError::SourceUnavailable {
            endpoint: location.clone(),
            reason: e.to_string(),
        })?;
        let payload: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| LoadError::MalformedPayload {
                endpoint: location.clone(),
                reason: e.to_string(),
            })?;
        parse_records(&location, payload)
    }

    fn fetch_reasons(&self) -> Result<ReasonsAnalysis, LoadError> {
        Err(self.no_endpoint(Endpoint::ReasonsAnalysis))
    }

    fn fetch_year_wise(&self) -> Result<Vec<CrossTabRow>, LoadError> {
        Err(self.no_endpoint(Endpoint::YearWiseAnalysis))
    }

    fn fetch_count_map(&self, endpoint: Endpoint) -> Result<CountMap, LoadError> {
        Err(self.no_endpoint(endpoint))
    }

    fn serves_aggregates(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "classpulse-{}-{}.json",
            name,
            std::process::id()
        ));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn reads_records_from_json_array() {
        let path = temp_file("records", r#"[{"Major": "CS"}, {"Major": "Math"}]"#);
        let source = FileSource::new(&path);
        let records = source.fetch_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["Major"], "Math");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let source = FileSource::new("/definitely/not/here.json");
        let err = source.fetch_records().unwrap_err();
        assert!(matches!(err, LoadError::SourceUnavailable { .. }));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let path = temp_file("garbage", "not json");
        let err = FileSource::new(&path).fetch_records().unwrap_err();
        assert!(matches!(err, LoadError::MalformedPayload { .. }));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn aggregate_endpoints_are_unavailable() {
        let source = FileSource::new("data.json");
        assert!(!source.serves_aggregates());
        assert!(source.fetch_reasons().is_err());
        assert!(source.fetch_count_map(Endpoint::Attitude).is_err());
    }
}

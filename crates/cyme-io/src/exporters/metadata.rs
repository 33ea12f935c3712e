//! Metadata written as `#define` statements at the top of a GLM file.
use chrono::{DateTime, SecondsFormat, Utc};

/// Where a GLM file came from and when it was made.
#[derive(Debug, Clone)]
pub struct GlmMetadata {
    pub app_command: String,
    pub app_version: String,
    pub glm_path: String,
    pub created_at: DateTime<Utc>,
    pub cyme_mdbname: String,
    pub cyme_version: Option<String>,
    pub cyme_created: Option<String>,
    pub cyme_modified: Option<String>,
    pub cyme_loadfactor: Option<String>,
    pub network_id: String,
}

impl GlmMetadata {
    pub fn new(mdbname: &str, network_id: &str) -> Self {
        Self {
            app_command: env!("CARGO_PKG_NAME").to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            glm_path: String::new(),
            created_at: Utc::now(),
            cyme_mdbname: mdbname.to_string(),
            cyme_version: None,
            cyme_created: None,
            cyme_modified: None,
            cyme_loadfactor: None,
            network_id: network_id.to_string(),
        }
    }

    pub fn creation_timestamp(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Ordered `(name, value)` defines describing the source model.
    pub fn model_defines(&self) -> Vec<(&'static str, String)> {
        let mut defines = vec![("CYME_MDBNAME", self.cyme_mdbname.clone())];
        let optional = [
            ("CYME_VERSION", &self.cyme_version),
            ("CYME_CREATED", &self.cyme_created),
            ("CYME_MODIFIED", &self.cyme_modified),
            ("CYME_LOADFACTOR", &self.cyme_loadfactor),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                defines.push((name, value.clone()));
            }
        }
        defines.push(("CYME_NETWORKID", self.network_id.clone()));
        defines
    }
}

/// Render a CYME `CreationTime`/`LastChange` cell (seconds since the epoch)
/// as an ISO 8601 timestamp; non-numeric cells are kept as written.
pub fn cyme_timestamp(raw: &str) -> String {
    let seconds = raw
        .trim()
        .parse::<i64>()
        .ok()
        .or_else(|| raw.trim().parse::<f64>().ok().map(|s| s as i64));
    seconds
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .map(|dt| dt.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_else(|| raw.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyme_timestamp() {
        assert_eq!(cyme_timestamp("0"), "1970-01-01T00:00:00");
        assert_eq!(cyme_timestamp("1600000000"), "2020-09-13T12:26:40");
        assert_eq!(cyme_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn test_model_defines_skip_missing_values() {
        let mut meta = GlmMetadata::new("feeder", "NET1");
        meta.cyme_version = Some("5020".into());
        let names: Vec<&str> = meta.model_defines().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["CYME_MDBNAME", "CYME_VERSION", "CYME_NETWORKID"]);
    }
}

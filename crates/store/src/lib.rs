use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use formpilot_core::Profile;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Newest-first application history is capped at this many entries.
pub const HISTORY_CAP: usize = 100;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<Profile>>;
    async fn save(&self, key: &str, profile: &Profile) -> Result<()>;
}

/// One submitted application, as logged after a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: String,
    pub job_title: String,
    pub company: String,
    pub url: String,
    pub applied_date: String,
    pub status: String,
}

pub struct JsonFileStore {
    pub folder: String,
}

impl JsonFileStore {
    pub fn new(folder: &str) -> Self {
        std::fs::create_dir_all(folder).ok(); // ensure folder exists
        Self { folder: folder.to_string() }
    }

    fn profile_path(&self, key: &str) -> PathBuf {
        Path::new(&self.folder).join(format!("{key}.json"))
    }

    fn history_path(&self) -> PathBuf {
        Path::new(&self.folder).join("applications.json")
    }

    pub async fn load_applications(&self) -> Result<Vec<ApplicationRecord>> {
        match tokio::fs::read_to_string(self.history_path()).await {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Prepends the record so history reads newest-first, then trims to
    /// [`HISTORY_CAP`] entries.
    pub async fn record_application(&self, record: ApplicationRecord) -> Result<()> {
        let mut records = self.load_applications().await?;
        records.insert(0, record);
        records.truncate(HISTORY_CAP);
        let data = serde_json::to_string_pretty(&records)?;
        tokio::fs::write(self.history_path(), data).await?;
        debug!(count = records.len(), "application history updated");
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for JsonFileStore {
    async fn load(&self, key: &str) -> Result<Option<Profile>> {
        match tokio::fs::read_to_string(self.profile_path(key)).await {
            Ok(data) => Ok(Some(serde_json::from_str(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &str, profile: &Profile) -> Result<()> {
        let data = serde_json::to_string_pretty(profile)?;
        tokio::fs::write(self.profile_path(key), data).await?;
        debug!(key, "profile saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> JsonFileStore {
        let folder = std::env::temp_dir().join(format!("formpilot-store-{}", uuid::Uuid::new_v4()));
        JsonFileStore::new(folder.to_str().unwrap())
    }

    fn record(n: usize) -> ApplicationRecord {
        ApplicationRecord {
            id: format!("app-{n}"),
            job_title: "Engineer".to_string(),
            company: "Acme".to_string(),
            url: "https://acme.example/jobs/1".to_string(),
            applied_date: "2026-08-29".to_string(),
            status: "applied".to_string(),
        }
    }

    #[tokio::test]
    async fn load_missing_profile_is_none() {
        let store = temp_store();
        assert!(store.load("default").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = temp_store();
        let profile = Profile::default()
            .with_field("firstName", "Ada")
            .with_field("email", "ada@example.com");
        store.save("default", &profile).await.unwrap();

        let loaded = store.load("default").await.unwrap().unwrap();
        assert_eq!(loaded.fields.get("firstName").map(String::as_str), Some("Ada"));
        assert!(loaded.resume.is_none());
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let store = temp_store();
        store.record_application(record(1)).await.unwrap();
        store.record_application(record(2)).await.unwrap();

        let records = store.load_applications().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "app-2");
        assert_eq!(records[1].id, "app-1");
    }

    #[tokio::test]
    async fn history_caps_at_limit() {
        let store = temp_store();
        for n in 0..HISTORY_CAP + 5 {
            store.record_application(record(n)).await.unwrap();
        }

        let records = store.load_applications().await.unwrap();
        assert_eq!(records.len(), HISTORY_CAP);
        assert_eq!(records[0].id, format!("app-{}", HISTORY_CAP + 4));
    }
}

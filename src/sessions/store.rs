use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{error, info};
use uuid::Uuid;

use super::record::{export_json, import_json};
use crate::error::{Result, TrackerError};
use crate::tracking::models::ActivitySession;

/// Completed sessions kept as `<id>.json` files in one directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    pub async fn save(&self, session: &ActivitySession) -> Result<PathBuf> {
        let content = export_json(session)?;
        fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(session.id);
        fs::write(&path, content).await?;
        info!("Stored session {} at {}", session.id, path.display());

        Ok(path)
    }

    pub async fn load(&self, id: Uuid) -> Result<ActivitySession> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(TrackerError::NotFound(format!("Session {}", id)));
        }

        let content = fs::read_to_string(&path).await?;
        import_json(&content)
    }

    /// All readable sessions, most recent first. Unreadable files are logged and skipped.
    pub async fn list(&self) -> Result<Vec<ActivitySession>> {
        let mut sessions = Vec::new();
        if !self.dir.exists() {
            return Ok(sessions);
        }

        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    error!("Error reading {}: {}", path.display(), e);
                    continue;
                }
            };

            match import_json(&content) {
                Ok(session) => sessions.push(session),
                Err(e) => error!("Error parsing {}: {}", path.display(), e),
            }
        }

        sessions.sort_by(|a, b| b.stats.start_time.cmp(&a.stats.start_time));
        Ok(sessions)
    }
}

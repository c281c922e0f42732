//! JSON document implementation of [`SessionStore`].
//!
//! The document is a pretty-printed JSON array of sessions. Writes go to a
//! temporary file in the same directory which is then renamed over the
//! target, so a crash mid-write leaves the previous document intact.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crosscheck_core::session::SessionStore;
use crosscheck_types::config::CorruptDocumentPolicy;
use crosscheck_types::error::StoreError;
use crosscheck_types::session::{Session, Turn};

#[derive(Debug, Clone)]
pub struct JsonFileSessionStore {
    path: PathBuf,
    on_corrupt: CorruptDocumentPolicy,
}

impl JsonFileSessionStore {
    pub fn new(path: impl Into<PathBuf>, on_corrupt: CorruptDocumentPolicy) -> Self {
        Self {
            path: path.into(),
            on_corrupt,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn on_corrupt(&self) -> CorruptDocumentPolicy {
        self.on_corrupt
    }

    async fn recover(&self, content: &str, reason: String) -> Result<Vec<Session>, StoreError> {
        match self.on_corrupt {
            CorruptDocumentPolicy::Fail => Err(StoreError::Corrupt {
                path: self.path.clone(),
                reason,
            }),
            CorruptDocumentPolicy::Reset => {
                tracing::warn!(
                    path = %self.path.display(),
                    %reason,
                    "session document unreadable, starting with an empty session"
                );
                Ok(vec![Session::new()])
            }
            CorruptDocumentPolicy::BackupAndReset => {
                let backup = backup_path(&self.path);
                tokio::fs::write(&backup, content).await?;
                // Replace the unreadable document so later loads do not back it up again.
                let sessions = vec![Session::new()];
                self.save(&sessions).await?;
                tracing::warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    %reason,
                    "session document unreadable, backed up and starting with an empty session"
                );
                Ok(sessions)
            }
        }
    }

    fn write_atomic(&self, json: &str) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl SessionStore for JsonFileSessionStore {
    async fn load(&self) -> Result<Vec<Session>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no session document yet");
                return Ok(vec![Session::new()]);
            }
            Err(err) if err.kind() == std::io::ErrorKind::InvalidData => {
                let bytes = tokio::fs::read(&self.path).await?;
                let lossy = String::from_utf8_lossy(&bytes).into_owned();
                return self
                    .recover(&lossy, "document is not valid UTF-8".to_string())
                    .await;
            }
            Err(err) => return Err(StoreError::Io(err)),
        };

        if content.trim().is_empty() {
            return Ok(vec![Session::new()]);
        }

        match parse_document(&content) {
            Ok(sessions) if sessions.is_empty() => Ok(vec![Session::new()]),
            Ok(sessions) => {
                tracing::debug!(
                    path = %self.path.display(),
                    sessions = sessions.len(),
                    "sessions loaded"
                );
                Ok(sessions)
            }
            Err(reason) => self.recover(&content, reason).await,
        }
    }

    async fn save(&self, sessions: &[Session]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(sessions)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.write_atomic(&json))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))??;
        tracing::debug!(
            path = %self.path.display(),
            sessions = sessions.len(),
            "sessions saved"
        );
        Ok(())
    }
}

/// Parse the current document shape, or one of the older shapes:
/// a single session object, or a bare array of turns.
fn parse_document(content: &str) -> Result<Vec<Session>, String> {
    let value: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;

    match value {
        Value::Array(items) if items.iter().all(looks_like_turn) && !items.is_empty() => {
            let turns = items
                .into_iter()
                .map(serde_json::from_value::<Turn>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("legacy turn list: {e}"))?;
            tracing::info!(turns = turns.len(), "migrating legacy turn list into one session");
            Ok(vec![Session::from_parts("", turns)])
        }
        Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value::<Session>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string()),
        Value::Object(ref map) if map.contains_key("history") => {
            let session: Session = serde_json::from_value(value).map_err(|e| e.to_string())?;
            tracing::info!("migrating legacy single-session document");
            Ok(vec![session])
        }
        other => Err(format!("unexpected top-level JSON {}", json_kind(&other))),
    }
}

fn looks_like_turn(item: &Value) -> bool {
    item.get("question").is_some() && item.get("history").is_none()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "sessions.json".into());
    name.push(format!(".corrupt-{stamp}"));
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crosscheck_core::session::SessionBook;
    use crosscheck_types::session::DEFAULT_SESSION_TITLE;
    use tempfile::TempDir;

    fn turn(question: &str) -> Turn {
        Turn {
            question: question.to_string(),
            created_at: Utc::now(),
            answer_a: "a".into(),
            answer_b: "b".into(),
            critique_a_of_b: "ca".into(),
            critique_b_of_a: "cb".into(),
            synthesis: "s".into(),
            backend_model_id: "gemini-1.5-flash".into(),
            synthesis_model_id: Some("gpt-4o".into()),
            role_instruction: None,
            reference_name: None,
        }
    }

    fn store(tmp: &TempDir, policy: CorruptDocumentPolicy) -> JsonFileSessionStore {
        JsonFileSessionStore::new(tmp.path().join("sessions.json"), policy)
    }

    fn is_default(sessions: &[Session]) -> bool {
        sessions.len() == 1
            && sessions[0].is_empty()
            && sessions[0].title() == DEFAULT_SESSION_TITLE
    }

    #[tokio::test]
    async fn test_missing_file_loads_default_session() {
        let tmp = TempDir::new().unwrap();
        let sessions = store(&tmp, CorruptDocumentPolicy::Fail).load().await.unwrap();
        assert!(is_default(&sessions));
    }

    #[tokio::test]
    async fn test_missing_and_empty_array_load_the_same() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp, CorruptDocumentPolicy::Fail);
        let missing = s.load().await.unwrap();

        tokio::fs::write(s.path(), "[]").await.unwrap();
        let empty = s.load().await.unwrap();
        assert_eq!(missing, empty);

        tokio::fs::write(s.path(), "   \n").await.unwrap();
        assert_eq!(s.load().await.unwrap(), missing);
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp, CorruptDocumentPolicy::Fail);

        let mut first = Session::new();
        first.push_turn(turn("What is 2+2?"));
        first.push_turn(turn("And 3+3?"));
        let mut second = Session::new();
        second.set_title("Renamed");
        let sessions = vec![first, second];

        s.save(&sessions).await.unwrap();
        assert_eq!(s.load().await.unwrap(), sessions);

        let raw = tokio::fs::read_to_string(s.path()).await.unwrap();
        assert!(raw.contains("\"history\""));
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp, CorruptDocumentPolicy::Fail);
        s.save(&[Session::new()]).await.unwrap();
        s.save(&[Session::new(), Session::new()]).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_save_creates_parent_directory() {
        let tmp = TempDir::new().unwrap();
        let s = JsonFileSessionStore::new(
            tmp.path().join("nested").join("sessions.json"),
            CorruptDocumentPolicy::Fail,
        );
        s.save(&[Session::new()]).await.unwrap();
        assert!(s.path().exists());
    }

    #[tokio::test]
    async fn test_legacy_single_session_migrates() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp, CorruptDocumentPolicy::Fail);
        let mut legacy = Session::new();
        legacy.push_turn(turn("Old question"));
        tokio::fs::write(s.path(), serde_json::to_string(&legacy).unwrap())
            .await
            .unwrap();

        let sessions = s.load().await.unwrap();
        assert_eq!(sessions, vec![legacy]);
    }

    #[tokio::test]
    async fn test_legacy_turn_list_migrates() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp, CorruptDocumentPolicy::Fail);
        let turns = vec![turn("First question"), turn("Second question")];
        tokio::fs::write(s.path(), serde_json::to_string(&turns).unwrap())
            .await
            .unwrap();

        let sessions = s.load().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].turns(), turns.as_slice());
        assert_eq!(sessions[0].title(), "First question");
    }

    #[tokio::test]
    async fn test_corrupt_reset() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp, CorruptDocumentPolicy::Reset);
        tokio::fs::write(s.path(), "{ not json").await.unwrap();

        assert!(is_default(&s.load().await.unwrap()));
        let entries: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_backup_and_reset_keeps_copy() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp, CorruptDocumentPolicy::BackupAndReset);
        tokio::fs::write(s.path(), "42").await.unwrap();

        assert!(is_default(&s.load().await.unwrap()));

        let backups: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("sessions.json.corrupt-"))
            .collect();
        assert_eq!(backups.len(), 1);
        let saved = std::fs::read_to_string(tmp.path().join(&backups[0])).unwrap();
        assert_eq!(saved, "42");
    }

    fn backup_count(tmp: &TempDir) -> usize {
        std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".corrupt-"))
            .count()
    }

    #[tokio::test]
    async fn test_backup_happens_once_across_loads() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp, CorruptDocumentPolicy::BackupAndReset);
        tokio::fs::write(s.path(), "{ not json").await.unwrap();

        for _ in 0..3 {
            assert!(is_default(&s.load().await.unwrap()));
        }
        assert_eq!(backup_count(&tmp), 1);

        let rewritten = std::fs::read_to_string(s.path()).unwrap();
        let parsed: Vec<Session> = serde_json::from_str(&rewritten).unwrap();
        assert!(is_default(&parsed));
    }

    #[tokio::test]
    async fn test_corrupt_fail_returns_error() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp, CorruptDocumentPolicy::Fail);
        tokio::fs::write(s.path(), r#"[{"title": 7}]"#).await.unwrap();

        let err = s.load().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_rename_visible_to_fresh_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sessions.json");

        let mut book = SessionBook::open(JsonFileSessionStore::new(
            &path,
            CorruptDocumentPolicy::Fail,
        ))
        .await
        .unwrap();
        book.rename(0, "Tax questions").await.unwrap();

        let fresh = JsonFileSessionStore::new(&path, CorruptDocumentPolicy::Fail);
        let sessions = fresh.load().await.unwrap();
        assert_eq!(sessions[0].title(), "Tax questions");
        assert!(sessions[0].is_empty());
    }
}

pub mod service;

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vision::AnalysisResult;

pub use service::{CompletedAnalysis, TaskService};

const TASK_TOKEN_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Animate,
    Restore,
    Analyze,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Animate => "animate",
            Self::Restore => "restore",
            Self::Analyze => "analyze",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Processing,
    Completed,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(rename = "task_id")]
    pub id: String,
    pub status: TaskStatus,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub media_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
}

impl TaskRecord {
    pub fn processing(kind: TaskKind, media_id: impl Into<String>) -> Self {
        Self {
            id: new_task_id(kind),
            status: TaskStatus::Processing,
            kind,
            media_id: media_id.into(),
            analysis: None,
        }
    }
}

/// `<kind>_<12 hex chars>` drawn from a random v4 UUID.
pub fn new_task_id(kind: TaskKind) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("{}_{}", kind.as_str(), &token[..TASK_TOKEN_LEN])
}

/// Process-lifetime task records keyed by id. Records are never evicted.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: RwLock<HashMap<String, TaskRecord>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A lock poisoned by a panicking writer still holds a usable map.
    pub fn insert(&self, record: TaskRecord) -> TaskRecord {
        let mut map = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(record.id.clone(), record.clone());
        record
    }

    pub fn get(&self, id: &str) -> Option<TaskRecord> {
        let map = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
        map.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    #[test]
    fn task_ids_are_prefixed_and_distinct() {
        let ids = (0..500)
            .map(|_| new_task_id(TaskKind::Restore))
            .collect::<HashSet<_>>();
        assert_eq!(ids.len(), 500);
        for id in ids {
            let token = id.strip_prefix("restore_").expect("id should carry kind prefix");
            assert_eq!(token.len(), 12);
            assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn stores_are_isolated() {
        let first = TaskStore::new();
        let second = TaskStore::new();
        let record = first.insert(TaskRecord::processing(TaskKind::Animate, "m1"));

        assert_eq!(first.get(record.id.as_str()), Some(record.clone()));
        assert_eq!(second.get(record.id.as_str()), None);
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn store_keeps_working_after_a_writer_panics() {
        let store = Arc::new(TaskStore::new());
        let before = store.insert(TaskRecord::processing(TaskKind::Animate, "m1"));

        let poisoner = Arc::clone(&store);
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.tasks.write().expect("lock should be free");
            panic!("writer panicked while holding the task map");
        })
        .join();
        assert!(joined.is_err());
        assert!(store.tasks.is_poisoned());

        let after = store.insert(TaskRecord::processing(TaskKind::Restore, "m2"));
        assert_eq!(store.get(before.id.as_str()), Some(before));
        assert_eq!(store.get(after.id.as_str()), Some(after));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn record_serializes_with_task_id_and_type_keys() {
        let record = TaskRecord {
            id: String::from("animate_0123456789ab"),
            status: TaskStatus::Processing,
            kind: TaskKind::Animate,
            media_id: String::from("m1"),
            analysis: None,
        };
        let value = serde_json::to_value(&record).expect("record should serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "task_id": "animate_0123456789ab",
                "status": "processing",
                "type": "animate",
                "media_id": "m1"
            })
        );
    }
}

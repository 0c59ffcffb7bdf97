use std::sync::Arc;

use tracing::info;

use crate::tasks::{TaskKind, TaskRecord, TaskStatus, TaskStore};
use crate::vision::{AnalysisError, AnalysisResult, VisionAnalyzer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedAnalysis {
    pub task_id: String,
    pub analysis: AnalysisResult,
}

/// Uniform submission surface over the task store. Only analysis does real
/// work; animate and restore records stay `processing` forever.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<TaskStore>,
    analyzer: VisionAnalyzer,
}

impl TaskService {
    pub fn new(store: Arc<TaskStore>, analyzer: VisionAnalyzer) -> Self {
        Self { store, analyzer }
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    pub fn analyzer(&self) -> &VisionAnalyzer {
        &self.analyzer
    }

    pub fn submit_pending(&self, kind: TaskKind, media_id: &str) -> TaskRecord {
        let record = self.store.insert(TaskRecord::processing(kind, media_id));
        info!(task_id = %record.id, kind = %kind, "accepted task without a processor");
        record
    }

    /// Runs the analysis inline and records it as completed. Failed analyses
    /// leave no record behind.
    pub fn analyze(&self, media_id: &str) -> Result<CompletedAnalysis, AnalysisError> {
        let analysis = self.analyzer.analyze(media_id)?;
        let mut record = TaskRecord::processing(TaskKind::Analyze, media_id);
        record.status = TaskStatus::Completed;
        record.analysis = Some(analysis.clone());
        let record = self.store.insert(record);
        info!(task_id = %record.id, "analysis completed");
        Ok(CompletedAnalysis {
            task_id: record.id,
            analysis,
        })
    }

    pub fn status(&self, task_id: &str) -> Option<TaskRecord> {
        self.store.get(task_id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::config::ServiceConfig;
    use crate::vision::{ProviderReply, ProviderRequest, VisionProvider};

    struct CountingProvider {
        calls: AtomicUsize,
        status: u16,
        content: String,
    }

    impl CountingProvider {
        fn new(status: u16, content: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                status,
                content: content.to_string(),
            })
        }
    }

    impl VisionProvider for CountingProvider {
        fn send(&self, _request: &ProviderRequest) -> Result<ProviderReply, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ProviderReply {
                status: self.status,
                body: json!({"choices": [{"message": {"content": self.content}}]}).to_string(),
            })
        }
    }

    fn service_with(provider: Arc<CountingProvider>, configured: bool) -> TaskService {
        let mut config = ServiceConfig::default();
        if configured {
            config = config.with_xai_api_key("xai-test");
        }
        TaskService::new(
            Arc::new(TaskStore::new()),
            VisionAnalyzer::new(&config, provider),
        )
    }

    #[test]
    fn stub_submissions_stay_processing() {
        let service = service_with(CountingProvider::new(200, "{}"), true);

        let animate = service.submit_pending(TaskKind::Animate, "m1");
        let restore = service.submit_pending(TaskKind::Restore, "m1");

        for record in [&animate, &restore] {
            for _ in 0..3 {
                let current = service
                    .status(record.id.as_str())
                    .expect("stub task should be stored");
                assert_eq!(current.status, TaskStatus::Processing);
                assert_eq!(current.analysis, None);
            }
        }
        assert!(animate.id.starts_with("animate_"));
        assert!(restore.id.starts_with("restore_"));
    }

    #[test]
    fn repeated_submissions_get_distinct_ids() {
        let service = service_with(CountingProvider::new(200, "{}"), true);
        let ids = (0..50)
            .map(|_| service.submit_pending(TaskKind::Animate, "m1").id)
            .collect::<HashSet<_>>();
        assert_eq!(ids.len(), 50);
        assert_eq!(service.store().len(), 50);
    }

    #[test]
    fn concurrent_submissions_from_cloned_services_are_all_stored() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 200;
        let service = service_with(CountingProvider::new(200, "{}"), true);

        let handles = (0..THREADS)
            .map(|n| {
                let service = service.clone();
                std::thread::spawn(move || {
                    let kind = if n % 2 == 0 {
                        TaskKind::Animate
                    } else {
                        TaskKind::Restore
                    };
                    (0..PER_THREAD)
                        .map(|_| service.submit_pending(kind, "m-shared").id)
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();

        let mut ids = HashSet::new();
        for handle in handles {
            ids.extend(handle.join().expect("submitting thread should not panic"));
        }
        assert_eq!(ids.len(), THREADS * PER_THREAD);
        assert_eq!(service.store().len(), THREADS * PER_THREAD);
        for id in &ids {
            assert_eq!(
                service.status(id.as_str()).map(|record| record.status),
                Some(TaskStatus::Processing)
            );
        }
    }

    #[test]
    fn analyze_stores_completed_record_with_result() {
        let provider = CountingProvider::new(
            200,
            r#"{"event_type":"vacation","emotions":["calm"],"people_count":1,"description":"A hiker on a ridge."}"#,
        );
        let service = service_with(provider.clone(), true);

        let completed = service.analyze("m2").expect("analysis should succeed");

        assert!(completed.task_id.starts_with("analyze_"));
        assert_eq!(completed.analysis.event_type, "vacation");
        let record = service
            .status(completed.task_id.as_str())
            .expect("analysis task should be stored");
        assert_eq!(record.status, TaskStatus::Completed);
        assert_eq!(record.kind, TaskKind::Analyze);
        assert_eq!(record.media_id, "m2");
        assert_eq!(record.analysis, Some(completed.analysis));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_analysis_leaves_no_record() {
        let provider = CountingProvider::new(503, "busy");
        let service = service_with(provider.clone(), true);

        let err = service.analyze("m3").expect_err("upstream failure must surface");
        assert!(matches!(err, AnalysisError::Upstream { status: 503, .. }));
        assert!(service.store().is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unconfigured_analysis_never_calls_provider() {
        let provider = CountingProvider::new(200, "{}");
        let service = service_with(provider.clone(), false);

        let err = service.analyze("m4").expect_err("missing key must fail");
        assert!(matches!(err, AnalysisError::NotConfigured));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_task_is_absent() {
        let service = service_with(CountingProvider::new(200, "{}"), true);
        assert_eq!(service.status("analyze_000000000000"), None);
    }
}

//! Batch fabrication driver: one protocol artifact per planned task.

use super::pool::{run_pool, Progress, TaskOutcome};
use super::{artifact_file_name, find_duplicate_label, plan_tasks, BatchOutcome, BatchReport, Task};
use crate::config::Config;
use crate::error::{BatchError, EngelError};
use crate::library::{FabricationConfig, Library};
use crate::llm::{GenerationRequest, ImageInput, ProtocolProvider};
use crate::prompt::{build_prompt, ShotSelection, SYSTEM_INSTRUCTION};
use crate::schema::CanonicalSchema;
use crate::types::ProviderConfig;
use std::path::PathBuf;
use std::sync::Arc;

/// Settings for a batch run.
#[derive(Debug, Clone)]
pub struct FabricateOptions {
    /// Maximum concurrent provider calls
    pub concurrency: usize,
    /// Directory receiving `<label>.json` artifacts
    pub output_dir: PathBuf,
    pub temperature: f32,
    /// Refuse to start when two tasks share an artifact name
    pub fail_on_duplicate_labels: bool,
}

impl FabricateOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            concurrency: config.batch.concurrency,
            output_dir: config.output_dir(),
            temperature: config.llm.temperature,
            fail_on_duplicate_labels: config.batch.fail_on_duplicate_labels,
        }
    }
}

impl Default for FabricateOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Everything a single task needs; shared read-only by all workers.
struct TaskContext {
    provider: Arc<dyn ProtocolProvider>,
    provider_config: ProviderConfig,
    library: Library,
    fabrication: FabricationConfig,
    schema: Arc<CanonicalSchema>,
    image: Arc<ImageInput>,
    temperature: f32,
    output_dir: PathBuf,
}

impl TaskContext {
    async fn generate_one(&self, task: &Task) -> Result<PathBuf, EngelError> {
        let selection = ShotSelection {
            angle: task.angle_key.clone(),
            scale: task.scale_key.clone(),
            lens: self.fabrication.lens.clone(),
            aspect_ratio: self.fabrication.aspect_ratio.clone(),
        };
        let request = GenerationRequest {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            prompt: build_prompt(&selection, &self.library),
            image: self.image.clone(),
            schema: self.schema.clone(),
            temperature: self.temperature,
        };

        let protocol = self
            .provider
            .generate(&request, &self.provider_config)
            .await?;

        let path = self.output_dir.join(artifact_file_name(&task.label));
        tokio::fs::write(&path, protocol)
            .await
            .map_err(|source| BatchError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Runs a planned batch against one provider.
pub struct Fabricator {
    context: Arc<TaskContext>,
    concurrency: usize,
    fail_on_duplicate_labels: bool,
}

impl Fabricator {
    pub fn new(
        provider: Arc<dyn ProtocolProvider>,
        provider_config: ProviderConfig,
        library: Library,
        fabrication: FabricationConfig,
        schema: Arc<CanonicalSchema>,
        image: Arc<ImageInput>,
        options: FabricateOptions,
    ) -> Self {
        Self {
            context: Arc::new(TaskContext {
                provider,
                provider_config,
                library,
                fabrication,
                schema,
                image,
                temperature: options.temperature,
                output_dir: options.output_dir,
            }),
            concurrency: options.concurrency,
            fail_on_duplicate_labels: options.fail_on_duplicate_labels,
        }
    }

    /// Directory artifacts are written to.
    pub fn output_dir(&self) -> &std::path::Path {
        &self.context.output_dir
    }

    /// Plan the tasks for this batch and apply the duplicate-label policy.
    pub fn plan(&self) -> Result<Vec<Task>, BatchError> {
        let tasks = plan_tasks(&self.context.library, &self.context.fabrication)?;
        if let Some(err) = find_duplicate_label(&tasks) {
            if self.fail_on_duplicate_labels {
                return Err(err);
            }
            tracing::warn!("{err}; later results will overwrite earlier ones");
        }
        Ok(tasks)
    }

    /// Run `tasks` through the pool, writing one artifact per success.
    ///
    /// Individual task failures end up in the report. Only failing to create
    /// the output directory aborts the run.
    pub async fn run<C>(&self, tasks: Vec<Task>, on_progress: C) -> Result<BatchReport, BatchError>
    where
        C: Fn(Progress, &Task, &TaskOutcome<PathBuf>) + Send + Sync + 'static,
    {
        let output_dir = &self.context.output_dir;
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| BatchError::Io {
                path: output_dir.clone(),
                source,
            })?;

        tracing::info!(
            "Fabricating {} protocols with {} ({}), concurrency {}",
            tasks.len(),
            self.context.provider.name(),
            self.context.provider_config.model,
            self.concurrency
        );

        let labels: Vec<String> = tasks.iter().map(|t| t.label.clone()).collect();
        let context = self.context.clone();
        let summary = run_pool(
            tasks,
            self.concurrency,
            move |task: Task| {
                let context = context.clone();
                async move {
                    let result = context.generate_one(&task).await;
                    match &result {
                        Ok(path) => tracing::debug!("Wrote {:?}", path),
                        Err(e) => tracing::warn!("Task {} failed: {e}", task.label),
                    }
                    result
                }
            },
            on_progress,
        )
        .await;

        let outcomes = labels
            .into_iter()
            .zip(summary.outcomes)
            .map(|(label, outcome)| match outcome {
                TaskOutcome::Succeeded(path) => BatchOutcome::Written { label, path },
                TaskOutcome::Failed(error) => BatchOutcome::Failed { label, error },
            })
            .collect();

        Ok(BatchReport {
            outcomes,
            success_count: summary.succeeded,
            failure_count: summary.failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::tests::two_by_two_library;
    use crate::error::ProviderError;
    use crate::library::{Catalog, CatalogEntry};
    use crate::schema::protocol_schema;
    use crate::types::ProviderId;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Provider that echoes part of the prompt, failing for prompts containing `fail_on`.
    struct MockProvider {
        fail_on: Option<&'static str>,
        calls: AtomicUsize,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl MockProvider {
        fn new(fail_on: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                fail_on,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ProtocolProvider for MockProvider {
        fn id(&self) -> ProviderId {
            ProviderId::OpenAi
        }

        async fn generate(
            &self,
            request: &GenerationRequest,
            _config: &ProviderConfig,
        ) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            if let Some(marker) = self.fail_on {
                if request.prompt.contains(marker) {
                    return Err(ProviderError::Http {
                        provider: ProviderId::OpenAi,
                        status: 500,
                        body: "internal error".to_string(),
                    });
                }
            }
            Ok(r#"{"final_prompt":"ok"}"#.to_string())
        }
    }

    fn fabricator(
        provider: Arc<MockProvider>,
        library: Library,
        options: FabricateOptions,
    ) -> Fabricator {
        Fabricator::new(
            provider,
            ProviderConfig {
                provider_id: ProviderId::OpenAi,
                model: "gpt-4o".to_string(),
                api_key: "sk-test-1234567890".to_string(),
            },
            library,
            FabricationConfig {
                lens: "50mm_natural".to_string(),
                aspect_ratio: "4:5".to_string(),
                reference_image: "ref.png".to_string(),
            },
            Arc::new(protocol_schema()),
            Arc::new(ImageInput::from_bytes(&[1, 2, 3], "image/png")),
            options,
        )
    }

    fn options(output_dir: PathBuf, concurrency: usize) -> FabricateOptions {
        FabricateOptions {
            concurrency,
            output_dir,
            temperature: 0.1,
            fail_on_duplicate_labels: true,
        }
    }

    #[tokio::test]
    async fn test_two_by_two_writes_four_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("Protocols");
        let provider = MockProvider::new(None);
        let fab = fabricator(provider.clone(), two_by_two_library(), options(out.clone(), 1));

        let tasks = fab.plan().unwrap();
        let report = fab.run(tasks, |_, _, _| {}).await.unwrap();

        assert_eq!(report.total(), 4);
        assert_eq!(report.success_count, 4);
        assert_eq!(report.failure_count, 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);

        let written = std::fs::read_to_string(out.join("Aerial-Detail-50mm.json")).unwrap();
        assert_eq!(written, r#"{"final_prompt":"ok"}"#);
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 4);
    }

    #[tokio::test]
    async fn test_failed_task_is_reported_and_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().to_path_buf();
        let provider = MockProvider::new(Some("from a drone"));
        let fab = fabricator(provider, two_by_two_library(), options(out.clone(), 3));

        let tasks = fab.plan().unwrap();
        let report = fab.run(tasks, |_, _, _| {}).await.unwrap();

        assert_eq!(report.success_count, 2);
        assert_eq!(report.failure_count, 2);
        let failed: Vec<&BatchOutcome> = report.outcomes.iter().filter(|o| !o.succeeded()).collect();
        assert_eq!(failed[0].label(), "Aerial-Full-50mm");
        match failed[0] {
            BatchOutcome::Failed { error, .. } => {
                assert_eq!(error.status, Some(500));
                assert!(error.message.contains("internal error"));
            }
            BatchOutcome::Written { .. } => unreachable!(),
        }
        assert!(!out.join("Aerial-Full-50mm.json").exists());
        assert!(out.join("Eye Level-Full-50mm.json").exists());
    }

    #[tokio::test]
    async fn test_request_carries_shared_instruction_and_settings() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::new(None);
        let mut opts = options(dir.path().to_path_buf(), 2);
        opts.temperature = 0.4;
        let fab = fabricator(provider.clone(), two_by_two_library(), opts);

        let tasks = fab.plan().unwrap();
        fab.run(tasks, |_, _, _| {}).await.unwrap();

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 4);
        for request in requests.iter() {
            assert_eq!(request.system_instruction, SYSTEM_INSTRUCTION);
            assert_eq!(request.temperature, 0.4);
            assert!(request.prompt.contains("4. ASPECT RATIO: 4:5"));
            assert!(request.prompt.contains("3. LENS OPTICAL CHARACTER:\nnatural"));
        }
    }

    #[tokio::test]
    async fn test_progress_reaches_total() {
        let dir = tempfile::tempdir().unwrap();
        let fab = fabricator(
            MockProvider::new(Some("whole facade")),
            two_by_two_library(),
            options(dir.path().to_path_buf(), 2),
        );
        let last = Arc::new(Mutex::new(None));
        let sink = last.clone();

        let tasks = fab.plan().unwrap();
        fab.run(tasks, move |progress, _, _| {
            *sink.lock().unwrap() = Some(progress);
        })
        .await
        .unwrap();

        assert_eq!(*last.lock().unwrap(), Some(Progress { done: 4, total: 4 }));
    }

    fn library_with_duplicate_labels() -> Library {
        let mut library = two_by_two_library();
        library.shot_scales = Catalog::from_entries([
            ("full_shot", CatalogEntry::new("Full", "")),
            ("full_shot_alt", CatalogEntry::new("Full", "")),
        ]);
        library
    }

    #[test]
    fn test_duplicate_labels_fail_fast_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let fab = fabricator(
            MockProvider::new(None),
            library_with_duplicate_labels(),
            options(dir.path().to_path_buf(), 1),
        );
        assert!(matches!(fab.plan(), Err(BatchError::DuplicateLabel { .. })));
    }

    #[test]
    fn test_duplicate_labels_allowed_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path().to_path_buf(), 1);
        opts.fail_on_duplicate_labels = false;
        let fab = fabricator(MockProvider::new(None), library_with_duplicate_labels(), opts);
        assert_eq!(fab.plan().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_unwritable_output_dir_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let fab = fabricator(
            MockProvider::new(None),
            two_by_two_library(),
            options(blocker.join("out"), 1),
        );

        let tasks = fab.plan().unwrap();
        let err = fab.run(tasks, |_, _, _| {}).await.unwrap_err();
        assert!(matches!(err, BatchError::Io { .. }));
    }
}

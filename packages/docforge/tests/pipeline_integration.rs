//! Integration tests for the processing pipeline.
//!
//! Exercises full runs end to end: step ordering, fail-soft per-file
//! extraction, fail-fast step errors, no-op stages, cancellation, and the
//! registry invariants the pipeline relies on.

use std::sync::Arc;

use docforge::testing::{KeyedCall, MockExtractor, MockKeyedProvider, MockSessionProvider};
use docforge::{
    AnalyzeOptions, CombineOptions, DocforgeError, FileRegistry, MemorySettings, MergeStrategy,
    Pipeline, PipelineConfig, ProcessingState, ProviderKind, ProviderOrchestrator, RegistryError,
    RunStatus, StepStatus,
};

type TestOrchestrator =
    ProviderOrchestrator<Arc<MockKeyedProvider>, MockSessionProvider, MemorySettings>;

/// A ready keyed orchestrator plus a handle on its mock for call assertions.
async fn ready_orchestrator(keyed: MockKeyedProvider) -> (Arc<MockKeyedProvider>, TestOrchestrator) {
    let keyed = Arc::new(keyed);
    let orch = ProviderOrchestrator::new(
        keyed.clone(),
        MockSessionProvider::new(),
        MemorySettings::new(),
    )
    .await;
    orch.set_credential("sk-test").await.unwrap();
    (keyed, orch)
}

fn seeded_registry() -> FileRegistry {
    let registry = FileRegistry::new();
    registry.add("intro.md", "# Intro\n\nWelcome aboard.").unwrap();
    registry.add("guide.md", "# Guide\n\nDo the thing.").unwrap();
    registry
}

fn analyze_options() -> AnalyzeOptions {
    AnalyzeOptions::new(ProviderKind::Keyed, "gpt-4o-mini")
}

#[tokio::test]
async fn test_full_run_completes_every_step() {
    let (_, orch) = ready_orchestrator(MockKeyedProvider::new()).await;
    let registry = seeded_registry();

    let config = PipelineConfig::new("Handbook")
        .with_extract()
        .with_analyze(analyze_options())
        .with_combine(CombineOptions::default());
    let pipeline = Pipeline::from_registry(config, &registry);

    pipeline
        .execute(&orch, &MockExtractor::new(), &registry)
        .await
        .unwrap();

    let snapshot = pipeline.run().snapshot();
    assert_eq!(snapshot.status, RunStatus::Complete);
    assert_eq!(snapshot.overall_progress, 100);
    assert!(snapshot.steps.iter().all(|s| s.status == StepStatus::Complete));
    assert!(snapshot.combination.is_some());
    assert_eq!(snapshot.analyses.len(), 2);
    assert!(snapshot.started_at.is_some());
    assert!(snapshot.finished_at.is_some());
}

#[tokio::test]
async fn test_combine_only_run_uses_raw_contents() {
    let (keyed, orch) = ready_orchestrator(MockKeyedProvider::new()).await;
    let registry = seeded_registry();

    let config = PipelineConfig::new("Handbook").with_combine(CombineOptions::default());
    let pipeline = Pipeline::from_registry(config, &registry);

    pipeline
        .execute(&orch, &MockExtractor::new(), &registry)
        .await
        .unwrap();

    let snapshot = pipeline.run().snapshot();
    assert_eq!(snapshot.status, RunStatus::Complete);
    assert_eq!(snapshot.steps.len(), 1);
    assert_eq!(snapshot.steps[0].status, StepStatus::Complete);

    let combination = snapshot.combination.expect("combine step ran");
    assert!(combination.content.contains("Welcome aboard."));
    assert!(combination.content.contains("Do the thing."));
    assert_eq!(combination.meta.files_processed, 2);

    // A local combine never touches the provider's generation family.
    assert!(!keyed
        .calls()
        .iter()
        .any(|c| matches!(c, KeyedCall::Generate { .. } | KeyedCall::ProcessFiles { .. })));
}

#[tokio::test]
async fn test_analyze_failure_stops_run_before_combine() {
    let (_, orch) =
        ready_orchestrator(MockKeyedProvider::new().fail_generation("quota exhausted")).await;
    let registry = seeded_registry();

    let config = PipelineConfig::new("Handbook")
        .with_extract()
        .with_analyze(analyze_options())
        .with_combine(CombineOptions::default());
    let pipeline = Pipeline::from_registry(config, &registry);

    let err = pipeline
        .execute(&orch, &MockExtractor::new(), &registry)
        .await
        .unwrap_err();
    assert!(matches!(err, DocforgeError::Pipeline(_)));

    let snapshot = pipeline.run().snapshot();
    assert_eq!(snapshot.status, RunStatus::Error);
    assert_eq!(snapshot.steps[0].status, StepStatus::Complete);
    assert_eq!(snapshot.steps[1].status, StepStatus::Error);
    assert!(snapshot.steps[1]
        .error
        .as_deref()
        .unwrap()
        .contains("quota exhausted"));
    // The combine step never started.
    assert_eq!(snapshot.steps[2].status, StepStatus::Pending);
    assert!(snapshot.steps[2].started_at.is_none());
    assert!(snapshot.overall_progress < 100);
}

#[tokio::test]
async fn test_ai_combine_failure_carries_message() {
    let (_, orch) =
        ready_orchestrator(MockKeyedProvider::new().fail_generation("model offline")).await;
    let registry = seeded_registry();

    let options = CombineOptions::new().with_strategy(MergeStrategy::AiCompiled);
    let config = PipelineConfig::new("Handbook").with_combine(options);
    let pipeline = Pipeline::from_registry(config, &registry);

    let err = pipeline
        .execute(&orch, &MockExtractor::new(), &registry)
        .await
        .unwrap_err();
    assert!(matches!(err, DocforgeError::Pipeline(_)));

    let snapshot = pipeline.run().snapshot();
    assert_eq!(snapshot.status, RunStatus::Error);
    assert_eq!(snapshot.steps[0].status, StepStatus::Error);
    assert!(snapshot.steps[0]
        .error
        .as_deref()
        .unwrap()
        .contains("model offline"));
    assert!(snapshot.combination.is_none());
}

#[tokio::test]
async fn test_per_file_extraction_failure_is_isolated() {
    let (_, orch) = ready_orchestrator(MockKeyedProvider::new()).await;
    let registry = FileRegistry::new();
    let good = registry.add("good.md", "# Good").unwrap();
    let bad = registry.add("bad.md", "# Bad").unwrap();

    let config = PipelineConfig::new("Handbook")
        .with_extract()
        .with_combine(CombineOptions::default());
    let pipeline = Pipeline::from_registry(config, &registry);

    pipeline
        .execute(&orch, &MockExtractor::new().fail_for("bad.md"), &registry)
        .await
        .unwrap();

    let snapshot = pipeline.run().snapshot();
    // One bad file fails neither the step nor the run.
    assert_eq!(snapshot.status, RunStatus::Complete);
    assert_eq!(snapshot.steps[0].status, StepStatus::Complete);
    assert_eq!(snapshot.steps[0].progress, 100);

    // The failure is visible both on the step's side channel and durably
    // on the file row.
    assert_eq!(snapshot.steps[0].warnings.len(), 1);
    assert!(snapshot.steps[0].warnings[0].contains("bad.md"));
    assert_eq!(registry.get(bad).unwrap().state, ProcessingState::Error);
    assert_eq!(registry.get(good).unwrap().state, ProcessingState::Ready);
}

#[tokio::test]
async fn test_analyze_without_options_is_noop_complete() {
    let (keyed, orch) = ready_orchestrator(MockKeyedProvider::new()).await;
    let registry = seeded_registry();

    let config = PipelineConfig::new("Handbook").with_analyze(None);
    let pipeline = Pipeline::from_registry(config, &registry);

    pipeline
        .execute(&orch, &MockExtractor::new(), &registry)
        .await
        .unwrap();

    let snapshot = pipeline.run().snapshot();
    assert_eq!(snapshot.status, RunStatus::Complete);
    assert_eq!(snapshot.steps[0].status, StepStatus::Complete);
    assert_eq!(snapshot.steps[0].progress, 100);
    assert!(snapshot.analyses.is_empty());

    // The no-op stage performed no generation call.
    assert!(!keyed
        .calls()
        .iter()
        .any(|c| matches!(c, KeyedCall::Generate { .. })));
}

#[tokio::test]
async fn test_combine_without_options_is_noop_complete() {
    let (_, orch) = ready_orchestrator(MockKeyedProvider::new()).await;
    let registry = seeded_registry();

    let config = PipelineConfig::new("Handbook").with_combine(None);
    let pipeline = Pipeline::from_registry(config, &registry);

    pipeline
        .execute(&orch, &MockExtractor::new(), &registry)
        .await
        .unwrap();

    let snapshot = pipeline.run().snapshot();
    assert_eq!(snapshot.status, RunStatus::Complete);
    assert!(snapshot.combination.is_none());
}

#[tokio::test]
async fn test_cancelled_run_is_terminal() {
    let (_, orch) = ready_orchestrator(MockKeyedProvider::new()).await;
    let registry = seeded_registry();

    let config = PipelineConfig::new("Handbook")
        .with_extract()
        .with_combine(CombineOptions::default());
    let pipeline = Pipeline::from_registry(config, &registry);
    let run = pipeline.run();

    run.cancel();
    pipeline
        .execute(&orch, &MockExtractor::new(), &registry)
        .await
        .unwrap();

    let snapshot = run.snapshot();
    assert_eq!(snapshot.status, RunStatus::Cancelled);
    assert!(snapshot.finished_at.is_some());
    // The run never shows running again.
    assert_eq!(run.snapshot().status, RunStatus::Cancelled);
    assert!(snapshot.steps.iter().all(|s| s.status == StepStatus::Pending));
}

#[tokio::test]
async fn test_files_added_after_start_are_not_included() {
    let (_, orch) = ready_orchestrator(MockKeyedProvider::new()).await;
    let registry = seeded_registry();

    let config = PipelineConfig::new("Handbook").with_combine(CombineOptions::default());
    let pipeline = Pipeline::from_registry(config, &registry);

    registry.add("late.md", "# Late arrival").unwrap();

    pipeline
        .execute(&orch, &MockExtractor::new(), &registry)
        .await
        .unwrap();

    let combination = pipeline.run().snapshot().combination.unwrap();
    assert!(!combination.content.contains("Late arrival"));
    assert_eq!(combination.meta.files_processed, 2);
}

#[tokio::test]
async fn test_extracted_text_feeds_the_combine_step() {
    let (_, orch) = ready_orchestrator(MockKeyedProvider::new()).await;
    let registry = FileRegistry::new();
    registry.add("page.html", "<h1>Raw markup</h1>").unwrap();

    let extractor = MockExtractor::new().with_text("page.html", "Raw markup");
    let config = PipelineConfig::new("Handbook")
        .with_extract()
        .with_combine(CombineOptions::default());
    let pipeline = Pipeline::from_registry(config, &registry);

    pipeline.execute(&orch, &extractor, &registry).await.unwrap();

    let combination = pipeline.run().snapshot().combination.unwrap();
    assert!(combination.content.contains("Raw markup"));
    assert!(!combination.content.contains("<h1>"));
}

#[tokio::test]
async fn test_registry_capacity_scenario() {
    let registry = FileRegistry::with_max_files(2);

    let a = registry.add("a.txt", "0123456789").unwrap();
    let b = registry.add("b.txt", "01234567890123456789").unwrap();
    assert_eq!(registry.get(a).unwrap().size, 10);
    assert_eq!(registry.get(b).unwrap().size, 20);

    let err = registry.add("c.txt", "overflow").unwrap_err();
    assert!(matches!(err, RegistryError::CapacityExceeded { limit: 2 }));

    let names: Vec<String> = registry.list().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
}

//! The processing pipeline runner.
//!
//! Runs a configured, ordered subset of {extract, analyze, combine} over a
//! file set fixed at construction, as one observable, cancelable unit.
//!
//! Two error-handling strategies coexist here and stay deliberately
//! separate:
//! - per-file extraction failures are FAIL-SOFT: caught, logged, recorded on
//!   the file row and the step's warning list, and the step still completes;
//! - step-level failures are FAIL-FAST: the step is marked errored, the run
//!   ends as errored, later steps never start.

use chrono::Utc;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::orchestrator::ProviderOrchestrator;
use crate::pipeline::combine::{combine_files, finalize_ai_compiled};
use crate::pipeline::prompts::format_analyze_prompt;
use crate::pipeline::run::{PipelineRun, PipelineStep};
use crate::registry::FileRegistry;
use crate::traits::extractor::TextExtractor;
use crate::traits::provider::{KeyedProvider, SessionProvider};
use crate::traits::settings::SettingsStore;
use crate::types::config::{AnalyzeOptions, CombineOptions, MergeStrategy};
use crate::types::file::{AnalysisReport, FilePatch, ProcessingState, SourceDoc, StagedFile};

/// Which stages run, and their options.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Name of the document being produced
    pub document_name: String,

    /// Run the extract stage
    pub extract: bool,

    /// Run the analyze stage
    pub analyze: bool,

    /// Run the combine stage
    pub combine: bool,

    /// Provider+model pair for analysis. An analyze stage without options
    /// completes as a no-op rather than erroring.
    pub analyze_options: Option<AnalyzeOptions>,

    /// Combine options. A combine stage without options completes as a
    /// no-op rather than erroring.
    pub combine_options: Option<CombineOptions>,
}

impl PipelineConfig {
    pub fn new(document_name: impl Into<String>) -> Self {
        Self {
            document_name: document_name.into(),
            ..Default::default()
        }
    }

    /// Enable the extract stage.
    pub fn with_extract(mut self) -> Self {
        self.extract = true;
        self
    }

    /// Enable the analyze stage.
    pub fn with_analyze(mut self, options: impl Into<Option<AnalyzeOptions>>) -> Self {
        self.analyze = true;
        self.analyze_options = options.into();
        self
    }

    /// Enable the combine stage.
    pub fn with_combine(mut self, options: impl Into<Option<CombineOptions>>) -> Self {
        self.combine = true;
        self.combine_options = options.into();
        self
    }
}

/// One configured pipeline over a fixed file set.
///
/// The file set is snapshotted at construction; files added to the registry
/// afterwards are not part of this run.
pub struct Pipeline {
    config: PipelineConfig,
    file_ids: Vec<Uuid>,
    files: Vec<StagedFile>,
    run: PipelineRun,
}

impl Pipeline {
    /// Build a pipeline over an explicit file snapshot.
    pub fn new(config: PipelineConfig, files: Vec<StagedFile>) -> Self {
        let mut steps = Vec::new();
        if config.extract {
            steps.push(PipelineStep::new(
                "extract",
                "Extract text",
                "Extract plain text and structure from each file",
            ));
        }
        if config.analyze {
            steps.push(PipelineStep::new(
                "analyze",
                "Analyze files",
                "Run AI analysis over each file",
            ));
        }
        if config.combine {
            steps.push(PipelineStep::new(
                "combine",
                "Combine files",
                "Assemble the final document",
            ));
        }

        Self {
            file_ids: files.iter().map(|f| f.id).collect(),
            files,
            config,
            run: PipelineRun::new(steps),
        }
    }

    /// Build a pipeline over the registry's current contents.
    pub fn from_registry(config: PipelineConfig, registry: &FileRegistry) -> Self {
        Self::new(config, registry.list())
    }

    /// Observable handle to this pipeline's run.
    pub fn run(&self) -> PipelineRun {
        self.run.clone()
    }

    /// Execute the configured steps in order.
    ///
    /// Returns `Err` when a step hard-fails; the run state carries the same
    /// information for observers. A cancelled run returns `Ok` with the
    /// state already terminal.
    pub async fn execute<K, A, S, X>(
        &self,
        orchestrator: &ProviderOrchestrator<K, A, S>,
        extractor: &X,
        registry: &FileRegistry,
    ) -> Result<()>
    where
        K: KeyedProvider,
        A: SessionProvider,
        S: SettingsStore,
        X: TextExtractor,
    {
        self.run.mark_started();
        let steps = self.run.snapshot().steps;
        info!(
            run = %self.run.id(),
            steps = steps.len(),
            files = self.files.len(),
            "Pipeline run started"
        );

        for (idx, step) in steps.iter().enumerate() {
            if self.run.is_terminal() {
                return Ok(());
            }

            let outcome = match step.id.as_str() {
                "extract" => self.run_extract(idx, extractor, registry).await,
                "analyze" => self.run_analyze(idx, orchestrator, registry).await,
                "combine" => self.run_combine(idx, orchestrator, registry).await,
                other => {
                    debug!(step = other, "Unknown step id; skipping");
                    Ok(())
                }
            };

            if let Err(message) = outcome {
                if self.run.is_terminal() {
                    // Cancelled while a call was in flight; discard.
                    return Ok(());
                }
                self.run.mark_step_error(idx, message.clone());
                warn!(run = %self.run.id(), step = %step.id, error = %message, "Pipeline run failed");
                return Err(PipelineError::StepFailed {
                    step: step.id.clone(),
                    message,
                }
                .into());
            }

            if self.run.is_terminal() {
                return Ok(());
            }
            self.run.mark_step_complete(idx);
        }

        self.run.mark_complete();
        info!(run = %self.run.id(), "Pipeline run complete");
        Ok(())
    }

    /// Extract stage: fail-soft per file.
    async fn run_extract<X: TextExtractor>(
        &self,
        idx: usize,
        extractor: &X,
        registry: &FileRegistry,
    ) -> std::result::Result<(), String> {
        self.run.mark_step_started(idx);
        let total = self.files.len().max(1);

        for (i, file) in self.files.iter().enumerate() {
            if self.run.is_terminal() {
                return Ok(());
            }

            let _ = registry.update(file.id, FilePatch::new().state(ProcessingState::Extracting));

            match extractor.extract_text(file).await {
                Ok(text) => {
                    let mut patch = FilePatch::new()
                        .extracted_text(text)
                        .state(ProcessingState::Ready);
                    if let Ok(structure) = extractor.extract_metadata(file).await {
                        patch = patch.structure(structure);
                    }
                    let _ = registry.update(file.id, patch);
                }
                Err(e) => {
                    // One bad file never fails the step.
                    warn!(file = %file.name, error = %e, "Extraction failed; continuing");
                    self.run
                        .push_step_warning(idx, format!("{}: {}", file.name, e));
                    let _ = registry.update(file.id, FilePatch::new().state(ProcessingState::Error));
                }
            }

            self.run
                .set_step_progress(idx, (((i + 1) * 100) / total) as u8);
        }

        Ok(())
    }

    /// Analyze stage: no-op without options, fail-fast on a provider error.
    async fn run_analyze<K, A, S>(
        &self,
        idx: usize,
        orchestrator: &ProviderOrchestrator<K, A, S>,
        registry: &FileRegistry,
    ) -> std::result::Result<(), String>
    where
        K: KeyedProvider,
        A: SessionProvider,
        S: SettingsStore,
    {
        self.run.mark_step_started(idx);

        let Some(options) = &self.config.analyze_options else {
            info!("Analyze step has no provider configured; completing as no-op");
            return Ok(());
        };

        let files = self.current_files(registry);
        let total = files.len().max(1);

        for (i, file) in files.iter().enumerate() {
            if self.run.is_terminal() {
                return Ok(());
            }

            let _ = registry.update(file.id, FilePatch::new().state(ProcessingState::Analyzing));

            let prompt = format_analyze_prompt(&file.name, file.effective_text());
            let response = orchestrator
                .generate_as(options.provider, &options.model, &prompt)
                .await
                .map_err(|e| e.to_string())?;

            if self.run.is_terminal() {
                return Ok(());
            }

            let (summary, topics) = parse_analysis_response(&response);
            let report = AnalysisReport {
                summary,
                topics,
                model: options.model.clone(),
                analyzed_at: Utc::now(),
            };

            self.run.store_analysis(file.id, report.clone());
            let _ = registry.update(
                file.id,
                FilePatch::new()
                    .analysis(report)
                    .state(ProcessingState::Ready),
            );

            self.run
                .set_step_progress(idx, (((i + 1) * 100) / total) as u8);
        }

        Ok(())
    }

    /// Combine stage: no-op without options, fail-fast on a provider error.
    async fn run_combine<K, A, S>(
        &self,
        idx: usize,
        orchestrator: &ProviderOrchestrator<K, A, S>,
        registry: &FileRegistry,
    ) -> std::result::Result<(), String>
    where
        K: KeyedProvider,
        A: SessionProvider,
        S: SettingsStore,
    {
        self.run.mark_step_started(idx);

        let Some(options) = &self.config.combine_options else {
            info!("Combine step has no options configured; completing as no-op");
            return Ok(());
        };

        let sources: Vec<SourceDoc> = self
            .current_files(registry)
            .iter()
            .map(|f| SourceDoc::new(&f.name, f.effective_text()))
            .collect();

        let result = if options.strategy == MergeStrategy::AiCompiled {
            let started = Instant::now();
            let content = orchestrator
                .process_files(&sources, &self.config.document_name)
                .await
                .map_err(|e| e.to_string())?;

            if self.run.is_terminal() {
                return Ok(());
            }
            finalize_ai_compiled(
                content,
                &sources,
                options,
                started.elapsed().as_millis() as u64,
            )
        } else {
            combine_files(&sources, options)
        };

        info!(
            files = result.meta.files_processed,
            words = result.meta.total_words,
            duplicates = result.meta.duplicates_removed,
            "Combined document assembled"
        );
        self.run.store_combination(result);
        Ok(())
    }

    /// Current registry rows for the snapshotted ids. Files removed mid-run
    /// drop out; files added mid-run never appear.
    fn current_files(&self, registry: &FileRegistry) -> Vec<StagedFile> {
        self.file_ids
            .iter()
            .filter_map(|id| registry.get(*id))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    summary: String,
    #[serde(default)]
    topics: Vec<String>,
}

/// Parse the analysis response; a non-JSON response becomes the summary
/// verbatim.
fn parse_analysis_response(response: &str) -> (String, Vec<String>) {
    let trimmed = response.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|s| s.strip_suffix("```").unwrap_or(s))
        .unwrap_or(trimmed)
        .trim();

    match serde_json::from_str::<RawAnalysis>(body) {
        Ok(parsed) => (parsed.summary, parsed.topics),
        Err(_) => (trimmed.to_string(), Vec::new()),
    }
}

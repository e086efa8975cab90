//! Pipeline orchestration: one document in, redacted artifacts out.

use crate::aggregate::aggregate_entities;
use crate::apply::redact_document;
use crate::audit::ProcessingLog;
use crate::collab::{
    Collaborators, DetectionOutcome, DetectionResult, EntityDetector, ImageClassifier, ImageRegion,
    StructuralExtractor,
};
use crate::document::PageDocument;
use crate::overlay;
use crate::replace::ReplacementEngine;
use crate::span::{build_text_rendition, map_spans, RedactionSpan};
use crate::temp::TempArtifact;
use crate::visual::process_visual_elements;
use ir_common::{Error, Result};
use ir_policy::RedactionPolicy;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What to do when the entity detector reports an outage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorOutagePolicy {
    /// Continue with the internal pattern pass only.
    #[default]
    PassThrough,
    /// Abort the run.
    Fail,
}

/// Pipeline knobs not covered by the redaction policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineConfig {
    pub detector_outage: DetectorOutagePolicy,
}

/// One redaction run over one input document.
///
/// Holds the collaborator set and accumulates spans and the audit log
/// across stages; create a fresh pipeline per document.
pub struct RedactionPipeline {
    input: PathBuf,
    config: PipelineConfig,
    extractor: Box<dyn StructuralExtractor>,
    detector: Box<dyn EntityDetector>,
    classifier: Box<dyn ImageClassifier>,
    engine: ReplacementEngine,
    spans: Vec<RedactionSpan>,
    log: ProcessingLog,
}

impl RedactionPipeline {
    pub fn new(
        input: impl Into<PathBuf>,
        policy: RedactionPolicy,
        collaborators: Collaborators,
    ) -> Self {
        Self::with_config(input, policy, collaborators, PipelineConfig::default())
    }

    pub fn with_config(
        input: impl Into<PathBuf>,
        policy: RedactionPolicy,
        collaborators: Collaborators,
        config: PipelineConfig,
    ) -> Self {
        let input = input.into();
        let log = ProcessingLog::new(input.display().to_string());
        let Collaborators {
            extractor,
            detector,
            classifier,
            generator,
        } = collaborators;
        RedactionPipeline {
            input,
            config,
            extractor,
            detector,
            classifier,
            engine: ReplacementEngine::new(policy, generator),
            spans: Vec::new(),
            log,
        }
    }

    /// Run the full pipeline, writing the redacted document to
    /// `output` (and the overlay next to it when enabled).
    pub fn process(&mut self, output: &Path) -> Result<ProcessingLog> {
        let content = self.extractor.convert(&self.input)?;
        info!(
            run_id = %self.log.run_id,
            pages = content.pages.len(),
            blocks = content.text_blocks.len(),
            regions = content.image_regions.len(),
            "extracted document structure"
        );

        let detection = match self.detector.detect(&content.text_blocks) {
            DetectionOutcome::Detected(result) => result,
            DetectionOutcome::Unavailable(reason) => match self.config.detector_outage {
                DetectorOutagePolicy::Fail => return Err(Error::DetectorUnavailable(reason)),
                DetectorOutagePolicy::PassThrough => {
                    warn!(%reason, "entity detector unavailable, relying on pattern pass");
                    DetectionResult::default()
                }
            },
        };

        let entities = aggregate_entities(&detection, &content.text_blocks);
        if entities.is_empty() {
            info!("no entities detected, copying input verbatim");
            std::fs::copy(&self.input, output)?;
            self.log.finalize(0);
            return Ok(self.log.clone());
        }

        let mut categories: Vec<String> =
            entities.iter().map(|e| e.category.clone()).collect();
        categories.sort_unstable();
        categories.dedup();
        self.engine.seed(&categories);

        // Render the searchable working copy through a scoped temp
        // file, so the on-disk container is what gets searched.
        let rendition = build_text_rendition(&content);
        let working = TempArtifact::create("inforedact-", ".json")?;
        rendition.save(working.path())?;
        let mut doc = PageDocument::load(working.path())?;

        self.spans = map_spans(&doc, &entities);
        info!(spans = self.spans.len(), "mapped entity spans");

        redact_document(&mut doc, &self.spans, &mut self.engine, &mut self.log);

        let clips = region_clips(&content.image_regions, &content.pages);
        let classifications = self.classifier.classify(&clips)?;
        let records = process_visual_elements(
            &mut doc,
            &content.image_regions,
            &classifications,
            self.engine.policy(),
            &mut self.spans,
        );

        doc.save(output)?;

        if self.engine.policy().overlay_enabled() {
            self.build_overlay(output)?;
        }

        self.log.finalize(records.len());
        info!(
            run_id = %self.log.run_id,
            redactions = self.log.metrics.total_redactions,
            visual = records.len(),
            "redaction run complete"
        );
        Ok(self.log.clone())
    }

    /// Write the review overlay for the spans located so far, next to
    /// `output`. Returns the overlay path, or None when there was
    /// nothing to show.
    pub fn build_overlay(&self, output: &Path) -> Result<Option<PathBuf>> {
        overlay::build_overlay(
            &self.input,
            &self.spans,
            self.engine.policy(),
            &overlay_path_for(output),
        )
    }

    /// Persist the audit log, honoring the policy's audit switch.
    /// Returns whether anything was written.
    pub fn save_log(&self, path: &Path) -> Result<bool> {
        if !self.engine.policy().audit_logging_enabled() {
            return Ok(false);
        }
        self.log.save(path)?;
        Ok(true)
    }

    /// Spans located so far (text first, then visual).
    pub fn spans(&self) -> &[RedactionSpan] {
        &self.spans
    }

    pub fn log(&self) -> &ProcessingLog {
        &self.log
    }
}

/// `scan_redacted.json` → `scan_redacted_overlay.json`.
fn overlay_path_for(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = match output.extension() {
        Some(ext) => format!("{}_overlay.{}", stem, ext.to_string_lossy()),
        None => format!("{}_overlay", stem),
    };
    output.with_file_name(name)
}

/// Build the classifier input: one page per image region, sized to the
/// region. Regions with invalid geometry get a unit page so the output
/// stays positionally aligned.
fn region_clips(regions: &[ImageRegion], pages: &[crate::collab::PageGeometry]) -> PageDocument {
    let sizes: Vec<(f64, f64)> = regions
        .iter()
        .map(|region| {
            pages
                .get(region.page_index)
                .and_then(|page| region.bbox.to_page_rect(page.height))
                .map(|rect| (rect.width(), rect.height()))
                .unwrap_or((1.0, 1.0))
        })
        .collect();
    PageDocument::with_pages(&sizes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_path_keeps_extension() {
        assert_eq!(
            overlay_path_for(Path::new("/out/scan_redacted.json")),
            Path::new("/out/scan_redacted_overlay.json")
        );
        assert_eq!(
            overlay_path_for(Path::new("report")),
            Path::new("report_overlay")
        );
    }

    #[test]
    fn test_region_clips_alignment() {
        use ir_common::RawBBox;

        let pages = vec![crate::collab::PageGeometry {
            width: 612.0,
            height: 792.0,
        }];
        let regions = vec![
            ImageRegion {
                page_index: 0,
                bbox: RawBBox::Layout {
                    l: 0.0,
                    t: 0.0,
                    r: 200.0,
                    b: 100.0,
                },
            },
            // Invalid geometry still occupies a slot.
            ImageRegion {
                page_index: 0,
                bbox: RawBBox::Corners([f64::NAN, 0.0, 1.0, 1.0]),
            },
        ];

        let clips = region_clips(&regions, &pages);
        assert_eq!(clips.page_count(), 2);
        assert_eq!(clips.pages[0].width, 200.0);
        assert_eq!(clips.pages[1].width, 1.0);
    }
}

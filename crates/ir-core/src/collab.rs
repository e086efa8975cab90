//! External collaborator contracts.
//!
//! The pipeline consumes four services it does not implement: document
//! structure extraction, entity detection, image classification, and
//! synthetic replacement generation. Detection and generation can be
//! unavailable (model or network outage); those contracts return
//! explicit outcome variants so callers choose how to degrade instead
//! of inheriting a silent fallback.

use crate::document::PageDocument;
use ir_common::{RawBBox, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Pixel/unit dimensions of one page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
}

/// A block of extracted text, positioned in layout space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub page_index: usize,
    pub bbox: RawBBox,
}

/// An embedded image region, positioned in layout space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRegion {
    pub page_index: usize,
    pub bbox: RawBBox,
}

/// Output of the structural extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedContent {
    #[serde(default)]
    pub pages: Vec<PageGeometry>,
    #[serde(default)]
    pub text_blocks: Vec<TextBlock>,
    #[serde(default)]
    pub image_regions: Vec<ImageRegion>,
}

impl Default for PageGeometry {
    fn default() -> Self {
        // US Letter at 72 dpi.
        PageGeometry {
            width: 612.0,
            height: 792.0,
        }
    }
}

/// Document-structure/layout extraction engine.
pub trait StructuralExtractor: Send + Sync {
    fn convert(&self, input: &Path) -> Result<ExtractedContent>;
}

/// Index-aligned entity/category lists from the external detector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    pub entities: Vec<String>,
    pub categories: Vec<String>,
}

/// Outcome of an entity detection call.
#[derive(Debug, Clone)]
pub enum DetectionOutcome {
    Detected(DetectionResult),
    /// The detector could not run (model or network outage). Callers
    /// decide whether to fail closed or pass through.
    Unavailable(String),
}

/// Named-entity/PII detection model.
pub trait EntityDetector: Send + Sync {
    fn detect(&self, blocks: &[TextBlock]) -> DetectionOutcome;
}

/// One classification candidate for an image region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedLabel {
    pub label: String,
    pub confidence: f64,
}

/// Image-content classifier. Input is a rendered document with one
/// page per clipped region; output is positionally aligned to it.
pub trait ImageClassifier: Send + Sync {
    fn classify(&self, regions: &PageDocument) -> Result<Vec<Vec<RankedLabel>>>;
}

/// Outcome of a synthetic-data generation call.
#[derive(Debug, Clone)]
pub enum GeneratorOutcome {
    Generated(HashMap<String, String>),
    /// The generator could not run; the decision engine falls back to
    /// its static table.
    Unavailable(String),
}

/// Network-backed synthetic replacement generator.
pub trait SyntheticGenerator: Send + Sync {
    /// Generate a category → replacement mapping for every requested
    /// category in one call.
    fn generate(&self, categories: &[String]) -> GeneratorOutcome;
}

/// The collaborator set consumed by one pipeline invocation.
pub struct Collaborators {
    pub extractor: Box<dyn StructuralExtractor>,
    pub detector: Box<dyn EntityDetector>,
    pub classifier: Box<dyn ImageClassifier>,
    pub generator: Box<dyn SyntheticGenerator>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Collaborators {
            extractor: Box::new(ContainerExtractor),
            detector: Box::new(UnavailableDetector),
            classifier: Box::new(FixedLabelClassifier::default()),
            generator: Box::new(UnavailableGenerator),
        }
    }
}

/// Built-in extractor reading the JSON document container and deriving
/// layout-space blocks from its stored page-space content.
pub struct ContainerExtractor;

impl StructuralExtractor for ContainerExtractor {
    fn convert(&self, input: &Path) -> Result<ExtractedContent> {
        let doc = PageDocument::load(input)?;

        let mut content = ExtractedContent::default();
        for (page_index, page) in doc.pages.iter().enumerate() {
            content.pages.push(PageGeometry {
                width: page.width,
                height: page.height,
            });
            for run in &page.runs {
                content.text_blocks.push(TextBlock {
                    text: run.text.clone(),
                    page_index,
                    bbox: RawBBox::from_page_rect(&run.rect, page.height),
                });
            }
            for region in &page.image_regions {
                content.image_regions.push(ImageRegion {
                    page_index,
                    bbox: RawBBox::from_page_rect(region, page.height),
                });
            }
        }
        Ok(content)
    }
}

/// Detector placeholder for runs without a wired-in model. Always
/// reports an outage; the internal regex pass still runs.
pub struct UnavailableDetector;

impl EntityDetector for UnavailableDetector {
    fn detect(&self, _blocks: &[TextBlock]) -> DetectionOutcome {
        DetectionOutcome::Unavailable("no entity detector configured".to_string())
    }
}

/// Classifier assigning every region one fixed label.
pub struct FixedLabelClassifier {
    pub label: String,
}

impl FixedLabelClassifier {
    pub fn new(label: impl Into<String>) -> Self {
        FixedLabelClassifier {
            label: label.into(),
        }
    }
}

impl Default for FixedLabelClassifier {
    fn default() -> Self {
        FixedLabelClassifier::new("document_photo")
    }
}

impl ImageClassifier for FixedLabelClassifier {
    fn classify(&self, regions: &PageDocument) -> Result<Vec<Vec<RankedLabel>>> {
        Ok(regions
            .pages
            .iter()
            .map(|_| {
                vec![RankedLabel {
                    label: self.label.clone(),
                    confidence: 1.0,
                }]
            })
            .collect())
    }
}

/// Generator placeholder for runs without a wired-in model. Always
/// reports an outage, which drives the static fallback table.
pub struct UnavailableGenerator;

impl SyntheticGenerator for UnavailableGenerator {
    fn generate(&self, _categories: &[String]) -> GeneratorOutcome {
        GeneratorOutcome::Unavailable("no synthetic generator configured".to_string())
    }
}

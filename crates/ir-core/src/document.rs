//! Paginated document container.
//!
//! [`PageDocument`] is the working representation of a document: pages
//! with positioned text runs, drawn shapes, image regions, and review
//! highlights, persisted as JSON. It supports the operations the
//! pipeline needs: literal text search, two-phase redaction
//! (stage marks, then commit a destructive strip), drawing primitives
//! for visual substitution, and highlight annotations for the overlay.

use ir_common::{Error, Rect, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// RGB color, components in `0.0..=1.0`.
pub type Color = [f64; 3];

pub const BLACK: Color = [0.0, 0.0, 0.0];
pub const WHITE: Color = [1.0, 1.0, 1.0];
pub const GRAY: Color = [0.8, 0.8, 0.8];

/// Default body text size for rendered runs.
pub const DEFAULT_FONT_SIZE: f64 = 11.0;

/// A positioned piece of text on a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub rect: Rect,
    pub font_size: f64,
    pub color: Color,
}

/// A filled and/or stroked rectangle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    pub rect: Rect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
}

/// A review highlight annotation (used by the overlay artifact).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    pub rect: Rect,
    pub color: Color,
    pub label: String,
}

/// A staged redaction: content under `rect` will be stripped at commit
/// time and `replacement` drawn in its place.
#[derive(Debug, Clone)]
struct RedactionMark {
    rect: Rect,
    replacement: String,
}

/// One page of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub runs: Vec<TextRun>,
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub highlights: Vec<Highlight>,
    /// Regions occupied by embedded images, in page space.
    #[serde(default)]
    pub image_regions: Vec<Rect>,

    /// Staged redaction marks. Never serialized: a saved document has
    /// either no marks or already-committed redactions.
    #[serde(skip)]
    pending: Vec<RedactionMark>,
}

impl Page {
    pub fn new(width: f64, height: f64) -> Self {
        Page {
            width,
            height,
            runs: Vec::new(),
            shapes: Vec::new(),
            highlights: Vec::new(),
            image_regions: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Case-insensitive literal search for `needle`.
    ///
    /// Returns one rectangle per match, clamped to the page. Match
    /// rectangles are interpolated from character positions within each
    /// run, assuming uniform glyph advance.
    pub fn search(&self, needle: &str) -> Vec<Rect> {
        if needle.is_empty() {
            return Vec::new();
        }
        let needle: Vec<char> = needle.chars().map(|c| c.to_ascii_lowercase()).collect();

        let mut found = Vec::new();
        for run in &self.runs {
            let chars: Vec<char> = run.text.chars().map(|c| c.to_ascii_lowercase()).collect();
            if chars.len() < needle.len() {
                continue;
            }
            for start in 0..=(chars.len() - needle.len()) {
                if chars[start..start + needle.len()] == needle[..] {
                    let rect = char_span_rect(run, start, start + needle.len(), chars.len());
                    let rect = rect.clamped(self.width, self.height);
                    if rect.is_valid() {
                        found.push(rect);
                    }
                }
            }
        }
        found
    }

    /// Stage a redaction mark on this page.
    fn stage(&mut self, rect: Rect, replacement: &str) {
        self.pending.push(RedactionMark {
            rect,
            replacement: replacement.to_string(),
        });
    }

    /// Commit all staged marks: strip every character whose rectangle
    /// intersects a mark, then draw the replacement content. The
    /// original text is not recoverable from the committed page.
    fn commit(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let marks = std::mem::take(&mut self.pending);

        let mut kept = Vec::new();
        for run in self.runs.drain(..) {
            strip_run(run, &marks, &mut kept);
        }
        self.runs = kept;

        for mark in &marks {
            self.shapes.push(Shape {
                rect: mark.rect,
                stroke: None,
                fill: Some(WHITE),
            });
            if !mark.replacement.is_empty() {
                let font_size = fitted_font_size(&mark.replacement, &mark.rect);
                self.runs.push(TextRun {
                    text: mark.replacement.clone(),
                    rect: mark.rect,
                    font_size,
                    color: BLACK,
                });
            }
        }
    }
}

/// Remove the characters of `run` covered by any mark, emitting the
/// surviving contiguous segments as new runs.
fn strip_run(run: TextRun, marks: &[RedactionMark], out: &mut Vec<TextRun>) {
    let chars: Vec<char> = run.text.chars().collect();
    if chars.is_empty() {
        return;
    }
    if !marks.iter().any(|m| m.rect.intersects(&run.rect)) {
        out.push(run);
        return;
    }

    let n = chars.len();
    let keep: Vec<bool> = (0..n)
        .map(|i| {
            let r = char_span_rect(&run, i, i + 1, n);
            !marks.iter().any(|m| m.rect.intersects(&r))
        })
        .collect();

    let mut start = None;
    for i in 0..=n {
        let keeping = i < n && keep[i];
        match (start, keeping) {
            (None, true) => start = Some(i),
            (Some(s), false) => {
                let text: String = chars[s..i].iter().collect();
                out.push(TextRun {
                    text,
                    rect: char_span_rect(&run, s, i, n),
                    font_size: run.font_size,
                    color: run.color,
                });
                start = None;
            }
            _ => {}
        }
    }
}

/// Rectangle covering characters `[start, end)` of a run, assuming
/// uniform glyph advance across the run's width.
fn char_span_rect(run: &TextRun, start: usize, end: usize, total: usize) -> Rect {
    let advance = run.rect.width() / total.max(1) as f64;
    Rect::new(
        run.rect.x0 + start as f64 * advance,
        run.rect.y0,
        run.rect.x0 + end as f64 * advance,
        run.rect.y1,
    )
}

/// Nominal width of `text` at `font_size`, using an average glyph
/// advance of half an em.
pub fn nominal_text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * 0.5
}

fn fitted_font_size(text: &str, rect: &Rect) -> f64 {
    let mut size = DEFAULT_FONT_SIZE.min(rect.height() * 0.8);
    let width = nominal_text_width(text, size);
    if width > rect.width() && width > 0.0 {
        size *= rect.width() / width;
    }
    size.max(1.0)
}

/// A paginated document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageDocument {
    pub pages: Vec<Page>,
}

impl PageDocument {
    /// Create an empty document with the given page dimensions.
    pub fn with_pages(dimensions: &[(f64, f64)]) -> Self {
        PageDocument {
            pages: dimensions.iter().map(|&(w, h)| Page::new(w, h)).collect(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_mut(&mut self, index: usize) -> Result<&mut Page> {
        let pages = self.pages.len();
        self.pages
            .get_mut(index)
            .ok_or(Error::PageOutOfRange { page: index, pages })
    }

    /// Stage a redaction mark. Commit with [`commit_redactions`].
    ///
    /// [`commit_redactions`]: PageDocument::commit_redactions
    pub fn stage_redaction(&mut self, page: usize, rect: Rect, replacement: &str) -> Result<()> {
        self.page_mut(page)?.stage(rect, replacement);
        Ok(())
    }

    /// Commit all staged redaction marks across the document.
    ///
    /// Marks on the same page are resolved together so overlapping or
    /// adjacent spans cannot corrupt content mid-edit.
    pub fn commit_redactions(&mut self) {
        for page in &mut self.pages {
            page.commit();
        }
    }

    /// Draw a rectangle on a page.
    pub fn draw_rect(
        &mut self,
        page: usize,
        rect: Rect,
        stroke: Option<Color>,
        fill: Option<Color>,
    ) -> Result<()> {
        self.page_mut(page)?.shapes.push(Shape { rect, stroke, fill });
        Ok(())
    }

    /// Insert text centered in `rect`, sized to fit its height.
    ///
    /// Returns false (drawing nothing) when the text does not fit the
    /// rectangle horizontally.
    pub fn insert_centered_text(
        &mut self,
        page: usize,
        rect: Rect,
        text: &str,
        color: Color,
    ) -> Result<bool> {
        let font_size = (rect.height() * 0.6).min(12.0);
        let text_width = nominal_text_width(text, font_size);
        if text_width >= rect.width() {
            return Ok(false);
        }
        let (cx, cy) = rect.center();
        let run = TextRun {
            text: text.to_string(),
            rect: Rect::new(
                cx - text_width / 2.0,
                cy - font_size / 2.0,
                cx + text_width / 2.0,
                cy + font_size / 2.0,
            ),
            font_size,
            color,
        };
        self.page_mut(page)?.runs.push(run);
        Ok(true)
    }

    /// Add a review highlight annotation.
    pub fn add_highlight(&mut self, page: usize, rect: Rect, color: Color, label: &str) -> Result<()> {
        self.page_mut(page)?.highlights.push(Highlight {
            rect,
            color,
            label: label.to_string(),
        });
        Ok(())
    }

    /// Load a document container from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|err| Error::InvalidDocument(format!("{}: {}", path.display(), err)))
    }

    /// Persist the document container as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_page_doc(text: &str, rect: Rect) -> PageDocument {
        let mut doc = PageDocument::with_pages(&[(612.0, 792.0)]);
        doc.pages[0].runs.push(TextRun {
            text: text.to_string(),
            rect,
            font_size: DEFAULT_FONT_SIZE,
            color: BLACK,
        });
        doc
    }

    #[test]
    fn test_search_finds_single_match() {
        let doc = one_page_doc("SSN: 123-45-6789", Rect::new(72.0, 700.0, 232.0, 712.0));
        let hits = doc.pages[0].search("123-45-6789");

        assert_eq!(hits.len(), 1);
        // The run is 16 chars over 160 units; the needle starts at
        // char 5 and spans 11 chars.
        let hit = hits[0];
        assert!((hit.x0 - 122.0).abs() < 1e-9);
        assert!((hit.x1 - 232.0).abs() < 1e-9);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let doc = one_page_doc("Dr. Alice Brown", Rect::new(0.0, 0.0, 150.0, 12.0));
        assert_eq!(doc.pages[0].search("dr. alice brown").len(), 1);
    }

    #[test]
    fn test_search_finds_repeats() {
        let doc = one_page_doc("id 42, again id 42", Rect::new(0.0, 0.0, 180.0, 12.0));
        assert_eq!(doc.pages[0].search("id 42").len(), 2);
    }

    #[test]
    fn test_search_empty_needle() {
        let doc = one_page_doc("anything", Rect::new(0.0, 0.0, 80.0, 12.0));
        assert!(doc.pages[0].search("").is_empty());
    }

    #[test]
    fn test_commit_strips_marked_content() {
        let mut doc = one_page_doc("SSN: 123-45-6789", Rect::new(72.0, 700.0, 232.0, 712.0));
        let hit = doc.pages[0].search("123-45-6789")[0];

        doc.stage_redaction(0, hit, "[SSN_1]").unwrap();
        doc.commit_redactions();

        let all_text: String = doc.pages[0].runs.iter().map(|r| r.text.as_str()).collect();
        assert!(!all_text.contains("123-45-6789"));
        assert!(all_text.contains("[SSN_1]"));
        assert!(all_text.contains("SSN:"));

        // Committed output must not contain the original in serialized
        // form either.
        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("123-45-6789"));
    }

    #[test]
    fn test_commit_resolves_overlapping_marks_together() {
        let mut doc = one_page_doc("alpha beta gamma", Rect::new(0.0, 0.0, 160.0, 12.0));
        let a = doc.pages[0].search("alpha beta")[0];
        let b = doc.pages[0].search("beta gamma")[0];

        doc.stage_redaction(0, a, "[X]").unwrap();
        doc.stage_redaction(0, b, "[Y]").unwrap();
        doc.commit_redactions();

        let all_text: String = doc.pages[0]
            .runs
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("|");
        assert!(!all_text.contains("alpha"));
        assert!(!all_text.contains("beta"));
        assert!(!all_text.contains("gamma"));
    }

    #[test]
    fn test_stage_out_of_range_page_errors() {
        let mut doc = PageDocument::with_pages(&[(100.0, 100.0)]);
        let err = doc
            .stage_redaction(3, Rect::new(0.0, 0.0, 10.0, 10.0), "x")
            .unwrap_err();
        assert!(matches!(err, Error::PageOutOfRange { page: 3, pages: 1 }));
    }

    #[test]
    fn test_insert_centered_text_fits() {
        let mut doc = PageDocument::with_pages(&[(200.0, 200.0)]);
        let rect = Rect::new(10.0, 10.0, 110.0, 40.0);
        assert!(doc.insert_centered_text(0, rect, "Face", WHITE).unwrap());
        // An oversized label is refused rather than overflowing.
        assert!(!doc
            .insert_centered_text(0, rect, &"x".repeat(200), WHITE)
            .unwrap());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        let mut doc = one_page_doc("hello", Rect::new(0.0, 0.0, 50.0, 12.0));
        doc.pages[0].image_regions.push(Rect::new(5.0, 5.0, 25.0, 25.0));
        doc.save(&path).unwrap();

        let loaded = PageDocument::load(&path).unwrap();
        assert_eq!(loaded.page_count(), 1);
        assert_eq!(loaded.pages[0].runs[0].text, "hello");
        assert_eq!(loaded.pages[0].image_regions.len(), 1);
    }

    #[test]
    fn test_load_malformed_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            PageDocument::load(&path),
            Err(Error::InvalidDocument(_))
        ));
    }
}

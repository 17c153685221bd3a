//! Core data structures shared across the report pipeline.
//!
//! Everything here is derived fresh from one exam record per report run and
//! flows forward through the stages without in-place mutation: the normalizer
//! produces a [`NormalizedRecord`], the aggregator reads its rows, the chart
//! builder turns rows into [`ChartArtifact`]s, and the feedback stage fills a
//! [`FeedbackSections`].

use std::fmt;
use std::io::Cursor;

use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// A subject recognized by the reporting pipeline.
///
/// Opaque subject identifiers are resolved through the fixed lookup table in
/// `common::config`; identifiers outside the table become [`Subject::Unknown`]
/// rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Subject {
    Physics,
    Chemistry,
    Mathematics,
    Unknown,
}

impl Subject {
    /// The three subjects a record can legitimately carry, in report order.
    pub const KNOWN: [Subject; 3] = [Subject::Physics, Subject::Chemistry, Subject::Mathematics];

    /// Resolves an opaque subject identifier through the lookup table.
    pub fn from_id(id: &str) -> Self {
        match common::config::subject_name_for_id(id) {
            Some(name) => Subject::from_name(name),
            None => Subject::Unknown,
        }
    }

    /// Resolves a display name ("Physics", "Chemistry", "Mathematics").
    pub fn from_name(name: &str) -> Self {
        match name {
            "Physics" => Subject::Physics,
            "Chemistry" => Subject::Chemistry,
            "Mathematics" => Subject::Mathematics,
            _ => Subject::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Physics => "Physics",
            Subject::Chemistry => "Chemistry",
            Subject::Mathematics => "Mathematics",
            Subject::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One flattened question from the exam attempt, in encounter order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionRow {
    pub subject: Subject,
    pub chapter: String,
    pub level: String,
    pub is_correct: bool,
    /// Seconds spent on the question, coerced to a non-negative integer.
    pub time_taken: u32,
    /// Lowercased, trimmed status string ("answered", "notattempted", ...).
    pub status: String,
    /// Title of the section the question appeared in, when the record names
    /// one. Section-dependent charts are skipped when any row lacks this.
    pub section: Option<String>,
}

/// Per-subject totals as reported by the record itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectSummary {
    pub subject: Subject,
    pub total_correct: u32,
    pub total_attempted: u32,
    /// Accuracy percentage in [0, 100] as carried by the record.
    pub accuracy: f64,
    pub total_time_taken: f64,
}

/// Test-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestInfo {
    pub name: String,
    pub date: String,
    pub total_questions: u32,
    pub total_marks: f64,
    /// Test duration in seconds.
    pub duration: f64,
}

/// The normalized form of one exam record: everything later stages need,
/// with every optional input field already defaulted.
#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    pub test: TestInfo,
    pub subjects: Vec<SubjectSummary>,
    pub rows: Vec<QuestionRow>,
    /// Raw syllabus markup from the record, used by the chapter indexer.
    pub syllabus_html: String,
}

impl NormalizedRecord {
    /// Whether the section column is usable: present on every row.
    pub fn has_section(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|r| r.section.is_some())
    }
}

/// One rendered visualization plus its caption, ready for embedding.
#[derive(Debug, Clone)]
pub struct ChartArtifact {
    /// Stable identifier, also used as the file stem when saved to disk.
    pub name: String,
    /// Plain-language explanation shown beneath the image in the report.
    pub caption: String,
    pub width: u32,
    pub height: u32,
    /// Raw RGB8 pixels, row-major, `width * height * 3` bytes.
    pub rgb: Vec<u8>,
}

impl ChartArtifact {
    /// Encodes the raw pixels as a PNG for front-ends that want files.
    pub fn to_png(&self) -> Result<Vec<u8>, ReportError> {
        let img = image::RgbImage::from_raw(self.width, self.height, self.rgb.clone())
            .ok_or_else(|| {
                ReportError::ChartError(format!(
                    "pixel buffer does not match {}x{} for chart '{}'",
                    self.width, self.height, self.name
                ))
            })?;
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| ReportError::ChartError(e.to_string()))?;
        Ok(bytes)
    }
}

/// The named sections of the feedback narrative, split out of the markdown
/// document returned by the narrative generator (or its fallback).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedbackSections {
    pub intro: String,
    pub subject_breakdown: String,
    pub chapter_breakdown: String,
    pub difficulty_breakdown: String,
    pub time_breakdown: String,
    pub overall_breakdown: String,
    pub suggestions: String,
}

impl FeedbackSections {
    /// True when no section received any content: the narrative output was
    /// unusable and the caller should substitute the templated fallback.
    pub fn is_blank(&self) -> bool {
        self.intro.trim().is_empty()
            && self.subject_breakdown.trim().is_empty()
            && self.chapter_breakdown.trim().is_empty()
            && self.difficulty_breakdown.trim().is_empty()
            && self.time_breakdown.trim().is_empty()
            && self.overall_breakdown.trim().is_empty()
            && self.suggestions.trim().is_empty()
    }
}

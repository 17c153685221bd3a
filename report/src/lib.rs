//! # Report Library
//!
//! Core pipeline for turning one exam-submission JSON record into a
//! paginated PDF performance report. The stages run in a fixed order and
//! each consumes the previous stage's output:
//!
//! 1. **Normalize** the raw record into question rows, subject summaries and
//!    test metadata ([`parsers::record_parser`]).
//! 2. **Aggregate** per-question, per-chapter and per-level statistics
//!    ([`stats`]).
//! 3. **Index chapters** per subject from the syllabus markup and the rows
//!    ([`chapters`]).
//! 4. **Generate feedback** through the injected narrative strategy, falling
//!    back to templated text ([`feedback`]).
//! 5. **Render charts** ([`charts`]) and **assemble the document**
//!    ([`pdf`]).
//!
//! ## Key Concepts
//! - **ReportJob**: one report generation, owning its inputs and the
//!   pluggable narrative strategy; nothing is shared across requests.
//! - **NarrativeGenerator**: the capability interface to the external
//!   text-generation collaborator; its failures are routine and recovered
//!   locally.

pub mod chapters;
pub mod charts;
pub mod error;
pub mod feedback;
pub mod parsers;
pub mod pdf;
pub mod stats;
pub mod traits;
pub mod types;
pub mod utilities;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use crate::error::ReportError;
use crate::feedback::GeminiNarrative;
use crate::stats::ExamStatistics;
use crate::traits::narrative::NarrativeGenerator;
use crate::types::{ChartArtifact, FeedbackSections};

/// The finished output of one report generation.
pub struct GeneratedReport {
    /// Default download name: `<StudentName>_Performance_Report.pdf`.
    pub filename: String,
    /// The complete document bytes.
    pub pdf: Vec<u8>,
    /// The rendered chart artifacts, in report order.
    pub charts: Vec<ChartArtifact>,
    /// The feedback sections embedded in the document.
    pub sections: FeedbackSections,
    /// The aggregated statistics the document was built from.
    pub statistics: ExamStatistics,
    pub generated_at: DateTime<Utc>,
}

/// One report generation: the raw record plus per-run configuration.
///
/// Defaults to the Gemini-backed narrative strategy; inject another
/// implementation with [`ReportJob::with_narrative`] for tests or offline
/// runs.
pub struct ReportJob {
    record: Value,
    student_name: String,
    narrative: Box<dyn NarrativeGenerator>,
}

impl ReportJob {
    /// Creates a job for a raw record (an object, or an array of which only
    /// the first element is used).
    pub fn new(record: Value) -> Self {
        Self {
            record,
            student_name: "Student".to_string(),
            narrative: Box::new(GeminiNarrative::new()),
        }
    }

    /// Sets the recipient name used on the cover page and in the prompt.
    pub fn with_student_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.student_name = name.trim().to_string();
        }
        self
    }

    /// Replaces the narrative strategy.
    pub fn with_narrative(mut self, narrative: Box<dyn NarrativeGenerator>) -> Self {
        self.narrative = narrative;
        self
    }

    /// Runs the whole pipeline and returns the finished report.
    ///
    /// # Errors
    ///
    /// Only input-shape and document-assembly problems abort the run;
    /// narrative-service failures and per-chart rendering failures are
    /// recovered internally.
    pub async fn generate(self) -> Result<GeneratedReport, ReportError> {
        let record = parsers::record_parser::parse_exam_record(&self.record)?;
        info!(
            questions = record.rows.len(),
            subjects = record.subjects.len(),
            test = %record.test.name,
            "normalized exam record"
        );

        let statistics = stats::aggregate(&record.rows, &record.test);
        let chapter_index = chapters::build_chapter_index(&record, self.narrative.as_ref()).await;
        let sections = feedback::generate_feedback(
            self.narrative.as_ref(),
            &statistics,
            &record.subjects,
            &chapter_index,
            &record.test,
            &self.student_name,
        )
        .await;
        let charts = charts::build_charts(&record.rows);
        info!(charts = charts.len(), "rendered chart set");

        let pdf = pdf::assemble_report(
            &statistics,
            &record.subjects,
            &sections,
            &charts,
            &record.test,
            &self.student_name,
        )?;

        Ok(GeneratedReport {
            filename: format!("{}_Performance_Report.pdf", self.student_name),
            pdf,
            charts,
            sections,
            statistics,
            generated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::DisabledNarrative;
    use serde_json::json;

    fn sample_record() -> Value {
        json!({
            "test": {
                "title": "QPT 1",
                "totalQuestions": 3,
                "totalMarks": 12,
                "duration": 600,
                "syllabus": "<ul><li>Functions</li><li>Capacitance</li></ul>"
            },
            "subjects": [
                {
                    "subjectId": {"$oid": "607018ee404ae53194e73d92"},
                    "totalCorrect": 1,
                    "totalAttempted": 2,
                    "accuracy": 50.0,
                    "totalTimeTaken": 130
                }
            ],
            "sections": [
                {
                    "title": "Section A",
                    "questions": [
                        {
                            "questionId": {"chapters": [{"title": "Capacitance"}], "level": "easy"},
                            "subjectId": {"$oid": "607018ee404ae53194e73d92"},
                            "markedOptions": [{"isCorrect": true}],
                            "timeTaken": 40,
                            "status": "answered"
                        },
                        {
                            "questionId": {"chapters": [{"title": "Capacitance"}], "level": "medium"},
                            "subjectId": {"$oid": "607018ee404ae53194e73d92"},
                            "markedOptions": [{"isCorrect": false}],
                            "timeTaken": 90,
                            "status": "answered"
                        },
                        {
                            "questionId": {"chapters": [{"title": "Functions"}], "level": "hard"},
                            "subjectId": {"$oid": "607018ee404ae53194e73d91"},
                            "timeTaken": 120,
                            "status": "notattempted"
                        }
                    ]
                }
            ]
        })
    }

    #[tokio::test]
    async fn pipeline_produces_a_document_without_the_external_service() {
        let report = ReportJob::new(sample_record())
            .with_student_name("Asha")
            .with_narrative(Box::new(DisabledNarrative))
            .generate()
            .await
            .unwrap();
        assert_eq!(report.filename, "Asha_Performance_Report.pdf");
        assert!(report.pdf.starts_with(b"%PDF"));
        assert!(!report.sections.is_blank());
        assert_eq!(report.statistics.overall.total_questions, 3);
        assert_eq!(report.statistics.overall.correct, 1);
    }

    #[tokio::test]
    async fn invalid_record_is_a_recoverable_error() {
        let result = ReportJob::new(json!("nope"))
            .with_narrative(Box::new(DisabledNarrative))
            .generate()
            .await;
        assert!(matches!(result, Err(ReportError::InvalidRecord(_))));
    }

    #[tokio::test]
    async fn blank_student_names_keep_the_default() {
        let report = ReportJob::new(sample_record())
            .with_student_name("   ")
            .with_narrative(Box::new(DisabledNarrative))
            .generate()
            .await
            .unwrap();
        assert_eq!(report.filename, "Student_Performance_Report.pdf");
    }

    // Chart rendering depends on a system font; the full-count assertion is
    // exercised where fonts are available.
    #[tokio::test]
    #[ignore]
    async fn pipeline_renders_the_full_chart_set() {
        let report = ReportJob::new(sample_record())
            .with_narrative(Box::new(DisabledNarrative))
            .generate()
            .await
            .unwrap();
        assert_eq!(report.charts.len(), 17);
    }

    #[tokio::test]
    async fn identical_inputs_yield_identical_shapes() {
        let first = ReportJob::new(sample_record())
            .with_narrative(Box::new(DisabledNarrative))
            .generate()
            .await
            .unwrap();
        let second = ReportJob::new(sample_record())
            .with_narrative(Box::new(DisabledNarrative))
            .generate()
            .await
            .unwrap();
        assert_eq!(first.charts.len(), second.charts.len());
        assert_eq!(first.statistics, second.statistics);
        assert_eq!(first.sections, second.sections);
    }
}

//! # Chapter Index Builder
//!
//! Builds the per-subject chapter listing used by the feedback prompt and
//! the suggestion heuristics. Two sources are merged:
//!
//! 1. An AI-assisted parse of the syllabus markup: one prompt to the
//!    narrative service asking for a JSON object of per-subject chapter
//!    lists.
//!    Failure of any kind (transport, fences, bad JSON) is routine and only
//!    logged.
//! 2. The manual path, which always runs: `<li>` items scraped from the
//!    syllabus HTML classified by keyword, supplemented by chapters observed
//!    directly on question rows.
//!
//! Invariants: chapter titles are unique within a subject, sorted
//! alphabetically, and the manual path never files one chapter under two
//! subjects. Mathematics is additionally filtered against the
//! physics/chemistry keyword denylists.

use std::collections::BTreeMap;

use tracing::warn;

use crate::error::ReportError;
use crate::parsers::syllabus_parser::{is_science_chapter, syllabus_chapters};
use crate::traits::narrative::NarrativeGenerator;
use crate::types::{NormalizedRecord, Subject};

/// Ordered, deduplicated chapter titles per subject.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterIndex {
    map: BTreeMap<Subject, Vec<String>>,
}

impl ChapterIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a chapter under a subject unless it is already present there or
    /// filed under a different subject.
    pub fn insert(&mut self, subject: Subject, title: &str) {
        let title = title.trim();
        if title.is_empty() || self.assigned_elsewhere(subject, title) {
            return;
        }
        let list = self.map.entry(subject).or_default();
        if !list.iter().any(|t| t == title) {
            list.push(title.to_string());
        }
    }

    pub fn chapters(&self, subject: Subject) -> &[String] {
        self.map.get(&subject).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, subject: Subject, chapter: &str) -> bool {
        self.chapters(subject).iter().any(|t| t == chapter)
    }

    pub fn is_empty(&self) -> bool {
        self.map.values().all(Vec::is_empty)
    }

    fn assigned_elsewhere(&self, subject: Subject, title: &str) -> bool {
        self.map
            .iter()
            .any(|(s, list)| *s != subject && list.iter().any(|t| t == title))
    }

    fn sort(&mut self) {
        for list in self.map.values_mut() {
            list.sort();
            list.dedup();
        }
    }

    /// Renders the index as pretty JSON for embedding in prompts.
    pub fn to_prompt_json(&self) -> String {
        let as_names: BTreeMap<&str, &Vec<String>> = self
            .map
            .iter()
            .map(|(subject, list)| (subject.as_str(), list))
            .collect();
        serde_json::to_string_pretty(&as_names).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Builds the chapter index for a record: one AI attempt, then the manual
/// merge. Never fails; a completely empty record yields an empty index.
pub async fn build_chapter_index(
    record: &NormalizedRecord,
    narrative: &dyn NarrativeGenerator,
) -> ChapterIndex {
    let mut index = match narrative.generate(&chapter_prompt(&record.syllabus_html)).await {
        Ok(text) => match parse_chapter_response(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("chapter extraction returned unusable output: {e}");
                ChapterIndex::new()
            }
        },
        Err(e) => {
            warn!("chapter extraction via narrative service failed: {e}");
            ChapterIndex::new()
        }
    };

    // Manual path: syllabus list items classified by keyword.
    for (subject, title) in syllabus_chapters(&record.syllabus_html) {
        index.insert(subject, &title);
    }

    // Chapters observed on question rows. Rows with an unmapped subject are
    // filed under Mathematics, and Mathematics rejects science chapters.
    for row in &record.rows {
        if row.chapter == "Unknown" {
            continue;
        }
        let subject = match row.subject {
            Subject::Unknown => Subject::Mathematics,
            other => other,
        };
        if subject == Subject::Mathematics && is_science_chapter(&row.chapter) {
            continue;
        }
        index.insert(subject, &row.chapter);
    }

    index.sort();
    index
}

/// The prompt sent to the narrative service for AI-assisted extraction.
pub fn chapter_prompt(syllabus_html: &str) -> String {
    let excerpt: String = syllabus_html.chars().take(1000).collect();
    format!(
        "You are an expert in processing educational test data. A test syllabus is \
        provided as HTML listing chapters, and questions carry per-subject chapter \
        titles.\n\
        \n\
        Syllabus HTML (possibly truncated):\n{excerpt}\n\
        \n\
        Task: extract every unique chapter title and associate it with its subject \
        (Physics, Chemistry, Mathematics). If a subject is unclear, infer it from \
        the chapter title (e.g. \"Mechanics\" is Physics, \"Organic Chemistry\" is \
        Chemistry, \"Functions\" is Mathematics). For Mathematics, include only \
        clearly mathematical topics and exclude Physics or Chemistry chapters. \
        Avoid duplicates and sort each list alphabetically.\n\
        \n\
        Output JSON only, in this exact shape:\n\
        ```json\n\
        {{\n\
          \"Physics\": [\"Chapter 1\", \"Chapter 2\"],\n\
          \"Chemistry\": [\"Chapter 1\"],\n\
          \"Mathematics\": [\"Chapter 1\"]\n\
        }}\n\
        ```\n"
    )
}

/// Parses the service's response: strips markdown fences by slicing from the
/// first `{` to the last `}`, then decodes an object mapping subject names
/// to chapter lists.
/// Unknown subject names are ignored.
pub fn parse_chapter_response(text: &str) -> Result<ChapterIndex, ReportError> {
    let start = text.find('{').ok_or_else(|| {
        ReportError::InvalidJson("no JSON object in chapter response".to_string())
    })?;
    let end = text.rfind('}').ok_or_else(|| {
        ReportError::InvalidJson("unterminated JSON object in chapter response".to_string())
    })?;
    if end < start {
        return Err(ReportError::InvalidJson(
            "malformed JSON object in chapter response".to_string(),
        ));
    }
    let decoded: BTreeMap<String, Vec<String>> = serde_json::from_str(&text[start..=end])?;

    let mut index = ChapterIndex::new();
    for (name, chapters) in decoded {
        let subject = Subject::from_name(&name);
        if subject == Subject::Unknown {
            continue;
        }
        for chapter in chapters {
            index.insert(subject, &chapter);
        }
    }
    index.sort();
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{QuestionRow, TestInfo};
    use async_trait::async_trait;

    struct CannedNarrative(&'static str);

    #[async_trait]
    impl NarrativeGenerator for CannedNarrative {
        async fn generate(&self, _prompt: &str) -> Result<String, ReportError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingNarrative;

    #[async_trait]
    impl NarrativeGenerator for FailingNarrative {
        async fn generate(&self, _prompt: &str) -> Result<String, ReportError> {
            Err(ReportError::NarrativeError("simulated outage".to_string()))
        }
    }

    fn record(rows: Vec<QuestionRow>, syllabus: &str) -> NormalizedRecord {
        NormalizedRecord {
            test: TestInfo {
                name: "T".to_string(),
                date: "11 May 2025".to_string(),
                total_questions: rows.len() as u32,
                total_marks: 4.0 * rows.len() as f64,
                duration: 3600.0,
            },
            subjects: vec![],
            rows,
            syllabus_html: syllabus.to_string(),
        }
    }

    fn row(subject: Subject, chapter: &str) -> QuestionRow {
        QuestionRow {
            subject,
            chapter: chapter.to_string(),
            level: "easy".to_string(),
            is_correct: true,
            time_taken: 30,
            status: "answered".to_string(),
            section: Some("Section A".to_string()),
        }
    }

    #[test]
    fn fenced_json_responses_parse() {
        let index = parse_chapter_response(
            "```json\n{\"Physics\": [\"Optics\"], \"Mathematics\": [\"Functions\"]}\n```",
        )
        .unwrap();
        assert_eq!(index.chapters(Subject::Physics), ["Optics"]);
        assert_eq!(index.chapters(Subject::Mathematics), ["Functions"]);
    }

    #[test]
    fn unusable_responses_are_errors() {
        assert!(parse_chapter_response("no json here").is_err());
        assert!(parse_chapter_response("{\"Physics\": 3}").is_err());
    }

    #[tokio::test]
    async fn manual_merge_runs_even_when_service_fails() {
        let rows = vec![
            row(Subject::Physics, "Optics"),
            row(Subject::Chemistry, "Electrochemistry"),
            row(Subject::Mathematics, "Functions"),
        ];
        let syllabus = "<ul><li>Sets and Relations</li><li>Capacitance</li></ul>";
        let index = build_chapter_index(&record(rows, syllabus), &FailingNarrative).await;
        assert_eq!(index.chapters(Subject::Physics), ["Capacitance", "Optics"]);
        assert_eq!(index.chapters(Subject::Chemistry), ["Electrochemistry"]);
        assert_eq!(
            index.chapters(Subject::Mathematics),
            ["Functions", "Sets and Relations"]
        );
    }

    #[tokio::test]
    async fn ai_result_is_supplemented_by_observed_rows() {
        let rows = vec![row(Subject::Physics, "Waves")];
        let index = build_chapter_index(
            &record(rows, ""),
            &CannedNarrative("{\"Physics\": [\"Optics\"]}"),
        )
        .await;
        assert_eq!(index.chapters(Subject::Physics), ["Optics", "Waves"]);
    }

    #[tokio::test]
    async fn mathematics_rejects_science_chapters_from_rows() {
        let rows = vec![
            row(Subject::Mathematics, "Electrochemistry"),
            row(Subject::Mathematics, "Functions"),
            row(Subject::Unknown, "Probability"),
        ];
        let index = build_chapter_index(&record(rows, ""), &FailingNarrative).await;
        assert_eq!(
            index.chapters(Subject::Mathematics),
            ["Functions", "Probability"]
        );
    }

    #[tokio::test]
    async fn no_chapter_appears_under_two_subjects() {
        // The syllabus classifies "Solutions" as Chemistry; a Physics row
        // carrying the same title must not duplicate it under Physics.
        let rows = vec![row(Subject::Physics, "Solutions")];
        let syllabus = "<ul><li>Solutions</li></ul>";
        let index = build_chapter_index(&record(rows, syllabus), &FailingNarrative).await;
        assert_eq!(index.chapters(Subject::Chemistry), ["Solutions"]);
        assert!(index.chapters(Subject::Physics).is_empty());
    }

    #[test]
    fn unknown_chapter_placeholder_is_skipped() {
        // Exercised through build_chapter_index in other tests; insert also
        // ignores blanks directly.
        let mut index = ChapterIndex::new();
        index.insert(Subject::Physics, "  ");
        assert!(index.is_empty());
    }
}

//! # Narrative Feedback Generator
//!
//! Produces the personalized feedback sections for a report. The flow is a
//! short state machine: build the prompt, call the injected
//! [`NarrativeGenerator`] once, split the (sanitized) markdown into named
//! sections. On any failure, empty response, or document with no
//! recognizable sections, substitute the deterministic templated fallback
//! assembled purely from aggregator values.
//!
//! The external service failing is routine here: it never surfaces as a
//! user-facing failure of the whole report.

pub mod fallback;
pub mod gemini;

use async_trait::async_trait;
use tracing::warn;

use crate::chapters::ChapterIndex;
use crate::error::ReportError;
use crate::parsers::feedback_parser::split_feedback_sections;
use crate::stats::ExamStatistics;
use crate::traits::narrative::NarrativeGenerator;
use crate::types::{FeedbackSections, SubjectSummary, TestInfo};
use crate::utilities::sanitize::sanitize_text;

pub use gemini::GeminiNarrative;

/// Narrative strategy that always declines, forcing the templated fallback.
/// Used by the batch front-end's offline mode and by tests.
pub struct DisabledNarrative;

#[async_trait]
impl NarrativeGenerator for DisabledNarrative {
    async fn generate(&self, _prompt: &str) -> Result<String, ReportError> {
        Err(ReportError::NarrativeError(
            "narrative generation is disabled".to_string(),
        ))
    }
}

/// Generates the feedback sections for one attempt.
pub async fn generate_feedback(
    narrative: &dyn NarrativeGenerator,
    stats: &ExamStatistics,
    subjects: &[SubjectSummary],
    chapters: &ChapterIndex,
    test: &TestInfo,
    student_name: &str,
) -> FeedbackSections {
    let prompt = build_prompt(stats, subjects, chapters, test, student_name);

    let raw = match narrative.generate(&prompt).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            warn!("narrative service returned empty feedback; using templated fallback");
            fallback::fallback_markdown(stats, subjects, chapters, test, student_name)
        }
        Err(e) => {
            warn!("narrative service failed ({e}); using templated fallback");
            fallback::fallback_markdown(stats, subjects, chapters, test, student_name)
        }
    };

    let sections = split_feedback_sections(&sanitize_text(&raw));
    if sections.is_blank() {
        warn!("narrative output had no recognizable sections; using templated fallback");
        let markdown = fallback::fallback_markdown(stats, subjects, chapters, test, student_name);
        split_feedback_sections(&sanitize_text(&markdown))
    } else {
        sections
    }
}

/// Builds the feedback prompt: the computed statistics, the chapter index,
/// and instructions pinning the exact markdown skeleton the section splitter
/// expects.
pub fn build_prompt(
    stats: &ExamStatistics,
    subjects: &[SubjectSummary],
    chapters: &ChapterIndex,
    test: &TestInfo,
    student_name: &str,
) -> String {
    let (weakest_name, weakest_subject, weakest_acc) = stats
        .weakest_chapter
        .as_ref()
        .map(|c| (c.chapter.clone(), c.subject.to_string(), c.accuracy))
        .unwrap_or_else(|| ("N/A".to_string(), "N/A".to_string(), 0.0));
    let (strongest_name, strongest_subject, strongest_acc) = stats
        .strongest_chapter
        .as_ref()
        .map(|c| (c.chapter.clone(), c.subject.to_string(), c.accuracy))
        .unwrap_or_else(|| ("N/A".to_string(), "N/A".to_string(), 0.0));
    let (toughest_level, toughest_acc) = stats
        .toughest_level
        .as_ref()
        .map(|l| (l.key.clone(), l.accuracy))
        .unwrap_or_else(|| ("N/A".to_string(), 0.0));

    format!(
        "You are an expert educational assistant creating a personalized feedback report \
        for {student_name} based on their performance in {test_name} ({test_date}). Use the \
        provided data to craft a motivating, data-driven narrative with highly specific, \
        chapter-focused actionable suggestions. Avoid generic advice.\n\
        \n\
        **Performance Data**:\n\
        - Total Questions: {total}\n\
        - Correct Answers: {correct}\n\
        - Total Marks Scored: {marks:.2}/{total_marks:.0}\n\
        - Accuracy: {accuracy:.2}%\n\
        - Average Time per Question: {avg_time:.2}s\n\
        - Time Used: {time_used:.2}% of {duration:.0}s\n\
        - Weakest Chapter: {weakest_name} in {weakest_subject} ({weakest_acc:.2}%)\n\
        - Strongest Chapter: {strongest_name} in {strongest_subject} ({strongest_acc:.2}%)\n\
        - Toughest Difficulty: {toughest_level} ({toughest_acc:.2}%)\n\
        - Accuracy on Slow Questions: {slow_acc:.2}%\n\
        - Subject-wise Performance:\n\
        {subject_summary}\n\
        - Chapter-wise Performance:\n\
        {chapter_summary}\n\
        - Chapters by Subject:\n\
        {chapter_index}\n\
        \n\
        **Instructions**:\n\
        - **Intro (100-150 words)**: Greet {student_name}, acknowledge effort, highlight \
        strengths (e.g., strongest chapter), and encourage improvement in weaker chapters.\n\
        - **Performance Breakdown (200-300 words)**: analyze per subject, per chapter, per \
        difficulty level, time vs. accuracy, and overall metrics, using the data above.\n\
        - **Actionable Suggestions (200-250 words)**: 4-5 specific, data-driven suggestions \
        per subject (Physics, Chemistry, Mathematics), each starting with '-' and \
        referencing specific chapters, accuracy, or time metrics. For Mathematics, only \
        suggest chapters listed under Mathematics in Chapters by Subject.\n\
        - **Tone**: friendly, encouraging, specific, motivating.\n\
        - **Output Format** (markdown):\n\
        ```markdown\n\
        ### Intro\n\
        ...\n\
        ### Performance Breakdown\n\
        #### Subject-wise Analysis\n\
        ...\n\
        #### Chapter-wise Analysis\n\
        ...\n\
        #### Difficulty-wise Analysis\n\
        ...\n\
        #### Time and Accuracy Insights\n\
        ...\n\
        #### Overall Metrics\n\
        ...\n\
        ### Actionable Suggestions\n\
        **Physics:**\n\
        - ...\n\
        **Chemistry:**\n\
        - ...\n\
        **Mathematics:**\n\
        - ...\n\
        ```\n",
        test_name = test.name,
        test_date = test.date,
        total = stats.overall.total_questions,
        correct = stats.overall.correct,
        marks = stats.overall.marks_scored,
        total_marks = stats.overall.total_marks,
        accuracy = stats.overall.accuracy,
        avg_time = stats.overall.avg_time,
        time_used = stats.overall.time_used_pct,
        duration = stats.overall.duration,
        slow_acc = stats.slow.accuracy,
        subject_summary = fallback::subject_summary_text(subjects),
        chapter_summary = fallback::chapter_summary_text(stats),
        chapter_index = chapters.to_prompt_json(),
    )
}

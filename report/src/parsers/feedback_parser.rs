//! Splits the feedback markdown document into its named sections.
//!
//! The narrative service is asked for a document with a fixed set of header
//! lines. This parser is a small state machine over those markers: a line
//! matching a marker switches the current section, every other non-blank
//! line is appended (with a trailing newline) to the section the cursor
//! points at, and lines seen before the first recognized marker are
//! discarded.

use crate::types::FeedbackSections;

/// The fixed section markers, in the order the document requests them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionMarker {
    Intro,
    /// "### Performance Breakdown" introduces the subsections but owns no
    /// text itself; it parks the cursor until the next marker.
    BreakdownRoot,
    SubjectBreakdown,
    ChapterBreakdown,
    DifficultyBreakdown,
    TimeBreakdown,
    OverallBreakdown,
    Suggestions,
}

impl SectionMarker {
    /// Matches a trimmed line against the fixed header prefixes.
    fn match_line(line: &str) -> Option<SectionMarker> {
        if line.starts_with("### Intro") {
            Some(SectionMarker::Intro)
        } else if line.starts_with("### Performance Breakdown") {
            Some(SectionMarker::BreakdownRoot)
        } else if line.starts_with("#### Subject-wise Analysis") {
            Some(SectionMarker::SubjectBreakdown)
        } else if line.starts_with("#### Chapter-wise Analysis") {
            Some(SectionMarker::ChapterBreakdown)
        } else if line.starts_with("#### Difficulty-wise Analysis") {
            Some(SectionMarker::DifficultyBreakdown)
        } else if line.starts_with("#### Time and Accuracy Insights") {
            Some(SectionMarker::TimeBreakdown)
        } else if line.starts_with("#### Overall Metrics") {
            Some(SectionMarker::OverallBreakdown)
        } else if line.starts_with("### Actionable Suggestions") {
            Some(SectionMarker::Suggestions)
        } else {
            None
        }
    }
}

/// Parses a feedback markdown document into [`FeedbackSections`].
pub fn split_feedback_sections(text: &str) -> FeedbackSections {
    let mut sections = FeedbackSections::default();
    let mut cursor: Option<SectionMarker> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(marker) = SectionMarker::match_line(line) {
            cursor = match marker {
                SectionMarker::BreakdownRoot => None,
                other => Some(other),
            };
            continue;
        }
        let target = match cursor {
            Some(SectionMarker::Intro) => &mut sections.intro,
            Some(SectionMarker::SubjectBreakdown) => &mut sections.subject_breakdown,
            Some(SectionMarker::ChapterBreakdown) => &mut sections.chapter_breakdown,
            Some(SectionMarker::DifficultyBreakdown) => &mut sections.difficulty_breakdown,
            Some(SectionMarker::TimeBreakdown) => &mut sections.time_breakdown,
            Some(SectionMarker::OverallBreakdown) => &mut sections.overall_breakdown,
            Some(SectionMarker::Suggestions) => &mut sections.suggestions,
            Some(SectionMarker::BreakdownRoot) | None => continue,
        };
        target.push_str(line);
        target.push('\n');
    }

    sections
}

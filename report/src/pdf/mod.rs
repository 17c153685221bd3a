//! # Report Assembler
//!
//! Lays out the paginated report: cover page, summary statistics,
//! personalized feedback, performance analysis with the subject table, the
//! actionable-suggestions block, the chapter table sorted by descending
//! accuracy, and the chart gallery at two charts per page.
//!
//! Failure policy: a missing or undecodable chart renders as a placeholder
//! text block, a missing feedback section renders as a placeholder notice,
//! and the assembler returns the completed document bytes even when
//! decorative inputs were absent.

pub mod document;

use document::{Align, FontStyle, ReportPdf, ACCENT, TEXT_DARK};

use crate::error::ReportError;
use crate::stats::ExamStatistics;
use crate::types::{ChartArtifact, FeedbackSections, SubjectSummary, TestInfo};

/// Assembles the complete report document.
pub fn assemble_report(
    stats: &ExamStatistics,
    subjects: &[SubjectSummary],
    sections: &FeedbackSections,
    charts: &[ChartArtifact],
    test: &TestInfo,
    student_name: &str,
) -> Result<Vec<u8>, ReportError> {
    let mut pdf = ReportPdf::new("Student Performance Report")?;

    // Cover page.
    pdf.set_cursor(40.0);
    pdf.multi_cell(
        "Student Performance Report",
        12.0,
        24.0,
        FontStyle::Bold,
        ACCENT,
        Align::Center,
    );
    pdf.set_cursor(150.0);
    pdf.multi_cell(
        &format!("{} - {}", test.name, test.date),
        10.0,
        16.0,
        FontStyle::Bold,
        (60, 60, 60),
        Align::Center,
    );
    pdf.multi_cell(
        &format!("For: {student_name}"),
        10.0,
        12.0,
        FontStyle::Regular,
        (60, 60, 60),
        Align::Center,
    );
    pdf.multi_cell(
        "Generated by Scorelens AI",
        10.0,
        12.0,
        FontStyle::Regular,
        (60, 60, 60),
        Align::Center,
    );

    // Summary statistics.
    pdf.add_page();
    pdf.section_title("1. Summary Statistics");
    let metrics = [
        format!("Total Questions: {}", stats.overall.total_questions),
        format!("Correct Answers: {}", stats.overall.correct),
        format!("Accuracy: {:.2}%", stats.overall.accuracy),
        format!(
            "Average Time per Question: {:.2}s",
            stats.overall.avg_time
        ),
        format!(
            "Marks Scored: {:.1}/{:.0}",
            stats.overall.marks_scored, stats.overall.total_marks
        ),
        format!(
            "Time Used: {:.2}% of {:.0}s",
            stats.overall.time_used_pct, stats.overall.duration
        ),
    ];
    for metric in &metrics {
        pdf.multi_cell(metric, 7.0, 11.0, FontStyle::Regular, TEXT_DARK, Align::Left);
        pdf.vertical_gap(4.0);
    }

    // Personalized feedback.
    pdf.section_title("2. Personalized Feedback");
    if sections.intro.trim().is_empty() {
        pdf.placeholder("[No feedback provided]");
    } else {
        pdf.multi_cell(
            &sections.intro,
            6.0,
            10.0,
            FontStyle::Regular,
            TEXT_DARK,
            Align::Left,
        );
    }
    pdf.vertical_gap(6.0);

    // Performance analysis subsections, emitted only when non-blank.
    pdf.section_title("3. Performance Analysis");
    let breakdowns = [
        ("Subject-wise Analysis", &sections.subject_breakdown),
        ("Chapter-wise Analysis", &sections.chapter_breakdown),
        ("Difficulty-wise Analysis", &sections.difficulty_breakdown),
        ("Time vs. Accuracy", &sections.time_breakdown),
        ("Overall Metrics", &sections.overall_breakdown),
    ];
    for (label, content) in breakdowns {
        if content.trim().is_empty() {
            continue;
        }
        pdf.subtitle(label);
        pdf.multi_cell(content, 6.0, 10.0, FontStyle::Regular, TEXT_DARK, Align::Left);
        pdf.vertical_gap(4.0);
    }

    // Subject-wise performance table.
    let subject_rows: Vec<Vec<Option<String>>> = subjects
        .iter()
        .map(|s| {
            vec![
                Some(s.subject.to_string()),
                Some(s.total_correct.to_string()),
                Some(s.total_attempted.to_string()),
                Some(format!("{:.2}", s.accuracy)),
                Some(format!("{:.2}", s.total_time_taken)),
            ]
        })
        .collect();
    pdf.add_table(
        Some("Subject-wise Performance"),
        &["Subject", "Correct", "Attempted", "Accuracy (%)", "Time (s)"],
        &[50.0, 30.0, 30.0, 30.0, 30.0],
        &subject_rows,
    );

    // Actionable suggestions.
    pdf.plain_section_title("4. Actionable Suggestions");
    add_suggestions(&mut pdf, &sections.suggestions);

    // Chapter-wise analysis, sorted by descending accuracy.
    pdf.section_title("5. Chapter-wise Analysis");
    let mut chapter_stats = stats.chapters.clone();
    chapter_stats.sort_by(|a, b| b.accuracy.total_cmp(&a.accuracy));
    if chapter_stats.is_empty() {
        pdf.placeholder("[No chapters found in the test data]");
        pdf.vertical_gap(4.0);
    } else {
        let chapter_rows: Vec<Vec<Option<String>>> = chapter_stats
            .iter()
            .map(|c| {
                vec![
                    Some(c.key.clone()),
                    Some(c.questions.to_string()),
                    Some(c.correct.to_string()),
                    Some(format!("{:.2}", c.accuracy)),
                    Some(format!("{:.2}", c.avg_time)),
                ]
            })
            .collect();
        pdf.add_table(
            Some("Performance by Chapter"),
            &["Chapter", "Questions", "Correct", "Accuracy (%)", "Avg Time (s)"],
            &[60.0, 30.0, 30.0, 30.0, 30.0],
            &chapter_rows,
        );
    }

    // Chart gallery, two charts per page.
    pdf.section_title("6. Visual Insights");
    if charts.is_empty() {
        pdf.placeholder("[No charts available]");
    }
    for (i, chart) in charts.iter().enumerate() {
        if i % 2 == 0 && i > 0 {
            pdf.add_page();
        }
        pdf.add_image(chart, &title_case(&chart.name), &chart.caption);
    }

    pdf.finish()
}

/// One parsed block of the suggestions markdown: a subject heading and its
/// bullet items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SuggestionBlock {
    pub subject: String,
    pub items: Vec<String>,
}

/// Parses the suggestions markdown: `**Subject:**` lines open a block,
/// `-`/`*` lines (and any other line inside a block) become bullet items,
/// and lines before the first subject heading are discarded.
pub(crate) fn parse_suggestion_blocks(text: &str) -> Vec<SuggestionBlock> {
    let mut blocks: Vec<SuggestionBlock> = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line.len() >= 4 && line.starts_with("**") && line.ends_with("**") {
            let subject = line
                .trim_matches('*')
                .trim()
                .trim_end_matches(':')
                .to_string();
            blocks.push(SuggestionBlock {
                subject,
                items: Vec::new(),
            });
            continue;
        }
        if let Some(block) = blocks.last_mut() {
            let item = line.trim_start_matches(['-', '*']).trim().to_string();
            if !item.is_empty() {
                block.items.push(item);
            }
        }
    }
    blocks
}

fn add_suggestions(pdf: &mut ReportPdf, text: &str) {
    if text.trim().is_empty() {
        pdf.placeholder("[No suggestions provided]");
        return;
    }
    let blocks = parse_suggestion_blocks(text);
    if blocks.is_empty() {
        pdf.placeholder("[No suggestions provided]");
        return;
    }
    for block in blocks {
        pdf.multi_cell(
            &block.subject,
            6.0,
            10.0,
            FontStyle::Bold,
            TEXT_DARK,
            Align::Left,
        );
        pdf.vertical_gap(2.0);
        for item in block.items {
            pdf.multi_cell(
                &format!("* {item}"),
                6.0,
                10.0,
                FontStyle::Regular,
                TEXT_DARK,
                Align::Left,
            );
            pdf.vertical_gap(1.0);
        }
    }
}

/// "time_taken_histogram" -> "Time Taken Histogram".
fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

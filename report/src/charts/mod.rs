//! # Chart Set Builder
//!
//! Produces the fixed, ordered list of visualizations for a report. The plan
//! is data-independent except for one gate: the three section-based charts
//! are omitted when the section column is absent from the rows.
//!
//! Rendering failures are isolated per chart: a chart that fails to render is
//! logged and skipped, and the builder returns whatever charts succeeded.

pub mod render;

use tracing::warn;

use crate::types::{ChartArtifact, QuestionRow};

/// A row attribute charts can group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Section,
    Chapter,
    Level,
    Status,
    Correctness,
}

impl GroupField {
    pub fn label(&self) -> &'static str {
        match self {
            GroupField::Section => "Section",
            GroupField::Chapter => "Chapter",
            GroupField::Level => "Level",
            GroupField::Status => "Status",
            GroupField::Correctness => "Correct",
        }
    }

    /// The grouping value of a row for this field.
    pub fn value(&self, row: &QuestionRow) -> String {
        match self {
            GroupField::Section => row.section.clone().unwrap_or_default(),
            GroupField::Chapter => row.chapter.clone(),
            GroupField::Level => row.level.clone(),
            GroupField::Status => row.status.clone(),
            GroupField::Correctness => row.is_correct.to_string(),
        }
    }

    fn requires_section(&self) -> bool {
        matches!(self, GroupField::Section)
    }
}

/// The shape of one chart in the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartKind {
    /// Histogram of time taken per question.
    TimeHistogram,
    /// Horizontal bars counting questions per category.
    CategoryCounts(GroupField),
    /// Time taken against question index, optionally split per category.
    TimeTrend(Option<GroupField>),
    /// Question-count grid over two categorical fields.
    CountHeatmap {
        row_field: GroupField,
        col_field: GroupField,
    },
    /// Per-category time spread (box and whiskers).
    TimeDistribution(GroupField),
}

impl ChartKind {
    fn requires_section(&self) -> bool {
        match self {
            ChartKind::TimeHistogram => false,
            ChartKind::CategoryCounts(f) | ChartKind::TimeDistribution(f) => f.requires_section(),
            ChartKind::TimeTrend(group) => group.map(|f| f.requires_section()).unwrap_or(false),
            ChartKind::CountHeatmap {
                row_field,
                col_field,
            } => row_field.requires_section() || col_field.requires_section(),
        }
    }
}

/// One planned chart: identifier, display title, report caption, and shape.
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub name: &'static str,
    pub title: &'static str,
    pub caption: &'static str,
    pub kind: ChartKind,
}

/// The fixed chart plan, in report page order. Section-dependent entries are
/// removed when the section column is absent.
pub fn chart_plan(has_section: bool) -> Vec<ChartSpec> {
    full_plan()
        .into_iter()
        .filter(|spec| has_section || !spec.kind.requires_section())
        .collect()
}

fn full_plan() -> Vec<ChartSpec> {
    vec![
        ChartSpec {
            name: "time_taken_histogram",
            title: "Distribution of Time Taken per Question",
            caption: "This graph shows how long you spent on each question, with taller bars for longer times. It helps you spot which questions slowed you down so you can practice going faster.",
            kind: ChartKind::TimeHistogram,
        },
        ChartSpec {
            name: "section_count",
            title: "Questions per Section",
            caption: "This chart counts how many questions were in each test section. It shows which sections had more questions, helping you focus your study.",
            kind: ChartKind::CategoryCounts(GroupField::Section),
        },
        ChartSpec {
            name: "chapter_count",
            title: "Questions per Chapter",
            caption: "This graph shows how many questions came from each chapter. It helps you know which chapters need more study if they had lots of questions.",
            kind: ChartKind::CategoryCounts(GroupField::Chapter),
        },
        ChartSpec {
            name: "level_count",
            title: "Questions per Difficulty Level",
            caption: "This chart counts easy, medium, and hard questions. It shows which difficulty levels you faced most, so you can practice the tough ones.",
            kind: ChartKind::CategoryCounts(GroupField::Level),
        },
        ChartSpec {
            name: "status_count",
            title: "Questions per Answer Status",
            caption: "This graph shows how many questions you got right, wrong, or skipped. Lots of skipped questions mean you might need to manage time better.",
            kind: ChartKind::CategoryCounts(GroupField::Status),
        },
        ChartSpec {
            name: "time_taken_index",
            title: "Time Taken per Question Over Time",
            caption: "This line shows how long each question took as you went through the test. If the line goes up, later questions took longer, suggesting tiredness or difficulty.",
            kind: ChartKind::TimeTrend(None),
        },
        ChartSpec {
            name: "time_taken_chapter",
            title: "Time Taken by Chapter",
            caption: "This graph shows time spent on questions from each chapter. High lines mean those chapters took longer, so practice them to get faster.",
            kind: ChartKind::TimeTrend(Some(GroupField::Chapter)),
        },
        ChartSpec {
            name: "time_taken_level",
            title: "Time Taken by Difficulty Level",
            caption: "This graph shows time spent on easy, medium, and hard questions. If hard questions have high lines, practice them to speed up.",
            kind: ChartKind::TimeTrend(Some(GroupField::Level)),
        },
        ChartSpec {
            name: "time_taken_section",
            title: "Time Taken by Section",
            caption: "This graph shows time spent on each test section. High lines mean you were slower in those sections, so practice to improve pacing.",
            kind: ChartKind::TimeTrend(Some(GroupField::Section)),
        },
        ChartSpec {
            name: "section_vs_chapter_heatmap",
            title: "Section vs Chapter (Question Count)",
            caption: "This grid shows how many questions each section had from each chapter. Darker boxes mean more questions, guiding your study focus.",
            kind: ChartKind::CountHeatmap {
                row_field: GroupField::Section,
                col_field: GroupField::Chapter,
            },
        },
        ChartSpec {
            name: "chapter_vs_level_heatmap",
            title: "Chapter vs Level (Question Count)",
            caption: "This grid shows how many easy, medium, or hard questions each chapter had. Darker boxes highlight chapters with tough questions to practice.",
            kind: ChartKind::CountHeatmap {
                row_field: GroupField::Chapter,
                col_field: GroupField::Level,
            },
        },
        ChartSpec {
            name: "level_vs_status_heatmap",
            title: "Level vs Status (Question Count)",
            caption: "This grid shows if easy, medium, or hard questions were right, wrong, or skipped. Darker boxes for wrong answers show where to improve.",
            kind: ChartKind::CountHeatmap {
                row_field: GroupField::Level,
                col_field: GroupField::Status,
            },
        },
        ChartSpec {
            name: "status_vs_correctness_heatmap",
            title: "Status vs Correctness (Question Count)",
            caption: "This grid shows if answered questions were correct or incorrect. Darker boxes for incorrect answers highlight areas to review.",
            kind: ChartKind::CountHeatmap {
                row_field: GroupField::Status,
                col_field: GroupField::Correctness,
            },
        },
        ChartSpec {
            name: "section_time_distribution",
            title: "Time Taken Distribution by Section",
            caption: "This chart shows time spent on questions in each section, with wider spreads for varied times. It helps you see where your pacing was uneven.",
            kind: ChartKind::TimeDistribution(GroupField::Section),
        },
        ChartSpec {
            name: "chapter_time_distribution",
            title: "Time Taken Distribution by Chapter",
            caption: "This chart shows time spent on questions from each chapter, with wider spreads for varied times. It highlights chapters where you were slower.",
            kind: ChartKind::TimeDistribution(GroupField::Chapter),
        },
        ChartSpec {
            name: "level_time_distribution",
            title: "Time Taken Distribution by Level",
            caption: "This chart shows time spent on easy, medium, and hard questions, with wider spreads for varied times. It shows which difficulty levels slowed you down.",
            kind: ChartKind::TimeDistribution(GroupField::Level),
        },
        ChartSpec {
            name: "status_time_distribution",
            title: "Time Taken Distribution by Status",
            caption: "This chart shows time spent on correct, incorrect, or skipped questions, with wider spreads for varied times. It highlights if wrong answers took too long.",
            kind: ChartKind::TimeDistribution(GroupField::Status),
        },
    ]
}

/// Renders the chart plan for the given rows, skipping individual failures.
pub fn build_charts(rows: &[QuestionRow]) -> Vec<ChartArtifact> {
    if rows.is_empty() {
        warn!("no question rows; skipping chart generation");
        return Vec::new();
    }
    let has_section = rows.iter().all(|r| r.section.is_some());
    chart_plan(has_section)
        .iter()
        .filter_map(|spec| match render::render_chart(spec, rows) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!("chart '{}' failed to render: {e}", spec.name);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Subject;

    fn row(section: Option<&str>) -> QuestionRow {
        QuestionRow {
            subject: Subject::Physics,
            chapter: "Optics".to_string(),
            level: "easy".to_string(),
            is_correct: true,
            time_taken: 30,
            status: "answered".to_string(),
            section: section.map(String::from),
        }
    }

    #[test]
    fn full_plan_has_seventeen_charts_in_fixed_order() {
        let plan = chart_plan(true);
        assert_eq!(plan.len(), 17);
        assert_eq!(plan[0].name, "time_taken_histogram");
        assert_eq!(plan[1].name, "section_count");
        assert_eq!(plan[16].name, "status_time_distribution");
    }

    #[test]
    fn section_dependent_charts_are_omitted_without_section() {
        let plan = chart_plan(false);
        assert_eq!(plan.len(), 14);
        assert!(plan.iter().all(|s| !s.name.contains("section")));
        // The remaining order is preserved.
        assert_eq!(plan[0].name, "time_taken_histogram");
        assert_eq!(plan[1].name, "chapter_count");
    }

    #[test]
    fn empty_rows_produce_no_charts() {
        assert!(build_charts(&[]).is_empty());
    }

    // Rendering depends on a system font for titles and labels.
    #[test]
    #[ignore]
    fn render_smoke_all_charts_succeed() {
        let rows: Vec<QuestionRow> = (0..12)
            .map(|i| {
                let mut r = row(Some(if i % 2 == 0 { "Section A" } else { "Section B" }));
                r.time_taken = 10 + i * 7;
                r.is_correct = i % 3 == 0;
                r
            })
            .collect();
        let charts = build_charts(&rows);
        assert_eq!(charts.len(), 17);
        for chart in &charts {
            assert_eq!(chart.rgb.len(), (chart.width * chart.height * 3) as usize);
            assert!(chart.to_png().unwrap().starts_with(&[0x89, b'P', b'N', b'G']));
        }
    }

    // Rendering depends on a system font for titles and labels.
    #[test]
    #[ignore]
    fn render_smoke_without_section_column() {
        let rows: Vec<QuestionRow> = (0..8)
            .map(|i| {
                let mut r = row(None);
                r.time_taken = 5 + i * 11;
                r
            })
            .collect();
        let charts = build_charts(&rows);
        assert_eq!(charts.len(), 14);
    }
}

//! # Statistics Aggregator
//!
//! Computes scalar and grouped performance metrics from the normalized
//! question rows. Every aggregate is total over its input: an empty row set
//! yields zeroed sentinels (`None` for "no such group"), never a panic or a
//! division by zero.
//!
//! Grouped extrema (weakest/strongest chapter, toughest level) iterate
//! groups in sorted key order and keep the first extreme, so ties resolve
//! deterministically to the alphabetically-first group.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{QuestionRow, Subject, TestInfo};

/// Whole-attempt metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStats {
    pub total_questions: usize,
    pub correct: usize,
    /// Percentage in [0, 100]; 0 when there are no rows.
    pub accuracy: f64,
    /// Mean seconds per question; 0 when there are no rows.
    pub avg_time: f64,
    /// Total seconds spent across all questions.
    pub total_time: f64,
    /// Total time as a percentage of the test duration; 0 when the duration
    /// is not positive.
    pub time_used_pct: f64,
    /// `correct * (total_marks / total_questions)` using the test's declared
    /// totals; 0 when the declared question count is 0.
    pub marks_scored: f64,
    pub total_marks: f64,
    pub duration: f64,
}

/// Metrics for one group of rows (a chapter, level, section or status).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub key: String,
    pub questions: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub avg_time: f64,
}

/// Metrics for one (subject, chapter) pair, used to target suggestions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectChapterStats {
    pub subject: Subject,
    pub chapter: String,
    pub questions: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub avg_time: f64,
}

/// The slow-question subset: rows above the 75th percentile of time taken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowQuestionStats {
    /// The percentile threshold in seconds (0 when there are no rows).
    pub threshold: f64,
    pub questions: usize,
    /// Accuracy within the subset; 0 when the subset is empty.
    pub accuracy: f64,
}

/// Everything the feedback generator and report assembler need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamStatistics {
    pub overall: OverallStats,
    /// Per-chapter groups in sorted chapter order.
    pub chapters: Vec<GroupStats>,
    /// Per-difficulty-level groups in sorted level order.
    pub levels: Vec<GroupStats>,
    /// Per-(subject, chapter) groups in sorted order.
    pub subject_chapters: Vec<SubjectChapterStats>,
    pub weakest_chapter: Option<SubjectChapterStats>,
    pub strongest_chapter: Option<SubjectChapterStats>,
    pub toughest_level: Option<GroupStats>,
    pub slow: SlowQuestionStats,
}

/// Aggregates all statistics for one attempt.
pub fn aggregate(rows: &[QuestionRow], test: &TestInfo) -> ExamStatistics {
    let overall = overall_stats(rows, test);
    let chapters = group_stats(rows, |r| r.chapter.clone());
    let levels = group_stats(rows, |r| r.level.clone());
    let subject_chapters = subject_chapter_stats(rows);

    let weakest_chapter = subject_chapters
        .iter()
        .fold(None::<&SubjectChapterStats>, |best, g| match best {
            Some(b) if b.accuracy <= g.accuracy => Some(b),
            _ => Some(g),
        })
        .cloned();
    let strongest_chapter = subject_chapters
        .iter()
        .fold(None::<&SubjectChapterStats>, |best, g| match best {
            Some(b) if b.accuracy >= g.accuracy => Some(b),
            _ => Some(g),
        })
        .cloned();
    let toughest_level = levels
        .iter()
        .fold(None::<&GroupStats>, |best, g| match best {
            Some(b) if b.accuracy <= g.accuracy => Some(b),
            _ => Some(g),
        })
        .cloned();

    ExamStatistics {
        overall,
        chapters,
        levels,
        subject_chapters,
        weakest_chapter,
        strongest_chapter,
        toughest_level,
        slow: slow_question_stats(rows),
    }
}

fn overall_stats(rows: &[QuestionRow], test: &TestInfo) -> OverallStats {
    let total = rows.len();
    let correct = rows.iter().filter(|r| r.is_correct).count();
    let total_time: f64 = rows.iter().map(|r| r.time_taken as f64).sum();
    let avg_time = if total == 0 {
        0.0
    } else {
        total_time / total as f64
    };
    let time_used_pct = if test.duration > 0.0 {
        total_time / test.duration * 100.0
    } else {
        0.0
    };
    let marks_scored = if test.total_questions == 0 {
        0.0
    } else {
        correct as f64 * (test.total_marks / test.total_questions as f64)
    };

    OverallStats {
        total_questions: total,
        correct,
        accuracy: percentage(correct, total),
        avg_time,
        total_time,
        time_used_pct,
        marks_scored,
        total_marks: test.total_marks,
        duration: test.duration,
    }
}

fn group_stats<F>(rows: &[QuestionRow], key_fn: F) -> Vec<GroupStats>
where
    F: Fn(&QuestionRow) -> String,
{
    let mut groups: BTreeMap<String, (usize, usize, u64)> = BTreeMap::new();
    for row in rows {
        let entry = groups.entry(key_fn(row)).or_default();
        entry.0 += 1;
        if row.is_correct {
            entry.1 += 1;
        }
        entry.2 += row.time_taken as u64;
    }
    groups
        .into_iter()
        .map(|(key, (questions, correct, time))| GroupStats {
            key,
            questions,
            correct,
            accuracy: percentage(correct, questions),
            avg_time: time as f64 / questions as f64,
        })
        .collect()
}

fn subject_chapter_stats(rows: &[QuestionRow]) -> Vec<SubjectChapterStats> {
    let mut groups: BTreeMap<(Subject, String), (usize, usize, u64)> = BTreeMap::new();
    for row in rows {
        let entry = groups
            .entry((row.subject, row.chapter.clone()))
            .or_default();
        entry.0 += 1;
        if row.is_correct {
            entry.1 += 1;
        }
        entry.2 += row.time_taken as u64;
    }
    groups
        .into_iter()
        .map(
            |((subject, chapter), (questions, correct, time))| SubjectChapterStats {
                subject,
                chapter,
                questions,
                correct,
                accuracy: percentage(correct, questions),
                avg_time: time as f64 / questions as f64,
            },
        )
        .collect()
}

fn slow_question_stats(rows: &[QuestionRow]) -> SlowQuestionStats {
    let times: Vec<u32> = rows.iter().map(|r| r.time_taken).collect();
    let Some(threshold) = percentile_linear(&times, 0.75) else {
        return SlowQuestionStats {
            threshold: 0.0,
            questions: 0,
            accuracy: 0.0,
        };
    };
    let slow: Vec<&QuestionRow> = rows
        .iter()
        .filter(|r| (r.time_taken as f64) > threshold)
        .collect();
    let correct = slow.iter().filter(|r| r.is_correct).count();
    SlowQuestionStats {
        threshold,
        questions: slow.len(),
        accuracy: percentage(correct, slow.len()),
    }
}

/// Linear-interpolated percentile (the pandas/numpy default): for quantile
/// `q` over `n` sorted values, the value at fractional rank `(n - 1) * q`.
pub fn percentile_linear(values: &[u32], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    sorted.sort_by(f64::total_cmp);
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        Some(sorted[lo])
    } else {
        Some(sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo]))
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        subject: Subject,
        chapter: &str,
        level: &str,
        correct: bool,
        time: u32,
    ) -> QuestionRow {
        QuestionRow {
            subject,
            chapter: chapter.to_string(),
            level: level.to_string(),
            is_correct: correct,
            time_taken: time,
            status: if correct { "answered" } else { "wrong" }.to_string(),
            section: Some("Section A".to_string()),
        }
    }

    fn test_info(total_questions: u32, total_marks: f64, duration: f64) -> TestInfo {
        TestInfo {
            name: "Test".to_string(),
            date: "11 May 2025".to_string(),
            total_questions,
            total_marks,
            duration,
        }
    }

    #[test]
    fn accuracy_is_bounded_and_zero_when_empty() {
        let stats = aggregate(&[], &test_info(75, 300.0, 3600.0));
        assert_eq!(stats.overall.accuracy, 0.0);
        assert_eq!(stats.overall.avg_time, 0.0);
        assert_eq!(stats.overall.marks_scored, 0.0);
        assert!(stats.weakest_chapter.is_none());
        assert!(stats.strongest_chapter.is_none());
        assert!(stats.toughest_level.is_none());
        assert_eq!(stats.slow.questions, 0);

        let rows = vec![
            row(Subject::Physics, "Optics", "easy", true, 10),
            row(Subject::Physics, "Optics", "easy", true, 20),
        ];
        let stats = aggregate(&rows, &test_info(2, 8.0, 600.0));
        assert!(stats.overall.accuracy >= 0.0 && stats.overall.accuracy <= 100.0);
        assert_eq!(stats.overall.accuracy, 100.0);
    }

    #[test]
    fn marks_scored_formula() {
        let rows = vec![
            row(Subject::Physics, "Optics", "easy", true, 10),
            row(Subject::Physics, "Optics", "easy", true, 10),
            row(Subject::Physics, "Waves", "easy", false, 10),
        ];
        let stats = aggregate(&rows, &test_info(75, 300.0, 3600.0));
        // 2 correct * (300 / 75) = 8.0
        assert_eq!(stats.overall.marks_scored, 8.0);

        let none_correct: Vec<QuestionRow> = rows
            .iter()
            .cloned()
            .map(|mut r| {
                r.is_correct = false;
                r
            })
            .collect();
        let stats = aggregate(&none_correct, &test_info(75, 300.0, 3600.0));
        assert_eq!(stats.overall.marks_scored, 0.0);
    }

    #[test]
    fn weakest_and_strongest_chapter_by_accuracy() {
        let mut rows = Vec::new();
        // A: 2/5 = 40%
        for i in 0..5 {
            rows.push(row(Subject::Physics, "A", "easy", i < 2, 10));
        }
        // B: 9/10 = 90%
        for i in 0..10 {
            rows.push(row(Subject::Physics, "B", "easy", i < 9, 10));
        }
        // C: 3/5 = 60%
        for i in 0..5 {
            rows.push(row(Subject::Physics, "C", "easy", i < 3, 10));
        }
        let stats = aggregate(&rows, &test_info(20, 80.0, 3600.0));
        assert_eq!(stats.weakest_chapter.as_ref().unwrap().chapter, "A");
        assert_eq!(stats.weakest_chapter.as_ref().unwrap().accuracy, 40.0);
        assert_eq!(stats.strongest_chapter.as_ref().unwrap().chapter, "B");
        assert_eq!(stats.strongest_chapter.as_ref().unwrap().accuracy, 90.0);
    }

    #[test]
    fn ties_resolve_to_first_group_in_sorted_order() {
        let rows = vec![
            row(Subject::Physics, "Beta", "easy", false, 10),
            row(Subject::Physics, "Alpha", "easy", false, 10),
        ];
        let stats = aggregate(&rows, &test_info(2, 8.0, 600.0));
        assert_eq!(stats.weakest_chapter.unwrap().chapter, "Alpha");
    }

    #[test]
    fn percentile_matches_linear_interpolation() {
        assert_eq!(percentile_linear(&[10, 20, 30, 40, 100], 0.75), Some(40.0));
        assert_eq!(percentile_linear(&[1, 2, 3, 4], 0.75), Some(3.25));
        assert_eq!(percentile_linear(&[7], 0.75), Some(7.0));
        assert_eq!(percentile_linear(&[], 0.75), None);
    }

    #[test]
    fn slow_subset_partitions_above_threshold() {
        let rows = vec![
            row(Subject::Physics, "A", "easy", true, 10),
            row(Subject::Physics, "A", "easy", true, 20),
            row(Subject::Physics, "A", "easy", false, 30),
            row(Subject::Physics, "A", "easy", true, 40),
            row(Subject::Physics, "A", "easy", false, 100),
        ];
        let stats = aggregate(&rows, &test_info(5, 20.0, 600.0));
        assert_eq!(stats.slow.threshold, 40.0);
        // Only the 100s question is strictly above the threshold.
        assert_eq!(stats.slow.questions, 1);
        assert_eq!(stats.slow.accuracy, 0.0);
    }

    #[test]
    fn per_level_accuracy_and_toughest_level() {
        let rows = vec![
            row(Subject::Physics, "A", "easy", true, 10),
            row(Subject::Physics, "A", "easy", true, 10),
            row(Subject::Physics, "A", "hard", false, 60),
            row(Subject::Physics, "A", "hard", true, 50),
        ];
        let stats = aggregate(&rows, &test_info(4, 16.0, 600.0));
        let easy = stats.levels.iter().find(|l| l.key == "easy").unwrap();
        let hard = stats.levels.iter().find(|l| l.key == "hard").unwrap();
        assert_eq!(easy.accuracy, 100.0);
        assert_eq!(hard.accuracy, 50.0);
        assert_eq!(stats.toughest_level.unwrap().key, "hard");
    }

    #[test]
    fn time_used_percentage_guards_zero_duration() {
        let rows = vec![row(Subject::Physics, "A", "easy", true, 60)];
        let stats = aggregate(&rows, &test_info(1, 4.0, 0.0));
        assert_eq!(stats.overall.time_used_pct, 0.0);

        let stats = aggregate(&rows, &test_info(1, 4.0, 600.0));
        assert_eq!(stats.overall.time_used_pct, 10.0);
    }
}

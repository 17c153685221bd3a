//! # Record Normalizer
//!
//! Converts one raw exam-submission record into the flat tabular form the
//! rest of the pipeline works on: one [`QuestionRow`] per question in
//! encounter order, a [`SubjectSummary`] per subject entry, and a
//! [`TestInfo`].
//!
//! Every optional field access is total: a missing field resolves to the
//! default documented on the helper that reads it, never to an error. Only a
//! top-level shape problem (not an object, or an empty array) is reported,
//! and as a recoverable [`ReportError::InvalidRecord`].

use serde_json::Value;

use crate::error::ReportError;
use crate::types::{NormalizedRecord, QuestionRow, Subject, SubjectSummary, TestInfo};

/// The source data carries no attempt date, so reports carry this constant.
pub const TEST_DATE: &str = "11 May 2025";

/// Normalizes a raw exam record.
///
/// Accepts either a single record object or an array of records, in which
/// case only the first element is used.
///
/// # Errors
///
/// [`ReportError::InvalidRecord`] when the top-level value is neither an
/// object nor a non-empty array of objects.
pub fn parse_exam_record(raw: &Value) -> Result<NormalizedRecord, ReportError> {
    let data = match raw {
        Value::Array(items) => items
            .first()
            .ok_or_else(|| ReportError::InvalidRecord("record array is empty".to_string()))?,
        Value::Object(_) => raw,
        other => {
            return Err(ReportError::InvalidRecord(format!(
                "expected an object or an array of objects, found {}",
                value_kind(other)
            )));
        }
    };
    if !data.is_object() {
        return Err(ReportError::InvalidRecord(format!(
            "record element is {}, expected an object",
            value_kind(data)
        )));
    }

    let test_obj = data.get("test");
    let test = TestInfo {
        // Default test title used by the upstream exam platform.
        name: str_or(field(test_obj, "title"), "QPT 1"),
        date: TEST_DATE.to_string(),
        total_questions: u32_or(field(test_obj, "totalQuestions"), 75),
        total_marks: f64_or(field(test_obj, "totalMarks"), 300.0),
        duration: f64_or(field(test_obj, "duration"), 3600.0),
    };
    let syllabus_html = str_or(field(test_obj, "syllabus"), "");

    let mut subjects = Vec::new();
    if let Some(list) = data.get("subjects").and_then(Value::as_array) {
        for subj in list {
            subjects.push(SubjectSummary {
                subject: Subject::from_id(&subject_id_string(subj.get("subjectId"))),
                total_correct: u32_or(subj.get("totalCorrect"), 0),
                total_attempted: u32_or(subj.get("totalAttempted"), 0),
                accuracy: f64_or(subj.get("accuracy"), 0.0),
                total_time_taken: f64_or(subj.get("totalTimeTaken"), 0.0),
            });
        }
    }

    let mut rows = Vec::new();
    if let Some(section_list) = data.get("sections").and_then(Value::as_array) {
        for section in section_list {
            let section_title = section
                .get("title")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            let questions = section.get("questions").and_then(Value::as_array);
            for q in questions.into_iter().flatten() {
                rows.push(parse_question(q, section_title.clone()));
            }
        }
    }

    Ok(NormalizedRecord {
        test,
        subjects,
        rows,
        syllabus_html,
    })
}

/// Flattens one question into a [`QuestionRow`].
///
/// Correctness is resolved in order: the first marked option's flag when any
/// option was marked, else the numeric-input flag when a value is present,
/// else false.
fn parse_question(q: &Value, section: Option<String>) -> QuestionRow {
    let question_id = q.get("questionId");

    // First chapter title on the question; "Unknown" when absent or blank.
    let chapter = field(question_id, "chapters")
        .and_then(Value::as_array)
        .and_then(|chapters| chapters.first())
        .and_then(|c| c.get("title"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown")
        .to_string();

    let level = field(question_id, "level")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown")
        .to_string();

    let marked_options = q
        .get("markedOptions")
        .and_then(Value::as_array)
        .filter(|opts| !opts.is_empty());
    let is_correct = if let Some(options) = marked_options {
        bool_or(options.first().and_then(|o| o.get("isCorrect")), false)
    } else if field(q.get("inputValue"), "value").is_some_and(|v| !v.is_null()) {
        bool_or(field(q.get("inputValue"), "isCorrect"), false)
    } else {
        false
    };

    // Time is coerced to a non-negative whole number of seconds.
    let time_taken = q
        .get("timeTaken")
        .and_then(Value::as_f64)
        .map(|t| if t.is_finite() && t > 0.0 { t as u32 } else { 0 })
        .unwrap_or(0);

    let status = q
        .get("status")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();

    QuestionRow {
        subject: Subject::from_id(&subject_id_string(q.get("subjectId"))),
        chapter,
        level,
        is_correct,
        time_taken,
        status,
        section,
    }
}

/// Extracts an opaque subject identifier from either of its two encodings:
/// an object carrying `$oid`, or a bare string (lowercased). Anything else
/// becomes "Unknown", which the lookup table resolves to [`Subject::Unknown`].
fn subject_id_string(v: Option<&Value>) -> String {
    match v {
        Some(Value::Object(map)) => map
            .get("$oid")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string(),
        Some(Value::String(s)) if !s.is_empty() => s.to_lowercase(),
        _ => "Unknown".to_string(),
    }
}

fn field<'a>(obj: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    obj.and_then(|o| o.get(key))
}

fn str_or(v: Option<&Value>, default: &str) -> String {
    v.and_then(Value::as_str).unwrap_or(default).to_string()
}

fn u32_or(v: Option<&Value>, default: u32) -> u32 {
    v.and_then(Value::as_u64)
        .map(|n| n.min(u32::MAX as u64) as u32)
        .unwrap_or(default)
}

fn f64_or(v: Option<&Value>, default: f64) -> f64 {
    v.and_then(Value::as_f64).unwrap_or(default)
}

fn bool_or(v: Option<&Value>, default: bool) -> bool {
    v.and_then(Value::as_bool).unwrap_or(default)
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

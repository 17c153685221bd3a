//! Parsers for the three external text shapes the pipeline consumes:
//!
//! - [`record_parser`]: the raw exam-submission JSON document.
//! - [`syllabus_parser`]: the HTML syllabus markup embedded in the record.
//! - [`feedback_parser`]: the markdown document returned by the narrative
//!   service (or built by the fallback).

pub mod feedback_parser;
pub mod record_parser;
pub mod syllabus_parser;

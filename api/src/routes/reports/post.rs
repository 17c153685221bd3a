use axum::Json;
use axum::extract::Query;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use report::ReportJob;
use report::error::ReportError;
use report::parsers::record_parser::parse_exam_record;
use report::stats::{ExamStatistics, aggregate};
use report::types::{SubjectSummary, TestInfo};

use crate::response::ApiResponse;

#[derive(Deserialize)]
pub struct ReportParams {
    pub student_name: Option<String>,
}

/// Runs the full pipeline on the posted record and returns the PDF bytes.
///
/// Each request builds its own isolated job; nothing is shared between
/// concurrent report generations.
pub async fn generate_report(
    Query(params): Query<ReportParams>,
    Json(body): Json<Value>,
) -> Response {
    let student_name = params
        .student_name
        .unwrap_or_else(|| "Student".to_string());

    let job = ReportJob::new(body).with_student_name(&student_name);
    match job.generate().await {
        Ok(generated) => {
            info!(
                filename = %generated.filename,
                bytes = generated.pdf.len(),
                charts = generated.charts.len(),
                "report generated"
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", generated.filename),
                    ),
                ],
                generated.pdf,
            )
                .into_response()
        }
        Err(e @ (ReportError::InvalidRecord(_) | ReportError::InvalidJson(_))) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::<Value>::error(e.to_string())),
        )
            .into_response(),
        Err(e) => {
            error!("report generation failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Value>::error(e.to_string())),
            )
                .into_response()
        }
    }
}

/// The overview payload served to the dashboard front-end.
#[derive(Serialize)]
pub struct SummaryPayload {
    pub test: TestInfo,
    pub statistics: ExamStatistics,
    pub subjects: Vec<SubjectSummary>,
}

/// Normalizes and aggregates the posted record without rendering anything.
pub async fn report_summary(Json(body): Json<Value>) -> Response {
    match parse_exam_record(&body) {
        Ok(record) => {
            let statistics = aggregate(&record.rows, &record.test);
            Json(ApiResponse::success(
                SummaryPayload {
                    test: record.test,
                    statistics,
                    subjects: record.subjects,
                },
                "Summary computed",
            ))
            .into_response()
        }
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::<Value>::error(e.to_string())),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new().nest("/api", crate::routes::routes())
    }

    fn sample_record() -> Value {
        json!({
            "test": {"title": "QPT 1", "totalQuestions": 2, "totalMarks": 8, "duration": 600},
            "subjects": [],
            "sections": [
                {
                    "title": "Section A",
                    "questions": [
                        {
                            "questionId": {"chapters": [{"title": "Optics"}], "level": "easy"},
                            "subjectId": {"$oid": "607018ee404ae53194e73d92"},
                            "markedOptions": [{"isCorrect": true}],
                            "timeTaken": 30,
                            "status": "answered"
                        },
                        {
                            "questionId": {"chapters": [{"title": "Optics"}], "level": "hard"},
                            "subjectId": {"$oid": "607018ee404ae53194e73d92"},
                            "timeTaken": 70,
                            "status": "notattempted"
                        }
                    ]
                }
            ]
        })
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn summary_returns_aggregated_metrics() {
        let response = app()
            .oneshot(json_request("/api/reports/summary", sample_record()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["statistics"]["overall"]["total_questions"], 2);
        assert_eq!(value["data"]["statistics"]["overall"]["correct"], 1);
    }

    #[tokio::test]
    async fn summary_rejects_malformed_records() {
        let response = app()
            .oneshot(json_request("/api/reports/summary", json!("not a record")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["success"], false);
    }

    #[tokio::test]
    async fn report_endpoint_rejects_malformed_records() {
        let response = app()
            .oneshot(json_request("/api/reports", json!([])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn report_endpoint_returns_a_pdf() {
        let response = app()
            .oneshot(json_request(
                "/api/reports?student_name=Asha",
                sample_record(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "application/pdf"
        );
        assert!(
            response.headers()["content-disposition"]
                .to_str()
                .unwrap()
                .contains("Asha_Performance_Report.pdf")
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.starts_with(b"%PDF"));
    }
}

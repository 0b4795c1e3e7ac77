//! HTTP client tests against a mock governance API

mod common;

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use governai::api::{
    ApiClient, ApiFailure, ContractUpload, CopilotApi, DownloadFormat, GenerateReportRequest,
    QueryFilters, QueryRequest, UploadFilters,
};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&common::api_config(&server.uri())).expect("client")
}

#[tokio::test]
async fn test_query_posts_question_with_filter_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/copilot/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"answer": "2 contracts are high risk."},
            "sources": ["contracts"],
            "data": {"contracts": [{"id": 1, "title": "MSA"}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut filters = QueryFilters::default();
    filters.contracts.status = Some("active".to_string());
    filters.compliance.framework_id = Some(3);

    let envelope = client_for(&server)
        .query(&QueryRequest::new("Which contracts are high risk?", filters))
        .await
        .expect("query succeeds");

    assert_eq!(envelope.answer(), Some("2 contracts are high risk."));
    assert_eq!(envelope.sources(), vec!["contracts".to_string()]);
    assert!(envelope.data().is_some());

    let requests = server.received_requests().await.expect("recording enabled");
    let body: Value = serde_json::from_slice(&requests[0].body).expect("json body");
    assert_eq!(body["query"], "Which contracts are high risk?");
    assert_eq!(body["context"]["filters"]["contracts"]["status"], "active");
    assert_eq!(body["context"]["filters"]["compliance"]["framework_id"], 3);
}

#[tokio::test]
async fn test_query_classifies_server_fault() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/copilot/query"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"detail": "db down"})))
        .mount(&server)
        .await;

    let failure = client_for(&server)
        .query(&QueryRequest::new("hi", QueryFilters::default()))
        .await
        .unwrap_err();

    assert!(matches!(failure, ApiFailure::Server { status: 503, .. }));
    assert!(failure.query_message().starts_with("**Server Error**"));
}

#[tokio::test]
async fn test_query_classifies_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/copilot/query"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"detail": "Query too long"})),
        )
        .mount(&server)
        .await;

    let failure = client_for(&server)
        .query(&QueryRequest::new("hi", QueryFilters::default()))
        .await
        .unwrap_err();

    assert_eq!(
        failure,
        ApiFailure::Detail {
            status: 422,
            detail: "Query too long".to_string()
        }
    );
}

#[tokio::test]
async fn test_unreachable_server_is_network_failure() {
    let client = ApiClient::new(&common::api_config("http://127.0.0.1:1")).unwrap();
    let failure = client
        .query(&QueryRequest::new("hi", QueryFilters::default()))
        .await
        .unwrap_err();

    assert!(matches!(failure, ApiFailure::Network(_)));
    assert!(failure.query_message().starts_with("**Connection Error**"));
}

#[tokio::test]
async fn test_upload_sends_multipart_and_reports_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/contracts/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::contract_json()))
        .expect(1)
        .mount(&server)
        .await;

    let upload = ContractUpload {
        file_name: "csa.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        bytes: vec![b'x'; 200 * 1024],
        filters: UploadFilters {
            status: Some("active".to_string()),
            tags: vec!["cloud".to_string()],
            ..Default::default()
        },
    };

    let seen = Arc::new(Mutex::new(Vec::new()));
    let progress = {
        let seen = seen.clone();
        Arc::new(move |pct: u8| seen.lock().unwrap().push(pct))
    };

    let record = client_for(&server)
        .upload_contract(&upload, progress)
        .await
        .expect("upload succeeds");

    assert_eq!(record.id, 42);
    assert_eq!(record.contract_type, "vendor");

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.first(), Some(&0));
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"file\"; filename=\"csa.pdf\""));
    assert!(body.contains("name=\"status\""));
    assert!(body.contains("[\"cloud\"]"));
}

#[tokio::test]
async fn test_upload_failure_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/contracts/upload"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Unsupported file type"})),
        )
        .mount(&server)
        .await;

    let upload = ContractUpload {
        file_name: "x.exe".to_string(),
        mime_type: "application/octet-stream".to_string(),
        bytes: b"MZ".to_vec(),
        filters: UploadFilters::default(),
    };
    let failure = client_for(&server)
        .upload_contract(&upload, Arc::new(|_: u8| {}))
        .await
        .unwrap_err();

    assert_eq!(
        failure.upload_message(),
        "**Upload Failed**\n\nUnsupported file type"
    );
}

#[tokio::test]
async fn test_list_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/contracts/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([common::contract_json()])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/compliance/dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_records": 10, "compliant": 7, "non_compliant": 2, "at_risk": 1,
            "compliance_rate": 70.0, "active_alerts": 3
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/reports/templates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Quarterly risk", "report_type": "risk"}
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let contracts = client.list_contracts().await.unwrap();
    assert_eq!(contracts[0].title, "Cloud Services Agreement");

    let dashboard = client.compliance_dashboard().await.unwrap();
    assert_eq!(dashboard.compliant, 7);

    let templates = client.report_templates().await.unwrap();
    assert_eq!(templates[0].name, "Quarterly risk");
}

#[tokio::test]
async fn test_generate_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/reports/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 9, "title": "Q3 Risk", "type": "risk", "status": "completed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = client_for(&server)
        .generate_report(&GenerateReportRequest {
            title: "Q3 Risk".to_string(),
            report_type: "risk".to_string(),
            template_id: None,
        })
        .await
        .unwrap();
    assert_eq!(report.id, 9);
    assert_eq!(report.report_type.as_deref(), Some("risk"));

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("template_id").is_none());
}

#[tokio::test]
async fn test_download_report_names_files() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/reports/5/download"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "Q3: Summary"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/reports/5/download"))
        .and(query_param("format", "pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7".to_vec()))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let json = client.download_report(5, DownloadFormat::Json).await.unwrap();
    assert_eq!(json.file_name, "Q3_ Summary.json");
    let parsed: Value = serde_json::from_slice(&json.bytes).unwrap();
    assert_eq!(parsed["title"], "Q3: Summary");

    let pdf = client.download_report(5, DownloadFormat::Pdf).await.unwrap();
    assert_eq!(pdf.file_name, "report_5.pdf");
    assert_eq!(pdf.bytes, b"%PDF-1.7");
}

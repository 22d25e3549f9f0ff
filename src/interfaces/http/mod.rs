use crate::application::{BatchReport, PredictionPipeline};
use crate::domain::credential::Credential;
use crate::domain::error::{AppError, Result};
use crate::domain::row::RawRow;
use crate::domain::sample::sample_row;
use crate::domain::schema::FieldSpec;
use crate::infrastructure::security::SessionStore;
use crate::interfaces::submission::SubmissionGate;
use actix_cors::Cors;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{delete, dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Uploads larger than this are rejected by actix before reaching the parser
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Set on batch downloads when the whole batch call failed
pub const DISPATCH_ERROR_HEADER: &str = "X-Dispatch-Error";

pub struct HttpState {
    pub pipeline: PredictionPipeline,
    pub gate: SubmissionGate,
    /// Absent when the token is fixed by the environment
    pub sessions: Option<Arc<dyn SessionStore>>,
}

impl HttpState {
    pub fn new(pipeline: PredictionPipeline) -> Self {
        Self {
            pipeline,
            gate: SubmissionGate::new(),
            sessions: None,
        }
    }

    pub fn with_sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }
}

#[derive(Deserialize)]
pub struct SessionRequest {
    pub token: String,
}

#[derive(Serialize)]
struct SchemaResponse<'a> {
    groups: Vec<&'a str>,
    fields: &'a [FieldSpec],
}

#[derive(Deserialize)]
pub struct BatchQuery {
    #[serde(default)]
    pub format: Option<String>,
}

fn error_response(err: &AppError) -> HttpResponse {
    let body = json!({ "message": err.to_string() });
    match err {
        AppError::Unauthorized(_) => HttpResponse::Unauthorized().json(body),
        AppError::Busy => HttpResponse::Conflict().json(body),
        AppError::ParseError(_) | AppError::ValidationError(_) => {
            HttpResponse::BadRequest().json(body)
        }
        AppError::Unreachable(_) | AppError::ServerError { .. } | AppError::InvalidResponse(_) => {
            HttpResponse::BadGateway().json(body)
        }
        _ => HttpResponse::InternalServerError().json(body),
    }
}

fn discarded_response() -> HttpResponse {
    HttpResponse::Gone().json(json!({ "message": "Result discarded after the view was closed" }))
}

fn sessions_disabled() -> HttpResponse {
    HttpResponse::Conflict()
        .json(json!({ "message": "Login is disabled while an API token is configured" }))
}

/// Header values must be visible ASCII
fn header_safe(message: &str) -> String {
    message
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '?' })
        .collect()
}

fn csv_attachment(report: &BatchReport) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    response
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(report.filename.clone())],
        });
    if let Some(message) = &report.dispatch_error {
        response.insert_header((DISPATCH_ERROR_HEADER, header_safe(message)));
    }
    response.body(report.document.clone())
}

#[get("/api/schema")]
async fn schema(data: web::Data<HttpState>) -> impl Responder {
    let feature_schema = data.pipeline.schema();
    HttpResponse::Ok().json(SchemaResponse {
        groups: feature_schema.groups(),
        fields: feature_schema.fields(),
    })
}

#[get("/api/sample")]
async fn sample() -> impl Responder {
    HttpResponse::Ok().json(sample_row())
}

#[post("/api/predict")]
async fn predict(
    data: web::Data<HttpState>,
    req: web::Json<serde_json::Map<String, serde_json::Value>>,
) -> impl Responder {
    let row = RawRow::from_json_object(&req);
    info!(fields = row.len(), "Single prediction requested");

    match data.gate.run(data.pipeline.predict_single(&row)).await {
        Ok(Some(outcome)) => HttpResponse::Ok().json(outcome),
        Ok(None) => discarded_response(),
        Err(e) => {
            warn!(error = %e, "Single prediction failed");
            error_response(&e)
        }
    }
}

#[post("/api/batch")]
async fn batch(
    data: web::Data<HttpState>,
    query: web::Query<BatchQuery>,
    body: web::Bytes,
) -> impl Responder {
    info!(bytes = body.len(), "Batch upload received");

    match data.gate.run(data.pipeline.predict_document(&body)).await {
        Ok(Some(report)) => match query.format.as_deref() {
            Some("json") => HttpResponse::Ok().json(&report),
            _ => csv_attachment(&report),
        },
        Ok(None) => discarded_response(),
        Err(e) => {
            warn!(error = %e, "Batch prediction failed");
            error_response(&e)
        }
    }
}

/// Called by the UI when the submitting view unmounts
#[post("/api/teardown")]
async fn teardown(data: web::Data<HttpState>) -> impl Responder {
    data.gate.teardown();
    HttpResponse::NoContent().finish()
}

#[get("/api/session")]
async fn session_status(data: web::Data<HttpState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "logged_in": data.pipeline.has_credential(),
        "login_enabled": data.sessions.is_some(),
    }))
}

#[post("/api/session")]
async fn login(data: web::Data<HttpState>, req: web::Json<SessionRequest>) -> impl Responder {
    let Some(sessions) = &data.sessions else {
        return sessions_disabled();
    };
    let Some(credential) = Credential::new(req.into_inner().token) else {
        return error_response(&AppError::ValidationError(
            "Session token must not be blank".to_string(),
        ));
    };

    match sessions.store(&credential) {
        Ok(()) => {
            info!("Session token stored");
            HttpResponse::NoContent().finish()
        }
        Err(e) => {
            warn!(error = %e, "Failed to store session token");
            error_response(&e)
        }
    }
}

#[delete("/api/session")]
async fn logout(data: web::Data<HttpState>) -> impl Responder {
    let Some(sessions) = &data.sessions else {
        return sessions_disabled();
    };

    match sessions.clear() {
        Ok(()) => {
            info!("Session token cleared");
            HttpResponse::NoContent().finish()
        }
        Err(e) => {
            warn!(error = %e, "Failed to clear session token");
            error_response(&e)
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES))
        .app_data(web::JsonConfig::default().limit(MAX_UPLOAD_BYTES))
        .service(schema)
        .service(sample)
        .service(predict)
        .service(batch)
        .service(teardown)
        .service(session_status)
        .service(login)
        .service(logout);
}

pub fn start_server(state: web::Data<HttpState>, host: &str, port: u16) -> Result<Server> {
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((host, port))
    .map_err(|e| {
        error!(error = %e, host, port, "Failed to bind HTTP interface");
        AppError::IoError(format!("Failed to bind {}:{}: {}", host, port, e))
    })?
    .run();

    info!("HTTP interface listening on http://{}:{}", host, port);
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prediction::{FeatureVector, PredictionResult, PredictionValue};
    use crate::domain::prediction_config::PredictionConfig;
    use crate::domain::schema::FeatureSchema;
    use crate::infrastructure::prediction_clients::PredictionClient;
    use crate::infrastructure::security::{CredentialProvider, StaticCredential};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    struct SumClient;

    #[async_trait]
    impl PredictionClient for SumClient {
        async fn predict_one(&self, v: &FeatureVector, _credential: &Credential) -> Result<PredictionValue> {
            Ok(PredictionValue(v.values().iter().sum()))
        }

        async fn predict_batch(
            &self,
            vectors: &[FeatureVector],
            _credential: &Credential,
        ) -> Result<Vec<PredictionResult>> {
            Ok(vectors
                .iter()
                .map(|v| PredictionResult::value(v.values().iter().sum()))
                .collect())
        }
    }

    struct DownClient;

    #[async_trait]
    impl PredictionClient for DownClient {
        async fn predict_one(&self, _v: &FeatureVector, _credential: &Credential) -> Result<PredictionValue> {
            Err(AppError::Unreachable("connection refused".to_string()))
        }

        async fn predict_batch(
            &self,
            _vectors: &[FeatureVector],
            _credential: &Credential,
        ) -> Result<Vec<PredictionResult>> {
            Err(AppError::Unreachable("connection refused\nby host".to_string()))
        }
    }

    #[derive(Default)]
    struct MemorySessions(Mutex<Option<Credential>>);

    impl CredentialProvider for MemorySessions {
        fn current_credential(&self) -> Option<Credential> {
            self.0.lock().unwrap().clone()
        }
    }

    impl SessionStore for MemorySessions {
        fn store(&self, credential: &Credential) -> Result<()> {
            *self.0.lock().unwrap() = Some(credential.clone());
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            *self.0.lock().unwrap() = None;
            Ok(())
        }
    }

    fn pipeline_with(
        client: Arc<dyn PredictionClient>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> PredictionPipeline {
        let feature_schema = Arc::new(
            FeatureSchema::new(vec![FieldSpec::required("a"), FieldSpec::required("b")]).unwrap(),
        );
        PredictionPipeline::new(
            feature_schema,
            &PredictionConfig::default(),
            client,
            credentials,
        )
    }

    fn state(credentials: StaticCredential) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(pipeline_with(
            Arc::new(SumClient),
            Arc::new(credentials),
        )))
    }

    #[actix_web::test]
    async fn test_predict_returns_risk() {
        let app = test::init_service(
            App::new()
                .app_data(state(StaticCredential::new("token")))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/predict")
            .set_json(json!({"a": "70", "b": 10}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "predicted");
        assert_eq!(body["prediction"], 80.0);
        assert_eq!(body["risk"]["label"], "Low Risk");
    }

    #[actix_web::test]
    async fn test_predict_without_login_is_401() {
        let app = test::init_service(
            App::new()
                .app_data(state(StaticCredential::none()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/predict")
            .set_json(json!({"a": 1, "b": 2}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["message"].as_str().unwrap().contains("log in"));
    }

    #[actix_web::test]
    async fn test_batch_returns_csv_attachment() {
        let app = test::init_service(
            App::new()
                .app_data(state(StaticCredential::new("token")))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/batch")
            .set_payload("a,b\n1,2\nx,4\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get("content-disposition")
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(disposition.contains("tb_predictions.csv"));

        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "1,2,3,");
        assert!(lines[2].starts_with("x,4,ERROR"));
    }

    #[actix_web::test]
    async fn test_batch_json_summary_and_parse_error() {
        let app = test::init_service(
            App::new()
                .app_data(state(StaticCredential::new("token")))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/batch?format=json")
            .set_payload("a,b\n1,2\n3,oops\n")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["predicted"], 1);
        assert_eq!(body["records"][1]["outcome"]["status"], "normalization_error");

        let req = test::TestRequest::post()
            .uri("/api/batch")
            .set_payload("a,b\n\"1,2\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_schema_lists_fields() {
        let app = test::init_service(
            App::new()
                .app_data(state(StaticCredential::new("token")))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/schema").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["fields"][0]["name"], "a");
        assert_eq!(body["fields"][1]["required"], true);
    }

    #[actix_web::test]
    async fn test_batch_dispatch_failure_sets_header() {
        let state = web::Data::new(HttpState::new(pipeline_with(
            Arc::new(DownClient),
            Arc::new(StaticCredential::new("token")),
        )));
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/batch")
            .set_payload("a,b\n1,2\n3,4\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let header = resp
            .headers()
            .get(DISPATCH_ERROR_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(header.contains("connection refused"), "{}", header);
        assert!(!header.contains('\n'));

        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(text.lines().filter(|l| l.contains("ERROR")).count(), 2);
    }

    #[actix_web::test]
    async fn test_successful_batch_has_no_dispatch_header() {
        let app = test::init_service(
            App::new()
                .app_data(state(StaticCredential::new("token")))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/batch")
            .set_payload("a,b\n1,2\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.headers().get(DISPATCH_ERROR_HEADER).is_none());
    }

    #[actix_web::test]
    async fn test_login_and_logout_gate_predictions() {
        let sessions = Arc::new(MemorySessions::default());
        let state = web::Data::new(
            HttpState::new(pipeline_with(Arc::new(SumClient), sessions.clone()))
                .with_sessions(sessions.clone()),
        );
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let predict_req = || {
            test::TestRequest::post()
                .uri("/api/predict")
                .set_json(json!({"a": 1, "b": 2}))
                .to_request()
        };

        let resp = test::call_service(&app, predict_req()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/session")
            .set_json(json!({"token": "abc"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get().uri("/api/session").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["logged_in"], true);

        let resp = test::call_service(&app, predict_req()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::delete().uri("/api/session").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
        assert!(sessions.current_credential().is_none());

        let resp = test::call_service(&app, predict_req()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_blank_session_token_rejected() {
        let sessions = Arc::new(MemorySessions::default());
        let state = web::Data::new(
            HttpState::new(pipeline_with(Arc::new(SumClient), sessions.clone()))
                .with_sessions(sessions.clone()),
        );
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/session")
            .set_json(json!({"token": "   "}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
        assert!(sessions.current_credential().is_none());
    }

    #[actix_web::test]
    async fn test_session_endpoints_disabled_with_fixed_token() {
        let app = test::init_service(
            App::new()
                .app_data(state(StaticCredential::new("token")))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/session")
            .set_json(json!({"token": "abc"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::delete().uri("/api/session").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
    }
}

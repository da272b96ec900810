use axum::extract::{Json, State};
use serde_json::{json, Value};

use crate::api::error::ApiError;
use crate::api::types::{Action, AnalyzeRequest};
use crate::api::AppState;
use crate::prompts;

/// The whole proxy: check the credential, dispatch the action to a
/// prompt/schema pair, make the one Gemini call, relay the parsed JSON.
/// Every failure funnels through `ApiError::into_response`.
pub async fn proxy(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<Value>, ApiError> {
    let gemini = state.gemini.as_ref().ok_or(ApiError::MissingCredential)?;

    let action = Action::parse(&req.action, req.data)?;
    let spec = prompts::prompt_for(&action);

    let parsed = gemini.generate(&spec).await?;
    Ok(Json(json!({ "data": parsed })))
}

/// `MethodRouter` fallback so non-POST verbs get the same `{ "error": ... }`
/// body shape as every other failure.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    use crate::api::AppState;
    use crate::gemini::GeminiService;

    /// Stand-in for the Gemini endpoint: returns a canned status/body and
    /// counts how many calls actually reach it.
    async fn fake_gemini(status: StatusCode, body: Value) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/generate",
            post(move || {
                let counter = counter.clone();
                let body = body.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (status, Json(body))
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/generate"), hits)
    }

    fn candidate_body(text: &str) -> Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    fn app(gemini: Option<GeminiService>) -> Router {
        crate::api::router().with_state(AppState {
            gemini: gemini.map(Arc::new),
        })
    }

    fn post_proxy(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/proxy")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn rejects_non_post_methods_without_calling_downstream() {
        let (url, hits) = fake_gemini(StatusCode::OK, candidate_body("{}")).await;
        let app = app(Some(GeminiService::new("test-key", url)));

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/proxy")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_json(response).await["error"], json!("method not allowed"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejects_unknown_action_without_calling_downstream() {
        let (url, hits) = fake_gemini(StatusCode::OK, candidate_body("{}")).await;
        let app = app(Some(GeminiService::new("test-key", url)));

        let response = app
            .oneshot(post_proxy(json!({ "action": "dropTables", "data": {} })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], json!("invalid action"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejects_malformed_payload_without_calling_downstream() {
        let (url, hits) = fake_gemini(StatusCode::OK, candidate_body("{}")).await;
        let app = app(Some(GeminiService::new("test-key", url)));

        let response = app
            .oneshot(post_proxy(
                json!({ "action": "getPairwise", "data": { "factors": "Price" } }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("malformed payload"), "got: {message}");
        assert!(message.contains("getPairwise"), "got: {message}");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fails_with_500_when_credential_is_missing() {
        let app = app(None);

        let response = app
            .oneshot(post_proxy(
                json!({ "action": "generateFactors", "data": { "industry": "retail" } }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn surfaces_downstream_status_in_the_error_message() {
        let (url, hits) = fake_gemini(StatusCode::SERVICE_UNAVAILABLE, json!({})).await;
        let app = app(Some(GeminiService::new("test-key", url)));

        let response = app
            .oneshot(post_proxy(
                json!({ "action": "generateFactors", "data": {} }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("503"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fails_when_the_candidate_is_missing() {
        let (url, _hits) = fake_gemini(StatusCode::OK, json!({ "candidates": [] })).await;
        let app = app(Some(GeminiService::new("test-key", url)));

        let response = app
            .oneshot(post_proxy(
                json!({ "action": "generateFactors", "data": {} }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("invalid or empty response"));
    }

    #[tokio::test]
    async fn fails_when_the_candidate_text_is_empty() {
        let (url, _hits) = fake_gemini(StatusCode::OK, candidate_body("")).await;
        let app = app(Some(GeminiService::new("test-key", url)));

        let response = app
            .oneshot(post_proxy(
                json!({ "action": "generateFactors", "data": {} }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("invalid or empty response"));
    }

    #[tokio::test]
    async fn fails_when_the_candidate_text_is_not_json() {
        let (url, _hits) = fake_gemini(StatusCode::OK, candidate_body("not json at all")).await;
        let app = app(Some(GeminiService::new("test-key", url)));

        let response = app
            .oneshot(post_proxy(
                json!({ "action": "getExplanation", "data": { "topStrategy": { "text": "x" } } }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn relays_the_parsed_explanation_round_trip() {
        let (url, hits) = fake_gemini(
            StatusCode::OK,
            candidate_body("{\"explanation\":\"Because X.\"}"),
        )
        .await;
        let app = app(Some(GeminiService::new("test-key", url)));

        let response = app
            .oneshot(post_proxy(json!({
                "action": "getExplanation",
                "data": { "topStrategy": { "text": "Go digital" } }
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "data": { "explanation": "Because X." } }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}

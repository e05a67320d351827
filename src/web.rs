// Upload form page
#[cfg(feature = "web-server")]
pub mod form;

// Axum integration (optional - requires axum dependency)
#[cfg(feature = "web-server")]
pub mod server {
    use axum::{
        extract::{DefaultBodyLimit, Multipart, State},
        http::StatusCode,
        response::{Html, IntoResponse, Json, Response},
        routing::{get, post},
        Router,
    };
    use serde::Serialize;
    use std::sync::Arc;
    use tower_http::limit::RequestBodyLimitLayer;

    use super::form;
    use crate::handlers::FoodAnalyzer;
    use crate::models::{parse_food_items, FoodImage, FoodItem};

    /// Multipart field carrying the upload.
    const IMAGE_FIELD: &str = "image";

    pub struct AppState {
        pub analyzer: Arc<FoodAnalyzer>,
    }

    #[derive(Debug, Serialize)]
    struct AnalyzeResponse {
        status: &'static str,
        result: String,
        items: Vec<FoodItem>,
    }

    #[derive(Debug, Serialize)]
    struct ErrorResponse {
        error: String,
    }

    pub fn create_router(analyzer: Arc<FoodAnalyzer>, max_upload_bytes: usize) -> Router {
        let state = Arc::new(AppState { analyzer });

        Router::new()
            .route("/", get(index))
            .route("/analyze", post(analyze_form))
            .route("/api/analyze", post(analyze_api))
            .route("/health", get(health_check))
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(max_upload_bytes))
            .with_state(state)
    }

    /// Pull the `image` field out of the form and decode it.
    async fn read_upload(mut multipart: Multipart) -> Result<FoodImage, (StatusCode, String)> {
        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => {
                    log::warn!("⚠️ Failed to read multipart upload: {}", e);
                    return Err((e.status(), format!("Could not read the upload: {}", e)));
                }
            };

            if field.name() != Some(IMAGE_FIELD) {
                continue;
            }

            let data = field.bytes().await.map_err(|e| {
                log::warn!("⚠️ Failed to read image field: {}", e);
                (e.status(), format!("Could not read the upload: {}", e))
            })?;

            // Browsers send an empty part when no file was chosen
            if data.is_empty() {
                break;
            }

            log::debug!("📦 Received upload of {} bytes", data.len());

            return FoodImage::decode(data).await.map_err(|e| {
                log::warn!("⚠️ Rejected upload: {:#}", e);
                (
                    StatusCode::BAD_REQUEST,
                    format!("Could not read the uploaded image: {:#}", e),
                )
            });
        }

        Err((StatusCode::BAD_REQUEST, "Please upload an image.".to_string()))
    }

    async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
        Html(form::render_page(state.analyzer.model(), None, None))
    }

    async fn analyze_form(
        State(state): State<Arc<AppState>>,
        multipart: Multipart,
    ) -> (StatusCode, Html<String>) {
        let model = state.analyzer.model();

        match read_upload(multipart).await {
            Ok(image) => {
                let analysis = state.analyzer.analyze(&image).await;
                let page = form::render_page(model, Some(&analysis.to_string()), None);
                (StatusCode::OK, Html(page))
            }
            Err((status, message)) => (status, Html(form::render_page(model, None, Some(&message)))),
        }
    }

    async fn analyze_api(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
        let image = match read_upload(multipart).await {
            Ok(image) => image,
            Err((status, error)) => return (status, Json(ErrorResponse { error })).into_response(),
        };

        let analysis = state.analyzer.analyze(&image).await;
        let result = analysis.to_string();
        let items = if analysis.is_completed() {
            parse_food_items(&result)
        } else {
            Vec::new()
        };

        Json(AnalyzeResponse {
            status: analysis.status(),
            result,
            items,
        })
        .into_response()
    }

    async fn health_check() -> &'static str {
        "OK"
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::config::Credential;
        use crate::models::MISSING_CREDENTIAL_MESSAGE;
        use crate::services::VisionService;
        use axum::body::{to_bytes, Body};
        use axum::http::{header, Request};
        use image::{DynamicImage, ImageOutputFormat, RgbImage};
        use std::io::Cursor;
        use tower::ServiceExt;

        const BOUNDARY: &str = "food-analyzer-boundary";

        struct FixedVision(&'static str);

        #[async_trait::async_trait]
        impl VisionService for FixedVision {
            fn model(&self) -> &str {
                "test-model"
            }

            async fn generate(&self, _prompt: &str, _image: &FoodImage) -> anyhow::Result<String> {
                Ok(self.0.to_string())
            }
        }

        struct FailingVision(&'static str);

        #[async_trait::async_trait]
        impl VisionService for FailingVision {
            fn model(&self) -> &str {
                "test-model"
            }

            async fn generate(&self, _prompt: &str, _image: &FoodImage) -> anyhow::Result<String> {
                anyhow::bail!(self.0)
            }
        }

        fn app_with(api_key: Option<&str>, vision: Arc<dyn VisionService>, limit: usize) -> Router {
            let analyzer = FoodAnalyzer::new(Credential::new(api_key.map(str::to_string)), vision);
            create_router(Arc::new(analyzer), limit)
        }

        fn app(api_key: Option<&str>, reply: &'static str) -> Router {
            app_with(api_key, Arc::new(FixedVision(reply)), 1024 * 1024)
        }

        fn png_bytes() -> Vec<u8> {
            let mut buf = Vec::new();
            DynamicImage::ImageRgb8(RgbImage::new(10, 10))
                .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
                .unwrap();
            buf
        }

        fn multipart_request(uri: &str, field: &str, data: &[u8]) -> Request<Body> {
            let mut body = Vec::new();
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"food.png\"\r\n",
                    field
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

            Request::builder()
                .method("POST")
                .uri(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .header(header::CONTENT_LENGTH, body.len())
                .body(Body::from(body))
                .unwrap()
        }

        async fn body_string(response: Response) -> String {
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            String::from_utf8(bytes.to_vec()).unwrap()
        }

        #[tokio::test]
        async fn test_health() {
            let response = app(Some("abc"), "")
                .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_string(response).await, "OK");
        }

        #[tokio::test]
        async fn test_index_shows_model() {
            let response = app(Some("abc"), "")
                .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert!(body_string(response).await.contains("Built with test-model."));
        }

        #[tokio::test]
        async fn test_form_submission_shows_result() {
            let response = app(Some("abc"), "apple : 2\nbanana : 1")
                .oneshot(multipart_request("/analyze", "image", &png_bytes()))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert!(body_string(response)
                .await
                .contains("readonly>\napple : 2\nbanana : 1</textarea>"));
        }

        #[tokio::test]
        async fn test_form_without_key_shows_diagnostic() {
            let response = app(None, "unused")
                .oneshot(multipart_request("/analyze", "image", &png_bytes()))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let page = body_string(response).await;
            assert!(page.contains(&form::escape_html(MISSING_CREDENTIAL_MESSAGE)));
            assert!(!page.contains("unused"));
        }

        #[tokio::test]
        async fn test_form_rejects_missing_image() {
            let response = app(Some("abc"), "")
                .oneshot(multipart_request("/analyze", "other", b"hello"))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert!(body_string(response).await.contains("Please upload an image."));
        }

        #[tokio::test]
        async fn test_form_rejects_undecodable_image() {
            let response = app(Some("abc"), "")
                .oneshot(multipart_request("/analyze", "image", b"not an image"))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert!(body_string(response)
                .await
                .contains("Could not read the uploaded image"));
        }

        #[tokio::test]
        async fn test_api_returns_items() {
            let response = app(Some("abc"), "apple : 2\ngrapes : approx. 50+")
                .oneshot(multipart_request("/api/analyze", "image", &png_bytes()))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
            assert_eq!(json["status"], "completed");
            assert_eq!(json["result"], "apple : 2\ngrapes : approx. 50+");
            assert_eq!(json["items"][1]["name"], "grapes");
            assert_eq!(json["items"][1]["quantity"], "approx. 50+");
        }

        #[tokio::test]
        async fn test_api_missing_key() {
            let response = app(Some(""), "apple : 2")
                .oneshot(multipart_request("/api/analyze", "image", &png_bytes()))
                .await
                .unwrap();

            let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
            assert_eq!(json["status"], "missing_credential");
            assert_eq!(json["result"], MISSING_CREDENTIAL_MESSAGE);
            assert_eq!(json["items"].as_array().unwrap().len(), 0);
        }

        #[tokio::test]
        async fn test_api_reports_remote_failure() {
            let response = app_with(Some("abc"), Arc::new(FailingVision("timeout")), 1024 * 1024)
                .oneshot(multipart_request("/api/analyze", "image", &png_bytes()))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
            assert_eq!(json["status"], "failed");
            assert_eq!(json["result"], "An error occurred: timeout");
            assert_eq!(json["items"].as_array().unwrap().len(), 0);
        }

        #[tokio::test]
        async fn test_oversized_upload_is_rejected() {
            let response = app_with(Some("abc"), Arc::new(FixedVision("unused")), 64)
                .oneshot(multipart_request("/analyze", "image", &png_bytes()))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        }
    }
}

mod test_utils;

use std::net::TcpListener;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use ai_images_backend::{
    entities::{generation::GenerateRequest, history::GenerationStatus},
    errors::AppError,
    generation::client::GenerationClient,
    processing_errors::ProcessingError,
    repositories::image_generation::{GenerationCall, ImageGenerationService},
    settings::GenerationSettings,
};
use serde_json::{json, Value};
use test_utils::*;

/// Starts a fake generation API on a random port and returns its base URL.
fn spawn_upstream(status: u16, body: Value) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake upstream");
    let port = listener.local_addr().unwrap().port();

    let server = HttpServer::new(move || {
        let body = body.clone();
        App::new().default_service(web::to(move |req: HttpRequest, payload: web::Json<Value>| {
            let body = body.clone();
            async move {
                let authorized = req
                    .headers()
                    .get("Authorization")
                    .and_then(|h| h.to_str().ok())
                    == Some("Bearer test-key");
                if !authorized {
                    return HttpResponse::Unauthorized().json(json!({"error": {"message": "bad key"}}));
                }
                if payload.get("response_format") != Some(&json!("b64_json")) {
                    return HttpResponse::BadRequest().json(json!({"message": "b64_json required"}));
                }
                HttpResponse::build(actix_web::http::StatusCode::from_u16(status).unwrap()).json(body)
            }
        }))
    })
    .listen(listener)
    .expect("listen fake upstream")
    .workers(1)
    .run();

    actix_rt::spawn(server);
    format!("http://127.0.0.1:{}/v1/images/generations", port)
}

fn client_for(api_url: String) -> GenerationClient {
    GenerationClient::new(&GenerationSettings {
        api_key: "test-key".into(),
        api_url,
        ..GenerationSettings::default()
    })
}

fn text_call() -> GenerationCall {
    GenerationCall {
        prompt: "a lighthouse".into(),
        image_path: None,
        model: "black-forest-labs/FLUX.1-schnell-Free".into(),
    }
}

#[actix_rt::test]
async fn successful_response_returns_payload() {
    let payload = png_base64(4, 4);
    let url = spawn_upstream(200, json!({"data": [{"b64_json": payload}]}));

    let result = client_for(url).generate(&text_call()).await.unwrap();

    assert_eq!(result, payload);
}

#[actix_rt::test]
async fn upstream_error_message_is_surfaced() {
    let url = spawn_upstream(503, json!({"error": {"message": "overloaded"}}));

    let err = client_for(url).generate(&text_call()).await.unwrap_err();

    assert_eq!(
        err,
        ProcessingError::ApiError {
            code: 503,
            message: "overloaded".into()
        }
    );
}

#[actix_rt::test]
async fn success_without_image_is_invalid() {
    let url = spawn_upstream(200, json!({"data": []}));

    let err = client_for(url).generate(&text_call()).await.unwrap_err();

    assert_eq!(err, ProcessingError::InvalidResponse);
}

#[actix_rt::test]
async fn unreachable_upstream_is_a_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = client_for(format!("http://127.0.0.1:{}/v1", port))
        .generate(&text_call())
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessingError::ConnectionError(_)));
}

#[actix_rt::test]
async fn connection_test_reports_upstream_status() {
    let ok = spawn_upstream(200, json!({"data": [{"b64_json": "AAAA"}]}));
    assert!(client_for(ok).test_connection().await.is_ok());

    let down = spawn_upstream(401, json!({"message": "invalid api key"}));
    let err = client_for(down).test_connection().await.unwrap_err();
    assert_eq!(
        err,
        ProcessingError::ApiError {
            code: 401,
            message: "invalid api key".into()
        }
    );
}

#[actix_rt::test]
async fn upstream_overload_fails_the_whole_generation() {
    let url = spawn_upstream(503, json!({"error": {"message": "overloaded"}}));
    let fixture = Fixture::new(StaticGenerator::returning_png());
    let source = fixture.seed_image(3, "big.png", 200, 100).await;

    let err = fixture
        .generation_handler_with(client_for(url))
        .generate(
            &generator_user(3),
            GenerateRequest {
                image_id: source.id,
                prompt: "sunset".into(),
                style_description: None,
                brand_kit_id: None,
                generation_type: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Processing(ProcessingError::ApiError { code: 503, .. })));

    let history = fixture.history.all();
    assert_eq!(history[0].status, GenerationStatus::Failed);
    assert_eq!(history[0].error_message.as_deref(), Some("overloaded"));
    assert!(fixture.temp_files().iter().all(|f| !f.starts_with("optimized_")));
}

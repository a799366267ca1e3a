use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use humantime::format_duration;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::{
    sync::{atomic::{AtomicI64, Ordering}, RwLock},
    time::Duration,
};
use sysinfo::System;

use crate::{
    constants::START_TIME,
    entities::auth::{AuthContext, Capability},
    errors::AppError,
    repositories::media::MediaRepository,
    AppState,
};

#[derive(Serialize, Clone, Default)]
struct SystemInfo {
    os: String,
    kernel: String,
    hostname: String,
    cpu_count: usize,
    memory_total: String,
    memory_available: String,
}

#[derive(Serialize, Clone, Default)]
struct HealthCheckResponse {
    status: String,
    uptime: String,
    timestamp: String,
    start_at: String,
    database: String,
    generation_api: String,
    uploads_dir: String,
    temp_dir: String,
    version: String,
    memory_usage: String,
    system: SystemInfo,
}

static LAST_CHECK: AtomicI64 = AtomicI64::new(0);
static CACHED_STATUS: Lazy<RwLock<HealthCheckResponse>> = Lazy::new(||
    RwLock::new(HealthCheckResponse::default())
);

fn gigabytes(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / 1024.0 / 1024.0 / 1024.0)
}

async fn directory_status(path: &std::path::Path) -> &'static str {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => "Writable",
        Ok(_) => "Not writable",
        Err(_) => "Missing",
    }
}

async fn build_health_response(state: &web::Data<AppState>) -> HealthCheckResponse {
    let now_utc = Utc::now();
    let uptime_secs = now_utc.signed_duration_since(*START_TIME).num_seconds().max(0) as u64;

    let mut sys = System::new_all();
    sys.refresh_all();

    let system_info = SystemInfo {
        os: System::name().unwrap_or_else(|| "Unknown".to_string()),
        kernel: System::kernel_version().unwrap_or_else(|| "Unknown".to_string()),
        hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        cpu_count: sys.cpus().len(),
        memory_total: gigabytes(sys.total_memory()),
        memory_available: gigabytes(sys.available_memory()),
    };

    let db_status = match state.media_handler.media_repo.check_connection().await {
        Ok(_) => "OK",
        Err(_) => "Unavailable",
    };

    let generation_api = if state.generation_client.is_configured() {
        "Configured"
    } else {
        "Not configured"
    };

    let uploads_dir = directory_status(state.media_handler.storage.root()).await;
    let temp_dir = directory_status(state.generation_handler.processor.optimizer.temp_dir()).await;

    let process = sysinfo::get_current_pid().ok().and_then(|pid| sys.process(pid));
    let memory_usage = process.map_or("Unknown".to_string(), |p|
        format!("{:.2} MB", p.memory() as f64 / 1024.0 / 1024.0)
    );

    HealthCheckResponse {
        status: if db_status == "OK" { "healthy" } else { "degraded" }.to_string(),
        uptime: format_duration(Duration::from_secs(uptime_secs)).to_string(),
        timestamp: now_utc.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        database: db_status.to_string(),
        generation_api: generation_api.to_string(),
        uploads_dir: uploads_dir.to_string(),
        temp_dir: temp_dir.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        memory_usage,
        system: system_info,
    }
}

#[get("/health")]
pub async fn admin_health_check(
    auth: AuthContext,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    auth.require(Capability::ManageAll)?;

    let now = Utc::now().timestamp();
    let last = LAST_CHECK.load(Ordering::Relaxed);

    if now - last > 5 {
        let response = build_health_response(&state).await;

        if let Ok(mut cache) = CACHED_STATUS.write() {
            *cache = response.clone();
            LAST_CHECK.store(now, Ordering::Relaxed);
        }

        return Ok(HttpResponse::Ok().json(response));
    }

    let cached = CACHED_STATUS.read().map(|r| r.clone()).map_err(|e| e.to_string());
    match cached {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => {
            tracing::warn!("HealthCheck cache lock poisoned: {}", e);
            Ok(HttpResponse::Ok().json(build_health_response(&state).await))
        }
    }
}

/// Sends a minimal request upstream to confirm the API key works.
#[get("/generation/test")]
pub async fn test_generation_api(
    auth: AuthContext,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    auth.require(Capability::ManageAll)?;

    state.generation_client.test_connection().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "API connection successful"
    })))
}

#[get("/models")]
pub async fn list_models(
    auth: AuthContext,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    auth.require(Capability::Generate)?;

    let models = state.generation_client.list_models().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "default_model": state.generation_handler.processor.settings.model,
        "models": models
    })))
}

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MODEL_CACHE_TTL: Duration = Duration::from_secs(12 * 60 * 60);

const IMAGE_MODEL_MARKERS: [&str; 5] = ["flux", "stable-diffusion", "sdxl", "playground", "openjourney"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

/// Shared, time-limited cache of the provider's image models.
#[derive(Debug, Clone, Default)]
pub struct ModelCache {
    inner: Arc<Mutex<Option<(Instant, Vec<ModelInfo>)>>>,
}

impl ModelCache {
    pub fn get(&self, ttl: Duration) -> Option<Vec<ModelInfo>> {
        let guard = self.inner.lock();
        match guard.as_ref() {
            Some((stored_at, models)) if stored_at.elapsed() < ttl => Some(models.clone()),
            _ => None,
        }
    }

    pub fn store(&self, models: Vec<ModelInfo>) {
        *self.inner.lock() = Some((Instant::now(), models));
    }

    pub fn clear(&self) {
        *self.inner.lock() = None;
    }
}

/// Accepts either a bare array or a `{ "data": [...] }` envelope and keeps
/// the image models, sorted by display name.
pub fn parse_image_models(payload: &Value) -> Vec<ModelInfo> {
    let entries = payload
        .as_array()
        .or_else(|| payload.get("data").and_then(Value::as_array))
        .cloned()
        .unwrap_or_default();

    let mut models: Vec<ModelInfo> = entries
        .iter()
        .filter_map(|entry| {
            let id = entry.get("id").and_then(Value::as_str)?;
            let is_image = entry.get("type").and_then(Value::as_str) == Some("image")
                || IMAGE_MODEL_MARKERS.iter().any(|m| id.to_lowercase().contains(m));
            if !is_image {
                return None;
            }
            let display_name = entry
                .get("display_name")
                .and_then(Value::as_str)
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(id);
            Some(ModelInfo {
                id: id.to_string(),
                display_name: display_name.to_string(),
                organization: entry
                    .get("organization")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
        })
        .collect();

    models.sort_by(|a, b| a.display_name.to_lowercase().cmp(&b.display_name.to_lowercase()));
    models
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_image_models_sorted_by_display_name() {
        let payload = json!([
            {"id": "meta-llama/Llama-3-8b", "type": "chat"},
            {"id": "black-forest-labs/FLUX.1-schnell", "type": "image", "display_name": "Flux Schnell"},
            {"id": "stabilityai/stable-diffusion-xl-base-1.0", "type": "language"},
            {"id": "acme/painter", "type": "image", "display_name": "Acme Painter"}
        ]);

        let models = parse_image_models(&payload);
        let ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();

        assert_eq!(
            ids,
            vec!["acme/painter", "black-forest-labs/FLUX.1-schnell", "stabilityai/stable-diffusion-xl-base-1.0"]
        );
        assert_eq!(models[2].display_name, "stabilityai/stable-diffusion-xl-base-1.0");
    }

    #[test]
    fn data_envelope_is_supported() {
        let payload = json!({"data": [{"id": "x/flux-dev"}]});
        assert_eq!(parse_image_models(&payload).len(), 1);
    }

    #[test]
    fn cache_expires_after_ttl() {
        let cache = ModelCache::default();
        assert!(cache.get(MODEL_CACHE_TTL).is_none());
        cache.store(vec![ModelInfo { id: "a".into(), display_name: "A".into(), organization: None }]);
        assert_eq!(cache.get(MODEL_CACHE_TTL).map(|m| m.len()), Some(1));
        assert!(cache.get(Duration::ZERO).is_none());
        cache.clear();
        assert!(cache.get(MODEL_CACHE_TTL).is_none());
    }
}

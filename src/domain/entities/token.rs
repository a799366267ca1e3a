use serde::{Serialize, Deserialize};

/// Access token claims issued by the host platform.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub caps: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

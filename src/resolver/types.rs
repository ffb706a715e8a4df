use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The part of the upstream resolution body we rely on.
///
/// Media items stay raw JSON: they are forwarded to the caller exactly as
/// upstream produced them, whatever their shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamPayload {
    pub medias: Option<Vec<Value>>,
}

impl UpstreamPayload {
    /// Takes `medias` out of a decoded upstream object. Anything other than an
    /// array carries no media.
    pub fn from_object(mut body: Map<String, Value>) -> Self {
        let medias = match body.remove("medias") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        };
        Self { medias }
    }
}

/// Body accepted by the proxy endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Successful proxy response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub success: bool,
    pub data: Vec<Value>,
    pub original_url: String,
}

impl ResolveResponse {
    pub fn new(data: Vec<Value>, original_url: String) -> Self {
        Self {
            success: true,
            data,
            original_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

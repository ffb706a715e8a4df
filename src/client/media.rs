use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaType {
    Video,
    Image,
    Audio,
    #[default]
    Other,
}

impl MediaType {
    fn from_value(value: &Value) -> Self {
        match value.as_str().map(str::to_ascii_lowercase).as_deref() {
            Some("video") => Self::Video,
            Some("image") => Self::Image,
            Some("audio") => Self::Audio,
            _ => Self::Other,
        }
    }
}

/// Typed view of one media item from a proxy response, used to render cards.
///
/// Only `url` is required. An unknown or missing `type` is
/// [`MediaType::Other`] and numeric optionals are read as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaItem {
    pub url: String,
    #[serde(rename = "type", default, deserialize_with = "media_type")]
    pub kind: MediaType,
    #[serde(default, deserialize_with = "loose_text")]
    pub quality: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub extension: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub thumbnail: Option<String>,
}

impl MediaItem {
    #[cfg(test)]
    pub fn new(url: &str, kind: MediaType) -> Self {
        Self {
            url: url.to_string(),
            kind,
            quality: None,
            extension: None,
            thumbnail: None,
        }
    }
}

fn media_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MediaType, D::Error> {
    Ok(MediaType::from_value(&Value::deserialize(deserializer)?))
}

fn loose_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

/// Decodes the `data` items of a proxy response. Items without a usable `url`
/// are skipped; the rest keep their order.
pub fn decode_medias(items: &[Value]) -> Vec<MediaItem> {
    items
        .iter()
        .filter_map(|item| match MediaItem::deserialize(item) {
            Ok(media) => Some(media),
            Err(e) => {
                warn!("Skipping media item that cannot be rendered: {}", e);
                None
            }
        })
        .collect()
}

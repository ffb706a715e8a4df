use super::media::{MediaItem, MediaType};
use std::fmt;

const DEFAULT_EXTENSION: &str = "mp4";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Video {
        src: String,
        poster: Option<String>,
    },
    Image {
        src: String,
    },
    Audio {
        src: String,
    },
    None,
}

/// One rendered result with its download target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCard {
    pub index: usize,
    pub label: String,
    pub icon: &'static str,
    pub preview: Preview,
    pub url: String,
    pub filename: String,
}

impl ResultCard {
    pub fn from_media(media: &MediaItem, index: usize, prefix: &str, stamp: i64) -> Self {
        let (label, icon, preview) = match media.kind {
            MediaType::Video => (
                format!("VIDEO · {}", media.quality.as_deref().unwrap_or("HD")),
                "🎬",
                Preview::Video {
                    src: media.url.clone(),
                    poster: media.thumbnail.clone(),
                },
            ),
            MediaType::Image => (
                "IMAGE".to_string(),
                "🖼️",
                Preview::Image {
                    src: media.url.clone(),
                },
            ),
            MediaType::Audio => (
                "AUDIO STREAM".to_string(),
                "🎵",
                Preview::Audio {
                    src: media.url.clone(),
                },
            ),
            MediaType::Other => ("MEDIA FILE".to_string(), "📁", Preview::None),
        };

        Self {
            index,
            label,
            icon,
            preview,
            url: media.url.clone(),
            filename: synthesize_filename(prefix, stamp, index, media.extension.as_deref()),
        }
    }
}

impl fmt::Display for ResultCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}  [SUCCESS]", self.icon, self.label)?;
        match &self.preview {
            Preview::Video { src, poster } => {
                writeln!(f, "  video: {}", src)?;
                if let Some(poster) = poster {
                    writeln!(f, "  poster: {}", poster)?;
                }
            }
            Preview::Image { src } => writeln!(f, "  image: {}", src)?,
            Preview::Audio { src } => writeln!(f, "  audio: {}", src)?,
            Preview::None => writeln!(f, "  url: {}", self.url)?,
        }
        writeln!(f, "  FILE: {}", self.filename)
    }
}

/// `{prefix}_{stamp}_{index}.{extension}`, with `mp4` when upstream gave no
/// usable extension.
pub fn synthesize_filename(
    prefix: &str,
    stamp: i64,
    index: usize,
    extension: Option<&str>,
) -> String {
    let extension = extension
        .map(|ext| ext.trim().trim_start_matches('.'))
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(DEFAULT_EXTENSION);
    format!("{}_{}_{}.{}", prefix, stamp, index, extension)
}

/// Extension of the last path segment of `url`, if it has one.
pub fn extension_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let (_, ext) = segment.rsplit_once('.')?;
    Some(ext.to_string())
}

/// Cards in upstream order; the first card is the one to bring into view.
pub fn render_cards(medias: &[MediaItem], prefix: &str) -> Vec<ResultCard> {
    let stamp = crate::utils::now_millis();
    medias
        .iter()
        .enumerate()
        .map(|(index, media)| ResultCard::from_media(media, index, prefix, stamp))
        .collect()
}

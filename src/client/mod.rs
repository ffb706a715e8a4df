mod api;
mod download;
mod form;
mod history;
mod media;
mod render;
mod search;
mod storage;

pub use api::{ClientError, ProxyClient, DEFAULT_ERROR_MESSAGE};
pub use download::{force_download, ButtonState, DownloadButton, DownloadOutcome, RESET_DELAY};
pub use form::{FormState, SubmitForm};
pub use history::{HistoryEntry, HistoryStore, RecentList, HISTORY_KEY, HISTORY_LIMIT};
pub use media::{decode_medias, MediaItem, MediaType};
pub use render::{extension_from_url, render_cards, synthesize_filename, Preview, ResultCard};
pub use search::{DropdownView, HistoryRow, HistorySearch};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

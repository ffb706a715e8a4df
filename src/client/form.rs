use super::api::{ClientError, ProxyClient};
use super::history::HistoryStore;
use super::render::{render_cards, ResultCard};
use super::storage::KeyValueStore;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Idle,
    Busy,
}

/// Restores the form to idle when dropped, whether the submission finished,
/// failed or was cancelled.
struct BusyGuard<'a> {
    state: &'a mut FormState,
}

impl<'a> BusyGuard<'a> {
    fn new(state: &'a mut FormState) -> Self {
        *state = FormState::Busy;
        Self { state }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.state = FormState::Idle;
    }
}

/// The URL submission form: input validation, loading state, results and
/// the last error.
#[derive(Debug)]
pub struct SubmitForm {
    state: FormState,
    filename_prefix: String,
    results: Vec<ResultCard>,
    error: Option<String>,
}

impl SubmitForm {
    pub fn new(filename_prefix: impl Into<String>) -> Self {
        Self {
            state: FormState::Idle,
            filename_prefix: filename_prefix.into(),
            results: Vec::new(),
            error: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn results(&self) -> &[ResultCard] {
        &self.results
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Submits `input` to the proxy. On success the URL is recorded in
    /// `history` and one card per media item replaces the previous results;
    /// on failure the message is kept in [`SubmitForm::error`].
    ///
    /// Empty input fails immediately and leaves previous results untouched.
    pub async fn submit<S: KeyValueStore>(
        &mut self,
        api: &ProxyClient,
        history: &mut HistoryStore<S>,
        input: &str,
    ) -> Result<&[ResultCard], ClientError> {
        let url = input.trim();
        if url.is_empty() {
            return Err(ClientError::EmptyInput);
        }

        let busy = BusyGuard::new(&mut self.state);
        self.results.clear();
        self.error = None;

        match api.resolve(url).await {
            Ok(medias) => {
                if let Err(e) = history.add(url) {
                    warn!("Failed to save {} to history: {:#}", url, e);
                }
                self.results = render_cards(&medias, &self.filename_prefix);
            }
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        }

        drop(busy);
        Ok(&self.results)
    }
}

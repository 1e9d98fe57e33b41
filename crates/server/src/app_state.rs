use std::sync::Arc;

use crate::summarizer::SummaryProvider;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) provider: Arc<dyn SummaryProvider>,
    pub(crate) max_body_bytes: usize,
}

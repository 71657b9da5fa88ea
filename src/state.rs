//! Application state management

use std::sync::Arc;

use crate::annotations::{AnnotationEditor, AnnotationStore};
use crate::config::Config;
use crate::documents::DocumentSource;
use crate::html::HighlightConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    editor: AnnotationEditor,
}

impl AppState {
    /// Create the application state over a document source
    pub fn new(config: Config, documents: Arc<dyn DocumentSource>) -> Self {
        let store = AnnotationStore::new(config.storage.annotations_dir.clone());
        let highlight_config = HighlightConfig {
            tag: config.render.highlight_tag.clone(),
            class: config.render.highlight_class.clone(),
        };
        let editor = AnnotationEditor::new(store, documents, highlight_config);

        Self {
            inner: Arc::new(AppStateInner { config, editor }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the annotation editor
    pub fn editor(&self) -> &AnnotationEditor {
        &self.inner.editor
    }
}

use crate::{config::WindowOptions,
            dom::Document,
            error::ProbeError,
            ops::{Helper, Outcome, Request}};
use once_cell::unsync::OnceCell;

/// A page: one document plus the global slot the helper is installed under.
///
/// The helper is installed at most once per window. Calls made before installation
/// answer with an error outcome.
#[derive(Debug)]
pub struct Window {
    /// The page's document
    document: Document,

    /// Window configuration
    options: WindowOptions,

    /// The installed helper, if any
    helper: OnceCell<Helper>,
}

impl Window {
    /// Wrap a document with default options
    pub fn new(document: Document) -> Self {
        Self::with_options(document, WindowOptions::default())
    }

    /// Wrap a document with the given options
    pub fn with_options(mut document: Document, options: WindowOptions) -> Self {
        document.set_event_log_limit(options.event_log_limit);
        Self {
            document,
            options,
            helper: OnceCell::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn options(&self) -> &WindowOptions {
        &self.options
    }

    /// Install the helper. Returns whether this call installed it; once installed, later
    /// calls leave it untouched.
    pub fn inject(&self) -> bool {
        let mut installed = false;
        self.helper.get_or_init(|| {
            installed = true;
            Helper::with_defaults()
        });
        if installed {
            log::debug!("installed page helper under window.{}", self.options.slot);
        }
        installed
    }

    pub fn is_injected(&self) -> bool {
        self.helper.get().is_some()
    }

    /// The installed helper
    pub fn helper(&self) -> Option<&Helper> {
        self.helper.get()
    }

    /// Run one request through the installed helper
    pub fn call(&mut self, request: &Request) -> Outcome {
        match self.helper.get() {
            Some(helper) => helper.execute(&mut self.document, request),
            None => ProbeError::NotInstalled(self.options.slot.clone()).into(),
        }
    }

    /// Run a JSON-encoded request and answer with the JSON-encoded outcome
    pub fn call_json(&mut self, request: &str) -> String {
        let outcome = match serde_json::from_str::<Request>(request) {
            Ok(request) => self.call(&request),
            Err(e) => ProbeError::from(e).into(),
        };
        serde_json::to_string(&outcome).unwrap_or_else(|e| {
            format!(r#"{{"success":false,"error":{:?}}}"#, e.to_string())
        })
    }
}

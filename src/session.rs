//! State container for one analysis: staged file, basis, result, error and tab.
//!
//! Every transition is a method on [`AnalysisSession`]; slots are replaced
//! wholesale, never merged.

use crate::credentials::CredentialGate;
use crate::document::SourceDocument;
use crate::error::{Result, StatementExtractorError};
use crate::schema::{ExtractionResult, FinancialStatement, ReportingBasis, StatementKind};
use async_trait::async_trait;
use log::{debug, error, info, warn};

pub const KEY_INVALIDATED_MESSAGE: &str = "API Key verification failed. Please re-select your key.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to analyze the document. Please try again.";

/// Anything that can turn a document into statements. One call per submit.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    async fn extract(
        &self,
        document: &SourceDocument,
        basis: ReportingBasis,
    ) -> Result<ExtractionResult>;
}

/// Which screen the front end should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionView {
    KeySelection,
    Upload,
    Results,
}

pub struct AnalysisSession<G: CredentialGate> {
    gate: G,
    has_key: bool,
    document: Option<SourceDocument>,
    basis: ReportingBasis,
    loading: bool,
    result: Option<ExtractionResult>,
    error: Option<String>,
    active_tab: StatementKind,
}

impl<G: CredentialGate> AnalysisSession<G> {
    /// Starts optimistic about the key; call [`refresh_credentials`](Self::refresh_credentials)
    /// to consult the gate.
    pub fn new(gate: G) -> Self {
        Self {
            gate,
            has_key: true,
            document: None,
            basis: ReportingBasis::default(),
            loading: false,
            result: None,
            error: None,
            active_tab: StatementKind::default(),
        }
    }

    pub async fn refresh_credentials(&mut self) -> bool {
        self.has_key = self.gate.has_selected_key().await;
        debug!("Credential gate reports key selected: {}", self.has_key);
        self.has_key
    }

    /// Opens the host's key selection and assumes it succeeded once it returns.
    pub async fn select_key(&mut self) -> Result<()> {
        self.gate.open_key_selection().await?;
        self.has_key = true;
        self.error = None;
        Ok(())
    }

    pub fn select_file(&mut self, document: SourceDocument) {
        debug!("Staged {} ({})", document.file_name, document.mime_type);
        self.document = Some(document);
        self.error = None;
    }

    pub fn select_basis(&mut self, basis: ReportingBasis) {
        self.basis = basis;
    }

    pub fn select_tab(&mut self, kind: StatementKind) {
        self.active_tab = kind;
    }

    pub fn can_submit(&self) -> bool {
        self.has_key && self.document.is_some() && !self.loading
    }

    /// Runs one extraction of the staged file.
    ///
    /// Without a key or a file no backend call is made. Every failure is also
    /// recorded as the session's user-facing error message.
    pub async fn submit<B>(&mut self, backend: &B) -> Result<&ExtractionResult>
    where
        B: ExtractionBackend + ?Sized,
    {
        if !self.has_key {
            return Err(StatementExtractorError::Configuration(
                "select an API key before extracting".to_string(),
            ));
        }
        let Some(document) = self.document.as_ref() else {
            let err = StatementExtractorError::NoFileSelected;
            self.error = Some(err.to_string());
            return Err(err);
        };

        self.error = None;
        info!("Submitting {} for {} extraction", document.file_name, self.basis);

        // Lowered on drop as well, including when the caller abandons this future
        let loading = LoadingFlag::raise(&mut self.loading);
        let outcome = backend.extract(document, self.basis).await;
        drop(loading);

        match outcome {
            Ok(result) => Ok(self.result.insert(result)),
            Err(e) => {
                error!("Extraction failed: {}", e);
                if e.is_credential_invalidation() {
                    warn!("Provider rejected the selected key; key selection required");
                    self.has_key = false;
                    self.error = Some(KEY_INVALIDATED_MESSAGE.to_string());
                } else {
                    self.error = Some(user_message(&e));
                }
                Err(e)
            }
        }
    }

    /// Drops the result and the staged file; basis and key state stay.
    pub fn new_analysis(&mut self) {
        self.result = None;
        self.document = None;
    }

    pub fn view(&self) -> SessionView {
        if !self.has_key {
            SessionView::KeySelection
        } else if self.result.is_some() {
            SessionView::Results
        } else {
            SessionView::Upload
        }
    }

    pub fn active_statement(&self) -> Option<&FinancialStatement> {
        self.result.as_ref().map(|r| r.statement(self.active_tab))
    }

    pub fn has_key(&self) -> bool {
        self.has_key
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn basis(&self) -> ReportingBasis {
        self.basis
    }

    pub fn active_tab(&self) -> StatementKind {
        self.active_tab
    }

    pub fn document(&self) -> Option<&SourceDocument> {
        self.document.as_ref()
    }

    pub fn result(&self) -> Option<&ExtractionResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }
}

struct LoadingFlag<'a>(&'a mut bool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

fn user_message(err: &StatementExtractorError) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        GENERIC_FAILURE_MESSAGE.to_string()
    } else {
        message
    }
}

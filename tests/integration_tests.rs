use async_trait::async_trait;
use financial_statement_extractor::session::KEY_INVALIDATED_MESSAGE;
use financial_statement_extractor::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const ACME_BODY: &str = r#"{
    "companyName": "Acme",
    "reportingPeriod": "FY2024",
    "profitAndLoss": {"title": "P&L", "years": ["2024"], "rows": [
        {"label": "Revenue", "values": ["100"]},
        {"label": "Total Revenue", "values": ["100"], "isTotal": true}
    ]},
    "balanceSheet": {"title": "Balance Sheet", "years": ["2024", "2023"], "rows": [
        {"label": "Cash", "values": ["40", "35"]},
        {"label": "Receivables", "values": ["60", "50"]},
        {"label": "Total Assets", "values": ["100", "85"], "isTotal": true}
    ]},
    "cashFlow": {"title": "Cash Flow", "years": ["2024"], "rows": []}
}"#;

fn acme() -> ExtractionResult {
    serde_json::from_str(ACME_BODY).unwrap()
}

fn report_pdf() -> SourceDocument {
    SourceDocument::new("report.pdf", "application/pdf", b"%PDF-1.7 test".to_vec()).unwrap()
}

struct StubGate {
    has_key: AtomicBool,
    selections: AtomicUsize,
}

impl StubGate {
    fn new(has_key: bool) -> Self {
        Self {
            has_key: AtomicBool::new(has_key),
            selections: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CredentialGate for StubGate {
    async fn has_selected_key(&self) -> bool {
        self.has_key.load(Ordering::SeqCst)
    }

    async fn open_key_selection(&self) -> Result<()> {
        self.selections.fetch_add(1, Ordering::SeqCst);
        self.has_key.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Replays canned outcomes and records every call.
struct ScriptedBackend {
    outcomes: Mutex<Vec<Result<ExtractionResult>>>,
    calls: Mutex<Vec<(String, ReportingBasis)>>,
}

impl ScriptedBackend {
    fn new(mut outcomes: Vec<Result<ExtractionResult>>) -> Self {
        outcomes.reverse();
        Self {
            outcomes: Mutex::new(outcomes),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ExtractionBackend for ScriptedBackend {
    async fn extract(
        &self,
        document: &SourceDocument,
        basis: ReportingBasis,
    ) -> Result<ExtractionResult> {
        self.calls
            .lock()
            .unwrap()
            .push((document.file_name.clone(), basis));
        self.outcomes
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(StatementExtractorError::EmptyResponse))
    }
}

/// Answers only after a long pause.
struct SlowBackend;

#[async_trait]
impl ExtractionBackend for SlowBackend {
    async fn extract(
        &self,
        _document: &SourceDocument,
        _basis: ReportingBasis,
    ) -> Result<ExtractionResult> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(acme())
    }
}

#[test]
fn test_export_round_trip_preserves_structure() {
    let original = acme();
    let exported = export_json(&original).unwrap();
    let reparsed: ExtractionResult = serde_json::from_str(&exported).unwrap();
    assert_eq!(reparsed, original);

    // Pretty output, wire names intact
    assert!(exported.contains("\n  \"companyName\": \"Acme\""));
    assert!(exported.contains("\"isTotal\": true"));
    assert!(!exported.contains("is_total"));
}

#[test]
fn test_write_export_names_file_from_company_and_basis() {
    let dir = tempfile::tempdir().unwrap();
    let mut result = acme();
    result.company_name = "Acme Holdings Group".to_string();

    let path = write_export(dir.path(), &result, ReportingBasis::Standalone).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "Acme_Holdings_Group_standalone.json"
    );

    let written: ExtractionResult =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written, result);
}

#[test]
fn test_presenter_dimensions_match_every_statement() {
    let result = acme();
    for kind in StatementKind::ALL {
        let statement = result.statement(kind);
        let table = StatementTable::from_statement(statement);
        assert_eq!(table.column_count(), statement.years.len() + 1);
        assert_eq!(table.row_count(), statement.rows.len());
    }
}

#[test]
fn test_acme_profit_and_loss_emphasizes_total() {
    let table = StatementTable::from_statement(&acme().profit_and_loss);
    assert_eq!(table.row_count(), 2);
    assert!(!table.rows[0].emphasized);
    assert!(table.rows[1].emphasized);
    assert_eq!(table.rows[1].cells, vec!["Total Revenue", "100"]);
}

#[tokio::test]
async fn test_submit_without_file_never_calls_backend() {
    let mut session = AnalysisSession::new(StubGate::new(true));
    let backend = ScriptedBackend::new(vec![Ok(acme())]);

    for _ in 0..3 {
        let err = session.submit(&backend).await.unwrap_err();
        assert!(matches!(err, StatementExtractorError::NoFileSelected));
    }
    assert_eq!(backend.call_count(), 0);
    assert_eq!(session.error(), Some("Please select a file first."));
    assert!(!session.can_submit());
}

#[tokio::test]
async fn test_successful_submit_shows_results() {
    let mut session = AnalysisSession::new(StubGate::new(true));
    let backend = ScriptedBackend::new(vec![Ok(acme())]);

    session.select_file(report_pdf());
    assert!(session.can_submit());

    let result = session.submit(&backend).await.unwrap();
    assert_eq!(result.company_name, "Acme");
    assert_eq!(session.view(), SessionView::Results);
    assert!(!session.is_loading());
    assert!(session.error().is_none());
    assert_eq!(
        *backend.calls.lock().unwrap(),
        vec![("report.pdf".to_string(), ReportingBasis::Consolidated)]
    );

    let active = session.active_statement().unwrap();
    assert_eq!(active.title, "P&L");
}

#[tokio::test]
async fn test_switching_basis_changes_only_basis() {
    let mut session = AnalysisSession::new(StubGate::new(true));
    let backend = ScriptedBackend::new(vec![]);

    session.select_tab(StatementKind::CashFlow);
    let _ = session.submit(&backend).await;
    let error_before = session.error().map(str::to_string);
    session.select_file(report_pdf());
    let _ = session.submit(&backend).await;
    let error_before_switch = session.error().map(str::to_string);

    session.select_basis(ReportingBasis::Standalone);

    assert_eq!(session.basis(), ReportingBasis::Standalone);
    assert_eq!(session.active_tab(), StatementKind::CashFlow);
    assert_eq!(session.document(), Some(&report_pdf()));
    assert_eq!(session.error().map(str::to_string), error_before_switch);
    assert!(error_before.is_some());
    assert!(session.result().is_none());
}

#[tokio::test]
async fn test_basis_is_forwarded_to_backend() {
    let mut session = AnalysisSession::new(StubGate::new(true));
    let backend = ScriptedBackend::new(vec![Ok(acme()), Ok(acme())]);
    session.select_file(report_pdf());

    session.submit(&backend).await.unwrap();
    session.select_basis(ReportingBasis::Standalone);
    session.submit(&backend).await.unwrap();

    let bases: Vec<ReportingBasis> = backend.calls.lock().unwrap().iter().map(|c| c.1).collect();
    assert_eq!(bases, vec![ReportingBasis::Consolidated, ReportingBasis::Standalone]);
}

#[tokio::test]
async fn test_result_is_replaced_wholesale() {
    let mut second = acme();
    second.company_name = "Beta".to_string();
    second.profit_and_loss.rows.clear();

    let mut session = AnalysisSession::new(StubGate::new(true));
    let backend = ScriptedBackend::new(vec![Ok(acme()), Ok(second.clone())]);
    session.select_file(report_pdf());

    session.submit(&backend).await.unwrap();
    session.submit(&backend).await.unwrap();
    assert_eq!(session.result(), Some(&second));
}

#[tokio::test]
async fn test_failed_submit_keeps_previous_result_and_reports_error() {
    let mut session = AnalysisSession::new(StubGate::new(true));
    let backend = ScriptedBackend::new(vec![
        Ok(acme()),
        Err(StatementExtractorError::MalformedResponse("expected value at line 1".into())),
    ]);
    session.select_file(report_pdf());

    session.submit(&backend).await.unwrap();
    let err = session.submit(&backend).await.unwrap_err();
    assert!(matches!(err, StatementExtractorError::MalformedResponse(_)));
    assert!(session.error().unwrap().contains("different document"));
    assert!(session.has_key());
    assert_eq!(session.result().map(|r| r.company_name.as_str()), Some("Acme"));
}

#[tokio::test]
async fn test_provider_error_message_is_shown_verbatim() {
    let mut session = AnalysisSession::new(StubGate::new(true));
    let backend = ScriptedBackend::new(vec![Err(StatementExtractorError::Provider {
        status: Some(429),
        code: Some("RESOURCE_EXHAUSTED".to_string()),
        message: "Quota exceeded for quota metric 'Generate Content API requests'.".to_string(),
    })]);
    session.select_file(report_pdf());

    let _ = session.submit(&backend).await;
    assert_eq!(
        session.error(),
        Some("Quota exceeded for quota metric 'Generate Content API requests'.")
    );
    assert_eq!(session.view(), SessionView::Upload);
}

#[tokio::test]
async fn test_entity_not_found_forces_key_reselection() {
    let gate = StubGate::new(true);
    let mut session = AnalysisSession::new(gate);
    let backend = ScriptedBackend::new(vec![
        Err(StatementExtractorError::Provider {
            status: Some(404),
            code: None,
            message: "Requested entity was not found.".to_string(),
        }),
        Ok(acme()),
    ]);
    session.select_file(report_pdf());

    let err = session.submit(&backend).await.unwrap_err();
    assert!(err.is_credential_invalidation());
    assert_eq!(session.view(), SessionView::KeySelection);
    assert_eq!(session.error(), Some(KEY_INVALIDATED_MESSAGE));
    assert!(!session.can_submit());

    // Blocked until a key is selected again
    let err = session.submit(&backend).await.unwrap_err();
    assert!(matches!(err, StatementExtractorError::Configuration(_)));
    assert_eq!(backend.call_count(), 1);

    session.select_key().await.unwrap();
    assert_eq!(session.gate().selections.load(Ordering::SeqCst), 1);
    session.submit(&backend).await.unwrap();
    assert_eq!(session.view(), SessionView::Results);
}

#[tokio::test]
async fn test_absent_credential_shows_key_selection() {
    let mut session = AnalysisSession::new(StubGate::new(false));
    let backend = ScriptedBackend::new(vec![Ok(acme())]);

    assert!(!session.refresh_credentials().await);
    assert_eq!(session.view(), SessionView::KeySelection);

    session.select_file(report_pdf());
    assert!(!session.can_submit());
    let err = session.submit(&backend).await.unwrap_err();
    assert!(matches!(err, StatementExtractorError::Configuration(_)));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_tab_switching_and_new_analysis() {
    let mut session = AnalysisSession::new(StubGate::new(true));
    let backend = ScriptedBackend::new(vec![Ok(acme())]);
    session.select_file(report_pdf());
    session.submit(&backend).await.unwrap();

    session.select_tab(StatementKind::BalanceSheet);
    let table = StatementTable::from_statement(session.active_statement().unwrap());
    assert_eq!(table.column_count(), 3);
    assert_eq!(table.row_count(), 3);

    session.select_tab(StatementKind::CashFlow);
    assert_eq!(session.active_statement().unwrap().title, "Cash Flow");

    session.new_analysis();
    assert!(session.result().is_none());
    assert!(session.document().is_none());
    assert!(session.active_statement().is_none());
    assert_eq!(session.view(), SessionView::Upload);
    assert_eq!(session.basis(), ReportingBasis::Consolidated);
}

#[tokio::test]
async fn test_abandoned_submit_leaves_session_ready() {
    let mut session = AnalysisSession::new(StubGate::new(true));
    session.select_file(report_pdf());

    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), session.submit(&SlowBackend)).await;
    assert!(abandoned.is_err());

    assert!(!session.is_loading());
    assert!(session.can_submit());
    assert!(session.result().is_none());

    let backend = ScriptedBackend::new(vec![Ok(acme())]);
    session.submit(&backend).await.unwrap();
    assert_eq!(backend.call_count(), 1);
    assert_eq!(session.view(), SessionView::Results);
}

//! # Financial Statement Extractor
//!
//! Sends a financial report (PDF or image) to Gemini with a structured-output
//! schema and turns the reply into Profit & Loss, Balance Sheet and Cash Flow
//! tables that can be shown, exported as JSON, or printed.
//!
//! ## Core Concepts
//!
//! - **Reporting basis**: `Consolidated` (group) or `Standalone` (parent only);
//!   it only changes the instruction sent to the model
//! - **ExtractionResult**: company, period and the three statements, exactly as
//!   the model returned them; figures stay strings
//! - **AnalysisSession**: the upload → extraction → display state machine
//! - **CredentialGate**: the host capability that knows whether a key is selected
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_statement_extractor::*;
//! use financial_statement_extractor::llm::StatementExtractor;
//!
//! let config = ExtractorConfig::from_env()?;
//! let extractor = StatementExtractor::from_config(&config);
//!
//! let mut session = AnalysisSession::new(EnvCredentialGate::from_env());
//! session.refresh_credentials().await;
//! session.select_basis(ReportingBasis::Standalone);
//! session.select_file(SourceDocument::from_path("annual_report.pdf".as_ref()).await?);
//!
//! let result = session.submit(&extractor).await?;
//! let table = StatementTable::from_statement(&result.balance_sheet);
//! println!("{}", table.render_text());
//! ```

pub mod config;
pub mod credentials;
pub mod document;
pub mod error;
pub mod export;
pub mod presenter;
pub mod schema;
pub mod session;

#[cfg(feature = "gemini")]
pub mod llm;

pub use config::ExtractorConfig;
pub use credentials::{CredentialGate, EnvCredentialGate};
pub use document::SourceDocument;
pub use error::{Result, StatementExtractorError};
pub use export::{export_file_name, export_json, print_report, render_report, write_export};
pub use presenter::{StatementTable, TableRow};
pub use schema::*;
pub use session::{AnalysisSession, ExtractionBackend, SessionView};

use dotenv::dotenv;
use financial_statement_extractor::llm::{ExtractionEvent, StatementExtractor};
use financial_statement_extractor::{
    export_file_name, export_json, ExtractorConfig, ReportingBasis, SourceDocument,
    StatementKind, StatementTable,
};
use std::error::Error;
use std::path::PathBuf;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos/documents/annual_report.pdf"));
    if !path.exists() {
        println!("⚠️  {:?} not found. Pass the path of a PDF or image report.", path);
        return Ok(());
    }

    println!("🚀 Starting statement extraction...\n");

    let config = ExtractorConfig::from_env()?;
    let extractor = StatementExtractor::from_config(&config);
    let document = SourceDocument::from_path(&path).await?;
    let basis = ReportingBasis::Consolidated;

    let (tx, mut rx) = mpsc::channel(16);
    let monitor = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ExtractionEvent::Starting => println!("🏁 Starting"),
                ExtractionEvent::Encoding { filename, bytes } => {
                    println!("📦 Encoding {} ({} bytes)", filename, bytes)
                }
                ExtractionEvent::Requesting { model } => println!("🤖 Asking {}...", model),
                ExtractionEvent::ProcessingResponse => println!("🔍 Reading the response"),
                ExtractionEvent::Success => println!("✅ Done"),
                ExtractionEvent::Failed { reason } => println!("❌ {}", reason),
            }
        }
    });

    let result = extractor
        .extract_with_progress(&document, basis, Some(tx))
        .await;
    monitor.await?;
    let result = result?;

    println!("\n🏢 {} | {}", result.company_name, result.reporting_period);
    for kind in StatementKind::ALL {
        let table = StatementTable::from_statement(result.statement(kind));
        println!("\n📊 {}\n{}", table.title, table.render_markdown());
    }

    let file_name = export_file_name(&result, basis);
    std::fs::write(&file_name, export_json(&result)?)?;
    println!("\n💾 Saved to: {}", file_name);

    Ok(())
}

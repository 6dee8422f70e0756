use anyhow::anyhow;
use clap::{Parser, Subcommand, ValueEnum};
use financial_statement_extractor::export::DEFAULT_PRINT_COMMAND;
use financial_statement_extractor::llm::StatementExtractor;
use financial_statement_extractor::{
    print_report, render_report, write_export, AnalysisSession, EnvCredentialGate,
    ExtractionResult, ExtractorConfig, ReportingBasis, SessionView, SourceDocument,
    StatementKind, StatementTable,
};
use log::{info, warn};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "finanalyzer", version, about = "Turn financial reports into clear statement tables")]
struct Cli {
    /// Gemini model used for extraction
    #[arg(long, global = true, env = "GEMINI_MODEL")]
    model: Option<String>,

    /// Override the Gemini API base URL
    #[arg(long, global = true, env = "GEMINI_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the statements of one report and show them
    Extract {
        /// PDF, JPG or PNG report
        file: PathBuf,

        #[arg(short, long, default_value = "consolidated")]
        basis: ReportingBasis,

        /// Show only this statement (pl, bs, cf)
        #[arg(short, long)]
        statement: Option<StatementKind>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write the full result as JSON into this directory
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Send the report to the system printer
        #[arg(long)]
        print: bool,

        #[arg(long, default_value = DEFAULT_PRINT_COMMAND)]
        print_command: String,
    },
    /// Step through upload, extraction and review at a prompt
    Interactive,
    /// Print the response schema sent to the model
    Schema,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    if dotenv::dotenv().is_ok() {
        info!("Loaded .env file");
    }

    let cli = Cli::parse();
    match cli.command {
        Commands::Schema => {
            println!("{}", ExtractionResult::schema_as_json()?);
            Ok(())
        }
        Commands::Extract {
            ref file,
            basis,
            statement,
            format,
            ref export_dir,
            print,
            ref print_command,
        } => {
            let gate = EnvCredentialGate::from_env();
            let mut session = AnalysisSession::new(gate);
            if !session.refresh_credentials().await {
                println!("🔑 API Key Required: no Gemini key found in GEMINI_API_KEY or API_KEY.");
                session.select_key().await?;
            }

            session.select_basis(basis);
            session.select_file(SourceDocument::from_path(file).await?);

            let extractor = build_extractor(&cli, &session)?;
            println!("⏳ Crunching {} data with {}...", basis, extractor.model());
            let outcome = session.submit(&extractor).await.map(|_| ());
            if outcome.is_err() {
                return Err(extraction_failure(file, session.error().unwrap_or_default()));
            }

            let result = session
                .result()
                .ok_or_else(|| anyhow!("extraction returned no result"))?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
                OutputFormat::Markdown => print_tables(result, basis, statement, true),
                OutputFormat::Text => print_tables(result, basis, statement, false),
            }

            if let Some(dir) = export_dir {
                let path = write_export(dir, result, basis)?;
                println!("💾 Saved JSON to: {}", path.display());
            }
            if print {
                let report = render_report(result, basis, statement, chrono::Local::now().date_naive());
                print_report(&report, print_command)?;
                println!("🖨️  Sent report to '{}'", print_command);
            }
            Ok(())
        }
        Commands::Interactive => run_interactive(&cli).await,
    }
}

/// The session's user-facing message, once, under the file it concerns.
fn extraction_failure(file: &Path, message: &str) -> anyhow::Error {
    anyhow!(message.to_string()).context(format!("extraction of {} failed", file.display()))
}

fn build_extractor(
    cli: &Cli,
    session: &AnalysisSession<EnvCredentialGate>,
) -> anyhow::Result<StatementExtractor> {
    let key = session
        .gate()
        .selected_key()
        .ok_or_else(|| anyhow!("no API key selected"))?;

    let mut config = ExtractorConfig::new(key);
    if let Some(model) = &cli.model {
        config = config.with_model(model.clone());
    }
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.clone());
    }
    config.validate()?;
    Ok(StatementExtractor::from_config(&config))
}

fn print_tables(
    result: &ExtractionResult,
    basis: ReportingBasis,
    only: Option<StatementKind>,
    markdown: bool,
) {
    println!("\n🏢 {} [{}]", result.company_name, basis);
    println!("📅 {}", result.reporting_period);

    let kinds = match only {
        Some(kind) => vec![kind],
        None => StatementKind::ALL.to_vec(),
    };
    for kind in kinds {
        let table = StatementTable::from_statement(result.statement(kind));
        println!("\n📊 {}: {}\n", kind, table.title);
        if markdown {
            println!("{}", table.render_markdown());
        } else {
            println!("{}", table.render_text());
        }
    }
}

const HELP: &str = "\
Commands:
  file <path>          stage a PDF or image report
  basis <consolidated|standalone>
  submit               extract the staged report
  tab <pl|bs|cf>       switch the statement shown
  show                 show the active statement again
  export [dir]         save the result as JSON (default: current dir)
  print [command]      send the report to the printer (default: lp)
  new                  start a new analysis
  status               show the staged file, basis and last error
  quit";

async fn run_interactive(cli: &Cli) -> anyhow::Result<()> {
    let mut session = AnalysisSession::new(EnvCredentialGate::from_env());
    session.refresh_credentials().await;

    println!("📈 FinAnalyzer: turn complex reports into clear data.");
    println!("{}\n", HELP);

    let stdin = io::stdin();
    loop {
        if session.view() == SessionView::KeySelection {
            println!("🔑 API Key Required: select a Gemini key from a paid GCP project.");
            println!("   Billing & quotas: https://ai.google.dev/gemini-api/docs/billing");
            if let Err(e) = session.select_key().await {
                warn!("Key selection failed: {}", e);
                return Err(e.into());
            }
        }

        print!("[{}] > ", session.basis());
        io::stdout().flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let mut words = input.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let arg = words.collect::<Vec<_>>().join(" ");

        match command {
            "quit" | "exit" => break,
            "help" => println!("{}", HELP),
            "file" => match SourceDocument::from_path(Path::new(&arg)).await {
                Ok(doc) => {
                    println!("📄 Staged {} ({} bytes)", doc.file_name, doc.len());
                    session.select_file(doc);
                }
                Err(e) => println!("❌ {}", e),
            },
            "basis" => match arg.parse::<ReportingBasis>() {
                Ok(basis) => session.select_basis(basis),
                Err(e) => println!("❌ {}", e),
            },
            "submit" => {
                let extractor = match build_extractor(cli, &session) {
                    Ok(extractor) => extractor,
                    Err(e) => {
                        println!("❌ {}", e);
                        continue;
                    }
                };
                println!("⏳ Crunching {} data...", session.basis());
                let outcome = session.submit(&extractor).await.map(|_| ());
                match outcome {
                    Ok(()) => show_active(&session),
                    Err(_) => println!("❌ {}", session.error().unwrap_or_default()),
                }
            }
            "tab" => match arg.parse::<StatementKind>() {
                Ok(kind) => {
                    session.select_tab(kind);
                    show_active(&session);
                }
                Err(e) => println!("❌ {}", e),
            },
            "show" => show_active(&session),
            "export" => match session.result() {
                Some(result) => {
                    let dir = if arg.is_empty() { PathBuf::from(".") } else { PathBuf::from(&arg) };
                    match write_export(&dir, result, session.basis()) {
                        Ok(path) => println!("💾 Saved JSON to: {}", path.display()),
                        Err(e) => println!("❌ {}", e),
                    }
                }
                None => println!("Nothing to export yet."),
            },
            "print" => match session.result() {
                Some(result) => {
                    let command = if arg.is_empty() { DEFAULT_PRINT_COMMAND } else { arg.as_str() };
                    let report = render_report(
                        result,
                        session.basis(),
                        None,
                        chrono::Local::now().date_naive(),
                    );
                    if let Err(e) = print_report(&report, command) {
                        println!("❌ {}", e);
                    }
                }
                None => println!("Nothing to print yet."),
            },
            "new" => {
                session.new_analysis();
                println!("🔄 New analysis.");
            }
            "status" => {
                let file = session
                    .document()
                    .map(|d| d.file_name.as_str())
                    .unwrap_or("(none)");
                println!("File: {} | Basis: {} | Tab: {}", file, session.basis(), session.active_tab());
                if let Some(err) = session.error() {
                    println!("Last error: {}", err);
                }
            }
            other => println!("Unknown command '{}'. Type 'help'.", other),
        }
    }

    Ok(())
}

fn show_active(session: &AnalysisSession<EnvCredentialGate>) {
    let (Some(result), Some(statement)) = (session.result(), session.active_statement()) else {
        println!("No result yet. Stage a file and run 'submit'.");
        return;
    };

    println!("\n🏢 {} [{}]", result.company_name, session.basis());
    println!("📅 {}", result.reporting_period);
    println!("\n📊 {} [{} Format]\n", statement.title, session.basis());
    println!("{}", StatementTable::from_statement(statement).render_text());
    println!();
}

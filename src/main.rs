use clap::{Parser, Subcommand};
use financial_statement_consolidator::llm::{FinancialAnalyst, GeminiClient, GeminiRecordSource};
use financial_statement_consolidator::{
    export_to_path, render_html, render_text, ConsolidatorConfig, ConsolidatorError, DisplayUnit,
    ReportSession, Result, SourceDocument,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "fsconsolidate",
    version,
    about = "Consolidate financial documents into tiered statements"
)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "CONSOLIDATOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract documents, consolidate them with the model and print the report
    Generate {
        /// Input documents (xlsx, xls, csv, pdf, docx, txt)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,

        /// Save the raw model response for later `render`
        #[arg(long)]
        save_raw: Option<PathBuf>,

        /// Stay in an interactive loop after the report
        #[arg(long)]
        chat: bool,
    },
    /// Render a previously saved model response without calling the model
    Render {
        response: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Display unit: won, thousand, million, hundred-million (or 원, 천원, 백만원, 억원)
    #[arg(short, long)]
    unit: Option<String>,

    /// Write the spreadsheet export here
    #[arg(long)]
    xlsx: Option<PathBuf>,

    /// Write an HTML report here
    #[arg(long)]
    html: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if let Some(raw) = e.raw_response() {
                eprintln!("--- raw response ---\n{}", raw);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ConsolidatorConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Generate {
            files,
            output,
            save_raw,
            chat,
        } => {
            let documents = files
                .iter()
                .map(|path| SourceDocument::from_path(path))
                .collect::<Result<Vec<_>>>()?;
            for document in &documents {
                eprintln!("  {} ({:.1} KB)", document.name, document.size_kb());
            }

            let source = GeminiRecordSource::from_config(&config)?;
            let mut session = ReportSession::new(&config);
            apply_unit(&mut session, output.unit.as_deref())?;

            eprintln!("Consolidating {} documents...", documents.len());
            session.generate(&source, &documents).await?;

            if let (Some(path), Some(raw)) = (&save_raw, session.raw_response()) {
                std::fs::write(path, raw)?;
                eprintln!("Raw response saved to {}", path.display());
            }

            write_outputs(&session, &output)?;

            if chat {
                let client = GeminiClient::new(config.require_api_key()?);
                let analyst = FinancialAnalyst::new(client, config.primary_model.clone());
                chat_loop(&mut session, analyst).await?;
            }
            Ok(())
        }
        Command::Render { response, output } => {
            let raw = std::fs::read_to_string(&response)?;
            let mut session = ReportSession::new(&config);
            apply_unit(&mut session, output.unit.as_deref())?;
            session.load_response(&raw)?;
            write_outputs(&session, &output)
        }
    }
}

fn apply_unit(session: &mut ReportSession, unit: Option<&str>) -> Result<()> {
    if let Some(unit) = unit {
        session.set_unit(unit.parse::<DisplayUnit>()?);
    }
    Ok(())
}

fn write_outputs(session: &ReportSession, output: &OutputArgs) -> Result<()> {
    let view = session.require_view()?;
    print!("{}", render_text(&view));

    if let Some(path) = &output.xlsx {
        export_to_path(&view, path)?;
        eprintln!("Spreadsheet written to {}", path.display());
    }
    if let Some(path) = &output.html {
        std::fs::write(path, render_html(&view))?;
        eprintln!("HTML report written to {}", path.display());
    }
    Ok(())
}

async fn chat_loop(session: &mut ReportSession, mut analyst: FinancialAnalyst) -> Result<()> {
    eprintln!("Commands: unit <name> | export <path> | reset | quit. Anything else is a question.");
    eprintln!("Units: {}", DisplayUnit::choices());
    let stdin = io::stdin();

    loop {
        eprint!("> ");
        io::stderr().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, argument) = line
            .split_once(char::is_whitespace)
            .map(|(c, a)| (c, a.trim()))
            .unwrap_or((line, ""));

        let outcome = match command {
            "quit" | "exit" => return Ok(()),
            "reset" => {
                session.reset();
                analyst.clear();
                eprintln!("Session cleared.");
                Ok(())
            }
            "unit" => argument.parse::<DisplayUnit>().and_then(|unit| {
                session.set_unit(unit);
                let view = session.require_view()?;
                print!("{}", render_text(&view));
                Ok(())
            }),
            "export" => export_session(session, argument),
            _ => match session.require_view() {
                Ok(view) => analyst.ask(line, &view).await.map(|answer| {
                    println!("{}\n", answer);
                }),
                Err(e) => Err(e),
            },
        };

        if let Err(e) = outcome {
            eprintln!("error: {}", e);
        }
    }
}

fn export_session(session: &ReportSession, argument: &str) -> Result<()> {
    let (default_name, bytes) = session.export_xlsx()?;
    let path = if argument.is_empty() {
        PathBuf::from(default_name)
    } else {
        PathBuf::from(argument)
    };
    write_bytes(&path, &bytes)?;
    eprintln!("Spreadsheet written to {}", path.display());
    Ok(())
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(ConsolidatorError::from)
}

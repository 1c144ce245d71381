// # -----------------------------
// # crates/cli/src/main.rs
// # -----------------------------
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coda_agent::Agent;
use coda_common::{ChatMessage, Config, GenerateOutcome, GenerateRequest, Template};
use coda_patcher::{InstructionOutcome, PatchReport};
use coda_tools::fs;
use std::io::{stdin, Read};
use tracing_subscriber::EnvFilter;

mod history;
mod relay;

use history::History;

const DEFAULT_CONFIG: &str = "coda.toml";
const ENV_CONFIG: &str = "CODA_CONFIG";
const ENV_API_KEY: &str = "CODA_API_KEY";

#[derive(Parser, Debug)]
#[command(
    name = "coda",
    version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("CODA_GIT_DESCRIBE"),
        ", ",
        env!("CODA_GIT_SHA"),
        ")"
    ),
    about = "CoDa - turn requests into code with a language model",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate code from a natural-language request
    Generate {
        /// What to build or change
        prompt: String,
        /// react | html | redesign | url_redesign | public_chat
        #[arg(short, long, default_value = "react")]
        template: Template,
        /// Start from this file instead of the template's starter code
        #[arg(long)]
        existing: Option<String>,
        /// Model override (default: backend.model)
        #[arg(long)]
        model: Option<String>,
        /// Write the code here instead of stdout
        #[arg(short, long)]
        out: Option<String>,
        /// Print the raw outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Redesign an HTML file or a live page with Tailwind CSS
    Redesign {
        /// HTML file to redesign ('-' for stdin)
        #[arg(long, conflicts_with = "url", required_unless_present = "url")]
        html: Option<String>,
        /// Page to fetch and redesign
        #[arg(long)]
        url: Option<String>,
        /// Style wishes (HTML input only)
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Talk to the companion; the conversation is kept between runs
    Chat {
        message: String,
        #[arg(long)]
        model: Option<String>,
    },

    /// Show or clear the chat history
    History {
        #[command(subcommand)]
        action: HistoryCmd,
    },

    /// Explain what a file does
    Explain { file: String },

    /// Rewrite a file according to a description
    Improve {
        file: String,
        #[arg(short, long)]
        description: String,
        /// Overwrite the file instead of printing
        #[arg(long)]
        write: bool,
    },

    /// Ask the model for search/replace blocks and apply them to a file
    Edit {
        file: String,
        /// The change to make
        request: String,
        #[arg(long)]
        write: bool,
        /// Print the patch report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply search/replace blocks from a saved model reply to a file
    Patch {
        file: String,
        /// Reply file, or '-' for stdin (default)
        #[arg(default_value = "-")]
        response: String,
        #[arg(long)]
        write: bool,
        #[arg(long)]
        json: bool,
    },

    /// Print the edit block format given to models
    Markers,

    /// Read one JSON request on stdin, answer with one JSON outcome
    Relay,
}

#[derive(Subcommand, Debug)]
enum HistoryCmd {
    Show {
        #[arg(long)]
        json: bool,
    },
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_cfg(DEFAULT_CONFIG).context("load config")?;

    match cli.command {
        Commands::Generate {
            prompt,
            template,
            existing,
            model,
            out,
            json,
        } => {
            let existing_code = existing.as_deref().map(fs::read_input).transpose()?;
            let req = GenerateRequest {
                messages: vec![ChatMessage::user(prompt.clone())],
                prompt,
                template,
                existing_code,
                model,
            };
            let outcome = Agent::new(&cfg).generate(&req).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                emit_code(outcome, out.as_deref())?;
            }
        }
        Commands::Redesign {
            html,
            url,
            description,
            out,
        } => {
            let agent = Agent::new(&cfg);
            let outcome = match (html, url) {
                (Some(path), _) => {
                    let source = fs::read_input(&path)?;
                    match description {
                        Some(d) => match agent.redesign_html(&source, Some(&d)).await {
                            Ok(code) => GenerateOutcome::ok(code, None),
                            Err(e) => GenerateOutcome::failed(coda_agent::errors::user_message(&e)),
                        },
                        None => agent.generate(&request(Template::Redesign, source)).await,
                    }
                }
                (None, Some(url)) => agent.generate(&request(Template::UrlRedesign, url)).await,
                (None, None) => anyhow::bail!("either --html or --url is required"),
            };
            emit_code(outcome, out.as_deref())?;
        }
        Commands::Chat { message, model } => {
            let mut history = History::load(&cfg.history)?;
            history.push(ChatMessage::user(message.clone()));
            let req = GenerateRequest {
                messages: history.messages(),
                prompt: message,
                template: Template::PublicChat,
                existing_code: None,
                model,
            };
            let outcome = Agent::new(&cfg).generate(&req).await;
            match (outcome.code, outcome.error) {
                (Some(reply), _) => {
                    history.push(ChatMessage::assist(reply.clone()));
                    history.save()?;
                    println!("{reply}");
                }
                (None, err) => anyhow::bail!(err.unwrap_or_else(|| "no reply".into())),
            }
        }
        Commands::History { action } => match action {
            HistoryCmd::Show { json } => {
                let history = History::load(&cfg.history)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(history.entries())?);
                } else if history.entries().is_empty() {
                    eprintln!("no chat history");
                } else {
                    for e in history.entries() {
                        println!(
                            "[{}] {}: {}",
                            e.at.format("%Y-%m-%d %H:%M"),
                            e.message.role.as_str(),
                            e.message.content
                        );
                    }
                }
            }
            HistoryCmd::Clear => {
                if History::clear(&cfg.history)? {
                    println!("history cleared");
                } else {
                    println!("no history to clear");
                }
            }
        },
        Commands::Explain { file } => {
            let code = fs::read_to_string(&file)?;
            println!("{}", Agent::new(&cfg).explain(&code).await?);
        }
        Commands::Improve {
            file,
            description,
            write,
        } => {
            let code = fs::read_to_string(&file)?;
            let improved = Agent::new(&cfg).improve(&code, &description).await?;
            if write {
                fs::write_from_string(&file, &improved)?;
                eprintln!("updated {file}");
            } else {
                println!("{improved}");
            }
        }
        Commands::Edit {
            file,
            request,
            write,
            json,
        } => {
            let document = fs::read_to_string(&file)?;
            let result = Agent::new(&cfg).edit(&document, &request).await?;
            if result.report.instructions.is_empty() {
                tracing::debug!(reply = %result.reply, "model reply without edit blocks");
            }
            finish_patch(&file, &result.report, write, json)?;
        }
        Commands::Patch {
            file,
            response,
            write,
            json,
        } => {
            let document = fs::read_to_string(&file)?;
            let reply = fs::read_input(&response)?;
            let report = coda_patcher::apply_changes_with_report(&document, &reply);
            finish_patch(&file, &report, write, json)?;
        }
        Commands::Markers => {
            print!("{}", coda_patcher::edit_format_instructions());
        }
        Commands::Relay => {
            let mut body = String::new();
            stdin().lock().read_to_string(&mut body)?;
            let outcome = relay::handle(&Agent::new(&cfg), &body).await?;
            println!("{}", serde_json::to_string(&outcome)?);
        }
    }

    Ok(())
}

fn load_cfg(path: &str) -> Result<Config> {
    // An explicit CODA_CONFIG must exist; the default file is optional.
    let explicit = std::env::var(ENV_CONFIG).ok().filter(|p| !p.is_empty());
    let cfg_path = explicit.clone().unwrap_or_else(|| path.to_string());
    let mut cfg = if explicit.is_none() && !std::path::Path::new(&cfg_path).exists() {
        tracing::debug!(path = %cfg_path, "no config file, using defaults");
        Config::default()
    } else {
        let s = std::fs::read_to_string(&cfg_path)
            .with_context(|| format!("unable to read config at {}", cfg_path))?;
        toml::from_str(&s).with_context(|| format!("invalid config at {}", cfg_path))?
    };
    if let Ok(key) = std::env::var(ENV_API_KEY) {
        if !key.trim().is_empty() {
            cfg.backend.api_key = key.trim().to_string();
        }
    }
    Ok(cfg)
}

fn request(template: Template, prompt: String) -> GenerateRequest {
    GenerateRequest {
        messages: vec![ChatMessage::user(prompt.clone())],
        prompt,
        template,
        ..Default::default()
    }
}

fn emit_code(outcome: GenerateOutcome, out: Option<&str>) -> Result<()> {
    let code = match (outcome.code, outcome.error) {
        (Some(code), _) => code,
        (None, err) => anyhow::bail!(err.unwrap_or_else(|| "no code returned".into())),
    };
    if let Some(reasoning) = outcome.reasoning {
        eprintln!("Reasoning: {reasoning}");
    }
    match out {
        Some(path) => {
            fs::write_from_string(path, &code)?;
            eprintln!("wrote {path}");
        }
        None => println!("{code}"),
    }
    Ok(())
}

fn finish_patch(file: &str, report: &PatchReport, write: bool, json: bool) -> Result<()> {
    for (edit, outcome) in report.instructions.iter().zip(&report.outcomes) {
        if *outcome == InstructionOutcome::NotFound {
            let first = edit.search.lines().next().unwrap_or_default();
            eprintln!("warn: search text not found, block skipped: {first:?}");
        }
    }
    if report.malformed > 0 {
        eprintln!("warn: {} malformed block(s) ignored", report.malformed);
    }

    if write {
        fs::write_from_string(file, &report.text)?;
        eprintln!(
            "patched {file}: {} applied, {} not found",
            report.applied(),
            report.not_found()
        );
    }
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else if !write {
        print!("{}", report.text);
    }
    Ok(())
}

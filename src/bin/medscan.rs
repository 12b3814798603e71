//! CLI for Med-Scan - prescription scanning and health chat via hosted Gemini.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use medscan::{
    enhance_bytes, prompt, EnhanceProfile, GeminiClient, ImageAttachment, Knowledge, ModelReply,
    PromptRequest, Responder, SessionState, TextProvider,
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "medscan")]
#[command(about = "Scan prescriptions and chat about medications via hosted Gemini models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive health-assistant chat session
    Chat,

    /// Analyze a prescription or medication image
    Scan(ScanArgs),

    /// Look up detailed information for one medicine
    Lookup(LookupArgs),

    /// Analyze described symptoms
    Symptoms(SymptomArgs),

    /// Show the model fallback chain
    Models(ModelsArgs),
}

#[derive(Args)]
struct ScanArgs {
    /// Path to the prescription image (png, jpeg or webp)
    image: PathBuf,

    /// Skip enhancement and send the original upload
    #[arg(long)]
    raw: bool,

    /// Enhancement profile applied before submission
    #[arg(long, value_enum, default_value = "sharpen")]
    profile: ProfileArg,

    /// Write the enhanced image to this path (PNG)
    #[arg(long)]
    save_enhanced: Option<PathBuf>,

    /// Override the knowledge-base file path
    #[arg(long)]
    knowledge: Option<PathBuf>,
}

#[derive(Args)]
struct LookupArgs {
    /// Medicine name (typos are fuzzy-corrected against the knowledge base)
    name: String,
}

#[derive(Args)]
struct SymptomArgs {
    /// Free-text description of the symptoms
    description: String,
}

#[derive(Args)]
struct ModelsArgs {
    /// Issue a health check against every model in the chain
    #[arg(long)]
    check: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProfileArg {
    Sharpen,
    Binarize,
}

impl From<ProfileArg> for EnhanceProfile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Sharpen => EnhanceProfile::Sharpen,
            ProfileArg::Binarize => EnhanceProfile::Binarize,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::from_filename(".env.local").ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("medscan=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let client = GeminiClient::builder()
        .build()
        .context("missing Google API key: set GOOGLE_API_KEY in the environment or .env.local")?;
    let responder = Responder::new(client);

    match cli.command {
        Commands::Chat => run_chat(&responder).await?,
        Commands::Scan(args) => {
            if args.raw && args.save_enhanced.is_some() {
                anyhow::bail!("--save-enhanced requires enhancement (remove --raw)");
            }
            let reply = scan_image(
                &responder,
                &args.image,
                args.raw,
                args.profile.into(),
                args.save_enhanced.as_deref(),
                args.knowledge.as_deref(),
            )
            .await?;
            print_reply(&reply, cli.json)?;
        }
        Commands::Lookup(args) => {
            let reply = lookup_medicine(&responder, &args.name).await?;
            print_reply(&reply, cli.json)?;
        }
        Commands::Symptoms(args) => {
            let request = PromptRequest::new(prompt::symptom_prompt(&args.description));
            let reply = responder.respond(&request).await?;
            print_reply(&reply, cli.json)?;
        }
        Commands::Models(args) => run_models(&responder, args.check, cli.json).await?,
    }

    Ok(())
}

/// Reads, optionally enhances, and submits one image through the fallback chain.
async fn scan_image(
    responder: &Responder<GeminiClient>,
    image: &Path,
    raw: bool,
    profile: EnhanceProfile,
    save_enhanced: Option<&Path>,
    knowledge_override: Option<&Path>,
) -> anyhow::Result<ModelReply> {
    let bytes =
        std::fs::read(image).with_context(|| format!("reading {}", image.display()))?;

    let attachment = if raw {
        ImageAttachment::from_bytes(bytes)?
    } else {
        let enhanced = enhance_bytes(&bytes, profile)?;
        if let Some(path) = save_enhanced {
            std::fs::write(path, &enhanced)
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!("enhanced image written to {}", path.display());
        }
        ImageAttachment::png(enhanced)
    };

    let kb = match knowledge_override {
        Some(path) => Knowledge::load_from_candidates(&[path]),
        None => Knowledge::load(),
    };
    if let Some(warning) = kb.warning() {
        eprintln!("{}", warning.yellow());
    }

    let request = PromptRequest::new(prompt::scan_prompt(&kb)).with_image(attachment);
    Ok(responder.respond(&request).await?)
}

async fn lookup_medicine(
    responder: &Responder<GeminiClient>,
    name: &str,
) -> anyhow::Result<ModelReply> {
    let kb = Knowledge::load();
    if let Some(warning) = kb.warning() {
        eprintln!("{}", warning.yellow());
    }

    let resolved = kb.resolve_name(name);
    if let Some(hit) = &resolved {
        if !hit.entry.name.eq_ignore_ascii_case(name.trim()) {
            eprintln!(
                "{}",
                format!(
                    "interpreting \"{name}\" as {} ({}% match)",
                    hit.entry.name, hit.confidence
                )
                .dimmed()
            );
        }
    }

    let request = PromptRequest::new(prompt::lookup_prompt(name, resolved.as_ref()));
    Ok(responder.respond(&request).await?)
}

async fn run_models(
    responder: &Responder<GeminiClient>,
    check: bool,
    json: bool,
) -> anyhow::Result<()> {
    if !check {
        if json {
            println!("{}", serde_json::to_string_pretty(responder.chain())?);
        } else {
            for (i, model) in responder.chain().iter().enumerate() {
                println!("{}. {model}", i + 1);
            }
        }
        return Ok(());
    }

    let mut statuses = Vec::new();
    for model in responder.chain() {
        let status = responder.provider().health_check(model).await;
        if json {
            statuses.push(serde_json::json!({
                "model": model,
                "ok": status.is_ok(),
                "error": status.as_ref().err().map(|e| e.to_string()),
            }));
        } else {
            match status {
                Ok(()) => println!("{model}: {}", "ok".green()),
                Err(e) => println!("{model}: {}", e.to_string().red()),
            }
        }
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
    }
    Ok(())
}

async fn run_chat(responder: &Responder<GeminiClient>) -> anyhow::Result<()> {
    println!(
        "{}",
        "Med-Scan health assistant. Type /help for commands, /quit to exit.".bold()
    );

    let mut editor = DefaultEditor::new()?;
    let mut session = SessionState::new();

    loop {
        // Plain prompt: escape codes would throw off rustyline's cursor math
        match editor.readline("you> ") {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(&line);

                if let Some(rest) = line.strip_prefix('/') {
                    if !handle_command(responder, &mut session, rest).await {
                        break;
                    }
                } else {
                    chat_turn(responder, &mut session, &line).await;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

async fn chat_turn(responder: &Responder<GeminiClient>, session: &mut SessionState, message: &str) {
    let kb = Knowledge::load();
    let request = PromptRequest::new(prompt::chat_prompt(&kb, session, message));
    session.push_user(message);

    // Exhaustion is rendered inline so the session keeps its
    // one-reply-per-message shape.
    let reply_text = match responder.respond(&request).await {
        Ok(reply) => reply.text,
        Err(e) => format!("Error: {e}"),
    };

    println!("{} {reply_text}", "assistant>".cyan());
    session.push_assistant(reply_text);
}

/// Dispatches a `/command`; returns false when the session should end.
async fn handle_command(
    responder: &Responder<GeminiClient>,
    session: &mut SessionState,
    input: &str,
) -> bool {
    let mut parts = input.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or("");
    let arg = parts.next().map(str::trim).unwrap_or("");

    match command {
        "quit" | "exit" => return false,
        "help" => print_chat_help(),
        "history" => println!(
            "{} chat turns, {} scans this session",
            session.turns().len(),
            session.scans().len()
        ),
        "scan" => {
            let Some((path, raw, profile)) = parse_scan_command(arg) else {
                println!("usage: /scan <image-path> [--raw] [--profile sharpen|binarize]");
                return true;
            };
            match scan_image(responder, &path, raw, profile, None, None).await {
                Ok(reply) => {
                    println!("{} {}", "assistant>".cyan(), reply.text);
                    session.record_scan(reply.text);
                }
                Err(e) => eprintln!("{}", format!("scan failed: {e:#}").red()),
            }
        }
        "lookup" => {
            if arg.is_empty() {
                println!("usage: /lookup <medicine name>");
                return true;
            }
            match lookup_medicine(responder, arg).await {
                Ok(reply) => println!("{} {}", "assistant>".cyan(), reply.text),
                Err(e) => eprintln!("{}", format!("lookup failed: {e:#}").red()),
            }
        }
        "symptoms" => {
            if arg.is_empty() {
                println!("usage: /symptoms <description>");
                return true;
            }
            let request = PromptRequest::new(prompt::symptom_prompt(arg));
            match responder.respond(&request).await {
                Ok(reply) => println!("{} {}", "assistant>".cyan(), reply.text),
                Err(e) => eprintln!("{}", format!("Error: {e}").red()),
            }
        }
        other => println!("unknown command /{other}; try /help"),
    }

    true
}

fn parse_scan_command(arg: &str) -> Option<(PathBuf, bool, EnhanceProfile)> {
    let mut path = None;
    let mut raw = false;
    let mut profile = EnhanceProfile::default();

    let mut tokens = arg.split_whitespace();
    while let Some(token) = tokens.next() {
        match token {
            "--raw" => raw = true,
            "--profile" => match tokens.next() {
                Some("sharpen") => profile = EnhanceProfile::Sharpen,
                Some("binarize") => profile = EnhanceProfile::Binarize,
                _ => return None,
            },
            other => path = Some(PathBuf::from(other)),
        }
    }

    path.map(|p| (p, raw, profile))
}

fn print_chat_help() {
    println!(
        "commands:\n\
         /scan <path> [--raw] [--profile sharpen|binarize]  analyze a prescription image\n\
         /lookup <name>                                     detailed medicine report\n\
         /symptoms <description>                            analyze symptoms\n\
         /history                                           session counts\n\
         /quit                                              leave the session"
    );
}

fn print_reply(reply: &ModelReply, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reply)?);
    } else {
        eprintln!(
            "{}",
            format!("[{} in {} ms]", reply.model, reply.duration_ms).dimmed()
        );
        println!("{}", reply.text);
    }
    Ok(())
}

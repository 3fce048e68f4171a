//! Window-less one-shot entry point.
//!
//! The desktop shell embeds [`crate::overlay`]; this path exists so
//! the same session machinery can be exercised from a terminal:
//! `quickask what is the capital of France`.

use std::error::Error;
use std::io::{self, Write};

use clap::Parser;

use crate::core::chat_stream::ChatStreamService;
use crate::core::config::Config;
use crate::core::provider::Provider;
use crate::core::session::{SessionController, SessionStatus};
use crate::utils::logging::TranscriptLog;

#[derive(Parser)]
#[command(name = "quickask")]
#[command(about = "Ask an LLM one question and stream the answer")]
#[command(long_about = "Sends a single prompt to the configured provider (OpenAI, \
Google Gemini, or a local Ollama endpoint) and streams the answer to stdout. \
Provider, credentials, model, and system prompt live in the overlay's config \
file; -p and -m override them for one invocation.")]
pub struct Args {
    /// The prompt to send
    #[arg(required = true)]
    pub prompt: Vec<String>,

    /// Provider override: openai, gemini, or ollama
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model override
    #[arg(short, long)]
    pub model: Option<String>,

    /// Append the exchange to this transcript file
    #[arg(long)]
    pub log_file: Option<String>,
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let prompt = args.prompt.join(" ");

    let mut config = Config::load()?;
    if let Some(provider) = args.provider.as_deref() {
        let provider = Provider::from_id(provider)
            .ok_or_else(|| format!("Unknown provider '{provider}' (expected openai, gemini, or ollama)"))?;
        config.set_provider(provider);
    }
    if let Some(model) = args.model {
        config.model = Some(model);
    }

    let transcript = TranscriptLog::new(args.log_file)?;

    let mut controller = SessionController::new();
    let Some(params) = controller.submit(&prompt, &config) else {
        let message = controller
            .error()
            .map(str::to_string)
            .unwrap_or_else(|| "Nothing to send".to_string());
        eprintln!("{message}");
        std::process::exit(2);
    };
    let (stream_service, mut rx) = ChatStreamService::new();
    stream_service.spawn_stream(params);

    let mut printed_len = 0usize;
    let mut announced_thinking = false;
    while let Some((message, id)) = rx.recv().await {
        controller.apply(message, id);

        let view = controller.derived_view();
        if view.is_thinking && !announced_thinking {
            eprintln!("{}", view.display_text);
            announced_thinking = true;
        }
        if !view.is_thinking && view.display_text.len() > printed_len {
            print!("{}", &view.display_text[printed_len..]);
            io::stdout().flush()?;
            printed_len = view.display_text.len();
        }

        if !controller.is_request_in_flight() {
            break;
        }
    }

    match controller.status() {
        SessionStatus::Done => {
            println!();
            if transcript.is_active() {
                transcript.append(&format!("You: {}", controller.prompt()))?;
                transcript.append(&controller.derived_view().display_text)?;
            }
            Ok(())
        }
        SessionStatus::Errored => {
            let message = controller.error().unwrap_or("stream failed");
            eprintln!("\n{message}");
            std::process::exit(1);
        }
        _ => {
            // Channel closed without a terminal message.
            eprintln!("\nStream ended unexpectedly");
            std::process::exit(1);
        }
    }
}

//! Command-line entry points.

use crate::chat::{
    ChatSettings, DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE, Repl, spawn_line_reader,
};
use crate::config::{Config, ConfigError, Credentials};
use crate::error::{Error, Result};
use crate::output::Renderer;
use crate::provider::{ChatMessage, ChatRequest, Fallback, GatewayClient, StreamChunk};
use clap::{Args, Parser, Subcommand};
use futures::{Stream, StreamExt};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Prompt used when none is given.
pub const DEFAULT_PROMPT: &str = "Say hi from GonkaGate in one short sentence.";
/// Sampling temperature for the streaming client.
pub const STREAM_TEMPERATURE: f32 = 0.2;

const NO_CONTENT: &str = "Received a response but no message content in choices[0].";
const STREAM_COMPLETE: &str = "[stream complete]";

/// Chat with models on the GonkaGate gateway
#[derive(Parser, Debug)]
#[command(name = "gonkagate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one prompt and print the full response
    Chat(ChatArgs),
    /// Send one prompt and print tokens as they arrive
    Stream(StreamArgs),
    /// Interactive multi-turn chat
    Repl(ReplArgs),
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Check configuration and exit without calling the API
    #[arg(long)]
    pub smoke: bool,
}

#[derive(Args, Debug)]
pub struct StreamArgs {
    /// Check configuration and exit without calling the API
    #[arg(long)]
    pub smoke: bool,

    /// Prompt words, joined with spaces
    pub prompt: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ReplArgs {
    /// Stream responses (true or false)
    #[arg(long, default_value = "true", value_name = "BOOL")]
    pub stream: String,

    /// Model id (overrides GONKAGATE_MODEL)
    #[arg(long)]
    pub model: Option<String>,

    /// System prompt
    #[arg(long, default_value = DEFAULT_SYSTEM_PROMPT)]
    pub system: String,

    /// Save the transcript to this path on exit
    #[arg(long, value_name = "PATH")]
    pub save: Option<String>,

    /// Sampling temperature (0 to 2)
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE, allow_negative_numbers = true)]
    pub temperature: f32,

    /// Check configuration and exit without calling the API
    #[arg(long)]
    pub smoke: bool,
}

/// Run the selected subcommand and map the outcome to an exit code.
pub async fn run(cli: Cli) -> ExitCode {
    init_tracing(cli.verbose);

    let (result, fallback) = match cli.command {
        Commands::Chat(args) => (chat(args).await, Fallback::Plain),
        Commands::Stream(args) => (stream(args).await, Fallback::Detailed),
        Commands::Repl(args) => (repl(args).await, Fallback::Plain),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e.user_message(fallback));
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: bool) {
    if verbose {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(io::stderr)
            .try_init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .try_init();
    }
}

/// Resolve configuration and print the ignored-override warning.
fn load_config(model_override: Option<&str>) -> Config {
    let config = Config::from_env().with_model_override(model_override);
    if let Some(warning) = config.base_url_warning() {
        eprintln!("{warning}");
    }
    config
}

async fn chat(args: ChatArgs) -> Result<()> {
    let config = load_config(None);
    if args.smoke {
        println!("Smoke check passed: script can start and parse configuration.");
        return Ok(());
    }

    let creds = config.validate()?;
    let client = GatewayClient::new(&creds.api_key);
    run_chat(&client, &creds, &mut io::stdout()).await
}

async fn stream(args: StreamArgs) -> Result<()> {
    let config = load_config(None);
    if args.smoke {
        println!("Smoke check passed: config is valid and script can start.");
        return Ok(());
    }

    let creds = config.validate()?;
    let client = GatewayClient::new(&creds.api_key);
    let prompt = prompt_from_words(&args.prompt);
    run_stream(&client, &creds, &prompt, &mut io::stdout()).await
}

async fn repl(args: ReplArgs) -> Result<()> {
    let config = load_config(args.model.as_deref());
    let settings = ChatSettings::from_flags(
        &args.stream,
        args.temperature,
        Some(args.system.as_str()),
        args.save.as_deref(),
    )?;
    if args.smoke {
        println!("Smoke check passed: config is valid and command can start.");
        return Ok(());
    }

    let creds = config.validate().map_err(|e| match e {
        ConfigError::MissingModel => ConfigError::MissingModelOrFlag,
        other => other,
    })?;
    let client = GatewayClient::new(&creds.api_key);

    let mut repl = Repl::new(&client, creds.model, settings, Renderer::terminal());
    repl.run(spawn_line_reader(io::BufReader::new(io::stdin())))
        .await
}

/// System prompt plus one user prompt.
fn conversation(prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(DEFAULT_SYSTEM_PROMPT),
        ChatMessage::user(prompt),
    ]
}

/// Join positional words into a prompt, falling back to the default.
pub fn prompt_from_words(words: &[String]) -> String {
    let prompt = words.join(" ");
    let prompt = prompt.trim();
    if prompt.is_empty() {
        DEFAULT_PROMPT.to_string()
    } else {
        prompt.to_string()
    }
}

/// One blocking completion, printed after a `Model response:` line.
pub async fn run_chat<W: Write>(
    client: &GatewayClient,
    creds: &Credentials,
    out: &mut W,
) -> Result<()> {
    let request = ChatRequest::new(creds.model.clone(), conversation(DEFAULT_PROMPT));
    let response = client.complete(request).await?;
    let text = response.first_text().ok_or(Error::EmptyResponse(NO_CONTENT))?;

    writeln!(out, "Model response:")?;
    writeln!(out, "{text}")?;
    out.flush()?;
    Ok(())
}

/// One streamed completion, printed token by token.
pub async fn run_stream<W: Write>(
    client: &GatewayClient,
    creds: &Credentials,
    prompt: &str,
    out: &mut W,
) -> Result<()> {
    let request = ChatRequest::new(creds.model.clone(), conversation(prompt))
        .with_temperature(STREAM_TEMPERATURE);
    let chunks = client.stream(request).await?;
    print_stream(chunks, out).await
}

/// Write every non-empty delta, then the completion marker.
///
/// A trailing newline is written before the marker only when some text was
/// printed. The first failed chunk ends the stream with its error.
pub async fn print_stream<S, W>(mut chunks: S, out: &mut W) -> Result<()>
where
    S: Stream<Item = std::result::Result<StreamChunk, crate::provider::Error>> + Unpin,
    W: Write,
{
    let mut printed = false;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        if let Some(token) = chunk.first_delta() {
            write!(out, "{token}")?;
            out.flush()?;
            printed = true;
        }
    }

    if printed {
        writeln!(out)?;
    }
    writeln!(out, "{STREAM_COMPLETE}")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::stream;

    // --- CLI parsing tests ---

    #[test]
    fn test_parse_chat() {
        let cli = Cli::try_parse_from(["gonkagate", "chat"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat(ChatArgs { smoke: false })));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parse_chat_smoke_verbose() {
        let cli = Cli::try_parse_from(["gonkagate", "chat", "--smoke", "-v"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat(ChatArgs { smoke: true })));
        assert!(cli.verbose);
    }

    #[test]
    fn test_parse_stream_words() {
        let cli = Cli::try_parse_from(["gonkagate", "stream", "tell", "me", "a", "joke"]).unwrap();
        match cli.command {
            Commands::Stream(args) => {
                assert!(!args.smoke);
                assert_eq!(args.prompt, vec!["tell", "me", "a", "joke"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_repl_defaults() {
        let cli = Cli::try_parse_from(["gonkagate", "repl"]).unwrap();
        match cli.command {
            Commands::Repl(args) => {
                assert_eq!(args.stream, "true");
                assert_eq!(args.model, None);
                assert_eq!(args.system, DEFAULT_SYSTEM_PROMPT);
                assert_eq!(args.save, None);
                assert!((args.temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
                assert!(!args.smoke);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_repl_flags() {
        let cli = Cli::try_parse_from([
            "gonkagate",
            "repl",
            "--stream",
            "false",
            "--model",
            "qwen/qwen3-32b",
            "--save",
            "chat.json",
            "--temperature",
            "-1",
        ])
        .unwrap();
        match cli.command {
            Commands::Repl(args) => {
                assert_eq!(args.stream, "false");
                assert_eq!(args.model.as_deref(), Some("qwen/qwen3-32b"));
                assert_eq!(args.save.as_deref(), Some("chat.json"));
                assert!((args.temperature + 1.0).abs() < f32::EPSILON);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_requires_subcommand() {
        assert!(Cli::try_parse_from(["gonkagate"]).is_err());
    }

    // --- Executor helpers ---

    #[test]
    fn test_prompt_from_words() {
        assert_eq!(prompt_from_words(&[]), DEFAULT_PROMPT);
        assert_eq!(prompt_from_words(&["  ".into(), String::new()]), DEFAULT_PROMPT);
        assert_eq!(
            prompt_from_words(&["hello".into(), "there".into()]),
            "hello there"
        );
    }

    #[test]
    fn test_conversation_shape() {
        let messages = conversation("hi");
        assert_eq!(messages[0], ChatMessage::system("You are a concise assistant."));
        assert_eq!(messages[1], ChatMessage::user("hi"));
    }

    #[test]
    fn test_print_stream_skips_empty_deltas() {
        let chunks = stream::iter(vec![
            Ok(StreamChunk::from_delta("a")),
            Ok(StreamChunk::from_delta("")),
            Ok(StreamChunk::default()),
            Ok(StreamChunk::from_delta("b")),
        ]);
        let mut out = Vec::new();
        block_on(print_stream(chunks, &mut out)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ab\n[stream complete]\n");
    }

    #[test]
    fn test_print_stream_empty() {
        let chunks = stream::iter(Vec::<std::result::Result<StreamChunk, crate::provider::Error>>::new());
        let mut out = Vec::new();
        block_on(print_stream(chunks, &mut out)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[stream complete]\n");
    }

    #[test]
    fn test_print_stream_error_stops_output() {
        let chunks = stream::iter(vec![
            Ok(StreamChunk::from_delta("partial")),
            Err(crate::provider::Error::from_status(503, String::new())),
            Ok(StreamChunk::from_delta("never")),
        ]);
        let mut out = Vec::new();
        let err = block_on(print_stream(chunks, &mut out)).unwrap_err();
        assert_eq!(
            err.user_message(Fallback::Detailed),
            "503 Service Unavailable. Retry in a few seconds."
        );
        assert_eq!(String::from_utf8(out).unwrap(), "partial");
    }
}

//! Terminal chat front-end for a running Leemer Chat relay

use clap::Parser;
use leemer_chat::api::ModelsResponse;
use leemer_chat::client::{
    ChatClient, ChatObserver, ChatSettings, HttpRelayTransport, Notice, RelayTransport,
};
use leemer_chat::system_prompt::TextStyle;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the relay server
    #[arg(long, env = "LEEMER_RELAY_URL", default_value = "http://localhost:8000")]
    relay_url: String,

    /// Native model used for chat and title requests
    #[arg(long, env = "LEEMER_MODEL", default_value = "qiwi-medium")]
    model: String,

    /// Partner model used when --partner is set or after /partner
    #[arg(long, env = "LEEMER_PARTNER_MODEL", default_value = "deepseek/deepseek-chat:free")]
    partner_model: String,

    /// Start on the partner model
    #[arg(long)]
    partner: bool,

    /// Text style (default, professional, casual, creative)
    #[arg(long, env = "LEEMER_STYLE", default_value = "default")]
    style: String,
}

const HELP: &str = "\
Commands:
  /new              start a new conversation
  /list             list conversations
  /switch N         show conversation N from /list
  /delete N         delete conversation N
  /rename TITLE     rename the current conversation
  /clear            clear the current conversation
  /model ID         chat with a native model
  /partner ID       chat with a partner model
  /style NAME       default | professional | casual | creative
  /models           list models known to the relay
  /help             show this help
  /quit             exit
Anything else is sent as a message.";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Send(String),
    New,
    List,
    Switch(usize),
    Delete(usize),
    Rename(String),
    Clear,
    Model(String),
    Partner(String),
    Style(TextStyle),
    Models,
    Help,
    Quit,
    Invalid(String),
}

impl Command {
    /// Parse one input line; blank lines yield nothing
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Some(Command::Send(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        let command = match (name, arg) {
            ("new", "") => Command::New,
            ("list", "") => Command::List,
            ("switch", n) => parse_index(n).map_or_else(|| usage("/switch N"), Command::Switch),
            ("delete", n) => parse_index(n).map_or_else(|| usage("/delete N"), Command::Delete),
            ("rename", "") => usage("/rename TITLE"),
            ("rename", title) => Command::Rename(title.to_string()),
            ("clear", "") => Command::Clear,
            ("model", "") => usage("/model ID"),
            ("model", id) => Command::Model(id.to_string()),
            ("partner", "") => usage("/partner ID"),
            ("partner", id) => Command::Partner(id.to_string()),
            ("style", style) => TextStyle::ALL
                .into_iter()
                .find(|s| s.as_str() == style)
                .map_or_else(
                    || usage("/style default|professional|casual|creative"),
                    Command::Style,
                ),
            ("models", "") => Command::Models,
            ("help", _) => Command::Help,
            ("quit" | "exit", _) => Command::Quit,
            _ => Command::Invalid(format!("Unknown command: {line} (try /help)")),
        };
        Some(command)
    }
}

fn parse_index(raw: &str) -> Option<usize> {
    raw.parse().ok().filter(|&n| n > 0)
}

fn usage(text: &str) -> Command {
    Command::Invalid(format!("Usage: {text}"))
}

/// Prints streamed fragments as they arrive
struct TerminalObserver;

impl ChatObserver for TerminalObserver {
    fn notify(&mut self, notice: &Notice) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = render(&mut out, notice).and_then(|()| out.flush()) {
            tracing::debug!(error = %e, "Failed to write to stdout");
        }
    }
}

fn render(out: &mut impl Write, notice: &Notice) -> std::io::Result<()> {
    match notice {
        Notice::Fragment { text, .. } => write!(out, "{text}"),
        Notice::ResponseComplete { .. } => writeln!(out),
        Notice::ResponseFailed { message, .. } => writeln!(out, "\n[request failed: {message}]"),
        Notice::TitleChanged { title, .. } => writeln!(out, "[title: {title}]"),
        // The conversation simply keeps its title
        Notice::TitleFailed { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leemer_chat=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let transport = HttpRelayTransport::new(&args.relay_url)?;
    let settings = ChatSettings {
        model: args.model.clone(),
        partner_model: args.partner_model.clone(),
        use_partner: args.partner,
        text_style: TextStyle::from_name(&args.style),
    };
    let mut client = ChatClient::new(transport)
        .with_settings(settings)
        .with_observer(TerminalObserver);
    let http = reqwest::Client::new();

    println!("Connected to {} (/help for commands)", args.relay_url);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let Some(command) = Command::parse(&line) else {
            continue;
        };
        if command == Command::Quit {
            break;
        }
        if let Err(e) = run(&mut client, &http, &args.relay_url, command).await {
            println!("[{e}]");
        }
    }

    Ok(())
}

async fn run<T: RelayTransport>(
    client: &mut ChatClient<T>,
    http: &reqwest::Client,
    relay_url: &str,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Send(text) => client.submit(&text).await?,
        Command::New => client.new_conversation().await?,
        Command::List => {
            let current = client.book().current().map(|c| c.id.clone());
            for (i, conv) in client.book().conversations().iter().enumerate() {
                let marker = if current.as_deref() == Some(conv.id.as_str()) { '*' } else { ' ' };
                println!(
                    "{marker}{:>3}. {} ({} messages)",
                    i + 1,
                    conv.title,
                    conv.messages.len()
                );
            }
        }
        Command::Switch(n) => {
            let id = conversation_id(client, n)?;
            client.select_conversation(&id).await?;
            if let Some(conv) = client.book().current() {
                for message in &conv.messages {
                    println!("{:?}: {}", message.role, message.content);
                }
            }
        }
        Command::Delete(n) => {
            let id = conversation_id(client, n)?;
            client.delete_conversation(&id).await?;
        }
        Command::Rename(title) => {
            let id = client
                .book()
                .current()
                .map(|c| c.id.clone())
                .ok_or("No conversation selected")?;
            client.rename_conversation(&id, &title).await?;
        }
        Command::Clear => client.clear_current().await?,
        Command::Model(id) => client.select_model(&id).await?,
        Command::Partner(id) => client.select_partner_model(&id).await?,
        Command::Style(style) => client.set_text_style(style).await?,
        Command::Models => {
            let url = format!("{}/api/models", relay_url.trim_end_matches('/'));
            let models: ModelsResponse = http.get(url).send().await?.error_for_status()?.json().await?;
            for model in models.models {
                let default = if model.id == models.default { " (default)" } else { "" };
                let kind = if model.partner { "partner" } else { "native" };
                println!("  {:<30} {:<8} {}{default}", model.id, kind, model.name);
            }
        }
        Command::Help => println!("{HELP}"),
        Command::Invalid(message) => println!("{message}"),
        Command::Quit => {}
    }
    Ok(())
}

fn conversation_id<T: RelayTransport>(client: &ChatClient<T>, n: usize) -> Result<String, String> {
    client
        .book()
        .conversations()
        .get(n - 1)
        .map(|c| c.id.clone())
        .ok_or_else(|| format!("No conversation {n}"))
}

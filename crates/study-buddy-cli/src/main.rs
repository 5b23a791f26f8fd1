//! Study Buddy CLI - chat with the study tutor from a terminal.
//!
//! This is the entry point for the `study-buddy` binary.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use crossterm::style::{Color, Stylize};
use tokio::io::{AsyncBufReadExt, BufReader};

use study_buddy_cli::{
    render, welcome_message, App, Capability, ChatClient, CommandNarrator, CommunicationStyle,
    ExplainLevel, TerminalSink, TutorSettings, Update, SUGGESTED_QUESTIONS,
};

/// Study Buddy CLI - chat with the study tutor from a terminal.
#[derive(Parser, Debug)]
#[command(name = "study-buddy")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Gateway URL.
    #[arg(
        long,
        env = "STUDY_BUDDY_GATEWAY",
        default_value = "http://localhost:8080"
    )]
    gateway: String,

    /// Bearer key for the gateway, if it requires one.
    #[arg(long, env = "STUDY_BUDDY_TOKEN")]
    token: Option<String>,

    /// Study topic.
    #[arg(long, env = "STUDY_BUDDY_TOPIC")]
    topic: Option<String>,

    /// File with background material for the topic.
    #[arg(long, env = "STUDY_BUDDY_CONTEXT_FILE")]
    context_file: Option<PathBuf>,

    /// Reply language code (en, hi, es, fr, de, pt, ja, zh).
    #[arg(long, env = "STUDY_BUDDY_LANGUAGE", default_value = "en")]
    language: String,

    /// How the tutor should talk to you.
    #[arg(long, env = "STUDY_BUDDY_STYLE", value_enum, default_value_t = CommunicationStyle::Neutral)]
    style: CommunicationStyle,

    /// Give up on a reply after this many seconds without data.
    #[arg(long, env = "STUDY_BUDDY_IDLE_TIMEOUT_SECS", default_value_t = 60)]
    idle_timeout_secs: u64,

    /// Command that reads replies aloud from stdin, e.g. "espeak".
    #[arg(long, env = "STUDY_BUDDY_SPEAK_CMD")]
    speak_cmd: Option<String>,

    /// Print replies as plain text only.
    #[arg(long, default_value = "false")]
    plain: bool,

    /// Enable debug logging (to stderr).
    #[arg(long, default_value = "false")]
    debug: bool,
}

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Cancel,
    Help,
    Health,
    Suggest(Option<usize>),
    Explain(ExplainLevel, &'a str),
    Say(&'a str),
    Empty,
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Say(line);
        };

        let (name, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let arg = arg.trim();
        match name {
            "quit" | "exit" => Self::Quit,
            "cancel" => Self::Cancel,
            "help" => Self::Help,
            "health" => Self::Health,
            "suggest" => Self::Suggest(arg.parse().ok()),
            "explain" => {
                let (level, topic) = match arg.split_once(char::is_whitespace) {
                    Some((first, topic)) => match ExplainLevel::from_str(first, true) {
                        Ok(level) => (level, topic.trim()),
                        Err(_) => (ExplainLevel::default(), arg),
                    },
                    None => (ExplainLevel::default(), arg),
                };
                Self::Explain(level, topic)
            }
            _ => Self::Unknown(name),
        }
    }
}

const HELP: &str = "\
Type a question and press Enter.

  /suggest         list follow-up questions
  /suggest <n>     ask follow-up question n
  /explain [basic|intermediate|advanced] <topic>
                   one-shot explanation of a topic
  /health         check the gateway is reachable and set up
  /cancel          stop the reply being received
  /quit            leave";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.debug {
        tracing_subscriber::fmt()
            .with_env_filter("study_buddy_cli=debug,study_buddy_stream=debug,warn")
            .with_writer(std::io::stderr)
            .init();
    }

    let context = match &args.context_file {
        Some(path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading context file {}", path.display()))?,
        ),
        None => None,
    };

    let narrator: Capability<CommandNarrator> = args
        .speak_cmd
        .as_deref()
        .map(CommandNarrator::new)
        .transpose()
        .context("parsing --speak-cmd")?
        .into();

    let settings = TutorSettings {
        topic: args.topic.clone(),
        context,
        language: args.language.clone(),
        style: args.style,
    };

    let client = ChatClient::new(&args.gateway, args.token.clone());
    let (app, events) = App::new(client, settings, narrator);
    let app = app.with_idle_timeout(Duration::from_secs(args.idle_timeout_secs));

    tracing::info!(gateway = %args.gateway, speech = app.can_speak(), "Starting study buddy");

    run_repl(app, events, args.plain).await
}

fn terminal_width() -> usize {
    crossterm::terminal::size().map_or(80, |(cols, _)| usize::from(cols))
}

/// Line REPL: reads prompts from stdin while reply events stream in.
async fn run_repl(
    mut app: App<CommandNarrator>,
    mut events: tokio::sync::mpsc::Receiver<study_buddy_cli::ChatEvent>,
    plain: bool,
) -> anyhow::Result<()> {
    let mut sink = TerminalSink::new(io::stdout(), terminal_width(), !plain);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    check_gateway(app.client(), false).await;

    print_tutor(plain);
    println!("{}", welcome_message(&app.settings().language));
    println!("{}", "Type /help for commands.".with(Color::DarkGrey));
    print_prompt(plain)?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Command::parse(&line) {
                    Command::Quit => break,
                    Command::Empty => {}
                    Command::Help => println!("{HELP}"),
                    Command::Health => check_gateway(app.client(), true).await,
                    Command::Cancel => match app.cancel() {
                        Some(_) => println!("\n{}", "(reply cancelled)".with(Color::DarkGrey)),
                        None => println!("Nothing to cancel."),
                    },
                    Command::Suggest(None) => {
                        for (i, question) in SUGGESTED_QUESTIONS.iter().enumerate() {
                            println!("  {}. {question}", i + 1);
                        }
                    }
                    Command::Suggest(Some(n)) => {
                        match n.checked_sub(1).and_then(|i| SUGGESTED_QUESTIONS.get(i)) {
                            Some(question) => {
                                println!("{question}");
                                say(&mut app, &mut sink, question, plain).await?;
                            }
                            None => println!("Pick a number from 1 to {}.", SUGGESTED_QUESTIONS.len()),
                        }
                    }
                    Command::Explain(_, "") => println!("Usage: /explain [level] <topic>"),
                    Command::Explain(level, topic) => {
                        match app.explain(topic, level, true).await {
                            Ok(text) => render::render(&text, &mut sink)?,
                            Err(err) => render::render(&err.remediation(), &mut sink)?,
                        }
                    }
                    Command::Say(text) => say(&mut app, &mut sink, text, plain).await?,
                    Command::Unknown(name) => println!("Unknown command /{name}. Type /help."),
                }
                if !app.is_streaming() {
                    print_prompt(plain)?;
                }
            }
            Some(event) = events.recv() => {
                if let Some(update) = app.handle_event(event) {
                    show_update(update, &mut sink, plain)?;
                }
            }
        }
    }

    app.cancel();
    app.stop_speaking();
    Ok(())
}

/// Report gateway setup problems; `verbose` also reports a healthy gateway.
async fn check_gateway(client: &ChatClient, verbose: bool) {
    match client.health().await {
        Ok(health) => {
            let problems = health.problems(client.has_token());
            if problems.is_empty() && verbose {
                println!(
                    "Gateway {} is {} (version {}).",
                    client.base_url(),
                    health.status,
                    health.version
                );
            }
            for problem in problems {
                println!("{} {problem}", "⚠️".with(Color::Yellow));
            }
        }
        Err(err) => {
            tracing::debug!(error = %err, "Health check failed");
            println!(
                "{} Cannot reach the gateway at {}: {err}",
                "⚠️".with(Color::Yellow),
                client.base_url()
            );
        }
    }
}

async fn say(
    app: &mut App<CommandNarrator>,
    sink: &mut TerminalSink<io::Stdout>,
    text: &str,
    plain: bool,
) -> anyhow::Result<()> {
    let before = app.conversation().len();
    if app.submit(text).await?.is_some() {
        print_tutor(plain);
        io::stdout().flush()?;
    } else if let Some(turn) = app.conversation().messages().get(before + 1) {
        // The request failed and its remediation was appended after the user turn.
        render::render(&turn.content, sink)?;
    }
    Ok(())
}

fn show_update(
    update: Update,
    sink: &mut TerminalSink<io::Stdout>,
    plain: bool,
) -> anyhow::Result<()> {
    match update {
        Update::Delta(text) => {
            print!("{text}");
            io::stdout().flush()?;
        }
        Update::Finished(text) => {
            println!();
            if !plain && !text.is_empty() {
                sink.set_width(terminal_width());
                println!("{}", "─".repeat(terminal_width().min(60)).with(Color::DarkGrey));
                render::render(&text, sink)?;
            }
            print_prompt(plain)?;
        }
        Update::Failed { remediation, .. } => {
            println!();
            render::render(&remediation, sink)?;
            print_prompt(plain)?;
        }
    }
    Ok(())
}

fn print_tutor(plain: bool) {
    if plain {
        print!("tutor › ");
    } else {
        print!("{} ", "tutor ›".with(Color::Cyan).bold());
    }
}

fn print_prompt(plain: bool) -> io::Result<()> {
    if plain {
        print!("you › ");
    } else {
        print!("{} ", "you ›".with(Color::Green).bold());
    }
    io::stdout().flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(Command::parse("  what is DNA? "), Command::Say("what is DNA?"));
        assert_eq!(Command::parse("   "), Command::Empty);
    }

    #[test]
    fn slash_commands() {
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/cancel"), Command::Cancel);
        assert_eq!(Command::parse("/health"), Command::Health);
        assert_eq!(Command::parse("/suggest"), Command::Suggest(None));
        assert_eq!(Command::parse("/suggest 2"), Command::Suggest(Some(2)));
        assert_eq!(Command::parse("/frobnicate"), Command::Unknown("frobnicate"));
    }

    #[test]
    fn explain_takes_an_optional_level() {
        assert_eq!(
            Command::parse("/explain photosynthesis in plants"),
            Command::Explain(ExplainLevel::Basic, "photosynthesis in plants")
        );
        assert_eq!(
            Command::parse("/explain advanced entropy"),
            Command::Explain(ExplainLevel::Advanced, "entropy")
        );
        assert_eq!(Command::parse("/explain"), Command::Explain(ExplainLevel::Basic, ""));
    }

    #[test]
    fn args_parse_with_defaults() {
        let args = Args::try_parse_from(["study-buddy", "--style", "brief", "--plain"]).unwrap();
        assert_eq!(args.style, CommunicationStyle::Brief);
        assert_eq!(args.idle_timeout_secs, 60);
        assert!(args.plain);
    }
}

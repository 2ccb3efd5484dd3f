//! Command implementations for the Marquee CLI.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Subcommand;
use futures::StreamExt;
use marquee_core::config::MarqueeConfig;
use marquee_core::consumer::{ConsumerSession, SessionPhase};
use marquee_core::delivery::DeliveryEvent;
use marquee_core::prefs::{FilePreferenceStore, PreferenceStore, ProviderPreferences};
use marquee_core::relay::{PlaybackRelay, ProxyRelay};

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the stream resolution server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },
    /// Resolve all sources for a title in one shot
    Sources {
        /// Title identifier to resolve
        title: String,
        /// Base URL of a running marquee server
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        server: String,
    },
    /// Watch a title: ingest sources progressively and auto-select one
    Watch {
        /// Title identifier to resolve
        title: String,
        /// Base URL of a running marquee server
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        server: String,
        /// Path to a preferences JSON file with an enabledProviders map
        #[arg(long)]
        prefs: Option<PathBuf>,
    },
}

/// Dispatches a parsed command.
pub async fn handle_command(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Serve { bind } => {
            let mut config = MarqueeConfig::from_env();
            config.server.bind = bind;
            marquee_web::run_server(config).await
        }
        Commands::Sources { title, server } => sources_command(&title, &server).await,
        Commands::Watch {
            title,
            server,
            prefs,
        } => watch_command(&title, &server, prefs).await,
    }
}

async fn sources_command(title: &str, server: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!(
        "{}/streams?title={}",
        server.trim_end_matches('/'),
        urlencoding::encode(title)
    );
    let body: serde_json::Value = reqwest::get(&url).await?.error_for_status()?.json().await?;

    let sources = body["sources"].as_array().cloned().unwrap_or_default();
    if sources.is_empty() {
        println!("No streams found for title {title}");
        return Ok(());
    }
    for source in &sources {
        println!(
            "{:<16} {:<8} {}",
            source["provider"].as_str().unwrap_or("?"),
            source["quality"].as_str().unwrap_or("?"),
            source["url"].as_str().unwrap_or("?")
        );
    }
    println!("{} stream(s) total", sources.len());
    Ok(())
}

async fn watch_command(
    title: &str,
    server: &str,
    prefs_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let prefs = match prefs_path {
        Some(path) => FilePreferenceStore::new(path).enabled_providers(),
        None => ProviderPreferences::default(),
    };

    let mut session = ConsumerSession::new(prefs);
    session.begin();

    let server = server.trim_end_matches('/');
    let url = format!(
        "{server}/streams/progressive?title={}",
        urlencoding::encode(title)
    );
    let response = reqwest::get(&url).await?.error_for_status()?;

    let relay = ProxyRelay::new(format!("{server}/relay"));
    let mut announced_selection = false;
    let mut buffer = String::new();
    let mut frames = response.bytes_stream();

    'outer: while let Some(chunk) = frames.next().await {
        buffer.push_str(&String::from_utf8_lossy(&chunk?));
        while let Some(newline) = buffer.find('\n') {
            let line: String = buffer.drain(..=newline).collect();
            let Some(event) = parse_sse_line(line.trim_end()) else {
                continue;
            };
            session.handle_event(event);

            if !announced_selection
                && let Some(selected) = session.selected()
            {
                announced_selection = true;
                println!(
                    "Now playing: {} ({}) via {}",
                    selected.url, selected.quality, selected.provider
                );
                println!(
                    "Relayed:     {}",
                    relay.rewrite_for_playback(&selected.url, None)
                );
            }

            match session.phase() {
                SessionPhase::Complete => {
                    println!("{} stream(s) available", session.sources().len());
                    break 'outer;
                }
                SessionPhase::Failed => break 'outer,
                _ => {}
            }
        }
    }

    if let Some(error) = session.error() {
        eprintln!("Error: {error}");
        eprintln!("Re-run the command to retry.");
        return Err(Box::new(error.clone()));
    }
    Ok(())
}

/// Extracts one delivery event from an SSE line, skipping keep-alive
/// comments and unknown payloads.
fn parse_sse_line(line: &str) -> Option<DeliveryEvent> {
    let payload = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:"))?;
    serde_json::from_str(payload).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_delivery_events_from_sse_lines() {
        assert_eq!(
            parse_sse_line(r#"data: {"type":"start"}"#),
            Some(DeliveryEvent::Start)
        );
        assert_eq!(
            parse_sse_line(r#"data: {"type":"complete","total":2}"#),
            Some(DeliveryEvent::Complete { total: 2 })
        );
        assert!(matches!(
            parse_sse_line(
                r#"data: {"type":"source","data":{"url":"https://a/x.m3u8","quality":"1080p","provider":"A"}}"#
            ),
            Some(DeliveryEvent::Source { .. })
        ));
    }

    #[test]
    fn ignores_comments_and_blank_lines() {
        assert_eq!(parse_sse_line(""), None);
        assert_eq!(parse_sse_line(": keep-alive"), None);
        assert_eq!(parse_sse_line("data: not json"), None);
    }
}

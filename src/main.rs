use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use portfolio_terminal::config::{self, TerminalConfig};
use portfolio_terminal::navigator::HttpFragmentSource;
use portfolio_terminal::search::HttpSearchClient;
use portfolio_terminal::{cli, logging, tui, SessionMode, SessionSettings, TerminalSession};

const USAGE: &str = "Usage: portfolio-terminal [--config <path>] [--set key=value]... [--exec <command>]...

  --config <path>   use this config file instead of ~/.portfolio-terminal/config.toml
  --set key=value   override a config value (base_url, start_page, timeout, enabled, ...)
  --exec <command>  run a command without the full-screen UI and print the output";

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    overrides: Vec<(String, String)>,
    exec: Vec<String>,
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Option<Args>> {
    let mut parsed = Args::default();
    let mut args = args;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--set" => {
                let pair = args.next().context("--set needs key=value")?;
                let (key, value) = pair
                    .split_once('=')
                    .with_context(|| format!("Expected key=value, got: {}", pair))?;
                parsed.overrides.push((key.to_string(), value.to_string()));
            }
            "--exec" => {
                parsed.exec.push(args.next().context("--exec needs a command")?);
            }
            other => bail!("Unknown argument: {}\n\n{}", other, USAGE),
        }
    }

    Ok(Some(parsed))
}

fn build_session(config: &TerminalConfig, mode: SessionMode) -> Result<TerminalSession> {
    let search = HttpSearchClient::new(
        &config.site.base_url,
        &config.site.search_path,
        config.http.timeout(),
        config.http.connect_timeout(),
    )
    .context("Failed to create HTTP client")?;

    let fragments = HttpFragmentSource::new(
        &config.site.base_url,
        &config.site.fragment_header,
        config.http.timeout(),
        config.http.connect_timeout(),
    )
    .context("Failed to create HTTP client")?;

    let settings = SessionSettings {
        prompt: config.terminal.prompt.clone(),
        welcome: config.terminal.welcome.clone(),
    };

    Ok(TerminalSession::new(
        mode,
        settings,
        Arc::new(search),
        Arc::new(fragments),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let Some(args) = parse_args(std::env::args().skip(1))? else {
        println!("{}", USAGE);
        return Ok(());
    };

    dotenv::dotenv().ok();

    let mut config = config::load_or_create_config(args.config.as_deref())?;
    config.merge_overrides(args.overrides)?;

    match logging::init_logging(&config.logging) {
        Ok(path) => info!("logging to {}", path.display()),
        Err(e) => eprintln!("Logging disabled: {:#}", e),
    }
    info!(base_url = %config.site.base_url, "starting portfolio terminal");

    if !args.exec.is_empty() {
        let session = build_session(&config, SessionMode::Active)?;
        return cli::run_commands(session, &config.site.start_page, &args.exec).await;
    }

    let columns = crossterm::terminal::size().ok().map(|(width, _)| width);
    let mode = SessionMode::detect(config.terminal.enabled, config.terminal.min_columns, columns);
    info!(?mode, ?columns, "session mode decided");

    let mut session = build_session(&config, mode)?;
    session.start(&config.site.start_page);
    tui::run_tui(session).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_args() {
        let parsed = parse_args(args(&[
            "--config",
            "/tmp/c.toml",
            "--set",
            "base_url=http://x:1",
            "--exec",
            "find rust",
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(parsed.config, Some(PathBuf::from("/tmp/c.toml")));
        assert_eq!(parsed.overrides, vec![("base_url".to_string(), "http://x:1".to_string())]);
        assert_eq!(parsed.exec, vec!["find rust".to_string()]);
    }

    #[test]
    fn test_parse_args_help_and_errors() {
        assert!(parse_args(args(&["--help"])).unwrap().is_none());
        assert!(parse_args(args(&["--set", "novalue"])).is_err());
        assert!(parse_args(args(&["--bogus"])).is_err());
    }
}

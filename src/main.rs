//! Purpose: `webhook-echo` CLI entry point.
//! Role: Binary crate root; parses flags, builds `ServeConfig`, runs the server.
//! Invariants: Startup errors are emitted on stderr (JSON when not a terminal).
//! Invariants: Process exit code is derived from `core::error::to_exit_code`.
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::net::SocketAddr;

use clap::{Parser, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};

mod serve;

use webhook_echo::core::error::{Error, ErrorKind, to_exit_code};
use webhook_echo::ingress::DEFAULT_MAX_BODY_BYTES;

#[derive(Parser)]
#[command(
    name = "webhook-echo",
    version,
    about = "Receive SNS-style JSON webhooks, log them, and echo them back",
    long_about = None,
    after_help = r#"ROUTES
  GET  /       {"message": "Hello, World!"}
  POST /data   {"sns": "Received SNS message", "payload": <body>}

EXAMPLES
  $ webhook-echo
  $ webhook-echo --bind 127.0.0.1:9000
  $ webhook-echo --bind 0.0.0.0:8000 --allow-non-loopback
  $ curl -s localhost:8000/data -d '{"Type":"SubscriptionConfirmation","Token":"abc123"}'

Logging honors RUST_LOG (default: info)."#
)]
struct Cli {
    #[arg(
        long,
        default_value = "127.0.0.1:8000",
        help = "Bind address",
        help_heading = "Connection"
    )]
    bind: String,
    #[arg(
        long,
        help = "Allow binding a non-loopback address",
        help_heading = "Connection"
    )]
    allow_non_loopback: bool,
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_BODY_BYTES as u64,
        help = "Maximum request body size in bytes",
        help_heading = "Limits"
    )]
    max_body_bytes: u64,
}

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<i32, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                return Ok(0);
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `webhook-echo --help` for usage."));
            }
        },
    };

    let config = serve_config_from_cli(cli)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to start runtime")
                .with_source(err)
        })?;
    runtime.block_on(serve::serve(config))?;
    Ok(0)
}

fn serve_config_from_cli(cli: Cli) -> Result<serve::ServeConfig, Error> {
    let bind: SocketAddr = cli.bind.parse().map_err(|_| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid bind address")
            .with_hint("Use a host:port value like 127.0.0.1:8000.")
    })?;
    Ok(serve::ServeConfig {
        bind,
        allow_non_loopback: cli.allow_non_loopback,
        max_body_bytes: cli.max_body_bytes,
    })
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error:").trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {}", error_message(err));
        if let Some(hint) = err.hint() {
            eprintln!("hint: {hint}");
        }
        for cause in error_causes(err) {
            eprintln!("caused by: {cause}");
        }
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

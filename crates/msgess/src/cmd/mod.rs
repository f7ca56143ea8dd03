use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgGroup, Args, Subcommand};
use msgess_frame::{CodecConfig, DEFAULT_MAX_MESSAGE_SIZE, MAX_MESSAGE_CLASS};
use msgess_transport::Endpoint;

use crate::exit::{frame_error, CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod echo;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Echo every received message back to its sender.
    Echo(EchoArgs),
    /// Send a single message.
    Send(SendArgs),
    /// Listen and print received messages.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Echo(args) => echo::run(args),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Codec settings shared by every subcommand that opens a connection.
#[derive(Args, Debug)]
pub struct CodecArgs {
    /// Send bodies uncompressed.
    #[arg(long, env = "MSGESS_NO_COMPRESS")]
    pub no_compress: bool,
    /// Largest accepted incoming body, in bytes.
    #[arg(
        long,
        env = "MSGESS_MAX_MESSAGE_SIZE",
        value_name = "BYTES",
        default_value_t = DEFAULT_MAX_MESSAGE_SIZE as i64,
        allow_negative_numbers = true
    )]
    pub max_message_size: i64,
}

impl CodecArgs {
    pub fn to_config(&self) -> CliResult<CodecConfig> {
        let max = CodecConfig::max_message_size_from_signed(self.max_message_size)
            .map_err(|err| frame_error("--max-message-size", err))?;
        CodecConfig::new(!self.no_compress, max).map_err(|err| frame_error("--max-message-size", err))
    }
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Endpoint to bind: host:port, tcp://host:port, unix:///path or a socket path.
    pub endpoint: Endpoint,
    #[command(flatten)]
    pub codec: CodecArgs,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("payload").required(true).args(["text", "json", "file"])))]
pub struct SendArgs {
    /// Endpoint to connect to.
    pub endpoint: Endpoint,
    /// Message class.
    #[arg(long, short = 'c', value_parser = message_class)]
    pub class: u32,
    /// Send a text message.
    #[arg(long)]
    pub text: Option<String>,
    /// Send a JSON array or JSON object message.
    #[arg(long)]
    pub json: Option<String>,
    /// Send the file contents as a binary message.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Wait for one reply and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub wait_timeout: Duration,
    #[command(flatten)]
    pub codec: CodecArgs,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Endpoint to bind.
    pub endpoint: Endpoint,
    /// Only print these message classes (comma-separated).
    #[arg(long, value_delimiter = ',', value_parser = message_class)]
    pub class: Option<Vec<u32>>,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
    #[command(flatten)]
    pub codec: CodecArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn message_class(input: &str) -> Result<u32, String> {
    let class: u32 = input
        .parse()
        .map_err(|_| format!("`{input}` is not a non-negative integer"))?;
    if class > MAX_MESSAGE_CLASS {
        return Err(format!("message class must be at most {MAX_MESSAGE_CLASS}"));
    }
    Ok(class)
}

fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    let (number, millis) = match input.strip_suffix("ms") {
        Some(number) => (number, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration: `{input}`"))?;
    if value == 0 {
        return Err("duration must be greater than zero".to_string());
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// First Ctrl-C stops after the current message; a second one exits at once.
pub(crate) fn install_ctrlc_handler() -> CliResult<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || {
        if !flag.swap(false, Ordering::SeqCst) {
            std::process::exit(130);
        }
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;
    Ok(running)
}

use std::env;
use std::io::{self, Read, Stdout, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing_subscriber::EnvFilter;

use vimcore::config;
use vimcore::host::RopeSurface;
use vimcore::key::{key_to_notation, parse_keys};
use vimcore::session;
use vimcore::{KeyInput, ProcessResult, VimBuffer};

fn print_version() {
    println!("vimcore {}", env!("CARGO_PKG_VERSION"));
}

fn print_usage() {
    eprintln!("vimcore - A modal Vim command and motion engine");
    eprintln!();
    eprintln!("Usage: vimcore --keys <KEYS> [FILE]");
    eprintln!("       vimcore --debug-keys");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]            Text to edit (stdin when omitted)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -k, --keys <KEYS> Keys to feed, in <C-x> notation (e.g. \"dw3j\")");
    eprintln!("  -h, --help        Print this help message");
    eprintln!("  -V, --version     Print version information");
    eprintln!("      --debug-keys  Print detected keys and their effect on a scratch buffer");
    eprintln!();
    eprintln!("Environment Variables:");
    eprintln!("  VIMCORE_LOG         Log filter written to stderr (e.g. debug, vimcore=trace)");
    eprintln!("  VIMCORE_CONFIG_DIR  Configuration directory override");
    eprintln!();
    eprintln!("Configuration:");
    if let Some(path) = config::config_path() {
        eprintln!("  Config file: {}", path.display());
    }
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  echo 'alpha beta' | vimcore --keys dw");
    eprintln!("  vimcore --keys 'ggdd:2d<CR>' notes.txt");
    eprintln!("  vimcore --debug-keys");
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("VIMCORE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

struct Args {
    keys: Option<String>,
    file: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args {
        keys: None,
        file: None,
    };
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-k" | "--keys" => {
                let keys = iter.next().context("--keys needs a value")?;
                parsed.keys = Some(keys.clone());
            }
            other if other.starts_with('-') => bail!("unknown option: {other}"),
            other => {
                if parsed.file.is_some() {
                    bail!("only one file can be edited");
                }
                parsed.file = Some(PathBuf::from(other));
            }
        }
    }
    Ok(parsed)
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return Ok(());
    }

    if args.iter().any(|a| a == "-V" || a == "--version") {
        print_version();
        return Ok(());
    }

    init_logging();

    let cfg = config::load_config().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        config::Config::default()
    });

    if args.iter().any(|a| a == "--debug-keys") {
        return run_debug_keys(&cfg);
    }

    let parsed = parse_args(&args)?;
    let Some(keys) = parsed.keys else {
        print_usage();
        bail!("--keys is required");
    };

    let text = match &parsed.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            text
        }
    };

    let mut buffer = VimBuffer::with_config(RopeSurface::new(&text), &cfg);
    if let Some(path) = &parsed.file {
        buffer.set_file_name(&path.display().to_string());
    }
    if cfg.editor.persist_registers {
        match session::load_registers() {
            Ok(saved) => session::restore(buffer.registers_mut(), &saved),
            Err(e) => eprintln!("Warning: Failed to load registers: {}", e),
        }
    }

    let result = buffer.process_keys(&parse_keys(&keys));

    if cfg.editor.persist_registers {
        if let Err(e) = session::save_registers(&session::snapshot(buffer.registers())) {
            eprintln!("Warning: Failed to save registers: {}", e);
        }
    }

    let mut stdout = io::stdout();
    stdout.write_all(buffer.surface().text().as_bytes())?;
    stdout.flush()?;

    if let Err(err) = result {
        bail!("{err}");
    }
    Ok(())
}

fn run_debug_keys(cfg: &config::Config) -> Result<()> {
    struct DebugTerminalGuard {
        stdout: Stdout,
    }

    impl DebugTerminalGuard {
        fn new() -> Result<Self> {
            enable_raw_mode()?;
            Ok(Self {
                stdout: io::stdout(),
            })
        }

        fn println(&mut self, line: &str) -> Result<()> {
            write!(self.stdout, "\r\n{line}")?;
            self.stdout.flush()?;
            Ok(())
        }
    }

    impl Drop for DebugTerminalGuard {
        fn drop(&mut self) {
            let _ = disable_raw_mode();
            let _ = self.stdout.flush();
        }
    }

    fn describe(result: &ProcessResult) -> String {
        match result {
            ProcessResult::Complete(run) => format!("ran {}", run.name),
            ProcessResult::Handled => "handled".to_string(),
            ProcessResult::NeedMoreInput => "waiting".to_string(),
            ProcessResult::Cancelled => "cancelled".to_string(),
            ProcessResult::Ignored => "ignored".to_string(),
            ProcessResult::Error(err) => format!("error: {err}"),
        }
    }

    let mut buffer = VimBuffer::with_config(RopeSurface::new(""), cfg);
    let mut guard = DebugTerminalGuard::new()?;
    guard.println("vimcore --debug-keys (press Ctrl+C to exit)")?;

    loop {
        match event::read()? {
            Event::Key(key) => {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    break;
                }
                let Some(input) = KeyInput::from_key_event(key) else {
                    continue;
                };
                let result = buffer.process(input);
                guard.println(&format!(
                    "Key: {:<10} {:<14} {:<24} {:?}",
                    key_to_notation(&input),
                    buffer.mode().label(),
                    describe(&result),
                    buffer.surface().text(),
                ))?;
            }
            Event::Resize(w, h) => {
                guard.println(&format!("Resize: {w}x{h}"))?;
            }
            Event::Paste(text) => {
                guard.println(&format!("Paste: {:?} ({} bytes)", text, text.len()))?;
            }
            _ => {}
        }
    }

    Ok(())
}

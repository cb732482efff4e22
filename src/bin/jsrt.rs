//! CLI tool for running scripts with jsrt
//!
//! Usage: jsrt [options] <script.js>
//!        jsrt [options] -e <source>
//!
//! Options:
//!   --config <file>         JSON runtime configuration
//!   --gc-threshold <n>      Allocations between collections (0 disables them)
//!   --max-depth <n>         Maximum call depth
//!   --timeout <ms>          Maximum execution time in milliseconds
//!   -e <source>             Evaluate the given source instead of a file
//!
//! Scripts get a global `print(...)` that writes its arguments to stdout.
//! Set RUST_LOG to see interpreter tracing on stderr.

use std::env;
use std::fs;
use std::path::PathBuf;

use jsrt::{Completion, Interpreter, JsError, JsValue, RuntimeConfig};

fn main() {
    init_tracing();
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    // Only initialize if RUST_LOG is set
    if std::env::var("RUST_LOG").is_ok() {
        let filter = EnvFilter::from_default_env();
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}

enum Input {
    File(PathBuf),
    Source(String),
}

struct Options {
    input: Input,
    config: RuntimeConfig,
}

fn parse_value<T: std::str::FromStr>(
    args: &[String],
    i: usize,
    option: &str,
) -> Result<T, String> {
    args.get(i)
        .ok_or_else(|| format!("{} requires a value", option))?
        .parse::<T>()
        .map_err(|_| format!("{} must be a non-negative integer", option))
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = env::args().collect();
    let program_name = args.first().map_or("jsrt", |s| s.as_str());

    let mut config_path: Option<PathBuf> = None;
    let mut gc_threshold: Option<usize> = None;
    let mut max_depth: Option<usize> = None;
    let mut timeout_ms: Option<u64> = None;
    let mut input: Option<Input> = None;

    let mut i = 1;
    while let Some(arg) = args.get(i) {
        match arg.as_str() {
            "--config" => {
                i += 1;
                let path = args
                    .get(i)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                config_path = Some(PathBuf::from(path));
            }
            "--gc-threshold" => {
                i += 1;
                gc_threshold = Some(parse_value(&args, i, "--gc-threshold")?);
            }
            "--max-depth" => {
                i += 1;
                max_depth = Some(parse_value(&args, i, "--max-depth")?);
            }
            "--timeout" => {
                i += 1;
                timeout_ms = Some(parse_value(&args, i, "--timeout")?);
            }
            "-e" => {
                i += 1;
                let source = args.get(i).ok_or_else(|| "-e requires a value".to_string())?;
                input = Some(Input::Source(source.clone()));
            }
            other if other.starts_with('-') => {
                return Err(format!("Unknown option: {}", other));
            }
            path => input = Some(Input::File(PathBuf::from(path))),
        }
        i += 1;
    }

    let input = input.ok_or_else(|| {
        format!(
            "Usage: {} [--config <file>] [--gc-threshold <n>] [--max-depth <n>] [--timeout <ms>] (<script.js> | -e <source>)",
            program_name
        )
    })?;

    // Command-line options override the config file
    let mut config = match config_path {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
            RuntimeConfig::from_json(&text).map_err(|e| e.to_string())?
        }
        None => RuntimeConfig::default(),
    };
    if let Some(threshold) = gc_threshold {
        config.gc_threshold = threshold;
    }
    if let Some(depth) = max_depth {
        config.max_call_depth = depth;
    }
    if timeout_ms.is_some() {
        config.timeout_ms = timeout_ms;
    }

    Ok(Options { input, config })
}

/// `print(...)`: arguments converted to strings, space separated
fn print(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        parts.push(interp.to_js_string(arg)?.to_string());
    }
    println!("{}", parts.join(" "));
    Ok(JsValue::Undefined)
}

/// Runs the script; `Ok(false)` means it threw.
fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let options = parse_args()?;

    // Only `-e` echoes the completion value
    let (source, name, echo) = match options.input {
        Input::File(path) => {
            let source = fs::read_to_string(&path)
                .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
            (source, path.display().to_string(), false)
        }
        Input::Source(source) => (source, "<eval>".to_string(), true),
    };

    let mut interp = Interpreter::with_config(options.config)?;
    interp.register_function("print", print, 1)?;

    match interp.evaluate(&source, None) {
        Completion::Throw(exception) => {
            let message = interp
                .to_js_string(&exception)
                .map(|s| s.to_string())
                .unwrap_or_else(|_| format!("{:?}", exception));
            let line = match &exception {
                JsValue::Object(error) => match interp.get(error, "line") {
                    Ok(JsValue::Number(line)) => format!(":{}", line),
                    _ => String::new(),
                },
                _ => String::new(),
            };
            eprintln!("Uncaught {}\n    at {}{}", message, name, line);
            Ok(false)
        }
        Completion::Normal(Some(value)) if echo && !value.is_undefined() => {
            println!("{}", interp.to_js_string(&value)?);
            Ok(true)
        }
        _ => Ok(true),
    }
}

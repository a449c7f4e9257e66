//! breakwater CLI - run snippets through the sandbox engine by hand
//!
//! This is a development harness around `breakwater-core`; the engine itself
//! is a library invoked in-process by a workflow engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use breakwater_core::{
    CodeRequest, ErrorPolicy, Executor, Language, SandboxConfig, validate,
};

#[derive(Parser)]
#[command(name = "breakwater")]
#[command(author, version, about = "Sandboxed execution of Python and JavaScript snippets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a snippet and print the structured result
    Run {
        /// Code to execute
        code: String,

        /// Snippet language
        #[arg(short, long, default_value = "python")]
        lang: String,

        /// Timeout in seconds (1-300); the engine default applies when omitted
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Upstream value bound to the conventional `input` variable (JSON)
        #[arg(short, long)]
        input: Option<String>,

        /// Extra context variables as key=JSON (bare text counts as a string)
        #[arg(short, long)]
        context: Vec<String>,

        /// Fold failures into a degraded string output instead of failing
        #[arg(long)]
        continue_on_error: bool,

        /// Path to the Python interpreter
        #[arg(long)]
        python: Option<PathBuf>,

        /// Path to the JavaScript runtime
        #[arg(long)]
        node: Option<PathBuf>,
    },

    /// Validate a snippet without executing it
    Check {
        /// Code to validate
        code: String,

        /// Snippet language
        #[arg(short, long, default_value = "python")]
        lang: String,
    },
}

fn parse_language(lang: &str) -> Result<Language, String> {
    match lang {
        "python" | "py" => Ok(Language::Python),
        "javascript" | "js" => Ok(Language::JavaScript),
        other => Err(format!("unknown language '{other}' (python, javascript)")),
    }
}

/// `key=value` context argument; the value is parsed as JSON, with a bare
/// string fallback so `--context name=world` works without quoting.
fn parse_context_arg(arg: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("context argument '{arg}' is not key=value"))?;
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("breakwater=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            code,
            lang,
            timeout,
            input,
            context,
            continue_on_error,
            python,
            node,
        } => {
            let language = parse_language(&lang)?;

            let mut builder = SandboxConfig::builder();
            if let Some(path) = python {
                builder = builder.python_path(path);
            }
            if let Some(path) = node {
                builder = builder.node_path(path);
            }
            let policy = if continue_on_error {
                ErrorPolicy::ContinueOnError
            } else {
                ErrorPolicy::FailFast
            };
            let executor = Executor::with_policy(builder.build(), policy);

            let mut request = CodeRequest::new(language, code);
            if let Some(secs) = timeout {
                request = request.timeout_secs(secs);
            }
            if let Some(input) = input {
                request = request.input(serde_json::from_str(&input)?);
            }
            for arg in &context {
                let (key, value) = parse_context_arg(arg)?;
                request = request.var(key, value);
            }

            let result = executor.run(&request)?;
            if !result.stdout.is_empty() {
                print!("{}", result.stdout);
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "success": result.success,
                    "output": result.output,
                    "error": result.error,
                    "duration_ms": result.duration.as_millis() as u64,
                }))?
            );
        }

        Commands::Check { code, lang } => {
            let language = parse_language(&lang)?;
            match validate::validate(&code, language) {
                None => println!("ok"),
                Some(message) => {
                    eprintln!("{message}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

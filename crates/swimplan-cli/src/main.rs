mod config;
mod generate_cmd;
mod input;
mod plan_cmds;
#[cfg(test)]
mod test_util;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use config::{LlmFlags, SwimplanConfig};

#[derive(Parser)]
#[command(name = "swimplan", about = "LLM-backed swim session planner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// LLM settings; each overrides its env var and the config file.
#[derive(Args, Debug, Default)]
struct LlmArgs {
    /// LLM provider: anthropic or claude-cli
    #[arg(long)]
    provider: Option<String>,
    /// Model identifier
    #[arg(long)]
    model: Option<String>,
    /// Per-call timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Path to the claude binary (claude-cli provider)
    #[arg(long)]
    claude_binary: Option<String>,
}

impl From<LlmArgs> for LlmFlags {
    fn from(args: LlmArgs) -> Self {
        Self {
            provider: args.provider,
            model: args.model,
            timeout_secs: args.timeout_secs,
            claude_binary: args.claude_binary,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a swimplan config file
    Init {
        /// LLM provider: anthropic or claude-cli
        #[arg(long, default_value = "anthropic")]
        provider: String,
        /// Model identifier
        #[arg(long)]
        model: Option<String>,
        /// Per-call timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Generate a plan from a planner input JSON document
    Generate {
        /// Input file (reads stdin when omitted or "-")
        input: Option<String>,
        /// Seed for reproducible plan ids and timestamps
        #[arg(long)]
        seed: Option<u64>,
        /// Pretty-print the plan JSON
        #[arg(long)]
        pretty: bool,
        #[command(flatten)]
        llm: LlmArgs,
    },
    /// Print the generation instruction for an input without calling an LLM
    Prompt {
        /// Input file (reads stdin when omitted or "-")
        input: Option<String>,
        /// Also print the system instruction
        #[arg(long)]
        system: bool,
    },
    /// Normalize and validate a plan JSON document against a request
    Check {
        /// Plan JSON file
        plan: String,
        /// Planner input JSON file the plan answers
        #[arg(long)]
        request: String,
    },
    /// Print the canonical text rendering of a plan JSON document
    Render {
        /// Plan JSON file (reads stdin when omitted or "-")
        plan: Option<String>,
        /// Planner input JSON file, used for defaults
        #[arg(long)]
        request: Option<String>,
    },
}

/// Execute the `swimplan init` command: write config file.
fn cmd_init(
    provider: &str,
    model: Option<String>,
    timeout_secs: Option<u64>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let provider: config::Provider = provider.parse()?;
    let cfg = config::ConfigFile {
        llm: config::LlmSection {
            provider: Some(provider.as_str().to_string()),
            model,
            timeout_secs,
            max_tokens: None,
            claude_binary: None,
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  llm.provider = {}", provider.as_str());
    if let Some(model) = &cfg.llm.model {
        println!("  llm.model = {model}");
    }
    if provider == config::Provider::Anthropic {
        println!();
        println!("Set ANTHROPIC_API_KEY in the environment or a .env file before running `swimplan generate`.");
    }

    Ok(())
}

/// Load `.env.local` then `.env`; neither overrides variables already set.
fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            provider,
            model,
            timeout_secs,
            force,
        } => {
            cmd_init(&provider, model, timeout_secs, force)?;
        }
        Commands::Generate {
            input,
            seed,
            pretty,
            llm,
        } => {
            let resolved = SwimplanConfig::resolve(&llm.into())?;
            let request = input::read_request(input.as_deref())?;
            if let Err(e) = generate_cmd::run_generate(&resolved, &request, seed, pretty).await {
                eprintln!("{e:#}");
                std::process::exit(1);
            }
        }
        Commands::Prompt { input, system } => {
            let request = input::read_request(input.as_deref())?;
            println!("{}", plan_cmds::prompt_text(&request, system));
        }
        Commands::Check { plan, request } => {
            let request = input::read_request(Some(request.as_str()))?;
            let plan_text = input::read_text(Some(plan.as_str()))?;
            match plan_cmds::check_plan_text(&plan_text, &request, None) {
                Ok(summary) => println!("{summary}"),
                Err(e) => {
                    eprintln!("{plan}: {e:#}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Render { plan, request } => {
            let request = request
                .as_deref()
                .map(|path| input::read_request(Some(path)))
                .transpose()?;
            let plan_text = input::read_text(plan.as_deref())?;
            let text = plan_cmds::render_plan_text(&plan_text, request.as_ref())
                .with_context(|| format!("failed to render {}", plan.as_deref().unwrap_or("stdin")))?;
            print!("{text}");
        }
    }

    Ok(())
}

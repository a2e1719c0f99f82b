use anyhow::{Context, Result};
use budgetbite::config::{load_config, Config};
use budgetbite::ollama::OllamaClient;
use budgetbite::pipeline::{load_meals, render_meal_list, run, RunOptions};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "budgetbite")]
#[command(version)]
#[command(about = "Pick meals, get a consolidated grocery list and a store cost estimate from a local LLM")]
struct Cli {
    /// Config file (default: ./.budgetbite.json, then the user config dir)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Meals document (.docx or plain text)
    #[arg(long, value_name = "PATH")]
    meals: Option<PathBuf>,

    /// Store inventory document (.docx or plain text)
    #[arg(long, value_name = "PATH")]
    inventory: Option<PathBuf>,

    /// Ollama model tag
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,

    /// Ollama base URL
    #[arg(long, value_name = "URL")]
    host: Option<String>,

    /// Store name used in prompts
    #[arg(long, value_name = "NAME")]
    store: Option<String>,

    /// Maximum number of meals to select
    #[arg(long, value_name = "N")]
    max_selection: Option<usize>,

    /// Minimum similarity (0.0-1.0) for fuzzy meal-name matches
    #[arg(long, value_name = "RATIO")]
    similarity_cutoff: Option<f64>,

    /// Comma-separated selection; skips the interactive prompt
    #[arg(long, short = 's', value_name = "MEALS")]
    select: Option<String>,

    /// Print the numbered meal list and exit
    #[arg(long)]
    list: bool,

    /// Debug logging to stderr (RUST_LOG overrides)
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    fn apply(&self, cfg: &mut Config) -> Result<()> {
        if let Some(p) = &self.meals {
            cfg.meals_path = p.clone();
        }
        if let Some(p) = &self.inventory {
            cfg.inventory_path = p.clone();
        }
        if let Some(m) = &self.model {
            cfg.model = m.clone();
        }
        if let Some(h) = &self.host {
            cfg.ollama.host = h.clone();
        }
        if let Some(s) = &self.store {
            cfg.store_name = s.clone();
        }
        if let Some(n) = self.max_selection {
            anyhow::ensure!(n > 0, "--max-selection must be at least 1");
            cfg.selection.max_selection = n;
        }
        if let Some(c) = self.similarity_cutoff {
            anyhow::ensure!((0.0..=1.0).contains(&c), "--similarity-cutoff must be between 0.0 and 1.0");
            cfg.selection.similarity_cutoff = c;
        }
        Ok(())
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "budgetbite=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn execute(cli: Cli) -> Result<()> {
    let work_dir = std::env::current_dir().context("Failed to get current dir")?;
    let mut cfg = load_config(&work_dir, cli.config.as_deref());
    cli.apply(&mut cfg)?;
    cfg.validate()?;

    if cli.list {
        let meals = load_meals(&cfg)?;
        print!("{}", render_meal_list(&meals));
        return Ok(());
    }

    let client = OllamaClient::new(&cfg.ollama, &cfg.model);
    let opts = RunOptions {
        selection: cli.select.clone(),
        show_progress: std::io::stderr().is_terminal(),
    };

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();
    let mut err = std::io::stderr();
    run(&cfg, &client, &mut input, &mut out, &mut err, &opts)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\nERROR: {e:#}");
            ExitCode::from(1)
        }
    }
}

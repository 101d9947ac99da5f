//! asset-lint CLI - convention checker for Gazebo model packages

use anyhow::{Context, Result};
use asset_lint::config::{ColorMode, Config, DetectionMode, OutputFormat};
use asset_lint::engine::Engine;
use asset_lint::output::{JsonFormatter, OutputFormatter, TextFormatter};
use asset_lint::rule::Rule;
use asset_lint::rules::RuleId;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::warn;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "asset-lint",
    version,
    about = "Gazebo model package linter",
    long_about = "Checks model packages for naming, layout, metadata, texture and material conventions, and optionally fixes what can be fixed."
)]
struct Cli {
    /// Root folders to scan for model packages
    #[arg(required_unless_present_any = ["list_rules", "explain"])]
    roots: Vec<PathBuf>,

    /// Show help text, proposed fixes and passing models
    #[arg(short, long)]
    verbose: bool,

    /// Apply available fixes, then re-check
    #[arg(short, long)]
    fix: bool,

    /// Check fix preconditions without writing anything (requires --fix)
    #[arg(long, requires = "fix")]
    dry_run: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Disable specific rules (comma-separated)
    #[arg(long, value_delimiter = ',')]
    disable: Option<Vec<String>>,

    /// Only enable specific rules (comma-separated)
    #[arg(long, value_delimiter = ',')]
    select: Option<Vec<String>>,

    /// Texture channel names (comma-separated)
    #[arg(long, value_delimiter = ',')]
    channels: Option<Vec<String>>,

    /// How packages are recognised
    #[arg(long, value_enum)]
    detect: Option<Detect>,

    /// List available rules and exit
    #[arg(long)]
    list_rules: bool,

    /// Show detailed information about a rule
    #[arg(long)]
    explain: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Detect {
    /// Directories containing model.config, at any depth
    ConfigFile,
    /// Every immediate child directory of the root
    Children,
}

/// One line per rule for --list-rules
fn print_rule(rule: &Rule) {
    let fixable = if rule.fixable {
        " (fixable)".green().to_string()
    } else {
        String::new()
    };
    println!(
        "  {:<20} {}{}",
        rule.id.as_str().cyan(),
        rule.description,
        fixable
    );
}

/// Print detailed rule explanation
fn explain_rule(rule: &Rule) {
    println!("{}", "Rule Details".bold());
    println!();
    println!("  {}: {}", "ID".bold(), rule.id.as_str().cyan());
    println!("  {}: {}", "Severity".bold(), "error".red());

    println!();
    println!("  {}", "Description".bold());
    println!("  {}", rule.description);

    if let Some(rationale) = &rule.rationale {
        println!();
        println!("  {}", "Rationale".bold());
        println!("  {}", rationale);
    }

    if let Some(bad) = &rule.example_bad {
        println!();
        println!("  {} {}", "Example".bold(), "(incorrect)".red());
        for line in bad.lines() {
            println!("    {}", line);
        }
    }

    if let Some(good) = &rule.example_good {
        println!();
        println!("  {} {}", "Example".bold(), "(correct)".green());
        for line in good.lines() {
            println!("    {}", line);
        }
    }

    if rule.fixable {
        println!();
        println!("  {}", "Auto-fix Available".bold());
    }
}

/// Reject rule names that do not exist
fn parse_rule_names(names: &[String]) -> Result<Vec<String>> {
    names
        .iter()
        .map(|name| {
            name.trim()
                .parse::<RuleId>()
                .map(|id| id.as_str().to_string())
                .map_err(anyhow::Error::msg)
        })
        .collect()
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load_default().unwrap_or_else(|e| {
            warn!("Ignoring unreadable default config: {}", e);
            Config::default()
        }),
    };

    let format = cli.format.map(|f| match f {
        Format::Text => OutputFormat::Text,
        Format::Json => OutputFormat::Json,
    });
    let disabled = cli.disable.as_deref().map(parse_rule_names).transpose()?;
    let enabled = cli.select.as_deref().map(parse_rule_names).transpose()?;
    config.merge_cli(
        format,
        cli.verbose.then_some(true),
        cli.jobs,
        disabled,
        enabled,
    );

    if let Some(channels) = &cli.channels {
        config.textures.channels = channels.iter().map(|c| c.trim().to_string()).collect();
    }
    if let Some(detect) = cli.detect {
        config.detection = match detect {
            Detect::ConfigFile => DetectionMode::ConfigFile,
            Detect::Children => DetectionMode::Children,
        };
    }
    if cli.no_color {
        config.output.color = ColorMode::Never;
    }

    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<i32> {
    if let Some(rule_id) = &cli.explain {
        let id: RuleId = rule_id.parse().map_err(anyhow::Error::msg)?;
        explain_rule(&id.rule());
        return Ok(0);
    }

    if cli.list_rules {
        println!("{}", "Available rules:".bold());
        println!();
        for id in RuleId::ALL {
            print_rule(&id.rule());
        }
        return Ok(0);
    }

    let config = load_config(cli)?;
    match config.output.color {
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Auto => {}
    }

    let formatter: Box<dyn OutputFormatter> = match config.output.format {
        OutputFormat::Text => {
            let mut text = TextFormatter::new().verbose(config.output.verbose);
            text.show_stats = config.output.statistics;
            if config.output.color == ColorMode::Never {
                text = text.without_color();
            }
            Box::new(text)
        }
        OutputFormat::Json => Box::new(JsonFormatter::new().pretty()),
    };

    let engine = Engine::new(config)
        .context("invalid configuration")?
        .with_dry_run(cli.dry_run);

    let mut exit_code = 0;
    for root in &cli.roots {
        match engine.run(root, cli.fix) {
            Ok(report) => {
                print!("{}", formatter.format(&report));
                if engine.config().output.format == OutputFormat::Json {
                    println!();
                }
                exit_code = exit_code.max(report.exit_code());
            }
            Err(e) => {
                eprintln!("{}: {}", "error".red().bold(), e);
                exit_code = 2;
            }
        }
    }

    Ok(exit_code)
}

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            std::process::exit(2);
        }
    }
}

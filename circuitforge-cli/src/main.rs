//! CircuitForge CLI - circuit descriptions to SPICE netlists and schematic SVGs.

use anyhow::Context;
use circuitforge::export::export_to_file;
use circuitforge::{
    CircuitForgeCore, ComponentKind, ForgeConfig, Generation, GenerationOptions, Issue,
    Rule, RulesEngine, Severity, Theme, Translator,
};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "circuitforge")]
#[command(about = "Generate SPICE netlists and schematic SVGs from circuit descriptions", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON config file (environment variables still override it)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a netlist and schematic from a description
    Generate {
        /// Circuit description, e.g. "5V battery with 100 ohm resistor and 10uF capacitor"
        #[arg(value_name = "DESCRIPTION")]
        prompt: String,

        /// Write the schematic SVG here
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Write the cleaned netlist here
        #[arg(long, value_name = "FILE")]
        netlist: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// SVG color theme
        #[arg(long, value_enum, default_value = "download")]
        theme: ThemeArg,

        /// Send the description to the model without rewriting it
        #[arg(long)]
        no_normalize: bool,

        /// Count warnings as critical
        #[arg(long)]
        strict: bool,

        /// Exit with error code if issues found at this severity or higher
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,
    },

    /// Render a netlist file; the SVG goes to stdout unless -o is given
    Render {
        /// Netlist file, or - for stdin
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the schematic SVG here
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format of the report; json requires -o
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// SVG color theme
        #[arg(long, value_enum, default_value = "download")]
        theme: ThemeArg,

        /// Parse the file as is, without the model-output cleaner
        #[arg(long)]
        no_clean: bool,

        /// Count warnings as critical
        #[arg(long)]
        strict: bool,

        /// Exit with error code if issues found at this severity or higher
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,
    },

    /// Check a netlist file without rendering it
    Check {
        /// Netlist file, or - for stdin
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Only run these rules (comma separated ids)
        #[arg(long, value_delimiter = ',')]
        rules: Vec<String>,

        /// Count warnings as critical
        #[arg(long)]
        strict: bool,

        /// Exit with error code if issues found at this severity or higher
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,
    },

    /// List recognized component kinds
    Components,

    /// List netlist check rules
    Rules,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    /// Light strokes on a transparent background
    Display,
    /// Black on white
    Download,
}

impl From<ThemeArg> for Theme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Display => Theme::Display,
            ThemeArg::Download => Theme::Download,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FailOnSeverity {
    Critical,
    High,
    Medium,
    Low,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            prompt,
            output,
            netlist,
            format,
            theme,
            no_normalize,
            strict,
            fail_on,
        } => {
            let options = GenerationOptions {
                normalize_prompt: !no_normalize,
                strict_mode: strict,
                ..GenerationOptions::default()
            };
            handle_generate(
                cli.config.as_deref(),
                &prompt,
                &options,
                Outputs {
                    svg: output,
                    netlist,
                    theme: theme.into(),
                },
                format,
                fail_on,
            )
            .await
        }
        Commands::Render {
            file,
            output,
            format,
            theme,
            no_clean,
            strict,
            fail_on,
        } => {
            let options = GenerationOptions {
                clean_output: !no_clean,
                strict_mode: strict,
                ..GenerationOptions::default()
            };
            handle_render(&file, &options, output, theme.into(), format, fail_on)
        }
        Commands::Check {
            file,
            format,
            rules,
            strict,
            fail_on,
        } => {
            let options = GenerationOptions {
                strict_mode: strict,
                rules,
                ..GenerationOptions::default()
            };
            handle_check(&file, &options, format, fail_on)
        }
        Commands::Components => {
            handle_components();
            Ok(0)
        }
        Commands::Rules => {
            handle_rules();
            Ok(0)
        }
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

struct Outputs {
    svg: Option<PathBuf>,
    netlist: Option<PathBuf>,
    theme: Theme,
}

async fn handle_generate(
    config_path: Option<&Path>,
    prompt: &str,
    options: &GenerationOptions,
    outputs: Outputs,
    format: OutputFormat,
    fail_on: Option<FailOnSeverity>,
) -> anyhow::Result<i32> {
    let config = ForgeConfig::load(config_path).context("failed to load configuration")?;
    let translator = Translator::init_global(&config);

    let generation = CircuitForgeCore::generate(translator, prompt, options).await?;

    if let Some(path) = &outputs.netlist {
        std::fs::write(path, format!("{}\n", generation.netlist_text))
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    // The report is printed even when the SVG cannot be saved.
    let saved = outputs
        .svg
        .as_deref()
        .map(|path| save_svg(&generation, outputs.theme, path));
    let svg_path = match &saved {
        Some(Ok(())) => outputs.svg.as_deref(),
        _ => None,
    };
    output_generation(&generation, svg_path, format)?;
    if let Some(Err(e)) = saved {
        return Err(e);
    }
    Ok(exit_code(&generation, fail_on))
}

fn handle_render(
    file: &Path,
    options: &GenerationOptions,
    output: Option<PathBuf>,
    theme: Theme,
    format: OutputFormat,
    fail_on: Option<FailOnSeverity>,
) -> anyhow::Result<i32> {
    if output.is_none() && matches!(format, OutputFormat::Json) {
        anyhow::bail!("--format json needs -o; without it the SVG itself is written to stdout");
    }
    let text = read_input(file)?;
    let generation = CircuitForgeCore::from_netlist(&text, options);

    match &output {
        Some(path) => {
            let saved = save_svg(&generation, theme, path);
            let svg_path = saved.is_ok().then_some(path.as_path());
            output_generation(&generation, svg_path, format)?;
            saved?;
        }
        None => print!("{}", generation.svg(theme)?),
    }
    Ok(exit_code(&generation, fail_on))
}

fn handle_check(
    file: &Path,
    options: &GenerationOptions,
    format: OutputFormat,
    fail_on: Option<FailOnSeverity>,
) -> anyhow::Result<i32> {
    let text = read_input(file)?;
    let generation = CircuitForgeCore::from_netlist(&text, options);

    match format {
        OutputFormat::Human => {
            println!("\nNetlist: {}", file.display());
            println!("{}", "─".repeat(60));
            output_issues(&generation);
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "file": file.display().to_string(),
                "components": generation.components,
                "issues": generation.issues,
                "stats": generation.stats,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(exit_code(&generation, fail_on))
}

fn read_input(file: &Path) -> anyhow::Result<String> {
    if file == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read netlist from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))
}

fn save_svg(generation: &Generation, theme: Theme, path: &Path) -> anyhow::Result<()> {
    export_to_file(&generation.drawing, theme, path)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn exit_code(generation: &Generation, fail_on: Option<FailOnSeverity>) -> i32 {
    match fail_on {
        Some(severity) if should_fail(generation, severity) => 1,
        _ => 0,
    }
}

fn should_fail(generation: &Generation, severity: FailOnSeverity) -> bool {
    let stats = &generation.stats;
    match severity {
        FailOnSeverity::Critical => stats.critical > 0,
        FailOnSeverity::High => generation.has_high_or_critical(),
        FailOnSeverity::Medium => stats.critical > 0 || stats.high > 0 || stats.medium > 0,
        FailOnSeverity::Low => generation.total_issues() > 0,
    }
}

fn output_generation(
    generation: &Generation,
    svg_path: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Human => {
            output_human(generation, svg_path);
            Ok(())
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "generation": generation,
                "svg_file": svg_path.map(|p| p.display().to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
    }
}

fn output_human(generation: &Generation, svg_path: Option<&Path>) {
    if !generation.prompt.is_empty() {
        println!("\nDescription: {}", generation.prompt);
        if let Some(sentence) = &generation.normalized_prompt {
            println!("Model input: {}", sentence);
        }
    }

    println!("\nNetlist:");
    println!("{}", "─".repeat(60));
    for line in generation.netlist_text.lines() {
        println!("  {}", line);
    }

    println!("\nComponents:");
    println!("{}", "─".repeat(60));
    if generation.components.is_empty() {
        println!("  None");
    } else {
        println!("  {:<8} {:<18} {:<16} {}", "REF", "TYPE", "NODES", "VALUE");
        for row in &generation.components {
            println!(
                "  {:<8} {:<18} {:<16} {}",
                row.reference,
                row.kind,
                row.nodes.join(" "),
                row.value
            );
        }
    }

    println!("\nChecks:");
    println!("{}", "─".repeat(60));
    output_issues(generation);

    if let Some(path) = svg_path {
        println!("\nSchematic written to {}", path.display());
    }
}

fn output_issues(generation: &Generation) {
    if generation.total_issues() == 0 {
        println!("  No issues found");
        return;
    }

    let groups = [
        ("CRITICAL", Severity::Error),
        ("HIGH", Severity::Warning),
        ("MEDIUM", Severity::Suggestion),
        ("LOW", Severity::Info),
    ];
    for (title, severity) in groups {
        let issues: Vec<&Issue> = generation
            .issues
            .iter()
            .filter(|i| i.severity == severity)
            .collect();
        if issues.is_empty() {
            continue;
        }
        println!("\n  {}:", title);
        for issue in issues {
            println!("    - {}", issue.message);
            if let Some(line) = issue.line {
                println!("      Line: {}", line);
            }
            if let Some(suggestion) = &issue.suggestion {
                println!("      Fix: {}", suggestion);
            }
        }
    }

    let stats = &generation.stats;
    println!("\n  Summary:");
    println!("    Critical: {}", stats.critical);
    println!("    High:     {}", stats.high);
    println!("    Medium:   {}", stats.medium);
    println!("    Low:      {}", stats.low);
}

fn handle_components() {
    println!("Recognized components:\n");
    println!("  {:<10} {:<18} {:<10} {}", "PREFIX", "KIND", "TERMINALS", "FIELD");
    for kind in ComponentKind::ALL {
        let field = if kind.takes_value() {
            "value"
        } else if kind.takes_model() {
            "model"
        } else {
            "-"
        };
        let terminals = match kind.max_terminals() {
            usize::MAX => format!("{}+", kind.terminal_count()),
            max if max > kind.terminal_count() => format!("{}-{}", kind.terminal_count(), max),
            _ => kind.terminal_count().to_string(),
        };
        println!(
            "  {:<10} {:<18} {:<10} {}",
            kind.prefix(),
            kind.name(),
            terminals,
            field
        );
    }
}

fn handle_rules() {
    println!("Netlist check rules:\n");
    let engine = RulesEngine::with_default_rules();
    for rule in engine.rules() {
        println!("  {}", rule.id());
        println!("    {} ({})", rule.name(), rule.severity().label());
        println!();
    }
}

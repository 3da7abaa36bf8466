//! Copyforge - staged LLM article generation for a structured CMS.
//!
//! Drafts, critiques and finalizes articles for a chosen archetype, then
//! checks the HTML against the CMS document schema.

#![allow(clippy::single_match_else)]

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use copyforge::{ArchetypeRegistry, Config, ValidationReport, Validator};

/// Staged LLM article generation with CMS structural validation
#[derive(Parser)]
#[command(name = "copyforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default lookup
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available archetypes
    Archetypes {
        /// Show the full definition of one archetype
        id: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate an article (draft, critique, final)
    #[cfg(feature = "http")]
    Generate {
        /// Archetype id
        archetype: String,

        /// Main keyword
        keyword: String,

        /// Archetype field value (name=value), repeatable
        #[arg(short = 'F', long = "field", value_parser = parse_key_val)]
        fields: Vec<(String, String)>,

        /// Target length in words (archetype default when omitted)
        #[arg(short, long)]
        target: Option<usize>,

        /// Analyze the top organic results and write a competitive rewrite
        #[arg(long)]
        rewrite: bool,

        /// Secondary keyword, repeatable
        #[arg(long = "secondary")]
        secondary: Vec<String>,

        /// Internal link to include, repeatable
        #[arg(long = "internal-link")]
        internal_links: Vec<String>,

        /// External link to include, repeatable
        #[arg(long = "external-link")]
        external_links: Vec<String>,

        /// Extra instructions for the writer
        #[arg(long)]
        instructions: Option<String>,

        /// Product sheet (JSON export) to ground the article on
        #[arg(long, value_name = "FILE")]
        product_json: Option<PathBuf>,

        /// Address the reader formally
        #[arg(long)]
        formal: bool,

        /// Keep humor out of the article
        #[arg(long)]
        no_humor: bool,

        /// Write the final HTML to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Analyze the competition for a keyword
    #[cfg(feature = "http")]
    Analyze {
        /// Keyword to analyze
        keyword: String,

        /// Diff against this archetype's structural hints
        #[arg(short, long)]
        archetype: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Validate HTML against the CMS rules
    Validate {
        /// HTML file, or - for stdin
        file: PathBuf,

        /// Archetype the article was written for
        #[arg(short, long)]
        archetype: String,

        /// Target length in words (archetype default when omitted)
        #[arg(short, long)]
        target: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s.split_once('=').ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    Ok((key.trim().to_string(), value.to_string()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env before reading API keys
    dotenvy::dotenv().ok();

    // Setup logging
    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Archetypes { id, format } => {
            cmd_archetypes(id.as_deref(), format)?;
        }
        #[cfg(feature = "http")]
        Commands::Generate {
            archetype,
            keyword,
            fields,
            target,
            rewrite,
            secondary,
            internal_links,
            external_links,
            instructions,
            product_json,
            formal,
            no_humor,
            output,
            format,
        } => {
            let options = GenerateOptions {
                archetype,
                keyword,
                fields,
                target,
                rewrite,
                secondary,
                internal_links,
                external_links,
                instructions,
                product_json,
                formal,
                no_humor,
                output,
                format,
            };
            cmd_generate(cli.config.as_deref(), options)?;
        }
        #[cfg(feature = "http")]
        Commands::Analyze { keyword, archetype, format } => {
            cmd_analyze(cli.config.as_deref(), &keyword, archetype.as_deref(), format)?;
        }
        Commands::Validate { file, archetype, target, format } => {
            let pass = cmd_validate(cli.config.as_deref(), &file, &archetype, target, format)?;
            if !pass {
                std::process::exit(1);
            }
        }
        Commands::Config { path } => {
            cmd_config(cli.config.as_deref(), path)?;
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path),
        None => Config::load(),
    }
}

/// List archetypes.
fn cmd_archetypes(id: Option<&str>, format: OutputFormat) -> Result<()> {
    let registry = ArchetypeRegistry::builtin();

    if let Some(id) = id {
        let archetype = registry.get(id)?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&*archetype)?),
            OutputFormat::Text => {
                println!("{} - {}", archetype.id, archetype.name);
                println!("{}\n", archetype.description);
                println!(
                    "Words: {}-{} (default {})",
                    archetype.words.min, archetype.words.max, archetype.words.default
                );
                println!("\nFields:");
                for field in &archetype.fields {
                    let marker = if field.required { "*" } else { " " };
                    println!(
                        "  {}{:<18} {:?}  {}",
                        marker,
                        field.name,
                        field.kind,
                        field.help.as_deref().unwrap_or("")
                    );
                }
                println!("\nStructure:");
                for hint in &archetype.hints {
                    println!("  - {}", hint.description);
                }
                let required: Vec<&str> = archetype.required_elements.iter().map(|e| e.label()).collect();
                println!("\nRequired blocks: {}", required.join(", "));
                println!(
                    "Links: at least {} internal, {} external",
                    archetype.links.min_internal, archetype.links.min_external
                );
            }
        }
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            let all: Vec<_> = registry.list().iter().map(|a| &**a).collect();
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
        OutputFormat::Text => {
            for archetype in registry.list() {
                println!(
                    "{:<16} {:<34} {}-{} words",
                    archetype.id, archetype.name, archetype.words.min, archetype.words.max
                );
            }
            println!("\nTotal: {} archetypes", registry.len());
        }
    }

    Ok(())
}

#[cfg(feature = "http")]
struct GenerateOptions {
    archetype: String,
    keyword: String,
    fields: Vec<(String, String)>,
    target: Option<usize>,
    rewrite: bool,
    secondary: Vec<String>,
    internal_links: Vec<String>,
    external_links: Vec<String>,
    instructions: Option<String>,
    product_json: Option<PathBuf>,
    formal: bool,
    no_humor: bool,
    output: Option<PathBuf>,
    format: OutputFormat,
}

/// Run the full pipeline.
#[cfg(feature = "http")]
fn cmd_generate(config_path: Option<&Path>, options: GenerateOptions) -> Result<()> {
    use copyforge::request::Addressing;
    use copyforge::{CancellationFlag, Engine, GenerationRequest, LinkKind, LinkSpec, ProductData, ToneParams};

    let config = load_config(config_path)?;
    let engine = Engine::from_config(&config)?;
    let archetype = engine.archetype(&options.archetype)?;
    let product = match options.product_json {
        Some(ref path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))?;
            Some(ProductData::from_json(&json)?)
        }
        None => None,
    };

    let cancel = CancellationFlag::new();
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nCancelling after the current stage...");
        handler_flag.cancel();
    })?;

    // Create tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let tone = ToneParams {
            addressing: if options.formal { Addressing::Formal } else { Addressing::Informal },
            humor: !options.no_humor,
            notes: Vec::new(),
        };

        let mut builder = GenerationRequest::builder(archetype.clone(), options.keyword.clone())
            .fields(options.fields)
            .tone(tone)
            .secondary_keywords(options.secondary);
        if let Some(target) = options.target {
            builder = builder.target_length(target);
        }
        if let Some(instructions) = options.instructions {
            builder = builder.instructions(instructions);
        }
        if let Some(product) = product {
            builder = builder.product(product);
        }
        for url in options.internal_links {
            builder = builder.link(LinkSpec { url, anchor: String::new(), kind: LinkKind::Internal });
        }
        for url in options.external_links {
            builder = builder.link(LinkSpec { url, anchor: String::new(), kind: LinkKind::External });
        }

        if options.rewrite {
            eprintln!("Analyzing competitors for \"{}\"...", options.keyword);
            let context = engine.analyze_competitors_for(&options.keyword, &archetype.id).await?;
            eprintln!(
                "  {} analyzed, {} skipped",
                context.competitors.len(),
                context.skipped.len()
            );
            builder = builder.rewrite(context);
        }

        let request = builder.build()?;
        eprintln!("Generating {} ({} words)...", archetype.id, request.target_length());

        let run = match engine.run_generation_with_cancel(&request, &cancel).await {
            Ok(run) => run,
            Err(failure) => {
                if options.format == OutputFormat::Json {
                    println!("{}", serde_json::to_string_pretty(&failure)?);
                }
                return Err(failure.into());
            }
        };
        let html = run.final_html().unwrap_or_default();
        let report = engine.validate_request(html, &request);

        if let Some(ref path) = options.output {
            std::fs::write(path, html)?;
            eprintln!("Wrote {}", path.display());
        }

        match options.format {
            OutputFormat::Json => {
                let output = serde_json::json!({ "run": &run, "validation": &report });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if options.output.is_none() {
                    println!("{html}");
                }
                for stage in run.stages() {
                    eprintln!(
                        "  {:<8} {:>6} words  ~{:>5} tokens  {} call(s)  {}ms",
                        stage.stage.as_str(),
                        stage.metrics.words,
                        stage.metrics.approx_tokens,
                        stage.metrics.attempts,
                        stage.metrics.elapsed_ms
                    );
                }
                print_report(&report, &archetype.id, &mut io::stderr())?;
            }
        }

        Ok::<(), anyhow::Error>(())
    })
}

/// Run a competitive analysis.
#[cfg(feature = "http")]
fn cmd_analyze(
    config_path: Option<&Path>,
    keyword: &str,
    archetype: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    use std::sync::Arc;

    use copyforge::competitive::{HttpFetcher, SemrushSearch};
    use copyforge::CompetitiveAnalyzer;

    let config = load_config(config_path)?;
    let archetype = archetype.map(|id| ArchetypeRegistry::builtin().get(id)).transpose()?;
    let analyzer = CompetitiveAnalyzer::from_config(
        Arc::new(SemrushSearch::new(config.competitive.database.clone())?),
        Arc::new(HttpFetcher::new(&config.competitive)),
        &config.competitive,
    );

    // Create tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let context = match archetype {
            Some(ref archetype) => analyzer.analyze_for(keyword, archetype).await?,
            None => analyzer.analyze(keyword).await?,
        };

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&context)?),
            OutputFormat::Text => {
                for (i, competitor) in context.competitors.iter().enumerate() {
                    println!("{}. {} ({} words)", i + 1, competitor.title, competitor.word_count);
                    println!("   {}", competitor.url);
                    for heading in &competitor.headings {
                        println!("   {}h{} {}", "  ".repeat(usize::from(heading.level)), heading.level, heading.text);
                    }
                    for gap in &competitor.gaps {
                        println!("   gap: {}", gap);
                    }
                    println!();
                }
                for skipped in &context.skipped {
                    println!("skipped {}: {}", skipped.url, skipped.reason);
                }
            }
        }
        Ok::<(), anyhow::Error>(())
    })
}

/// Validate an HTML file. Returns whether the report passed.
fn cmd_validate(
    config_path: Option<&Path>,
    file: &Path,
    archetype_id: &str,
    target: Option<usize>,
    format: OutputFormat,
) -> Result<bool> {
    let config = load_config(config_path)?;
    let archetype = ArchetypeRegistry::builtin().get(archetype_id)?;

    let html = if file == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", file.display(), e))?
    };

    let target = match target {
        Some(target) => archetype.check_target(target)?,
        None => archetype.words.default,
    };
    let report = Validator::new(config.validation).validate_for(&html, &archetype, target);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report, &archetype.id, &mut io::stdout())?,
    }

    Ok(report.pass)
}

fn print_report(report: &ValidationReport, archetype: &str, out: &mut impl io::Write) -> Result<()> {
    writeln!(
        out,
        "{}  {}  {} words (target {}, {:.1}% off)",
        if report.pass { "PASS" } else { "FAIL" },
        archetype,
        report.word_count,
        report.target,
        report.deviation_pct
    )?;
    for finding in &report.findings {
        write!(out, "  [{}] {}: {}", finding.severity, finding.rule_id, finding.message)?;
        if let Some(ref location) = finding.location {
            write!(out, " ({})", location)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Show configuration.
fn cmd_config(config_path: Option<&Path>, show_path: bool) -> Result<()> {
    if show_path {
        if let Some(path) = Config::config_dir() {
            println!("{}", path.join("config.toml").display());
        }
        return Ok(());
    }

    let config = load_config(config_path)?;
    let toml = toml::to_string_pretty(&config)?;
    println!("{toml}");

    Ok(())
}

fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "copyforge", &mut io::stdout());
}

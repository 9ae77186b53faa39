//! KGQA CLI: template-matched question answering over a knowledge graph
//!
//! Commands: ask, repl, ingest, templates, completions

mod logger;
mod watcher;

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use serde_json::json;

use kgqa_core::{Config, TemplateCatalog};
use kgqa_query::formatter::{catalog_report, ranking_report};
use kgqa_query::{format_report, Answer, CharJaccard, Knowledge, OutputFormat, QaEngine};
use kgqa_store::ingest::read_triples;
use kgqa_store::{GraphData, LabelCleaner, SqliteGraph};

use crate::watcher::ResourceWatcher;

#[derive(Parser)]
#[command(name = "kgqa")]
#[command(version)]
#[command(about = "Answer natural-language questions from a knowledge graph")]
struct Cli {
    /// Config file (default: ./kgqa.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Schema snapshot JSON
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    /// Template catalog CSV
    #[arg(long, global = true)]
    templates: Option<PathBuf>,

    /// Graph database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `kgqa_query=debug` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Answer one question
    #[command(alias = "a")]
    Ask {
        question: String,
        /// Show the ranked candidates instead of executing them
        #[arg(long)]
        explain: bool,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Answer questions read from stdin, one per line
    Repl {
        /// Reload the schema and templates when their files change
        #[arg(long)]
        watch: bool,
    },
    /// Build the graph database and schema snapshot from triple files
    Ingest {
        /// Relation triples: head<TAB>relation<TAB>tail
        #[arg(long)]
        relations: PathBuf,
        /// Attribute triples: entity<TAB>attribute<TAB>value
        #[arg(long)]
        attributes: PathBuf,
    },
    /// Validate and list the template catalog
    Templates {
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Print shell completions
    Completions { shell: clap_complete::Shell },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Table,
    Markdown,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => OutputFormat::Json,
            Format::Table => OutputFormat::Table,
            Format::Markdown => OutputFormat::Markdown,
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::discover(cli.config.as_deref())?;
    if let Some(path) = cli.schema {
        config.schema_path = path;
    }
    if let Some(path) = cli.templates {
        config.templates_path = path;
    }
    if let Some(path) = cli.db {
        config.database_path = path;
    }
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    logger::init(level, cli.log_level.is_some())?;

    match cli.command {
        Commands::Ask {
            question,
            explain,
            format,
        } => cmd_ask(&config, &question, explain, format.into()),
        Commands::Repl { watch } => cmd_repl(&config, watch),
        Commands::Ingest {
            relations,
            attributes,
        } => cmd_ingest(&config, &relations, &attributes),
        Commands::Templates { format } => cmd_templates(&config, format.into()),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "kgqa", &mut io::stdout());
            Ok(())
        }
    }
}

fn load_knowledge(config: &Config) -> Result<Knowledge> {
    Knowledge::load(
        &config.schema_path,
        &config.templates_path,
        config.mention_size_limit,
    )
    .context("failed to load schema and templates")
}

fn open_engine(config: &Config) -> Result<QaEngine<SqliteGraph>> {
    let knowledge = load_knowledge(config)?;
    let graph = SqliteGraph::open_read_only(&config.database_path)
        .context("failed to open graph database")?
        .with_relationship_fields(config.relationship_fields.clone());
    Ok(QaEngine::new(knowledge, graph))
}

fn cmd_ask(config: &Config, question: &str, explain: bool, format: OutputFormat) -> Result<()> {
    if explain {
        let knowledge = load_knowledge(config)?;
        let explanation = knowledge.explain(question, &CharJaccard);
        tracing::info!(mentions = ?explanation.mentions, "explain");
        print!("{}", with_newline(format_report(&ranking_report(&explanation.ranked), format)));
        return Ok(());
    }

    let engine = open_engine(config)?;
    let answer = engine.ask(question)?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&ask_json(question, answer.as_ref()))?);
        }
        OutputFormat::Table | OutputFormat::Markdown => {
            println!("{}", answer_line(answer.as_ref()));
        }
    }
    Ok(())
}

fn ask_json(question: &str, answer: Option<&Answer>) -> serde_json::Value {
    match answer {
        Some(a) => json!({
            "question": question,
            "answer": a.text,
            "matched_question": a.matched_question,
            "query": a.query,
            "score": a.score,
            "template": a.template,
            "attempts": a.attempts,
        }),
        None => json!({ "question": question, "answer": null }),
    }
}

fn answer_line(answer: Option<&Answer>) -> &str {
    answer.map_or("(no answer)", |a| a.text.as_str())
}

fn with_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

fn cmd_repl(config: &Config, watch: bool) -> Result<()> {
    let engine = open_engine(config)?;
    let watcher = if watch {
        Some(ResourceWatcher::start(&[
            config.schema_path.as_path(),
            config.templates_path.as_path(),
        ])?)
    } else {
        None
    };

    let interactive = io::stdin().is_terminal();
    let mut stdout = io::stdout();
    let mut lines = io::stdin().lock().lines();
    loop {
        if interactive {
            write!(stdout, "kgqa> ")?;
            stdout.flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "exit" || question == "quit" {
            break;
        }

        if let Some(watcher) = &watcher {
            let changed = watcher.drain();
            if !changed.is_empty() {
                match load_knowledge(config) {
                    Ok(knowledge) => {
                        engine.reload(knowledge);
                        tracing::info!(files = ?changed, "knowledge reloaded");
                    }
                    Err(e) => tracing::warn!("reload failed, keeping previous knowledge: {e:#}"),
                }
            }
        }

        match engine.ask(question) {
            Ok(answer) => writeln!(stdout, "{}", answer_line(answer.as_ref()))?,
            Err(e) => eprintln!("error: {e}"),
        }
    }
    Ok(())
}

fn cmd_ingest(config: &Config, relations: &Path, attributes: &Path) -> Result<()> {
    let relation_triples = read_triples(relations)
        .with_context(|| format!("failed to read {}", relations.display()))?;
    let attribute_triples = read_triples(attributes)
        .with_context(|| format!("failed to read {}", attributes.display()))?;

    let cleaner = LabelCleaner::new(config.ingest.labels.clone());
    let data = GraphData::from_triples(&relation_triples, &attribute_triples, &cleaner);

    for path in [&config.database_path, &config.schema_path] {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let mut graph = SqliteGraph::open(&config.database_path).context("failed to open graph database")?;
    let report = graph.load(&data)?;
    data.snapshot()
        .write(&config.schema_path)
        .context("failed to write schema snapshot")?;

    let output = json!({
        "database": config.database_path.display().to_string(),
        "schema": config.schema_path.display().to_string(),
        "report": report,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn cmd_templates(config: &Config, format: OutputFormat) -> Result<()> {
    let catalog = TemplateCatalog::load(&config.templates_path).context("failed to load templates")?;
    print!("{}", with_newline(format_report(&catalog_report(&catalog), format)));
    Ok(())
}

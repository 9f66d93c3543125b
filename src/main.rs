//! kgqa CLI: ask questions of a knowledge graph.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::Result;

use kgqa::config::KgConfig;
use kgqa::engine::{Answer, KnowledgeBase};
use kgqa::graph::KnowledgeGraph;
use kgqa::search::SearchStrategy;
use kgqa::seeds::SeedPack;

#[derive(Parser)]
#[command(name = "kgqa", version, about = "Knowledge-graph question answering")]
struct Cli {
    /// JSON graph snapshot to load before running the command.
    #[arg(long, global = true)]
    graph: Option<PathBuf>,

    /// TOML config file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a seed pack and save the resulting graph.
    Import {
        /// Seed pack file, or the id of a bundled pack (e.g. "china-geography").
        #[arg(long)]
        seed: String,

        /// Where to write the graph. Defaults to --graph.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Parse a question and search the graph.
    Ask {
        /// The question, e.g. "北京和中国是什么关系".
        text: String,

        /// exact_match, semantic_search, path_finding or hybrid.
        #[arg(long)]
        strategy: Option<String>,

        #[arg(long)]
        max_results: Option<usize>,

        #[arg(long)]
        offset: Option<usize>,

        #[arg(long)]
        min_confidence: Option<f32>,
    },

    /// Find paths between two entities (by name or id).
    Path {
        from: String,
        to: String,

        /// Maximum hops. Defaults to search.path_max_depth.
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Show graph statistics.
    Info,

    /// Write the graph as a JSON snapshot.
    Export {
        /// Output file. Prints to stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => KgConfig::load(path)?,
        None => KgConfig::default(),
    };

    match cli.command {
        Commands::Import { seed, out } => {
            let pack = load_seed(&seed)?;
            let kb = open(cli.graph.as_deref(), config, true)?;
            let report = kb.apply_seed(&pack);
            println!("{report}");

            match out.or(cli.graph) {
                Some(path) => {
                    kb.save(&path)?;
                    println!("Saved graph to {}", path.display());
                }
                None => {
                    println!("No --out or --graph given; graph not saved.");
                }
            }
        }

        Commands::Ask {
            text,
            strategy,
            max_results,
            offset,
            min_confidence,
        } => {
            if let Some(name) = strategy {
                config.search.strategy = name.parse::<SearchStrategy>()?;
            }
            if let Some(n) = max_results {
                config.search.max_results = n;
            }
            if let Some(n) = offset {
                config.search.offset = n;
            }
            if let Some(c) = min_confidence {
                config.search.min_confidence = c;
            }
            let kb = open(cli.graph.as_deref(), config, false)?;
            print_answer(&kb.ask(&text));
        }

        Commands::Path {
            from,
            to,
            max_depth,
        } => {
            let kb = open(cli.graph.as_deref(), config, false)?;
            let paths = kb.paths(&from, &to, max_depth)?;
            if paths.is_empty() {
                println!("No path between \"{from}\" and \"{to}\".");
            }
            for (i, path) in paths.iter().enumerate() {
                println!("{:>3}. [{} hops] {path}", i + 1, path.relations.len());
            }
        }

        Commands::Info => {
            let kb = open(cli.graph.as_deref(), config, false)?;
            print!("{}", kb.info());
        }

        Commands::Export { out } => {
            let kb = open(cli.graph.as_deref(), config, false)?;
            match out {
                Some(path) => {
                    kb.save(&path)?;
                    println!("Exported graph to {}", path.display());
                }
                None => {
                    let json = kb.read(KnowledgeGraph::to_json)?;
                    println!("{json}");
                }
            }
        }
    }

    Ok(())
}

/// Load the graph at `path`, or start empty when there is no path (or,
/// with `allow_missing`, no file yet).
fn open(path: Option<&Path>, config: KgConfig, allow_missing: bool) -> Result<KnowledgeBase> {
    let kb = match path {
        Some(path) if allow_missing && !path.exists() => KnowledgeBase::new(config)?,
        Some(path) => KnowledgeBase::load(path, config)?,
        None => KnowledgeBase::new(config)?,
    };
    Ok(kb)
}

fn load_seed(seed: &str) -> Result<SeedPack> {
    let path = Path::new(seed);
    if !path.exists() {
        if let Some(bundled) = SeedPack::bundled(seed) {
            return Ok(bundled?);
        }
    }
    Ok(SeedPack::load(path)?)
}

fn print_answer(answer: &Answer) {
    let parsed = &answer.parsed;
    let intent = &parsed.intent;
    println!("query:      {}", parsed.original_query);
    println!(
        "type:       {} (confidence {:.2})",
        intent.query_type, parsed.confidence
    );
    let entities: Vec<String> = parsed
        .linked_entities
        .iter()
        .map(|l| match &l.entity_id {
            Some(id) => format!("{} -> {id}", l.mention),
            None => format!("{} (unresolved)", l.mention),
        })
        .collect();
    println!("entities:   {}", entities.join(", "));
    if !intent.relations.is_empty() {
        println!("relations:  {}", intent.relations.join(", "));
    }
    if !intent.attributes.is_empty() {
        println!("attributes: {}", intent.attributes.join(", "));
    }
    for (key, value) in &intent.parameters {
        println!("{:<11} {value}", format!("{key}:"));
    }

    let result = &answer.result;
    println!(
        "strategy:   {}, {} match(es) in {:?}",
        result.search_strategy, result.total_matches, result.execution_time
    );
    if result.is_empty() {
        println!("No matching triples.");
        return;
    }
    for (i, item) in result.items.iter().enumerate() {
        println!(
            "{:>3}. [{:.2}] {} (confidence {:.2})",
            i + 1,
            item.relevance_score,
            item.labels,
            item.confidence_score
        );
    }
}

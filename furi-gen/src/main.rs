//! furi-gen - furigana resolution service and CLI
//!
//! Subcommands:
//! - `serve`: HTTP API on 127.0.0.1
//! - `resolve`: print readings for a text
//! - `correct`: store a user correction
//! - `import-vocab`: load vocabulary from TSV
//! - `cache list|delete`: inspect the reading cache
//! - `set-api-key`: store the LLM API key in the database
//! - `sentence add|list|generate`: manage stored study sentences
//! - `init-config`: write a user configuration file

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use furi_common::config::{self as common_config, DictionaryFormat, FuriConfig};
use furi_gen::db::{NewSentence, SqliteReadingCache, SqliteSentenceStore, SqliteWordStore};
use furi_gen::render::{render, RenderStyle};
use furi_gen::types::{ReadingCache, Tokenizer};
use furi_gen::{apply_correction, build_generator, load_tokenizer, AppState, ResolveOptions};
use std::path::Path;
use sqlx::SqlitePool;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Key used to enable the mock language-model layer when no real key is set
const MOCK_API_KEY: &str = "mock";

/// Command-line arguments for furi-gen
#[derive(Parser, Debug)]
#[command(name = "furi-gen")]
#[command(about = "Multi-source furigana generator")]
#[command(version)]
struct Args {
    /// Root folder holding furi.db (falls back to FURI_ROOT_FOLDER, TOML, OS default)
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    /// Configuration file (default: ~/.config/furi/config.toml, /etc/furi/config.toml)
    #[arg(short, long, global = true, env = "FURI_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5780", env = "FURI_PORT")]
        port: u16,
    },
    /// Resolve readings for a text
    Resolve {
        text: String,
        /// Answer the language-model layer from the built-in mock table
        #[arg(long)]
        mock: bool,
        /// LLM API key for this call (overrides database, environment, TOML)
        #[arg(long)]
        api_key: Option<String>,
        /// Print the annotated text instead of the annotation list
        #[arg(long, value_enum)]
        render: Option<RenderStyle>,
        /// Print annotations as JSON
        #[arg(long)]
        json: bool,
    },
    /// Store a user correction for a word
    Correct {
        text: String,
        corrected: String,
        /// Reading being replaced
        #[arg(long, default_value = "")]
        previous: String,
    },
    /// Import vocabulary from `word<TAB>reading[<TAB>meaning]` lines
    ImportVocab { path: PathBuf },
    /// Inspect or edit the reading cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Store the LLM API key in the database
    SetApiKey { key: String },
    /// Manage stored study sentences
    Sentence {
        #[command(subcommand)]
        action: SentenceAction,
    },
    /// Write the current configuration to the user config file
    InitConfig {
        /// Dictionary file or MeCab source directory
        #[arg(long)]
        dictionary: Option<PathBuf>,
        #[arg(long, value_enum)]
        dictionary_format: Option<FormatArg>,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum SentenceAction {
    /// Store a sentence
    Add {
        sentence: String,
        #[arg(long)]
        translation: Option<String>,
        #[arg(long)]
        tags: Option<String>,
    },
    /// List the most recent sentences
    List {
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Resolve and save furigana for a stored sentence
    Generate {
        sentence_id: i64,
        #[arg(long)]
        mock: bool,
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Ipadic,
    Unidic,
}

impl From<FormatArg> for DictionaryFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Ipadic => DictionaryFormat::Ipadic,
            FormatArg::Unidic => DictionaryFormat::Unidic,
        }
    }
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// List cached readings for a word
    List { word: String },
    /// Delete a cache entry by id
    Delete { cache_id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => common_config::load_config_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => common_config::load_config().context("Failed to load config")?,
    };

    // Initialize tracing
    let level = config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("furi_gen={level},furi_common={level},tower_http=info").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Command::InitConfig {
        dictionary,
        dictionary_format,
        force,
    } = args.command
    {
        let path = args.config.unwrap_or_else(common_config::user_config_path);
        return init_config(config, &path, dictionary, dictionary_format, force);
    }

    let root_folder = common_config::resolve_root_folder(args.root_folder.as_deref(), &config);
    let db_path = common_config::database_path(&root_folder);
    info!("Database: {}", db_path.display());

    let db = furi_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;

    match args.command {
        Command::Serve { port } => {
            let tokenizer = open_dictionary(&root_folder, &config)?;
            serve(db, tokenizer, config, port).await
        }
        Command::Resolve {
            text,
            mock,
            api_key,
            render: style,
            json,
        } => {
            let tokenizer = open_dictionary(&root_folder, &config)?;
            let api_key = cli_api_key(&db, &config, api_key, mock).await?;
            let mock = mock || config.llm.mock;
            let cache: Arc<dyn ReadingCache> = Arc::new(SqliteReadingCache::new(db.clone()));
            let generator = build_generator(&db, cache, tokenizer, &config)?;
            let candidates = generator
                .resolve_candidates(&text, &ResolveOptions { api_key, mock_llm: mock })
                .await;
            print_candidates(&text, candidates, style, json)
        }
        Command::Correct {
            text,
            corrected,
            previous,
        } => {
            let cache = SqliteReadingCache::new(db);
            let applied = apply_correction(&cache, &text, &previous, &corrected).await?;
            println!("{} -> {} (confidence {})", applied.text, applied.reading, applied.confidence);
            Ok(())
        }
        Command::ImportVocab { path } => {
            let summary = SqliteWordStore::new(db)
                .import_tsv(&path)
                .await
                .with_context(|| format!("Failed to import {}", path.display()))?;
            println!("Added {}, skipped {}", summary.added, summary.skipped);
            Ok(())
        }
        Command::Cache { action } => cache_command(db, action).await,
        Command::SetApiKey { key } => {
            if !furi_gen::config::is_valid_key(&key) {
                bail!("API key cannot be empty or whitespace-only");
            }
            furi_gen::db::settings::set_llm_api_key(&db, key).await?;
            println!("LLM API key stored");
            Ok(())
        }
        Command::Sentence { action } => {
            sentence_command(db, &root_folder, config, action).await
        }
        // Handled before the database opens
        Command::InitConfig { .. } => Ok(()),
    }
}

/// Load the configured dictionary or explain how to provide one
fn open_dictionary(root_folder: &Path, config: &FuriConfig) -> Result<Arc<dyn Tokenizer>> {
    let tokenizer = load_tokenizer(root_folder, config).context(
        "Failed to load dictionary (set pipeline.dictionary_path or run init-config --dictionary)",
    )?;
    Ok(Arc::new(tokenizer))
}

/// Key from the command line, else database, environment or TOML; mock fills in last
async fn cli_api_key(
    db: &SqlitePool,
    config: &FuriConfig,
    api_key: Option<String>,
    mock: bool,
) -> Result<Option<String>> {
    let api_key = match api_key.filter(|k| furi_gen::config::is_valid_key(k)) {
        Some(key) => Some(key),
        None => furi_gen::config::resolve_llm_api_key(db, config)
            .await?
            .map(|(key, _)| key),
    };
    Ok(match api_key {
        Some(key) => Some(key),
        None if mock || config.llm.mock => Some(MOCK_API_KEY.to_string()),
        None => None,
    })
}

fn init_config(
    mut config: FuriConfig,
    path: &Path,
    dictionary: Option<PathBuf>,
    format: Option<FormatArg>,
    force: bool,
) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to replace it)", path.display());
    }
    if let Some(dictionary) = dictionary {
        config.pipeline.dictionary_path = Some(dictionary);
    }
    if let Some(format) = format {
        config.pipeline.dictionary_format = format.into();
    }
    common_config::write_config(&config, path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

async fn sentence_command(
    db: SqlitePool,
    root_folder: &Path,
    config: FuriConfig,
    action: SentenceAction,
) -> Result<()> {
    let store = SqliteSentenceStore::new(db.clone());
    match action {
        SentenceAction::Add {
            sentence,
            translation,
            tags,
        } => {
            let new = NewSentence {
                translation,
                tags,
                source: Some("cli".to_string()),
                ..NewSentence::new(sentence)
            };
            let stored = store.create(&new).await?;
            println!("#{} {}", stored.sentence_id, stored.sentence);
        }
        SentenceAction::List { limit } => {
            for sentence in store.list(limit).await? {
                let annotated = render(&sentence.sentence, &sentence.annotations(), RenderStyle::Bracket);
                println!(
                    "#{} {}{}",
                    sentence.sentence_id,
                    annotated,
                    if sentence.llm_processed { "" } else { " (unprocessed)" }
                );
            }
        }
        SentenceAction::Generate {
            sentence_id,
            mock,
            api_key,
        } => {
            let Some(sentence) = store.get(sentence_id).await? else {
                bail!("No sentence with id {}", sentence_id);
            };
            let Some(api_key) = cli_api_key(&db, &config, api_key, mock).await? else {
                bail!("No API key configured (use --api-key, set-api-key or --mock)");
            };
            let tokenizer = open_dictionary(root_folder, &config)?;
            let cache: Arc<dyn ReadingCache> = Arc::new(SqliteReadingCache::new(db.clone()));
            let generator = build_generator(&db, cache, tokenizer, &config)?;
            let options = ResolveOptions::with_api_key(api_key).mock_llm(mock || config.llm.mock);
            let annotations = generator.resolve(&sentence.sentence, &options).await;
            store.save_furigana(sentence_id, &annotations).await?;
            println!("{}", render(&sentence.sentence, &annotations, RenderStyle::Bracket));
        }
    }
    Ok(())
}

async fn serve(
    db: SqlitePool,
    tokenizer: Arc<dyn Tokenizer>,
    config: FuriConfig,
    port: u16,
) -> Result<()> {
    info!("Starting furi-gen {} on port {}", env!("CARGO_PKG_VERSION"), port);

    let state =
        AppState::new(db, tokenizer, config).context("Failed to build application state")?;
    let app = furi_gen::build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn print_candidates(
    text: &str,
    candidates: Vec<furi_gen::AnnotationCandidate>,
    style: Option<RenderStyle>,
    json: bool,
) -> Result<()> {
    if let Some(style) = style {
        let annotations: Vec<_> = candidates.into_iter().map(|c| c.into_annotation()).collect();
        println!("{}", render(text, &annotations, style));
    } else if json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
    } else {
        for c in &candidates {
            println!(
                "{:>3}..{:<3} {}\t{}\t{} ({})",
                c.start, c.end, c.text, c.reading, c.source, c.confidence
            );
        }
    }
    Ok(())
}

async fn cache_command(db: SqlitePool, action: CacheAction) -> Result<()> {
    let cache = SqliteReadingCache::new(db);
    match action {
        CacheAction::List { word } => {
            for entry in cache.entries_for(&word).await? {
                println!(
                    "#{} {}\t{}\t{} ({}), used {} times, last {}",
                    entry.cache_id,
                    entry.word,
                    entry.reading,
                    entry.source,
                    entry.confidence,
                    entry.usage_count,
                    entry.last_used_at.to_rfc3339()
                );
            }
        }
        CacheAction::Delete { cache_id } => {
            if !cache.delete(cache_id).await? {
                bail!("No cache entry with id {}", cache_id);
            }
            println!("Deleted cache entry #{}", cache_id);
        }
    }
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

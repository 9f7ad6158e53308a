//! 命令行管理工具入口
//!
//! 查词、查看历史、浏览与清理存储中的记录。

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ai_dictionary::env::{core, generate_env_docs, EnvConfig, EnvVar};
use ai_dictionary::lookup::{
    ClearScope, ConfigManager, GeminiProvider, LookupConfig, LookupError, LookupResult,
    LookupService, LookupStore, MongoConfig, MongoStore, OwnerId, StoreStats,
};

/// `view` 中释义预览的长度
const VIEW_PREVIEW_CHARS: usize = 100;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Parser)]
#[command(
    name = "ai-dictionary",
    version,
    about = "AI Dictionary: cached word lookups with per-owner history"
)]
struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Look up one word (English or Chinese)
    Lookup {
        word: String,
        /// Record the lookup under this owner instead of the anonymous bucket
        #[arg(short, long)]
        owner: Option<String>,
    },
    /// Show the most recently looked-up words of one owner
    History {
        #[arg(short, long)]
        owner: Option<String>,
        /// Number of entries [default: DICT_HISTORY_LIMIT or 20]
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Dump stored records with their query counts
    View(ScopeArgs),
    /// Entry counts per language and total queries
    Stats(ScopeArgs),
    /// Delete stored records
    Clear {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Print the environment variable reference
    EnvDocs,
    /// Print the effective environment configuration
    EnvSummary,
    /// Write a default configuration file
    InitConfig {
        #[arg(default_value = "dictionary.toml")]
        path: String,
    },
}

#[derive(Args)]
struct ScopeArgs {
    /// Only records of this owner
    #[arg(short, long, conflicts_with = "all")]
    owner: Option<String>,
    /// Records of every owner
    #[arg(short, long)]
    all: bool,
}

impl ScopeArgs {
    /// 未指定时作用于匿名桶
    fn scope(&self) -> ClearScope {
        if self.all {
            ClearScope::All
        } else {
            ClearScope::Owner(OwnerId::from_optional(self.owner.as_deref()))
        }
    }
}

fn describe_scope(scope: &ClearScope) -> String {
    match scope {
        ClearScope::All => "全部用户".to_string(),
        ClearScope::Owner(owner) => format!("用户 {}", owner),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    ConfigManager::load_dotenv();

    let log_level = core::LogLevel::get()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_ansi(!core::NoColor::get_or_default(false))
        .with_writer(io::stderr)
        .init();

    // 只有需要引擎配置的子命令才加载配置文件
    let config_path = cli.config;
    let load_config = || -> LookupResult<LookupConfig> {
        let manager = match config_path.as_deref() {
            Some(path) => ConfigManager::from_path(path)?,
            None => ConfigManager::new()?,
        };
        Ok(manager.into_config())
    };

    match cli.command {
        Command::EnvDocs => {
            print!("{}", generate_env_docs());
        }
        Command::EnvSummary => {
            let env_config = EnvConfig::from_env()?;
            env_config.print_summary();
            if env_config.is_development() {
                println!("  (development mode)");
            }
        }
        Command::InitConfig { path } => {
            ConfigManager::generate_example_config(&path)?;
            println!("✅ 已生成配置文件: {}", path);
        }
        Command::Lookup { word, owner } => {
            let config = load_config()?;
            let store = connect_store().await?;
            run_lookup(&config, store, &word, &OwnerId::from_optional(owner.as_deref())).await?;
        }
        Command::History { owner, limit } => {
            let config = load_config()?;
            let store = connect_store().await?;
            let limit = limit.unwrap_or(config.history.limit);
            run_history(&config, store.as_ref(), &OwnerId::from_optional(owner.as_deref()), limit)
                .await?;
        }
        Command::View(args) => {
            let store = connect_store().await?;
            run_view(store.as_ref(), &args.scope()).await?;
        }
        Command::Stats(args) => {
            let store = connect_store().await?;
            let scope = args.scope();
            let stats = store.stats(&scope).await.map_err(LookupError::from)?;
            println!("{}：", describe_scope(&scope));
            print_stats(&stats);
        }
        Command::Clear { scope, force } => {
            let store = connect_store().await?;
            run_clear(store.as_ref(), &scope.scope(), force).await?;
        }
    }

    Ok(())
}

async fn connect_store() -> LookupResult<Arc<dyn LookupStore>> {
    let mongo_config = MongoConfig::from_env()?;
    mongo_config.validate()?;
    let store = MongoStore::connect(&mongo_config).await?;
    tracing::debug!("存储后端: {}", store.name());
    Ok(Arc::new(store))
}

async fn run_lookup(
    config: &LookupConfig,
    store: Arc<dyn LookupStore>,
    word: &str,
    owner: &OwnerId,
) -> LookupResult<()> {
    let provider = Arc::new(GeminiProvider::from_config(&config.provider)?);
    let service = LookupService::from_config(config, store, provider);

    let outcome = service.lookup(word, owner).await?;
    println!("【{}】 ({})", outcome.word, outcome.language);
    println!("查询次数: {}", outcome.query_count);
    println!("{}", "-".repeat(80));
    println!("{}", outcome.definition);
    Ok(())
}

async fn run_history(
    config: &LookupConfig,
    store: &dyn LookupStore,
    owner: &OwnerId,
    limit: usize,
) -> LookupResult<()> {
    let entries = store.list_recent(owner, limit).await?;
    if entries.is_empty() {
        println!("{} 还没有查询记录", owner);
        return Ok(());
    }

    println!("{} 最近查询的 {} 个单词：", owner, entries.len());
    for entry in &entries {
        println!(
            "{}  {:<20} {:<8} {:>4} 次  {}",
            entry.updated_at.format("%Y-%m-%d %H:%M"),
            entry.word(),
            entry.language(),
            entry.query_count,
            entry
                .preview(config.history.preview_chars)
                .replace('\n', " ")
        );
    }
    Ok(())
}

async fn run_view(store: &dyn LookupStore, scope: &ClearScope) -> LookupResult<()> {
    let entries = store.list_all(scope).await?;
    if entries.is_empty() {
        println!("存储中没有数据");
        return Ok(());
    }

    println!("存储中共有 {} 条记录：", entries.len());
    println!("{}", "=".repeat(80));

    for entry in &entries {
        println!("单词: {}", entry.word());
        println!("语言: {}", entry.language());
        println!("查询次数: {}", entry.query_count);
        println!("用户: {}", entry.owner);
        println!("创建时间: {}", entry.created_at.format(TIME_FORMAT));
        println!("更新时间: {}", entry.updated_at.format(TIME_FORMAT));
        println!("释义: {}", entry.preview(VIEW_PREVIEW_CHARS));
        println!("{}", "-".repeat(80));
    }

    let stats = store.stats(scope).await?;
    println!();
    println!("统计信息：");
    print_stats(&stats);
    Ok(())
}

fn print_stats(stats: &StoreStats) {
    use ai_dictionary::lookup::Language;

    let count = |language: Language| stats.entries_by_language.get(&language).copied().unwrap_or(0);
    println!("- 英文单词: {} 个", count(Language::English));
    println!("- 中文单词: {} 个", count(Language::Chinese));
    println!("- 总记录数: {} 条", stats.total_entries);
    println!("- 总查询次数: {} 次", stats.total_queries);
}

async fn run_clear(store: &dyn LookupStore, scope: &ClearScope, force: bool) -> LookupResult<()> {
    if !force {
        let total = store.stats(scope).await?.total_entries;
        if total == 0 {
            println!("{} 没有记录需要清除", describe_scope(scope));
            return Ok(());
        }

        println!("{} 共有 {} 条记录", describe_scope(scope), total);
        if !confirm("确定要清空这些记录吗？(y/N): ")? {
            println!("已取消清空操作");
            return Ok(());
        }
    }

    let deleted = store.clear(scope).await?;
    tracing::info!("已清除 {} 条记录 ({})", deleted, describe_scope(scope));
    println!("✅ 成功清除 {} 条记录", deleted);
    Ok(())
}

fn confirm(prompt: &str) -> LookupResult<bool> {
    print!("{}", prompt);
    io::stdout()
        .flush()
        .map_err(|e| LookupError::InternalError(format!("无法写入终端: {}", e)))?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| LookupError::InternalError(format!("无法读取输入: {}", e)))?;

    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "是"
    ))
}

use clap::Parser;
use media_list::core::lifecycle::DEFAULT_LATEST_LIMIT;
use media_list::domain::ports::ConfigProvider;
use media_list::utils::error::ErrorCategory;
use media_list::utils::{logger, validation::Validate};
use media_list::{
    CliArgs, Command, HttpCatalogClient, JsonFileListItemStore, ListError, ListItem, ListItemId,
    ListService,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn print_items(items: &[ListItem]) {
    if items.is_empty() {
        println!("(empty list)");
        return;
    }
    for item in items {
        println!(
            "{:>3}. {:<12} item {:<5} added {}",
            item.rank,
            item.catalog.to_string(),
            item.id,
            item.added_at.format("%Y-%m-%d %H:%M")
        );
    }
}

async fn run(args: &CliArgs) -> Result<(), ListError> {
    let config = args.load_config()?;
    config.validate()?;

    let store = JsonFileListItemStore::open(config.store_path()).await?;
    let catalog = HttpCatalogClient::from_config(&config)?;
    let service = ListService::new(store, catalog);
    let owner = args.owner();

    match &args.command {
        Command::Add { ref_code, kind } => {
            let item = service.add(owner, ref_code, *kind).await?;
            println!("✅ Added {} as item {} at rank {}", item.catalog, item.id, item.rank);
        }
        Command::Delete { item_id } => {
            let item = service.delete_by_id(owner, ListItemId(*item_id)).await?;
            println!("🗑️  Removed item {} ({})", item.id, item.catalog);
        }
        Command::Reorder { item_id, rank } => {
            let items = service.reorder(owner, ListItemId(*item_id), *rank).await?;
            print_items(&items);
        }
        Command::List => print_items(&service.get_ordered(owner, args.list).await?),
        Command::Latest { limit } => {
            let limit = if *limit == 0 { DEFAULT_LATEST_LIMIT } else { *limit };
            print_items(&service.latest_added(owner, args.list, limit).await?);
        }
        Command::Random { seed } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(*seed),
                None => StdRng::from_os_rng(),
            };
            match service.get_random(owner, args.list, &mut rng).await? {
                Some(item) => print_items(std::slice::from_ref(&item)),
                None => println!("(empty list)"),
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    let logging = args
        .load_config()
        .map(|config| config.logging)
        .unwrap_or_default();
    logger::init_logger(logging.format, logging.level.as_deref(), args.verbose);

    tracing::info!("Starting media-list for user {}", args.owner());
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    if let Err(e) = run(&args).await {
        tracing::error!("❌ {} (Category: {:?})", e, e.category());
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤類型決定退出碼
        let exit_code = match e.category() {
            ErrorCategory::Client => 1,
            ErrorCategory::Upstream => 2,
            ErrorCategory::Storage | ErrorCategory::Configuration => 3,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

use chrono::Utc;
use log::{error, info, warn};
use std::{env, path::Path, process::exit};

use subtrack::{
    alternatives::{detect_category, suggest},
    config::{OpenAiConfig, SupabaseConfig},
    env::load_env_file,
    llm::LlmClient,
    logger::setup_logger,
    SupabaseClient, VERSION,
};

#[derive(Debug, Default, PartialEq)]
struct JobArgs {
    help: bool,
    dry_run: bool,
    limit: Option<usize>,
}

fn parse_args(args: &[String]) -> Result<JobArgs, String> {
    let mut parsed = JobArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => parsed.help = true,
            "--dry-run" => parsed.dry_run = true,
            "--limit" => {
                let value = iter.next().ok_or("--limit needs a number")?;
                let limit = value
                    .parse()
                    .map_err(|_| format!("--limit needs a number, got {value:?}"))?;
                parsed.limit = Some(limit);
            }
            other => return Err(format!("Unknown argument {other:?}")),
        }
    }
    Ok(parsed)
}

fn print_help() {
    let this_script_relative_path = env::args().next().unwrap_or_default();
    let this_script_name = Path::new(&this_script_relative_path)
        .file_name()
        .unwrap_or_default()
        .to_str()
        .unwrap_or_default()
        .to_owned();
    println!(
        "{} version:{} Usage: {} [--dry-run] [--limit N]",
        this_script_name, VERSION, this_script_name
    );
    println!("Detects each subscription's category and upserts cheaper alternatives");
    println!("into subscription_alternatives.");
    println!("Depends on .env or environment: SUPABASE_URL, SUPABASE_KEY, OPENAI_API_KEY");
    println!("Options:");
    println!("  --dry-run              Print the alternatives instead of writing them");
    println!("  --limit N              Only process the first N subscriptions");
    println!("  --help, -h             Show this help message");
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            print_help();
            exit(2);
        }
    };
    if args.help {
        print_help();
        return;
    }

    setup_logger();
    load_env_file();

    let supabase = match SupabaseConfig::from_env() {
        Ok(config) => SupabaseClient::new(&config),
        Err(e) => {
            error!("Supabase URL or Key is missing: {}", e);
            exit(1);
        }
    };
    let llm = match OpenAiConfig::from_env() {
        Ok(config) => LlmClient::new(&config),
        Err(e) => {
            error!("OpenAI API key is missing: {}", e);
            exit(1);
        }
    };

    info!("Updating subscription alternatives with {}...", llm.model());
    let mut subs = match supabase.list_all_subscriptions().await {
        Ok(subs) => subs,
        Err(e) => {
            error!("Error fetching subscriptions: {}", e);
            exit(1);
        }
    };
    if subs.is_empty() {
        warn!("No subscriptions found in the database.");
        return;
    }
    if let Some(limit) = args.limit {
        subs.truncate(limit);
    }

    let mut written = 0;
    let mut failed = 0;
    for sub in &subs {
        info!("Processing: {} ({})", sub.name, sub.category);
        let category = detect_category(&llm, sub).await;
        info!("Detected category: {}", category);

        let alternatives = suggest(&llm, sub, &category, Utc::now()).await;
        info!("Found {} alternatives for {}", alternatives.len(), sub.name);

        if args.dry_run {
            match serde_json::to_string_pretty(&alternatives) {
                Ok(json) => println!("{}", json),
                Err(e) => warn!("Could not print alternatives for {}: {}", sub.name, e),
            }
            continue;
        }
        match supabase.upsert_alternatives(&alternatives).await {
            Ok(()) => written += alternatives.len(),
            Err(e) => {
                failed += 1;
                error!("Upsert error for {}: {}", sub.name, e);
            }
        }
    }

    if failed > 0 {
        warn!("{} subscriptions could not be written", failed);
    }
    info!(
        "Processed {} subscriptions, upserted {} alternatives",
        subs.len(),
        written
    );
}

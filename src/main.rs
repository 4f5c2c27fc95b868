use clap::{Arg, Command};
use log::LevelFilter;
use std::path::Path;
use std::process;
use std::str::FromStr;
use subdomain_rules::{
    Config, DomainAnalyzer, RuleMatcher, RulePipeline, RuleStore, RunSummary, SqliteRuleStore,
};

fn main() {
    let matches = Command::new("subdomain-rules")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Derive per-project subdomain filter rules from known domain names")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value(Config::default_path()),
        )
        .arg(
            Arg::new("database")
                .long("database")
                .value_name("FILE")
                .help("SQLite database path (overrides configuration)")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("init-schema")
                .long("init-schema")
                .help("Create the domains and rules tables if they are missing")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Compute rules without writing them")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-rules")
                .long("list-rules")
                .help("Print stored rules and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .value_name("HOST")
                .help("Print the projects whose stored rule matches HOST")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the run summary as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(Config::default_path());
    let config_found = Path::new(config_path).exists();
    let mut config = if config_found {
        match Config::from_file(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading configuration: {e:#}");
                process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    init_logging(matches.get_flag("verbose"), &config);
    if !config_found {
        log::warn!("Configuration file '{config_path}' not found, using default configuration");
    }

    if let Some(database) = matches.get_one::<String>("database") {
        config.database_path = database.clone();
    }

    let code = run(&matches, &config);
    if code != 0 {
        process::exit(code);
    }
}

/// Runs the selected command and returns the process exit code. The store is
/// owned here, so its connection is closed before `main` exits.
fn run(matches: &clap::ArgMatches, config: &Config) -> i32 {
    let mut store = match SqliteRuleStore::open(&config.database_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("❌ {e:#}");
            return 1;
        }
    };

    if matches.get_flag("init-schema") {
        if let Err(e) = store.init_schema() {
            eprintln!("❌ {e:#}");
            return 1;
        }
        log::info!("Schema ready in {}", config.database_path);
    }

    if let Some(host) = matches.get_one::<String>("check") {
        return check_host(&mut store, host);
    }

    if matches.get_flag("list-rules") {
        return list_rules(&mut store);
    }

    let analyzer = DomainAnalyzer::with_policy(config.analysis.prefix_bound_policy);
    let result = RulePipeline::new(&mut store, analyzer)
        .dry_run(matches.get_flag("dry-run"))
        .run();

    match result {
        Ok(summary) => {
            print_summary(&summary, matches.get_flag("json"));
            if summary.is_success() {
                return 0;
            }
            for failure in &summary.failures {
                eprintln!("Project {} failed: {}", failure.project_id, failure.error);
            }
            1
        }
        Err(e) => {
            log::error!("Run aborted: {e:#}");
            eprintln!("❌ Run aborted: {e:#}");
            1
        }
    }
}

fn init_logging(verbose: bool, config: &Config) {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        config
            .logging
            .as_ref()
            .and_then(|logging| LevelFilter::from_str(&logging.level).ok())
            .unwrap_or(LevelFilter::Info)
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .init();
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e:#}");
            process::exit(1);
        }
    }
}

fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        match serde_json::to_string_pretty(summary) {
            Ok(output) => println!("{output}"),
            Err(e) => eprintln!("Failed to serialize summary: {e}"),
        }
        return;
    }

    println!("📊 Processed {} projects", summary.projects_seen);
    for rule in &summary.rules {
        println!("  ✅ {}: {}", rule.project_id, rule.regexp);
    }
    for failure in &summary.failures {
        println!("  ❌ {}: {}", failure.project_id, failure.error);
    }
}

fn list_rules(store: &mut SqliteRuleStore) -> i32 {
    match store.list_rules() {
        Ok(rules) => {
            println!("📋 Stored rules ({} total):", rules.len());
            for rule in rules {
                println!("  • {}: {}", rule.project_id, rule.regexp);
            }
            0
        }
        Err(e) => {
            eprintln!("❌ {e:#}");
            1
        }
    }
}

fn check_host(store: &mut SqliteRuleStore, host: &str) -> i32 {
    let matcher = match store.list_rules().and_then(|rules| RuleMatcher::new(&rules)) {
        Ok(matcher) => matcher,
        Err(e) => {
            eprintln!("❌ {e:#}");
            return 1;
        }
    };

    match matcher.matching_projects(host) {
        Ok(projects) if projects.is_empty() => {
            println!("No project rule matches {host}");
            0
        }
        Ok(projects) => {
            for project in projects {
                println!("{project}");
            }
            0
        }
        Err(e) => {
            eprintln!("❌ {e:#}");
            1
        }
    }
}

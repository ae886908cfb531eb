use clap::{Arg, ArgAction, Command};

mod commands;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn cli() -> Command {
    Command::new("taskhooks")
        .version(VERSION)
        .about("Run Slack, SparkPost and Kubernetes task hooks")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Configuration file (default: $TASKHOOKS_CONFIG or ./taskhooks.toml)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Enable debug logging"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .value_parser(["text", "json"])
                .default_value("text")
                .global(true)
                .help("Log output format"),
        )
        .subcommand(
            Command::new("run")
                .about("Execute one task file")
                .arg(
                    Arg::new("task")
                        .value_name("TASK_FILE")
                        .required(true)
                        .help("YAML or JSON task definition"),
                )
                .arg(
                    Arg::new("run-id")
                        .long("run-id")
                        .value_name("RUN_ID")
                        .help("Run identifier available as {{ run_id }} (default: manual__<timestamp>)"),
                )
                .arg(
                    Arg::new("logical-date")
                        .long("logical-date")
                        .value_name("RFC3339")
                        .help("Logical date for {{ ds }} and {{ ts }} (default: now)"),
                )
                .arg(
                    Arg::new("param")
                        .short('p')
                        .long("param")
                        .value_name("KEY=VALUE")
                        .action(ArgAction::Append)
                        .help("Template parameter available as {{ params.KEY }}"),
                )
                .arg(
                    Arg::new("check")
                        .long("check")
                        .action(ArgAction::SetTrue)
                        .help("Validate the task file without executing it"),
                ),
        )
        .subcommand(commands::slack::command())
        .subcommand(commands::email::command())
        .subcommand(commands::kube::command())
        .subcommand(Command::new("capabilities").about("List the adapters compiled into this binary"))
}

#[tokio::main]
async fn main() {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();

    let matches = cli().get_matches();

    let verbose = matches.get_flag("verbose");
    let json = matches
        .get_one::<String>("log-format")
        .map(|f| f == "json")
        .unwrap_or(false);
    commands::init_logging(verbose, json);

    let result = match matches.subcommand() {
        Some(("run", sub)) => commands::run::run(&matches, sub).await,
        Some(("slack", sub)) => commands::slack::run(&matches, sub).await,
        Some(("email", sub)) => commands::email::run(&matches, sub).await,
        Some(("kube", sub)) => commands::kube::run(&matches, sub).await,
        Some(("capabilities", _)) => {
            commands::capabilities::run();
            Ok(())
        }
        _ => {
            println!("taskhooks v{}", VERSION);
            println!("Use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

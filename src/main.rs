use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{arg, command, value_parser, ArgAction, ArgMatches, Command};
use tracing::{debug, info};

use repodash::display::Symbols;
use repodash::{
    logging, AddForm, Config, DashError, FileStore, Notice, PageController, SyncOutcome,
};

fn cli() -> Command {
    command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(arg!(-v --verbose ... "More logging; repeat for more").action(ArgAction::Count))
        .arg(
            arg!(--config <PATH> "Config file to use instead of the default")
                .value_parser(value_parser!(PathBuf)),
        )
        .subcommand(
            Command::new("add")
                .about("Add a repository to the list")
                .arg(arg!(<name> "Display name"))
                .arg(arg!(<url> "Git URL, must end with .git"))
                .arg(arg!(--nickname <NICKNAME> "Optional short name"))
                .arg(arg!(--master "Flag this as the master repository").action(ArgAction::SetTrue)),
        )
        .subcommand(Command::new("list").about("Show all repositories, newest first"))
        .subcommand(
            Command::new("sync")
                .about("Mark a repository as synced")
                .arg(arg!(<url> "Repository URL"))
                .arg(
                    arg!(--"no-wait" "Return right after the pending write")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Remove a repository from the list")
                .arg(arg!(<url> "Repository URL")),
        )
        .subcommand(Command::new("watch").about("Show the list and redraw it on every change"))
        .subcommand(Command::new("config").about("Print the effective configuration"))
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    logging::init(matches.get_count("verbose"));

    match run(&matches).await {
        Ok(true) => (),
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{e:#}");
            process::exit(2);
        }
    }
}

/// `Ok(false)` when the intent was rejected and a notice was already printed.
async fn run(matches: &ArgMatches) -> Result<bool> {
    let explicit = matches.get_one::<PathBuf>("config").map(PathBuf::as_path);
    let (config, config_path) = Config::resolve(explicit)?;

    if let Some(("config", _)) = matches.subcommand() {
        print_config(&config, config_path)?;
        return Ok(true);
    }

    let store_path = config.store_path()?;
    debug!(path = %store_path.display(), "using store");
    let store = Arc::new(FileStore::new(store_path));
    let symbols = Symbols::detect(config.plain_text);

    let mut controller = PageController::new(Arc::clone(&store), config.sync_settings());
    controller
        .load()
        .await
        .context("Unable to load repositories")?;

    match matches.subcommand() {
        Some(("add", sub)) => {
            let mut form = AddForm::new()
                .name(arg_str(sub, "name"))
                .url(arg_str(sub, "url"))
                .nickname(sub.get_one::<String>("nickname").cloned().unwrap_or_default())
                .master(sub.get_flag("master"));
            Ok(report(controller.submit(&mut form).await))
        }
        Some(("list", _)) => {
            print!("{}", controller.render(&symbols).await);
            Ok(true)
        }
        Some(("sync", sub)) => {
            let url = arg_str(sub, "url");
            match controller.sync(&url).await {
                Ok(SyncOutcome::Skipped) => {
                    println!("{} is already syncing", url);
                    Ok(true)
                }
                Ok(SyncOutcome::Started(ticket)) if sub.get_flag("no-wait") => {
                    info!(url = %ticket.url(), "left sync running in the background");
                    println!("{url} is pending");
                    Ok(true)
                }
                Ok(SyncOutcome::Started(ticket)) => Ok(report(ticket.wait().await)),
                Err(e) => Ok(report(Err(e))),
            }
        }
        Some(("delete", sub)) => Ok(report(controller.delete(&arg_str(sub, "url")).await)),
        Some(("watch", _)) => {
            watch(&mut controller, &store, &config, &symbols).await?;
            Ok(true)
        }
        _ => unreachable!("subcommand_required is set"),
    }
}

async fn watch(
    controller: &mut PageController<FileStore>,
    store: &FileStore,
    config: &Config,
    symbols: &Symbols,
) -> Result<()> {
    controller
        .mount()
        .await
        .context("Unable to load repositories")?;
    let poller = store.watch_external(config.watch_interval());
    let mut revisions = controller.revisions();

    loop {
        println!("{}", controller.render(symbols).await);
        tokio::select! {
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    poller.abort();
    controller.unmount();
    Ok(())
}

fn print_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    match path {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no config directory, using defaults"),
    }
    print!("{}", toml::to_string(config).context("Unable to serialize config")?);
    println!("# store: {}", config.store_path()?.display());
    Ok(())
}

fn arg_str(matches: &ArgMatches, name: &str) -> String {
    matches.get_one::<String>(name).cloned().unwrap_or_default()
}

fn report(outcome: Result<Notice, DashError>) -> bool {
    let notice = match &outcome {
        Ok(notice) => notice.clone(),
        Err(e) => Notice::from(e),
    };
    println!("{notice}");
    !notice.is_error()
}

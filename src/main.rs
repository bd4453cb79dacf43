mod action;
mod app;
mod auth;
mod cache;
mod config;
mod destination;
mod error;
mod event;
mod factory;
mod feed;
mod follow;
mod github;
mod home;
mod hub;
mod listing;
mod loader;
mod paging;
mod prefs;
mod session;
#[cfg(test)]
mod testing;
mod tui;
mod types;
mod ui;
mod user;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::config::Config;
use crate::event::Event;
use crate::hub::Hub;
use crate::prefs::{FilePrefs, PrefStore};
use crate::session::Session;
use crate::tui::EventHandler;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Page to open: newsfeed, notifications, repos, issues, prs, gists,
    /// search, bookmarks, timeline, blog, trends or "last"
    #[arg(long)]
    page: Option<String>,

    /// Limit notifications to repositories of this owner
    #[arg(long, requires = "repo_name")]
    repo_owner: Option<String>,

    /// Limit notifications to this repository
    #[arg(long, requires = "repo_owner")]
    repo_name: Option<String>,

    /// Configured account to sign in with
    #[arg(long)]
    account: Option<String>,

    /// Open this user's profile on launch
    #[arg(long)]
    user: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tui::install_panic_hook();

    let config = Config::load();
    let prefs: Arc<dyn PrefStore> = Arc::new(FilePrefs::load());

    let account = config.account(cli.account.as_deref())?.clone();
    let (login, hub) = session::connect(&account, config.cache_ttl()).await?;

    let result = run(cli, config, prefs, login, hub).await;

    tui::restore()?;

    result
}

async fn run(
    cli: Cli,
    config: Config,
    prefs: Arc<dyn PrefStore>,
    login: String,
    hub: Arc<dyn Hub>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut terminal = tui::init()?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let session = Session::new(login, hub, prefs, action_tx.clone());

    let initial = destination::determine_initial(
        cli.page.as_deref(),
        Some(config.general.start_page.as_str()),
        session.prefs.as_ref(),
    );
    let notification_repo = cli.repo_owner.zip(cli.repo_name);
    info!(login = %session.login, page = initial.persisted_key(), "starting");

    let mut app = App::new(session, config, initial, notification_repo);
    if let Some(user) = cli.user.as_deref() {
        app.open_profile(user);
    }
    if let Some((_, rows)) = tui::size() {
        app.update(Action::Resize(rows));
    }

    let mut events = EventHandler::new(Duration::from_millis(16));

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    app.home.destroy();
    Ok(())
}

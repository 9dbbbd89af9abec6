mod api;
mod capture;
mod config;
mod error;
mod logging;
mod models;
mod report;
mod session;
mod ui;
mod validation;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{error, info};
use tui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};

use crate::api::ApiClient;
use crate::capture::{FrameSource, StillFileSource};
use crate::config::Config;
use crate::error::IntakeError;
use crate::models::Client;
use crate::report::{HttpImageFetcher, Report, ReportBuilder};
use crate::session::{EditSession, SaveTarget};
use crate::ui::{
    client_detail::{ClientDetailAction, ClientDetailState, handle_input as handle_detail_input, render_client_detail},
    client_wizard::{ClientWizardAction, ClientWizardState, handle_input as handle_wizard_input, render_client_wizard},
    clients::{ClientAction, ClientsState, handle_input as handle_clients_input, render_clients},
    components::popup::{Notification, render_notification},
    signup::{SignupAction, SignupState, handle_input as handle_signup_input, render_signup},
};
use crate::validation::validate_signup;

#[derive(Parser)]
#[command(name = "client-intake")]
#[command(about = "Register clients, capture their documents and print PDF reports", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive client desk (default)
    Tui,
    /// Write the PDF report for one client
    Report {
        /// Backend id of the client
        id: String,
        /// File name suffix: `{clientName}_{suffix}.pdf`
        #[arg(long, default_value = "report")]
        suffix: String,
        /// Output directory (overrides REPORTS_DIR)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Create an administrator account
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

// Represents the current screen in the app
#[derive(Clone, Copy, PartialEq, Eq)]
enum AppScreen {
    Clients,
    ClientDetail,
    ClientWizard,
    Signup,
}

// Main application state
struct AppState {
    config: Config,
    api: ApiClient,
    fetcher: HttpImageFetcher,
    screen: AppScreen,
    clients_state: ClientsState,
    detail_state: Option<ClientDetailState>,
    wizard_state: Option<ClientWizardState>,
    /// Screen to return to when the wizard closes
    wizard_origin: AppScreen,
    signup_state: Option<SignupState>,
    notification: Option<Notification>,
}

impl AppState {
    fn new(config: Config, api: ApiClient) -> Self {
        let fetcher = HttpImageFetcher::new(api.http().clone(), config.image_fetch_timeout());
        Self {
            config,
            api,
            fetcher,
            screen: AppScreen::Clients,
            clients_state: ClientsState::new(Vec::new()),
            detail_state: None,
            wizard_state: None,
            wizard_origin: AppScreen::Clients,
            signup_state: None,
            notification: None,
        }
    }

    fn notify(&mut self, notification: Notification) {
        self.notification = Some(notification);
    }

    /// Log a failed operation and tell the operator; the current screen stays as it was.
    fn notify_error(&mut self, what: &str, err: &IntakeError) {
        error!(error = %err, "{} failed", what);
        self.notify(Notification::error(format!("{}: {}", what, err)));
    }

    fn frame_source(&self) -> Box<dyn FrameSource> {
        Box::new(StillFileSource::new(
            self.config.capture_user_path.clone(),
            self.config.capture_environment_path.clone(),
        ))
    }

    fn open_wizard(&mut self, session: EditSession, origin: AppScreen) {
        self.wizard_state = Some(ClientWizardState::new(session, self.frame_source(), today()));
        self.wizard_origin = origin;
        self.screen = AppScreen::ClientWizard;
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::init()?;

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            logging::init_file(&config.log_file)?;
            run_tui(config).await
        }
        Command::Report { id, suffix, out } => {
            logging::init_stderr();
            let api = ApiClient::new(&config)?;
            let fetcher = HttpImageFetcher::new(api.http().clone(), config.image_fetch_timeout());
            let client = api.get_client(&id).await?;
            let dir = out.unwrap_or_else(|| config.reports_dir.clone());
            let (path, report) = write_report(&config, &fetcher, &client, &suffix, &dir).await?;
            println!("Wrote {} ({} pages)", path.display(), report.page_count());
            Ok(())
        }
        Command::Signup { name, email, password } => {
            logging::init_stderr();
            let errors = validate_signup(&name, &email, &password);
            if let Some(message) = errors.first() {
                bail!("{}", message);
            }
            let api = ApiClient::new(&config)?;
            let outcome = api.signup(name.trim(), email.trim(), &password).await?;
            println!("{}", outcome.message_or("Account created"));
            Ok(())
        }
    }
}

/// Build the report for `client` and write it into `dir`.
async fn write_report(
    config: &Config,
    fetcher: &HttpImageFetcher,
    client: &Client,
    suffix: &str,
    dir: &Path,
) -> Result<(PathBuf, Report), IntakeError> {
    let report = ReportBuilder::new(fetcher, &config.report_title)
        .build(Some(client), suffix, Local::now().naive_local())
        .await?;
    let path = report.save(dir)?;
    Ok((path, report))
}

async fn run_tui(config: Config) -> Result<()> {
    // Create app state
    let api = ApiClient::new(&config)?;
    let mut app_state = AppState::new(config, api);
    info!("starting client desk");

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Initial client list
    reload_clients(&mut app_state).await;

    let result = run_app(&mut terminal, &mut app_state).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        error!(error = %err, "client desk stopped");
        println!("Error: {}", err);
    }
    result
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app_state: &mut AppState) -> Result<()> {
    loop {
        // Drop stale notifications
        if app_state.notification.as_ref().is_some_and(Notification::is_expired) {
            app_state.notification = None;
        }

        // Draw current screen
        terminal.draw(|f| {
            match app_state.screen {
                AppScreen::Clients => render_clients(f, &mut app_state.clients_state),
                AppScreen::ClientDetail => {
                    if let Some(state) = &mut app_state.detail_state {
                        render_client_detail(f, state);
                    }
                }
                AppScreen::ClientWizard => {
                    if let Some(state) = &mut app_state.wizard_state {
                        render_client_wizard(f, state);
                    }
                }
                AppScreen::Signup => {
                    if let Some(state) = &mut app_state.signup_state {
                        render_signup(f, state);
                    }
                }
            }
            if let Some(notification) = &app_state.notification {
                render_notification(f, notification);
            }
        })?;

        // Handle input
        let should_quit = match app_state.screen {
            AppScreen::Clients => handle_clients_screen(app_state).await?,
            AppScreen::ClientDetail => handle_detail_screen(app_state).await?,
            AppScreen::ClientWizard => handle_wizard_screen(app_state).await?,
            AppScreen::Signup => handle_signup_screen(app_state).await?,
        };

        if should_quit {
            break;
        }
    }

    Ok(())
}

async fn reload_clients(app_state: &mut AppState) {
    match app_state.api.list_clients().await {
        Ok(clients) => app_state.clients_state.replace_clients(clients),
        Err(e) => app_state.notify_error("Loading clients", &e),
    }
}

async fn show_clients(app_state: &mut AppState) {
    app_state.detail_state = None;
    app_state.screen = AppScreen::Clients;
    reload_clients(app_state).await;
}

async fn report_for(app_state: &mut AppState, client: &Client) {
    let dir = app_state.config.reports_dir.clone();
    match write_report(&app_state.config, &app_state.fetcher, client, "report", &dir).await {
        Ok((path, _)) => app_state.notify(Notification::success(format!("Report saved to {}", path.display()))),
        Err(e) => app_state.notify_error("Report", &e),
    }
}

async fn handle_clients_screen(app_state: &mut AppState) -> Result<bool> {
    match handle_clients_input(&mut app_state.clients_state)? {
        Some(ClientAction::Quit) => return Ok(true),
        Some(ClientAction::Refresh) => {
            reload_clients(app_state).await;
            app_state.notify(Notification::info("Client list refreshed"));
        }
        Some(ClientAction::NewClient) => {
            app_state.open_wizard(EditSession::new_client(), AppScreen::Clients);
        }
        Some(ClientAction::Signup) => {
            app_state.signup_state = Some(SignupState::new());
            app_state.screen = AppScreen::Signup;
        }
        Some(ClientAction::ViewClient(id)) => match app_state.api.get_client(&id).await {
            Ok(client) => {
                app_state.detail_state = Some(ClientDetailState::new(client));
                app_state.screen = AppScreen::ClientDetail;
            }
            Err(e) => app_state.notify_error("Loading client", &e),
        },
        Some(ClientAction::EditClient(id)) => match app_state.api.get_client(&id).await {
            Ok(client) => app_state.open_wizard(EditSession::edit(&client), AppScreen::Clients),
            Err(e) => app_state.notify_error("Loading client", &e),
        },
        Some(ClientAction::DeleteClient(id)) => match app_state.api.delete_client(&id).await {
            Ok(outcome) => {
                app_state.notify(Notification::success(outcome.message_or("Client deleted")));
                // Refresh the list
                reload_clients(app_state).await;
            }
            Err(e) => app_state.notify_error("Delete", &e),
        },
        // Fetch the full record before building the report
        Some(ClientAction::Report(id)) => match app_state.api.get_client(&id).await {
            Ok(client) => report_for(app_state, &client).await,
            Err(e) => app_state.notify_error("Loading client", &e),
        },
        None => {}
    }

    Ok(false)
}

async fn handle_detail_screen(app_state: &mut AppState) -> Result<bool> {
    let Some(state) = &mut app_state.detail_state else {
        show_clients(app_state).await;
        return Ok(false);
    };

    match handle_detail_input(state)? {
        Some(ClientDetailAction::Back) => show_clients(app_state).await,
        Some(ClientDetailAction::Edit(client)) => {
            app_state.open_wizard(EditSession::edit(&client), AppScreen::ClientDetail);
        }
        Some(ClientDetailAction::Delete(id)) => match app_state.api.delete_client(&id).await {
            Ok(outcome) => {
                app_state.notify(Notification::success(outcome.message_or("Client deleted")));
                show_clients(app_state).await;
            }
            Err(e) => app_state.notify_error("Delete", &e),
        },
        Some(ClientDetailAction::Report(client)) => report_for(app_state, &client).await,
        None => {}
    }

    Ok(false)
}

async fn handle_wizard_screen(app_state: &mut AppState) -> Result<bool> {
    let Some(state) = &mut app_state.wizard_state else {
        show_clients(app_state).await;
        return Ok(false);
    };

    match handle_wizard_input(state)? {
        Some(ClientWizardAction::Cancel) => close_wizard(app_state, None).await,
        Some(ClientWizardAction::Save(upload)) => match app_state.api.save_client(&upload).await {
            Ok(outcome) => {
                app_state.notify(Notification::success(outcome.message_or("Client saved")));
                // Prefer the id the backend echoed back
                let id = match (&upload.target, outcome.client.and_then(|c| c.id)) {
                    (_, Some(id)) => Some(id),
                    (SaveTarget::Update(id), None) => Some(id.clone()),
                    (SaveTarget::Create, None) => None,
                };
                close_wizard(app_state, id).await;
            }
            // The draft stays open so the operator can retry.
            Err(e) => app_state.notify_error("Save", &e),
        },
        None => {}
    }

    Ok(false)
}

/// Leave the wizard, refreshing whichever screen opened it.
async fn close_wizard(app_state: &mut AppState, saved_id: Option<String>) {
    app_state.wizard_state = None;
    if app_state.wizard_origin != AppScreen::ClientDetail {
        show_clients(app_state).await;
        return;
    }

    let id = saved_id.or_else(|| {
        app_state
            .detail_state
            .as_ref()
            .and_then(|d| d.client().id.clone())
    });
    let Some(id) = id else {
        show_clients(app_state).await;
        return;
    };
    // Reload the detail view with the saved record
    match app_state.api.get_client(&id).await {
        Ok(client) => {
            app_state.detail_state = Some(ClientDetailState::new(client));
            app_state.screen = AppScreen::ClientDetail;
        }
        Err(e) => {
            app_state.notify_error("Loading client", &e);
            show_clients(app_state).await;
        }
    }
}

async fn handle_signup_screen(app_state: &mut AppState) -> Result<bool> {
    let Some(state) = &mut app_state.signup_state else {
        app_state.screen = AppScreen::Clients;
        return Ok(false);
    };

    match handle_signup_input(state)? {
        Some(SignupAction::Cancel) => {
            app_state.signup_state = None;
            app_state.screen = AppScreen::Clients;
        }
        Some(SignupAction::Submit { name, email, password }) => {
            match app_state.api.signup(&name, &email, &password).await {
                Ok(outcome) => {
                    app_state.notify(Notification::success(outcome.message_or("Account created")));
                    app_state.signup_state = None;
                    app_state.screen = AppScreen::Clients;
                }
                Err(e) => app_state.notify_error("Sign up", &e),
            }
        }
        None => {}
    }

    Ok(false)
}

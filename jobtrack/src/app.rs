use anyhow::{bail, Result};
use jobtrack_api::endpoints::job_applications::{ApplicationStatus, JobApplication};
use jobtrack_api::endpoints::ApplicationId;
use jobtrack_api::{ClassifiedError, Request};
use jobtrack_auth::{authorize, Access, Route, SessionManager, Settings, TokenStore};
use secrecy::SecretString;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::cli::Command;
use crate::dashboard::{Dashboard, DashboardState};

/// Application root: owns the session and turns commands into API calls.
pub struct App {
    settings: Settings,
    session: Arc<SessionManager>,
    abort: CancellationToken,
}

impl App {
    pub fn new(settings: Settings) -> Result<Self> {
        let store = Arc::new(TokenStore::new(&settings.origin()?)?);
        let session = jobtrack_auth::connect(&settings, store)?;
        Ok(Self::with_session(settings, Arc::new(session)))
    }

    pub fn with_session(settings: Settings, session: Arc<SessionManager>) -> Self {
        Self {
            settings,
            session,
            abort: CancellationToken::new(),
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        let abort = self.abort.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, cancelling retries");
                abort.cancel();
            }
        });

        let session = self.session.bootstrap().await?;
        if let Some(err) = session.error() {
            eprintln!("Previous session ended: {}", err);
        }

        self.execute(command).await
    }

    pub async fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::Login { token } => {
                if let Access::Redirect(_) = authorize(&self.session.session(), Route::Landing) {
                    if let Some(user) = self.session.session().user() {
                        println!("Already signed in as {}. Run `jobtrack logout` first.", user.email);
                    }
                    return Ok(());
                }

                let user = match token {
                    Some(token) => self.session.login(SecretString::from(token)).await?,
                    None => jobtrack_auth::interactive_login(&self.settings, &self.session).await?,
                };
                println!("Signed in as {} <{}>", user.name, user.email);
            }
            Command::Logout => {
                self.session.logout().await;
                println!("Signed out");
            }
            Command::Whoami => match self.session.session().user() {
                Some(user) => println!("{} <{}> ({})", user.name, user.email, user.id),
                None => println!("Not signed in"),
            },
            Command::List {
                page,
                page_size,
                search,
                status,
                date_range,
                date_from,
                date_to,
            } => {
                self.require_dashboard()?;
                let request = Request::job_applications()
                    .list()
                    .page(page)
                    .page_size(page_size)
                    .search(search.unwrap_or_default())
                    .statuses(
                        status
                            .iter()
                            .map(|s| ApplicationStatus::from(s.as_str()))
                            .collect::<Vec<_>>(),
                    )
                    .date_range(date_range.unwrap_or_default())
                    .date_from(date_from.unwrap_or_default())
                    .date_to(date_to.unwrap_or_default());

                let mut dashboard = self.dashboard();
                let result = dashboard.fetch(request).await;
                report(dashboard.state(), result)?;
                print_applications(dashboard.state());
            }
            Command::Add {
                company,
                position,
                status,
                location,
                url,
                notes,
            } => {
                self.require_dashboard()?;
                let mut request = Request::job_applications().create(company, position);
                if let Some(status) = status {
                    request = request.status(status.as_str());
                }
                if let Some(location) = location {
                    request = request.location(location);
                }
                if let Some(url) = url {
                    request = request.url(url);
                }
                if let Some(notes) = notes {
                    request = request.notes(notes);
                }

                let mut dashboard = self.dashboard();
                let result = dashboard.create(request).await;
                let created = report(dashboard.state(), result)?;
                println!("Added #{}: {} at {}", created.id, created.position, created.company_name);
            }
            Command::SetStatus { id, status } => {
                self.require_dashboard()?;
                let mut dashboard = self.dashboard();
                let result = dashboard
                    .update_status(ApplicationId::new(id), ApplicationStatus::from(status.as_str()))
                    .await;
                let updated = report(dashboard.state(), result)?;
                println!("#{} is now {}", updated.id, updated.status.label());
            }
            Command::ProcessEmails { query, max_results } => {
                self.require_dashboard()?;
                let mut dashboard = self.dashboard();
                let result = dashboard.process_emails(&query, max_results).await;
                let summary = report(dashboard.state(), result)?;
                println!("{}", serde_json::to_string_pretty(&summary)?);
                print_applications(dashboard.state());
            }
        }

        Ok(())
    }

    fn dashboard(&self) -> Dashboard {
        Dashboard::new(self.session.clone(), self.settings.max_retries).with_abort(self.abort.clone())
    }

    fn require_dashboard(&self) -> Result<()> {
        match authorize(&self.session.session(), Route::Dashboard) {
            Access::Allow => Ok(()),
            Access::Redirect(route) => {
                tracing::debug!(redirect = route.path(), "Dashboard access denied");
                bail!("Not signed in. Run `jobtrack login` first.")
            }
        }
    }
}

fn report<T>(state: &DashboardState, result: Result<T, jobtrack_auth::SessionError>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => {
            if let Some(classified) = &state.error {
                print_error(classified);
            }
            Err(err.into())
        }
    }
}

fn print_error(err: &ClassifiedError) {
    match err.status() {
        Some(status) => eprintln!("[{}] {} (HTTP {})", err.kind(), err.message(), status),
        None => eprintln!("[{}] {}", err.kind(), err.message()),
    }
    if let Some(details) = err.details() {
        for (field, problem) in details {
            eprintln!("  {}: {}", field, problem);
        }
    }
}

fn print_applications(state: &DashboardState) {
    if state.applications.is_empty() {
        println!("No applications found.");
        return;
    }

    println!(
        "{:>6}  {:<24}  {:<28}  {:<20}  {}",
        "ID", "COMPANY", "POSITION", "STATUS", "APPLIED"
    );
    for application in &state.applications {
        println!("{}", format_row(application));
    }
    println!(
        "\nPage {} · {} total",
        state.pagination.current, state.pagination.count
    );
}

fn format_row(application: &JobApplication) -> String {
    let applied = application
        .application_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    format!(
        "{:>6}  {:<24}  {:<28}  {:<20}  {}",
        application.id,
        truncate(&application.company_name, 24),
        truncate(&application.position, 28),
        application.status.label(),
        applied
    )
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(width.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("Acme", 10), "Acme");
        assert_eq!(truncate("Zürich Instruments", 6), "Züric…");
    }

    #[test]
    fn row_shows_status_label() {
        let application: JobApplication = serde_json::from_value(serde_json::json!({
            "id": 3,
            "company_name": "Acme",
            "position": "Engineer",
            "status": "offer_received",
            "application_date": "2024-05-02T08:00:00Z"
        }))
        .unwrap();
        let row = format_row(&application);
        assert!(row.contains("Offer Received"));
        assert!(row.contains("2024-05-02"));
    }
}

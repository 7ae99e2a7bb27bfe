use jobtrack_api::endpoints::job_applications::{
    ApplicationStatus, CreateApplication, JobApplication, ListApplications, ProcessEmails,
};
use jobtrack_api::endpoints::{ApplicationId, Page};
use jobtrack_api::{ClassifiedError, Request};
use jobtrack_auth::{SessionError, SessionManager};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pagination {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub current: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardState {
    pub applications: Vec<JobApplication>,
    pub pagination: Pagination,
    pub loading: bool,
    pub error: Option<ClassifiedError>,
}

/// The applications list the dashboard shows, kept in sync with the API.
///
/// Every call goes through the session's retry policy, so network blips are
/// retried and a rejected credential signs the user out.
pub struct Dashboard {
    session: Arc<SessionManager>,
    max_retries: u32,
    abort: Option<CancellationToken>,
    state: DashboardState,
}

impl Dashboard {
    pub fn new(session: Arc<SessionManager>, max_retries: u32) -> Self {
        Self {
            session,
            max_retries,
            abort: None,
            state: DashboardState::default(),
        }
    }

    /// Stop retrying once `abort` fires.
    pub fn with_abort(mut self, abort: CancellationToken) -> Self {
        self.abort = Some(abort);
        self
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    pub async fn fetch(&mut self, request: ListApplications) -> Result<(), SessionError> {
        self.state.loading = true;
        self.state.error = None;

        let client = self.session.client();
        let request = &request;
        let result: Result<Page<JobApplication>, SessionError> = self
            .session
            .retry_with_backoff(
                move || client.request(request.clone()),
                self.max_retries,
                self.abort.as_ref(),
            )
            .await;
        self.state.loading = false;

        match result {
            Ok(page) => {
                tracing::debug!(count = page.count, page = request.current_page(), "Loaded applications");
                self.state.applications = page.results;
                self.state.pagination = Pagination {
                    count: page.count,
                    next: page.next,
                    previous: page.previous,
                    current: request.current_page(),
                };
                Ok(())
            }
            Err(err) => Err(self.record(err)),
        }
    }

    pub async fn create(&mut self, request: CreateApplication) -> Result<JobApplication, SessionError> {
        self.state.error = None;

        let client = self.session.client();
        let request = &request;
        let result = self
            .session
            .retry_with_backoff(
                move || client.request(request.clone()),
                self.max_retries,
                self.abort.as_ref(),
            )
            .await;

        match result {
            Ok(application) => {
                self.state.applications.insert(0, application.clone());
                self.state.pagination.count += 1;
                Ok(application)
            }
            Err(err) => Err(self.record(err)),
        }
    }

    pub async fn update_status(
        &mut self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<JobApplication, SessionError> {
        self.state.error = None;

        let client = self.session.client();
        let request = Request::job_applications().update_status(id, status);
        let result = self
            .session
            .retry_with_backoff(
                move || client.request(request.clone()),
                self.max_retries,
                self.abort.as_ref(),
            )
            .await;

        match result {
            Ok(updated) => {
                if let Some(row) = self.state.applications.iter_mut().find(|a| a.id == id) {
                    row.status = updated.status.clone();
                }
                Ok(updated)
            }
            Err(err) => Err(self.record(err)),
        }
    }

    /// Import applications from matching emails, then reload the first page.
    pub async fn process_emails(
        &mut self,
        query: &str,
        max_results: u32,
    ) -> Result<Value, SessionError> {
        self.state.error = None;

        let client = self.session.client();
        let request: ProcessEmails = Request::job_applications()
            .process_emails(query)
            .max_results(max_results);
        let result = self
            .session
            .retry_with_backoff(
                move || client.request(request.clone()),
                self.max_retries,
                self.abort.as_ref(),
            )
            .await;

        let summary = result.map_err(|err| self.record(err))?;

        // A failed refresh is recorded in the state; the import itself succeeded.
        if let Err(e) = self.fetch(ListApplications::new()).await {
            tracing::warn!("Failed to refresh applications after import: {}", e);
        }

        Ok(summary)
    }

    fn record(&mut self, err: SessionError) -> SessionError {
        tracing::warn!("Dashboard request failed: {}", err);
        self.state.error = err.classified().cloned();
        err
    }
}

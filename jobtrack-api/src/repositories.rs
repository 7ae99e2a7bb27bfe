use crate::endpoints::{
    ApplicationId,
    job_applications::{
        ApplicationStatus, CreateApplication, ListApplications, ProcessEmails,
        UpdateApplicationStatus,
    },
};

#[derive(Default)]
pub struct JobApplicationRepository;

impl JobApplicationRepository {
    pub fn new() -> Self {
        Self
    }

    pub fn list(&self) -> ListApplications {
        ListApplications::new()
    }

    pub fn create(
        &self,
        company_name: impl Into<String>,
        position: impl Into<String>,
    ) -> CreateApplication {
        CreateApplication::new(company_name, position)
    }

    pub fn update_status(
        &self,
        id: ApplicationId,
        status: impl Into<ApplicationStatus>,
    ) -> UpdateApplicationStatus {
        UpdateApplicationStatus::new(id, status)
    }

    pub fn process_emails(&self, query: impl Into<String>) -> ProcessEmails {
        ProcessEmails::new(query)
    }
}

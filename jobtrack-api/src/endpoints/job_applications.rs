use super::{ApplicationId, Page};
use crate::macros::setter;
use crate::request::{ApiRequest, Method};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt::Display;
use std::str::FromStr;

const DEFAULT_PAGE_SIZE: u32 = 10;
const DEFAULT_MAX_RESULTS: u32 = 10;

// Common

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Applied,
    InterviewScheduled,
    Interviewing,
    OfferReceived,
    Rejected,
    Accepted,
    Withdrawn,
    /// A status this client does not know about, kept verbatim.
    #[serde(untagged)]
    Other(String),
}

impl ApplicationStatus {
    pub const KNOWN: [ApplicationStatus; 7] = [
        Self::Applied,
        Self::InterviewScheduled,
        Self::Interviewing,
        Self::OfferReceived,
        Self::Rejected,
        Self::Accepted,
        Self::Withdrawn,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Applied => "applied",
            Self::InterviewScheduled => "interview_scheduled",
            Self::Interviewing => "interviewing",
            Self::OfferReceived => "offer_received",
            Self::Rejected => "rejected",
            Self::Accepted => "accepted",
            Self::Withdrawn => "withdrawn",
            Self::Other(status) => status,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Applied => "Applied",
            Self::InterviewScheduled => "Interview Scheduled",
            Self::Interviewing => "Interviewing",
            Self::OfferReceived => "Offer Received",
            Self::Rejected => "Rejected",
            Self::Accepted => "Accepted",
            Self::Withdrawn => "Withdrawn",
            Self::Other(status) => status,
        }
    }
}

impl Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = Self::KNOWN
            .into_iter()
            .find(|known| known.as_str() == s)
            .unwrap_or_else(|| Self::Other(s.to_string()));
        Ok(status)
    }
}

impl From<&str> for ApplicationStatus {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: ApplicationId,
    pub company_name: String,
    pub position: String,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub application_date: Option<DateTime<Utc>>,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_follow_up: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub salary_range: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub remote_option: bool,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub communications: Vec<Communication>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Communication {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub follow_up_date: Option<DateTime<Utc>>,
}

// Requests

#[derive(Debug, Clone, PartialEq)]
pub struct ListApplications {
    page: u32,
    page_size: u32,
    search: String,
    statuses: Vec<ApplicationStatus>,
    date_range: String,
    date_from: String,
    date_to: String,
}

impl Default for ListApplications {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: String::new(),
            statuses: Vec::new(),
            date_range: String::new(),
            date_from: String::new(),
            date_to: String::new(),
        }
    }
}

impl ListApplications {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(page: u32);
    setter!(page_size: u32);
    setter!(search: String);
    setter!(statuses: Vec<ApplicationStatus>);
    setter!(date_range: String);
    setter!(date_from: String);
    setter!(date_to: String);

    pub fn current_page(&self) -> u32 {
        self.page
    }
}

impl ApiRequest for ListApplications {
    type Response = Page<JobApplication>;

    const METHOD: Method = Method::Get;

    fn endpoint(&self) -> Cow<'_, str> {
        "/job_applications/".into()
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        let status = self
            .statuses
            .iter()
            .map(ApplicationStatus::as_str)
            .collect::<Vec<_>>()
            .join(",");
        for (key, value) in [
            ("search", self.search.clone()),
            ("status", status),
            ("date_range", self.date_range.clone()),
            ("date_from", self.date_from.clone()),
            ("date_to", self.date_to.clone()),
        ] {
            if !value.is_empty() {
                query.push((key, value));
            }
        }
        query
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateApplication {
    company_name: String,
    position: String,
    status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    salary_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote_option: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_follow_up: Option<DateTime<Utc>>,
}

impl CreateApplication {
    pub fn new(company_name: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            position: position.into(),
            status: ApplicationStatus::Applied,
            job_description: None,
            notes: None,
            location: None,
            salary_range: None,
            remote_option: None,
            source: None,
            url: None,
            next_follow_up: None,
        }
    }

    setter!(status: ApplicationStatus);
    setter!(opt job_description: String);
    setter!(opt notes: String);
    setter!(opt location: String);
    setter!(opt salary_range: String);
    setter!(opt remote_option: bool);
    setter!(opt source: String);
    setter!(opt url: String);
    setter!(opt next_follow_up: DateTime<Utc>);
}

impl ApiRequest for CreateApplication {
    type Response = JobApplication;

    const METHOD: Method = Method::Post;

    fn endpoint(&self) -> Cow<'_, str> {
        "/job_applications/".into()
    }

    fn body(&self) -> Result<Option<Value>, serde_json::Error> {
        serde_json::to_value(self).map(Some)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateApplicationStatus {
    #[serde(skip)]
    id: ApplicationId,
    status: ApplicationStatus,
}

impl UpdateApplicationStatus {
    pub fn new(id: ApplicationId, status: impl Into<ApplicationStatus>) -> Self {
        Self {
            id,
            status: status.into(),
        }
    }
}

impl ApiRequest for UpdateApplicationStatus {
    type Response = JobApplication;

    const METHOD: Method = Method::Patch;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/job_applications/{}/", self.id).into()
    }

    fn body(&self) -> Result<Option<Value>, serde_json::Error> {
        serde_json::to_value(self).map(Some)
    }
}

/// Asks the server to scan the user's mailbox and import matching applications.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessEmails {
    query: String,
    max_results: u32,
}

impl ProcessEmails {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    setter!(max_results: u32);
}

impl ApiRequest for ProcessEmails {
    type Response = Value;

    const METHOD: Method = Method::Post;

    fn endpoint(&self) -> Cow<'_, str> {
        "/job_applications/process_emails/".into()
    }

    fn body(&self) -> Result<Option<Value>, serde_json::Error> {
        serde_json::to_value(self).map(Some)
    }
}

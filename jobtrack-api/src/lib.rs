mod client;
pub mod endpoints;
mod error;
mod macros;
pub mod repositories;
mod request;

pub use crate::client::{
    Client, ClientBuilder, CredentialSource, DEFAULT_BASE_URL, DEFAULT_TIMEOUT,
    DEFAULT_USERINFO_URL, StaticCredential,
};
pub use crate::endpoints::user::UserProfile;
pub use crate::error::{ClassifiedError, ErrorKind, RawFailure, classify};
pub use crate::request::{ApiRequest, Method};
use repositories::*;

pub struct Request;

impl Request {
    pub fn job_applications() -> JobApplicationRepository {
        JobApplicationRepository::new()
    }
}

use crate::endpoints::user::{UserInfo, UserProfile};
use crate::error::{ClassifiedError, RawFailure, classify};
use crate::macros::setter;
use crate::request::{ApiRequest, Method};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Where the client reads the bearer credential from before each request.
pub trait CredentialSource: Send + Sync {
    fn credential(&self) -> Option<SecretString>;
}

/// A fixed credential, or none at all.
pub struct StaticCredential(Option<SecretString>);

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(SecretString::from(token.into())))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl CredentialSource for StaticCredential {
    fn credential(&self) -> Option<SecretString> {
        self.0.clone()
    }
}

pub struct ClientBuilder {
    credentials: Arc<dyn CredentialSource>,
    base_url: String,
    userinfo_url: String,
    timeout: Duration,
}

impl ClientBuilder {
    setter!(base_url: String);
    setter!(userinfo_url: String);
    setter!(timeout: Duration);

    pub fn build(self) -> Result<Client, ClassifiedError> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| classify(RawFailure::from(e)))?;

        Ok(Client {
            http,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            userinfo_url: self.userinfo_url,
            credentials: self.credentials,
        })
    }
}

/// Authenticated JSON client for the tracker API.
///
/// Holds no session state of its own: the credential is read from the
/// [`CredentialSource`] on every call, and failures come back classified.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    userinfo_url: String,
    credentials: Arc<dyn CredentialSource>,
}

impl Client {
    pub fn builder(credentials: Arc<dyn CredentialSource>) -> ClientBuilder {
        ClientBuilder {
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            userinfo_url: DEFAULT_USERINFO_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Send a JSON request to `path` under the base URL.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<Value, ClassifiedError> {
        let url = self.url_for(path);
        self.execute(method, &url, &[], body, extra_headers).await
    }

    pub async fn request<R>(&self, request: R) -> Result<R::Response, ClassifiedError>
    where
        R: ApiRequest,
    {
        let body = request.body().map_err(|e| {
            classify(RawFailure::Setup {
                message: format!("Failed to encode request body: {}", e),
            })
        })?;
        let url = self.url_for(&request.endpoint());
        let value = self
            .execute(R::METHOD, &url, &request.query(), body.as_ref(), None)
            .await?;
        decode(value)
    }

    /// Ask the identity provider who the stored credential belongs to.
    pub async fn fetch_user_profile(&self) -> Result<UserProfile, ClassifiedError> {
        if self.credentials.credential().is_none() {
            tracing::debug!("No credential available for userinfo lookup");
            return Err(classify(RawFailure::Status {
                status: 401,
                body: String::new(),
            }));
        }

        let value = self
            .execute(Method::Get, &self.userinfo_url, &[], None, None)
            .await?;
        let info: UserInfo = decode(value)?;
        Ok(info.into())
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        query: &[(&'static str, String)],
        body: Option<&Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<Value, ClassifiedError> {
        let mut builder = self
            .http
            .request(method.into(), url)
            .header(ACCEPT, "application/json");

        if let Some(mut headers) = extra_headers {
            // The credential source owns the Authorization header
            if headers.remove(AUTHORIZATION).is_some() {
                tracing::debug!(url, "Dropping caller-supplied Authorization header");
            }
            builder = builder.headers(headers);
        }
        if let Some(token) = self.credentials.credential() {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        tracing::debug!(%method, url, "Sending request");

        let response = builder.send().await.map_err(|e| {
            let err = classify(RawFailure::from(e));
            tracing::warn!(%method, url, kind = %err.kind(), "Request failed without a response");
            err
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify(RawFailure::from(e)))?;

        if !status.is_success() {
            let err = classify(RawFailure::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
            tracing::warn!(
                %method,
                url,
                status = status.as_u16(),
                kind = %err.kind(),
                "Request failed"
            );
            return Err(err);
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            classify(RawFailure::MalformedBody {
                message: format!("Malformed response body: {}", e),
            })
        })
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ClassifiedError> {
    serde_json::from_value(value).map_err(|e| {
        classify(RawFailure::MalformedBody {
            message: format!("Unexpected response shape: {}", e),
        })
    })
}

use serde::{Deserialize, Serialize};

/// The signed-in user, as cached next to the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub picture: String,
}

/// Body of the identity provider's userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
}

impl From<UserInfo> for UserProfile {
    fn from(info: UserInfo) -> Self {
        Self {
            id: info.sub,
            email: info.email,
            name: info.name,
            picture: info.picture,
        }
    }
}

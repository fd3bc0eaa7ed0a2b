//! Auth configuration types

use crate::error::{Error, Result};
use crate::types::Deployment;

/// Authentication configuration
#[derive(Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// HTTP Basic authentication
    Basic {
        /// Username (account email on cloud)
        username: String,
        /// Password or API token
        password: String,
    },

    /// Bearer token authentication
    Bearer {
        /// The bearer token
        token: String,
    },
}

impl AuthConfig {
    /// Pick the credential shape a deployment expects.
    ///
    /// Cloud authenticates with `username:access_token` over Basic auth. Server
    /// and data center take the token as a personal access token; passing a
    /// username there breaks authentication, so it is ignored.
    pub fn for_deployment(
        deployment: Deployment,
        username: Option<&str>,
        access_token: &str,
    ) -> Result<Self> {
        match deployment {
            Deployment::Cloud => {
                let username = username
                    .filter(|u| !u.is_empty())
                    .ok_or_else(|| Error::missing_field("credentials.username"))?;
                Ok(Self::Basic {
                    username: username.to_string(),
                    password: access_token.to_string(),
                })
            }
            Deployment::Server => Ok(Self::Bearer {
                token: access_token.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Bearer { .. } => f.debug_struct("Bearer").finish_non_exhaustive(),
        }
    }
}

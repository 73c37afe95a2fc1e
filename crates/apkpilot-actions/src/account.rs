//! Account and repository endpoints

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::client::{api_message, check_status, header_list, GitHubActionsClient};
use crate::error::{ActionsError, Result};

/// Scopes a classic token needs to create repositories and push workflows
pub const REQUIRED_SCOPES: &[&str] = &["repo", "workflow"];

/// The authenticated account behind a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    /// OAuth scopes granted to the token; empty for fine-grained tokens
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Identity {
    /// Required scopes the token does not report.
    ///
    /// Fine-grained tokens report no scopes at all, and any `repo` scope is
    /// taken as sufficient, so both cases yield an empty list.
    pub fn missing_scopes(&self, required: &[&str]) -> Vec<String> {
        if self.scopes.is_empty() || self.scopes.iter().any(|s| s.contains("repo")) {
            return Vec::new();
        }

        required
            .iter()
            .filter(|scope| !self.scopes.iter().any(|s| s == *scope))
            .map(|scope| scope.to_string())
            .collect()
    }
}

/// Request body for `POST /user/repos` or `POST /orgs/{org}/repos`
#[derive(Debug, Clone, Serialize)]
pub struct CreateRepository {
    pub name: String,
    pub description: String,
    pub private: bool,
    pub auto_init: bool,
    /// Organization to create the repository in; the authenticated user when unset
    #[serde(skip)]
    pub organization: Option<String>,
}

impl CreateRepository {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: format!("Android APK build for {}", name),
            name,
            private: false,
            auto_init: false,
            organization: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    pub fn in_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }
}

/// Result of a repository creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryCreation {
    Created,
    AlreadyExists,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
    #[serde(default)]
    name: Option<String>,
}

impl GitHubActionsClient {
    /// Check the token against `GET /user`
    #[instrument(skip(self))]
    pub async fn verify_credentials(&self) -> Result<Identity> {
        let url = self.endpoint("user");
        let response = self.request(Method::GET, &url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "token verification failed");
            return Err(ActionsError::Authentication(format!(
                "GitHub rejected the token ({}): {}",
                status.as_u16(),
                api_message(&body)
            )));
        }

        let scopes = header_list(response.headers(), "x-oauth-scopes");
        let user: UserResponse = response.json().await?;
        info!(login = %user.login, scopes = scopes.len(), "verified GitHub credentials");

        Ok(Identity {
            login: user.login,
            name: user.name,
            scopes,
        })
    }

    /// Create a repository for the authenticated user, or in the request's organization
    #[instrument(skip(self, request), fields(name = %request.name, organization = ?request.organization))]
    pub async fn create_repository(&self, request: &CreateRepository) -> Result<RepositoryCreation> {
        let url = match &request.organization {
            Some(org) => self.endpoint(&format!("orgs/{}/repos", org)),
            None => self.endpoint("user/repos"),
        };
        let response = self
            .request(Method::POST, &url)
            .json(request)
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => {
                info!(name = %request.name, "created repository");
                Ok(RepositoryCreation::Created)
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                let body = response.text().await.unwrap_or_default();
                if body.contains("already exists") {
                    info!(name = %request.name, "repository already exists");
                    Ok(RepositoryCreation::AlreadyExists)
                } else {
                    Err(ActionsError::Api {
                        status: 422,
                        message: api_message(&body),
                    })
                }
            }
            StatusCode::FORBIDDEN => Err(ActionsError::PermissionDenied(
                "creating repositories requires a token with the 'repo' scope".to_string(),
            )),
            _ => {
                check_status(response, "repository creation").await?;
                Ok(RepositoryCreation::Created)
            }
        }
    }
}

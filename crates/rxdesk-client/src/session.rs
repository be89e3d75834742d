//! Client-side login state.
//!
//! A [`Session`] owns the current user and writes the session token into the
//! transport shared by every sub-client of the [`crate::RxClient`] it came
//! from, so later drug, prescription and audit calls are authenticated.

use crate::auth::AuthClient;
use crate::error::ClientError;
use crate::types::{LoginRequest, RegisterRequest, Role, User};

/// The logged-in user, if any.
#[derive(Debug, Clone)]
pub struct Session {
    auth: AuthClient,
    user: Option<User>,
}

impl Session {
    pub(crate) fn new(auth: AuthClient) -> Self {
        Self { auth, user: None }
    }

    /// Log in and apply the returned token to subsequent requests.
    pub async fn login(&mut self, req: &LoginRequest) -> Result<User, ClientError> {
        let resp = self.auth.login(req).await?;
        let (Some(user), Some(token)) = (resp.user, resp.token) else {
            return Err(ClientError::Api {
                endpoint: "POST /v1/auth/login".to_string(),
                status: 200,
                message: resp
                    .message
                    .unwrap_or_else(|| "login response carried no session".to_string()),
            });
        };
        self.auth.transport().set_token(Some(token));
        tracing::info!(username = %user.username, "logged in");
        self.user = Some(user.clone());
        Ok(user)
    }

    /// Register an account. Does not log in.
    pub async fn register(&self, req: &RegisterRequest) -> Result<User, ClientError> {
        let resp = self.auth.register(req).await?;
        resp.user.ok_or_else(|| ClientError::Api {
            endpoint: "POST /v1/auth/register".to_string(),
            status: 201,
            message: "registration response carried no user".to_string(),
        })
    }

    /// Adopt an existing token and load its account.
    ///
    /// The token is dropped again if the server does not recognize it.
    pub async fn resume(&mut self, token: impl Into<String>) -> Result<Option<User>, ClientError> {
        self.auth.transport().set_token(Some(token.into()));
        match self.auth.me().await {
            Ok(user) => {
                self.user = user.clone();
                Ok(user)
            }
            Err(e) => {
                self.auth.transport().set_token(None);
                self.user = None;
                Err(e)
            }
        }
    }

    /// Log out. Local state is cleared even if the server call fails.
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        let result = self.auth.logout().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "logout request failed; clearing local session anyway");
        }
        self.auth.transport().set_token(None);
        self.user = None;
        result
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role == Role::Admin)
    }
}

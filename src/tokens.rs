//! Token issuance.
//!
//! `create_authentication_tokens` trades a username and password for an
//! operation token (short-lived, used as the bearer token on every call) and
//! a refresh token. It is the one command sent without an Authorization
//! header. `refresh_operation_token` sends the refresh token as bearer and
//! returns a new operation token.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::{AdminCommand, AdminOperation};
use crate::error::Result;
use crate::session::Session;

/// Tokens returned by `create_authentication_tokens`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub operation_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("operation_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct OperationToken {
    operation_token: String,
}

impl Session {
    /// Issue operation and refresh tokens for a user
    ///
    /// Any bearer token on this session is left off the request.
    pub fn create_authentication_tokens(&self, username: &str, password: &str) -> Result<TokenPair> {
        debug!(username, "requesting authentication tokens");
        AdminCommand::new(AdminOperation::CreateAuthenticationTokens)
            .username(username)
            .password(password)
            .process_as(&self.without_auth_token())
    }

    /// Exchange a refresh token for a new operation token
    pub fn refresh_operation_token(&self, refresh_token: &str) -> Result<String> {
        debug!("refreshing operation token");
        let token: OperationToken = AdminCommand::new(AdminOperation::RefreshOperationToken)
            .process_as(&self.with_auth_token(refresh_token))?;
        Ok(token.operation_token)
    }

    /// Log in and return a session authenticated with the new operation token
    pub fn login(&self, username: &str, password: &str) -> Result<(Self, TokenPair)> {
        let tokens = self.create_authentication_tokens(username, password)?;
        Ok((self.with_auth_token(tokens.operation_token.clone()), tokens))
    }
}

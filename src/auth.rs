//! Admin sign-in for the back-office.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("email and password are required")]
    MissingCredentials,
    #[error("invalid email or password")]
    InvalidCredentials,
}

/// Holds the admin accounts and the current session.
///
/// Session changes are broadcast on a watch channel; subscribers always see the latest.
pub struct AdminAuth {
    accounts: Vec<Credentials>,
    session: watch::Sender<Option<Session>>,
}

impl AdminAuth {
    pub fn new(accounts: Vec<Credentials>) -> Self {
        let (session, _) = watch::channel(None);
        Self { accounts, session }
    }

    pub fn sign_in(&self, credentials: Credentials) -> Result<Session, AuthError> {
        let email = credentials.email.trim().to_lowercase();
        if email.is_empty() || credentials.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let known = self.accounts.iter().any(|account| {
            account.email.trim().eq_ignore_ascii_case(&email)
                && account.password == credentials.password
        });
        if !known {
            warn!(email = %email, "admin sign-in refused");
            return Err(AuthError::InvalidCredentials);
        }

        let session = Session {
            email,
            signed_in_at: Utc::now(),
        };
        info!(email = %session.email, "admin signed in");
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    pub fn session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    pub fn sign_out(&self) {
        if self.session.send_replace(None).is_some() {
            info!("admin signed out");
        }
    }

    /// Receiver notified on every sign-in and sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }
}

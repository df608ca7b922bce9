//! Session Controller: the wallet connection state machine.
//!
//! `connect()` is split into `begin_connect` and `complete_connect` around the provider call.
//! Every `begin_connect` and every `disconnect` bumps the generation, so a provider response
//! carrying an older generation is reported as [`MarketError::StaleResponse`] and leaves the
//! session untouched.

use nm_api_types::{AccountId, Session};
use nm_provider_client::IdentityError;
use tracing::{debug, info, warn};

use crate::error::MarketError;

/// Proof that a connect request was started, consumed by [`SessionController::complete_connect`].
#[derive(Debug)]
pub struct ConnectTicket {
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountsChange {
    /// Not connected, push-events are not ours to handle.
    Ignored,
    Unchanged,
    Switched(AccountId),
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisconnectOutcome {
    /// The session was not already `Disconnected`.
    pub changed: bool,
    /// Push-events were registered and must be dropped by the caller.
    pub unsubscribe: bool,
}

#[derive(Debug, Default)]
pub struct SessionController {
    session: Session,
    generation: u64,
    subscribed: bool,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Enter `Connecting`. Returns `None` when a request is already pending or a wallet is
    /// already connected.
    pub fn begin_connect(&mut self) -> Option<ConnectTicket> {
        match self.session {
            Session::Connecting | Session::Connected { .. } => {
                debug!(status = ?self.session.status(), "connect ignored");
                None
            }
            Session::Disconnected | Session::Failed { .. } => {
                self.generation += 1;
                self.session = Session::Connecting;
                Some(ConnectTicket {
                    generation: self.generation,
                })
            }
        }
    }

    /// Apply the provider's answer to a connect request.
    ///
    /// On `Ok(account)` the session is connected and the caller must register for push-events
    /// and refresh user data. Provider failures are returned after the session moved to `Failed`.
    pub fn complete_connect(
        &mut self,
        ticket: ConnectTicket,
        response: Result<Vec<AccountId>, IdentityError>,
    ) -> Result<AccountId, MarketError> {
        if ticket.generation != self.generation || self.session != Session::Connecting {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale provider response"
            );
            return Err(MarketError::StaleResponse);
        }

        let error = match response {
            Ok(accounts) => match accounts.into_iter().next() {
                Some(account_id) => {
                    info!(account = %account_id, "wallet connected");
                    self.session = Session::Connected {
                        account_id: account_id.clone(),
                    };
                    self.subscribed = true;
                    return Ok(account_id);
                }
                None => MarketError::NoAccounts,
            },
            Err(err) => MarketError::from(err),
        };

        warn!(error = %error, "wallet connection failed");
        self.session = Session::Failed {
            last_error: error.to_string(),
        };
        Err(error)
    }

    /// Valid from every state; also invalidates any pending connect request.
    pub fn disconnect(&mut self) -> DisconnectOutcome {
        self.generation += 1;
        let changed = self.session != Session::Disconnected;
        let unsubscribe = std::mem::replace(&mut self.subscribed, false);
        if changed {
            info!("wallet disconnected");
        }
        self.session = Session::Disconnected;
        DisconnectOutcome {
            changed,
            unsubscribe,
        }
    }

    /// Provider pushed a new account list.
    pub fn accounts_changed(&mut self, accounts: &[AccountId]) -> AccountsChange {
        let Session::Connected { account_id } = &self.session else {
            return AccountsChange::Ignored;
        };
        match accounts.first() {
            None => {
                self.disconnect();
                AccountsChange::Disconnected
            }
            Some(first) if first == account_id => AccountsChange::Unchanged,
            Some(first) => {
                info!(from = %account_id, to = %first, "active account switched");
                self.session = Session::Connected {
                    account_id: first.clone(),
                };
                AccountsChange::Switched(first.clone())
            }
        }
    }
}

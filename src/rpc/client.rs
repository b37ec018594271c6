use std::time::Duration;

use derive_more::Display;
use tracing::debug;

use super::contract::{LedgerCommand, LedgerReply};

#[derive(Debug, Display)]
pub enum RpcError {
    #[display(fmt = "ledger call timed out")]
    Timeout,
    #[display(fmt = "ledger transport error: {}", _0)]
    Transport(reqwest::Error),
}

impl std::error::Error for RpcError {}

/// Request/reply client for the leave ledger. One HTTP POST per call,
/// no connection state beyond the pooled transport, and a hard timeout
/// so a silent ledger cannot hang external callers forever.
#[derive(Clone)]
pub struct LedgerClient {
    http: reqwest::Client,
    endpoint: String,
}

impl LedgerClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build ledger RPC client");
        Self {
            http,
            endpoint: endpoint.to_string(),
        }
    }

    pub async fn call(&self, cmd: &LedgerCommand) -> Result<LedgerReply, RpcError> {
        debug!(endpoint = %self.endpoint, "dispatching ledger command");

        let response = self
            .http
            .post(&self.endpoint)
            .json(cmd)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RpcError::Timeout
                } else {
                    RpcError::Transport(e)
                }
            })?;

        response
            .json::<LedgerReply>()
            .await
            .map_err(RpcError::Transport)
    }
}

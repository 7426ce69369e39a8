// Panel command endpoints
//
// Every panel operation, including a plain status read, is a command job:
// PUT to `/applicationservice/domoweb/panel/commands/{name}` submits it and
// `GET .../{name}/{job id}/status` reports its progress.

use std::fmt;

use serde_json::json;
use tracing::debug;
use url::Url;

use crate::client::PanelClient;
use crate::error::Error;
use crate::models::PanelResponse;

const COMMANDS_PATH: &str = "/applicationservice/domoweb/panel/commands";

/// Header carrying the scraped session id on command requests.
pub const SESSION_HEADER: &str = "x-session-token";

/// A command understood by the panel service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelCommand {
    /// Full (away) arm.
    Arm,
    /// Partial (home) arm.
    PartialArm,
    Disarm,
    /// Read the current panel state.
    Status,
}

impl PanelCommand {
    /// Path segment of the command endpoint.
    pub fn name(self) -> &'static str {
        match self {
            Self::Arm => "arm",
            Self::PartialArm => "partialarm",
            Self::Disarm => "disarm",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for PanelCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PanelClient {
    /// Endpoint a command is submitted to.
    pub fn command_url(&self, command: PanelCommand) -> Result<Url, Error> {
        self.service_url(&format!("{COMMANDS_PATH}/{}", command.name()))
    }

    /// Progress endpoint of a submitted command job.
    pub fn command_status_url(&self, command: PanelCommand, job_id: &str) -> Result<Url, Error> {
        self.service_url(&format!("{COMMANDS_PATH}/{}/{job_id}/status", command.name()))
    }

    /// Submit a command within the current session.
    ///
    /// Returns the raw response; its shape depends on the HTTP status and
    /// is interpreted by the caller.
    pub async fn submit_command(&self, command: PanelCommand) -> Result<PanelResponse, Error> {
        let token = self.require_session()?;
        let url = self.command_url(command)?;
        debug!("PUT {}", url);

        let resp = self
            .http()
            .put(url)
            .header(SESSION_HEADER, token.expose())
            .query(&[("isBusy", "true"), ("checkCompletion", "true")])
            .json(&json!({ "key": "", "value": "" }))
            .send()
            .await?;

        let response = Self::read_response(resp).await?;
        debug!(status = response.status, "command response");
        Ok(response)
    }

    /// Fetch the progress record of a submitted command job.
    pub async fn command_status(
        &self,
        command: PanelCommand,
        job_id: &str,
    ) -> Result<PanelResponse, Error> {
        let token = self.require_session()?;
        let url = self.command_status_url(command, job_id)?;
        debug!("GET {}", url);

        let resp = self
            .http()
            .get(url)
            .header(SESSION_HEADER, token.expose())
            .send()
            .await?;

        Self::read_response(resp).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn command_urls_follow_service_layout() {
        let client = PanelClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://panel.example").unwrap(),
        );
        assert_eq!(
            client.command_url(PanelCommand::PartialArm).unwrap().as_str(),
            "https://panel.example/applicationservice/domoweb/panel/commands/partialarm"
        );
        assert_eq!(
            client
                .command_status_url(PanelCommand::Status, "42")
                .unwrap()
                .as_str(),
            "https://panel.example/applicationservice/domoweb/panel/commands/status/42/status"
        );
    }
}

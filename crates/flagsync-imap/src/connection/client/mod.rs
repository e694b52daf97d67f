//! Type-state IMAP client connection.
//!
//! The IMAP connection states are tracked at compile time:
//!
//! - `NotAuthenticated`: after the greeting
//! - `Authenticated`: after a successful LOGIN
//! - `Selected`: after a successful SELECT or EXAMINE
//!
//! Each state only exposes the commands valid in it. Commands that the
//! server may refuse without changing state hand the client back inside
//! [`Rejected`] so the connection survives a NO.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

pub use self::states::{Authenticated, Authorized, NotAuthenticated, Selected};
use super::framed::FramedStream;
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, ResponseCode, Status};
use crate::{Error, Result};

/// IMAP client connection with type-state.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tag_gen: TagGenerator,
    pub(crate) capabilities: Option<Vec<Capability>>,
    pub(crate) io_timeout: Option<Duration>,
    pub(crate) state: State,
}

impl<S, State: std::fmt::Debug> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("tag_gen", &self.tag_gen)
            .field("capabilities", &self.capabilities)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// A command the server refused, with the client in the state the
/// connection fell back to.
pub struct Rejected<S, State> {
    /// The still-usable client, unless `error` lost the connection.
    pub client: Client<S, State>,
    /// Why the command failed.
    pub error: Error,
}

impl<S, State> std::fmt::Debug for Rejected<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<S, State> From<Rejected<S, State>> for Error {
    fn from(rejected: Rejected<S, State>) -> Self {
        rejected.error
    }
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Bounds every subsequent command round-trip by `timeout`.
    #[must_use]
    pub const fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }

    /// Returns the state-specific data.
    #[must_use]
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Returns the capabilities the server has announced so far without
    /// being asked, or through an earlier CAPABILITY command.
    #[must_use]
    pub fn observed_capabilities(&self) -> Option<&[Capability]> {
        self.capabilities.as_deref()
    }

    /// Checks if an announced capability is present.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities
            .as_ref()
            .is_some_and(|caps| caps.contains(cap))
    }

    /// Sends a NOOP command.
    pub async fn noop(&mut self) -> Result<()> {
        let (tag, responses) = self.execute(&Command::Noop).await?;
        Self::check_tagged_ok(&responses, &tag)
    }

    /// Sends a CAPABILITY command and updates the stored capabilities.
    pub async fn capability(&mut self) -> Result<Vec<Capability>> {
        let (tag, responses) = self.execute(&Command::Capability).await?;
        Self::check_tagged_ok(&responses, &tag)?;

        self.capabilities
            .clone()
            .ok_or_else(|| Error::Protocol("no CAPABILITY data in response".to_string()))
    }

    /// Sends one command and collects every response up to its completion.
    ///
    /// A command that fails [`Command::check`] is refused before anything
    /// is written.
    ///
    /// Capability announcements seen along the way are recorded. Untagged
    /// lines that fail to parse are logged and dropped; the tagged line
    /// must parse.
    pub(crate) async fn execute(&mut self, command: &Command) -> Result<(String, Vec<Response>)> {
        command.check()?;
        let tag = self.tag_gen.next();
        debug!(command = %command.redacted(&tag), "sending");

        let bytes = command.serialize(&tag);
        let limit = self.io_timeout;
        let stream = &mut self.stream;
        let round_trip = async {
            stream.write_command(&bytes).await?;
            stream.read_until_tagged(&tag).await
        };
        let raw = match limit {
            Some(limit) => tokio::time::timeout(limit, round_trip)
                .await
                .map_err(|_| Error::Timeout(limit))??,
            None => round_trip.await?,
        };

        let mut responses = Vec::with_capacity(raw.len());
        for line in &raw {
            match ResponseParser::parse(line) {
                Ok(response) => responses.push(response),
                Err(e) if line.starts_with(b"* ") => {
                    warn!(?e, line = %String::from_utf8_lossy(line).trim_end(), "skipping unparsable response");
                }
                Err(e) => return Err(e),
            }
        }
        self.observe(&responses);
        Ok((tag, responses))
    }

    fn observe(&mut self, responses: &[Response]) {
        for response in responses {
            if let Some(caps) = announced_capabilities(response) {
                self.capabilities = Some(caps.to_vec());
            }
        }
    }

    /// Maps the tagged completion for `tag` to a result.
    pub(crate) fn check_tagged_ok(responses: &[Response], tag: &str) -> Result<()> {
        let completion = responses.iter().rev().find_map(|response| match response {
            Response::Tagged {
                tag: t,
                status,
                text,
                ..
            } if t.as_str() == tag => Some((*status, text)),
            _ => None,
        });

        match completion {
            Some((Status::Ok | Status::PreAuth, _)) => Ok(()),
            Some((Status::No, text)) => Err(Error::No(text.clone())),
            Some((Status::Bad, text)) => Err(Error::Bad(text.clone())),
            Some((Status::Bye, text)) => Err(Error::Bye(text.clone())),
            None => Err(Error::Protocol("missing tagged response".to_string())),
        }
    }

    pub(crate) fn into_state<Next>(self, state: Next) -> Client<S, Next> {
        Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            io_timeout: self.io_timeout,
            state,
        }
    }

    /// Sends LOGOUT and closes the write half.
    ///
    /// A server that says BYE and hangs up before the tagged OK still
    /// counts as a clean logout.
    pub async fn logout(mut self) -> Result<()> {
        let result = match self.execute(&Command::Logout).await {
            Ok((tag, responses)) => Self::check_tagged_ok(&responses, &tag),
            Err(Error::Bye(_)) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = self.stream.shutdown().await {
            debug!(?e, "shutdown after LOGOUT failed");
        }
        result
    }
}

/// Capabilities carried by a response, either as untagged CAPABILITY data
/// or as a `[CAPABILITY ...]` response code.
fn announced_capabilities(response: &Response) -> Option<&[Capability]> {
    match response {
        Response::Untagged(UntaggedResponse::Capability(caps))
        | Response::Untagged(
            UntaggedResponse::Ok {
                code: Some(ResponseCode::Capability(caps)),
                ..
            }
            | UntaggedResponse::PreAuth {
                code: Some(ResponseCode::Capability(caps)),
                ..
            },
        )
        | Response::Tagged {
            code: Some(ResponseCode::Capability(caps)),
            ..
        } => Some(caps),
        _ => None,
    }
}

//! Mailbox commands valid once authenticated, with or without a mailbox
//! selected.

use tokio::io::{AsyncRead, AsyncWrite};

use super::states::{Authenticated, Authorized, Selected};
use super::{Client, Rejected};
use crate::command::Command;
use crate::parser::{Response, UntaggedResponse};
use crate::types::{ListResponse, Mailbox, MailboxStatus, ResponseCode};
use crate::Result;

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
    State: Authorized,
{
    /// Lists mailboxes matching `pattern` under `reference`.
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListResponse>> {
        let command = Command::List {
            reference: reference.to_string(),
            pattern: pattern.to_string(),
        };
        let (tag, responses) = self.execute(&command).await?;
        Self::check_tagged_ok(&responses, &tag)?;

        Ok(responses
            .into_iter()
            .filter_map(|response| match response {
                Response::Untagged(UntaggedResponse::List(list)) => Some(list),
                _ => None,
            })
            .collect())
    }

    /// Opens `mailbox` read-write.
    ///
    /// On refusal the server has closed any previously selected mailbox,
    /// so the client falls back to [`Authenticated`].
    #[allow(clippy::result_large_err)]
    pub async fn select(
        self,
        mailbox: &str,
    ) -> std::result::Result<Client<S, Selected>, Rejected<S, Authenticated>> {
        self.open(mailbox, false).await
    }

    /// Opens `mailbox` read-only.
    #[allow(clippy::result_large_err)]
    pub async fn examine(
        self,
        mailbox: &str,
    ) -> std::result::Result<Client<S, Selected>, Rejected<S, Authenticated>> {
        self.open(mailbox, true).await
    }

    #[allow(clippy::result_large_err)]
    async fn open(
        mut self,
        mailbox: &str,
        read_only: bool,
    ) -> std::result::Result<Client<S, Selected>, Rejected<S, Authenticated>> {
        let mailbox = Mailbox::new(mailbox);
        let command = if read_only {
            Command::Examine {
                mailbox: mailbox.clone(),
            }
        } else {
            Command::Select {
                mailbox: mailbox.clone(),
            }
        };

        let outcome = match self.execute(&command).await {
            Ok((tag, responses)) => {
                Self::check_tagged_ok(&responses, &tag).map(|()| parse_mailbox_status(&responses))
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(status) => Ok(self.into_state(Selected::new(mailbox, read_only, status))),
            Err(error) => Err(Rejected {
                client: self.into_state(Authenticated),
                error,
            }),
        }
    }
}

/// Collects the mailbox snapshot from SELECT/EXAMINE responses.
pub(crate) fn parse_mailbox_status(responses: &[Response]) -> MailboxStatus {
    let mut status = MailboxStatus::default();

    for response in responses {
        let code = match response {
            Response::Untagged(UntaggedResponse::Exists(n)) => {
                status.exists = *n;
                continue;
            }
            Response::Untagged(UntaggedResponse::Flags(flags)) => {
                status.flags = flags.clone();
                continue;
            }
            Response::Untagged(UntaggedResponse::Ok { code: Some(code), .. })
            | Response::Tagged { code: Some(code), .. } => code,
            _ => continue,
        };

        match code {
            ResponseCode::UidValidity(v) => status.uid_validity = Some(*v),
            ResponseCode::UidNext(n) => status.uid_next = Some(*n),
            ResponseCode::PermanentFlags(flags) => {
                status.permanent_flags = flags.iter().cloned().collect();
            }
            ResponseCode::HighestModSeq(n) => status.highest_mod_seq = Some(*n),
            ResponseCode::ReadOnly => status.read_only = true,
            _ => {}
        }
    }

    status
}

//! Implementation for the selected state.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::Client;
use super::states::Selected;
use crate::Result;
use crate::command::{Command, FetchAttribute, SearchCriteria, StoreAction};
use crate::parser::{FetchItem, Response, UntaggedResponse};
use crate::types::{Mailbox, Uid, UidSet};

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the selected mailbox.
    #[must_use]
    pub const fn mailbox(&self) -> &Mailbox {
        self.state.mailbox()
    }

    /// Runs UID SEARCH and returns matching UIDs in server order.
    pub async fn uid_search(&mut self, criteria: SearchCriteria) -> Result<Vec<Uid>> {
        let (tag, responses) = self.execute(&Command::UidSearch { criteria }).await?;
        Self::check_tagged_ok(&responses, &tag)?;

        let uids = responses
            .iter()
            .filter_map(|response| match response {
                Response::Untagged(UntaggedResponse::Search(ids)) => Some(ids),
                _ => None,
            })
            .flatten()
            .filter_map(|&id| Uid::new(id))
            .collect();
        Ok(uids)
    }

    /// Runs UID FETCH and returns each message's items keyed by UID.
    ///
    /// FETCH responses without a UID are unsolicited updates for other
    /// messages and are skipped.
    pub async fn uid_fetch(
        &mut self,
        uids: &UidSet,
        attributes: &[FetchAttribute],
    ) -> Result<Vec<(Uid, Vec<FetchItem>)>> {
        let command = Command::UidFetch {
            uids: uids.clone(),
            attributes: attributes.to_vec(),
        };
        let (tag, responses) = self.execute(&command).await?;
        Self::check_tagged_ok(&responses, &tag)?;

        let mut messages = Vec::new();
        for response in responses {
            if let Response::Untagged(UntaggedResponse::Fetch { seq, items }) = response {
                match FetchItem::find_uid(&items) {
                    Some(uid) => messages.push((uid, items)),
                    None => debug!(seq = seq.get(), "ignoring FETCH without UID"),
                }
            }
        }
        Ok(messages)
    }

    /// Runs a silent UID STORE.
    pub async fn uid_store(&mut self, uids: &UidSet, action: StoreAction) -> Result<()> {
        let command = Command::UidStore {
            uids: uids.clone(),
            action,
            silent: true,
        };
        let (tag, responses) = self.execute(&command).await?;
        Self::check_tagged_ok(&responses, &tag)
    }
}

//! The IMAP transport seam.
//!
//! [`crate::Provider`] talks to the server only through [`Transport`], so
//! sync logic can be exercised against a recording double. [`ImapTransport`]
//! is the real implementation over `flagsync-imap`.

mod imap;

use std::future::Future;

use flagsync_imap::{
    Capability, FetchAttribute, FetchItem, ListResponse, MailboxStatus, SearchCriteria,
    StoreAction, Uid, UidSet,
};

pub use imap::ImapTransport;

use crate::Result;

/// One IMAP connection, driven one command at a time.
///
/// Connection loss is detected by the transport itself: after a command
/// fails because the peer went away, [`Transport::is_connected`] turns
/// false and [`Transport::is_disconnected`] turns true.
pub trait Transport: Send {
    /// Opens the connection and reads the greeting.
    ///
    /// Fails with [`crate::Error::Connection`] when the server cannot be
    /// reached in time.
    fn connect(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Authenticates. Fails with [`crate::Error::Authentication`] when the
    /// credentials are rejected.
    fn login(&mut self, username: &str, password: &str)
    -> impl Future<Output = Result<()>> + Send;

    /// Sends LOGOUT.
    fn logout(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Drops the connection without talking to the server.
    fn disconnect(&mut self);

    /// True while a connection is open.
    fn is_connected(&self) -> bool;

    /// True once a connection has been opened and then lost or closed.
    fn is_disconnected(&self) -> bool;

    /// Asks the server for its capabilities.
    fn capability(&mut self) -> impl Future<Output = Result<Vec<Capability>>> + Send;

    /// Capabilities the server has already announced, without a round-trip.
    fn observed_capabilities(&self) -> Option<Vec<Capability>>;

    /// Runs LIST.
    fn list(
        &mut self,
        reference: &str,
        pattern: &str,
    ) -> impl Future<Output = Result<Vec<ListResponse>>> + Send;

    /// Opens `mailbox` read-write.
    fn select(&mut self, mailbox: &str) -> impl Future<Output = Result<MailboxStatus>> + Send;

    /// Opens `mailbox` read-only.
    fn examine(&mut self, mailbox: &str) -> impl Future<Output = Result<MailboxStatus>> + Send;

    /// Runs UID SEARCH in the open mailbox.
    fn uid_search(
        &mut self,
        criteria: SearchCriteria,
    ) -> impl Future<Output = Result<Vec<Uid>>> + Send;

    /// Runs UID FETCH in the open mailbox.
    fn uid_fetch(
        &mut self,
        uids: &UidSet,
        attributes: &[FetchAttribute],
    ) -> impl Future<Output = Result<Vec<(Uid, Vec<FetchItem>)>>> + Send;

    /// Runs UID STORE in the open mailbox.
    fn uid_store(
        &mut self,
        uids: &UidSet,
        action: StoreAction,
    ) -> impl Future<Output = Result<()>> + Send;
}

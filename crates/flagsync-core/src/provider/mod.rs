//! The sync provider: one IMAP session and the operations sync needs.
//!
//! A [`Provider`] owns a [`Transport`] and layers on it:
//!
//! - session handling: lazy connect, login once, capability caching,
//!   teardown that never fails;
//! - mailbox resolution: selectable mailboxes, the label map, opening a
//!   mailbox read-only or (when the [`WriteGate`] allows) read-write;
//! - UID queries over the open mailbox;
//! - flag sync: fetching attribute bags and storing minimal deltas.
//!
//! Per-session caches (capabilities, labels) are filled on first use and
//! kept until [`Provider::disconnect`].

mod types;

use flagsync_imap::{
    Capability, FetchAttribute, SearchCriteria, StoreAction, Uid, UidSet, UidValidity,
};
use tracing::{debug, info, warn};

pub use types::{
    Access, AttributeBag, Credentials, FlagDelta, LabelMap, OpenMailbox, UidRange, WriteGate,
};

use crate::config::AccountConfig;
use crate::service::MailService;
use crate::tagging::{CleanTag, TagNormalizer};
use crate::transport::{ImapTransport, Transport};
use crate::{Error, Result};

/// Tags that never become labels; they are handled as system state.
const RESERVED_LABELS: [&str; 2] = ["inbox", "sent"];

/// An IMAP account, ready to sync.
pub struct Provider<T = ImapTransport> {
    transport: T,
    credentials: Credentials,
    service: Box<dyn MailService>,
    normalizer: Box<dyn TagNormalizer>,
    write_gate: WriteGate,
    authenticated: bool,
    capabilities: Option<Vec<Capability>>,
    labels: Option<LabelMap>,
    open_mailbox: Option<OpenMailbox>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Provider<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("transport", &self.transport)
            .field("credentials", &self.credentials)
            .field("service", &self.service)
            .field("authenticated", &self.authenticated)
            .field("open_mailbox", &self.open_mailbox)
            .finish_non_exhaustive()
    }
}

impl Provider<ImapTransport> {
    /// Builds a provider for the configured account.
    ///
    /// No connection is made until the first operation.
    #[must_use]
    pub fn from_config(config: &AccountConfig, write_gate: WriteGate) -> Self {
        Self::new(
            ImapTransport::new(config.imap_config()),
            Credentials::new(config.username.clone(), config.password.clone()),
            write_gate,
        )
        .with_service(config.service.build())
        .with_normalizer(Box::new(CleanTag::new(config.max_tag_length)))
    }
}

impl<T: Transport> Provider<T> {
    /// Creates a provider over `transport` speaking plain IMAP.
    #[must_use]
    pub fn new(transport: T, credentials: Credentials, write_gate: WriteGate) -> Self {
        Self {
            transport,
            credentials,
            service: crate::service::ServiceKind::Generic.build(),
            normalizer: Box::new(CleanTag::default()),
            write_gate,
            authenticated: false,
            capabilities: None,
            labels: None,
            open_mailbox: None,
        }
    }

    /// Replaces the mail-service dialect.
    #[must_use]
    pub fn with_service(mut self, service: Box<dyn MailService>) -> Self {
        self.service = service;
        self
    }

    /// Replaces the tag normalizer.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Box<dyn TagNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// The mail-service dialect in use.
    #[must_use]
    pub fn service(&self) -> &dyn MailService {
        self.service.as_ref()
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The mailbox opened last, if any.
    #[must_use]
    pub const fn open_mailbox_state(&self) -> Option<&OpenMailbox> {
        self.open_mailbox.as_ref()
    }

    fn reset_session(&mut self) {
        self.authenticated = false;
        self.capabilities = None;
        self.labels = None;
        self.open_mailbox = None;
    }

    /// Opens the connection if there is none. A lost connection ends the
    /// session, so its caches go with it. The new connection is not logged
    /// in; that takes another [`Provider::connect`].
    async fn ensure_session(&mut self) -> Result<()> {
        if self.transport.is_connected() {
            return Ok(());
        }
        self.reset_session();
        self.transport.connect().await
    }

    // ---- session ----

    /// Connects and logs in. Does nothing once logged in.
    ///
    /// # Errors
    ///
    /// [`Error::Connection`] if the server is unreachable within the
    /// connect timeout, [`Error::Authentication`] if the credentials are
    /// rejected.
    pub async fn connect(&mut self) -> Result<()> {
        self.ensure_session().await?;
        if self.authenticated {
            return Ok(());
        }

        self.transport
            .login(&self.credentials.username, &self.credentials.password)
            .await?;
        self.authenticated = true;
        info!(username = %self.credentials.username, service = %self.service.kind(), "session ready");
        Ok(())
    }

    /// True only if a connection was made and has since been closed.
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        self.transport.is_disconnected()
    }

    /// Logs out and closes the connection. Logout failures are logged and
    /// otherwise ignored.
    pub async fn disconnect(&mut self) {
        if self.transport.is_connected()
            && let Err(e) = self.transport.logout().await
        {
            warn!(?e, "logout failed; closing connection anyway");
        }
        self.transport.disconnect();
        self.reset_session();
        debug!("disconnected");
    }

    /// The server's capabilities.
    ///
    /// Uses what the server announced unprompted when possible and only
    /// asks otherwise. The answer is kept for the rest of the session.
    ///
    /// # Errors
    ///
    /// Connection or protocol errors from the first lookup.
    pub async fn capabilities(&mut self) -> Result<&[Capability]> {
        if self.capabilities.is_none() {
            self.ensure_session().await?;
            let caps = match self.transport.observed_capabilities() {
                Some(caps) => caps,
                None => self.transport.capability().await?,
            };
            debug!(count = caps.len(), "capabilities cached");
            self.capabilities = Some(caps);
        }
        Ok(self.capabilities.as_deref().unwrap_or_default())
    }

    /// Returns true if the server advertises `name`, compared without
    /// regard to case.
    ///
    /// # Errors
    ///
    /// See [`Provider::capabilities`].
    pub async fn supports(&mut self, name: &str) -> Result<bool> {
        Ok(self.capabilities().await?.iter().any(|c| c.is_named(name)))
    }

    // ---- mailboxes ----

    /// Names of every selectable mailbox.
    ///
    /// # Errors
    ///
    /// Connection or protocol errors.
    pub async fn list_mailboxes(&mut self) -> Result<Vec<String>> {
        self.ensure_session().await?;
        let listed = self.transport.list("", "*").await?;
        Ok(listed
            .into_iter()
            .filter(flagsync_imap::ListResponse::is_selectable)
            .map(|entry| entry.mailbox.0)
            .collect())
    }

    /// Label → mailbox map, built once per session.
    ///
    /// Mailboxes whose names normalize to nothing, or to `inbox` or
    /// `sent`, are left out. When two mailboxes share a label the later
    /// one in LIST order wins.
    ///
    /// # Errors
    ///
    /// Errors from [`Provider::list_mailboxes`].
    pub async fn labels(&mut self) -> Result<&LabelMap> {
        if self.labels.is_none() {
            let mut labels = LabelMap::new();
            for name in self.list_mailboxes().await? {
                match self.service.mailbox_to_label(&name, self.normalizer.as_ref()) {
                    Some(label) if !RESERVED_LABELS.contains(&label.as_str()) => {
                        labels.insert(label, name);
                    }
                    _ => debug!(mailbox = %name, "no label for mailbox"),
                }
            }
            self.labels = Some(labels);
        }
        Ok(self.labels.get_or_insert_with(LabelMap::new))
    }

    /// Opens `name`, superseding any mailbox already open.
    ///
    /// Returns the mailbox's UIDVALIDITY; UIDs from an earlier session are
    /// only meaningful if it is unchanged.
    ///
    /// # Errors
    ///
    /// [`Error::WriteDisabled`] for [`Access::ReadWrite`] while the write
    /// gate is closed, before anything is sent. Otherwise connection or
    /// protocol errors.
    pub async fn open_mailbox(&mut self, name: &str, access: Access) -> Result<Option<UidValidity>> {
        if access == Access::ReadWrite && !self.write_gate.is_enabled() {
            return Err(Error::WriteDisabled);
        }

        self.ensure_session().await?;
        let opened = match access {
            Access::ReadOnly => self.transport.examine(name).await,
            Access::ReadWrite => self.transport.select(name).await,
        };
        let status = match opened {
            Ok(status) => status,
            Err(e) => {
                self.open_mailbox = None;
                return Err(e);
            }
        };

        if access == Access::ReadWrite && !status.permanent_flags.accepts_new_keywords() {
            warn!(mailbox = name, permanent = %status.permanent_flags, "server will not keep new keywords");
        }

        self.open_mailbox = Some(OpenMailbox {
            name: name.to_string(),
            access,
        });
        Ok(status.uid_validity)
    }

    /// Remote label for a local tag.
    #[must_use]
    pub fn tag_to_label(&self, tag: &str) -> String {
        self.service.tag_to_label(tag)
    }

    /// System flag for a local tag, if there is one.
    #[must_use]
    pub fn tag_to_flag(&self, tag: &str) -> Option<&'static str> {
        self.service.tag_to_flag(tag)
    }

    fn require_open(&self) -> Result<&OpenMailbox> {
        self.open_mailbox.as_ref().ok_or(Error::NoMailboxOpen)
    }

    // ---- messages ----

    /// UIDs in the open mailbox within `range`, in server order.
    ///
    /// # Errors
    ///
    /// [`Error::NoMailboxOpen`] without an open mailbox, otherwise
    /// protocol errors.
    pub async fn uids(&mut self, range: UidRange) -> Result<Vec<Uid>> {
        self.require_open()?;
        self.transport.uid_search(search_criteria(range)).await
    }

    /// Fetches `fields` for each of `uids` in the open mailbox.
    ///
    /// UIDs the server no longer has are left out of the result. An empty
    /// `uids` returns immediately.
    ///
    /// # Errors
    ///
    /// [`Error::NoMailboxOpen`] without an open mailbox, a protocol error
    /// for a field that is not an IMAP atom (checked before anything is
    /// sent), otherwise protocol errors.
    pub async fn fetch(&mut self, uids: &[Uid], fields: &[&str]) -> Result<Vec<AttributeBag>> {
        fields.iter().try_for_each(|field| check_attribute(field))?;
        let Some(set) = UidSet::from_uids(uids) else {
            return Ok(Vec::new());
        };
        self.require_open()?;

        let requested: Vec<(&str, FetchAttribute)> = fields
            .iter()
            .map(|&field| (field, FetchAttribute::parse(field)))
            .collect();
        let attributes: Vec<FetchAttribute> =
            requested.iter().map(|(_, attr)| attr.clone()).collect();

        let messages = self.transport.uid_fetch(&set, &attributes).await?;
        let bags = messages
            .into_iter()
            .map(|(uid, items)| {
                let mut bag = AttributeBag::new(uid);
                for (field, attr) in &requested {
                    if let Some(item) = items.iter().find(|item| item.name == attr.as_str()) {
                        bag.insert(*field, item.value.clone());
                    }
                }
                bag
            })
            .collect();
        Ok(bags)
    }

    /// Moves `attribute` of message `uid` from `old` to `new` with at most
    /// one additive and one subtractive store. Equal sets send nothing.
    ///
    /// Write access is not re-checked; a read-only mailbox makes the server
    /// refuse the store.
    ///
    /// # Errors
    ///
    /// A protocol error, before anything is sent, if `attribute` is not an
    /// IMAP atom or a value holds CR, LF or NUL. [`Error::NoMailboxOpen`]
    /// without an open mailbox, otherwise protocol errors.
    pub async fn apply_delta(
        &mut self,
        uid: Uid,
        attribute: &str,
        old: &[String],
        new: &[String],
    ) -> Result<FlagDelta> {
        check_attribute(attribute)?;
        if let Some(value) = new.iter().chain(old).find(|v| v.contains(['\r', '\n', '\0'])) {
            return Err(Error::Imap(flagsync_imap::Error::Protocol(format!(
                "value {value:?} contains CR, LF or NUL"
            ))));
        }
        let delta = FlagDelta::between(old, new);
        if delta.is_empty() {
            return Ok(delta);
        }
        self.require_open()?;

        let target = UidSet::single(uid);
        if !delta.additions.is_empty() {
            self.transport
                .uid_store(&target, StoreAction::add(attribute, delta.additions.clone()))
                .await?;
        }
        if !delta.removals.is_empty() {
            self.transport
                .uid_store(&target, StoreAction::remove(attribute, delta.removals.clone()))
                .await?;
        }
        debug!(%uid, attribute, added = delta.additions.len(), removed = delta.removals.len(), "delta stored");
        Ok(delta)
    }

    /// Archives message `uid` the way the mail service does it.
    ///
    /// # Errors
    ///
    /// [`Error::NoMailboxOpen`] if the service needs a store and no mailbox
    /// is open, otherwise protocol errors.
    pub async fn archive(&mut self, uid: Uid) -> Result<()> {
        let Some(action) = self.service.archive_action() else {
            return Ok(());
        };
        self.require_open()?;
        self.transport.uid_store(&UidSet::single(uid), action).await
    }
}

fn search_criteria(range: UidRange) -> SearchCriteria {
    match (range.from, range.to) {
        (Some(from), Some(to)) => SearchCriteria::Uid(UidSet::range(from, to)),
        (Some(from), None) => SearchCriteria::Uid(UidSet::RangeFrom(from)),
        (None, Some(to)) => SearchCriteria::Uid(UidSet::range(Uid::MIN, to)),
        (None, None) => SearchCriteria::All,
    }
}

/// Attribute names go on the wire unquoted, so they must be atoms.
fn check_attribute(name: &str) -> Result<()> {
    if flagsync_imap::is_atom(name) {
        Ok(())
    } else {
        Err(Error::Imap(flagsync_imap::Error::Protocol(format!(
            "attribute {name:?} is not an IMAP atom"
        ))))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn uid(n: u32) -> Uid {
        Uid::new(n).unwrap()
    }

    #[test]
    fn range_precedence() {
        assert_eq!(
            search_criteria(UidRange::between(uid(5), uid(9))),
            SearchCriteria::Uid(UidSet::range(uid(5), uid(9)))
        );
        assert_eq!(
            search_criteria(UidRange::starting_at(uid(5))),
            SearchCriteria::Uid(UidSet::RangeFrom(uid(5)))
        );
        assert_eq!(
            search_criteria(UidRange::up_to(uid(9))),
            SearchCriteria::Uid(UidSet::range(uid(1), uid(9)))
        );
        assert_eq!(search_criteria(UidRange::all()), SearchCriteria::All);
    }

    #[test]
    fn attribute_names_are_atoms() {
        assert!(check_attribute("X-GM-LABELS").is_ok());
        assert!(check_attribute("FLAGS").is_ok());
        assert!(check_attribute("").is_err());
        assert!(check_attribute("FLAGS (x)").is_err());
        assert!(check_attribute("FLAGS\r\nA1 NOOP").is_err());
    }
}

//! Recording in-memory transport.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::BTreeMap;

use flagsync_core::{Error, Result, Transport};
use flagsync_imap::{
    Capability, FetchAttribute, FetchItem, FetchValue, ListResponse, Mailbox, MailboxAttribute,
    MailboxStatus, SearchCriteria, StoreAction, StoreMode, Uid, UidSet, UidValidity,
};

/// Per-message attribute values, e.g. `FLAGS` → `["\\Seen"]`.
pub type Message = BTreeMap<String, Vec<String>>;

#[derive(Debug, Default)]
pub struct MockTransport {
    /// Every call, in order, in a compact wire-like form.
    pub calls: Vec<String>,
    pub connected: bool,
    pub established: bool,
    pub greeting_capabilities: Option<Vec<Capability>>,
    pub capabilities: Vec<Capability>,
    pub mailboxes: Vec<ListResponse>,
    pub messages: BTreeMap<u32, Message>,
    pub uid_validity: u32,
    pub reject_login: bool,
    pub fail_logout: bool,
    pub unreachable: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            capabilities: vec![Capability::Imap4Rev1, Capability::UidPlus],
            uid_validity: 1,
            ..Self::default()
        }
    }

    pub fn with_mailbox(mut self, name: &str, attributes: Vec<MailboxAttribute>) -> Self {
        self.mailboxes.push(ListResponse {
            attributes,
            delimiter: Some('/'),
            mailbox: Mailbox::new(name),
        });
        self
    }

    pub fn with_message(mut self, uid: u32, attribute: &str, values: &[&str]) -> Self {
        self.messages.entry(uid).or_default().insert(
            attribute.to_string(),
            values.iter().map(ToString::to_string).collect(),
        );
        self
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn stores(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter(|c| c.starts_with("uid_store"))
            .map(String::as_str)
            .collect()
    }
}

fn contains(set: &UidSet, uid: u32) -> bool {
    match set {
        UidSet::Single(u) => u.get() == uid,
        UidSet::Range(a, b) => (a.get()..=b.get()).contains(&uid),
        UidSet::RangeFrom(a) => uid >= a.get(),
        UidSet::Set(parts) => parts.iter().any(|part| contains(part, uid)),
    }
}

fn store_line(uids: &UidSet, action: &StoreAction) -> String {
    let sign = match action.mode {
        StoreMode::Add => "+",
        StoreMode::Remove => "-",
        StoreMode::Replace => "",
    };
    format!(
        "uid_store {uids} {sign}{} ({})",
        action.attribute,
        action.values.join(" ")
    )
}

impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<()> {
        self.calls.push("connect".to_string());
        if self.unreachable {
            return Err(Error::Connection("timed out".to_string()));
        }
        self.connected = true;
        self.established = true;
        Ok(())
    }

    async fn login(&mut self, username: &str, _password: &str) -> Result<()> {
        self.calls.push(format!("login {username}"));
        if self.reject_login {
            return Err(Error::Authentication("Invalid credentials".to_string()));
        }
        Ok(())
    }

    async fn logout(&mut self) -> Result<()> {
        self.calls.push("logout".to_string());
        if self.fail_logout {
            return Err(Error::Imap(flagsync_imap::Error::Bad("broken".to_string())));
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        self.calls.push("disconnect".to_string());
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn is_disconnected(&self) -> bool {
        self.established && !self.connected
    }

    async fn capability(&mut self) -> Result<Vec<Capability>> {
        self.calls.push("capability".to_string());
        Ok(self.capabilities.clone())
    }

    fn observed_capabilities(&self) -> Option<Vec<Capability>> {
        self.greeting_capabilities.clone()
    }

    async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListResponse>> {
        self.calls.push(format!("list {reference:?} {pattern:?}"));
        Ok(self.mailboxes.clone())
    }

    async fn select(&mut self, mailbox: &str) -> Result<MailboxStatus> {
        self.calls.push(format!("select {mailbox}"));
        Ok(MailboxStatus {
            uid_validity: UidValidity::new(self.uid_validity),
            ..MailboxStatus::default()
        })
    }

    async fn examine(&mut self, mailbox: &str) -> Result<MailboxStatus> {
        self.calls.push(format!("examine {mailbox}"));
        Ok(MailboxStatus {
            uid_validity: UidValidity::new(self.uid_validity),
            read_only: true,
            ..MailboxStatus::default()
        })
    }

    async fn uid_search(&mut self, criteria: SearchCriteria) -> Result<Vec<Uid>> {
        let query = match &criteria {
            SearchCriteria::All => "ALL".to_string(),
            SearchCriteria::Uid(set) => format!("UID {set}"),
        };
        self.calls.push(format!("uid_search {query}"));

        Ok(self
            .messages
            .keys()
            .filter(|&&uid| match &criteria {
                SearchCriteria::All => true,
                SearchCriteria::Uid(set) => contains(set, uid),
            })
            .filter_map(|&uid| Uid::new(uid))
            .collect())
    }

    async fn uid_fetch(
        &mut self,
        uids: &UidSet,
        attributes: &[FetchAttribute],
    ) -> Result<Vec<(Uid, Vec<FetchItem>)>> {
        self.calls.push(format!("uid_fetch {uids}"));

        let mut out = Vec::new();
        for (&uid, message) in &self.messages {
            if !contains(uids, uid) {
                continue;
            }
            let mut items = vec![FetchItem {
                name: "UID".to_string(),
                value: FetchValue::Number(u64::from(uid)),
            }];
            for attribute in attributes {
                if let Some(values) = message.get(attribute.as_str()) {
                    items.push(FetchItem {
                        name: attribute.as_str().to_string(),
                        value: FetchValue::List(values.clone()),
                    });
                }
            }
            out.push((Uid::new(uid).unwrap(), items));
        }
        Ok(out)
    }

    async fn uid_store(&mut self, uids: &UidSet, action: StoreAction) -> Result<()> {
        self.calls.push(store_line(uids, &action));

        for (&uid, message) in &mut self.messages {
            if !contains(uids, uid) {
                continue;
            }
            let values = message.entry(action.attribute.clone()).or_default();
            match action.mode {
                StoreMode::Add => {
                    for value in &action.values {
                        if !values.contains(value) {
                            values.push(value.clone());
                        }
                    }
                }
                StoreMode::Remove => values.retain(|v| !action.values.contains(v)),
                StoreMode::Replace => values.clone_from(&action.values),
            }
        }
        Ok(())
    }
}

//! [`Transport`] over the `flagsync-imap` type-state client.

use flagsync_imap::connection::connect;
use flagsync_imap::{
    Authenticated, Capability, Client, Config, FetchAttribute, FetchItem, ImapStream,
    ListResponse, MailboxStatus, NotAuthenticated, Rejected, SearchCriteria, Selected,
    StoreAction, Uid, UidSet,
};
use tracing::{debug, info, warn};

use super::Transport;
use crate::{Error, Result};

/// Where the connection is in the IMAP state machine.
enum SessionState {
    Disconnected,
    Connected(Client<ImapStream, NotAuthenticated>),
    Authenticated(Client<ImapStream, Authenticated>),
    Selected(Client<ImapStream, Selected>),
}

/// Live IMAP connection for one account.
pub struct ImapTransport {
    config: Config,
    state: SessionState,
    established: bool,
}

impl std::fmt::Debug for ImapTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            SessionState::Disconnected => "disconnected",
            SessionState::Connected(_) => "connected",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::Selected(_) => "selected",
        };
        f.debug_struct("ImapTransport")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("state", &state)
            .finish_non_exhaustive()
    }
}

fn not_authenticated() -> Error {
    Error::Imap(flagsync_imap::Error::InvalidState(
        "not authenticated".to_string(),
    ))
}

fn no_mailbox() -> Error {
    Error::Imap(flagsync_imap::Error::InvalidState(
        "no mailbox selected".to_string(),
    ))
}

impl ImapTransport {
    /// Creates a transport that connects lazily with `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            state: SessionState::Disconnected,
            established: false,
        }
    }

    /// Converts a protocol error, dropping the connection if it is gone.
    fn settle(&mut self, error: flagsync_imap::Error) -> Error {
        if error.is_connection_lost() {
            warn!(?error, host = %self.config.host, "connection lost");
            self.state = SessionState::Disconnected;
        }
        Error::Imap(error)
    }

    fn settled<T>(&mut self, result: flagsync_imap::Result<T>) -> Result<T> {
        result.map_err(|e| self.settle(e))
    }

    async fn open(&mut self, mailbox: &str, read_only: bool) -> Result<MailboxStatus> {
        let outcome = match std::mem::replace(&mut self.state, SessionState::Disconnected) {
            SessionState::Authenticated(client) if read_only => client.examine(mailbox).await,
            SessionState::Authenticated(client) => client.select(mailbox).await,
            SessionState::Selected(client) if read_only => client.examine(mailbox).await,
            SessionState::Selected(client) => client.select(mailbox).await,
            other => {
                self.state = other;
                return Err(not_authenticated());
            }
        };

        match outcome {
            Ok(client) => {
                let status = client.state().status().clone();
                debug!(mailbox, read_only, exists = status.exists, "mailbox opened");
                self.state = SessionState::Selected(client);
                Ok(status)
            }
            Err(Rejected { client, error }) => {
                self.state = SessionState::Authenticated(client);
                Err(self.settle(error))
            }
        }
    }

    fn selected(&mut self) -> Result<&mut Client<ImapStream, Selected>> {
        match &mut self.state {
            SessionState::Selected(client) => Ok(client),
            _ => Err(no_mailbox()),
        }
    }
}

impl Transport for ImapTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let limit = self.config.connect_timeout;
        let handshake = async {
            let stream = connect(&self.config).await?;
            Client::from_stream(stream).await
        };
        let client = tokio::time::timeout(limit, handshake)
            .await
            .map_err(|_| flagsync_imap::Error::Timeout(limit))
            .and_then(|result| result)
            .map_err(|e| Error::Connection(format!("{}: {e}", self.config.address())))?;

        info!(address = %self.config.address(), "connected");
        self.state = SessionState::Connected(client.with_io_timeout(self.config.io_timeout));
        self.established = true;
        Ok(())
    }

    async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let client = match std::mem::replace(&mut self.state, SessionState::Disconnected) {
            SessionState::Connected(client) => client,
            SessionState::Disconnected => {
                return Err(Error::Connection("not connected".to_string()));
            }
            already => {
                self.state = already;
                return Ok(());
            }
        };

        match client.login(username, password).await {
            Ok(client) => {
                info!(username, "authenticated");
                self.state = SessionState::Authenticated(client);
                Ok(())
            }
            Err(Rejected {
                client,
                error: flagsync_imap::Error::Auth(text),
            }) => {
                self.state = SessionState::Connected(client);
                Err(Error::Authentication(text))
            }
            Err(Rejected { client, error }) => {
                self.state = SessionState::Connected(client);
                Err(self.settle(error))
            }
        }
    }

    async fn logout(&mut self) -> Result<()> {
        let result = match std::mem::replace(&mut self.state, SessionState::Disconnected) {
            SessionState::Disconnected => return Ok(()),
            SessionState::Connected(client) => client.logout().await,
            SessionState::Authenticated(client) => client.logout().await,
            SessionState::Selected(client) => client.logout().await,
        };
        result.map_err(Error::Imap)
    }

    fn disconnect(&mut self) {
        if self.is_connected() {
            debug!(host = %self.config.host, "closing connection");
        }
        self.state = SessionState::Disconnected;
    }

    fn is_connected(&self) -> bool {
        !matches!(self.state, SessionState::Disconnected)
    }

    fn is_disconnected(&self) -> bool {
        self.established && !self.is_connected()
    }

    async fn capability(&mut self) -> Result<Vec<Capability>> {
        let result = match &mut self.state {
            SessionState::Disconnected => {
                return Err(Error::Connection("not connected".to_string()));
            }
            SessionState::Connected(client) => client.capability().await,
            SessionState::Authenticated(client) => client.capability().await,
            SessionState::Selected(client) => client.capability().await,
        };
        self.settled(result)
    }

    fn observed_capabilities(&self) -> Option<Vec<Capability>> {
        let caps = match &self.state {
            SessionState::Disconnected => None,
            SessionState::Connected(client) => client.observed_capabilities(),
            SessionState::Authenticated(client) => client.observed_capabilities(),
            SessionState::Selected(client) => client.observed_capabilities(),
        };
        caps.map(<[_]>::to_vec)
    }

    async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListResponse>> {
        let result = match &mut self.state {
            SessionState::Authenticated(client) => client.list(reference, pattern).await,
            SessionState::Selected(client) => client.list(reference, pattern).await,
            _ => return Err(not_authenticated()),
        };
        self.settled(result)
    }

    async fn select(&mut self, mailbox: &str) -> Result<MailboxStatus> {
        self.open(mailbox, false).await
    }

    async fn examine(&mut self, mailbox: &str) -> Result<MailboxStatus> {
        self.open(mailbox, true).await
    }

    async fn uid_search(&mut self, criteria: SearchCriteria) -> Result<Vec<Uid>> {
        let result = self.selected()?.uid_search(criteria).await;
        self.settled(result)
    }

    async fn uid_fetch(
        &mut self,
        uids: &UidSet,
        attributes: &[FetchAttribute],
    ) -> Result<Vec<(Uid, Vec<FetchItem>)>> {
        let result = self.selected()?.uid_fetch(uids, attributes).await;
        self.settled(result)
    }

    async fn uid_store(&mut self, uids: &UidSet, action: StoreAction) -> Result<()> {
        let result = self.selected()?.uid_store(uids, action).await;
        self.settled(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use flagsync_imap::Security;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    async fn local_server(script: &'static [(&'static str, &'static str)]) -> Config {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(b"* OK [CAPABILITY IMAP4rev1 UIDPLUS] test server ready\r\n")
                .await
                .unwrap();
            let mut buf = vec![0u8; 4096];
            for (expect, reply) in script {
                let n = socket.read(&mut buf).await.unwrap();
                let line = String::from_utf8_lossy(&buf[..n]);
                assert!(line.contains(expect), "expected {expect:?}, got {line:?}");
                socket.write_all(reply.as_bytes()).await.unwrap();
            }
        });

        Config::builder("127.0.0.1")
            .security(Security::None)
            .port(port)
            .connect_timeout(Duration::from_secs(2))
            .build()
    }

    #[tokio::test]
    async fn rejected_login_is_an_authentication_error() {
        let config = local_server(&[("LOGIN", "A0000 NO [AUTHENTICATIONFAILED] nope\r\n")]).await;
        let mut transport = ImapTransport::new(config);

        assert!(!transport.is_disconnected());
        transport.connect().await.unwrap();
        assert!(transport.observed_capabilities().unwrap().contains(&Capability::UidPlus));

        let err = transport.login("user", "bad").await.unwrap_err();
        assert!(matches!(err, Error::Authentication(text) if text == "nope"));
        assert!(transport.is_connected());
    }

    #[tokio::test]
    async fn missing_mailbox_keeps_session_authenticated() {
        let config = local_server(&[
            ("LOGIN", "A0000 OK\r\n"),
            ("EXAMINE", "A0001 NO no such mailbox\r\n"),
            ("LIST", "* LIST () \"/\" INBOX\r\nA0002 OK\r\n"),
        ])
        .await;
        let mut transport = ImapTransport::new(config);
        transport.connect().await.unwrap();
        transport.login("user", "pw").await.unwrap();

        let err = transport.examine("Nope").await.unwrap_err();
        assert!(matches!(err, Error::Imap(flagsync_imap::Error::No(_))));

        let mailboxes = transport.list("", "*").await.unwrap();
        assert_eq!(mailboxes.len(), 1);
        assert!(matches!(
            transport.uid_search(SearchCriteria::All).await,
            Err(Error::Imap(flagsync_imap::Error::InvalidState(_)))
        ));
    }

    #[tokio::test]
    async fn peer_hangup_marks_disconnected() {
        let config = local_server(&[]).await;
        let mut transport = ImapTransport::new(config);
        transport.connect().await.unwrap();

        // The scripted server has exited, so the socket is closed.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(transport.capability().await.is_err());
        assert!(!transport.is_connected());
        assert!(transport.is_disconnected());
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = Config::builder("127.0.0.1")
            .security(Security::None)
            .port(port)
            .build();
        let mut transport = ImapTransport::new(config);

        assert!(matches!(transport.connect().await, Err(Error::Connection(_))));
        assert!(!transport.is_disconnected());
    }
}

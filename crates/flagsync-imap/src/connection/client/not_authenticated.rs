//! Implementation for the not-authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::states::{Authenticated, NotAuthenticated};
use super::{Client, Rejected, announced_capabilities};
use crate::command::{Command, TagGenerator};
use crate::connection::framed::FramedStream;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new client from a connected stream.
    ///
    /// Reads the server greeting and any capabilities it announces.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut framed = FramedStream::new(stream);

        let greeting = ResponseParser::parse(&framed.read_response().await?)?;
        match &greeting {
            Response::Untagged(UntaggedResponse::Bye { text, .. }) => {
                return Err(Error::Bye(text.clone()));
            }
            Response::Untagged(UntaggedResponse::Ok { .. } | UntaggedResponse::PreAuth { .. }) => {}
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        }

        let capabilities = announced_capabilities(&greeting).map(<[_]>::to_vec);
        debug!(announced = capabilities.is_some(), "greeting received");

        Ok(Self {
            stream: framed,
            tag_gen: TagGenerator::default(),
            capabilities,
            io_timeout: None,
            state: NotAuthenticated,
        })
    }

    /// Authenticates with LOGIN.
    ///
    /// A NO from the server becomes [`Error::Auth`] and leaves the client
    /// usable for another attempt.
    #[allow(clippy::result_large_err)]
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> std::result::Result<Client<S, Authenticated>, Rejected<S, NotAuthenticated>> {
        let command = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };

        let outcome = match self.execute(&command).await {
            Ok((tag, responses)) => Self::check_tagged_ok(&responses, &tag),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => Ok(self.into_state(Authenticated)),
            Err(Error::No(text)) => Err(Rejected {
                client: self,
                error: Error::Auth(text),
            }),
            Err(error) => Err(Rejected {
                client: self,
                error,
            }),
        }
    }
}

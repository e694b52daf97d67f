//! IMAP response parser.
//!
//! Parses one complete response line (literals included) according to the
//! RFC 9051 grammar.

#![allow(clippy::missing_errors_doc)]

mod fetch;
mod helpers;
mod types;

pub use types::{FetchItem, FetchValue, UntaggedResponse};

use crate::Result;
use crate::parser::lexer::{Lexer, Token};
use crate::types::{ResponseCode, SeqNum, Status, Tag};

use helpers::{
    parse_capability_data, parse_flag_list, parse_list_response, parse_response_code,
    parse_search_response, read_text_until_crlf,
};

/// A parsed IMAP response.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Tagged response (command completion).
    Tagged {
        /// The command tag.
        tag: Tag,
        /// Response status.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Untagged response (server data).
    Untagged(UntaggedResponse),
    /// Continuation request.
    Continuation {
        /// Optional text/data.
        text: Option<String>,
    },
}

/// Response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses a complete response line.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut lexer = Lexer::new(input);

        match lexer.next_token()? {
            Token::Asterisk => Self::parse_untagged(&mut lexer),
            Token::Plus => {
                lexer.skip_spaces();
                let text = read_text_until_crlf(&mut lexer);
                Ok(Response::Continuation {
                    text: (!text.is_empty()).then_some(text),
                })
            }
            Token::Atom(tag) => Self::parse_tagged(&mut lexer, tag),
            Token::Number(n) => Self::parse_tagged(&mut lexer, &n.to_string()),
            token => Err(lexer.error(&format!("expected *, + or tag, got {token:?}"))),
        }
    }

    fn parse_tagged(lexer: &mut Lexer<'_>, tag: &str) -> Result<Response> {
        lexer.expect_space()?;
        let status = Self::parse_status(lexer)?;
        let (code, text) = Self::parse_resp_text(lexer)?;

        Ok(Response::Tagged {
            tag: Tag::new(tag),
            status,
            code,
            text,
        })
    }

    fn parse_untagged(lexer: &mut Lexer<'_>) -> Result<Response> {
        lexer.expect_space()?;

        let untagged = match lexer.next_token()? {
            Token::Atom(keyword) => match keyword.to_ascii_uppercase().as_str() {
                "OK" => {
                    let (code, text) = Self::parse_resp_text(lexer)?;
                    UntaggedResponse::Ok { code, text }
                }
                "NO" => {
                    let (code, text) = Self::parse_resp_text(lexer)?;
                    UntaggedResponse::No { code, text }
                }
                "BAD" => {
                    let (code, text) = Self::parse_resp_text(lexer)?;
                    UntaggedResponse::Bad { code, text }
                }
                "PREAUTH" => {
                    let (code, text) = Self::parse_resp_text(lexer)?;
                    UntaggedResponse::PreAuth { code, text }
                }
                "BYE" => {
                    let (code, text) = Self::parse_resp_text(lexer)?;
                    UntaggedResponse::Bye { code, text }
                }
                "CAPABILITY" => UntaggedResponse::Capability(parse_capability_data(lexer)?),
                "FLAGS" => {
                    lexer.expect_space()?;
                    UntaggedResponse::Flags(parse_flag_list(lexer)?)
                }
                "LIST" => {
                    lexer.expect_space()?;
                    UntaggedResponse::List(parse_list_response(lexer)?)
                }
                "SEARCH" => UntaggedResponse::Search(parse_search_response(lexer)?),
                _ => {
                    read_text_until_crlf(lexer);
                    UntaggedResponse::Other(keyword.to_ascii_uppercase())
                }
            },
            Token::Number(n) => {
                lexer.expect_space()?;
                let keyword = lexer.read_atom_string()?.to_ascii_uppercase();
                let count = u32::try_from(n).map_err(|_| lexer.error("message number too large"))?;
                match keyword.as_str() {
                    "EXISTS" => UntaggedResponse::Exists(count),
                    "RECENT" => UntaggedResponse::Recent(count),
                    "EXPUNGE" => UntaggedResponse::Expunge(
                        SeqNum::new(count).ok_or_else(|| lexer.error("sequence number 0"))?,
                    ),
                    "FETCH" => {
                        let seq = SeqNum::new(count).ok_or_else(|| lexer.error("sequence number 0"))?;
                        lexer.expect_space()?;
                        let items = fetch::parse_fetch_response(lexer)?;
                        UntaggedResponse::Fetch { seq, items }
                    }
                    _ => {
                        read_text_until_crlf(lexer);
                        UntaggedResponse::Other(keyword)
                    }
                }
            }
            token => {
                return Err(lexer.error(&format!("unexpected {token:?} in untagged response")));
            }
        };

        Ok(Response::Untagged(untagged))
    }

    fn parse_status(lexer: &mut Lexer<'_>) -> Result<Status> {
        let s = lexer.read_atom_string()?;
        match s.to_ascii_uppercase().as_str() {
            "OK" => Ok(Status::Ok),
            "NO" => Ok(Status::No),
            "BAD" => Ok(Status::Bad),
            "PREAUTH" => Ok(Status::PreAuth),
            "BYE" => Ok(Status::Bye),
            _ => Err(lexer.error(&format!("invalid status {s}"))),
        }
    }

    /// Parses `[SP] ["[" code "]" [SP]] text CRLF`.
    ///
    /// Some servers omit the text entirely, so the leading space is optional.
    fn parse_resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<ResponseCode>, String)> {
        lexer.skip_spaces();
        let code = if lexer.peek() == Some(b'[') {
            Some(parse_response_code(lexer)?)
        } else {
            None
        };
        lexer.skip_spaces();
        Ok((code, read_text_until_crlf(lexer)))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use crate::types::{Capability, Flag, MailboxAttribute};

    use super::*;

    fn untagged(input: &[u8]) -> UntaggedResponse {
        match ResponseParser::parse(input).unwrap() {
            Response::Untagged(u) => u,
            other => panic!("expected untagged, got {other:?}"),
        }
    }

    #[test]
    fn test_greeting_with_capabilities() {
        let response = untagged(b"* OK [CAPABILITY IMAP4rev1 X-GM-EXT-1 AUTH=PLAIN] Gimap ready\r\n");
        match response {
            UntaggedResponse::Ok {
                code: Some(ResponseCode::Capability(caps)),
                text,
            } => {
                assert!(caps.contains(&Capability::Imap4Rev1));
                assert!(caps.contains(&Capability::GmailExt1));
                assert!(caps.contains(&Capability::Auth("PLAIN".to_string())));
                assert_eq!(text, "Gimap ready");
            }
            other => panic!("expected OK with CAPABILITY, got {other:?}"),
        }
    }

    #[test]
    fn test_tagged_no_with_code() {
        let response =
            ResponseParser::parse(b"A0001 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
                .unwrap();
        assert_eq!(
            response,
            Response::Tagged {
                tag: Tag::new("A0001"),
                status: Status::No,
                code: Some(ResponseCode::AuthenticationFailed),
                text: "Invalid credentials".to_string(),
            }
        );
    }

    #[test]
    fn test_tagged_ok_without_text() {
        match ResponseParser::parse(b"A0002 OK\r\n").unwrap() {
            Response::Tagged { status, text, .. } => {
                assert_eq!(status, Status::Ok);
                assert!(text.is_empty());
            }
            other => panic!("expected tagged, got {other:?}"),
        }
    }

    #[test]
    fn test_select_data() {
        assert_eq!(untagged(b"* 172 EXISTS\r\n"), UntaggedResponse::Exists(172));
        match untagged(b"* FLAGS (\\Answered \\Seen $Forwarded)\r\n") {
            UntaggedResponse::Flags(flags) => {
                assert!(flags.contains(&Flag::Seen));
                assert!(flags.contains(&Flag::Keyword("$Forwarded".to_string())));
            }
            other => panic!("expected FLAGS, got {other:?}"),
        }
        match untagged(b"* OK [UIDVALIDITY 3857529045] UIDs valid\r\n") {
            UntaggedResponse::Ok {
                code: Some(ResponseCode::UidValidity(v)),
                ..
            } => assert_eq!(v.get(), 3857529045),
            other => panic!("expected UIDVALIDITY, got {other:?}"),
        }
    }

    #[test]
    fn test_list_gmail_folder() {
        match untagged(b"* LIST (\\HasNoChildren \\Sent) \"/\" \"[Gmail]/Sent Mail\"\r\n") {
            UntaggedResponse::List(list) => {
                assert!(list.attributes.contains(&MailboxAttribute::Sent));
                assert_eq!(list.delimiter, Some('/'));
                assert_eq!(list.mailbox.as_str(), "[Gmail]/Sent Mail");
            }
            other => panic!("expected LIST, got {other:?}"),
        }
    }

    #[test]
    fn test_uid_search() {
        assert_eq!(
            untagged(b"* SEARCH 2 84 882\r\n"),
            UntaggedResponse::Search(vec![2, 84, 882])
        );
        assert_eq!(untagged(b"* SEARCH\r\n"), UntaggedResponse::Search(vec![]));
    }

    #[test]
    fn test_fetch() {
        match untagged(b"* 12 FETCH (FLAGS (\\Seen) UID 4827)\r\n") {
            UntaggedResponse::Fetch { seq, items } => {
                assert_eq!(seq.get(), 12);
                assert_eq!(FetchItem::find_uid(&items).unwrap().get(), 4827);
            }
            other => panic!("expected FETCH, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_untagged_is_tolerated() {
        assert_eq!(
            untagged(b"* ENABLED CONDSTORE\r\n"),
            UntaggedResponse::Other("ENABLED".to_string())
        );
        assert_eq!(
            untagged(b"* 3 XMAGIC foo\r\n"),
            UntaggedResponse::Other("XMAGIC".to_string())
        );
    }

    #[test]
    fn test_continuation() {
        assert_eq!(
            ResponseParser::parse(b"+ Ready for literal\r\n").unwrap(),
            Response::Continuation {
                text: Some("Ready for literal".to_string())
            }
        );
        assert_eq!(
            ResponseParser::parse(b"+\r\n").unwrap(),
            Response::Continuation { text: None }
        );
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        assert!(matches!(
            ResponseParser::parse(b")\r\n"),
            Err(crate::Error::Parse { .. })
        ));
    }
}

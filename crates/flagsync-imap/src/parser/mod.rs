//! Sans-I/O parser for IMAP server responses.
//!
//! The [`Lexer`] turns raw bytes into tokens and [`ResponseParser`] builds
//! [`Response`] values from them. Neither touches the network.
//!
//! ```
//! use flagsync_imap::parser::{Response, ResponseParser, UntaggedResponse};
//!
//! let response = ResponseParser::parse(b"* SEARCH 3 7 11\r\n").unwrap();
//! assert_eq!(
//!     response,
//!     Response::Untagged(UntaggedResponse::Search(vec![3, 7, 11]))
//! );
//! ```

pub mod lexer;
pub mod response;

pub use lexer::{Lexer, Token};
pub use response::{FetchItem, FetchValue, Response, ResponseParser, UntaggedResponse};

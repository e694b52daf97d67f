//! FETCH response parsing.

use crate::Result;
use crate::parser::lexer::{Lexer, Token};

use super::types::{FetchItem, FetchValue};

/// Parses the parenthesized item list of a FETCH response.
///
/// Flat items are returned as [`FetchItem`]s. Body sections and nested
/// structures (ENVELOPE, BODYSTRUCTURE) are consumed and dropped.
pub fn parse_fetch_response(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    lexer.expect(&Token::LParen)?;

    let mut items = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(name) => {
                if lexer.peek() == Some(b'[') {
                    skip_section(lexer)?;
                    lexer.expect_space()?;
                    skip_value(lexer)?;
                    continue;
                }
                lexer.expect_space()?;
                let name = name.to_ascii_uppercase();
                if let Some(value) = read_value(lexer)? {
                    items.push(FetchItem {
                        value: normalize(&name, value),
                        name,
                    });
                }
            }
            token => return Err(lexer.error(&format!("unexpected {token:?} in FETCH"))),
        }
    }

    Ok(items)
}

/// `MODSEQ (n)` is a one-element list on the wire but a number in meaning.
fn normalize(name: &str, value: FetchValue) -> FetchValue {
    if name == "MODSEQ"
        && let FetchValue::List(items) = &value
        && let [single] = items.as_slice()
        && let Ok(n) = single.parse()
    {
        return FetchValue::Number(n);
    }
    value
}

/// Reads one value. Returns `None` for nested structures, which are skipped.
fn read_value(lexer: &mut Lexer<'_>) -> Result<Option<FetchValue>> {
    let value = match lexer.next_token()? {
        Token::Number(n) => FetchValue::Number(n),
        Token::QuotedString(s) => FetchValue::Text(s),
        Token::Literal(data) => FetchValue::Text(String::from_utf8_lossy(&data).into_owned()),
        Token::Atom(s) => FetchValue::Text(s.to_string()),
        Token::Nil => FetchValue::Nil,
        Token::LParen => return read_list(lexer),
        token => return Err(lexer.error(&format!("unexpected {token:?} as FETCH value"))),
    };
    Ok(Some(value))
}

fn read_list(lexer: &mut Lexer<'_>) -> Result<Option<FetchValue>> {
    let mut values = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => return Ok(Some(FetchValue::List(values))),
            Token::Space | Token::Nil => {}
            Token::Atom(s) => values.push(s.to_string()),
            Token::QuotedString(s) => values.push(s),
            Token::Number(n) => values.push(n.to_string()),
            Token::Literal(data) => values.push(String::from_utf8_lossy(&data).into_owned()),
            Token::LParen => {
                // Nested list: finish the inner one, then the outer one.
                skip_balanced(lexer, 2)?;
                return Ok(None);
            }
            token => return Err(lexer.error(&format!("unexpected {token:?} in FETCH list"))),
        }
    }
}

/// Consumes one value of any shape.
fn skip_value(lexer: &mut Lexer<'_>) -> Result<()> {
    if let Token::LParen = lexer.next_token()? {
        skip_balanced(lexer, 1)?;
    }
    Ok(())
}

/// Consumes tokens until `depth` open parentheses have been closed.
fn skip_balanced(lexer: &mut Lexer<'_>, mut depth: usize) -> Result<()> {
    while depth > 0 {
        match lexer.next_token()? {
            Token::LParen => depth += 1,
            Token::RParen => depth -= 1,
            Token::Crlf | Token::Eof => return Err(lexer.error("unbalanced parentheses")),
            _ => {}
        }
    }
    Ok(())
}

/// Consumes `[section]` and an optional `<origin>` after a BODY item name.
fn skip_section(lexer: &mut Lexer<'_>) -> Result<()> {
    while let Some(b) = lexer.advance() {
        if b == b']' {
            if lexer.peek() == Some(b'<') {
                while lexer.advance().is_some_and(|b| b != b'>') {}
            }
            return Ok(());
        }
    }
    Err(lexer.error("unterminated body section"))
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
    use super::*;

    fn parse(input: &[u8]) -> Vec<FetchItem> {
        let mut lexer = Lexer::new(input);
        parse_fetch_response(&mut lexer).unwrap()
    }

    fn value<'a>(items: &'a [FetchItem], name: &str) -> Option<&'a FetchValue> {
        items.iter().find(|i| i.name == name).map(|i| &i.value)
    }

    #[test]
    fn flags_and_uid() {
        let items = parse(b"(UID 4827 FLAGS (\\Seen \\Flagged))");
        assert_eq!(value(&items, "UID"), Some(&FetchValue::Number(4827)));
        assert_eq!(
            value(&items, "FLAGS").and_then(FetchValue::as_list),
            Some(&["\\Seen".to_string(), "\\Flagged".to_string()][..])
        );
    }

    #[test]
    fn empty_flag_list() {
        let items = parse(b"(FLAGS () UID 1)");
        assert_eq!(value(&items, "FLAGS"), Some(&FetchValue::List(vec![])));
    }

    #[test]
    fn gmail_extensions() {
        let items = parse(
            b"(X-GM-THRID 1278455344230334865 X-GM-LABELS (\"\\\\Important\" Work \"Big Project\") UID 9)",
        );
        assert_eq!(
            value(&items, "X-GM-THRID"),
            Some(&FetchValue::Number(1278455344230334865))
        );
        assert_eq!(
            value(&items, "X-GM-LABELS"),
            Some(&FetchValue::List(vec![
                "\\Important".to_string(),
                "Work".to_string(),
                "Big Project".to_string(),
            ]))
        );
    }

    #[test]
    fn modseq_becomes_a_number() {
        let items = parse(b"(MODSEQ (624140003) UID 3)");
        assert_eq!(value(&items, "MODSEQ"), Some(&FetchValue::Number(624140003)));
    }

    #[test]
    fn item_names_are_upper_cased() {
        let items = parse(b"(uid 5 internaldate \"17-Jul-1996 02:44:25 -0700\")");
        assert_eq!(value(&items, "UID"), Some(&FetchValue::Number(5)));
        assert_eq!(
            value(&items, "INTERNALDATE"),
            Some(&FetchValue::Text("17-Jul-1996 02:44:25 -0700".to_string()))
        );
    }

    #[test]
    fn structured_items_are_skipped() {
        let items = parse(
            b"(ENVELOPE (\"date\" \"subj\" ((\"A\" NIL \"a\" \"x.org\")) NIL NIL NIL NIL NIL NIL \"<id>\") UID 7)",
        );
        assert_eq!(items.len(), 1);
        assert_eq!(value(&items, "UID"), Some(&FetchValue::Number(7)));
    }

    #[test]
    fn body_sections_are_skipped() {
        let items = parse(b"(BODY[HEADER.FIELDS (SUBJECT)]<0> {4}\r\nabcd UID 8)");
        assert_eq!(items.len(), 1);
        assert_eq!(value(&items, "UID"), Some(&FetchValue::Number(8)));
    }
}

//! Integration tests for the IMAP client.
//!
//! A scripted `tokio_test` stream plays the server: every write the client
//! makes must match the next expected command byte for byte.

#![allow(clippy::unwrap_used, clippy::similar_names)]

use std::time::Duration;

use tokio_test::io::Builder;

use flagsync_imap::{
    Capability, Client, Error, FetchAttribute, FetchValue, SearchCriteria, StoreAction, Uid,
    UidSet,
};

const GREETING: &[u8] = b"* OK [CAPABILITY IMAP4rev1 IDLE X-GM-EXT-1] Gimap ready\r\n";

fn uid(n: u32) -> Uid {
    Uid::new(n).unwrap()
}

#[tokio::test]
async fn greeting_capabilities_are_observed_without_asking() {
    let mock = Builder::new().read(GREETING).build();
    let client = Client::from_stream(mock).await.unwrap();

    let caps = client.observed_capabilities().unwrap();
    assert!(caps.contains(&Capability::GmailExt1));
    assert!(client.has_capability(&Capability::Idle));
}

#[tokio::test]
async fn greeting_without_capabilities_leaves_none_observed() {
    let mock = Builder::new()
        .read(b"* OK Dovecot ready.\r\n")
        .write(b"A0000 CAPABILITY\r\n")
        .read(b"* CAPABILITY IMAP4rev1 UIDPLUS\r\nA0000 OK done\r\n")
        .build();
    let mut client = Client::from_stream(mock).await.unwrap();
    assert!(client.observed_capabilities().is_none());

    let caps = client.capability().await.unwrap();
    assert_eq!(caps, vec![Capability::Imap4Rev1, Capability::UidPlus]);
    assert_eq!(client.observed_capabilities().unwrap().len(), 2);
}

#[tokio::test]
async fn bye_greeting_is_refused() {
    let mock = Builder::new().read(b"* BYE Too many connections\r\n").build();
    let err = Client::from_stream(mock).await.unwrap_err();
    assert!(matches!(err, Error::Bye(text) if text == "Too many connections"));
}

#[tokio::test]
async fn login_picks_up_post_auth_capabilities() {
    let mock = Builder::new()
        .read(b"* OK [CAPABILITY IMAP4rev1 AUTH=PLAIN] ready\r\n")
        .write(b"A0000 LOGIN user@example.com secret\r\n")
        .read(b"* CAPABILITY IMAP4rev1 UIDPLUS CONDSTORE\r\n")
        .read(b"A0000 OK LOGIN completed\r\n")
        .build();
    let client = Client::from_stream(mock).await.unwrap();
    let client = client.login("user@example.com", "secret").await.unwrap();

    assert!(client.has_capability(&Capability::CondStore));
    assert!(!client.has_capability(&Capability::Auth("PLAIN".to_string())));
}

#[tokio::test]
async fn rejected_login_keeps_the_connection() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN user wrong\r\n")
        .read(b"A0000 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
        .write(b"A0001 LOGIN user right\r\n")
        .read(b"A0001 OK welcome\r\n")
        .build();
    let client = Client::from_stream(mock).await.unwrap();

    let rejected = client.login("user", "wrong").await.unwrap_err();
    assert!(matches!(&rejected.error, Error::Auth(text) if text == "Invalid credentials"));

    rejected.client.login("user", "right").await.unwrap();
}

#[tokio::test]
async fn list_returns_every_mailbox() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN u p\r\n")
        .read(b"A0000 OK\r\n")
        .write(b"A0001 LIST \"\" \"*\"\r\n")
        .read(b"* LIST (\\HasNoChildren) \"/\" \"INBOX\"\r\n")
        .read(b"* LIST (\\Noselect \\HasChildren) \"/\" \"[Gmail]\"\r\n")
        .read(b"* LIST (\\HasNoChildren \\Sent) \"/\" \"[Gmail]/Sent Mail\"\r\n")
        .read(b"A0001 OK LIST completed\r\n")
        .build();
    let client = Client::from_stream(mock).await.unwrap();
    let mut client = client.login("u", "p").await.unwrap();

    let mailboxes = client.list("", "*").await.unwrap();
    let selectable: Vec<_> = mailboxes
        .iter()
        .filter(|m| m.is_selectable())
        .map(|m| m.mailbox.as_str())
        .collect();
    assert_eq!(mailboxes.len(), 3);
    assert_eq!(selectable, vec!["INBOX", "[Gmail]/Sent Mail"]);
}

#[tokio::test]
async fn examine_then_search_fetch_and_store() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN u p\r\n")
        .read(b"A0000 OK\r\n")
        .write(b"A0001 SELECT INBOX\r\n")
        .read(b"* 3 EXISTS\r\n* FLAGS (\\Seen \\Flagged)\r\n")
        .read(b"* OK [UIDVALIDITY 42] UIDs valid\r\n* OK [UIDNEXT 9] next\r\n")
        .read(b"A0001 OK [READ-WRITE] SELECT completed\r\n")
        .write(b"A0002 UID SEARCH UID 4:*\r\n")
        .read(b"* SEARCH 4 7\r\nA0002 OK SEARCH completed\r\n")
        .write(b"A0003 UID FETCH 4,7 (FLAGS X-GM-LABELS)\r\n")
        .read(b"* 1 FETCH (UID 4 FLAGS (\\Seen) X-GM-LABELS (\"\\\\Important\" work))\r\n")
        .read(b"* 2 FETCH (UID 7 FLAGS ())\r\n")
        .read(b"* 3 FETCH (FLAGS (\\Deleted))\r\n")
        .read(b"A0003 OK FETCH completed\r\n")
        .write(b"A0004 UID STORE 7 +FLAGS.SILENT (\\Seen)\r\n")
        .read(b"A0004 OK STORE completed\r\n")
        .build();
    let client = Client::from_stream(mock).await.unwrap();
    let client = client.login("u", "p").await.unwrap();
    let mut client = client.select("INBOX").await.unwrap();

    assert_eq!(client.mailbox().as_str(), "INBOX");
    assert!(!client.state().is_read_only());
    let status = client.state().status();
    assert_eq!(status.exists, 3);
    assert_eq!(status.uid_validity.unwrap().get(), 42);
    assert_eq!(status.uid_next, Some(uid(9)));

    let uids = client
        .uid_search(SearchCriteria::Uid(UidSet::RangeFrom(uid(4))))
        .await
        .unwrap();
    assert_eq!(uids, vec![uid(4), uid(7)]);

    let set = UidSet::from_uids(&uids).unwrap();
    let attributes = [FetchAttribute::Flags, FetchAttribute::parse("x-gm-labels")];
    let messages = client.uid_fetch(&set, &attributes).await.unwrap();
    assert_eq!(messages.len(), 2);

    let (first_uid, items) = &messages[0];
    assert_eq!(*first_uid, uid(4));
    let labels = items.iter().find(|i| i.name == "X-GM-LABELS").unwrap();
    assert_eq!(
        labels.value,
        FetchValue::List(vec!["\\Important".to_string(), "work".to_string()])
    );

    client
        .uid_store(
            &UidSet::single(uid(7)),
            StoreAction::add("FLAGS", vec!["\\Seen".to_string()]),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn malformed_store_is_refused_before_writing() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN u p\r\n")
        .read(b"A0000 OK\r\n")
        .write(b"A0001 SELECT INBOX\r\n")
        .read(b"A0001 OK [READ-WRITE] done\r\n")
        .write("A0002 UID STORE 7 +X-GM-LABELS.SILENT (\"caf\u{e9}\")\r\n".as_bytes())
        .read(b"A0002 OK STORE completed\r\n")
        .build();
    let client = Client::from_stream(mock).await.unwrap();
    let client = client.login("u", "p").await.unwrap();
    let mut client = client.select("INBOX").await.unwrap();
    let target = UidSet::single(uid(7));

    let smuggled = StoreAction::add(
        "FLAGS (x)\r\nA9 DELETE INBOX\r\nA8 NOOP",
        vec!["\\Seen".to_string()],
    );
    let err = client.uid_store(&target, smuggled).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));

    let bad_fetch = [FetchAttribute::parse("FLAGS)")];
    assert!(client.uid_fetch(&target, &bad_fetch).await.is_err());

    let label = StoreAction::add("X-GM-LABELS", vec!["caf\u{e9}".to_string()]);
    client.uid_store(&target, label).await.unwrap();
}

#[tokio::test]
async fn rejected_select_falls_back_to_authenticated() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN u p\r\n")
        .read(b"A0000 OK\r\n")
        .write(b"A0001 EXAMINE Missing\r\n")
        .read(b"A0001 NO [NONEXISTENT] Unknown mailbox\r\n")
        .write(b"A0002 EXAMINE INBOX\r\n")
        .read(b"* OK [UIDVALIDITY 1] ok\r\nA0002 OK [READ-ONLY] done\r\n")
        .build();
    let client = Client::from_stream(mock).await.unwrap();
    let client = client.login("u", "p").await.unwrap();

    let rejected = client.examine("Missing").await.unwrap_err();
    assert!(matches!(rejected.error, Error::No(_)));
    assert!(!rejected.error.is_connection_lost());

    let client = rejected.client.examine("INBOX").await.unwrap();
    assert!(client.state().is_read_only());
}

#[tokio::test]
async fn logout_accepts_bye_before_hangup() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGOUT\r\n")
        .read(b"* BYE see you\r\n")
        .build();
    let client = Client::from_stream(mock).await.unwrap();
    client.logout().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn io_timeout_bounds_a_silent_server() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 NOOP\r\n")
        .wait(Duration::from_secs(120))
        .build();
    let mut client = Client::from_stream(mock)
        .await
        .unwrap()
        .with_io_timeout(Duration::from_secs(5));

    let err = client.noop().await.unwrap_err();
    assert!(matches!(err, Error::Timeout(d) if d == Duration::from_secs(5)));
    assert!(err.is_connection_lost());
}

//! `flagsync` - inspect and update IMAP flags and labels from the shell.
//!
//! Reads the account from the JSON settings file (see
//! [`flagsync_core::config`]) and runs one provider operation per
//! invocation.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use flagsync_core::{Access, AttributeBag, Provider, Settings, UidRange, WriteGate};
use flagsync_imap::{FetchValue, Uid, UidValidity};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file; defaults to `<config_dir>/flagsync/config.json`.
    #[arg(short, long, global = true, env = "FLAGSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Allow writes for this run even if the settings forbid them.
    #[arg(long, global = true)]
    allow_write: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the server's capabilities
    Capabilities,
    /// Print every selectable mailbox
    Mailboxes,
    /// Print the label → mailbox map
    Labels,
    /// Print UIDs in a mailbox
    Uids(RangeArgs),
    /// Print flags (and service labels) of messages in a mailbox
    Flags(RangeArgs),
    /// Move a message's flags from one set to another
    SetFlags {
        /// Mailbox holding the message
        mailbox: String,
        /// Message UID
        uid: u32,
        /// Values the message has now, comma separated
        #[arg(long, value_delimiter = ',', default_value = "")]
        old: Vec<String>,
        /// Values the message should have, comma separated
        #[arg(long, value_delimiter = ',', default_value = "")]
        new: Vec<String>,
        /// Attribute to store into
        #[arg(long, default_value = "FLAGS")]
        attribute: String,
    },
    /// Archive a message the way the mail service does it
    Archive {
        /// Mailbox holding the message
        mailbox: String,
        /// Message UID
        uid: u32,
    },
}

#[derive(Args, Debug)]
struct RangeArgs {
    /// Mailbox to open read-only
    mailbox: String,
    /// Lowest UID, inclusive
    #[arg(long)]
    from: Option<u32>,
    /// Highest UID, inclusive
    #[arg(long)]
    to: Option<u32>,
}

impl RangeArgs {
    fn range(&self) -> Result<UidRange> {
        Ok(UidRange {
            from: self.from.map(parse_uid).transpose()?,
            to: self.to.map(parse_uid).transpose()?,
        })
    }
}

fn parse_uid(n: u32) -> Result<Uid> {
    Uid::new(n).with_context(|| format!("{n} is not a valid UID"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flagsync=info,flagsync_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let path = cli.config.clone().unwrap_or_else(Settings::default_path);
    let settings = Settings::load(&path)
        .await
        .with_context(|| format!("loading settings from {}", path.display()))?;

    let gate = WriteGate::from(&settings.sync);
    if cli.allow_write {
        gate.set(true);
    }

    let mut provider = Provider::from_config(&settings.account, gate);
    let outcome = run(&mut provider, cli.command).await;
    provider.disconnect().await;
    outcome
}

async fn run(provider: &mut Provider, command: Command) -> Result<()> {
    provider
        .connect()
        .await
        .context("connecting to the IMAP server")?;

    match command {
        Command::Capabilities => {
            for capability in provider.capabilities().await? {
                println!("{capability}");
            }
        }
        Command::Mailboxes => {
            for name in provider.list_mailboxes().await? {
                println!("{name}");
            }
        }
        Command::Labels => {
            for (label, mailbox) in provider.labels().await? {
                println!("{label}\t{mailbox}");
            }
        }
        Command::Uids(args) => {
            if let Some(validity) = open(provider, &args.mailbox, Access::ReadOnly).await? {
                println!("UIDVALIDITY {validity}");
            }
            for uid in provider.uids(args.range()?).await? {
                println!("{uid}");
            }
        }
        Command::Flags(args) => {
            open(provider, &args.mailbox, Access::ReadOnly).await?;
            let uids = provider.uids(args.range()?).await?;

            let mut fields = vec!["FLAGS"];
            fields.extend(provider.service().label_attribute());
            for bag in provider.fetch(&uids, &fields).await? {
                println!("{}", describe(&bag));
            }
        }
        Command::SetFlags {
            mailbox,
            uid,
            old,
            new,
            attribute,
        } => {
            let uid = parse_uid(uid)?;
            open(provider, &mailbox, Access::ReadWrite).await?;

            let old = without_blanks(old);
            let new = without_blanks(new);
            let delta = provider.apply_delta(uid, &attribute, &old, &new).await?;
            if delta.is_empty() {
                info!(%uid, "already up to date");
            } else {
                println!(
                    "{uid} +({}) -({})",
                    delta.additions.join(" "),
                    delta.removals.join(" ")
                );
            }
        }
        Command::Archive { mailbox, uid } => {
            let uid = parse_uid(uid)?;
            open(provider, &mailbox, Access::ReadWrite).await?;
            provider.archive(uid).await?;
            info!(%uid, service = %provider.service().kind(), "archived");
        }
    }
    Ok(())
}

async fn open(
    provider: &mut Provider,
    mailbox: &str,
    access: Access,
) -> Result<Option<UidValidity>> {
    let validity = provider
        .open_mailbox(mailbox, access)
        .await
        .with_context(|| format!("opening {mailbox}"))?;
    debug!(mailbox, ?validity, ?access, "mailbox open");
    Ok(validity)
}

/// Clap yields `[""]` for an empty `--old`/`--new`.
fn without_blanks(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn describe(bag: &AttributeBag) -> String {
    let mut parts = vec![bag.uid.to_string()];
    parts.extend(bag.iter().map(|(field, value)| {
        let rendered = match value {
            FetchValue::List(items) => format!("({})", items.join(" ")),
            FetchValue::Number(n) => n.to_string(),
            FetchValue::Text(s) => s.clone(),
            FetchValue::Nil => "NIL".to_string(),
        };
        format!("{field}={rendered}")
    }));
    parts.join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_set_flags() {
        let cli = Cli::try_parse_from([
            "flagsync",
            "--allow-write",
            "set-flags",
            "INBOX",
            "7",
            "--old",
            "a,b",
            "--new",
            "b,c",
        ])
        .unwrap();

        assert!(cli.allow_write);
        let Command::SetFlags {
            uid, old, new, attribute, ..
        } = cli.command
        else {
            panic!("wrong subcommand");
        };
        assert_eq!(uid, 7);
        assert_eq!(old, ["a", "b"]);
        assert_eq!(new, ["b", "c"]);
        assert_eq!(attribute, "FLAGS");
    }

    #[test]
    fn range_args_reject_zero() {
        let args = RangeArgs {
            mailbox: "INBOX".to_string(),
            from: Some(0),
            to: None,
        };
        assert!(args.range().is_err());
    }

    #[test]
    fn blank_values_are_dropped() {
        assert!(without_blanks(vec![String::new()]).is_empty());
        assert_eq!(without_blanks(vec![" a ".to_string()]), ["a"]);
    }

    #[test]
    fn bag_lines_list_fields() {
        let mut bag = AttributeBag::new(Uid::new(4).unwrap());
        bag.insert("FLAGS", FetchValue::List(vec!["\\Seen".to_string()]));
        bag.insert("X-GM-LABELS", FetchValue::List(Vec::new()));
        assert_eq!(describe(&bag), "4 FLAGS=(\\Seen) X-GM-LABELS=()");
    }
}

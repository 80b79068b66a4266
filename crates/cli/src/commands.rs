//! Command-line commands and their execution.

use std::path::{Path, PathBuf};

use admin_api::{ChangesFollower, FollowOptions, GatewayClient};
use anyhow::Context;
use gateway::{
    Attachment, AttachmentName, ChangesParams, ConsoleError, DatabaseName, DocsPage, DocumentId, Outcome,
    RequestError, RevisionId, UserInfo, UserName,
};
use request::RequestHandle;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ConsoleConfig;

/// Server-side longpoll timeout; shorter than the default client timeout so
/// an idle feed answers with an empty batch instead of timing out.
const LONGPOLL_TIMEOUT_MS: u64 = 30_000;

pub const USAGE: &str = "\
usage: gwadmin <command> [args]

commands:
  dbs                               list databases
  db <db>                           show database info
  docs <db> [startkey]              list one page of documents
  doc <db> <id>                     show a document with its revision history
  rev <db> <id> <rev>               show one revision
  create <db> <json|@file>          create a document
  update <db> <id> <rev> <json|@file>
                                    replace a revision
  attach <db> <id> <rev> <file>     upload a file as an attachment
  delete <db> <id> <rev>            delete a document revision
  changes <db> [since]              tail the change feed until Ctrl-C
  users <db>                        list users
  user <db> <name>                  show a user
  user-create <db> <json|@file>     create a user
  user-update <db> <name> <json|@file>
                                    update a user
  user-delete <db> <name>           delete a user

environment:
  GWADMIN_SERVER_URL    admin API base (default http://localhost:4985/)
  GWADMIN_TIMEOUT_SECS  request timeout, 0 disables (default 60)
  GWADMIN_PAGE_SIZE     documents per page (default 20)
  GWADMIN_LOG_FORMAT    text | json (default text)
  RUST_LOG              log filter (default info)";

/// One parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Databases,
    Database { db: DatabaseName },
    Docs { db: DatabaseName, startkey: Option<DocumentId> },
    Doc { db: DatabaseName, doc: DocumentId },
    Revision { db: DatabaseName, doc: DocumentId, rev: RevisionId },
    Create { db: DatabaseName, body: String },
    Update { db: DatabaseName, doc: DocumentId, rev: RevisionId, body: String },
    Attach { db: DatabaseName, doc: DocumentId, rev: RevisionId, file: PathBuf },
    Delete { db: DatabaseName, doc: DocumentId, rev: RevisionId },
    Changes { db: DatabaseName, since: Option<Value> },
    Users { db: DatabaseName },
    User { db: DatabaseName, user: UserName },
    CreateUser { db: DatabaseName, body: String },
    UpdateUser { db: DatabaseName, user: UserName, body: String },
    DeleteUser { db: DatabaseName, user: UserName },
}

impl Command {
    /// Parses the arguments that follow the program name.
    pub fn parse(args: &[String]) -> Result<Self, ConsoleError> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Self::Help);
        };
        let mut args = Args { command: name, rest, next: 0 };

        let command = match name.as_str() {
            "help" | "-h" | "--help" => Self::Help,
            "dbs" => Self::Databases,
            "db" => Self::Database { db: args.required("db")? },
            "docs" => Self::Docs {
                db: args.required("db")?,
                startkey: args.optional()?,
            },
            "doc" => Self::Doc {
                db: args.required("db")?,
                doc: args.required("id")?,
            },
            "rev" => Self::Revision {
                db: args.required("db")?,
                doc: args.required("id")?,
                rev: args.required("rev")?,
            },
            "create" => Self::Create {
                db: args.required("db")?,
                body: args.required("json")?,
            },
            "update" => Self::Update {
                db: args.required("db")?,
                doc: args.required("id")?,
                rev: args.required("rev")?,
                body: args.required("json")?,
            },
            "attach" => Self::Attach {
                db: args.required("db")?,
                doc: args.required("id")?,
                rev: args.required("rev")?,
                file: args.required("file")?,
            },
            "delete" => Self::Delete {
                db: args.required("db")?,
                doc: args.required("id")?,
                rev: args.required("rev")?,
            },
            "changes" => Self::Changes {
                db: args.required("db")?,
                since: args.optional::<String>()?.map(|raw| parse_since(&raw)),
            },
            "users" => Self::Users { db: args.required("db")? },
            "user" => Self::User {
                db: args.required("db")?,
                user: args.required("name")?,
            },
            "user-create" => Self::CreateUser {
                db: args.required("db")?,
                body: args.required("json")?,
            },
            "user-update" => Self::UpdateUser {
                db: args.required("db")?,
                user: args.required("name")?,
                body: args.required("json")?,
            },
            "user-delete" => Self::DeleteUser {
                db: args.required("db")?,
                user: args.required("name")?,
            },
            other => {
                return Err(ConsoleError::Usage {
                    message: format!("unknown command '{other}'"),
                })
            }
        };

        args.finish()?;
        Ok(command)
    }
}

/// Cursor over the positional arguments of one command.
struct Args<'a> {
    command: &'a str,
    rest: &'a [String],
    next: usize,
}

impl Args<'_> {
    fn required<T>(&mut self, what: &str) -> Result<T, ConsoleError>
    where
        T: std::str::FromStr,
        ConsoleError: From<T::Err>,
    {
        self.optional()?.ok_or_else(|| ConsoleError::Usage {
            message: format!("'{}' needs <{what}>", self.command),
        })
    }

    fn optional<T>(&mut self) -> Result<Option<T>, ConsoleError>
    where
        T: std::str::FromStr,
        ConsoleError: From<T::Err>,
    {
        let Some(raw) = self.rest.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        Ok(Some(raw.parse::<T>()?))
    }

    fn finish(self) -> Result<(), ConsoleError> {
        match self.rest.get(self.next) {
            None => Ok(()),
            Some(extra) => Err(ConsoleError::Usage {
                message: format!("unexpected argument '{extra}' for '{}'", self.command),
            }),
        }
    }
}

/// Sequences are numeric on some servers and opaque strings on others.
fn parse_since(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(number @ Value::Number(_)) => number,
        _ => Value::String(raw.to_owned()),
    }
}

/// What the process should report after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Done,
    Canceled,
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Runs `command` against `client`, printing results to stdout.
pub async fn execute(
    command: Command,
    client: &GatewayClient,
    config: &ConsoleConfig,
) -> anyhow::Result<Completion> {
    let handle = match command {
        Command::Help => {
            println!("{USAGE}");
            return Ok(Completion::Done);
        }
        Command::Changes { db, since } => return tail_changes(client, db, since).await,
        Command::Docs { db, startkey } => {
            let outcome = settle(client.fetch_docs(&db, config.page_size, startkey.as_ref())).await;
            return match outcome {
                Ok(response) => report(Ok(docs_page(response.data, config.page_size)?)),
                Err(err) => report(Err(err)),
            };
        }
        Command::Databases => client.fetch_all_databases(),
        Command::Database { db } => client.fetch_database(&db),
        Command::Doc { db, doc } => client.fetch_doc(&db, &doc),
        Command::Revision { db, doc, rev } => client.fetch_revision(&db, &doc, &rev),
        Command::Create { db, body } => client.create_doc(&db, &read_json(&body).await?),
        Command::Update { db, doc, rev, body } => {
            client.update_revision(&db, &doc, &rev, &read_json(&body).await?)
        }
        Command::Attach { db, doc, rev, file } => {
            let attachment = read_attachment(&file).await?;
            client.upload_attachment(&db, &doc, &rev, &attachment)
        }
        Command::Delete { db, doc, rev } => client.delete_doc(&db, &doc, &rev),
        Command::Users { db } => client.fetch_users(&db),
        Command::User { db, user } => client.fetch_user(&db, &user),
        Command::CreateUser { db, body } => {
            let info: UserInfo = serde_json::from_value(read_json(&body).await?)
                .map_err(ConsoleError::InvalidJson)?;
            client.create_user(&db, &info)
        }
        Command::UpdateUser { db, user, body } => {
            let info: UserInfo = serde_json::from_value(read_json(&body).await?)
                .map_err(ConsoleError::InvalidJson)?;
            client.update_user(&db, &user, &info)
        }
        Command::DeleteUser { db, user } => client.delete_user(&db, &user),
    };

    let outcome = settle(handle).await;
    report(outcome.map(|response| {
        response
            .data
            .unwrap_or_else(|| serde_json::json!({ "status": response.status }))
    }))
}

/// One page of `_all_docs` output with its next start key.
fn docs_page(data: Option<Value>, page_size: usize) -> anyhow::Result<Value> {
    let page = DocsPage::from_all_docs(&data.unwrap_or(Value::Null), page_size);
    serde_json::to_value(page).context("failed to render page")
}

/// Awaits `handle`, cancelling it on Ctrl-C.
async fn settle(handle: RequestHandle) -> Outcome {
    debug!(request_id = %handle.id(), "Awaiting request");
    let (mut promise, canceller) = handle.into_parts();
    tokio::select! {
        outcome = &mut promise => outcome,
        _ = tokio::signal::ctrl_c() => {
            canceller.cancel();
            promise.await
        }
    }
}

fn report(outcome: Result<Value, RequestError>) -> anyhow::Result<Completion> {
    match outcome {
        Ok(value) => {
            let text = serde_json::to_string_pretty(&value).context("failed to render response")?;
            println!("{text}");
            Ok(Completion::Done)
        }
        Err(RequestError::Canceled) => {
            warn!("Request canceled");
            Ok(Completion::Canceled)
        }
        Err(err) => Err(err.into()),
    }
}

async fn tail_changes(
    client: &GatewayClient,
    db: DatabaseName,
    since: Option<Value>,
) -> anyhow::Result<Completion> {
    let options = FollowOptions {
        since,
        params: ChangesParams {
            timeout: Some(LONGPOLL_TIMEOUT_MS),
            ..ChangesParams::default()
        },
        ..FollowOptions::default()
    };
    let (follower, mut batches) = ChangesFollower::start(client.clone(), db, options);

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    let mut completion = Completion::Done;
    loop {
        tokio::select! {
            batch = batches.recv() => match batch {
                Some(batch) => {
                    for change in &batch.results {
                        println!("{change}");
                    }
                    info!(count = batch.results.len(), last_seq = %batch.last_seq, "Change batch");
                }
                None => break,
            },
            _ = &mut interrupt => {
                follower.stop();
                completion = Completion::Canceled;
                break;
            }
        }
    }

    follower.join().await.context("change feed ended with an error")?;
    Ok(completion)
}

/// Reads a JSON argument: inline text, or `@path` for a file.
async fn read_json(arg: &str) -> anyhow::Result<Value> {
    let text = match arg.strip_prefix('@') {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {path}"))?,
        None => arg.to_owned(),
    };
    Ok(serde_json::from_str(&text).map_err(ConsoleError::InvalidJson)?)
}

async fn read_attachment(file: &Path) -> anyhow::Result<Attachment> {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(AttachmentName::new)
        .ok_or_else(|| ConsoleError::Usage {
            message: format!("'{}' does not name a file", file.display()),
        })?;
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    Ok(Attachment {
        name,
        content_type: content_type_for(file).map(str::to_owned),
        bytes,
    })
}

fn content_type_for(file: &Path) -> Option<&'static str> {
    let extension = file.extension()?.to_str()?.to_ascii_lowercase();
    Some(match extension.as_str() {
        "json" => "application/json",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        _ => return None,
    })
}

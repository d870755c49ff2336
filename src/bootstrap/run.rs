//! Headless host: drives the engine from line commands on stdin.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use ps_app::Engine;
use ps_core::config::EngineConfig;
use ps_core::ids::ProjectId;
use ps_core::migration::{MigrationState, MigrationTarget};
use ps_core::ports::EphemeralMediaPort;
use ps_core::section::{EmbeddedMedia, MediaReference, Section, SectionsSnapshot};
use ps_infra::{InMemoryEphemeralMedia, ManualAuthSignal};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::wiring::{wire_dependencies, HostAdapters};

/// One line of host input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add { layout: String, headline: String },
    Image { layout: String, path: String },
    Undo,
    Redo,
    Show,
    Save,
    Publish { title: Option<String> },
    Open(ProjectId),
    Projects,
    Delete(ProjectId),
    Login(String),
    Logout,
    Import { title: String },
    ImportInto(ProjectId),
    Discard,
    Defer,
    Clear,
    ResetMedia,
    Help,
    Quit,
}

const HELP: &str = "\
add <layout> [headline]   append a section
image <layout> <file>     append a section with an image
undo | redo | show
save                      save to this device
publish [title]           save to the account
open <id> | delete <id> | projects
login <user> | logout
import [title] | import-into <id> | discard | defer
clear                     delete this device's draft
reset-media               delete every uploaded image
quit";

pub fn parse_command(line: &str) -> anyhow::Result<Command> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let arg = |name: &str| -> anyhow::Result<String> {
        if rest.is_empty() {
            bail!("`{verb}` needs <{name}>");
        }
        Ok(rest.to_string())
    };

    let command = match verb {
        "add" => {
            let layout = arg("layout")?;
            let (layout, headline) = match layout.split_once(char::is_whitespace) {
                Some((layout, headline)) => (layout.to_string(), headline.trim().to_string()),
                None => (layout, String::new()),
            };
            Command::Add { layout, headline }
        }
        "image" => {
            let rest = arg("layout")?;
            let Some((layout, path)) = rest.split_once(char::is_whitespace) else {
                bail!("`image` needs <layout> <file>");
            };
            Command::Image {
                layout: layout.to_string(),
                path: path.trim().to_string(),
            }
        }
        "undo" => Command::Undo,
        "redo" => Command::Redo,
        "show" => Command::Show,
        "save" => Command::Save,
        "publish" => Command::Publish {
            title: (!rest.is_empty()).then(|| rest.to_string()),
        },
        "open" => Command::Open(ProjectId::from(arg("id")?)),
        "projects" => Command::Projects,
        "delete" => Command::Delete(ProjectId::from(arg("id")?)),
        "login" => Command::Login(arg("user")?),
        "logout" => Command::Logout,
        "import" => Command::Import {
            title: rest.to_string(),
        },
        "import-into" => Command::ImportInto(ProjectId::from(arg("id")?)),
        "discard" => Command::Discard,
        "defer" => Command::Defer,
        "clear" => Command::Clear,
        "reset-media" => Command::ResetMedia,
        "help" | "" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command `{other}`"),
    };
    Ok(command)
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}

fn describe(snapshot: &SectionsSnapshot) -> String {
    if snapshot.is_empty() {
        return "(empty page)".to_string();
    }
    snapshot
        .iter()
        .enumerate()
        .map(|(i, section)| {
            let headline = section
                .fields
                .get("headline")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            let media = match &section.media {
                MediaReference::None => String::new(),
                MediaReference::Ephemeral(_) => " [image: local]".to_string(),
                MediaReference::Durable(url) => format!(" [image: {url}]"),
                MediaReference::Malformed(_) => " [image: invalid]".to_string(),
            };
            format!("{i:>2}. {} {headline}{media}", section.layout)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

struct Host {
    engine: Engine,
    auth: Arc<ManualAuthSignal>,
    ephemeral_media: Arc<InMemoryEphemeralMedia>,
    default_title: String,
}

impl Host {

    fn append(&self, section: Section) {
        let mut sections = self.engine.session.snapshot().to_vec();
        sections.push(section);
        self.engine.session.apply_edit(sections);
    }

    /// Returns `false` when the host should stop.
    async fn execute(&self, command: Command) -> anyhow::Result<bool> {
        let session = &self.engine.session;
        match command {
            Command::Add { layout, headline } => {
                self.append(Section::new(layout).with_field("headline", headline));
            }
            Command::Image { layout, path } => {
                let path = Path::new(&path);
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read image: {}", path.display()))?;
                let handle = self
                    .ephemeral_media
                    .register(EmbeddedMedia::new(content_type_for(path), bytes));
                self.append(Section::new(layout).with_media(MediaReference::Ephemeral(handle)));
            }
            Command::Undo => {
                if session.undo().is_none() {
                    println!("nothing to undo");
                }
            }
            Command::Redo => {
                if session.redo().is_none() {
                    println!("nothing to redo");
                }
            }
            Command::Show => {}
            Command::Save => match session.save_local().await {
                Ok(()) => println!("saved on this device"),
                Err(err) => println!("{err}. {}", err.remediation()),
            },
            Command::Publish { title } => match session.save_remote(title).await {
                Ok(saved) => {
                    println!("saved project {}", saved.project.id);
                    if saved.failed_media > 0 {
                        println!("{} image(s) could not be uploaded", saved.failed_media);
                    }
                }
                Err(err) => println!("{err}. {}", err.remediation()),
            },
            Command::Open(id) => {
                session
                    .open_project(&id)
                    .await
                    .with_context(|| format!("Failed to open project {id}"))?;
            }
            Command::Projects => {
                let identity = session.identity();
                let Some(owner) = identity.user_id() else {
                    println!("sign in to list projects");
                    return Ok(true);
                };
                for summary in self.engine.list_projects.execute(owner).await? {
                    println!(
                        "{}  {}  ({} sections, updated {})",
                        summary.id, summary.title, summary.section_count, summary.updated_at
                    );
                }
            }
            Command::Delete(id) => {
                let identity = session.identity();
                let Some(owner) = identity.user_id() else {
                    println!("sign in to delete projects");
                    return Ok(true);
                };
                self.engine
                    .delete_project
                    .execute(owner, &id)
                    .await
                    .with_context(|| format!("Failed to delete project {id}"))?;
                if session.project_id().as_ref() == Some(&id) {
                    session.reset_to_empty();
                }
            }
            Command::Login(user) => self.auth.sign_in(user),
            Command::Logout => self.auth.sign_out(),
            Command::Import { title } => {
                let title = if title.is_empty() {
                    self.default_title.clone()
                } else {
                    title
                };
                self.import(MigrationTarget::NewProject { title }).await;
            }
            Command::ImportInto(id) => self.import(MigrationTarget::Existing(id)).await,
            Command::Discard => match self.engine.migration.discard().await {
                Ok(_) => println!("local work discarded"),
                Err(err) => println!("{err}. {}", err.remediation()),
            },
            Command::Defer => {
                self.engine.migration.defer().await?;
            }
            Command::Clear => match session.clear_local() {
                Ok(()) => println!("device draft deleted"),
                Err(err) => println!("{err}. {}", err.remediation()),
            },
            Command::ResetMedia => {
                let identity = session.identity();
                let Some(owner) = identity.user_id() else {
                    println!("sign in to manage uploads");
                    return Ok(true);
                };
                let reset = self.engine.reset_media_quota.execute(owner).await?;
                println!(
                    "removed {} upload(s), freed {} bytes, {} failed",
                    reset.removed,
                    reset.freed_bytes,
                    reset.failed.len()
                );
            }
            Command::Help => {
                println!("{HELP}");
                return Ok(true);
            }
            Command::Quit => return Ok(false),
        }
        println!("{}", describe(&session.snapshot()));
        Ok(true)
    }

    async fn import(&self, target: MigrationTarget) {
        match self.engine.import_anonymous_work(target).await {
            Ok(MigrationState::Promoted {
                project_id,
                promoted_media,
                failed_media,
            }) => {
                println!("imported into {project_id} ({promoted_media} image(s) uploaded)");
                if failed_media > 0 {
                    println!("{failed_media} image(s) could not be carried over");
                }
            }
            Ok(state) => println!("migration is {state:?}"),
            Err(err) => println!("{err}. {}", err.remediation()),
        }
    }
}

/// Run the headless host until `quit` or end of input.
pub async fn run_app(config: EngineConfig) -> anyhow::Result<()> {
    let HostAdapters {
        deps,
        auth,
        migration_events,
        ephemeral_media,
    } = wire_dependencies(&config)?;
    let engine = Engine::new(deps, &config);
    let tasks = engine.start();

    let mut offers = migration_events.subscribe();
    let offer_watch = tokio::spawn(async move {
        while offers.changed().await.is_ok() {
            if let MigrationState::Offered { pending, error, .. } = &*offers.borrow_and_update() {
                println!(
                    "You have {} unsaved section(s) from before signing in: import [title] | discard | defer",
                    pending.section_count
                );
                if let Some(error) = error {
                    println!("last import failed: {error}");
                }
            }
        }
    });

    let host = Host {
        engine,
        auth,
        ephemeral_media,
        default_title: config.projects.default_title.clone(),
    };
    info!("pagesync host ready");
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        match host.execute(command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => {
                warn!(error = %err, "command failed");
                println!("{err:#}");
            }
        }
    }

    host.engine.shutdown().await;
    offer_watch.abort();
    for task in tasks {
        task.abort();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_splits_layout_and_headline() {
        assert_eq!(
            parse_command("add hero  Ship pages faster").unwrap(),
            Command::Add {
                layout: "hero".into(),
                headline: "Ship pages faster".into()
            }
        );
        assert_eq!(
            parse_command("add footer").unwrap(),
            Command::Add {
                layout: "footer".into(),
                headline: String::new()
            }
        );
    }

    #[test]
    fn test_parse_rejects_missing_arguments() {
        assert!(parse_command("open").is_err());
        assert!(parse_command("image hero").is_err());
        assert!(parse_command("login").is_err());
        assert!(parse_command("teleport").is_err());
    }

    #[test]
    fn test_parse_optional_title() {
        assert_eq!(
            parse_command("publish").unwrap(),
            Command::Publish { title: None }
        );
        assert_eq!(
            parse_command("publish Spring launch").unwrap(),
            Command::Publish {
                title: Some("Spring launch".into())
            }
        );
        assert_eq!(
            parse_command("import-into p-1").unwrap(),
            Command::ImportInto(ProjectId::from("p-1"))
        );
    }

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(content_type_for(Path::new("a/logo.SVG")), "image/svg+xml");
        assert_eq!(content_type_for(Path::new("photo.png")), "image/png");
        assert_eq!(content_type_for(Path::new("noext")), "image/jpeg");
    }

    #[test]
    fn test_describe_marks_media_kinds() {
        let snapshot = SectionsSnapshot::new(vec![
            Section::new("hero").with_field("headline", "Hi"),
            Section::new("gallery").with_media(MediaReference::Malformed("x".into())),
        ]);
        let text = describe(&snapshot);
        assert!(text.contains(" 0. hero Hi"));
        assert!(text.contains("[image: invalid]"));
        assert_eq!(describe(&SectionsSnapshot::empty()), "(empty page)");
    }
}

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use colored::Colorize;
use exlibris_federation::{
    resolve, AuthenticatedActor, ConfigError, FederatedObject, FederationConfig,
    FederationDatabase, FederationStore, IdGenerator, Read, Repositories, ResourceRef,
    PUBLIC_COLLECTION,
};
use exlibris_store::InMemoryIdentityStore;
use exlibris_types::{Actor, Author, Book, Iri, ReadActivity};
use serde_json::json;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Resolve(args) => cmd_resolve(&config, args, &cli.format),
        Command::Owns(args) => cmd_owns(&config, args, &cli.format),
        Command::NewId(args) => cmd_new_id(config, args, &cli.format),
        Command::Config => cmd_config(&config, &cli.format),
        Command::Demo(args) => cmd_demo(config, args, &cli.format).await,
    }
}

/// An explicit file wins; otherwise the environment, falling back to
/// defaults when `DOMAIN` is unset.
fn load_config(path: Option<&Path>) -> anyhow::Result<FederationConfig> {
    if let Some(path) = path {
        return FederationConfig::load(path)
            .with_context(|| format!("loading {}", path.display()));
    }
    match FederationConfig::from_env() {
        Ok(config) => Ok(config),
        Err(ConfigError::Missing(var)) => {
            tracing::warn!(var, "not set, using default configuration");
            Ok(FederationConfig::default())
        }
        Err(e) => Err(e).context("reading configuration from the environment"),
    }
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_resolve(
    config: &FederationConfig,
    args: ResolveArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let iri = Iri::parse(&args.iri)?;
    let resource = resolve(&iri);
    let owned = config.owns(&iri);
    if let OutputFormat::Json = format {
        let activity_id = match &resource {
            Some(ResourceRef::ReadActivity { activity_id, .. }) => Some(activity_id.as_str()),
            _ => None,
        };
        return print_json(&json!({
            "iri": iri,
            "kind": resource.as_ref().map(ResourceRef::kind_name),
            "username": resource.as_ref().map(ResourceRef::username),
            "activity_id": activity_id,
            "owned": owned,
        }));
    }
    match resource {
        Some(r) => {
            println!("{} {}", "✓".green().bold(), r.kind_name().cyan());
            println!("  User: {}", r.username().yellow());
            if let ResourceRef::ReadActivity { activity_id, .. } = &r {
                println!("  Read: {}", activity_id);
            }
        }
        None => println!("{} not a resource this deployment serves", "✗".red().bold()),
    }
    println!("  Owned: {}", if owned { "yes".green() } else { "no".dimmed() });
    Ok(())
}

fn cmd_owns(
    config: &FederationConfig,
    args: OwnsArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let iri = Iri::parse(&args.iri)?;
    let owned = config.owns(&iri);
    match format {
        OutputFormat::Json => print_json(&json!({ "iri": iri, "owned": owned })),
        OutputFormat::Text => {
            if owned {
                let base = config.base_url();
                println!("{} {} is hosted at {}", "✓".green().bold(), iri, base.bold());
            } else {
                println!("{} {} is remote", "✗".red().bold(), iri);
            }
            Ok(())
        }
    }
}

fn cmd_new_id(
    config: FederationConfig,
    args: NewIdArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let actor = AuthenticatedActor::new(args.user)?;
    let draft = FederatedObject::Unknown {
        kind: "Read".into(),
        id: None,
    };
    let id = IdGenerator::new(config).new_id(Some(&actor), &draft)?;
    match format {
        OutputFormat::Json => print_json(&json!({ "id": id })),
        OutputFormat::Text => {
            println!("{}", id.as_str().yellow());
            Ok(())
        }
    }
}

fn cmd_config(config: &FederationConfig, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&serde_json::to_value(config)?),
        OutputFormat::Text => {
            println!("scheme = {}", config.scheme.bold());
            println!("domain = {}", config.domain.bold());
            println!("  Base: {}", config.base_url().cyan());
            Ok(())
        }
    }
}

/// Walk one read through the store the way a protocol engine would:
/// mint, create, append to the outbox, read back.
async fn cmd_demo(
    config: FederationConfig,
    args: DemoArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let identities = Arc::new(InMemoryIdentityStore::new());
    let profile = exlibris_federation::profile_iri(&config, &args.user)?;
    identities.insert(Actor::new(profile.clone(), args.user.as_str(), args.user.as_str())?)?;
    let store = FederationStore::new(config.clone(), Repositories::in_memory(identities));

    let actor = AuthenticatedActor::new(args.user.as_str())?;
    let draft = FederatedObject::Unknown {
        kind: "Read".into(),
        id: None,
    };
    let id = store.new_id(Some(&actor), &draft).await?;

    let mut book = Book::open_library(&args.work, args.title)?;
    if let Some(year) = args.year {
        book = book.published(year);
    }
    for name in args.author {
        book = book.by(Author::new(name));
    }
    let followers = ResourceRef::Followers {
        username: args.user.clone(),
    }
    .to_iri(&config)?;
    let activity = ReadActivity::new(id.clone(), profile.clone(), book, Utc::now())
        .addressed_to([followers, Iri::parse(PUBLIC_COLLECTION)?]);
    let read = FederatedObject::Read(Read::from_activity(&activity, profile, activity.to.clone()));

    store.lock(&id).await?;
    let created = store.create(&read).await;
    store.unlock(&id).await?;
    created?;

    let outbox = ResourceRef::OutboxPage {
        username: args.user.clone(),
    }
    .to_iri(&config)?;
    store.lock(&outbox).await?;
    let published = async {
        let mut page = store.get_outbox(&outbox).await?;
        page.ordered_items.insert(0, id.clone());
        store.set_outbox(&page).await?;
        store.get_outbox(&outbox).await
    }
    .await;
    store.unlock(&outbox).await?;
    let page = published?;

    let rendered = store.get(&id).await?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "object": rendered.to_document()?,
            "outbox": page,
        })),
        OutputFormat::Text => {
            println!("{} Read published", "✓".green().bold());
            println!("  Id: {}", id.as_str().yellow());
            println!("  Outbox: {} ({} item)", outbox, page.len());
            println!("{}", serde_json::to_string_pretty(&rendered.to_document()?)?);
            Ok(())
        }
    }
}

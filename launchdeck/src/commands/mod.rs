use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use launchdeck_core::config::CONFIG_FILENAME;
use launchdeck_core::{Category, FileRecord, Host, Launcher, RawItem};
use tracing::{error, info};

use crate::AppContext;
use crate::cli::{AddArgs, CategoryArgs, CategoryCommands, ConfigArgs, ConfigCommands, FileArgs, ListArgs, RenameFileArgs};

// --- Files ---

pub async fn handle_list(args: ListArgs, cx: &AppContext) -> Result<()> {
    let registry = &cx.registry;
    if args.all {
        for category in registry.categories() {
            print_category_header(category, category.id == registry.active());
            print_files(registry.files(&category.id));
        }
    } else if let Some(category) = registry.category(registry.active()) {
        print_category_header(category, true);
        print_files(registry.active_files());
    }
    Ok(())
}

pub async fn handle_add(args: AddArgs, cx: &mut AppContext) -> Result<()> {
    let items = args.paths.iter().map(|p| RawItem::from_path(path_arg(p))).collect();
    let report = cx.registry.ingest(items).await;
    println!("  Added {} file(s), skipped {} already present.", report.accepted, report.skipped);
    Ok(())
}

/// Feeds paths through the host's drag-drop event, the way a window drop arrives.
pub async fn handle_drop(args: AddArgs, cx: AppContext) -> Result<()> {
    let AppContext { host, registry, .. } = cx;
    let before = registry.active_files().len();

    let mut launcher = Launcher::new(registry);
    launcher.watch_drops();
    host.events().drop_paths(args.paths.iter().map(|p| path_arg(p)).collect());
    launcher.shutdown().await;

    let registry = launcher.registry().lock().await;
    let added = registry.active_files().len().saturating_sub(before);
    println!("  Dropped {} path(s), {} new file(s).", args.paths.len(), added);
    Ok(())
}

pub async fn handle_remove(args: FileArgs, cx: &mut AppContext) -> Result<()> {
    let removed = cx.registry.delete_file(&args.id).await?;
    println!("  Removed {}", removed.display_name);
    Ok(())
}

pub async fn handle_open(args: FileArgs, cx: &mut AppContext) -> Result<()> {
    let category = cx.registry.active().to_string();
    match cx.registry.open(&category, &args.id).await {
        Ok(count) => {
            info!("Opened {} ({} times so far)", args.id, count);
            Ok(())
        }
        Err(e) => {
            error!("Open failed: {}", e);
            Err(e.into())
        }
    }
}

pub async fn handle_reveal(args: FileArgs, cx: &AppContext) -> Result<()> {
    let category = cx.registry.active();
    cx.registry.reveal(category, &args.id).await?;
    Ok(())
}

pub async fn handle_rename(args: RenameFileArgs, cx: &mut AppContext) -> Result<()> {
    if args.name.trim().is_empty() {
        anyhow::bail!("Display name must not be empty");
    }
    let category = cx.registry.active().to_string();
    cx.registry.rename_file(&category, &args.id, &args.name).await?;
    println!("  Renamed to {}", args.name.trim());
    Ok(())
}

// --- Categories ---

pub async fn handle_category(args: CategoryArgs, cx: &mut AppContext) -> Result<()> {
    match args.command {
        CategoryCommands::List {} => {
            for category in cx.registry.categories() {
                let count = cx.registry.files(&category.id).len();
                println!("  {:3}  {:<24} {:>4} file(s)  {}", category.sort_order, category.name, count, style(&category.id).dim());
            }
        }
        CategoryCommands::Add { name } => match cx.registry.add_category(&name).await {
            Some(category) => println!("  Created {} ({})", category.name, category.id),
            None => anyhow::bail!("A category named '{}' already exists or the name is empty", name),
        },
        CategoryCommands::Rename { target, name } => {
            let id = resolve_category(cx, &target)?;
            if !cx.registry.rename_category(&id, &name).await? {
                anyhow::bail!("Cannot rename to '{}': the name is empty or taken", name);
            }
            println!("  Renamed to {}", name);
        }
        CategoryCommands::Delete { target, force } => {
            let id = resolve_category(cx, &target)?;
            let count = cx.registry.files(&id).len();
            if !force {
                let prompt = format!("Delete category '{}' and its {} file(s)?", target, count);
                if !confirm(prompt).await? {
                    println!("  Cancelled.");
                    return Ok(());
                }
            }
            if cx.registry.delete_category(&id).await? {
                println!("  Deleted {} with {} file(s)", target, count);
            } else {
                println!("  Kept {}: it is the only category.", target);
            }
        }
        CategoryCommands::Reorder { targets } => {
            let ids = targets
                .iter()
                .map(|t| resolve_category(cx, t))
                .collect::<Result<Vec<_>>>()?;
            cx.registry.reorder_categories(&ids).await;
        }
    }
    Ok(())
}

// --- Configuration ---

pub async fn handle_config(args: ConfigArgs, cx: &AppContext) -> Result<()> {
    match args.command {
        ConfigCommands::Show {} => {
            println!("{}", describe_config(cx));
        }
        ConfigCommands::Locate {} => {
            println!("  {}", cx.data_dir.join(CONFIG_FILENAME).display());
        }
        ConfigCommands::Init {} => {
            cx.config.save(&cx.data_dir).await?;
            println!("  Configuration written to {}", cx.data_dir.join(CONFIG_FILENAME).display());
        }
    }
    Ok(())
}

// --- Helpers ---

fn describe_config(cx: &AppContext) -> String {
    let config = &cx.config;
    format!(
        "backend:          {:?}\ndatabase_file:    {}\nstore_dir:        {}\ndefault_category: {}\ndata_dir:         {}",
        config.backend,
        config.database_file,
        config.store_dir,
        config.default_category,
        cx.data_dir.display()
    )
}

fn resolve_category(cx: &AppContext, target: &str) -> Result<String> {
    cx.registry
        .category(target)
        .map(|c| c.id.clone())
        .with_context(|| format!("No category with id or name '{}'", target))
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn print_category_header(category: &Category, active: bool) {
    let marker = if active { "*" } else { " " };
    println!("{} {}", marker, style(&category.name).bold());
}

fn print_files(files: &[FileRecord]) {
    if files.is_empty() {
        println!("    {}", style("(no files)").dim());
    }
    for file in files {
        println!(
            "    {} {:<32} {:>3}x  {}  {}",
            file.icon,
            file.display_name,
            file.open_count,
            style(&file.id).dim(),
            file.path
        );
    }
}

async fn confirm(prompt: String) -> Result<bool> {
    let answer = tokio::task::spawn_blocking(move || {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
    })
    .await
    .context("Blocking task failed (panic)")??;
    Ok(answer)
}

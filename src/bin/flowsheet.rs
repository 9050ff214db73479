//! Flowsheet CLI — manage the drawing store.
//!
//! Usage:
//!   flowsheet drawing <subcommand> [--db path]
//!   flowsheet links [--db path]

use clap::{Parser, Subcommand};
use flowsheet::{AssetStore, DrawingMeta, OpenStore, SqliteStore};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "flowsheet",
    version,
    about = "P&ID topology engine with graph persistence"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage drawings
    Drawing {
        #[command(subcommand)]
        action: DrawingAction,
        /// Path to SQLite database file
        #[arg(long, global = true)]
        db: Option<PathBuf>,
    },
    /// List cross-page connector links
    Links {
        /// Path to SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum DrawingAction {
    /// Create a new drawing
    Create {
        /// Name for the new drawing
        name: String,
    },
    /// Delete a drawing by name
    Delete {
        /// Name of the drawing to delete
        name: String,
    },
    /// List all drawings
    List,
    /// Rename a drawing
    Rename {
        /// Current drawing name
        old: String,
        /// New drawing name
        new: String,
    },
    /// Show a drawing's content summary
    Show {
        /// Name of the drawing
        name: String,
    },
}

/// Get the default database path (~/.local/share/flowsheet/flowsheet.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let app_dir = data_dir.join("flowsheet");
    std::fs::create_dir_all(&app_dir).ok();
    app_dir.join("flowsheet.db")
}

fn open_store(db: Option<PathBuf>) -> Result<SqliteStore, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))
}

/// Find a drawing by name
fn find_drawing_by_name(store: &SqliteStore, name: &str) -> Result<Option<DrawingMeta>, String> {
    let drawings = store.list_drawings().map_err(|e| e.to_string())?;
    Ok(drawings.into_iter().find(|d| d.name == name))
}

fn cmd_drawing_create(store: &SqliteStore, name: &str) -> i32 {
    match find_drawing_by_name(store, name) {
        Ok(Some(_)) => {
            eprintln!("Error: drawing '{}' already exists", name);
            return 1;
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    }
    match store.create_drawing(name) {
        Ok(meta) => {
            println!("Created drawing '{}' ({})", name, meta.id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_drawing_delete(store: &SqliteStore, name: &str) -> i32 {
    let meta = match find_drawing_by_name(store, name) {
        Ok(Some(meta)) => meta,
        Ok(None) => {
            eprintln!("Error: drawing '{}' not found", name);
            return 1;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match store.delete_drawing(&meta.id) {
        Ok(true) => {
            println!("Deleted drawing '{}'", name);
            0
        }
        Ok(false) => {
            eprintln!("Error: drawing '{}' not found", name);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_drawing_list(store: &SqliteStore) -> i32 {
    let drawings = match store.list_drawings() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if drawings.is_empty() {
        println!("No drawings.");
        return 0;
    }
    println!("{:<36}  {:<24}  {:<20}", "ID", "NAME", "UPDATED");
    println!("{}", "-".repeat(84));
    for d in drawings {
        println!(
            "{:<36}  {:<24}  {:<20}",
            d.id,
            d.name,
            d.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    0
}

fn cmd_drawing_rename(store: &SqliteStore, old: &str, new: &str) -> i32 {
    let meta = match find_drawing_by_name(store, old) {
        Ok(Some(meta)) => meta,
        Ok(None) => {
            eprintln!("Error: drawing '{}' not found", old);
            return 1;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match store.rename_drawing(&meta.id, new) {
        Ok(()) => {
            println!("Renamed drawing '{}' to '{}'", old, new);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_drawing_show(store: &SqliteStore, name: &str) -> i32 {
    let meta = match find_drawing_by_name(store, name) {
        Ok(Some(meta)) => meta,
        Ok(None) => {
            eprintln!("Error: drawing '{}' not found", name);
            return 1;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match store.load_drawing(&meta.id) {
        Ok(diagram) => {
            let pipes = diagram.edges().filter(|e| e.kind.is_pipe()).count();
            let signals = diagram.edges().filter(|e| e.kind.is_signal()).count();
            println!("Drawing '{}' ({})", meta.name, meta.id);
            println!("  assets:  {}", diagram.node_count());
            println!("  pipes:   {}", pipes);
            println!("  signals: {}", signals);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_links(store: &SqliteStore) -> i32 {
    let links = match store.list_links() {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if links.is_empty() {
        println!("No cross-page links.");
        return 0;
    }
    println!("{:<36}  {:<36}  {:<16}", "ASSET A", "ASSET B", "TAG");
    println!("{}", "-".repeat(92));
    for l in links {
        println!("{:<36}  {:<36}  {:<16}", l.a, l.b, l.tag);
    }
    0
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Drawing { action, db } => {
            let store = match open_store(db) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            let code = match action {
                DrawingAction::Create { name } => cmd_drawing_create(&store, &name),
                DrawingAction::Delete { name } => cmd_drawing_delete(&store, &name),
                DrawingAction::List => cmd_drawing_list(&store),
                DrawingAction::Rename { old, new } => cmd_drawing_rename(&store, &old, &new),
                DrawingAction::Show { name } => cmd_drawing_show(&store, &name),
            };
            std::process::exit(code);
        }
        Commands::Links { db } => {
            let store = match open_store(db) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            std::process::exit(cmd_links(&store));
        }
    }
}

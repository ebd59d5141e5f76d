//! infragraph CLI: edit infrastructure graph documents and the saved-graph library.
//!
//! Usage:
//!   infragraph <command> <file.json> [args]
//!   infragraph graphs <subcommand> [--db path]

use clap::{Parser, Subcommand};
use infragraph::{
    apply_order, can_place, Direction, DropTarget, GraphDocument, GraphId, GraphLibrary,
    GraphUpdate, InfraStore, Node, NodeId, NodeUpdate, OpenStore, Position, PropertyValue,
    ResourceType, SavedGraph, SqliteStore, TraverseQuery,
};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "infragraph",
    version,
    about = "Infrastructure graph editor and validator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty graph document
    New {
        file: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Add a resource node
    Add {
        file: PathBuf,
        /// Resource type (e.g. aws_subnet or subnet)
        resource_type: ResourceType,
        /// Containing node id ("root" for none)
        #[arg(long)]
        parent: Option<String>,
        /// Display name
        #[arg(long)]
        name: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        x: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        y: Option<f64>,
        /// Skip the placement check
        #[arg(long)]
        force: bool,
    },
    /// Change a node's name, parameters or position
    Set {
        file: PathBuf,
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// Parameter as key=value (value parsed as JSON when possible)
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
        /// Parameter key to remove
        #[arg(long = "unset", value_name = "KEY")]
        unset: Vec<String>,
        #[arg(long, allow_negative_numbers = true)]
        x: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        y: Option<f64>,
    },
    /// Add a dependency: SOURCE depends on TARGET
    Connect {
        file: PathBuf,
        source: String,
        target: String,
    },
    /// Remove a dependency by edge id
    Disconnect { file: PathBuf, edge: String },
    /// Move a node to a new container and/or position
    Move {
        file: PathBuf,
        id: String,
        /// New container id ("root" for none); keeps the current one if omitted
        #[arg(long)]
        parent: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        x: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        y: Option<f64>,
    },
    /// Delete a node, its descendants and their dependencies
    Delete { file: PathBuf, id: String },
    /// Copy a node next to the original
    Duplicate { file: PathBuf, id: String },
    /// List where a resource type may be placed
    Targets {
        file: PathBuf,
        resource_type: ResourceType,
    },
    /// Find nodes by id, type or name
    Search { file: PathBuf, query: String },
    /// Print the containment tree and dependencies
    Show {
        file: PathBuf,
        /// Print the raw document instead
        #[arg(long)]
        json: bool,
    },
    /// Walk dependencies from a node
    Deps {
        file: PathBuf,
        id: String,
        #[arg(long, default_value_t = 1)]
        depth: usize,
        /// outgoing, incoming or both
        #[arg(long, default_value = "outgoing")]
        direction: Direction,
    },
    /// Print an apply order with dependencies first
    Order { file: PathBuf },
    /// Check a document against every structural invariant
    Validate { file: PathBuf },
    /// Manage saved graphs
    Graphs {
        #[command(subcommand)]
        action: GraphsAction,
        /// Path to SQLite database file
        #[arg(long, global = true)]
        db: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum GraphsAction {
    /// Save a document under a name (replaces a graph with the same name)
    Save {
        name: String,
        file: PathBuf,
        #[arg(long)]
        description: Option<String>,
    },
    /// List saved graphs
    List,
    /// Write a saved graph to a document file
    Export { graph: String, file: PathBuf },
    /// Delete a saved graph by name or id
    Delete { graph: String },
}

/// Install the tracing subscriber; logs go to stderr
fn init_tracing() {
    let filter = EnvFilter::try_from_env("INFRAGRAPH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "infragraph=debug,info"
        } else {
            "infragraph=info,warn"
        })
    });

    let format = env::var("INFRAGRAPH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Get the default database path (~/.local/share/infragraph/infragraph.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("infragraph").join("infragraph.db")
}

fn open_library(db: Option<PathBuf>) -> Result<GraphLibrary, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    let store =
        SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))?;
    let library = GraphLibrary::with_store(Arc::new(store));
    library
        .load_all()
        .map_err(|e| format!("Failed to load graphs: {}", e))?;
    Ok(library)
}

fn load_store(file: &Path) -> Result<InfraStore, String> {
    GraphDocument::read_from(file)
        .map(InfraStore::from_document)
        .map_err(|e| format!("cannot read '{}': {}", file.display(), e))
}

fn save_store(store: &InfraStore, file: &Path) -> Result<(), String> {
    store
        .export_graph()
        .write_to(file)
        .map_err(|e| format!("cannot write '{}': {}", file.display(), e))
}

/// `"root"` means no container
fn parse_parent(parent: &str) -> Option<NodeId> {
    (parent != DropTarget::ROOT_MARKER).then(|| NodeId::from_string(parent))
}

fn parse_param(raw: &str) -> Result<(String, PropertyValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter key in '{}'", raw));
    }
    let value = serde_json::from_str::<PropertyValue>(value)
        .unwrap_or_else(|_| PropertyValue::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn label(node: &Node) -> String {
    format!("{} [{}] {}", node.data.name, node.resource_type, node.id)
}

/// Run a file-backed edit: load, apply, write back on success
fn edit(file: &Path, apply: impl FnOnce(&mut InfraStore) -> Result<String, String>) -> i32 {
    let mut store = match load_store(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let message = match apply(&mut store) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Err(e) = save_store(&store, file) {
        eprintln!("Error: {}", e);
        return 1;
    }
    println!("{}", message);
    0
}

fn cmd_new(file: &Path, force: bool) -> i32 {
    if file.exists() && !force {
        eprintln!("Error: '{}' already exists (use --force to overwrite)", file.display());
        return 1;
    }
    if let Err(e) = save_store(&InfraStore::new(), file) {
        eprintln!("Error: {}", e);
        return 1;
    }
    println!("Created empty graph '{}'", file.display());
    0
}

#[allow(clippy::too_many_arguments)]
fn cmd_add(
    file: &Path,
    resource_type: ResourceType,
    parent: Option<&str>,
    name: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
    force: bool,
) -> i32 {
    edit(file, |store| {
        let parent = parent.and_then(parse_parent);
        if !force && !can_place(resource_type, parent.as_ref(), store.nodes()) {
            let place = parent
                .as_ref()
                .map_or(DropTarget::ROOT_MARKER, NodeId::as_str)
                .to_string();
            return Err(format!("{} cannot be placed in {}", resource_type, place));
        }
        let position = Position::new(x.unwrap_or(0.0), y.unwrap_or(0.0));
        let id = store.add_node(resource_type, Some(position), parent.as_ref());
        if let Some(name) = name {
            store.update_node(&id, NodeUpdate::new().name(name));
        }
        Ok(id.to_string())
    })
}

fn cmd_set(
    file: &Path,
    id: &str,
    name: Option<String>,
    params: &[String],
    unset: &[String],
    x: Option<f64>,
    y: Option<f64>,
) -> i32 {
    edit(file, |store| {
        let id = NodeId::from_string(id);
        let node = store
            .node(&id)
            .ok_or_else(|| format!("node '{}' not found", id))?;

        let mut update = NodeUpdate::new();
        update.name = name;
        if !params.is_empty() || !unset.is_empty() {
            let mut merged = node.data.params.clone();
            for raw in params {
                let (key, value) = parse_param(raw)?;
                merged.insert(key, value);
            }
            for key in unset {
                merged.remove(key);
            }
            update.params = Some(merged);
        }
        if x.is_some() || y.is_some() {
            let current = node.position.unwrap_or_default();
            update.position = Some(Position::new(x.unwrap_or(current.x), y.unwrap_or(current.y)));
        }
        if update.is_empty() {
            return Err("nothing to change".into());
        }

        store.update_node(&id, update);
        Ok(format!("Updated {}", id))
    })
}

fn cmd_connect(file: &Path, source: &str, target: &str) -> i32 {
    edit(file, |store| {
        let source = NodeId::from_string(source);
        let target = NodeId::from_string(target);
        store
            .try_add_edge(&source, &target)
            .map(|edge| edge.to_string())
            .map_err(|rejection| format!("cannot connect {} -> {}: {}", source, target, rejection))
    })
}

fn cmd_disconnect(file: &Path, edge: &str) -> i32 {
    edit(file, |store| {
        let edge = infragraph::EdgeId::from_string(edge);
        if store.delete_edge(&edge) {
            Ok(format!("Removed dependency {}", edge))
        } else {
            Err(format!("edge '{}' not found", edge))
        }
    })
}

fn cmd_move(file: &Path, id: &str, parent: Option<&str>, x: Option<f64>, y: Option<f64>) -> i32 {
    edit(file, |store| {
        let id = NodeId::from_string(id);
        let node = store
            .node(&id)
            .ok_or_else(|| format!("node '{}' not found", id))?;
        let new_parent = match parent {
            Some(p) => parse_parent(p),
            None => node.parent.clone(),
        };
        let current = node.position.unwrap_or_default();
        let position = Position::new(x.unwrap_or(current.x), y.unwrap_or(current.y));

        if store.move_node(&id, position, new_parent.as_ref()) {
            Ok(format!("Moved {}", id))
        } else {
            Err(format!("{} cannot be moved there", id))
        }
    })
}

fn cmd_delete(file: &Path, id: &str) -> i32 {
    edit(file, |store| {
        let removed = store.delete_node(&NodeId::from_string(id));
        if removed.is_empty() {
            Err(format!("node '{}' not found", id))
        } else {
            Ok(format!("Deleted {} node(s)", removed.len()))
        }
    })
}

fn cmd_duplicate(file: &Path, id: &str) -> i32 {
    edit(file, |store| {
        store
            .duplicate_node(&NodeId::from_string(id))
            .map(|copy| copy.to_string())
            .ok_or_else(|| format!("node '{}' not found", id))
    })
}

fn cmd_targets(file: &Path, resource_type: ResourceType) -> i32 {
    let store = match load_store(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let targets = store.valid_drop_targets(resource_type);
    if targets.is_empty() {
        println!("No valid targets for {}.", resource_type);
        return 0;
    }
    for target in targets {
        match target.parent().and_then(|id| store.node(id)) {
            Some(node) => println!("{}", label(node)),
            None => println!("{}", target),
        }
    }
    0
}

fn cmd_search(file: &Path, query: &str) -> i32 {
    let mut store = match load_store(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let hits = store.search(query);
    if hits.is_empty() {
        println!("No matches.");
        return 0;
    }
    for id in hits {
        if let Some(node) = store.node(&id) {
            println!("{}", label(node));
        }
    }
    0
}

/// Indented containment outline, each node at most once
///
/// Also returns how many nodes were not reached from a root, which only
/// happens for documents with broken containment.
fn tree_lines(store: &InfraStore) -> (Vec<String>, usize) {
    let mut lines = Vec::with_capacity(store.node_count());
    let mut seen: HashSet<&NodeId> = HashSet::with_capacity(store.node_count());
    let mut stack: Vec<(&Node, usize)> = store
        .nodes()
        .iter()
        .filter(|n| n.is_root())
        .rev()
        .map(|n| (n, 0))
        .collect();

    while let Some((node, depth)) = stack.pop() {
        if !seen.insert(&node.id) {
            continue;
        }
        lines.push(format!("{}{}", "  ".repeat(depth), label(node)));
        for child in store.children_of(&node.id).into_iter().rev() {
            if !seen.contains(&child.id) {
                stack.push((child, depth + 1));
            }
        }
    }

    let unreached = store
        .nodes()
        .iter()
        .filter(|n| !seen.contains(&n.id))
        .count();
    (lines, unreached)
}

fn cmd_show(file: &Path, json: bool) -> i32 {
    let store = match load_store(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if json {
        return match store.export_graph().to_json_pretty() {
            Ok(text) => {
                println!("{}", text);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        };
    }

    if store.node_count() == 0 {
        println!("Empty graph.");
        return 0;
    }
    let (lines, unreached) = tree_lines(&store);
    for line in lines {
        println!("{}", line);
    }
    if unreached > 0 {
        eprintln!(
            "Warning: {} node(s) not reachable from a root; run `validate` for details",
            unreached
        );
    }
    if store.edge_count() > 0 {
        println!();
        println!("Dependencies:");
        for edge in store.edges() {
            println!("  {} -> {}  ({})", edge.source, edge.target, edge.id);
        }
    }
    0
}

fn cmd_deps(file: &Path, id: &str, depth: usize, direction: Direction) -> i32 {
    let store = match load_store(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let result = TraverseQuery::from(NodeId::from_string(id))
        .depth(depth)
        .direction(direction)
        .execute(&store);
    if result.levels.is_empty() {
        eprintln!("Error: node '{}' not found", id);
        return 1;
    }
    for (level, nodes) in result.levels.iter().enumerate() {
        for node in nodes {
            println!("{}{}", "  ".repeat(level), label(node));
        }
    }
    0
}

fn cmd_order(file: &Path) -> i32 {
    let store = match load_store(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let Some(order) = apply_order(store.nodes(), store.edges()) else {
        eprintln!("Error: dependencies contain a cycle");
        return 1;
    };
    for (step, id) in order.iter().enumerate() {
        if let Some(node) = store.node(id) {
            println!("{:>3}. {}", step + 1, label(node));
        }
    }
    0
}

fn cmd_validate(file: &Path) -> i32 {
    let document = match GraphDocument::read_from(file) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", file.display(), e);
            return 1;
        }
    };
    let violations = document.violations();
    if violations.is_empty() {
        println!(
            "OK: {} node(s), {} dependenc(ies)",
            document.nodes.len(),
            document.edges.len()
        );
        return 0;
    }
    for violation in &violations {
        println!("{:<32}  {}", violation.code(), violation);
    }
    eprintln!("{} violation(s)", violations.len());
    1
}

/// Find a saved graph by exact id, then by name
fn find_graph(library: &GraphLibrary, key: &str) -> Option<SavedGraph> {
    library
        .get_graph(&GraphId::from_string(key))
        .or_else(|| library.find_by_name(key))
}

fn cmd_graphs_save(
    library: &GraphLibrary,
    name: &str,
    file: &Path,
    description: Option<String>,
) -> i32 {
    let document = match GraphDocument::read_from(file) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", file.display(), e);
            return 1;
        }
    };
    let result = match library.find_by_name(name) {
        Some(existing) => {
            let mut update = GraphUpdate::new().data(document);
            if description.is_some() {
                update = update.description(description);
            }
            library.update_graph(&existing.id, update)
        }
        None => library.create_graph(name, description, document),
    };
    match result {
        Ok(graph) => {
            println!("Saved graph '{}' ({})", graph.name, graph.id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_graphs_list(library: &GraphLibrary) -> i32 {
    let graphs = library.list_graphs();
    if graphs.is_empty() {
        println!("No saved graphs.");
        return 0;
    }
    println!(
        "{:<36}  {:<24}  {:>5}  {:>5}  {:<20}",
        "ID", "NAME", "NODES", "EDGES", "UPDATED"
    );
    println!("{}", "-".repeat(98));
    for graph in graphs {
        println!(
            "{:<36}  {:<24}  {:>5}  {:>5}  {:<20}",
            graph.id,
            graph.name,
            graph.node_count,
            graph.edge_count,
            graph.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    0
}

fn cmd_graphs_export(library: &GraphLibrary, key: &str, file: &Path) -> i32 {
    let Some(graph) = find_graph(library, key) else {
        eprintln!("Error: graph '{}' not found", key);
        return 1;
    };
    match graph.data.write_to(file) {
        Ok(()) => {
            println!("Exported '{}' to '{}'", graph.name, file.display());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_graphs_delete(library: &GraphLibrary, key: &str) -> i32 {
    let Some(graph) = find_graph(library, key) else {
        eprintln!("Error: graph '{}' not found", key);
        return 1;
    };
    match library.delete_graph(&graph.id) {
        Ok(true) => {
            println!("Deleted graph '{}'", graph.name);
            0
        }
        Ok(false) => {
            eprintln!("Error: graph '{}' not found", key);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::New { file, force } => cmd_new(&file, force),
        Commands::Add {
            file,
            resource_type,
            parent,
            name,
            x,
            y,
            force,
        } => cmd_add(&file, resource_type, parent.as_deref(), name, x, y, force),
        Commands::Set {
            file,
            id,
            name,
            params,
            unset,
            x,
            y,
        } => cmd_set(&file, &id, name, &params, &unset, x, y),
        Commands::Connect {
            file,
            source,
            target,
        } => cmd_connect(&file, &source, &target),
        Commands::Disconnect { file, edge } => cmd_disconnect(&file, &edge),
        Commands::Move {
            file,
            id,
            parent,
            x,
            y,
        } => cmd_move(&file, &id, parent.as_deref(), x, y),
        Commands::Delete { file, id } => cmd_delete(&file, &id),
        Commands::Duplicate { file, id } => cmd_duplicate(&file, &id),
        Commands::Targets {
            file,
            resource_type,
        } => cmd_targets(&file, resource_type),
        Commands::Search { file, query } => cmd_search(&file, &query),
        Commands::Show { file, json } => cmd_show(&file, json),
        Commands::Deps {
            file,
            id,
            depth,
            direction,
        } => cmd_deps(&file, &id, depth, direction),
        Commands::Order { file } => cmd_order(&file),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Graphs { action, db } => {
            let library = match open_library(db) {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            match action {
                GraphsAction::Save {
                    name,
                    file,
                    description,
                } => cmd_graphs_save(&library, &name, &file, description),
                GraphsAction::List => cmd_graphs_list(&library),
                GraphsAction::Export { graph, file } => cmd_graphs_export(&library, &graph, &file),
                GraphsAction::Delete { graph } => cmd_graphs_delete(&library, &graph),
            }
        }
    };
    std::process::exit(code);
}

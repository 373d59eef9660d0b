use clap::{Args, ValueEnum};
use comfy_table::{ContentArrangement, Table, presets};
use serde::Serialize;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Box whose snapshots to list; omit to list the boxes themselves
    pub box_name: Option<String>,

    /// Print names/ids only, one per line
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Serialize)]
struct BoxRow {
    name: String,
    snapshots: usize,
    current: Option<String>,
    protected: bool,
    processes: u32,
}

pub async fn execute(args: ListArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let runtime = global.create_runtime()?;
    match &args.box_name {
        Some(name) => list_snapshots(&runtime, name, &args),
        None => list_boxes(&runtime, &args),
    }
}

fn list_snapshots(
    runtime: &boxhive::BoxhiveRuntime,
    name: &str,
    args: &ListArgs,
) -> anyhow::Result<()> {
    let hive_box = runtime.open_box(name)?;
    let list = hive_box.snapshots()?;

    if args.quiet {
        for snap in list.iter() {
            println!("{}", snap.id);
        }
        return Ok(());
    }
    if matches!(args.format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    let mut table = new_table(vec!["ID", "NAME", "TAKEN", "PARENT", "CURRENT"]);
    for snap in list.iter() {
        let taken = snap
            .taken_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let parent = snap
            .parent
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        let marker = if list.is_current(&snap.id) { "*" } else { "" };
        table.add_row(vec![
            snap.id.to_string(),
            snap.name.clone(),
            taken,
            parent,
            marker.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn list_boxes(runtime: &boxhive::BoxhiveRuntime, args: &ListArgs) -> anyhow::Result<()> {
    let names = runtime.list_box_names()?;

    if args.quiet {
        for name in &names {
            println!("{name}");
        }
        return Ok(());
    }

    let mut rows = Vec::new();
    for name in names {
        // Folders with names the runtime refuses (hand-made, foreign) are
        // reported but cannot be opened.
        let hive_box = match runtime.open_box(&name) {
            Ok(hive_box) => hive_box,
            Err(e) => {
                eprintln!("Warning: skipping box '{name}': {e}");
                continue;
            }
        };
        let snapshots = hive_box.snapshots()?;
        rows.push(BoxRow {
            name,
            snapshots: snapshots.len(),
            current: snapshots.current().map(ToString::to_string),
            protected: hive_box.is_delete_protected(),
            processes: hive_box.process_count(),
        });
    }

    if matches!(args.format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let mut table = new_table(vec!["NAME", "SNAPSHOTS", "CURRENT", "PROTECTED", "PROCESSES"]);
    for row in rows {
        table.add_row(vec![
            row.name,
            row.snapshots.to_string(),
            row.current.unwrap_or_default(),
            if row.protected { "yes" } else { "no" }.to_string(),
            row.processes.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

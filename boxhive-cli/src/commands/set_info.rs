use boxhive::SnapshotId;
use clap::Args;

#[derive(Args, Debug)]
pub struct SetInfoArgs {
    /// Box holding the snapshot
    pub box_name: String,

    /// Id of the snapshot to update
    pub snapshot: String,

    /// New display name
    #[arg(long)]
    pub name: Option<String>,

    /// New description
    #[arg(long)]
    pub description: Option<String>,
}

pub async fn execute(args: SetInfoArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    if args.name.is_none() && args.description.is_none() {
        anyhow::bail!("nothing to update: pass --name and/or --description");
    }

    let runtime = global.create_runtime()?;
    let hive_box = runtime.open_box(&args.box_name)?;
    let id: SnapshotId = args.snapshot.parse()?;

    hive_box.set_snapshot_info(&id, args.name.as_deref(), args.description.as_deref())?;
    Ok(())
}

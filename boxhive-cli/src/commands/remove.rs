use boxhive::SnapshotId;
use clap::Args;

use crate::commands::{confirm_flag, run_op};

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Box holding the snapshot
    pub box_name: String,

    /// Id of the snapshot to remove
    pub snapshot: String,

    /// Proceed even when processes are running in the box
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,
}

pub async fn execute(args: RemoveArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let runtime = global.create_runtime()?;
    let hive_box = runtime.open_box(&args.box_name)?;
    let id: SnapshotId = args.snapshot.parse()?;

    let handle = hive_box.remove_snapshot(&id, confirm_flag(args.yes))?;
    run_op(handle).await?;
    println!("{id}");
    Ok(())
}

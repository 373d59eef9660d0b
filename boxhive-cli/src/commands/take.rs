use clap::Args;

use crate::commands::confirm_flag;

#[derive(Args, Debug)]
pub struct TakeArgs {
    /// Box to snapshot
    pub box_name: String,

    /// Display name for the new snapshot
    pub name: String,

    /// Proceed even when processes are running in the box
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,
}

pub async fn execute(args: TakeArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let runtime = global.create_runtime()?;
    let hive_box = runtime.open_box(&args.box_name)?;

    let id = hive_box.take_snapshot(&args.name, confirm_flag(args.yes))?;
    println!("{id}");
    Ok(())
}

use clap::Args;

use crate::commands::{confirm_flag, run_op};

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Box whose content to delete
    pub box_name: String,

    /// Terminate running processes instead of failing
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,
}

pub async fn execute(args: CleanArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let runtime = global.create_runtime()?;
    let hive_box = runtime.open_box(&args.box_name)?;

    let handle = hive_box.clean(confirm_flag(args.yes))?;
    run_op(handle).await?;
    println!("{}", args.box_name);
    Ok(())
}

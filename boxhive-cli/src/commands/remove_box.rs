use clap::Args;

#[derive(Args, Debug)]
pub struct RemoveBoxArgs {
    /// Box whose configuration to drop
    pub box_name: String,
}

pub async fn execute(args: RemoveBoxArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let runtime = global.create_runtime()?;
    runtime.remove_box(&args.box_name)?;
    println!("{}", args.box_name);
    Ok(())
}

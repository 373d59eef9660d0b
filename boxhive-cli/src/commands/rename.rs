use clap::Args;

#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Current name of the box
    pub box_name: String,

    /// New name (spaces become underscores)
    pub new_name: String,
}

pub async fn execute(args: RenameArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let runtime = global.create_runtime()?;
    let final_name = runtime.rename_box(&args.box_name, &args.new_name)?;
    println!("{final_name}");
    Ok(())
}

use crate::TargetArgs;

pub async fn handle(target: &TargetArgs) -> anyhow::Result<()> {
    let pipeline = super::build_pipeline(target)?;
    let outputs = pipeline.outputs().await?;

    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(())
}

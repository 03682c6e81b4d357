use crate::TargetArgs;
use colored::Colorize;

pub async fn deploy(target: &TargetArgs) -> anyhow::Result<()> {
    let pipeline = super::build_pipeline(target)?;
    println!(
        "{} {}",
        "スタック出力を処理中:".blue(),
        pipeline.identity().stack_name().cyan()
    );

    // 失敗はログに出力済み。デプロイ自体は止めない
    pipeline.after_deploy().await;
    Ok(())
}

pub async fn remove(target: &TargetArgs) -> anyhow::Result<()> {
    let pipeline = super::build_pipeline(target)?;
    println!(
        "{} {}",
        "削除前の処理を実行中:".blue(),
        pipeline.identity().stack_name().cyan()
    );

    pipeline.before_remove().await;
    Ok(())
}

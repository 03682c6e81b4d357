pub mod run;
pub mod show;

use crate::TargetArgs;
use crate::fetch::{AwsCliFetcher, FileFetcher};
use anyhow::Context;
use stackport_core::ProjectConfig;
use stackport_pipeline::{Pipeline, StackFetcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 設定ファイルを読み込み、パイプラインを組み立てる
pub fn build_pipeline(target: &TargetArgs) -> anyhow::Result<Pipeline> {
    let config_path = match &target.config {
        Some(path) => path.clone(),
        None => stackport_core::find_config_file()?,
    };
    let config = ProjectConfig::load(&config_path)
        .with_context(|| format!("設定ファイルを読み込めません: {}", config_path.display()))?;

    let identity = config.identity(
        target.stage.as_deref(),
        target.region.as_deref(),
        service_path(&config_path)?,
    );
    tracing::debug!(
        service = %identity.service,
        stage = %identity.stage,
        region = %identity.region,
        "Resolved deployment"
    );

    let fetcher: Arc<dyn StackFetcher> = match &target.stack_file {
        Some(path) => Arc::new(FileFetcher::new(path)),
        None => Arc::new(AwsCliFetcher),
    };

    Ok(Pipeline::new(identity, config.discovery(), fetcher)
        .with_options(target.options.iter().cloned().collect())
        .with_no_deploy(target.no_deploy))
}

/// 設定ファイルのあるディレクトリ（絶対パス）をサービスディレクトリとする
fn service_path(config_path: &Path) -> std::io::Result<PathBuf> {
    let dir = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return std::env::current_dir(),
    };
    std::path::absolute(dir)
}

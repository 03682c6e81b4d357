mod commands;
mod fetch;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stackport")]
#[command(about = "デプロイ後のスタック出力を、必要な場所へ届ける。", long_about = None, version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// デバッグログを出力する
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// デプロイ後の処理を実行（登録・ハンドラー・ファイル出力）
    Deploy(TargetArgs),
    /// 削除前の処理を実行（登録解除・ハンドラー）
    Remove(TargetArgs),
    /// 正規化したスタック出力をJSONで表示
    Show(TargetArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// 設定ファイルのパス（未指定時は STACKPORT_CONFIG またはカレントディレクトリから検索）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// ステージ名 (dev, stg, prod)
    #[arg(short, long, env = "STACKPORT_STAGE")]
    pub stage: Option<String>,

    /// AWSリージョン
    #[arg(short, long)]
    pub region: Option<String>,

    /// describe-stacks のJSONを読み込む（aws CLI を呼ばない）
    #[arg(long)]
    pub stack_file: Option<PathBuf>,

    /// ハンドラーに渡すオプション (key=value)
    #[arg(short = 'o', long = "option", value_parser = parse_option)]
    pub options: Vec<(String, String)>,

    /// 何もせずにスキップする
    #[arg(long)]
    pub no_deploy: bool,
}

fn parse_option(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("'{}' は key=value 形式ではありません", s)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログはstderrへ。showのJSONはstdoutに出す
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Deploy(target) => commands::run::deploy(&target).await,
        Commands::Remove(target) => commands::run::remove(&target).await,
        Commands::Show(target) => commands::show::handle(&target).await,
    }
}

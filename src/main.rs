use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use anyhow::Result;

use heap_filler_check::cli::{self, Command};

/// Heap Filler Check
///
/// 检查 HPROF heap dump 中是否残留 G1 filler 数组
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// tracing filter directive, e.g. "info" or "heap_filler_check=debug"
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 输出 JSON 格式 (默认输出人类可读文本)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志 (stderr，stdout 留给结果)
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    cli::handle_command(args.command, args.json)
}

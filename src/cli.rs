//! CLI 模式处理器
//!
//! 默认输出人类可读格式，使用 --json 参数输出 JSON 格式。
//! 检查失败 (filler 超出容忍度) 或出错时进程以 1 退出。

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use serde_json::{json, Value};

use crate::analysis::{analyze_artifact, AnalysisReport, DumpArtifact};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::snapshot::{read_snapshot, HeapSnapshot};

/// CLI Commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// 🔬 检查 heap dump 中的 filler 数组
    Analyze {
        /// heap dump 路径 (.hprof)
        #[arg(short, long)]
        dump: PathBuf,

        /// YAML 配置文件，命令行参数优先
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// G1 region 大小 (字节)
        #[arg(long)]
        region_size: Option<u64>,

        /// 每个 humongous 分配的大小 (字节)
        #[arg(long)]
        alloc_size: Option<u64>,

        /// 允许的同尺寸 int[] 数量
        #[arg(long)]
        tolerance: Option<u64>,

        /// filler 的 JVM 类名 (默认 "[I")
        #[arg(long)]
        filler_type: Option<String>,

        /// 生成 dump 的进程退出码，非 0 时不做分析
        #[arg(long)]
        producer_exit_code: Option<i32>,
    },

    /// 📊 按类统计对象数与字节数
    Histogram {
        /// heap dump 路径 (.hprof)
        #[arg(short, long)]
        dump: PathBuf,

        /// 只显示前 N 个类
        #[arg(long, default_value = "20")]
        top: usize,
    },
}

/// What a command produced, before it is turned into output
enum Payload {
    /// 检查报告，JSON 模式下序列化
    Report(AnalysisReport),
    Value(Value),
}

impl Payload {
    fn into_value(self) -> Result<Value> {
        match self {
            Payload::Report(report) => Ok(serde_json::to_value(&report)?),
            Payload::Value(value) => Ok(value),
        }
    }
}

/// Result of one command: payload plus whether the process should succeed
struct Outcome {
    payload: Payload,
    passed: bool,
}

type CommandResult = std::result::Result<Outcome, AnalysisError>;

/// 处理 CLI 命令
pub fn handle_command(cmd: Command, json_output: bool) -> Result<()> {
    let result = match cmd {
        Command::Analyze {
            dump,
            config,
            region_size,
            alloc_size,
            tolerance,
            filler_type,
            producer_exit_code,
        } => {
            let overrides = Overrides {
                region_size,
                alloc_size,
                tolerance,
                filler_type,
            };
            run_analyze(dump, config, overrides, producer_exit_code, json_output)
        }

        Command::Histogram { dump, top } => run_histogram(dump, top, json_output),
    };

    let succeeded = is_success(&result);

    // 输出结果
    if json_output {
        let output = json_envelope(result)?;
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        match result {
            Ok(outcome) => print_value(&outcome.payload.into_value()?),
            Err(e) => eprintln!("❌ {}: {e}", e.kind()),
        }
    }

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

/// 进程是否以 0 退出：命令成功且检查通过
fn is_success(result: &CommandResult) -> bool {
    matches!(result, Ok(outcome) if outcome.passed)
}

/// JSON 模式的输出包装
///
/// 成功: `{"success": passed, "data": ...}`
/// 出错: `{"success": false, "error": message, "kind": category}`
fn json_envelope(result: CommandResult) -> Result<Value> {
    Ok(match result {
        Ok(outcome) => json!({
            "success": outcome.passed,
            "data": outcome.payload.into_value()?
        }),
        Err(e) => json!({
            "success": false,
            "error": e.to_string(),
            "kind": e.kind()
        }),
    })
}

/// 打印 Value，智能处理字符串和其他类型
fn print_value(value: &Value) {
    match value {
        Value::String(s) => println!("{s}"),
        _ => println!("{}", serde_json::to_string_pretty(value).unwrap_or_default()),
    }
}

/// Command-line values that replace config file fields
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub region_size: Option<u64>,
    pub alloc_size: Option<u64>,
    pub tolerance: Option<u64>,
    pub filler_type: Option<String>,
}

impl Overrides {
    pub fn apply(self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(v) = self.region_size {
            config.region_size = v;
        }
        if let Some(v) = self.alloc_size {
            config.alloc_size = v;
        }
        if let Some(v) = self.tolerance {
            config.tolerance = v;
        }
        if let Some(v) = self.filler_type {
            config.filler_type_name = v;
        }
        config
    }
}

fn run_analyze(
    dump: PathBuf,
    config_path: Option<PathBuf>,
    overrides: Overrides,
    producer_exit_code: Option<i32>,
    json_output: bool,
) -> CommandResult {
    let base = match config_path {
        Some(path) => AnalysisConfig::from_yaml_file(path)?,
        None => AnalysisConfig::default(),
    };
    let config = overrides.apply(base);

    let mut artifact = DumpArtifact::new(dump);
    artifact.producer_exit_code = producer_exit_code;

    let report = analyze_artifact(&artifact, &config)?;
    let passed = report.verdict.passed;
    let payload = if json_output {
        Payload::Report(report)
    } else {
        Payload::Value(json!(render_report(&report)))
    };

    Ok(Outcome { payload, passed })
}

fn run_histogram(dump: PathBuf, top: usize, json_output: bool) -> CommandResult {
    DumpArtifact::new(&dump).check_ready()?;
    let snapshot = read_snapshot(&dump)?;

    let value = if json_output {
        let histogram: Vec<_> = snapshot.catalog().class_histogram().into_iter().take(top).collect();
        json!({
            "version": snapshot.header().version.as_str(),
            "dumped_at": snapshot.header().dumped_at().map(|t| t.to_rfc3339()),
            "objects": snapshot.catalog().len(),
            "total_bytes": snapshot.catalog().total_size(),
            "classes": histogram
        })
    } else {
        json!(render_histogram(&snapshot, top))
    };

    Ok(Outcome {
        payload: Payload::Value(value),
        passed: true,
    })
}

/// 人类可读的检查报告
pub fn render_report(report: &AnalysisReport) -> String {
    let status = if report.verdict.passed { "✅" } else { "❌" };
    format!(
        "{status} {}\n\
        ----------------------------------------\n\
        HPROF Version: {}\n\
        Objects:       {}\n\
        Filler Type:   {}\n\
        Size Window:   [{}, {}] bytes",
        report.verdict,
        report.hprof_version,
        report.objects,
        report.filler_type_name,
        report.window.min,
        report.window.max,
    )
}

/// 人类可读的类直方图
pub fn render_histogram(snapshot: &HeapSnapshot, top: usize) -> String {
    let catalog = snapshot.catalog();
    let dumped_at = snapshot
        .header()
        .dumped_at()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut out = format!(
        "📊 Heap Histogram (HPROF {}, dumped {})\n\
        Objects: {} | Total: {} bytes\n\
        ----------------------------------------\n",
        snapshot.header().version.as_str(),
        dumped_at,
        catalog.len(),
        catalog.total_size(),
    );
    for stats in catalog.class_histogram().into_iter().take(top) {
        out.push_str(&format!(
            "{:>10} {:>14}  {}\n",
            stats.instances, stats.total_bytes, stats.class_name
        ));
    }
    out
}

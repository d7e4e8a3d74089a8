use anyhow::{bail, Context, Result};
use clap::Parser;
use esp_merger::{pipeline, MergeConfig};
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "esp_merger")]
#[command(about = "按加载顺序合并插件中的技能树与天赋记录")]
#[command(version = "0.1.0")]
struct Cli {
    /// 加载顺序文件（每行一个插件名）
    #[arg(short, long)]
    loadorder: PathBuf,

    /// 游戏数据目录（包含基础插件）
    #[arg(short, long)]
    data: PathBuf,

    /// 模组目录
    #[arg(short, long)]
    mods: PathBuf,

    /// JSON 配置文件
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 顺序解码（不使用并行）
    #[arg(long)]
    sequential: bool,

    /// 并行解码使用的线程数
    #[arg(long)]
    threads: Option<usize>,

    /// 日志详细程度：-v info, -vv debug, -vvv trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// 静默模式(仅输出错误)
    #[arg(long)]
    quiet: bool,

    /// 列出合并后的所有记录
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli);
    validate_arguments(&cli)?;

    let mut config = match &cli.config {
        Some(path) => MergeConfig::from_json_file(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?,
        None => MergeConfig::default(),
    };
    // 命令行参数覆盖配置文件
    if cli.sequential {
        config.parallel = false;
    }
    if let Some(threads) = cli.threads {
        if threads == 0 {
            bail!("--threads 必须大于0");
        }
        config.worker_threads = Some(threads);
    }

    let (store, stats) = pipeline::run(&config, &cli.loadorder, &cli.data, &cli.mods)?;

    if !cli.quiet {
        print!("{}", stats);
    }

    if cli.list {
        for resolved in store.sorted() {
            println!(
                "{} {} \"{}\" <- {}",
                resolved.record.record_type(),
                resolved.record.form_id(),
                resolved.record.name(),
                resolved.plugin
            );
        }
    }

    Ok(())
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    let config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
    if let Err(e) = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("无法初始化日志: {}", e);
    }
}

/// 验证命令行中的路径
fn validate_arguments(cli: &Cli) -> Result<()> {
    check_path(&cli.loadorder, "Load order file", false)?;
    check_path(&cli.data, "Skyrim data path", true)?;
    check_path(&cli.mods, "Mods path", true)?;
    Ok(())
}

fn check_path(path: &Path, label: &str, directory: bool) -> Result<()> {
    if !path.exists() {
        bail!("{} {} does not exist.", label, path.display());
    }
    if directory && !path.is_dir() {
        bail!("{} {} is not a directory.", label, path.display());
    }
    if !directory && !path.is_file() {
        bail!("{} {} is not a regular file.", label, path.display());
    }
    Ok(())
}

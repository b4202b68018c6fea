use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "brainage")]
#[command(about = "脑龄预测流水线工具集：nii切片、模型推理与被试列表。")]
#[command(version, long_about = None)]
pub struct Cli {
    /// 输出更详细的日志（可重复，如`-vv`）。
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// 子命令。
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .init();
    }

    pub fn run_program(&mut self) -> anyhow::Result<()> {
        match self.command {
            Commands::Slice(ref mut v) => v.run(),
            Commands::Predict(ref mut v) => v.run(),
            Commands::ListSubjects(ref mut v) => v.run(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 将目录中的nii体数据规范化后提取固定范围的切片，保存为jpg图像。
    Slice(crate::subcmd_impls::slice::Slice),
    /// 用预训练模型逐批预测切片，并按被试取中位数写出CSV。
    Predict(crate::subcmd_impls::predict::Predict),
    /// 将目录下一层的子目录名排序后逐行写入文件（文件已存在则跳过）。
    ListSubjects(crate::subcmd_impls::list_subjects::ListSubjects),
}

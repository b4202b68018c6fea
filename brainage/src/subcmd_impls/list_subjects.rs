use agelib::prelude::write_subject_list;
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ListSubjects {
    /// 每个被试一个子目录的数据根目录。
    data_dir: PathBuf,
    /// 被试列表输出文件。
    out_file: PathBuf,
}

impl ListSubjects {
    pub fn run(&mut self) -> anyhow::Result<()> {
        write_subject_list(&self.data_dir, &self.out_file)
            .with_context(|| format!("无法列出`{}`中的被试", self.data_dir.display()))?;
        Ok(())
    }
}

//! 被试ID：目录列举、列表文件读写以及从切片文件名解析。

use crate::error::{AgeError, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;

/// 按字典序列出`root`下一层的所有子目录名（指向目录的符号链接也算）。
pub fn list_subjects(root: &Path) -> Result<Vec<String>> {
    if !root.is_dir() {
        return Err(AgeError::io(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "不是目录"),
        ));
    }
    let mut ids = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry?;
        if entry.path().is_dir() {
            ids.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    ids.sort();
    Ok(ids)
}

/// 把`root`的子目录名逐行写入`out`。
///
/// `out`已存在时什么也不做，返回`false`。
pub fn write_subject_list(root: &Path, out: &Path) -> Result<bool> {
    let ids = list_subjects(root)?;
    if out.exists() {
        warn!("`{}`已存在，跳过", out.display());
        return Ok(false);
    }
    let mut file = fs::File::create(out).map_err(|e| AgeError::io(out, e))?;
    for id in ids.iter() {
        writeln!(file, "{id}").map_err(|e| AgeError::io(out, e))?;
    }
    info!("写入{}个被试ID到`{}`", ids.len(), out.display());
    Ok(true)
}

/// 读取逐行的被试ID列表，忽略空行。
pub fn read_subject_list(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|e| AgeError::io(path, e))?;
    Ok(text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// 切片文件名`<被试ID>-<序号>.<扩展名>`中的被试ID。
///
/// 按最后一个`separator`切分，被试ID本身可以含有分隔符（如`sub-01-0.jpg`）；
/// 分隔符之后必须是纯数字序号加扩展名。
pub fn filename_prefix(file_name: &str, separator: char) -> Result<&str> {
    let Some((prefix, rest)) = file_name.rsplit_once(separator) else {
        return Err(AgeError::MissingSeparator {
            name: file_name.to_string(),
            separator,
        });
    };
    let seq = rest.split_once('.').map_or(rest, |(seq, _)| seq);
    if prefix.is_empty() || seq.is_empty() || !seq.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AgeError::BadFileName(file_name.to_string()));
    }
    Ok(prefix)
}

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use colored::*;

use crate::error::ScanError;
use crate::model::{DiscoveredDomain, Progress, ScanSummary};

/// 结果输出接口
pub trait Reporter: Send + Sync {
    /// 记录一条确认结果
    fn report(&self, result: &DiscoveredDomain) -> io::Result<()>;

    /// 刷新进度行，纯展示用途
    fn progress(&self, _progress: &Progress) {}
}

/// 结果文件名 `<domain>_<YYMMDDHHMMSS>.txt`
pub fn result_file_name(domain: &str, time: &DateTime<Local>) -> String {
    format!("{}_{}.txt", domain, time.format("%y%m%d%H%M%S"))
}

fn console_width() -> usize {
    let (_, cols) = console::Term::stdout().size();
    (cols as usize).saturating_sub(2)
}

/// 进度行文本
pub fn progress_line(p: &Progress) -> String {
    format!(
        "Domain:{:<32}| {} Found| {} groups| {} scanned in {:.1} seconds",
        p.sub, p.found, p.queued, p.scanned, p.elapsed_secs
    )
}

/// 写入结果文件并在终端展示
///
/// 文件在启动时打开一次，每写一行立即 flush。
pub struct FileReporter {
    file: Mutex<File>,
    path: PathBuf,
    silent: bool,
    width: usize,
}

impl FileReporter {
    pub fn create(out_dir: &Path, domain: &str, silent: bool) -> Result<Self, ScanError> {
        let path = out_dir.join(result_file_name(domain, &Local::now()));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        log::info!("results will be written to {}", path.display());
        Ok(FileReporter {
            file: Mutex::new(file),
            path,
            silent,
            width: console_width(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn pad(&self, msg: &str) -> String {
        let fill = self.width.saturating_sub(msg.chars().count());
        format!("{}{}", msg, " ".repeat(fill))
    }
}

impl Reporter for FileReporter {
    fn report(&self, result: &DiscoveredDomain) -> io::Result<()> {
        {
            let mut file = self
                .file
                .lock()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "result file lock poisoned"))?;
            writeln!(file, "{}", result.to_line())?;
            file.flush()?;
        }

        let msg = format!("{:<30}{}", result.domain, result.ip);
        let mut stdout = io::stdout().lock();
        write!(stdout, "\r{}\n", self.pad(&msg).green())?;
        stdout.flush()
    }

    fn progress(&self, p: &Progress) {
        if self.silent {
            return;
        }
        let mut stdout = io::stdout().lock();
        if let Err(e) = write!(stdout, "\r{}", self.pad(&progress_line(p))).and_then(|_| stdout.flush()) {
            log::trace!("progress line: {}", e);
        }
    }
}

/// 把结果收集在内存里，供库调用方使用
#[derive(Debug, Default)]
pub struct MemoryReporter {
    results: Mutex<Vec<DiscoveredDomain>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<DiscoveredDomain> {
        self.results
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.results().iter().map(DiscoveredDomain::to_line).collect()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, result: &DiscoveredDomain) -> io::Result<()> {
        if let Ok(mut results) = self.results.lock() {
            results.push(result.clone());
        }
        Ok(())
    }
}

/// 导出结果与汇总为JSON
pub fn export_json(path: &Path, summary: &ScanSummary) -> Result<(), ScanError> {
    let json_data = serde_json::to_string_pretty(summary)?;
    let mut file = File::create(path)?;
    file.write_all(json_data.as_bytes())?;
    println!("结果已导出到: {}", path.display());
    Ok(())
}

// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 日志
//!
//! 日志门面使用 `log`，后端由 `log4rs` 提供。除控制台输出外，
//! [`DailyFileAppender`] 把每条记录以 `[HH:MM:SS] [LEVEL] message` 的格式
//! 追加到 `<dir>/<YYYY-MM-DD>.log`，每个自然日一个文件，目录不存在时自动创建。

use crate::config::LogConfig;
use crate::exception::Exception;

use chrono::{DateTime, Local, NaiveDate};
use log::{LevelFilter, Record};
use log4rs::append::console::ConsoleAppender;
use log4rs::append::Append;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// 格式化一条日志记录
pub fn format_line(time: &DateTime<Local>, level: log::Level, message: &str) -> String {
    format!("[{}] [{}] {}", time.format("%H:%M:%S"), level, message)
}

/// 某一天的日志文件路径
pub fn log_file_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}.log", date.format("%Y-%m-%d")))
}

#[derive(Debug)]
struct OpenLog {
    date: NaiveDate,
    file: File,
}

/// 按自然日切分文件的追加写入器
#[derive(Debug)]
pub struct DailyFileAppender {
    dir: PathBuf,
    current: Mutex<Option<OpenLog>>,
}

impl DailyFileAppender {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            current: Mutex::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 以给定时间写入一行，日期变化时切换到新文件
    fn write_at(&self, now: &DateTime<Local>, line: &str) -> std::io::Result<()> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let today = now.date_naive();
        let stale = !matches!(&*current, Some(open) if open.date == today);
        if stale {
            fs::create_dir_all(&self.dir)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file_path(&self.dir, today))?;
            *current = Some(OpenLog { date: today, file });
        }
        match current.as_mut() {
            Some(open) => writeln!(open.file, "{}", line),
            None => Ok(()),
        }
    }
}

impl Append for DailyFileAppender {
    fn append(&self, record: &Record) -> anyhow::Result<()> {
        let now = Local::now();
        let line = format_line(&now, record.level(), &record.args().to_string());
        self.write_at(&now, &line)?;
        Ok(())
    }

    fn flush(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(open) = current.as_mut() {
            let _ = open.file.flush();
        }
    }
}

fn parse_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or(LevelFilter::Info)
}

/// 初始化全局日志，只应在进程启动时调用一次
pub fn init(config: &LogConfig) -> Result<log4rs::Handle, Exception> {
    let mut builder = Config::builder().appender(
        Appender::builder().build("daily", Box::new(DailyFileAppender::new(&config.dir))),
    );
    let mut root = Root::builder().appender("daily");
    if config.console {
        let console = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new("[{d(%H:%M:%S)}] [{l}] {m}{n}")))
            .build();
        builder = builder.appender(Appender::builder().build("console", Box::new(console)));
        root = root.appender("console");
    }
    let log_config = builder
        .build(root.build(parse_level(&config.level)))
        .map_err(|e| Exception::InvalidConfig(e.to_string()))?;
    log4rs::init_config(log_config).map_err(|e| Exception::InvalidConfig(e.to_string()))
}

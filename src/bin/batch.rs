// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 批处理入口
//!
//! 不经过 HTTP 流水线，直接按名称执行一个已注册的任务。不带参数时列出所有任务。

use webframe::batch::BatchRunner;
use webframe::config::Config;
use webframe::db::{Database, TcpConnector};
use webframe::exception::Exception;
use webframe::logger;

use clap::Parser;
use log::info;
use std::fs;
use std::io;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "batch")]
#[command(about = "Run a registered batch job outside the HTTP pipeline", long_about = None)]
struct Cli {
    /// 要执行的任务名称；省略时列出所有任务
    job: Option<String>,

    #[arg(short, long, default_value = "config/development.toml")]
    config: String,
}

fn jobs(config: &Config) -> BatchRunner {
    let mut runner = BatchRunner::new();

    let flag = config.maintenance().flag_file.clone();
    runner.register("maintenance:on", move || {
        if let Some(dir) = flag.parent() {
            fs::create_dir_all(dir).map_err(|e| Exception::internal(e.to_string()))?;
        }
        fs::write(&flag, "").map_err(|e| Exception::internal(e.to_string()))?;
        info!("维护模式已开启：{}", flag.display());
        Ok(())
    });

    let flag = config.maintenance().flag_file.clone();
    runner.register("maintenance:off", move || {
        if flag.exists() {
            fs::remove_file(&flag).map_err(|e| Exception::internal(e.to_string()))?;
        }
        info!("维护模式已关闭");
        Ok(())
    });

    let database = Database::new(config.database().cloned(), TcpConnector);
    runner.register("db:check", move || {
        database.connection()?;
        info!("数据库连接正常");
        Ok(())
    });

    runner
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match Config::from_toml(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}，使用默认配置", e);
            Config::new()
        }
    };
    if let Err(e) = logger::init(config.log()) {
        eprintln!("日志系统初始化失败：{}", e);
    }

    let code = jobs(&config).run(cli.job.as_deref(), &mut io::stdout(), &mut io::stderr());
    ExitCode::from(code as u8)
}

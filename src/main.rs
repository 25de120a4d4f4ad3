// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Web 服务入口
//!
//! 载入配置、初始化日志、构建分发器，然后在 Tokio 运行时上接收 HTTP 连接。
//! 按 Ctrl-C 停止接受新连接。

use webframe::app;
use webframe::config::Config;
use webframe::db::{Database, TcpConnector};
use webframe::dispatcher::Dispatcher;
use webframe::logger;
use webframe::server;
use webframe::session::MemorySessionStore;

use log::{error, info};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::runtime::Builder;

const CONFIG_PATH: &str = "config/development.toml";

fn main() -> ExitCode {
    // 配置文件缺失时使用默认配置，日志系统此时尚未初始化，只能输出到标准错误
    let config = match Config::from_toml(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}，使用默认配置", e);
            Config::new()
        }
    };

    if let Err(e) = logger::init(config.log()) {
        eprintln!("日志系统初始化失败：{}", e);
        return ExitCode::FAILURE;
    }
    info!("配置已载入，应用：{}", config.app().name);

    let database = Arc::new(Database::new(config.database().cloned(), TcpConnector));
    let dispatcher = match app::routes(database)
        .and_then(|router| Dispatcher::new(config.clone(), router, Arc::new(MemorySessionStore::new())))
    {
        Ok(dispatcher) => Arc::new(dispatcher),
        Err(e) => {
            error!("无法构建分发器：{}", e);
            return ExitCode::FAILURE;
        }
    };

    let worker_threads = config.server().worker_threads;
    let runtime = match Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建异步运行时：{}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("工作线程数：{}", worker_threads);

    // 支持全地址监听 (0.0.0.0) 或本地回环监听 (127.0.0.1)
    let port = config.server().port;
    let address = match config.server().local {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    let max_request_size = config.server().max_request_size;

    runtime.block_on(async move {
        let listener = match TcpListener::bind(SocketAddrV4::new(address, port)).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("无法绑定端口：{}，错误：{}", port, e);
                return ExitCode::FAILURE;
            }
        };
        info!("服务端将在{}:{}上监听Socket连接", address, port);

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("无法监听停机信号：{}", e);
                std::future::pending::<()>().await;
            }
        };
        server::serve(listener, dispatcher, max_request_size, shutdown).await;
        ExitCode::SUCCESS
    })
}

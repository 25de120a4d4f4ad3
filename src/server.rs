// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 传输层
//!
//! 基于 Tokio 的接收循环：每个连接读取一个完整请求（报文头 + `Content-Length` 指定的请求体），
//! 交给 [`Dispatcher`] 同步处理，写回响应后关闭连接。

use crate::dispatcher::Dispatcher;
use crate::exception::Exception;
use crate::param::STATUS_CODES;
use crate::request::{find_header_end, Request};
use crate::response::Response;

use log::{debug, error, info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// 接收连接直到 `shutdown` 完成
pub async fn serve(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    max_request_size: usize,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);
    let mut id: u128 = 0;

    loop {
        let (mut stream, addr) = tokio::select! {
            _ = &mut shutdown => {
                info!("接收到停机信号，停止接受新连接");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("接受连接失败：{}", e);
                    continue;
                }
            },
        };
        debug!("[ID{}]TCP连接已建立：{}", id, addr);

        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            handle_connection(&mut stream, id, dispatcher, max_request_size).await;
        });
        id += 1;
    }
}

/// 读取完整的请求报文。超出 `max_request_size` 时返回 `Err(413)`，解析失败时返回对应的 4xx。
async fn read_request(
    stream: &mut TcpStream,
    id: u128,
    max_request_size: usize,
) -> Result<Option<Request>, u16> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find_header_end(&buffer) {
            break pos;
        }
        if buffer.len() > max_request_size {
            return Err(413);
        }
        match stream.read(&mut chunk).await {
            Ok(0) if buffer.is_empty() => return Ok(None),
            Ok(0) => return Err(400),
            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
            Err(e) => {
                error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
                return Ok(None);
            }
        }
    };

    let head = Request::try_from(&buffer[..header_end + 4], id).map_err(|e| e.status_code())?;
    // Content-Length 由客户端控制，溢出同样视为超限
    let total = match (header_end + 4).checked_add(head.content_length().unwrap_or(0)) {
        Some(total) if total <= max_request_size => total,
        _ => return Err(413),
    };
    while buffer.len() < total {
        match stream.read(&mut chunk).await {
            Ok(0) => return Err(400),
            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
            Err(e) => {
                error!("[ID{}]读取请求体时遇到错误: {}", id, e);
                return Ok(None);
            }
        }
    }
    buffer.truncate(total);

    Request::try_from(&buffer, id)
        .map(Some)
        .map_err(|e: Exception| e.status_code())
}

async fn handle_connection(
    stream: &mut TcpStream,
    id: u128,
    dispatcher: Arc<Dispatcher>,
    max_request_size: usize,
) {
    let response = match read_request(stream, id, max_request_size).await {
        Ok(Some(request)) => {
            debug!("[ID{}]HTTP请求接收完毕", id);
            // 处理器可能执行阻塞操作（如数据库连接），放到阻塞线程池中运行
            match tokio::task::spawn_blocking(move || dispatcher.handle(request, id)).await {
                Ok(response) => response,
                Err(e) => {
                    error!("[ID{}]分发任务异常退出：{}", id, e);
                    Response::text(500, "Internal Server Error")
                }
            }
        }
        Ok(None) => return,
        Err(code) => {
            warn!("[ID{}]拒绝无法处理的请求，状态码 {}", id, code);
            Response::text(code, STATUS_CODES.get(&code).copied().unwrap_or("Bad Request"))
        }
    };

    if let Err(e) = stream.write_all(&response.as_bytes()).await {
        error!("[ID{}]写入响应失败：{}", id, e);
        return;
    }
    let _ = stream.flush().await;
    let _ = stream.shutdown().await;
    debug!("[ID{}]连接已关闭", id);
}

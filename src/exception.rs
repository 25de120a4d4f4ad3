// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了框架在配置、请求解析与请求分发生命周期中可能出现的各类异常情况。
//!
//! ## 设计意图
//! - **错误分类**：涵盖协议解析错误、配置错误、鉴权错误、CSRF 错误以及处理器内部错误。
//! - **语义映射**：每个变体都对应一个 HTTP 状态码（见 [`Exception::status_code`]），
//!   安全网关在本地消化自己的错误类别，只有 `Internal` 会到达分发器的统一错误边界。
//! - **用户友好**：通过实现 `std::fmt::Display`，确保错误信息可以被安全地记录到日志或返回给客户端。

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, Location};
use std::sync::Once;

thread_local! {
    /// 最近一次 panic 的位置与调用栈，由 [`install_panic_hook`] 记录
    static LAST_PANIC: RefCell<Option<(String, Option<String>)>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// 安装 panic 钩子，记录 panic 发生的位置，供 [`Exception::from_panic`] 使用。
///
/// 原有的钩子仍会被调用。多次调用只安装一次。
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|l| format!("{}:{}", l.file(), l.line()))
                .unwrap_or_else(|| "unknown".to_string());
            let backtrace = Backtrace::capture();
            let backtrace = match backtrace.status() {
                BacktraceStatus::Captured => Some(backtrace.to_string()),
                _ => None,
            };
            LAST_PANIC.with(|last| *last.borrow_mut() = Some((location, backtrace)));
            previous(info);
        }));
    });
}

/// 框架处理过程中发生的异常类型。
///
/// 该枚举通常作为 `Result` 的 `Err` 部分返回。
#[derive(Debug, Clone, PartialEq)]
pub enum Exception {
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 客户端使用了框架不支持的 HTTP 方法。
    UnSupportedRequestMethod,
    /// 客户端使用了框架不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// 请求行或请求头格式不正确。
    MalformedRequest,
    /// 路由或豁免规则的模式无法编译。属于配置错误，只会在注册阶段出现。
    InvalidPattern(String),
    /// 配置文件无法读取或解析。
    InvalidConfig(String),
    /// 数据库连接建立失败（凭据缺失或无法连接）。
    DatabaseUnavailable(String),
    /// Bearer 令牌缺失、格式错误或不被接受。对应 `401 Unauthorized`。
    Unauthorized(String),
    /// CSRF 令牌缺失或不匹配。对应 `403 Forbidden`。
    CsrfFailed,
    /// 没有路由匹配当前请求。对应 `404 Not Found`。
    NotFound,
    /// 处理器或网关内部出现的未预期错误。对应 `500 Internal Server Error`。
    Internal {
        message: String,
        location: String,
        backtrace: Option<String>,
    },
}

use Exception::*;

impl Exception {
    /// 构造一个 `Internal` 错误，并记录调用者所在的源码位置。
    ///
    /// 当 `RUST_BACKTRACE` 打开时同时保存调用栈，供调试模式下的 500 页面展示。
    #[track_caller]
    pub fn internal(message: impl Into<String>) -> Self {
        let caller = Location::caller();
        let backtrace = Backtrace::capture();
        Internal {
            message: message.into(),
            location: format!("{}:{}", caller.file(), caller.line()),
            backtrace: match backtrace.status() {
                BacktraceStatus::Captured => Some(backtrace.to_string()),
                _ => None,
            },
        }
    }

    /// 把 `catch_unwind` 捕获到的 panic 转换为 `Internal` 错误
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        let (location, backtrace) = LAST_PANIC
            .with(|last| last.borrow_mut().take())
            .unwrap_or_else(|| ("unknown".to_string(), None));
        Internal {
            message: format!("panic: {}", message),
            location,
            backtrace,
        }
    }

    /// 给没有位置信息的错误补上来源（出错的路由或网关），转换为 `Internal`。
    ///
    /// 已经是 `Internal` 的错误保留原有位置。
    pub fn located(self, origin: impl Into<String>) -> Self {
        match self {
            Internal { .. } => self,
            other => Internal {
                message: other.to_string(),
                location: origin.into(),
                backtrace: None,
            },
        }
    }

    /// 该异常对应的 HTTP 状态码。
    pub fn status_code(&self) -> u16 {
        match self {
            RequestIsNotUtf8 | UnSupportedRequestMethod | UnsupportedHttpVersion
            | MalformedRequest => 400,
            Unauthorized(_) => 401,
            CsrfFailed => 403,
            NotFound => 404,
            InvalidPattern(_) | InvalidConfig(_) | DatabaseUnavailable(_) | Internal { .. } => 500,
        }
    }

    /// 错误发生的位置。只有 `Internal` 记录了位置信息。
    pub fn location(&self) -> Option<&str> {
        match self {
            Internal { location, .. } => Some(location),
            _ => None,
        }
    }
}

/// 为 `Exception` 实现 `Display` 特性，使其支持字符串格式化输出。
impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            MalformedRequest => write!(f, "Malformed request"),
            InvalidPattern(p) => write!(f, "Invalid pattern: {}", p),
            InvalidConfig(reason) => write!(f, "Invalid configuration: {}", reason),
            DatabaseUnavailable(reason) => write!(f, "Database unavailable: {}", reason),
            Unauthorized(reason) => write!(f, "Unauthorized: {}", reason),
            CsrfFailed => write!(f, "CSRF token validation failed"),
            NotFound => write!(f, "Not Found"),
            Internal { message, .. } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for Exception {}

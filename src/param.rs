// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 协议参数与常量模块
//!
//! 该模块定义了框架遵循的 HTTP 协议相关常量和数据结构，包括：
//! - 常见的 HTTP 状态码及其原因短语（Reason Phrase）。
//! - HTTP 方法与版本的强类型枚举。
//! - 安全网关使用的固定响应头取值。

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;

/// 服务器名称标识，用于 HTTP 响应头的 `Server` 字段
pub const SERVER_NAME: &str = "webframe";

/// 框架名称，出现在状态接口的 JSON 中
pub const FRAMEWORK_NAME: &str = "webframe";

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

/// 会话中保存 CSRF 令牌所用的键，同时也是表单字段名
pub const CSRF_FIELD: &str = "csrf_token";

/// 提交 CSRF 令牌的请求头
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// CORS 允许的方法列表
pub const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, PATCH, OPTIONS";

/// CORS 允许的请求头列表
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization, X-CSRF-Token, X-Requested-With";

/// CORS 预检结果的缓存时间（秒）
pub const CORS_MAX_AGE: &str = "86400";

lazy_static! {
    /// HTTP 状态码与其对应的标准原因短语映射表。
    ///
    /// 参考标准：[RFC 9110: HTTP Semantics](https://www.rfc-editor.org/rfc/rfc9110.html)。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        // 2xx: 成功响应 (Successful)
        map.insert(200, "OK");
        map.insert(201, "Created");
        map.insert(202, "Accepted");
        map.insert(204, "No Content");

        // 3xx: 重定向 (Redirection)
        map.insert(301, "Moved Permanently");
        map.insert(302, "Found");
        map.insert(303, "See Other");
        map.insert(304, "Not Modified");
        map.insert(307, "Temporary Redirect");
        map.insert(308, "Permanent Redirect");

        // 4xx: 客户端错误 (Client Error)
        map.insert(400, "Bad Request");
        map.insert(401, "Unauthorized");
        map.insert(403, "Forbidden");
        map.insert(404, "Not Found");
        map.insert(405, "Method Not Allowed");
        map.insert(409, "Conflict");
        map.insert(413, "Content Too Large");
        map.insert(415, "Unsupported Media Type");
        map.insert(422, "Unprocessable Content");
        map.insert(429, "Too Many Requests");

        // 5xx: 服务端错误 (Server Error)
        map.insert(500, "Internal Server Error");
        map.insert(501, "Not Implemented");
        map.insert(502, "Bad Gateway");
        map.insert(503, "Service Unavailable");
        map.insert(504, "Gateway Timeout");
        map.insert(505, "HTTP Version Not Supported");
        map
    };
}

/// 支持的 HTTP 协议版本
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpVersion {
    /// HTTP/1.1 版本
    V1_1,
}

/// 标准 HTTP 请求方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpRequestMethod {
    /// 获取资源
    Get,
    /// 获取资源的元数据（不包含响应体）
    Head,
    /// 查询服务器支持的选项，同时用于 CORS 预检
    Options,
    /// 提交数据或执行操作
    Post,
    /// 整体替换资源
    Put,
    /// 删除资源
    Delete,
    /// 局部修改资源
    Patch,
}

impl HttpRequestMethod {
    /// 从请求行中的方法名解析（大小写不敏感）。
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            _ => None,
        }
    }

    /// 安全方法不会修改服务器状态，CSRF 校验对其不生效。
    pub fn is_safe(self) -> bool {
        matches!(self, Self::Get | Self::Head | Self::Options)
    }
}

impl fmt::Display for HttpVersion {
    /// 将枚举格式化为 HTTP 报文中的版本字符串
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpVersion::V1_1 => write!(f, "1.1"),
        }
    }
}

impl fmt::Display for HttpRequestMethod {
    /// 将枚举格式化为 HTTP 标准大写方法名
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpRequestMethod::Get => write!(f, "GET"),
            HttpRequestMethod::Head => write!(f, "HEAD"),
            HttpRequestMethod::Options => write!(f, "OPTIONS"),
            HttpRequestMethod::Post => write!(f, "POST"),
            HttpRequestMethod::Put => write!(f, "PUT"),
            HttpRequestMethod::Delete => write!(f, "DELETE"),
            HttpRequestMethod::Patch => write!(f, "PATCH"),
        }
    }
}

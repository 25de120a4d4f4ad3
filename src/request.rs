// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求处理模块
//!
//! 该模块负责将 TCP 流中读取的原始字节解析为强类型的 `Request` 结构体。它涵盖了：
//! 1. 请求行（Request-Line）的解析（方法、路径、查询字符串、版本）。
//! 2. HTTP 标头（Headers）的提取，按名称大小写不敏感查找。
//! 3. 请求体参数的解析：`application/x-www-form-urlencoded` 表单与扁平 JSON 对象。
//! 4. Cookie 的读取，会话 ID 即由此获得。

use crate::{exception::Exception, param::*};
use bytes::Bytes;
use log::error;
use serde_json::Value;

/// 表示一个完整的 HTTP 请求。
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP 请求方法
    method: HttpRequestMethod,
    /// 请求的资源路径（不含查询字符串）
    path: String,
    /// 查询字符串（不含 `?`）
    query: Option<String>,
    /// HTTP 协议版本
    version: HttpVersion,
    /// 按出现顺序保存的请求头
    headers: Vec<(String, String)>,
    /// 请求体原始字节
    body: Bytes,
}

impl Request {
    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 逻辑步骤
    /// 1. 以第一个空行为界拆分报文头与请求体。
    /// 2. 验证编码：报文头必须是合法的 UTF-8 字符串。
    /// 3. 解析请求行：提取方法、路径、查询字符串和协议版本。
    /// 4. 逐行解析标头。
    ///
    /// # 参数
    /// * `buffer` - 从网络 Socket 读取的原始数据。
    /// * `id` - 全局请求 ID，用于在多线程环境下追踪日志。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let (head, body) = match find_header_end(buffer) {
            Some(pos) => (&buffer[..pos], &buffer[pos + 4..]),
            None => (buffer, &buffer[buffer.len()..]),
        };

        // 1. 将报文头转换为字符串，失败则判定为非法的 HTTP 请求
        let head = match std::str::from_utf8(head) {
            Ok(s) => s,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let mut lines = head.split(CRLF);

        // 2. 解析请求行 (e.g., "POST /submit?x=1 HTTP/1.1")
        let request_line = lines.next().unwrap_or_default();
        let parts: Vec<&str> = request_line.split(' ').filter(|p| !p.is_empty()).collect();
        if parts.len() != 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_line);
            return Err(Exception::MalformedRequest);
        }

        let method = match HttpRequestMethod::parse(parts[0]) {
            Some(m) => m,
            None => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, parts[0]);
                return Err(Exception::UnSupportedRequestMethod);
            }
        };

        let version = match parts[2].to_uppercase().as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            other => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, other);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        let (path, query) = split_target(parts[1]);

        // 3. 迭代各行解析 Headers
        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            match line.split_once(':') {
                Some((name, value)) => {
                    headers.push((name.trim().to_string(), value.trim().to_string()));
                }
                None => {
                    error!("[ID{}]无法解析的请求头：{}", id, line);
                    return Err(Exception::MalformedRequest);
                }
            }
        }

        Ok(Self {
            method,
            path,
            query,
            version,
            headers,
            body: Bytes::copy_from_slice(body),
        })
    }

    /// 直接构造请求，供测试、基准与内部调用使用。
    pub fn new(method: HttpRequestMethod, target: &str) -> Self {
        let (path, query) = split_target(target);
        Self {
            method,
            path,
            query,
            version: HttpVersion::V1_1,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// 以 `application/x-www-form-urlencoded` 编码设置表单请求体。
    pub fn with_form(self, fields: &[(&str, &str)]) -> Self {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter())
            .finish();
        self.with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_body(encoded)
    }
}

// --- Getter 访问器实现 ---

impl Request {
    /// 获取 HTTP 协议版本
    pub fn version(&self) -> &HttpVersion {
        &self.version
    }

    /// 获取请求路径（不含查询参数，未做规范化）
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 获取原始查询字符串
    pub fn query_string(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// 获取请求方法
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    /// 获取请求体
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// 按名称（大小写不敏感）获取第一个匹配的请求头
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// 获取客户端标识字符串
    pub fn user_agent(&self) -> &str {
        self.header("User-Agent").unwrap_or_default()
    }

    /// 声明的请求体长度
    pub fn content_length(&self) -> Option<usize> {
        self.header("Content-Length")?.parse().ok()
    }

    /// 读取指定名称的 Cookie
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("Cookie"))
            .flat_map(|(_, v)| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }

    /// 查询字符串参数
    pub fn query(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// 请求体参数。
    ///
    /// 支持表单编码与 JSON 对象两种请求体；JSON 中的非字符串标量会被转换为其文本形式。
    pub fn body_param(&self, name: &str) -> Option<String> {
        let content_type = self.header("Content-Type").unwrap_or_default();
        if content_type.starts_with("application/json") {
            let object: serde_json::Map<String, Value> = serde_json::from_slice(&self.body).ok()?;
            return match object.get(name)? {
                Value::String(s) => Some(s.clone()),
                Value::Null | Value::Array(_) | Value::Object(_) => None,
                other => Some(other.to_string()),
            };
        }
        if content_type.starts_with("application/x-www-form-urlencoded") {
            return url::form_urlencoded::parse(&self.body)
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned());
        }
        None
    }

    /// 先查请求体，再查查询字符串
    pub fn input(&self, name: &str) -> Option<String> {
        self.body_param(name).or_else(|| self.query(name))
    }
}

/// 报文头结束位置（`\r\n\r\n` 的起点）
pub fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

fn split_target(target: &str) -> (String, Option<String>) {
    match target.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (target.to_string(), None),
    }
}

// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 响应构建模块
//!
//! `Response` 同时承担两个角色：处理器和安全网关的返回值，以及写回 Socket 的报文构建器。
//! 分发器在返回前会把网关累积的响应头（安全头、CORS 头、Set-Cookie）合并进来。

use crate::param::*;

use bytes::Bytes;
use chrono::prelude::*;
use log::error;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct Response {
    version: HttpVersion,
    status_code: u16,
    information: String,
    content_type: Option<String>,
    date: DateTime<Utc>,
    server_name: String,
    headers: Vec<(String, String)>,
    content: Option<Bytes>,
    head_only: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: 200,
            information: "OK".to_string(),
            content_type: None,
            date: Utc::now(),
            server_name: SERVER_NAME.to_string(),
            headers: Vec::new(),
            content: None,
            head_only: false,
        }
    }

    /// 纯文本响应
    pub fn text(code: u16, body: impl Into<String>) -> Self {
        Self::with_content(code, "text/plain;charset=utf-8", body.into())
    }

    /// HTML 响应
    pub fn html(code: u16, body: impl Into<String>) -> Self {
        Self::with_content(code, "text/html;charset=utf-8", body.into())
    }

    /// JSON 响应，`Content-Type: application/json`
    pub fn json(code: u16, value: &Value) -> Self {
        Self::with_content(code, "application/json", value.to_string())
    }

    /// `{"error": "<message>"}` 形式的错误响应
    pub fn json_error(code: u16, message: &str) -> Self {
        Self::json(code, &json!({ "error": message }))
    }

    /// 302 重定向
    pub fn redirect(location: &str) -> Self {
        let mut response = Self::new();
        response.set_code(302);
        response.with_header("Location", location)
    }

    fn with_content(code: u16, content_type: &str, body: String) -> Self {
        let mut response = Self::new();
        response.set_code(code);
        response.content_type = Some(content_type.to_string());
        response.content = Some(Bytes::from(body));
        response
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    /// 设置响应头；同名（大小写不敏感）的旧值会被替换
    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// 追加响应头，不覆盖同名的已有值（用于 `Set-Cookie`）
    pub fn append_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// 设置状态码。未知状态码不会导致崩溃，原因短语记为 `Unknown`。
    pub fn set_code(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.information = match STATUS_CODES.get(&code) {
            Some(&info) => info.to_string(),
            None => {
                error!("非法的状态码：{}。这条错误说明代码编写出现了错误。", code);
                "Unknown".to_string()
            }
        };
        self
    }

    /// HEAD 请求：保留 Content-Length，但不发送响应体
    pub fn set_head_only(&mut self) -> &mut Self {
        self.head_only = true;
        self
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let version: &str = match self.version {
            HttpVersion::V1_1 => "HTTP/1.1",
        };
        let body: &[u8] = match &self.content {
            Some(c) => c,
            None => b"",
        };

        let status_code: &str = &self.status_code.to_string();
        let information: &str = &self.information;
        let content_length: &str = &body.len().to_string();
        let date: &str = &format_date(&self.date);
        let server: &str = &self.server_name;

        let mut header = [version, " ", status_code, " ", information, CRLF].concat();
        if let Some(t) = &self.content_type {
            header.push_str(&format!("Content-Type: {}{}", t, CRLF));
        }
        header.push_str(&["Content-Length: ", content_length, CRLF].concat());
        header.push_str(&["Date: ", date, CRLF].concat());
        header.push_str(&["Server: ", server, CRLF].concat());
        for (name, value) in &self.headers {
            header.push_str(&format!("{}: {}{}", name, value, CRLF));
        }
        header.push_str("Connection: close");
        header.push_str(CRLF);
        header.push_str(CRLF);

        if self.head_only {
            return header.into_bytes();
        }
        [header.as_bytes(), body].concat()
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// 按名称（大小写不敏感）读取响应头
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        match &self.content {
            Some(c) => c,
            None => b"",
        }
    }

    /// 以 UTF-8 文本形式读取响应体（非法字节被替换）
    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(self.body()).into_owned()
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求上下文
//!
//! 每个请求创建一个 [`RequestContext`]，响应完成后即丢弃，从不在请求之间共享。
//! 它显式携带会话句柄与会话存储，网关和处理器都通过它访问请求数据，而不是依赖全局状态。

use crate::param::{HttpRequestMethod, CSRF_FIELD};
use crate::request::Request;
use crate::session::{Session, SessionStore};
use crate::util::normalize_path;

use std::sync::Arc;

pub struct RequestContext {
    id: u128,
    request: Request,
    path: String,
    session: Session,
    sessions: Arc<dyn SessionStore>,
    bearer_authenticated: bool,
    response_headers: Vec<(String, String)>,
}

impl RequestContext {
    pub fn new(id: u128, request: Request, session: Session, sessions: Arc<dyn SessionStore>) -> Self {
        let path = normalize_path(request.path()).to_string();
        Self {
            id,
            request,
            path,
            session,
            sessions,
            bearer_authenticated: false,
            response_headers: Vec::new(),
        }
    }

    pub fn id(&self) -> u128 {
        self.id
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn method(&self) -> HttpRequestMethod {
        self.request.method()
    }

    /// 规范化后的路径（去掉末尾 `/`，根路径除外）
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 请求体参数优先，其次查询字符串
    pub fn input(&self, name: &str) -> Option<String> {
        self.request.input(name)
    }

    /// 仅当请求携带了合法的 Bearer 令牌且路径未被豁免时为真
    pub fn bearer_authenticated(&self) -> bool {
        self.bearer_authenticated
    }

    pub(crate) fn mark_bearer_authenticated(&mut self) {
        self.bearer_authenticated = true;
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_get(&mut self, key: &str) -> Option<String> {
        self.session.get(self.sessions.as_ref(), key)
    }

    pub fn session_set(&mut self, key: &str, value: &str) {
        self.session.set(self.sessions.as_ref(), key, value);
    }

    /// 当前会话的 CSRF 令牌，不存在时生成
    pub fn csrf_token(&mut self) -> String {
        self.session.csrf_token(self.sessions.as_ref())
    }

    /// 供表单嵌入的隐藏字段
    pub fn csrf_field(&mut self) -> String {
        format!(
            r#"<input type="hidden" name="{}" value="{}">"#,
            CSRF_FIELD,
            self.csrf_token()
        )
    }

    /// 添加一个会出现在最终响应（包括短路响应与错误响应）上的响应头
    pub fn add_response_header(&mut self, name: &str, value: &str) {
        self.response_headers.push((name.to_string(), value.to_string()));
    }

    pub fn response_headers(&self) -> &[(String, String)] {
        &self.response_headers
    }

    /// 写回有修改的会话
    pub(crate) fn persist_session(&self) {
        self.session.persist(self.sessions.as_ref());
    }
}

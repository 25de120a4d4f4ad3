// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由
//!
//! 路由表只允许追加，注册顺序即匹配优先级：第一个方法相同且模式匹配的路由胜出，
//! 其捕获的参数按位置传给处理器。

use crate::context::RequestContext;
use crate::exception::Exception;
use crate::param::HttpRequestMethod;
use crate::pattern::RoutePattern;
use crate::response::Response;

use log::debug;

/// 请求处理器
pub trait Handler: Send + Sync {
    fn call(&self, ctx: &mut RequestContext, params: &[String]) -> Result<Response, Exception>;
}

impl<F> Handler for F
where
    F: Fn(&mut RequestContext, &[String]) -> Result<Response, Exception> + Send + Sync,
{
    fn call(&self, ctx: &mut RequestContext, params: &[String]) -> Result<Response, Exception> {
        self(ctx, params)
    }
}

pub struct Route {
    method: HttpRequestMethod,
    pattern: RoutePattern,
    handler: Box<dyn Handler>,
}

impl Route {
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    pub fn pattern(&self) -> &str {
        self.pattern.source()
    }

    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }
}

#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册路由。模式非法时立即返回配置错误，而不是等到请求到来。
    pub fn add<H: Handler + 'static>(
        &mut self,
        method: HttpRequestMethod,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, Exception> {
        if matches!(method, HttpRequestMethod::Head | HttpRequestMethod::Options) {
            return Err(Exception::InvalidConfig(format!(
                "无法为 {} 方法注册路由：{}",
                method, pattern
            )));
        }
        let pattern = RoutePattern::compile(pattern)?;
        debug!("注册路由 {} {}", method, pattern.source());
        self.routes.push(Route {
            method,
            pattern,
            handler: Box::new(handler),
        });
        Ok(self)
    }

    pub fn get<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, Exception>
    where
        F: Fn(&mut RequestContext, &[String]) -> Result<Response, Exception> + Send + Sync + 'static,
    {
        self.add(HttpRequestMethod::Get, pattern, handler)
    }

    pub fn post<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, Exception>
    where
        F: Fn(&mut RequestContext, &[String]) -> Result<Response, Exception> + Send + Sync + 'static,
    {
        self.add(HttpRequestMethod::Post, pattern, handler)
    }

    pub fn put<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, Exception>
    where
        F: Fn(&mut RequestContext, &[String]) -> Result<Response, Exception> + Send + Sync + 'static,
    {
        self.add(HttpRequestMethod::Put, pattern, handler)
    }

    pub fn delete<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, Exception>
    where
        F: Fn(&mut RequestContext, &[String]) -> Result<Response, Exception> + Send + Sync + 'static,
    {
        self.add(HttpRequestMethod::Delete, pattern, handler)
    }

    pub fn patch<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, Exception>
    where
        F: Fn(&mut RequestContext, &[String]) -> Result<Response, Exception> + Send + Sync + 'static,
    {
        self.add(HttpRequestMethod::Patch, pattern, handler)
    }

    /// 查找第一个匹配的路由，返回路由与位置参数
    pub fn find(&self, method: HttpRequestMethod, path: &str) -> Option<(&Route, Vec<String>)> {
        self.routes
            .iter()
            .filter(|route| route.method == method)
            .find_map(|route| route.pattern.extract(path).map(|params| (route, params)))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

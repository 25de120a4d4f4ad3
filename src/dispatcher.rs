// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求分发
//!
//! 分发器按固定顺序驱动一个请求走完整条流水线：
//!
//! ```text
//! Start → MaintenanceChecked → HeadersSent → CorsChecked → BearerChecked → CsrfChecked
//!       → Routed → { Handled | NotFound }
//! 任意阶段出错 → Faulted → ErrorHandled
//! ```
//!
//! 网关可以直接跳到 `Handled`（短路响应）。处理器和网关返回的 `Err`，以及它们内部的 panic，
//! 都只在 [`Dispatcher::handle`] 这一处被捕获、记录并转换为 500 响应。

use crate::config::Config;
use crate::context::RequestContext;
use crate::exception::{install_panic_hook, Exception};
use crate::param::HttpRequestMethod;
use crate::request::Request;
use crate::response::Response;
use crate::router::{Handler, Router};
use crate::security::{Maintenance, SecurityPolicy, Verdict};
use crate::session::{Session, SessionStore};
use crate::util::HtmlBuilder;

use log::{debug, error, info};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// 请求在流水线中所处的阶段，出错时随错误一起记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    MaintenanceChecked,
    HeadersSent,
    CorsChecked,
    BearerChecked,
    CsrfChecked,
    Routed,
    Handled,
    NotFound,
    Faulted,
    ErrorHandled,
}

/// 每个网关执行完毕后进入的阶段，与 [`SecurityPolicy::gates`] 的顺序一致
const GATE_STAGES: [Stage; 4] = [
    Stage::HeadersSent,
    Stage::CorsChecked,
    Stage::BearerChecked,
    Stage::CsrfChecked,
];

/// 自定义错误页。
///
/// 接收网关拒绝（如 CSRF 失败）或统一错误边界捕获到的错误，返回的状态码会被分发器覆盖。
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, ctx: &RequestContext, fault: &Exception) -> Response;
}

impl<F> ErrorHandler for F
where
    F: Fn(&RequestContext, &Exception) -> Response + Send + Sync,
{
    fn handle(&self, ctx: &RequestContext, fault: &Exception) -> Response {
        self(ctx, fault)
    }
}

pub struct Dispatcher {
    config: Config,
    maintenance: Maintenance,
    policy: SecurityPolicy,
    router: Router,
    not_found: Option<Box<dyn Handler>>,
    error_handler: Option<Box<dyn ErrorHandler>>,
    sessions: Arc<dyn SessionStore>,
}

impl Dispatcher {
    /// 构建分发器。安全策略中的豁免规则在这里编译，非法模式会以配置错误返回。
    pub fn new(
        config: Config,
        router: Router,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, Exception> {
        install_panic_hook();
        let maintenance = Maintenance::from_config(config.maintenance());
        let policy = SecurityPolicy::from_config(config.security())?;
        info!("分发器已就绪，共 {} 条路由", router.len());
        Ok(Self {
            config,
            maintenance,
            policy,
            router,
            not_found: None,
            error_handler: None,
            sessions,
        })
    }

    /// 没有路由匹配时调用，返回的状态码总是 404
    pub fn with_not_found<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut RequestContext, &[String]) -> Result<Response, Exception> + Send + Sync + 'static,
    {
        self.not_found = Some(Box::new(handler));
        self
    }

    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RequestContext, &Exception) -> Response + Send + Sync + 'static,
    {
        self.error_handler = Some(Box::new(handler));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// 处理一个请求，总会得到一个响应
    pub fn handle(&self, request: Request, id: u128) -> Response {
        let head = request.method() == HttpRequestMethod::Head;

        // 维护模式：直接返回，不经过任何网关，也不记录访问日志
        if let Some(mut response) = self.maintenance.check() {
            if head {
                response.set_head_only();
            }
            return response;
        }

        let session = self.load_session(&request);
        let mut ctx = RequestContext::new(id, request, session, Arc::clone(&self.sessions));
        let mut stage = Stage::MaintenanceChecked;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run(&mut ctx, &mut stage)));
        let mut response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(fault)) => self.fault(&ctx, fault, stage),
            Err(payload) => self.fault(&ctx, Exception::from_panic(payload), stage),
        };

        self.finish(&ctx, &mut response);
        if head {
            response.set_head_only();
        }
        info!(
            "[ID{}] {} {} -> {}",
            id,
            ctx.method(),
            ctx.path(),
            response.status_code()
        );
        response
    }

    fn load_session(&self, request: &Request) -> Session {
        match request.cookie(&self.config.session().cookie_name) {
            Some(id) if !id.is_empty() => Session::existing(id),
            _ => Session::fresh(),
        }
    }

    fn run(&self, ctx: &mut RequestContext, stage: &mut Stage) -> Result<Response, Exception> {
        for (gate, next) in self.policy.gates().into_iter().zip(GATE_STAGES) {
            let verdict = gate
                .check(ctx)
                .map_err(|e| e.located(format!("网关 {}", gate.name())))?;
            match verdict {
                Verdict::Pass => *stage = next,
                Verdict::Respond(response) => {
                    debug!("[ID{}]{} 网关短路：{}", ctx.id(), gate.name(), response.status_code());
                    *stage = Stage::Handled;
                    return Ok(response);
                }
                Verdict::Reject(exception) => {
                    *stage = Stage::Handled;
                    return Ok(self.reject(ctx, &exception));
                }
            }
        }

        // HEAD 请求按 GET 路由处理，响应体在返回前去掉
        let method = match ctx.method() {
            HttpRequestMethod::Head => HttpRequestMethod::Get,
            method => method,
        };
        let found = self.router.find(method, ctx.path());
        *stage = Stage::Routed;
        match found {
            Some((route, params)) => {
                let response = route.handler().call(ctx, &params).map_err(|e| {
                    e.located(format!("路由 {} {}", route.method(), route.pattern()))
                })?;
                *stage = Stage::Handled;
                Ok(response)
            }
            None => {
                *stage = Stage::NotFound;
                self.not_found(ctx)
            }
        }
    }

    fn not_found(&self, ctx: &mut RequestContext) -> Result<Response, Exception> {
        match &self.not_found {
            Some(handler) => {
                let mut response = handler
                    .call(ctx, &[])
                    .map_err(|e| e.located("未匹配路由处理器"))?;
                response.set_code(404);
                Ok(response)
            }
            None => Ok(Response::html(
                404,
                HtmlBuilder::from_status_code(404, None).build(),
            )),
        }
    }

    /// 网关拒绝：交给错误处理器，否则返回 JSON 错误
    fn reject(&self, ctx: &RequestContext, exception: &Exception) -> Response {
        let code = exception.status_code();
        match &self.error_handler {
            Some(handler) => {
                let mut response = handler.handle(ctx, exception);
                response.set_code(code);
                response
            }
            None => Response::json_error(code, &exception.to_string()),
        }
    }

    /// 统一错误边界：记录错误并转换为 500
    fn fault(&self, ctx: &RequestContext, fault: Exception, stage: Stage) -> Response {
        error!(
            "[ID{}]请求处理失败：{}，位置：{}，阶段：{:?}，请求：{} {}",
            ctx.id(),
            fault,
            fault.location().unwrap_or("unknown"),
            stage,
            ctx.method(),
            ctx.path()
        );
        debug!("[ID{}]{:?} -> {:?}", ctx.id(), Stage::Faulted, Stage::ErrorHandled);

        let custom = self.error_handler.as_ref().and_then(|handler| {
            panic::catch_unwind(AssertUnwindSafe(|| handler.handle(ctx, &fault)))
                .map_err(|payload| {
                    error!(
                        "[ID{}]错误处理器自身出错：{}",
                        ctx.id(),
                        Exception::from_panic(payload)
                    );
                })
                .ok()
        });
        let mut response = custom.unwrap_or_else(|| self.default_error_page(&fault));
        response.set_code(500);
        response
    }

    fn default_error_page(&self, fault: &Exception) -> Response {
        let page = if self.config.app().debug {
            let mut detail = format!(
                "{}\n位置：{}",
                fault,
                fault.location().unwrap_or("unknown")
            );
            if let Exception::Internal {
                backtrace: Some(backtrace),
                ..
            } = fault
            {
                detail.push_str("\n\n");
                detail.push_str(backtrace);
            }
            HtmlBuilder::from_status_code(500, None).push_pre(&detail)
        } else {
            HtmlBuilder::from_status_code(500, Some("服务器内部错误，请稍后再试。"))
        };
        Response::html(500, page.build())
    }

    /// 合并网关累积的响应头，写回会话
    fn finish(&self, ctx: &RequestContext, response: &mut Response) {
        for (name, value) in ctx.response_headers() {
            if response.header(name).is_none() {
                response.append_header(name, value);
            }
        }
        ctx.persist_session();
        let session = ctx.session();
        if session.is_new() && session.is_dirty() {
            let cookie = format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax",
                self.config.session().cookie_name,
                session.id()
            );
            response.append_header("Set-Cookie", &cookie);
        }
    }
}

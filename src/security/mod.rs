// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 安全策略链
//!
//! 每个网关独立检查请求，结果只有三种（见 [`Verdict`]）：放行、直接给出响应（短路），
//! 或者把错误交给分发器的错误处理器。网关自己消化自己的错误类别（401、403），
//! 只有未预期的错误才以 `Err` 的形式到达分发器的统一错误边界。
//!
//! 执行顺序固定：维护模式 → 安全响应头 → CORS → Bearer 鉴权 → CSRF。
//! 维护模式在创建请求上下文之前单独检查，见 [`Maintenance`]。

mod bearer;
mod cors;
mod csrf;
mod headers;
mod maintenance;

pub use bearer::BearerAuth;
pub use cors::Cors;
pub use csrf::Csrf;
pub use headers::SecurityHeaders;
pub use maintenance::Maintenance;

use crate::config::SecurityConfig;
use crate::context::RequestContext;
use crate::exception::Exception;
use crate::response::Response;

/// 网关的检查结果
#[derive(Debug)]
pub enum Verdict {
    /// 放行，继续执行后续网关
    Pass,
    /// 短路：直接返回该响应
    Respond(Response),
    /// 拒绝，并把结构化的错误交给分发器的错误处理器
    Reject(Exception),
}

pub trait Gate: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, ctx: &mut RequestContext) -> Result<Verdict, Exception>;
}

/// 按固定顺序组织的网关集合，启动时由配置构建一次
pub struct SecurityPolicy {
    headers: SecurityHeaders,
    cors: Cors,
    bearer: BearerAuth,
    csrf: Csrf,
}

impl SecurityPolicy {
    /// 编译所有豁免规则；任何非法模式都会在这里以配置错误的形式返回
    pub fn from_config(config: &SecurityConfig) -> Result<Self, Exception> {
        Ok(Self {
            headers: SecurityHeaders::new(config.headers_enabled),
            cors: Cors::from_config(&config.cors)?,
            bearer: BearerAuth::from_config(&config.bearer)?,
            csrf: Csrf::from_config(config.csrf_enabled, &config.csrf_exempt)?,
        })
    }

    /// 按执行顺序排列的网关
    pub fn gates(&self) -> [&dyn Gate; 4] {
        [&self.headers, &self.cors, &self.bearer, &self.csrf]
    }
}

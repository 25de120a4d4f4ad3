use super::{Gate, Verdict};
use crate::config::CorsConfig;
use crate::context::RequestContext;
use crate::exception::Exception;
use crate::param::*;
use crate::pattern::ExemptionList;
use crate::response::Response;

use log::debug;

/// 跨域资源共享。
///
/// 对 OPTIONS 请求直接短路：来源允许返回 200，否则返回 403，不会进入路由。
pub struct Cors {
    enabled: bool,
    allowed_origins: Vec<String>,
    exempt: ExemptionList,
}

impl Cors {
    pub fn from_config(config: &CorsConfig) -> Result<Self, Exception> {
        Ok(Self {
            enabled: config.enabled,
            allowed_origins: config.allowed_origins.clone(),
            exempt: ExemptionList::compile(&config.exempt)?,
        })
    }

    /// 计算 `Access-Control-Allow-Origin` 的取值；`None` 表示来源不被允许
    fn allow_origin(&self, origin: Option<&str>) -> Option<String> {
        if self.allowed_origins.iter().any(|o| o == "*") {
            return Some(origin.unwrap_or("*").to_string());
        }
        origin
            .filter(|o| self.allowed_origins.iter().any(|allowed| allowed == o))
            .map(str::to_string)
    }
}

impl Gate for Cors {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn check(&self, ctx: &mut RequestContext) -> Result<Verdict, Exception> {
        if !self.enabled || self.exempt.matches(ctx.path()) {
            return Ok(Verdict::Pass);
        }

        let allow_origin = self.allow_origin(ctx.request().header("Origin"));
        let allowed = allow_origin.is_some();
        if let Some(origin) = allow_origin {
            ctx.add_response_header("Access-Control-Allow-Origin", &origin);
            ctx.add_response_header("Access-Control-Allow-Methods", CORS_ALLOW_METHODS);
            ctx.add_response_header("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS);
            ctx.add_response_header("Access-Control-Max-Age", CORS_MAX_AGE);
        }

        if ctx.method() == HttpRequestMethod::Options {
            debug!("[ID{}]CORS 预检：{} allowed={}", ctx.id(), ctx.path(), allowed);
            return Ok(Verdict::Respond(if allowed {
                Response::text(200, "")
            } else {
                Response::json_error(403, "CORS origin not allowed")
            }));
        }
        Ok(Verdict::Pass)
    }
}

use super::{Gate, Verdict};
use crate::config::BearerConfig;
use crate::context::RequestContext;
use crate::exception::Exception;
use crate::pattern::ExemptionList;
use crate::response::Response;
use crate::util::constant_time_eq;

use log::warn;

/// Bearer 令牌鉴权。
///
/// 豁免路径直接放行但不算作已鉴权；只有携带合法令牌通过时才标记
/// `bearer_authenticated`，CSRF 网关据此跳过校验。
pub struct BearerAuth {
    enabled: bool,
    tokens: Vec<String>,
    exempt: ExemptionList,
}

/// 从 `Authorization` 头中取出令牌，方案名大小写不敏感
pub fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

impl BearerAuth {
    pub fn from_config(config: &BearerConfig) -> Result<Self, Exception> {
        Ok(Self {
            enabled: config.enabled,
            tokens: config.tokens.clone(),
            exempt: ExemptionList::compile(&config.exempt)?,
        })
    }

    /// 与每个已配置令牌都做一次常量时间比较，不提前退出
    fn accepts(&self, token: &str) -> bool {
        self.tokens
            .iter()
            .fold(false, |found, known| constant_time_eq(known, token) | found)
    }

    fn unauthorized(ctx: &RequestContext, reason: &str) -> Verdict {
        warn!(
            "[ID{}]Bearer 鉴权失败：{} {}（{}）",
            ctx.id(),
            ctx.method(),
            ctx.path(),
            reason
        );
        let fault = Exception::Unauthorized(reason.to_string());
        Verdict::Respond(
            Response::json_error(fault.status_code(), &fault.to_string())
                .with_header("WWW-Authenticate", "Bearer"),
        )
    }
}

impl Gate for BearerAuth {
    fn name(&self) -> &'static str {
        "bearer-auth"
    }

    fn check(&self, ctx: &mut RequestContext) -> Result<Verdict, Exception> {
        if !self.enabled || self.exempt.matches(ctx.path()) {
            return Ok(Verdict::Pass);
        }

        let token = ctx.request().header("Authorization").and_then(parse_bearer);
        match token {
            None => Ok(Self::unauthorized(ctx, "missing or malformed bearer token")),
            Some(t) if self.accepts(t) => {
                ctx.mark_bearer_authenticated();
                Ok(Verdict::Pass)
            }
            Some(_) => Ok(Self::unauthorized(ctx, "invalid bearer token")),
        }
    }
}

use super::{Gate, Verdict};
use crate::context::RequestContext;
use crate::exception::Exception;
use crate::param::{CSRF_FIELD, CSRF_HEADER};
use crate::pattern::ExemptionList;
use crate::util::constant_time_eq;

use log::warn;

/// CSRF 校验。
///
/// 以下情况跳过：已通过 Bearer 鉴权、功能关闭、安全方法（GET/HEAD/OPTIONS）、豁免路径。
/// 提交的令牌优先取请求体字段 `csrf_token`，其次取 `X-CSRF-Token` 请求头。
pub struct Csrf {
    enabled: bool,
    exempt: ExemptionList,
}

impl Csrf {
    pub fn from_config<S: AsRef<str>>(enabled: bool, exempt: &[S]) -> Result<Self, Exception> {
        Ok(Self {
            enabled,
            exempt: ExemptionList::compile(exempt)?,
        })
    }
}

impl Gate for Csrf {
    fn name(&self) -> &'static str {
        "csrf"
    }

    fn check(&self, ctx: &mut RequestContext) -> Result<Verdict, Exception> {
        if ctx.bearer_authenticated() || !self.enabled || ctx.method().is_safe() {
            return Ok(Verdict::Pass);
        }
        if self.exempt.matches(ctx.path()) {
            return Ok(Verdict::Pass);
        }

        let submitted = ctx
            .request()
            .body_param(CSRF_FIELD)
            .or_else(|| ctx.request().header(CSRF_HEADER).map(str::to_string));
        let expected = ctx.session_get(CSRF_FIELD);

        let valid = match (expected, submitted) {
            (Some(expected), Some(submitted)) => constant_time_eq(&expected, &submitted),
            _ => false,
        };
        if valid {
            return Ok(Verdict::Pass);
        }

        warn!(
            "[ID{}]CSRF 校验失败：{} {}",
            ctx.id(),
            ctx.method(),
            ctx.path()
        );
        Ok(Verdict::Reject(Exception::CsrfFailed))
    }
}

use super::{Gate, Verdict};
use crate::context::RequestContext;
use crate::exception::Exception;

const SECURITY_HEADERS: [(&str, &str); 3] = [
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "SAMEORIGIN"),
    ("X-XSS-Protection", "1; mode=block"),
];

/// 为每个响应添加固定的安全响应头。从不短路。
pub struct SecurityHeaders {
    enabled: bool,
}

impl SecurityHeaders {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Gate for SecurityHeaders {
    fn name(&self) -> &'static str {
        "security-headers"
    }

    fn check(&self, ctx: &mut RequestContext) -> Result<Verdict, Exception> {
        if self.enabled {
            for (name, value) in SECURITY_HEADERS {
                ctx.add_response_header(name, value);
            }
        }
        Ok(Verdict::Pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::HttpRequestMethod;
    use crate::request::Request;
    use crate::session::{MemorySessionStore, Session};
    use std::sync::Arc;

    fn context() -> RequestContext {
        RequestContext::new(
            0,
            Request::new(HttpRequestMethod::Get, "/"),
            Session::fresh(),
            Arc::new(MemorySessionStore::new()),
        )
    }

    #[test]
    fn test_enabled_adds_three_headers() {
        let mut ctx = context();
        let verdict = SecurityHeaders::new(true).check(&mut ctx).unwrap();
        assert!(matches!(verdict, Verdict::Pass));
        assert_eq!(ctx.response_headers().len(), 3);
        assert!(ctx
            .response_headers()
            .contains(&("X-Frame-Options".to_string(), "SAMEORIGIN".to_string())));
    }

    #[test]
    fn test_disabled_adds_nothing() {
        let mut ctx = context();
        SecurityHeaders::new(false).check(&mut ctx).unwrap();
        assert!(ctx.response_headers().is_empty());
    }
}

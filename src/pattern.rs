// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路径模式匹配
//!
//! 两种模式方言共用同一个正则引擎：
//! - **豁免规则**：`*` 展开为 `.*`，例如 `/api/public*`；
//! - **路由模式**：`:name` 段展开为捕获组 `([^/]+)`，例如 `/hello/:name`。
//!
//! 两者都锚定整个字符串（`^...$`），因此豁免规则是整串匹配而不是前缀匹配：
//! `/api/public*` 匹配 `/api/publicXYZ`，但不匹配 `/apiXpublic`。
//! 其余字符按原样交给正则引擎，非法模式在编译（注册）阶段即报错。

use crate::exception::Exception;

use lazy_static::lazy_static;
use log::error;
use regex::Regex;

lazy_static! {
    static ref PARAM_SEGMENT: Regex = Regex::new(r":[A-Za-z_][A-Za-z0-9_]*").unwrap();
}

fn compile_anchored(source: &str, expanded: &str) -> Result<Regex, Exception> {
    Regex::new(&format!("^{}$", expanded)).map_err(|e| {
        error!("无法编译路径模式 {}：{}", source, e);
        Exception::InvalidPattern(source.to_string())
    })
}

/// 已编译的豁免规则
#[derive(Debug, Clone)]
pub struct ExemptionPattern {
    source: String,
    regex: Regex,
}

impl ExemptionPattern {
    pub fn compile(pattern: &str) -> Result<Self, Exception> {
        let regex = compile_anchored(pattern, &pattern.replace('*', ".*"))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// 某一个网关的豁免规则集合
#[derive(Debug, Clone, Default)]
pub struct ExemptionList {
    rules: Vec<ExemptionPattern>,
}

impl ExemptionList {
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, Exception> {
        let rules = patterns
            .iter()
            .map(|p| ExemptionPattern::compile(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// 任意一条规则匹配即豁免
    pub fn matches(&self, path: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(path))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// 已编译的路由模式
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    regex: Regex,
}

impl RoutePattern {
    pub fn compile(pattern: &str) -> Result<Self, Exception> {
        let expanded = PARAM_SEGMENT.replace_all(pattern, "([^/]+)");
        let regex = compile_anchored(pattern, &expanded)?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// 按模式中出现的顺序返回捕获的参数；不匹配时返回 `None`
    pub fn extract(&self, path: &str) -> Option<Vec<String>> {
        let captures = self.regex.captures(path)?;
        Some(
            captures
                .iter()
                .skip(1)
                .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
                .collect(),
        )
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exemption_full_string_match() {
        let rule = ExemptionPattern::compile("/api/public*").unwrap();
        assert!(rule.matches("/api/public"));
        assert!(rule.matches("/api/publicXYZ"));
        assert!(rule.matches("/api/public/docs"));
        assert!(!rule.matches("/apiXpublic"));
        assert!(!rule.matches("/v1/api/public"));
    }

    #[test]
    fn test_literal_pattern_is_exact() {
        let rule = ExemptionPattern::compile("/webhook").unwrap();
        assert!(rule.matches("/webhook"));
        assert!(!rule.matches("/webhook/extra"));
        assert!(!rule.matches("/webhooks"));

        let route = RoutePattern::compile("/about").unwrap();
        assert!(route.matches("/about"));
        assert!(!route.matches("/about/team"));
        assert_eq!(route.extract("/about"), Some(vec![]));
    }

    #[test]
    fn test_route_extracts_in_order() {
        let route = RoutePattern::compile("/users/:user_id/posts/:post").unwrap();
        assert_eq!(
            route.extract("/users/42/posts/hello-world"),
            Some(vec!["42".to_string(), "hello-world".to_string()])
        );
        assert_eq!(route.extract("/users/42/posts"), None);
        assert_eq!(route.extract("/users/4/2/posts/x"), None);
    }

    #[test]
    fn test_hello_name() {
        let route = RoutePattern::compile("/hello/:name").unwrap();
        assert_eq!(route.extract("/hello/World"), Some(vec!["World".to_string()]));
    }

    #[test]
    fn test_malformed_pattern_rejected_at_compile() {
        assert_eq!(
            ExemptionPattern::compile("/api/(unclosed").unwrap_err(),
            Exception::InvalidPattern("/api/(unclosed".to_string())
        );
        assert!(RoutePattern::compile("/items/[:id").is_err());
        assert!(ExemptionList::compile(&["/ok*", "/bad("]).is_err());
    }

    #[test]
    fn test_exemption_list() {
        let list = ExemptionList::compile(&["/api/public*", "/health"]).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.matches("/health"));
        assert!(list.matches("/api/public/x"));
        assert!(!list.matches("/api/private"));
        assert!(!ExemptionList::default().matches("/anything"));
    }

    proptest! {
        /// 豁免规则 `prefix*` 与“整串以 prefix 开头”的判定一致，
        /// 但前面多出任何字符都不再匹配。
        #[test]
        fn prop_wildcard_suffix_is_anchored(
            prefix in "/[a-z]{1,8}",
            suffix in "[a-zA-Z0-9/]{0,12}",
            lead in "[A-Z]{1,4}",
        ) {
            let rule = ExemptionPattern::compile(&format!("{}*", prefix)).unwrap();
            let matching = format!("{}{}", prefix, suffix);
            let leading = format!("{}{}", lead, matching);
            prop_assert!(rule.matches(&matching));
            prop_assert!(!rule.matches(&leading));
        }

        /// 单参数路由可以还原出任意不含 `/` 的段
        #[test]
        fn prop_param_roundtrip(segment in "[a-zA-Z0-9_.~-]{1,16}") {
            let route = RoutePattern::compile("/item/:id").unwrap();
            let path = format!("/item/{}", segment);
            prop_assert_eq!(route.extract(&path), Some(vec![segment.clone()]));
        }
    }
}

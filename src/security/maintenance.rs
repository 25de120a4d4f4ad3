use crate::config::MaintenanceConfig;
use crate::response::Response;
use crate::util::HtmlBuilder;

use log::warn;
use std::fs;
use std::path::PathBuf;

/// 维护模式检查。
///
/// 标记文件存在时返回 503，并且在安全响应头之前执行：维护期间的响应不带安全头。
pub struct Maintenance {
    flag_file: PathBuf,
    page_file: Option<PathBuf>,
}

impl Maintenance {
    pub fn from_config(config: &MaintenanceConfig) -> Self {
        Self {
            flag_file: config.flag_file.clone(),
            page_file: config.page_file.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.flag_file.exists()
    }

    /// 处于维护模式时给出 503 响应
    pub fn check(&self) -> Option<Response> {
        if !self.is_active() {
            return None;
        }
        let custom = self.page_file.as_ref().and_then(|page| match fs::read_to_string(page) {
            Ok(html) => Some(html),
            Err(e) => {
                warn!("无法读取维护页面 {}：{}", page.display(), e);
                None
            }
        });
        let body = custom.unwrap_or_else(|| {
            HtmlBuilder::from_status_code(
                503,
                Some("<h2>维护中</h2><p>服务正在维护，请稍后再试。</p>"),
            )
            .build()
        });
        Some(Response::html(503, body).with_header("Retry-After", "300"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maintenance(dir: &std::path::Path, page: Option<PathBuf>) -> Maintenance {
        Maintenance::from_config(&MaintenanceConfig {
            flag_file: dir.join("maintenance.flag"),
            page_file: page,
        })
    }

    #[test]
    fn test_inactive_without_flag() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(maintenance(tmp.path(), None).check().is_none());
    }

    #[test]
    fn test_fallback_page() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("maintenance.flag"), "").unwrap();
        let response = maintenance(tmp.path(), None).check().unwrap();
        assert_eq!(response.status_code(), 503);
        assert!(response.body_str().contains("503"));
        assert!(response.header("X-Frame-Options").is_none());
    }

    #[test]
    fn test_custom_page() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("maintenance.flag"), "").unwrap();
        let page = tmp.path().join("down.html");
        fs::write(&page, "<p>back soon</p>").unwrap();

        let response = maintenance(tmp.path(), Some(page)).check().unwrap();
        assert_eq!(response.status_code(), 503);
        assert_eq!(response.body_str(), "<p>back soon</p>");
    }

    #[test]
    fn test_missing_custom_page_uses_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("maintenance.flag"), "").unwrap();
        let response = maintenance(tmp.path(), Some(tmp.path().join("nope.html")))
            .check()
            .unwrap();
        assert!(response.body_str().contains("<!DOCTYPE html>"));
    }
}

use crate::param::STATUS_CODES;

/// 状态页（404 / 500 / 503）的 HTML 构建器
pub struct HtmlBuilder {
    title: String,
    css: String,
    body: String,
}

impl HtmlBuilder {
    pub fn from_status_code(code: u16, note: Option<&str>) -> Self {
        let title = format!("{}", code);
        let css = r"
            body {
                width: 35em;
                margin: 0 auto;
                font-family: Tahoma, Verdana, Arial, sans-serif;
            }
            pre {
                white-space: pre-wrap;
                background: #f4f4f4;
                padding: 8px;
            }
            "
        .to_string();
        let description = match note {
            Some(n) => n,
            None => STATUS_CODES.get(&code).copied().unwrap_or("Unknown"),
        };
        let body = format!(
            r"
            <h1>{}</h1>
            <p>{}</p>
            ",
            code, description
        );
        Self { title, css, body }
    }

    /// 在正文末尾追加一段预格式化文本（已转义）
    pub fn push_pre(mut self, text: &str) -> Self {
        self.body
            .push_str(&format!("<pre>{}</pre>", escape_html(text)));
        self
    }

    pub fn build(&self) -> String {
        format!(
            r##"<!DOCTYPE html>
            <!-- 本页面由webframe自动生成 -->
            <html>
                <head>
                    <meta charset="utf-8">
                    <title>{}</title>
                    <style>{}</style>
                </head>
                <body>
                {}
                </body>
            </html>"##,
            self.title, self.css, self.body
        )
    }
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// 规范化请求路径：去掉末尾的 `/`，根路径 `/` 保持不变；空路径视为根路径。
pub fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// 常量时间字符串比较，耗时与两者首个不同字节的位置无关。
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 示例应用
//!
//! 演示路由参数、CSRF 表单、Bearer 鉴权接口以及数据库连接的几条路由，
//! 由 `main.rs` 挂载到分发器上。

use crate::db::{Connector, Database};
use crate::exception::Exception;
use crate::param::FRAMEWORK_NAME;
use crate::response::Response;
use crate::router::Router;
use crate::util::escape_html;

use serde_json::json;
use std::sync::Arc;

pub fn routes<C: Connector + 'static>(database: Arc<Database<C>>) -> Result<Router, Exception> {
    let mut router = Router::new();
    router
        .get("/", |_, _| {
            Ok(Response::html(
                200,
                "<h1>webframe</h1><p>试试 <a href=\"/hello/World\">/hello/World</a> 或 <a href=\"/form\">/form</a>。</p>",
            ))
        })?
        .get("/hello/:name", |_, params| {
            Ok(Response::text(200, format!("Hello, {}!", params[0])))
        })?
        .get("/api/status", |_, _| {
            Ok(Response::json(
                200,
                &json!({
                    "status": "ok",
                    "framework": FRAMEWORK_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                }),
            ))
        })?
        .get("/api/db", move |_, _| {
            database.connection()?;
            Ok(Response::json(200, &json!({ "database": "connected" })))
        })?
        .get("/form", |ctx, _| {
            let body = format!(
                r#"<form method="post" action="/submit">{}<input name="message"><button>提交</button></form>"#,
                ctx.csrf_field()
            );
            Ok(Response::html(200, body))
        })?
        .post("/submit", |ctx, _| {
            let message = ctx.input("message").unwrap_or_default();
            Ok(Response::html(
                200,
                format!("<p>已收到：{}</p>", escape_html(&message)),
            ))
        })?
        .get("/api/private", |ctx, _| {
            Ok(Response::json(
                200,
                &json!({ "authenticated": ctx.bearer_authenticated() }),
            ))
        })?
        .post("/api/echo", |ctx, _| {
            Ok(Response::json(200, &json!({ "echo": ctx.input("message") })))
        })?;
    Ok(router)
}

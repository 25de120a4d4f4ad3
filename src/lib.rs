// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

pub mod app;
pub mod batch;
pub mod config;
pub mod context;
pub mod db;
pub mod dispatcher;
pub mod exception;
pub mod logger;
pub mod param;
pub mod pattern;
pub mod request;
pub mod response;
pub mod router;
pub mod security;
pub mod server;
pub mod session;
pub mod util;

pub use batch::BatchRunner;
pub use config::Config;
pub use context::RequestContext;
pub use dispatcher::Dispatcher;
pub use exception::Exception;
pub use param::{HttpRequestMethod, HttpVersion};
pub use request::Request;
pub use response::Response;
pub use router::{Handler, Router};
pub use session::{MemorySessionStore, SessionStore};
pub use util::HtmlBuilder;

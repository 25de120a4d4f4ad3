// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 配置
//!
//! 所有字段都带有 serde 默认值，配置文件只需写出要覆盖的部分。
//! 配置在进程启动时构建一次，之后只读。

use crate::exception::Exception;

use log::{info, warn};
use serde_derive::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    server: ServerConfig,
    app: AppConfig,
    log: LogConfig,
    maintenance: MaintenanceConfig,
    security: SecurityConfig,
    session: SessionConfig,
    database: Option<DatabaseConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub local: bool,
    pub worker_threads: usize,
    /// 单个请求（报文头 + 请求体）允许的最大字节数
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 7878,
            local: true,
            worker_threads: num_cpus::get(),
            max_request_size: 1048576, // 1MB
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    /// 调试模式下 500 页面包含错误信息、位置与调用栈
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "webframe".to_string(),
            debug: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LogConfig {
    /// 按天切分的日志文件所在目录
    pub dir: PathBuf,
    pub level: String,
    /// 同时输出到控制台
    pub console: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            level: "info".to_string(),
            console: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// 该文件存在时所有请求返回 503
    pub flag_file: PathBuf,
    /// 自定义维护页面；文件不存在时使用内置页面
    pub page_file: Option<PathBuf>,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            flag_file: PathBuf::from("storage/maintenance.flag"),
            page_file: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SecurityConfig {
    pub headers_enabled: bool,
    pub csrf_enabled: bool,
    pub csrf_exempt: Vec<String>,
    pub bearer: BearerConfig,
    pub cors: CorsConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            headers_enabled: true,
            csrf_enabled: true,
            csrf_exempt: Vec::new(),
            bearer: BearerConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct BearerConfig {
    pub enabled: bool,
    pub tokens: Vec<String>,
    pub exempt: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allowed_origins: Vec<String>,
    pub exempt: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session_id".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub connect_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5432,
            name: String::new(),
            user: String::new(),
            password: String::new(),
            connect_timeout_ms: 3000,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let text = fs::read_to_string(filename).map_err(|e| {
            Exception::InvalidConfig(format!("无法读取配置文件 {}：{}", filename, e))
        })?;
        let config = Self::from_toml_str(&text)?;
        info!("配置文件 {} 已载入", filename);
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, Exception> {
        let mut config: Config =
            toml::from_str(text).map_err(|e| Exception::InvalidConfig(e.to_string()))?;
        if config.server.worker_threads == 0 {
            config.server.worker_threads = num_cpus::get();
        }
        if config.security.bearer.enabled && config.security.bearer.tokens.is_empty() {
            warn!("Bearer 鉴权已启用但没有配置任何令牌，所有非豁免请求都将被拒绝");
        }
        Ok(config)
    }

    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.security = security;
        self
    }

    pub fn with_maintenance(mut self, maintenance: MaintenanceConfig) -> Self {
        self.maintenance = maintenance;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.app.debug = debug;
        self
    }

    pub fn with_database(mut self, database: DatabaseConfig) -> Self {
        self.database = Some(database);
        self
    }
}

impl Config {
    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    pub fn log(&self) -> &LogConfig {
        &self.log
    }

    pub fn maintenance(&self) -> &MaintenanceConfig {
        &self.maintenance
    }

    pub fn security(&self) -> &SecurityConfig {
        &self.security
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    pub fn database(&self) -> Option<&DatabaseConfig> {
        self.database.as_ref()
    }
}

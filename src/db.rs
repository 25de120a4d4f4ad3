// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 数据库连接
//!
//! 框架不设计存储层，只负责按配置中的凭据建立一次连接并在整个进程生命周期内复用。
//! 第一次访问时才尝试连接，结果（无论成功还是失败）都会被记住，失败只记录一次日志。

use crate::config::DatabaseConfig;
use crate::exception::Exception;

use log::{error, info};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::OnceLock;
use std::time::Duration;

/// 建立连接的能力。测试中用 mock 替换
pub trait Connector: Send + Sync {
    type Connection: Send + Sync;

    fn connect(&self, config: &DatabaseConfig) -> Result<Self::Connection, Exception>;
}

/// 校验凭据后直接建立 TCP 连接
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Connection = TcpStream;

    fn connect(&self, config: &DatabaseConfig) -> Result<TcpStream, Exception> {
        if config.name.is_empty() || config.user.is_empty() {
            return Err(Exception::DatabaseUnavailable(
                "缺少数据库名称或用户名".to_string(),
            ));
        }
        let timeout = Duration::from_millis(config.connect_timeout_ms);
        let addrs = (config.host.as_str(), config.port)
            .to_socket_addrs()
            .map_err(|e| Exception::DatabaseUnavailable(format!("无法解析 {}：{}", config.host, e)))?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }
        Err(Exception::DatabaseUnavailable(match last_error {
            Some(e) => format!("无法连接到 {}:{}：{}", config.host, config.port, e),
            None => format!("{} 没有可用的地址", config.host),
        }))
    }
}

pub struct Database<C: Connector> {
    config: Option<DatabaseConfig>,
    connector: C,
    handle: OnceLock<Result<C::Connection, Exception>>,
}

impl<C: Connector> Database<C> {
    pub fn new(config: Option<DatabaseConfig>, connector: C) -> Self {
        Self {
            config,
            connector,
            handle: OnceLock::new(),
        }
    }

    /// 返回进程内唯一的连接；首次调用时建立
    pub fn connection(&self) -> Result<&C::Connection, Exception> {
        self.handle
            .get_or_init(|| {
                let result = match &self.config {
                    Some(config) => self.connector.connect(config),
                    None => Err(Exception::DatabaseUnavailable("未配置数据库".to_string())),
                };
                match &result {
                    Ok(_) => info!("数据库连接已建立"),
                    Err(e) => error!("{}", e),
                }
                result
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// 是否已经尝试过连接
    pub fn is_initialized(&self) -> bool {
        self.handle.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use std::net::TcpListener;

    mock! {
        pub Conn {}

        impl Connector for Conn {
            type Connection = u32;

            fn connect(&self, config: &DatabaseConfig) -> Result<u32, Exception>;
        }
    }

    fn credentials() -> DatabaseConfig {
        DatabaseConfig {
            name: "app".to_string(),
            user: "app".to_string(),
            password: "pw".to_string(),
            ..DatabaseConfig::default()
        }
    }

    #[test]
    fn test_connects_once_and_memoizes() {
        let mut connector = MockConn::new();
        connector.expect_connect().times(1).returning(|_| Ok(7));
        let db = Database::new(Some(credentials()), connector);

        assert!(!db.is_initialized());
        assert_eq!(db.connection(), Ok(&7));
        assert_eq!(db.connection(), Ok(&7));
        assert!(db.is_initialized());
    }

    #[test]
    fn test_failure_is_memoized() {
        let mut connector = MockConn::new();
        connector
            .expect_connect()
            .times(1)
            .returning(|_| Err(Exception::DatabaseUnavailable("refused".to_string())));
        let db = Database::new(Some(credentials()), connector);

        for _ in 0..3 {
            assert!(matches!(db.connection(), Err(Exception::DatabaseUnavailable(_))));
        }
    }

    #[test]
    fn test_missing_config_never_calls_connector() {
        let mut connector = MockConn::new();
        connector.expect_connect().never();
        let db = Database::new(None, connector);
        assert!(db.connection().is_err());
    }

    #[test]
    fn test_tcp_connector_requires_credentials() {
        let result = TcpConnector.connect(&DatabaseConfig::default());
        assert!(matches!(result, Err(Exception::DatabaseUnavailable(_))));
    }

    #[test]
    fn test_tcp_connector_reaches_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let config = DatabaseConfig {
            port: listener.local_addr().unwrap().port(),
            ..credentials()
        };
        let db = Database::new(Some(config), TcpConnector);
        assert!(db.connection().is_ok());
    }
}

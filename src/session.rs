// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 会话
//!
//! 会话存储被视为不透明的键值存储（[`SessionStore`]），框架只通过它按会话 ID 读写数据。
//! 每个请求持有一个 [`Session`] 句柄：首次访问时才从存储中加载，请求结束后由分发器决定是否写回。

use crate::param::CSRF_FIELD;

use log::debug;
use rand::RngCore;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

pub type SessionData = HashMap<String, String>;

/// 会话存储能力，由宿主注入分发器
pub trait SessionStore: Send + Sync {
    fn load(&self, id: &str) -> Option<SessionData>;
    fn save(&self, id: &str, data: &SessionData);
}

/// 默认最多保留的会话数
pub const DEFAULT_SESSION_CAPACITY: usize = 10_000;

/// 进程内的会话存储，适合单进程部署和测试。
///
/// 会话数超过容量时淘汰最早创建的会话。写回时按键合并，
/// 同一会话上并发请求写入同一个键时仍以最后写入为准。
pub struct MemorySessionStore {
    capacity: usize,
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    sessions: HashMap<String, SessionData>,
    order: VecDeque<String>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_SESSION_CAPACITY)
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(MemoryInner::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sessions
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, id: &str) -> Option<SessionData> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sessions
            .get(id)
            .cloned()
    }

    fn save(&self, id: &str, data: &SessionData) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(stored) = inner.sessions.get_mut(id) {
            stored.extend(data.iter().map(|(k, v)| (k.clone(), v.clone())));
            return;
        }
        while inner.sessions.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    debug!("会话数已达上限，淘汰会话 {}", oldest);
                    inner.sessions.remove(&oldest);
                }
                None => break,
            }
        }
        inner.order.push_back(id.to_string());
        inner.sessions.insert(id.to_string(), data.clone());
    }
}

/// 生成 `bytes` 字节的密码学随机值，以小写十六进制返回
pub fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{:02x}", b)).collect()
}

/// 单个请求持有的会话句柄
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    data: Option<SessionData>,
    is_new: bool,
    dirty: bool,
}

impl Session {
    /// 客户端携带了会话 Cookie；数据在首次访问时加载
    pub fn existing(id: &str) -> Self {
        Self {
            id: id.to_string(),
            data: None,
            is_new: false,
            dirty: false,
        }
    }

    /// 为没有会话 Cookie 的客户端分配新会话
    pub fn fresh() -> Self {
        Self {
            id: random_hex(16),
            data: Some(SessionData::new()),
            is_new: true,
            dirty: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn data(&mut self, store: &dyn SessionStore) -> &mut SessionData {
        let id = &self.id;
        self.data.get_or_insert_with(|| {
            debug!("加载会话 {}", id);
            store.load(id).unwrap_or_default()
        })
    }

    pub fn get(&mut self, store: &dyn SessionStore, key: &str) -> Option<String> {
        self.data(store).get(key).cloned()
    }

    pub fn set(&mut self, store: &dyn SessionStore, key: &str, value: &str) {
        self.data(store).insert(key.to_string(), value.to_string());
        self.dirty = true;
    }

    /// 返回会话中的 CSRF 令牌；不存在时生成一个 256 位随机令牌（64 个十六进制字符）并保存。
    ///
    /// 同一会话内多次调用总是返回同一个值，令牌不会轮换。
    pub fn csrf_token(&mut self, store: &dyn SessionStore) -> String {
        if let Some(token) = self.get(store, CSRF_FIELD) {
            return token;
        }
        let token = random_hex(32);
        self.set(store, CSRF_FIELD, &token);
        token
    }

    /// 有修改时写回存储
    pub fn persist(&self, store: &dyn SessionStore) {
        if let (true, Some(data)) = (self.dirty, &self.data) {
            store.save(&self.id, data);
        }
    }
}

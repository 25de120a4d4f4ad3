// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 批处理任务
//!
//! 进程不处于 HTTP 请求上下文时的入口：按名称查找并执行一个已注册的任务。
//! 任务列表在启动时注册一次，之后只读；列出任务时按注册顺序输出。

use crate::exception::{install_panic_hook, Exception};

use log::{error, info, warn};
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};

pub trait Job: Send + Sync {
    fn run(&self) -> Result<(), Exception>;
}

impl<F> Job for F
where
    F: Fn() -> Result<(), Exception> + Send + Sync,
{
    fn run(&self) -> Result<(), Exception> {
        self()
    }
}

#[derive(Default)]
pub struct BatchRunner {
    jobs: Vec<(String, Box<dyn Job>)>,
}

impl BatchRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册任务。同名任务会在原位置被替换，名称保持唯一。
    pub fn register<F>(&mut self, name: &str, job: F) -> &mut Self
    where
        F: Fn() -> Result<(), Exception> + Send + Sync + 'static,
    {
        match self.jobs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => {
                warn!("批处理任务 {} 被重复注册，旧任务已被替换", name);
                slot.1 = Box::new(job);
            }
            None => self.jobs.push((name.to_string(), Box::new(job))),
        }
        self
    }

    /// 按注册顺序列出任务名称
    pub fn names(&self) -> Vec<&str> {
        self.jobs.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// 执行任务并返回进程退出码。
    ///
    /// - 未给出任务名：列出所有任务，返回 0
    /// - 任务不存在：输出错误，返回 1
    /// - 任务出错或 panic：输出错误，返回 1
    pub fn run(&self, name: Option<&str>, out: &mut impl Write, err: &mut impl Write) -> i32 {
        let name = match name {
            Some(name) => name,
            None => {
                let _ = writeln!(out, "可用的批处理任务：");
                for job in self.names() {
                    let _ = writeln!(out, "  {}", job);
                }
                return 0;
            }
        };

        let job = match self.jobs.iter().find(|(n, _)| n == name) {
            Some((_, job)) => job,
            None => {
                let _ = writeln!(err, "未知的批处理任务：{}", name);
                return 1;
            }
        };

        install_panic_hook();
        info!("开始执行批处理任务 {}", name);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| job.run()))
            .unwrap_or_else(|payload| Err(Exception::from_panic(payload)));
        match outcome {
            Ok(()) => {
                info!("批处理任务 {} 执行完毕", name);
                0
            }
            Err(fault) => {
                error!(
                    "批处理任务 {} 失败：{}，位置：{}",
                    name,
                    fault,
                    fault.location().unwrap_or("unknown")
                );
                let _ = writeln!(err, "任务 {} 失败：{}", name, fault);
                1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn runner() -> BatchRunner {
        let mut runner = BatchRunner::new();
        runner
            .register("cleanup", || Ok(()))
            .register("broken", || Err(Exception::internal("disk full")))
            .register("explode", || panic!("job panicked"));
        runner
    }

    fn run(runner: &BatchRunner, name: Option<&str>) -> (i32, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = runner.run(name, &mut out, &mut err);
        (
            code,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_list_in_registration_order() {
        let (code, out, _) = run(&runner(), None);
        assert_eq!(code, 0);
        let cleanup = out.find("cleanup").unwrap();
        let broken = out.find("broken").unwrap();
        let explode = out.find("explode").unwrap();
        assert!(cleanup < broken && broken < explode);
    }

    #[test]
    fn test_unknown_job() {
        let (code, out, err) = run(&runner(), Some("missing"));
        assert_eq!(code, 1);
        assert!(out.is_empty());
        assert!(err.contains("missing"));
    }

    #[test]
    fn test_success_and_faults() {
        let runner = runner();
        assert_eq!(run(&runner, Some("cleanup")).0, 0);

        let (code, _, err) = run(&runner, Some("broken"));
        assert_eq!(code, 1);
        assert!(err.contains("disk full"));

        let (code, _, err) = run(&runner, Some("explode"));
        assert_eq!(code, 1);
        assert!(err.contains("job panicked"));
    }

    #[test]
    fn test_duplicate_name_replaces_in_place() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut runner = runner();
        runner.register("cleanup", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(runner.names(), vec!["cleanup", "broken", "explode"]);
        assert_eq!(run(&runner, Some("cleanup")).0, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

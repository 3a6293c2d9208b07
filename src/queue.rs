//! 候选子域名任务队列
//!
//! 无界FIFO，支持多生产者多消费者。每个入队的元素在 `task_done`
//! 之前都计为未完成；队列为空且没有未完成元素时视为彻底排空，
//! 所有等待中的消费者都会被唤醒并拿到 `None`。

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    items: VecDeque<String>,
    unfinished: usize,
}

#[derive(Debug, Default)]
pub struct TaskQueue {
    inner: Mutex<Inner>,
    notify: Notify,
    max_len: Option<usize>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 带长度上限的队列，超出上限的新元素会被丢弃
    pub fn with_max_len(max_len: Option<usize>) -> Self {
        TaskQueue {
            max_len,
            ..Self::default()
        }
    }

    /// 无条件入队
    pub fn push(&self, item: String) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.items.push_back(item);
            inner.unfinished += 1;
        }
        self.notify.notify_one();
    }

    /// 按上限入队，被丢弃时返回 false
    pub fn try_push(&self, item: String) -> bool {
        {
            let mut inner = match self.inner.lock() {
                Ok(inner) => inner,
                Err(_) => return false,
            };
            if let Some(max) = self.max_len {
                if inner.items.len() >= max {
                    return false;
                }
            }
            inner.items.push_back(item);
            inner.unfinished += 1;
        }
        self.notify.notify_one();
        true
    }

    pub fn extend<I: IntoIterator<Item = String>>(&self, items: I) {
        for item in items {
            self.push(item);
        }
    }

    /// 取出下一个元素；队列彻底排空后返回 `None`
    pub async fn pop(&self) -> Option<String> {
        loop {
            let notified = self.notify.notified();
            {
                let mut inner = self.inner.lock().ok()?;
                if let Some(item) = inner.items.pop_front() {
                    return Some(item);
                }
                if inner.unfinished == 0 {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// 标记一个已取出的元素处理完毕
    pub fn task_done(&self) {
        let drained = match self.inner.lock() {
            Ok(mut inner) => {
                inner.unfinished = inner.unfinished.saturating_sub(1);
                inner.unfinished == 0 && inner.items.is_empty()
            }
            Err(_) => true,
        };
        if drained {
            self.notify.notify_waiters();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 已入队但尚未 `task_done` 的数量（含正在处理的）
    pub fn unfinished(&self) -> usize {
        self.inner.lock().map(|inner| inner.unfinished).unwrap_or(0)
    }

    pub fn is_drained(&self) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.unfinished == 0 && inner.items.is_empty())
            .unwrap_or(true)
    }
}

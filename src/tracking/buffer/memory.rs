use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use super::{EventBuffer, normalize_range};
use crate::errors::Result;

/// 进程内缓冲区
///
/// 语义与 Redis 列表相同，但数据不跨进程、重启即丢失，适用于单实例部署和测试。
#[derive(Default)]
pub struct MemoryEventBuffer {
    lists: Mutex<HashMap<String, VecDeque<String>>>,
}

impl MemoryEventBuffer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventBuffer for MemoryEventBuffer {
    async fn push_head(&self, key: &str, payload: String) -> Result<()> {
        let mut lists = self.lists.lock();
        let list = lists.entry(key.to_string()).or_default();
        list.push_front(payload);
        trace!("MemoryEventBuffer: pushed to '{}', len={}", key, list.len());
        Ok(())
    }

    async fn range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let lists = self.lists.lock();
        let Some(list) = lists.get(key) else {
            return Ok(Vec::new());
        };

        Ok(match normalize_range(start, stop, list.len()) {
            Some((from, to)) => list.range(from..=to).cloned().collect(),
            None => Vec::new(),
        })
    }

    async fn trim(&self, key: &str, start: isize, stop: isize) -> Result<()> {
        let mut lists = self.lists.lock();
        let Some(list) = lists.get_mut(key) else {
            return Ok(());
        };

        match normalize_range(start, stop, list.len()) {
            Some((from, to)) => {
                list.truncate(to + 1);
                list.drain(..from);
            }
            None => {
                lists.remove(key);
            }
        }
        Ok(())
    }

    async fn backlog(&self, key: &str) -> Result<usize> {
        Ok(self.lists.lock().get(key).map_or(0, VecDeque::len))
    }

    fn buffer_type(&self) -> &'static str {
        "memory"
    }
}

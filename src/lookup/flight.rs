//! 按键合并的进行中请求（single-flight）
//!
//! 同一个键的并发未命中只会触发一次获取，所有等待者共享同一个结果（成功或失败）。
//! 获取在独立的 tokio 任务中运行：任一等待者放弃请求都不会取消获取本身。
//! 结果产生后条目立即移除，进程内不保留任何已完成状态。

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};

use super::error::LookupError;

type SharedFlight<T> = Shared<BoxFuture<'static, Result<T, LookupError>>>;

/// 调用方在本次获取中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightRole {
    /// 发起获取的一方
    Leader,
    /// 加入已有获取的一方
    Follower,
}

/// 按键合并的获取组
pub struct FlightGroup<K, T> {
    flights: Arc<DashMap<K, SharedFlight<T>>>,
}

impl<K, T> Default for FlightGroup<K, T>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            flights: Arc::new(DashMap::new()),
        }
    }
}

impl<K, T> FlightGroup<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前进行中的获取数量
    pub fn in_flight(&self) -> usize {
        self.flights.len()
    }

    /// 加入或发起 `key` 的获取
    ///
    /// 只有发起者的 `fetch` 会被调用；其余调用方直接等待同一个结果。
    pub async fn run<F, Fut>(&self, key: K, fetch: F) -> (FlightRole, Result<T, LookupError>)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, LookupError>> + Send + 'static,
    {
        let (role, flight) = match self.flights.entry(key.clone()) {
            Entry::Occupied(occupied) => (FlightRole::Follower, occupied.get().clone()),
            Entry::Vacant(vacant) => {
                let flights = Arc::clone(&self.flights);
                let task_key = key;
                let fetch = fetch();

                // 移除发生在任务内，而插入在持有本分片写锁期间完成，
                // 因此移除不可能早于插入
                let handle = tokio::spawn(async move {
                    let result = fetch.await;
                    flights.remove(&task_key);
                    result
                });

                let flight = async move {
                    match handle.await {
                        Ok(result) => result,
                        Err(e) => Err(LookupError::InternalError(format!("获取任务异常终止: {}", e))),
                    }
                }
                .boxed()
                .shared();

                vacant.insert(flight.clone());
                (FlightRole::Leader, flight)
            }
        };

        (role, flight.await)
    }
}

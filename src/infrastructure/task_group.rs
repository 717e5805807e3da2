//! 并行任务组 - 基础设施层
//!
//! 同时驱动一组命名的异步任务，全部成功后按名称返回结果；
//! 任意一个失败则整组失败，其余未完成的任务随之被丢弃。
//! 任务之间没有先后顺序保证。

use std::collections::HashMap;

use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use tracing::debug;

/// 并行任务组
pub struct TaskGroup<'a, T, E> {
    tasks: Vec<(String, BoxFuture<'a, Result<T, E>>)>,
}

impl<'a, T, E> TaskGroup<'a, T, E>
where
    T: Send + 'a,
    E: Send + 'a,
{
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// 添加一个命名任务，名称重复时后者覆盖前者的结果
    pub fn add<F>(&mut self, name: impl Into<String>, task: F)
    where
        F: std::future::Future<Output = Result<T, E>> + Send + 'a,
    {
        self.tasks.push((name.into(), task.boxed()));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// 并发执行所有任务
    pub async fn join(self) -> Result<TaskResults<T>, E> {
        debug!("并行执行 {} 个任务", self.tasks.len());

        let named = self
            .tasks
            .into_iter()
            .map(|(name, task)| async move { task.await.map(|value| (name, value)) });

        let results = try_join_all(named).await?;

        Ok(TaskResults {
            values: results.into_iter().collect(),
        })
    }
}

impl<'a, T, E> Default for TaskGroup<'a, T, E>
where
    T: Send + 'a,
    E: Send + 'a,
{
    fn default() -> Self {
        Self::new()
    }
}

/// 按任务名称索引的结果
#[derive(Debug)]
pub struct TaskResults<T> {
    values: HashMap<String, T>,
}

impl<T> TaskResults<T> {
    pub fn get(&self, name: &str) -> Option<&T> {
        self.values.get(name)
    }

    /// 取出某个任务的结果
    pub fn take(&mut self, name: &str) -> Option<T> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_keyed_by_name_regardless_of_finish_order() {
        let finished = Arc::new(Mutex::new(Vec::new()));
        let mut group: TaskGroup<'_, u32, String> = TaskGroup::new();

        for (name, delay, value) in [("slow", 40u64, 1u32), ("fast", 5, 2)] {
            let finished = finished.clone();
            group.add(name, async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                finished.lock().unwrap().push(name);
                Ok(value)
            });
        }

        let mut results = group.join().await.unwrap();
        assert_eq!(*finished.lock().unwrap(), vec!["fast", "slow"]);
        assert_eq!(results.take("slow"), Some(1));
        assert_eq!(results.take("fast"), Some(2));
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_first_failure_fails_group() {
        let mut group: TaskGroup<'_, u32, String> = TaskGroup::new();
        group.add("ok", async { Ok(1) });
        group.add("bad", async { Err("boom".to_string()) });

        let err = group.join().await.unwrap_err();
        assert_eq!(err, "boom");
    }

    #[tokio::test]
    async fn test_empty_group() {
        let group: TaskGroup<'_, u32, String> = TaskGroup::default();
        assert!(group.is_empty());
        let results = group.join().await.unwrap();
        assert_eq!(results.len(), 0);
    }
}

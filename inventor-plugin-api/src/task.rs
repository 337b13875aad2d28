//! Sequential task helpers

use std::future::Future;
use std::pin::Pin;

use crate::error::PluginError;

/// Boxed future, used to mix differently-typed tasks in one list
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A task that has not started yet
pub type TaskFactory<'a, T> = Box<dyn FnOnce() -> BoxFuture<'a, Result<T, PluginError>> + Send + 'a>;

/// Wrap an async closure as a [`TaskFactory`]
pub fn task<'a, T, F, Fut>(f: F) -> TaskFactory<'a, T>
where
    F: FnOnce() -> Fut + Send + 'a,
    Fut: Future<Output = Result<T, PluginError>> + Send + 'a,
{
    Box::new(move || Box::pin(f()))
}

/// Run tasks one after another.
///
/// Each factory is invoked only after the previous task has finished, so both
/// start order and result order follow the input order. The first error stops
/// the series; later tasks are never started.
pub async fn series_task<T, I, F, Fut>(tasks: I) -> Result<Vec<T>, PluginError>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, PluginError>>,
{
    let mut results = Vec::new();
    for task in tasks {
        results.push(task().await?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn logged(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> TaskFactory<'static, &'static str> {
        let log = log.clone();
        task(move || async move {
            log.lock().unwrap().push(format!("start {name}"));
            tokio::task::yield_now().await;
            log.lock().unwrap().push(format!("end {name}"));
            Ok(name)
        })
    }

    #[tokio::test]
    async fn test_series_starts_tasks_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let tasks = vec![logged(&log, "a"), logged(&log, "b"), logged(&log, "c")];

        let results = series_task(tasks).await.unwrap();

        assert_eq!(results, vec!["a", "b", "c"]);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["start a", "end a", "start b", "end b", "start c", "end c"]
        );
    }

    #[tokio::test]
    async fn test_series_stops_at_first_error() {
        let started = Arc::new(Mutex::new(Vec::new()));
        let s1 = started.clone();
        let s2 = started.clone();
        let s3 = started.clone();

        let tasks: Vec<TaskFactory<'_, u32>> = vec![
            task(move || async move {
                s1.lock().unwrap().push(1);
                Ok(1)
            }),
            task(move || async move {
                s2.lock().unwrap().push(2);
                Err(PluginError::custom("second failed"))
            }),
            task(move || async move {
                s3.lock().unwrap().push(3);
                Ok(3)
            }),
        ];

        let err = series_task(tasks).await.unwrap_err();
        assert_eq!(err.to_string(), "second failed");
        assert_eq!(*started.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_series_empty() {
        let tasks: Vec<TaskFactory<'_, ()>> = Vec::new();
        assert!(series_task(tasks).await.unwrap().is_empty());
    }
}

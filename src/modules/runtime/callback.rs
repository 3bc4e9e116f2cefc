//! Callback adapters
//!
//! Connector operations are futures. Callers that want completion callbacks
//! instead can wrap any of them with [`CallbackExt::with_callback`] or hand it
//! to [`spawn_with_callback`]; [`lift`] goes the other way and turns a
//! callback-taking operation into a future.

use cqlbridge_core::error::Result;
use cqlbridge_core::CqlError;
use std::future::Future;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Boxed completion callback
pub type Callback<T> = Box<dyn FnOnce(Result<T>) + Send>;

/// Completion-callback form of a fallible future
pub trait CallbackExt<T>: Future<Output = Result<T>> + Sized {
    /// Await the operation and pass its outcome to `callback`
    fn with_callback<F>(self, callback: F) -> impl Future<Output = ()>
    where
        F: FnOnce(Result<T>),
    {
        async move { callback(self.await) }
    }
}

impl<T, Fut> CallbackExt<T> for Fut where Fut: Future<Output = Result<T>> {}

/// Run `future` on the tokio runtime and report its outcome to `callback`
pub fn spawn_with_callback<T, Fut, F>(future: Fut, callback: F) -> JoinHandle<()>
where
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
    F: FnOnce(Result<T>) + Send + 'static,
{
    tokio::spawn(async move { callback(future.await) })
}

/// Turn a callback-taking operation into a future.
///
/// Fails with an internal error if the operation drops the callback without
/// calling it.
pub async fn lift<T, F>(operation: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(Callback<T>),
{
    let (tx, rx) = oneshot::channel();
    operation(Box::new(move |result| {
        let _ = tx.send(result);
    }));
    rx.await
        .map_err(|_| CqlError::Internal("Callback dropped without being called".to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::mock::MockTransport;
    use crate::connectors::CassandraConnector;
    use cqlbridge_core::ConnectorConfig;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn connector(mock: &MockTransport) -> Arc<CassandraConnector> {
        let config = ConnectorConfig::new(vec!["127.0.0.1:9042"]);
        Arc::new(CassandraConnector::with_transport(config, Arc::new(mock.clone())).unwrap())
    }

    #[tokio::test]
    async fn test_with_callback_receives_rows() {
        let mock = MockTransport::new();
        mock.push_rows(vec![serde_json::from_value(json!({ "release_version": "4.1.3" })).unwrap()]);
        let connector = connector(&mock);

        let received = Arc::new(Mutex::new(None));
        let sink = received.clone();
        connector
            .execute("SELECT release_version FROM system.local", &[])
            .with_callback(move |result| {
                *sink.lock().unwrap() = Some(result.map(|rows| rows.len()));
            })
            .await;

        assert!(matches!(*received.lock().unwrap(), Some(Ok(1))));
    }

    #[tokio::test]
    async fn test_with_callback_receives_error() {
        let mock = MockTransport::new();
        mock.push_error("Unavailable");
        let connector = connector(&mock);

        let received = Arc::new(Mutex::new(None));
        let sink = received.clone();
        connector
            .execute("SELECT * FROM t", &[])
            .with_callback(move |result| {
                *sink.lock().unwrap() = Some(result.map_err(|e| e.to_string()).map(|_| ()));
            })
            .await;

        assert_eq!(
            *received.lock().unwrap(),
            Some(Err("Transport error: Unavailable".to_string()))
        );
    }

    #[tokio::test]
    async fn test_spawn_with_callback() {
        let mock = MockTransport::new();
        let connector = connector(&mock);
        let (tx, rx) = oneshot::channel();

        let task = connector.clone();
        spawn_with_callback(async move { task.open().await }, move |result| {
            let _ = tx.send(result.is_ok());
        })
        .await
        .unwrap();

        assert!(rx.await.unwrap());
        assert!(connector.is_open().await);
    }

    #[tokio::test]
    async fn test_lift() {
        let value = lift(|callback: Callback<u32>| callback(Ok(42))).await.unwrap();
        assert_eq!(value, 42);

        let err = lift(|callback: Callback<u32>| {
            callback(Err(CqlError::Transport("refused".to_string())))
        })
        .await
        .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_lift_dropped_callback() {
        let err = lift(|callback: Callback<u32>| drop(callback)).await.unwrap_err();
        assert!(matches!(err, CqlError::Internal(_)));
    }
}

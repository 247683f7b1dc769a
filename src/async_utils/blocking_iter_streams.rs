//! Running blocking code without stalling the async executor.

use futures::{StreamExt as _, stream};

use super::BoxedStream;
use crate::prelude::*;

/// Turn a blocking iterator into a stream.
///
/// Each call to `next` runs on Tokio's blocking thread pool. The iterator is
/// moved into the blocking task and handed back with its item, so only one
/// `next` runs at a time and the iterator never needs to be `Sync`.
pub fn blocking_iter_stream<I, T>(iter: I) -> BoxedStream<Result<T>>
where
    I: Iterator<Item = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    stream::unfold(Some(iter), |iter| async move {
        let mut iter = iter?;
        match spawn_blocking_propagating_panics(move || (iter.next(), iter)).await {
            Ok((Some(item), iter)) => Some((item, Some(iter))),
            Ok((None, _)) => None,
            // The runtime is shutting down. Report it once, then stop.
            Err(err) => Some((Err(err), None)),
        }
    })
    .boxed()
}

/// Wrapper around [`tokio::task::spawn_blocking`] that propagates panics from
/// the background task.
pub async fn spawn_blocking_propagating_panics<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(value) => Ok(value),
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(err) => Err(anyhow!("blocking task was cancelled: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt as _;

    use super::*;

    #[tokio::test]
    async fn stream_yields_every_item_in_order() -> Result<()> {
        let iter = (1..=3).map(Ok::<_, anyhow::Error>);
        let items = blocking_iter_stream(iter).try_collect::<Vec<_>>().await?;
        assert_eq!(items, vec![1, 2, 3]);
        Ok(())
    }

    #[tokio::test]
    async fn errors_are_passed_through() {
        let iter = vec![Ok(1), Err(anyhow!("bad page"))].into_iter();
        let items = blocking_iter_stream(iter).collect::<Vec<_>>().await;
        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());
    }

    #[tokio::test]
    #[should_panic(expected = "kaboom")]
    async fn panics_propagate() {
        let _ = spawn_blocking_propagating_panics(|| -> u32 { panic!("kaboom") }).await;
    }
}

//! The subscriber-side handler trait.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::error::HandlerError;
use crate::event::Event;

/// A callback registered with the bus for a topic.
///
/// Implementations capture the component state they need (usually a cheap
/// `Clone` of the owning service) so each subscription carries exactly the
/// data it uses and nothing else.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Processes one delivered event.
    ///
    /// Errors are caught at the bus boundary; they never cancel sibling
    /// handlers or reach the publisher.
    async fn handle(&self, event: &Event) -> Result<(), HandlerError>;
}

struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F> EventHandler for FnHandler<F>
where
    F: Fn(Event) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync,
{
    async fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        (self.f)(event.clone()).await
    }
}

/// Wraps an async closure as an [`EventHandler`].
///
/// Handy for tests and small consumers that do not warrant a named type.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn EventHandler>
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler {
        f: move |event: Event| f(event).boxed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_handler_fn_invokes_closure() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let handler = handler_fn(move |event: Event| {
            let seen = Arc::clone(&seen_clone);
            async move {
                seen.lock().unwrap().push(event.topic);
                Ok(())
            }
        });

        let event = Event::new("order:created", serde_json::json!({}));
        handler.handle(&event).await.unwrap();

        assert_eq!(seen.lock().unwrap().as_slice(), ["order:created"]);
    }
}

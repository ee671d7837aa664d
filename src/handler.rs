use async_trait::async_trait;

use crate::message::Message;

/// Business logic invoked once per consumed message.
///
/// The hosted consumer awaits each call before retrieving the next record and
/// never retries. Returning an error (or panicking) stops the consumer and
/// requests shutdown of the host, so any retry policy belongs inside the
/// handler.
#[async_trait]
pub trait MessageHandler<K, V>: Send + Sync + 'static {
    async fn on_message(&self, message: &Message<K, V>) -> anyhow::Result<()>;
}

/// Adapts a synchronous closure into a [`MessageHandler`].
///
/// ```rust
/// use kafka_hosting::{handler_fn, Message};
///
/// let handler = handler_fn(|msg: &Message<String, String>| {
///     println!("{} => {}", msg.key, msg.value);
///     Ok(())
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<K, V, F>(f: F) -> HandlerFn<F>
where
    F: Fn(&Message<K, V>) -> anyhow::Result<()>,
{
    HandlerFn(f)
}

pub struct HandlerFn<F>(F);

#[async_trait]
impl<K, V, F> MessageHandler<K, V> for HandlerFn<F>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
    F: Fn(&Message<K, V>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    async fn on_message(&self, message: &Message<K, V>) -> anyhow::Result<()> {
        (self.0)(message)
    }
}

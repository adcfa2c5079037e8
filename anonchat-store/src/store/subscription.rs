use anonchat_core::SubscriptionId;
use tokio::sync::mpsc;

type CancelHook = Box<dyn FnOnce() + Send + Sync>;

/// Independently cancellable stream of store notifications.
///
/// Once cancelled (explicitly or by drop) the channel is closed, so a store
/// can no longer deliver anything into a torn-down session.
pub struct Subscription<T> {
    id: SubscriptionId,
    rx: mpsc::UnboundedReceiver<T>,
    on_cancel: Option<CancelHook>,
}

impl<T> Subscription<T> {
    pub fn new(id: SubscriptionId, rx: mpsc::UnboundedReceiver<T>) -> Self {
        Self {
            id,
            rx,
            on_cancel: None,
        }
    }

    /// Run `hook` once when the subscription is cancelled or dropped.
    pub fn with_cancel_hook<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        self.on_cancel = Some(Box::new(hook));
        self
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next notification, or `None` once the store side has gone away.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`Subscription::next`].
    pub fn try_next(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Stop receiving. Same as dropping the subscription.
    pub fn cancel(self) {
        drop(self);
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(hook) = self.on_cancel.take() {
            hook();
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

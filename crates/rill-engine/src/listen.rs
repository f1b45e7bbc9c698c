//! Subscription tokens.

/// Handle for a registered listener. Dropping the token unregisters the
/// listener; [`Subscription::detach`] leaves it registered for the
/// lifetime of its scope.

pub struct Subscription {
    unlisten: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new(unlisten: impl FnOnce() + Send + 'static) -> Subscription {
        Subscription {
            unlisten: Some(Box::new(unlisten)),
        }
    }

    /// Unregister now rather than at drop time.
    pub fn cancel(mut self) {
        if let Some(unlisten) = self.unlisten.take() {
            unlisten();
        }
    }

    /// Keep the listener registered after the token is dropped.
    pub fn detach(mut self) {
        self.unlisten = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unlisten) = self.unlisten.take() {
            unlisten();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unlisten.is_some())
            .finish()
    }
}

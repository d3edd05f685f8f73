//! Opaque preview surface handle.

use std::any::Any;
use std::fmt;

/// Whatever the host renders the preview into (an iframe id, a window, a
/// socket). Set by the host, never created or destroyed by the engine.
pub struct PreviewSurface {
    name: String,
    inner: Box<dyn Any + Send + Sync>,
}

impl PreviewSurface {
    pub fn new<T: Any + Send + Sync>(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            inner: Box::new(value),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }
}

impl fmt::Debug for PreviewSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewSurface")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

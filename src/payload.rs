//! The embedded server payload: props resolved during the server
//! render pass, serialized into the delivered page, and handed back to
//! the lifecycle wrapper during hydration.
//!
//! Rather than reaching for an ambient global, the payload is an
//! explicit object with defined ownership: the server rendering entry
//! point builds one (see [`resolve_to_payload`](
//! crate::fetch::resolve_to_payload)), serializes it with
//! [`to_json`](ServerPayload::to_json), and the hydration entry point
//! reconstructs it with [`from_json`](ServerPayload::from_json) and
//! [`provide`](ServerPayload::provide)s it before mounting.  Each
//! wrapper instance then consumes its own entry at most once.

use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use leptos::context::{provide_context, use_context};

use crate::props::PropMap;

/// Props per component display name, produced once at server render
/// time and read back during hydration.
#[derive(Clone, Default)]
pub struct ServerPayload {
    inner: Arc<RwLock<IndexMap<String, PropMap>>>,
}

impl ServerPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstruct a payload from the JSON embedded in the page.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            inner: Arc::new(RwLock::new(serde_json::from_str(raw)?)),
        })
    }

    /// Serialize the current entries for embedding into the page.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&*self.inner.read().expect("payload lock poisoned"))
    }

    /// Record the resolved props for a component name.
    pub fn insert(&self, name: impl Into<String>, props: PropMap) {
        self.inner
            .write()
            .expect("payload lock poisoned")
            .insert(name.into(), props);
    }

    /// Look up an entry without consuming it.  This is the server
    /// render path, where the same payload is later serialized for the
    /// client and must stay intact.
    pub fn get(&self, name: &str) -> Option<PropMap> {
        self.inner
            .read()
            .expect("payload lock poisoned")
            .get(name)
            .cloned()
    }

    /// Consume an entry.  This is the hydration path; a second take
    /// for the same name returns `None`, so a re-parameterized
    /// instance falls through to a fresh fetch.
    pub fn take(&self, name: &str) -> Option<PropMap> {
        self.inner
            .write()
            .expect("payload lock poisoned")
            .shift_remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("payload lock poisoned").is_empty()
    }

    /// Place this payload into the reactive context so that wrappers
    /// further down the view tree can find it.
    pub fn provide(self) {
        provide_context(self);
    }

    /// Acquire a handle to a possibly provided payload.
    ///
    /// This goes through `use_context` underneath, so call it at the
    /// component's top level.  A handle is always returned; when no
    /// payload was provided every lookup through it simply misses,
    /// which sends the wrapper down its re-fetch path.  This keeps
    /// components loosely coupled to the payload the same way they
    /// would be to an embedded page state that never materialized.
    pub fn handle() -> PayloadHandle {
        PayloadHandle {
            inner: use_context::<ServerPayload>(),
        }
    }
}

/// A handle to a possibly available [`ServerPayload`].
#[derive(Clone)]
pub struct PayloadHandle {
    inner: Option<ServerPayload>,
}

impl PayloadHandle {
    pub fn get(&self, name: &str) -> Option<PropMap> {
        self.inner.as_ref().and_then(|payload| payload.get(name))
    }

    pub fn take(&self, name: &str) -> Option<PropMap> {
        self.inner.as_ref().and_then(|payload| payload.take(name))
    }
}

mod debug {
    use super::*;
    use std::fmt;

    impl fmt::Debug for ServerPayload {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let entries = self.inner.read().expect("payload lock poisoned");
            f.debug_struct("ServerPayload")
                .field("components", &entries.keys().collect::<Vec<_>>())
                .finish()
        }
    }

    impl fmt::Debug for PayloadHandle {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("PayloadHandle")
                .field("inner", &self.inner)
                .finish()
        }
    }
}

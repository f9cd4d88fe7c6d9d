//! Typed side-channel carried by [`ClientOptions`](crate::ClientOptions).
//!
//! The bag is keyed by marker *types* rather than strings. Each concern
//! declares a zero-size marker implementing [`ContextKey`]; keeping that
//! marker private gives the declaring module exclusive access to its entry,
//! so unrelated modules can never collide.
//!
//! ```ignore
//! struct RetryBudgetKey;
//!
//! impl ContextKey for RetryBudgetKey {
//!     type Value = u32;
//! }
//!
//! let mut ctx = Context::new();
//! ctx.insert::<RetryBudgetKey>(3);
//! assert_eq!(ctx.get::<RetryBudgetKey>(), Some(&3));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Marker type identifying one entry of the side-channel
pub trait ContextKey: 'static {
  /// Payload stored under this key
  type Value: Send + Sync + 'static;
}

/// Extensible key/value bag attached to a configuration object
///
/// Values are reference counted, so cloning the bag never copies payloads.
/// Entries are never removed; inserting under an existing key replaces it.
#[derive(Clone, Default)]
pub struct Context {
  entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Context {
  pub fn new() -> Self {
    Self::default()
  }

  /// Store `value` under `K`, replacing any previous value
  pub fn insert<K: ContextKey>(&mut self, value: K::Value) {
    self.entries.insert(TypeId::of::<K>(), Arc::new(value));
  }

  /// Look up the value stored under `K`
  pub fn get<K: ContextKey>(&self) -> Option<&K::Value> {
    self
      .entries
      .get(&TypeId::of::<K>())
      .and_then(|value| value.downcast_ref::<K::Value>())
  }

  pub fn contains<K: ContextKey>(&self) -> bool {
    self.entries.contains_key(&TypeId::of::<K>())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl fmt::Debug for Context {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Context")
      .field("entries", &self.entries.len())
      .finish()
  }
}

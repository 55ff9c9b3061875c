//! Keyed pub/sub state container.
//!
//! Decouples the sync engine and playback façade from presentation code:
//! writers `set` JSON values under string keys, readers `subscribe` and get
//! called synchronously, in registration order, before `set` returns.
//! Dotted keys (`"audio.currentTime"`) address nested objects and also
//! notify subscribers of the root key, so coarse listeners need not know
//! leaf paths.
//!
//! No lock is held while callbacks run, so a callback may re-enter the
//! store.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

type Callback = Arc<dyn Fn(&Value) + Send + Sync>;

struct Subscriber {
    id: u64,
    callback: Callback,
}

#[derive(Default)]
struct Shared {
    data: Mutex<Map<String, Value>>,
    subscribers: Mutex<HashMap<String, Vec<Subscriber>>>,
    next_id: AtomicU64,
}

#[derive(Clone, Default)]
pub struct Store {
    shared: Arc<Shared>,
}

/// Handle returned by [`Store::subscribe`]. Unsubscribing is idempotent and
/// safe after the key has stopped being written.
pub struct Subscription {
    shared: Weak<Shared>,
    key: String,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let mut subscribers = shared.subscribers.lock().expect("store lock");
        if let Some(list) = subscribers.get_mut(&self.key) {
            list.retain(|s| s.id != self.id);
        }
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value at `key`, following dotted segments into nested objects.
    pub fn get(&self, key: &str) -> Option<Value> {
        let data = self.shared.data.lock().expect("store lock");
        let mut segments = key.split('.');
        let root = segments.next()?;
        let mut current = data.get(root)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current.clone())
    }

    /// Write `value` at `key` (last-write-wins) and synchronously notify
    /// subscribers of the key, then of its root, before returning.
    pub fn set(&self, key: &str, value: Value) {
        let root_key = key.split('.').next().unwrap_or(key).to_string();
        let root_value = {
            let mut data = self.shared.data.lock().expect("store lock");
            let mut segments: Vec<&str> = key.split('.').collect();
            let leaf = segments.pop().unwrap_or(key);
            if segments.is_empty() {
                data.insert(leaf.to_string(), value.clone());
            } else {
                let mut current = ensure_object(&mut data, segments[0]);
                for segment in &segments[1..] {
                    current = ensure_nested_object(current, segment);
                }
                current.insert(leaf.to_string(), value.clone());
            }
            data.get(&root_key).cloned()
        };
        self.notify(key, &value, &root_key, root_value.as_ref());
    }

    /// Shallow-merge an object `patch` into the object at `key`, then
    /// notify. Non-object existing values are replaced.
    pub fn merge(&self, key: &str, patch: Value) {
        let Value::Object(patch) = patch else {
            self.set(key, patch);
            return;
        };
        let merged = {
            let mut data = self.shared.data.lock().expect("store lock");
            let target = ensure_object(&mut data, key);
            for (field, value) in patch {
                target.insert(field, value);
            }
            Value::Object(target.clone())
        };
        self.notify(key, &merged, key, Some(&merged));
    }

    /// Shallow-merge a patch into the `"audio"` object and notify. The
    /// playback façade owns this key; other writers should patch, not
    /// replace, so they never clobber transport state.
    pub fn update_audio_state(&self, patch: Value) {
        self.merge("audio", patch);
    }

    /// Register `callback` for changes to `key`. Multiple subscribers per
    /// key fire in registration order.
    pub fn subscribe<F>(&self, key: &str, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let mut subscribers = self.shared.subscribers.lock().expect("store lock");
        subscribers
            .entry(key.to_string())
            .or_default()
            .push(Subscriber {
                id,
                callback: Arc::new(callback),
            });
        Subscription {
            shared: Arc::downgrade(&self.shared),
            key: key.to_string(),
            id,
        }
    }

    fn notify(&self, key: &str, value: &Value, root_key: &str, root_value: Option<&Value>) {
        for callback in self.callbacks_for(key) {
            callback(value);
        }
        if root_key != key {
            if let Some(root_value) = root_value {
                for callback in self.callbacks_for(root_key) {
                    callback(root_value);
                }
            }
        }
    }

    fn callbacks_for(&self, key: &str) -> Vec<Callback> {
        let subscribers = self.shared.subscribers.lock().expect("store lock");
        subscribers
            .get(key)
            .map(|list| list.iter().map(|s| Arc::clone(&s.callback)).collect())
            .unwrap_or_default()
    }
}

fn ensure_object<'a>(data: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let entry = data
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    entry.as_object_mut().expect("just made an object")
}

fn ensure_nested_object<'a>(
    parent: &'a mut Map<String, Value>,
    key: &str,
) -> &'a mut Map<String, Value> {
    ensure_object(parent, key)
}

//! In-memory cluster for testing
//!
//! Behaves like an API server closely enough for the lifecycle code:
//! server-populated metadata, field manager conflicts and finalizers that
//! delay deletion.

use async_trait::async_trait;
use crdprov_core::{CrdKind, DeletionPropagation, ObjectRef};
use serde_json::{Value as JsonValue, json};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{ApplyOptions, ClusterBackend, manifest_ref};
use crate::error::{KubeError, Result};

/// Storage key: kind -> id
type Key = (String, String);

#[derive(Debug, Clone)]
struct StoredObject {
    object: JsonValue,
    field_manager: String,
    /// Reads left before a deleted object disappears
    terminating: Option<usize>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub applies: usize,
    pub gets: usize,
    pub deletes: usize,
}

#[derive(Debug, Default)]
struct MockState {
    objects: HashMap<Key, StoredObject>,
    operations: OperationCounts,
    deletion_delay: usize,
    last_propagation: Option<DeletionPropagation>,
    next_uid: u64,
    resource_version: u64,
}

/// In-memory cluster backend
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<RwLock<MockState>>,
}

fn key(kind: &CrdKind, target: &ObjectRef) -> Key {
    (kind.kind.to_string(), target.id())
}

/// Fields a field manager owns when it applies an object
fn owned_content(object: &JsonValue) -> JsonValue {
    json!({
        "labels": object.pointer("/metadata/labels"),
        "annotations": object.pointer("/metadata/annotations"),
        "spec": object.get("spec"),
    })
}

impl MockBackend {
    /// Create a new empty mock cluster
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep deleted objects visible for `reads` more reads, like a finalizer would
    pub fn with_deletion_delay(self, reads: usize) -> Self {
        self.write().deletion_delay = reads;
        self
    }

    /// Store an object as if another client created it
    pub fn insert(&self, kind: &CrdKind, object: JsonValue, field_manager: &str) {
        let Some(target) = manifest_ref(&object) else {
            return;
        };
        let mut state = self.write();
        let stamped = state.stamp(None, object);
        state.objects.insert(
            key(kind, &target),
            StoredObject {
                object: stamped,
                field_manager: field_manager.to_string(),
                terminating: None,
            },
        );
    }

    /// Set the `status` sub-resource, as a controller would
    pub fn set_status(&self, kind: &CrdKind, target: &ObjectRef, status: JsonValue) {
        let mut state = self.write();
        if let Some(stored) = state.objects.get_mut(&key(kind, target))
            && let Some(obj) = stored.object.as_object_mut()
        {
            obj.insert("status".into(), status);
        }
    }

    /// Current object, bypassing operation counting
    pub fn object(&self, kind: &CrdKind, target: &ObjectRef) -> Option<JsonValue> {
        self.read()
            .objects
            .get(&key(kind, target))
            .map(|s| s.object.clone())
    }

    /// Field manager of the last apply
    pub fn field_manager(&self, kind: &CrdKind, target: &ObjectRef) -> Option<String> {
        self.read()
            .objects
            .get(&key(kind, target))
            .map(|s| s.field_manager.clone())
    }

    pub fn len(&self) -> usize {
        self.read().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.read().operations.clone()
    }

    /// Reset operation counts
    pub fn reset_counts(&self) {
        self.write().operations = OperationCounts::default();
    }

    /// Propagation policy of the last delete
    pub fn last_propagation(&self) -> Option<DeletionPropagation> {
        self.read().last_propagation
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MockState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MockState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl MockState {
    /// Populate server-side metadata, keeping it stable across applies
    fn stamp(&mut self, previous: Option<&JsonValue>, mut object: JsonValue) -> JsonValue {
        self.resource_version += 1;

        let uid = match previous.and_then(|p| p.pointer("/metadata/uid")) {
            Some(uid) => uid.clone(),
            None => {
                self.next_uid += 1;
                JsonValue::String(format!("00000000-0000-0000-0000-{:012}", self.next_uid))
            }
        };

        let generation = match previous {
            Some(prev) => {
                let prev_generation = prev
                    .pointer("/metadata/generation")
                    .and_then(JsonValue::as_u64)
                    .unwrap_or(1);
                if prev.get("spec") == object.get("spec") {
                    prev_generation
                } else {
                    prev_generation + 1
                }
            }
            None => 1,
        };

        if let Some(status) = previous.and_then(|p| p.get("status"))
            && let Some(obj) = object.as_object_mut()
        {
            obj.insert("status".into(), status.clone());
        }

        if let Some(meta) = object
            .get_mut("metadata")
            .and_then(JsonValue::as_object_mut)
        {
            meta.insert("uid".into(), uid);
            meta.insert(
                "resourceVersion".into(),
                JsonValue::String(self.resource_version.to_string()),
            );
            meta.insert("generation".into(), JsonValue::from(generation));
        }

        object
    }
}

#[async_trait]
impl ClusterBackend for MockBackend {
    async fn apply(
        &self,
        kind: &CrdKind,
        object: &JsonValue,
        options: &ApplyOptions,
    ) -> Result<JsonValue> {
        let target = manifest_ref(object).ok_or_else(|| {
            KubeError::InvalidConfig(format!("{} manifest missing metadata.name", kind.kind))
        })?;
        let key = key(kind, &target);

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.operations.applies += 1;

        let previous = state.objects.get(&key).cloned();
        if let Some(prev) = &previous
            && prev.field_manager != options.field_manager
            && !options.force
            && owned_content(&prev.object) != owned_content(object)
        {
            return Err(KubeError::Conflict {
                kind: kind.kind.to_string(),
                id: target.id(),
                message: format!(
                    "Apply failed with 1 conflict: conflict with \"{}\"",
                    prev.field_manager
                ),
            });
        }

        let stamped = state.stamp(previous.as_ref().map(|p| &p.object), object.clone());
        state.objects.insert(
            key,
            StoredObject {
                object: stamped.clone(),
                field_manager: options.field_manager.clone(),
                terminating: previous.and_then(|p| p.terminating),
            },
        );

        Ok(stamped)
    }

    async fn get(&self, kind: &CrdKind, target: &ObjectRef) -> Result<Option<JsonValue>> {
        let key = key(kind, target);
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.operations.gets += 1;

        let Some(stored) = state.objects.get_mut(&key) else {
            return Ok(None);
        };

        let terminating = stored.terminating;
        match terminating {
            Some(0) => {
                state.objects.remove(&key);
                Ok(None)
            }
            Some(left) => {
                stored.terminating = Some(left - 1);
                Ok(Some(stored.object.clone()))
            }
            None => Ok(Some(stored.object.clone())),
        }
    }

    async fn delete(
        &self,
        kind: &CrdKind,
        target: &ObjectRef,
        propagation: DeletionPropagation,
    ) -> Result<bool> {
        let key = key(kind, target);
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.operations.deletes += 1;
        state.last_propagation = Some(propagation);

        let delay = state.deletion_delay;
        let Some(stored) = state.objects.get_mut(&key) else {
            return Ok(false);
        };

        if delay == 0 {
            state.objects.remove(&key);
        } else if stored.terminating.is_none() {
            stored.terminating = Some(delay);
            if let Some(meta) = stored
                .object
                .get_mut("metadata")
                .and_then(JsonValue::as_object_mut)
            {
                meta.insert(
                    "deletionTimestamp".into(),
                    JsonValue::String("1970-01-01T00:00:00Z".into()),
                );
            }
        }

        Ok(true)
    }
}

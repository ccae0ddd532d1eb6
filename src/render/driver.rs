//! Keyed enter/update/exit reconciliation.

use std::collections::BTreeMap;

use super::scene::{SceneKey, SceneNode, SceneTarget};

/// Mutations issued by one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MutationCount {
    /// Nodes entered.
    pub entered: usize,
    /// Nodes updated.
    pub updated: usize,
    /// Nodes exited.
    pub exited: usize,
}

impl MutationCount {
    /// Whether the pass touched the scene at all.
    pub fn is_empty(&self) -> bool {
        self.entered == 0 && self.updated == 0 && self.exited == 0
    }
}

/// Remembers what was last pushed to a scene target and sends only the diff.
#[derive(Debug, Default)]
pub struct RenderDriver {
    rendered: BTreeMap<SceneKey, SceneNode>,
}

impl RenderDriver {
    /// Create a driver with nothing rendered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the rendered state, e.g. after the target was replaced.
    pub fn forget(&mut self) {
        self.rendered.clear();
    }

    /// Number of nodes the driver believes are in the target.
    pub fn rendered_len(&self) -> usize {
        self.rendered.len()
    }

    /// Reconcile `desired` against the last rendered state.
    ///
    /// Calling this twice with the same input issues no mutations the second
    /// time.
    pub fn reconcile(
        &mut self,
        desired: BTreeMap<SceneKey, SceneNode>,
        target: &mut dyn SceneTarget,
    ) -> MutationCount {
        let mut count = MutationCount::default();

        let stale: Vec<SceneKey> = self
            .rendered
            .keys()
            .filter(|key| !desired.contains_key(*key))
            .cloned()
            .collect();
        for key in stale {
            target.exit(&key);
            self.rendered.remove(&key);
            count.exited += 1;
        }

        for (key, node) in desired {
            match self.rendered.get(&key) {
                None => {
                    target.enter(key.clone(), node.clone());
                    self.rendered.insert(key, node);
                    count.entered += 1;
                }
                Some(previous) if *previous != node => {
                    target.update(&key, node.clone());
                    self.rendered.insert(key, node);
                    count.updated += 1;
                }
                Some(_) => {}
            }
        }

        tracing::trace!(
            entered = count.entered,
            updated = count.updated,
            exited = count.exited,
            "scene reconciled"
        );
        count
    }
}

//! Alternating-pair rotation state.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ministry_entity::formation::PairMember;

/// Last choice made for one rotation key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationChoice {
    /// Pair member currently selected.
    pub selected: PairMember,
    /// Entity the selection was made for.
    pub last_entity_id: String,
}

/// Process-lifetime record of pair choices, keyed by rotation key.
///
/// Repeat requests for the same entity get the same member back; the first
/// request for a different entity flips to the other member. A key that
/// was never seen starts at [`PairMember::First`].
#[derive(Debug, Default)]
pub struct RotationState {
    choices: Mutex<HashMap<String, RotationChoice>>,
}

impl RotationState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the pair member for `entity_id` under `key`, persisting the choice.
    pub fn choose(&self, key: &str, entity_id: &str) -> PairMember {
        let mut choices = self.choices.lock().unwrap_or_else(|e| e.into_inner());

        match choices.get_mut(key) {
            Some(choice) if choice.last_entity_id == entity_id => choice.selected,
            Some(choice) => {
                choice.selected = choice.selected.other();
                choice.last_entity_id = entity_id.to_string();
                debug!(key, entity_id, selected = ?choice.selected, "Rotation flipped");
                choice.selected
            }
            None => {
                let selected = PairMember::default();
                choices.insert(
                    key.to_string(),
                    RotationChoice {
                        selected,
                        last_entity_id: entity_id.to_string(),
                    },
                );
                debug!(key, entity_id, ?selected, "Rotation started");
                selected
            }
        }
    }

    /// The stored choice for `key`, without changing it.
    pub fn peek(&self, key: &str) -> Option<RotationChoice> {
        self.choices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// Forget every stored choice.
    pub fn reset(&self) {
        self.choices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

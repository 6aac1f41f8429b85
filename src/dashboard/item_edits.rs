use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::order::{CustomSizeDraft, MeasureField, Measurements, RawMeasure};

// ============================================================================
// Order-Item Edit Board
// ============================================================================
//
// Tracks inline custom-size editing per order item.
//
// States:
// - Viewing:  no edit in progress (items without an entry)
// - Editing:  a draft is being changed
// - Saving:   the draft was submitted, waiting for the server
// - Error:    the save failed; the draft is kept for another attempt
//
//   Viewing → Editing → Saving → Viewing
//                ↑          ↓
//                └── Error ←┘
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub order_id: Uuid,
    pub item_id: Uuid,
}

impl ItemKey {
    pub fn new(order_id: Uuid, item_id: Uuid) -> Self {
        Self { order_id, item_id }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemEditState {
    Viewing,
    Editing(CustomSizeDraft),
    Saving(CustomSizeDraft),
    Error { draft: CustomSizeDraft, message: String },
}

impl ItemEditState {
    pub fn name(&self) -> &'static str {
        match self {
            ItemEditState::Viewing => "viewing",
            ItemEditState::Editing(_) => "editing",
            ItemEditState::Saving(_) => "saving",
            ItemEditState::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Cannot {action} while the item is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

fn invalid(action: &'static str, state: &ItemEditState) -> EditError {
    EditError::InvalidTransition {
        action,
        state: state.name(),
    }
}

#[derive(Debug, Default)]
pub struct ItemEditBoard {
    items: HashMap<ItemKey, ItemEditState>,
}

impl ItemEditBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, key: &ItemKey) -> ItemEditState {
        self.items.get(key).cloned().unwrap_or(ItemEditState::Viewing)
    }

    /// Start editing from the item's current measurements. An item in
    /// `Error` keeps its failed draft.
    pub fn begin_edit(&mut self, key: ItemKey, current: &Measurements) -> Result<CustomSizeDraft, EditError> {
        let next = match self.state(&key) {
            ItemEditState::Viewing => CustomSizeDraft::from(*current),
            ItemEditState::Error { draft, .. } => draft,
            other => return Err(invalid("begin editing", &other)),
        };
        self.items.insert(key, ItemEditState::Editing(next));
        Ok(next)
    }

    pub fn update_draft(&mut self, key: ItemKey, field: MeasureField, value: RawMeasure) -> Result<(), EditError> {
        let mut draft = match self.state(&key) {
            ItemEditState::Editing(draft) | ItemEditState::Error { draft, .. } => draft,
            other => return Err(invalid("change the draft", &other)),
        };
        match field {
            MeasureField::Chest => draft.chest = value,
            MeasureField::Waist => draft.waist = value,
            MeasureField::Hips => draft.hips = value,
        }
        self.items.insert(key, ItemEditState::Editing(draft));
        Ok(())
    }

    /// Mark the draft as submitted and hand it out for the request.
    pub fn begin_save(&mut self, key: ItemKey) -> Result<CustomSizeDraft, EditError> {
        let draft = match self.state(&key) {
            ItemEditState::Editing(draft) => draft,
            other => return Err(invalid("save", &other)),
        };
        self.items.insert(key, ItemEditState::Saving(draft));
        Ok(draft)
    }

    pub fn save_succeeded(&mut self, key: ItemKey) -> Result<(), EditError> {
        match self.state(&key) {
            ItemEditState::Saving(_) => {
                self.items.remove(&key);
                Ok(())
            }
            other => Err(invalid("complete a save", &other)),
        }
    }

    pub fn save_failed(&mut self, key: ItemKey, message: impl Into<String>) -> Result<(), EditError> {
        let draft = match self.state(&key) {
            ItemEditState::Saving(draft) => draft,
            other => return Err(invalid("fail a save", &other)),
        };
        self.items.insert(
            key,
            ItemEditState::Error {
                draft,
                message: message.into(),
            },
        );
        Ok(())
    }

    /// Drop the draft. A submitted save cannot be cancelled.
    pub fn cancel(&mut self, key: ItemKey) -> Result<(), EditError> {
        let state = self.state(&key);
        if matches!(state, ItemEditState::Saving(_)) {
            return Err(invalid("cancel", &state));
        }
        self.items.remove(&key);
        Ok(())
    }

    /// Items with an edit in any state other than viewing.
    pub fn active(&self) -> usize {
        self.items.len()
    }
}

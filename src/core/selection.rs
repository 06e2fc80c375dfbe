//! Slot selection over a labware grid.
//!
//! The leaf state is derived from the `(selectable, mode)` pair; with
//! `selectable = none` every mode collapses into `non_selectable`. All
//! transitions are synchronous and rejected gestures are silent no-ops.

use crate::core::ordering::sort_with_direction;
use crate::domain::model::{Address, GridDirection, SelectableFilter, SelectionMode, Slot};
use crate::domain::ports::SelectionListener;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    NonSelectable,
    Selectable {
        filter: SelectableFilter,
        mode: SelectionMode,
    },
}

impl SelectionState {
    pub fn from_settings(filter: SelectableFilter, mode: SelectionMode) -> Self {
        match filter {
            SelectableFilter::None => SelectionState::NonSelectable,
            filter => SelectionState::Selectable { filter, mode },
        }
    }
}

impl fmt::Display for SelectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionState::NonSelectable => f.write_str("non_selectable"),
            SelectionState::Selectable { filter, mode } => {
                write!(f, "selectable.{}.{}", filter.as_str(), mode.as_str())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    SelectSlot(Address),
    CtrlSelectSlot(Address),
    SelectToSlot(Address),
    ChangeSelectionMode {
        mode: SelectionMode,
        selectable: SelectableFilter,
    },
    UpdateSlots(Vec<Slot>),
    ResetSelected,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionContext {
    pub slots: Vec<Slot>,
    pub selected: HashSet<Address>,
    pub last_selected: Option<Address>,
    pub selectable: SelectableFilter,
    pub mode: SelectionMode,
}

impl SelectionContext {
    pub fn new(slots: Vec<Slot>, selectable: SelectableFilter, mode: SelectionMode) -> Self {
        Self {
            slots,
            selectable,
            mode,
            ..Self::default()
        }
    }

    pub fn state(&self) -> SelectionState {
        SelectionState::from_settings(self.selectable, self.mode)
    }

    fn admits(&self, address: &str) -> bool {
        self.slots
            .iter()
            .find(|slot| slot.address == address)
            .is_some_and(|slot| self.selectable.admits(slot))
    }

    fn select(mut self, address: Address) -> Self {
        match self.mode {
            SelectionMode::Single => {
                self.selected.clear();
                self.selected.insert(address.clone());
            }
            SelectionMode::Multi => toggle(&mut self.selected, &address),
        }
        self.last_selected = Some(address);
        self
    }

    /// Addresses from the anchor to `address` inclusive, in row-major order.
    fn range_to(&self, anchor: &str, address: &str) -> Option<Vec<Address>> {
        let addresses: Vec<Address> = self.slots.iter().map(|slot| slot.address.clone()).collect();
        let ordered = sort_with_direction(&addresses, GridDirection::RightDown);
        let from = ordered.iter().position(|a| a == anchor)?;
        let to = ordered.iter().position(|a| a == address)?;
        let (start, end) = if from <= to { (from, to) } else { (to, from) };
        Some(ordered[start..=end].to_vec())
    }
}

fn toggle(selected: &mut HashSet<Address>, address: &str) {
    if !selected.remove(address) {
        selected.insert(address.to_string());
    }
}

/// Computes the next context, or `None` when the event changes nothing.
pub fn transition(context: &SelectionContext, event: SelectionEvent) -> Option<SelectionContext> {
    let selectable = context.state() != SelectionState::NonSelectable;

    match event {
        SelectionEvent::SelectSlot(address) => {
            if !selectable || !context.admits(&address) {
                return None;
            }
            Some(context.clone().select(address))
        }
        SelectionEvent::CtrlSelectSlot(address) => {
            if !selectable {
                return None;
            }
            let mut next = context.clone();
            if next.mode == SelectionMode::Single && !next.selected.contains(&address) {
                next.selected.clear();
            }
            toggle(&mut next.selected, &address);
            next.last_selected = Some(address);
            Some(next)
        }
        SelectionEvent::SelectToSlot(address) => {
            if !selectable {
                return None;
            }
            let anchor = match (&context.last_selected, context.mode) {
                (Some(anchor), SelectionMode::Multi) => anchor.clone(),
                _ => return transition(context, SelectionEvent::SelectSlot(address)),
            };
            let Some(range) = context.range_to(&anchor, &address) else {
                return transition(context, SelectionEvent::SelectSlot(address));
            };
            let mut next = context.clone();
            next.selected.extend(range);
            next.last_selected = Some(address);
            Some(next)
        }
        SelectionEvent::ChangeSelectionMode { mode, selectable } => {
            let mut next = context.clone();
            next.mode = mode;
            next.selectable = selectable;
            if mode == SelectionMode::Single && next.selected.len() > 1 {
                let keep = next
                    .last_selected
                    .clone()
                    .filter(|last| next.selected.contains(last));
                next.selected = keep.into_iter().collect();
            }
            Some(next)
        }
        SelectionEvent::UpdateSlots(slots) => Some(SelectionContext {
            slots,
            ..context.clone()
        }),
        SelectionEvent::ResetSelected => Some(SelectionContext {
            selected: HashSet::new(),
            last_selected: None,
            ..context.clone()
        }),
    }
}

pub struct SelectionController {
    context: SelectionContext,
    listeners: Vec<SelectionListener>,
}

impl SelectionController {
    pub fn new(slots: Vec<Slot>, selectable: SelectableFilter, mode: SelectionMode) -> Self {
        Self {
            context: SelectionContext::new(slots, selectable, mode),
            listeners: Vec::new(),
        }
    }

    /// Registers a listener called with the selected addresses whenever they change.
    pub fn on_change<F>(&mut self, listener: F)
    where
        F: Fn(&[Address]) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn state(&self) -> SelectionState {
        self.context.state()
    }

    pub fn context(&self) -> &SelectionContext {
        &self.context
    }

    pub fn is_slot_selected(&self, address: &str) -> bool {
        self.context.selected.contains(address)
    }

    /// Selected addresses in row-major order.
    pub fn selected_addresses(&self) -> Vec<Address> {
        let selected: Vec<Address> = self.context.selected.iter().cloned().collect();
        sort_with_direction(&selected, GridDirection::RightDown)
    }

    pub fn last_selected(&self) -> Option<&str> {
        self.context.last_selected.as_deref()
    }

    /// Applies one event. Returns `false` if it was a no-op.
    pub fn send(&mut self, event: SelectionEvent) -> bool {
        let Some(next) = transition(&self.context, event) else {
            debug!("Selection event ignored in {}", self.state());
            return false;
        };

        let selection_changed = next.selected != self.context.selected;
        let from = self.state();
        self.context = next;
        debug!("Selection {} -> {}", from, self.state());

        if selection_changed {
            let addresses = self.selected_addresses();
            for listener in &self.listeners {
                listener(&addresses);
            }
        }
        true
    }
}

//! Two-step silence removal: detect, let the user deselect, remove the rest.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::detector::SilenceInterval;

/// A detected silence plus whether it is included in the next removal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectableSilenceInterval {
    pub id: Uuid,
    pub interval: SilenceInterval,
    pub selected: bool,
}

impl SelectableSilenceInterval {
    /// Wrap `interval` with a fresh identifier, selected by default.
    pub fn new(interval: SilenceInterval) -> Self {
        Self {
            id: Uuid::new_v4(),
            interval,
            selected: true,
        }
    }
}

/// The highlighted silences for one recording, in time order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SilenceSelection {
    items: Vec<SelectableSilenceInterval>,
}

impl SilenceSelection {
    /// Every interval starts selected.
    pub fn from_intervals(intervals: &[SilenceInterval]) -> Self {
        Self {
            items: intervals
                .iter()
                .copied()
                .map(SelectableSilenceInterval::new)
                .collect(),
        }
    }

    pub fn items(&self) -> &[SelectableSilenceInterval] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Flip one interval's flag.  Returns `false` if `id` is unknown.
    pub fn toggle(&mut self, id: Uuid) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.selected = !item.selected;
                true
            }
            None => false,
        }
    }

    pub fn select_all(&mut self) {
        self.set_all(true);
    }

    pub fn deselect_all(&mut self) {
        self.set_all(false);
    }

    fn set_all(&mut self, selected: bool) {
        for item in &mut self.items {
            item.selected = selected;
        }
    }

    /// Intervals still selected, ready to hand to the batch remover.
    pub fn selected_ranges(&self) -> Vec<SilenceInterval> {
        self.items
            .iter()
            .filter(|item| item.selected)
            .map(|item| item.interval)
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.items.iter().filter(|item| item.selected).count()
    }

    /// Unpadded duration of the selected silences.
    pub fn selected_duration(&self) -> f64 {
        self.items
            .iter()
            .filter(|item| item.selected)
            .map(|item| item.interval.duration())
            .sum()
    }
}

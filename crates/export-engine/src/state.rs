//! Accumulated visibility state between checkpoints.

use std::collections::BTreeSet;

use mockup_document::AvailableLayers;

use crate::diagnostics::Diagnostic;
use crate::directive::{CheckpointTrigger, Directive};

/// Frozen state at the moment a checkpoint fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointPlan {
    /// 1-based line that fired the checkpoint (last line + 1 at end of input).
    pub line: usize,
    pub trigger: CheckpointTrigger,
    /// `None` when no filename was ever declared.
    pub filename: Option<String>,
    /// Layers to show, sorted.
    pub layers: Vec<String>,
    pub region: Option<String>,
}

/// Result of applying one directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// State updated or line ignored.
    Continue,
    /// Directive dropped; state unchanged.
    Rejected(Diagnostic),
    /// Render this plan. The state has already been reset.
    Checkpoint(CheckpointPlan),
}

/// Per-run export state.
///
/// `active` is always a subset of `available`: every activation and
/// deactivation is checked against the registry first.
#[derive(Debug, Clone)]
pub struct ExportState {
    available: AvailableLayers,
    active: BTreeSet<String>,
    region: Option<String>,
    pending_filename: Option<String>,
    checkpoint_counter: u64,
    last_was_checkpoint: bool,
}

impl ExportState {
    pub fn new(available: AvailableLayers) -> Self {
        Self {
            available,
            active: BTreeSet::new(),
            region: None,
            pending_filename: None,
            checkpoint_counter: 0,
            last_was_checkpoint: false,
        }
    }

    /// Apply one directive read from `line`. `has_element` resolves region ids
    /// against the document.
    pub fn apply(
        &mut self,
        line: usize,
        directive: Directive,
        has_element: impl Fn(&str) -> bool,
    ) -> Step {
        if directive != Directive::Comment {
            self.last_was_checkpoint = directive.is_checkpoint();
        }

        match directive {
            Directive::Comment => Step::Continue,
            Directive::Checkpoint(trigger) => Step::Checkpoint(self.checkpoint(line, trigger)),
            Directive::Deactivate(layer) => {
                if !self.available.contains(&layer) {
                    return Step::Rejected(Diagnostic::UnknownLayer { line, layer });
                }
                self.active.remove(&layer);
                Step::Continue
            }
            Directive::Activate(layer) => {
                if !self.available.contains(&layer) {
                    return Step::Rejected(Diagnostic::UnknownLayer { line, layer });
                }
                self.active.insert(layer);
                Step::Continue
            }
            Directive::Region(id) => {
                if !has_element(&id) {
                    return Step::Rejected(Diagnostic::UnknownRegion { line, id });
                }
                self.region = Some(id);
                Step::Continue
            }
            Directive::Filename(name) => {
                self.pending_filename = Some(name);
                Step::Continue
            }
        }
    }

    /// Close the input. Returns the forced final checkpoint when the last
    /// processed line did not already fire one.
    pub fn finish(&mut self, line: usize) -> Option<CheckpointPlan> {
        if self.last_was_checkpoint {
            return None;
        }
        self.last_was_checkpoint = true;
        Some(self.checkpoint(line, CheckpointTrigger::EndOfInput))
    }

    /// Allocate the next temp-file sequence number.
    pub fn next_sequence(&mut self) -> u64 {
        self.checkpoint_counter += 1;
        self.checkpoint_counter
    }

    fn checkpoint(&mut self, line: usize, trigger: CheckpointTrigger) -> CheckpointPlan {
        let plan = CheckpointPlan {
            line,
            trigger,
            filename: self.pending_filename.clone(),
            layers: self.active.iter().cloned().collect(),
            region: self.region.take(),
        };
        self.active.clear();
        plan
    }

    pub fn available(&self) -> &AvailableLayers {
        &self.available
    }

    pub fn active_layers(&self) -> &BTreeSet<String> {
        &self.active
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn pending_filename(&self) -> Option<&str> {
        self.pending_filename.as_deref()
    }

    pub fn checkpoint_counter(&self) -> u64 {
        self.checkpoint_counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fresh_state(layers: &[&str]) -> ExportState {
        ExportState::new(layers.iter().map(|s| s.to_string()).collect())
    }

    fn no_elements(_: &str) -> bool {
        false
    }

    fn feed(state: &mut ExportState, lines: &[&str]) -> Vec<Step> {
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| state.apply(i + 1, Directive::parse(line), no_elements))
            .collect()
    }

    #[test]
    fn test_unknown_layer_is_rejected_without_mutation() {
        let mut state = fresh_state(&["x"]);
        feed(&mut state, &["a:", "+ x"]);
        let step = state.apply(3, Directive::parse("+ z"), no_elements);
        assert_eq!(
            step,
            Step::Rejected(Diagnostic::UnknownLayer {
                line: 3,
                layer: "z".to_string()
            })
        );
        let step = state.apply(4, Directive::parse("- z"), no_elements);
        assert!(matches!(step, Step::Rejected(_)));
        assert_eq!(state.active_layers().len(), 1);
        assert!(state.active_layers().contains("x"));
    }

    #[test]
    fn test_region_requires_known_element() {
        let mut state = fresh_state(&[]);
        let step = state.apply(1, Directive::parse("# missing"), |id| id == "frame");
        assert!(matches!(step, Step::Rejected(Diagnostic::UnknownRegion { .. })));
        assert_eq!(state.region(), None);

        let step = state.apply(2, Directive::parse("# frame"), |id| id == "frame");
        assert_eq!(step, Step::Continue);
        assert_eq!(state.region(), Some("frame"));
    }

    #[test]
    fn test_checkpoint_resets_layers_and_region_but_keeps_filename() {
        let mut state = fresh_state(&["x", "y"]);
        feed(&mut state, &["a:", "+ y", "+ x"]);
        state.apply(4, Directive::parse("# frame"), |_| true);
        let step = state.apply(5, Directive::parse("-----"), no_elements);

        assert_eq!(
            step,
            Step::Checkpoint(CheckpointPlan {
                line: 5,
                trigger: CheckpointTrigger::Separator,
                filename: Some("a".to_string()),
                layers: vec!["x".to_string(), "y".to_string()],
                region: Some("frame".to_string()),
            })
        );
        assert!(state.active_layers().is_empty());
        assert_eq!(state.region(), None);
        assert_eq!(state.pending_filename(), Some("a"));
    }

    #[test]
    fn test_finish_forces_one_checkpoint_only_when_pending() {
        let mut state = fresh_state(&["x"]);
        feed(&mut state, &["a:", "+ x"]);
        let plan = state.finish(3).unwrap();
        assert_eq!(plan.trigger, CheckpointTrigger::EndOfInput);
        assert_eq!(plan.layers, vec!["x".to_string()]);
        assert!(state.finish(3).is_none());

        let mut state = fresh_state(&["x"]);
        feed(&mut state, &["a:", "+ x", ""]);
        assert!(state.finish(4).is_none());
    }

    #[test]
    fn test_trailing_comment_does_not_hide_last_checkpoint() {
        let mut state = fresh_state(&["x"]);
        let steps = feed(&mut state, &["a:", "+ x", "", "; done"]);
        assert_eq!(steps[3], Step::Continue);
        assert!(state.finish(5).is_none());

        let mut state = fresh_state(&["x"]);
        feed(&mut state, &["a:", "; note", "+ x", "; done"]);
        assert_eq!(state.active_layers().len(), 1);
        let plan = state.finish(5).unwrap();
        assert_eq!(plan.layers, vec!["x".to_string()]);
    }

    #[test]
    fn test_sequence_strictly_increases() {
        let mut state = fresh_state(&[]);
        let sequence: Vec<u64> = (0..5).map(|_| state.next_sequence()).collect();
        assert_eq!(sequence, vec![1, 2, 3, 4, 5]);
        assert_eq!(state.checkpoint_counter(), 5);
    }

    proptest! {
        #[test]
        fn prop_directives_fold_with_set_semantics(
            ops in proptest::collection::vec((any::<bool>(), 0usize..4), 0..40)
        ) {
            let names = ["a", "b", "c", "d"];
            let mut state = fresh_state(&names);
            let mut expected = BTreeSet::new();

            for (i, (add, idx)) in ops.iter().enumerate() {
                let name = names[*idx];
                let line = if *add { format!("+ {name}") } else { format!("- {name}") };
                let step = state.apply(i + 1, Directive::parse(&line), no_elements);
                prop_assert_eq!(step, Step::Continue);
                if *add {
                    expected.insert(name.to_string());
                } else {
                    expected.remove(name);
                }
            }

            prop_assert_eq!(state.active_layers(), &expected);
        }
    }
}

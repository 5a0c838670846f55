use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::model::{FieldId, ViolationCounters};

/// Raw input on an editable surface, as reported by the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Paste,
    Drop,
    /// Pre-insertion notice carrying the platform input type
    /// (`insertText`, `insertFromPaste`, `insertFromDrop`, ...).
    BeforeInput { input_type: String },
    Key { key: char, ctrl: bool, meta: bool },
    /// Any content-changing edit.
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BypassClass {
    Paste,
    Drop,
    PreInsertion,
    PasteShortcut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Proceed,
    Cancelled,
}

impl Verdict {
    pub fn proceeds(self) -> bool {
        self == Verdict::Proceed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PastePolicy {
    Blocked,
    /// Interception is not installed at all.
    Bypass,
}

/// Blocks and counts paste / drop attempts on monitored text surfaces.
#[derive(Debug, Clone)]
pub struct IntegrityMonitor {
    surfaces: BTreeSet<FieldId>,
    policy: PastePolicy,
}

impl IntegrityMonitor {
    pub fn new(surfaces: impl IntoIterator<Item = FieldId>, bypass_allowed: bool) -> Self {
        let policy = if bypass_allowed {
            PastePolicy::Bypass
        } else {
            PastePolicy::Blocked
        };
        let surfaces: BTreeSet<FieldId> = surfaces.into_iter().collect();
        info!(surfaces = surfaces.len(), ?policy, "integrity monitor wired");
        Self { surfaces, policy }
    }

    pub fn policy(&self) -> PastePolicy {
        self.policy
    }

    pub fn monitors(&self, surface: &FieldId) -> bool {
        self.surfaces.contains(surface)
    }

    /// Decides whether `event` may take its default action, updating counters.
    pub fn inspect(
        &self,
        surface: &FieldId,
        event: &InputEvent,
        counters: &mut ViolationCounters,
    ) -> Verdict {
        if !self.monitors(surface) {
            return Verdict::Proceed;
        }

        if *event == InputEvent::Input {
            counters.keypress_count += 1;
            return Verdict::Proceed;
        }

        if self.policy == PastePolicy::Bypass {
            return Verdict::Proceed;
        }

        match classify(event) {
            Some(class) => {
                counters.paste_event_count += 1;
                debug!(
                    surface = %surface,
                    ?class,
                    total = counters.paste_event_count,
                    "blocked paste attempt"
                );
                Verdict::Cancelled
            }
            None => Verdict::Proceed,
        }
    }
}

fn classify(event: &InputEvent) -> Option<BypassClass> {
    match event {
        InputEvent::Paste => Some(BypassClass::Paste),
        InputEvent::Drop => Some(BypassClass::Drop),
        InputEvent::BeforeInput { input_type }
            if input_type.starts_with("insertFromPaste") || input_type == "insertFromDrop" =>
        {
            Some(BypassClass::PreInsertion)
        }
        InputEvent::Key { key, ctrl, meta } if (*ctrl || *meta) && key.eq_ignore_ascii_case(&'v') => {
            Some(BypassClass::PasteShortcut)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> FieldId {
        FieldId::new("motivation")
    }

    #[test]
    fn policy_follows_bypass_flag() {
        assert_eq!(
            IntegrityMonitor::new([field()], false).policy(),
            PastePolicy::Blocked
        );
        assert_eq!(
            IntegrityMonitor::new([field()], true).policy(),
            PastePolicy::Bypass
        );
    }

    #[test]
    fn blocked_policy_cancels_every_bypass_class() {
        let monitor = IntegrityMonitor::new([field()], false);
        let mut counters = ViolationCounters::default();
        let events = [
            InputEvent::Paste,
            InputEvent::Drop,
            InputEvent::BeforeInput {
                input_type: "insertFromPasteAsQuotation".to_string(),
            },
            InputEvent::BeforeInput {
                input_type: "insertFromDrop".to_string(),
            },
            InputEvent::Key {
                key: 'V',
                ctrl: false,
                meta: true,
            },
        ];

        for event in &events {
            assert_eq!(monitor.inspect(&field(), event, &mut counters), Verdict::Cancelled);
        }
        assert_eq!(counters.paste_event_count, 5);
        assert_eq!(counters.keypress_count, 0);
    }

    #[test]
    fn ordinary_typing_is_not_intercepted() {
        let monitor = IntegrityMonitor::new([field()], false);
        let mut counters = ViolationCounters::default();
        let typed = InputEvent::BeforeInput {
            input_type: "insertText".to_string(),
        };
        let plain_v = InputEvent::Key {
            key: 'v',
            ctrl: false,
            meta: false,
        };

        assert!(monitor.inspect(&field(), &typed, &mut counters).proceeds());
        assert!(monitor.inspect(&field(), &plain_v, &mut counters).proceeds());
        assert_eq!(counters, ViolationCounters::default());
    }

    #[test]
    fn unmonitored_surface_never_counts() {
        let monitor = IntegrityMonitor::new([field()], false);
        let mut counters = ViolationCounters::default();
        let other = FieldId::new("search");

        assert!(monitor.inspect(&other, &InputEvent::Paste, &mut counters).proceeds());
        assert!(monitor.inspect(&other, &InputEvent::Input, &mut counters).proceeds());
        assert_eq!(counters, ViolationCounters::default());
    }
}

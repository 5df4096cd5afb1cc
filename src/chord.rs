//! Chorded key tracking across panels
//!
//! Two sets describe the gesture in progress: *live* keys are held and part
//! of it, *composed* keys were part of it and have been released. A fresh
//! key-down starts new composed accounting; releasing the last live key
//! ends the gesture.

use crate::keys::{KeyEvent, MiniKey};

/// The key sets one report produced, ready for dispatch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gesture {
    pub live: Vec<KeyEvent>,
    pub composed: Vec<KeyEvent>,
    /// All keys of a non-empty gesture are now up
    pub ending: bool,
    /// Keys that went down with this report
    pub pressed: Vec<KeyEvent>,
    /// Keys that went up with this report
    pub released: Vec<KeyEvent>,
}

impl Gesture {
    pub fn live_keys(&self) -> Vec<MiniKey> {
        self.live.iter().map(|e| e.key).collect()
    }

    pub fn composed_keys(&self) -> Vec<MiniKey> {
        self.composed.iter().map(|e| e.key).collect()
    }

    pub fn live_contains(&self, key: MiniKey) -> bool {
        self.live.iter().any(|e| e.key == key)
    }

    /// Nothing went up: a fresh press or a repeat while held
    pub fn is_press(&self) -> bool {
        self.released.is_empty()
    }
}

/// Key state shared by every panel of a session
#[derive(Debug, Clone, Default)]
pub struct ChordTracker {
    prev_keys_down: Vec<KeyEvent>,
    live: Vec<KeyEvent>,
    composed: Vec<KeyEvent>,
}

impl ChordTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys_down(&self) -> &[KeyEvent] {
        &self.prev_keys_down
    }

    pub fn live(&self) -> &[KeyEvent] {
        &self.live
    }

    pub fn composed(&self) -> &[KeyEvent] {
        &self.composed
    }

    /// Apply the keys `panel` reports as held and return the gesture to dispatch.
    ///
    /// Keys held on other panels carry over from the previous report. The
    /// returned snapshot still holds the composed keys of an ending gesture;
    /// the tracker itself has already cleared them.
    pub fn process(&mut self, panel: usize, held: &[KeyEvent]) -> Gesture {
        let mut keys_down: Vec<KeyEvent> = self
            .prev_keys_down
            .iter()
            .filter(|e| e.source.0 != panel)
            .copied()
            .collect();
        for event in held {
            if !keys_down.contains(event) {
                keys_down.push(*event);
            }
        }

        let new_keys: Vec<KeyEvent> = keys_down
            .iter()
            .filter(|e| !self.prev_keys_down.contains(e))
            .copied()
            .collect();
        let keys_up: Vec<KeyEvent> = self
            .prev_keys_down
            .iter()
            .filter(|e| !keys_down.contains(e))
            .copied()
            .collect();

        if !new_keys.is_empty() {
            self.composed.clear();
            for key in &new_keys {
                if !self.live.contains(key) {
                    self.live.push(*key);
                }
            }
        }

        if !keys_up.is_empty() {
            self.live.retain(|e| !keys_up.contains(e));
            for key in &keys_up {
                if !self.composed.contains(key) {
                    self.composed.push(*key);
                }
            }
        }

        let ending = !self.composed.is_empty() && self.live.is_empty();
        let gesture = Gesture {
            live: self.live.clone(),
            composed: self.composed.clone(),
            ending,
            pressed: new_keys,
            released: keys_up,
        };

        if ending {
            self.composed.clear();
        }
        self.prev_keys_down = keys_down;
        gesture
    }

    /// Forget all held keys (panel set changed)
    pub fn clear(&mut self) {
        self.prev_keys_down.clear();
        self.live.clear();
        self.composed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::Side;

    fn ev(key: MiniKey, panel: usize) -> KeyEvent {
        KeyEvent::new(key, panel, Side::Left)
    }

    #[test]
    fn test_chord_boundary() {
        let a = ev(MiniKey::Dot1, 0);
        let b = ev(MiniKey::Dot2, 0);
        let mut t = ChordTracker::new();

        let g = t.process(0, &[a]);
        assert_eq!(g.live, vec![a]);
        assert!(g.composed.is_empty());

        let g = t.process(0, &[a, b]);
        assert_eq!(g.live, vec![a, b]);

        let g = t.process(0, &[b]);
        assert_eq!(g.composed, vec![a]);
        assert_eq!(g.live, vec![b]);
        assert_eq!(g.released, vec![a]);
        assert!(!g.is_press());
        assert!(!g.ending);

        let g = t.process(0, &[]);
        assert!(g.live.is_empty());
        assert_eq!(g.composed, vec![a, b]);
        assert!(g.ending);
        assert!(t.composed().is_empty());
    }

    #[test]
    fn test_single_tap_ends_with_composed_key() {
        let a = ev(MiniKey::Row4, 0);
        let mut t = ChordTracker::new();
        t.process(0, &[a]);
        let g = t.process(0, &[]);
        assert!(g.ending);
        assert_eq!(g.composed, vec![a]);
    }

    #[test]
    fn test_new_press_resets_composed() {
        let a = ev(MiniKey::Dot1, 0);
        let b = ev(MiniKey::Dot2, 0);
        let c = ev(MiniKey::Dot3, 0);
        let mut t = ChordTracker::new();
        t.process(0, &[a, b]);
        let g = t.process(0, &[b]);
        assert_eq!(g.composed, vec![a]);
        let g = t.process(0, &[b, c]);
        assert!(g.composed.is_empty());
        assert_eq!(g.live, vec![b, c]);
        assert_eq!(g.pressed, vec![c]);
    }

    #[test]
    fn test_other_panels_keys_carry_over() {
        let left = ev(MiniKey::Row1, 0);
        let right = KeyEvent::new(MiniKey::DPadUp, 1, Side::Right);
        let mut t = ChordTracker::new();
        t.process(0, &[left]);
        let g = t.process(1, &[right]);
        assert_eq!(g.live, vec![left, right]);
        assert_eq!(t.keys_down().len(), 2);

        // Panel 1 releasing leaves panel 0's key held
        let g = t.process(1, &[]);
        assert_eq!(g.live, vec![left]);
        assert_eq!(g.composed, vec![right]);
        assert!(!g.ending);
    }

    #[test]
    fn test_same_key_on_two_panels_is_distinct() {
        let a = ev(MiniKey::Dot1, 0);
        let b = ev(MiniKey::Dot1, 1);
        let mut t = ChordTracker::new();
        t.process(0, &[a]);
        let g = t.process(1, &[b]);
        assert_eq!(g.live.len(), 2);
    }

    #[test]
    fn test_repeat_report_is_quiet() {
        let a = ev(MiniKey::DPadUp, 0);
        let mut t = ChordTracker::new();
        t.process(0, &[a]);
        let g = t.process(0, &[a]);
        assert!(g.pressed.is_empty());
        assert!(g.is_press());
        assert_eq!(g.live, vec![a]);
        assert!(!g.ending);
    }

    #[test]
    fn test_live_and_composed_disjoint() {
        let keys = [
            ev(MiniKey::Dot1, 0),
            ev(MiniKey::Dot2, 0),
            ev(MiniKey::Dot3, 1),
        ];
        let mut t = ChordTracker::new();
        let sequence: [(usize, &[KeyEvent]); 6] = [
            (0, &keys[..2]),
            (1, &keys[2..]),
            (0, &keys[1..2]),
            (1, &[]),
            (0, &keys[..1]),
            (0, &[]),
        ];
        for (panel, held) in sequence {
            let held: Vec<KeyEvent> = held.iter().filter(|e| e.source.0 == panel).copied().collect();
            let g = t.process(panel, &held);
            for e in &g.live {
                assert!(!g.composed.contains(e));
            }
        }
    }
}

//! Panel button identities and input report decoding
//!
//! Bit `i` of byte `b` in an input report is key id `b × 8 + i`. Compact
//! 5-byte reports only wire dots 1/2/3/7; 7-byte reports from a bridged
//! panel carry the right half's keys in a second id range.

use std::fmt;

use tracing::warn;

use crate::compositor::Side;
use crate::layout::{Panel, SideId};

/// Length of a compact single-unit report
pub const COMPACT_REPORT_LEN: usize = 5;
/// Length of a full report (bridged panels included)
pub const FULL_REPORT_LEN: usize = 7;

/// Physical buttons, valued by their key id in the primary range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum MiniKey {
    Dot1 = 8,
    Dot2 = 9,
    Dot3 = 10,
    Dot4 = 11,
    Dot5 = 12,
    Dot6 = 13,
    Dot7 = 14,
    Dot8 = 15,
    Space = 16,
    PanLeft = 18,
    PanRight = 20,
    DPadCenter = 24,
    DPadUp = 25,
    DPadDown = 26,
    DPadLeft = 27,
    DPadRight = 28,
    Row1 = 32,
    Row2 = 33,
    Row3 = 34,
    Row4 = 35,
}

impl MiniKey {
    pub const ALL: [MiniKey; 20] = [
        MiniKey::Dot1,
        MiniKey::Dot2,
        MiniKey::Dot3,
        MiniKey::Dot4,
        MiniKey::Dot5,
        MiniKey::Dot6,
        MiniKey::Dot7,
        MiniKey::Dot8,
        MiniKey::Space,
        MiniKey::PanLeft,
        MiniKey::PanRight,
        MiniKey::DPadCenter,
        MiniKey::DPadUp,
        MiniKey::DPadDown,
        MiniKey::DPadLeft,
        MiniKey::DPadRight,
        MiniKey::Row1,
        MiniKey::Row2,
        MiniKey::Row3,
        MiniKey::Row4,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Key with primary-range id `id`
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.id() == id)
    }

    pub fn is_dpad_direction(self) -> bool {
        matches!(
            self,
            MiniKey::DPadUp | MiniKey::DPadDown | MiniKey::DPadLeft | MiniKey::DPadRight
        )
    }

    pub fn is_pan(self) -> bool {
        matches!(self, MiniKey::PanLeft | MiniKey::PanRight)
    }

    /// The key in the same physical spot once the panel is turned 180°
    pub fn rotated(self) -> Self {
        use MiniKey::*;
        match self {
            DPadUp => DPadDown,
            DPadDown => DPadUp,
            DPadLeft => DPadRight,
            DPadRight => DPadLeft,
            PanLeft => PanRight,
            PanRight => PanLeft,
            Row1 => Row4,
            Row2 => Row3,
            Row3 => Row2,
            Row4 => Row1,
            Dot1 => Dot4,
            Dot2 => Dot5,
            Dot3 => Dot6,
            Dot4 => Dot1,
            Dot5 => Dot2,
            Dot6 => Dot3,
            Dot7 => Dot8,
            Dot8 => Dot7,
            Space => Space,
            DPadCenter => DPadCenter,
        }
    }

    /// Compact reports share dot lines: 4/5/6/8 read as 1/2/3/7
    pub fn folded_compact(self) -> Self {
        match self {
            MiniKey::Dot4 => MiniKey::Dot1,
            MiniKey::Dot5 => MiniKey::Dot2,
            MiniKey::Dot6 => MiniKey::Dot3,
            MiniKey::Dot8 => MiniKey::Dot7,
            other => other,
        }
    }

    /// Name used when forwarding keys to the host
    pub fn name(self) -> &'static str {
        match self {
            MiniKey::Dot1 => "dot1",
            MiniKey::Dot2 => "dot2",
            MiniKey::Dot3 => "dot3",
            MiniKey::Dot4 => "dot4",
            MiniKey::Dot5 => "dot5",
            MiniKey::Dot6 => "dot6",
            MiniKey::Dot7 => "dot7",
            MiniKey::Dot8 => "dot8",
            MiniKey::Space => "space",
            MiniKey::PanLeft => "panLeft",
            MiniKey::PanRight => "panRight",
            MiniKey::DPadCenter => "dpadCenter",
            MiniKey::DPadUp => "dpadUp",
            MiniKey::DPadDown => "dpadDown",
            MiniKey::DPadLeft => "dpadLeft",
            MiniKey::DPadRight => "dpadRight",
            MiniKey::Row1 => "row1",
            MiniKey::Row2 => "row2",
            MiniKey::Row3 => "row3",
            MiniKey::Row4 => "row4",
        }
    }
}

impl fmt::Display for MiniKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Secondary id range of a 7-byte report: the right half of a bridged panel
pub const RIGHT_PANEL_KEYS: [(u8, MiniKey); 12] = [
    (40, MiniKey::DPadCenter),
    (41, MiniKey::DPadUp),
    (42, MiniKey::DPadDown),
    (43, MiniKey::DPadLeft),
    (44, MiniKey::DPadRight),
    (19, MiniKey::PanRight),
    (21, MiniKey::PanLeft),
    (48, MiniKey::Row1),
    (49, MiniKey::Row2),
    (50, MiniKey::Row3),
    (51, MiniKey::Row4),
    (17, MiniKey::Space),
];

fn right_panel_key(id: u8) -> Option<MiniKey> {
    RIGHT_PANEL_KEYS
        .iter()
        .find(|(k, _)| *k == id)
        .map(|(_, key)| *key)
}

/// Panel half a key event came from
pub type KeySource = SideId;

/// A pressed key and where it was pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyEvent {
    pub key: MiniKey,
    pub source: KeySource,
}

impl KeyEvent {
    pub fn new(key: MiniKey, panel: usize, side: Side) -> Self {
        Self {
            key,
            source: (panel, side),
        }
    }
}

/// Keys held according to one report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedReport {
    /// Held keys in report bit order, deduplicated
    pub keys: Vec<KeyEvent>,
    /// Set bits that matched no key
    pub unknown_ids: Vec<u8>,
}

/// Decode a button report from `panel`.
///
/// Returns `None` for lengths other than 5 or 7, which are not button
/// reports. Keys on a panel half mounted upside-down are rotated, and
/// compact reports fold the upper dot keys onto the lower ones.
pub fn decode_report(data: &[u8], panel: &Panel) -> Option<DecodedReport> {
    let compact = match data.len() {
        COMPACT_REPORT_LEN => true,
        FULL_REPORT_LEN => false,
        _ => return None,
    };

    let mut out = DecodedReport::default();
    for (byte_index, byte) in data.iter().enumerate() {
        for bit in 0..8u8 {
            if byte & (1 << bit) == 0 {
                continue;
            }
            let id = (byte_index as u8) * 8 + bit;

            let secondary = if compact { None } else { right_panel_key(id) };
            let (key, side) = match secondary {
                Some(key) => (key, panel.secondary_side().unwrap_or(panel.primary_side())),
                None => match MiniKey::from_id(id) {
                    Some(key) => (key, panel.primary_side()),
                    None => {
                        warn!("Panel {}: unknown key id {}", panel.index, id);
                        out.unknown_ids.push(id);
                        continue;
                    }
                },
            };

            let mut key = if panel.corner(side).is_top() {
                key.rotated()
            } else {
                key
            };
            if compact {
                key = key.folded_compact();
            }

            let event = KeyEvent::new(key, panel.index, side);
            if !out.keys.contains(&event) {
                out.keys.push(event);
            }
        }
    }
    Some(out)
}

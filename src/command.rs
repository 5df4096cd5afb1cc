//! Fixed mapping from key gestures to navigation commands

use crate::canvas::Direction;
use crate::chord::Gesture;
use crate::keys::{KeySource, MiniKey};
use crate::layout::PanelLayout;

/// Something a gesture asks the session to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavCommand {
    /// Put a panel half at its top (`true`) or bottom corner
    FlipPanel { source: KeySource, flipped: bool },
    Pan(Direction),
    Zoom { zoom_in: bool },
    Threshold { increase: bool },
    ReverseThreshold,
    CycleChannel,
    PanRate { increase: bool },
    ZoomRate { increase: bool },
    ThresholdRate { increase: bool },
    PanToEdge(Direction),
    ToggleAspectRatio,
    /// Threshold, channel, polarity and view back to fit-to-view defaults
    Reset,
    ToggleImage,
}

const RESET_CHORD: [MiniKey; 4] = [MiniKey::Dot1, MiniKey::Dot2, MiniKey::Dot3, MiniKey::Dot7];

fn dpad_direction(key: MiniKey) -> Option<Direction> {
    match key {
        MiniKey::DPadUp => Some(Direction::Up),
        MiniKey::DPadDown => Some(Direction::Down),
        MiniKey::DPadLeft => Some(Direction::Left),
        MiniKey::DPadRight => Some(Direction::Right),
        _ => None,
    }
}

/// Commands for one dispatch of `gesture`, in the order they apply.
///
/// Live chords act on press only: a report that releases keys never fires
/// the keys still held. A single released row-1/row-4 key moves its panel: row 4 as the user
/// sees it always means "top", row 1 "bottom". Keys arrive already rotated
/// for panels that are upside-down, hence the comparison with the current
/// corner.
pub fn match_gesture(gesture: &Gesture, image_mode: bool, layout: &PanelLayout) -> Vec<NavCommand> {
    let mut commands = Vec::new();

    if let [event] = gesture.composed.as_slice() {
        if matches!(event.key, MiniKey::Row1 | MiniKey::Row4) {
            let currently_flipped = layout
                .corner_of(event.source)
                .is_some_and(|c| c.is_top());
            let flipped = (event.key == MiniKey::Row4 && !currently_flipped)
                || (event.key == MiniKey::Row1 && currently_flipped);
            commands.push(NavCommand::FlipPanel {
                source: event.source,
                flipped,
            });
        }
    }

    if !gesture.is_press() {
        return commands;
    }

    let live = gesture.live_keys();
    if image_mode {
        match live.len() {
            1 => commands.extend(single_key_command(live[0])),
            2 => commands.extend(two_key_commands(&live)),
            4 if RESET_CHORD.iter().all(|k| live.contains(k)) => {
                commands.push(NavCommand::Reset)
            }
            _ => {}
        }
    }

    if live == [MiniKey::Row3] {
        commands.push(NavCommand::ToggleImage);
    }

    commands
}

fn single_key_command(key: MiniKey) -> Option<NavCommand> {
    if let Some(direction) = dpad_direction(key) {
        return Some(NavCommand::Pan(direction));
    }
    match key {
        MiniKey::PanRight => Some(NavCommand::Zoom { zoom_in: true }),
        MiniKey::PanLeft => Some(NavCommand::Zoom { zoom_in: false }),
        MiniKey::Dot7 => Some(NavCommand::Threshold { increase: true }),
        MiniKey::Dot3 => Some(NavCommand::Threshold { increase: false }),
        MiniKey::Dot2 => Some(NavCommand::ReverseThreshold),
        MiniKey::Dot1 => Some(NavCommand::CycleChannel),
        _ => None,
    }
}

fn two_key_commands(live: &[MiniKey]) -> Vec<NavCommand> {
    let mut commands = Vec::new();
    let has = |k: MiniKey| live.contains(&k);
    let direction = live.iter().find_map(|k| dpad_direction(*k));

    if has(MiniKey::Row1) || has(MiniKey::Row2) {
        let increase = has(MiniKey::Row1);
        if direction.is_some() {
            commands.push(NavCommand::PanRate { increase });
        } else if live.iter().any(|k| k.is_pan()) {
            commands.push(NavCommand::ZoomRate { increase });
        } else if has(MiniKey::Dot2) {
            commands.push(NavCommand::ThresholdRate { increase });
        }
    }

    if has(MiniKey::Space) {
        if let Some(direction) = direction {
            commands.push(NavCommand::PanToEdge(direction));
        }
        if has(MiniKey::DPadCenter) {
            commands.push(NavCommand::ToggleAspectRatio);
        }
    }

    commands
}

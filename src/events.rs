//! Input events understood by the viewport, decoded once at the host boundary.

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use glam::DVec2;
use ratatui::layout::Rect;

/// Button code for the primary (left) button.
pub const PRIMARY_BUTTON: u8 = 0;

const TERMINAL_POINTER_ID: u32 = 1;
/// Lines reported per terminal scroll notch.
const TERMINAL_WHEEL_LINES: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub pointer_id: u32,
    pub is_primary: bool,
    pub button: u8,
    /// Screen position relative to the viewport's top-left corner.
    pub x: f64,
    pub y: f64,
}

impl PointerInput {
    pub fn primary(x: f64, y: f64) -> Self {
        Self {
            pointer_id: TERMINAL_POINTER_ID,
            is_primary: true,
            button: PRIMARY_BUTTON,
            x,
            y,
        }
    }

    pub fn position(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDeltaMode {
    Pixel,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    PointerDown(PointerInput),
    PointerMove(PointerInput),
    PointerUp(PointerInput),
    PointerCancel(PointerInput),
    PointerLeave(PointerInput),
    Wheel {
        delta_y: f64,
        delta_mode: WheelDeltaMode,
        x: f64,
        y: f64,
    },
    Resize {
        width: f64,
        height: f64,
    },
}

/// Explicit view controls (the +, - and reset buttons).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewControl {
    ZoomIn,
    ZoomOut,
    Reset,
}

/// Braille-dot size of a terminal area.
pub fn pixel_size(area: Rect) -> (f64, f64) {
    (area.width as f64 * 2.0, area.height as f64 * 4.0)
}

/// Decode a terminal mouse event against the map area. Positions are mapped
/// to the centre of the Braille cell under the cursor.
///
/// Motion outside `area` becomes `PointerLeave`; drags and releases outside it
/// are still delivered so an in-progress pan can finish.
pub fn decode_mouse(mouse: MouseEvent, area: Rect) -> Option<ViewportEvent> {
    let inside = mouse.column >= area.x
        && mouse.column < area.x + area.width
        && mouse.row >= area.y
        && mouse.row < area.y + area.height;

    let x = (mouse.column as f64 - area.x as f64) * 2.0 + 1.0;
    let y = (mouse.row as f64 - area.y as f64) * 4.0 + 2.0;
    let pointer = |button: u8| PointerInput {
        button,
        ..PointerInput::primary(x, y)
    };

    let event = match mouse.kind {
        MouseEventKind::Down(button) if inside => ViewportEvent::PointerDown(pointer(button_code(button))),
        MouseEventKind::Drag(button) => ViewportEvent::PointerMove(pointer(button_code(button))),
        // Every terminal button shares one pointer id, so only the primary
        // release ends the session
        MouseEventKind::Up(MouseButton::Left) => ViewportEvent::PointerUp(pointer(PRIMARY_BUTTON)),
        MouseEventKind::Moved if inside => ViewportEvent::PointerMove(pointer(PRIMARY_BUTTON)),
        MouseEventKind::Moved => ViewportEvent::PointerLeave(pointer(PRIMARY_BUTTON)),
        MouseEventKind::ScrollUp if inside => ViewportEvent::Wheel {
            delta_y: -TERMINAL_WHEEL_LINES,
            delta_mode: WheelDeltaMode::Line,
            x,
            y,
        },
        MouseEventKind::ScrollDown if inside => ViewportEvent::Wheel {
            delta_y: TERMINAL_WHEEL_LINES,
            delta_mode: WheelDeltaMode::Line,
            x,
            y,
        },
        _ => return None,
    };
    Some(event)
}

fn button_code(button: MouseButton) -> u8 {
    match button {
        MouseButton::Left => PRIMARY_BUTTON,
        MouseButton::Middle => 1,
        MouseButton::Right => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_decode_maps_cells_to_dot_centres() {
        let area = Rect::new(1, 1, 10, 5);
        let event = decode_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 3, 2), area);
        assert_eq!(event, Some(ViewportEvent::PointerDown(PointerInput::primary(5.0, 6.0))));
    }

    #[test]
    fn test_decode_outside_area() {
        let area = Rect::new(1, 1, 10, 5);
        assert!(matches!(
            decode_mouse(mouse(MouseEventKind::Moved, 0, 0), area),
            Some(ViewportEvent::PointerLeave(_))
        ));
        assert!(decode_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 0, 0), area).is_none());
        assert!(matches!(
            decode_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 30, 30), area),
            Some(ViewportEvent::PointerUp(_))
        ));
    }

    #[test]
    fn test_decode_wheel_and_buttons() {
        let area = Rect::new(0, 0, 10, 5);
        match decode_mouse(mouse(MouseEventKind::ScrollUp, 1, 1), area) {
            Some(ViewportEvent::Wheel { delta_y, delta_mode, .. }) => {
                assert!(delta_y < 0.0);
                assert_eq!(delta_mode, WheelDeltaMode::Line);
            }
            other => panic!("unexpected {other:?}"),
        }

        let Some(ViewportEvent::PointerDown(p)) = decode_mouse(mouse(MouseEventKind::Down(MouseButton::Right), 1, 1), area) else {
            panic!("expected pointer down");
        };
        assert_ne!(p.button, PRIMARY_BUTTON);
    }

    #[test]
    fn test_only_left_release_ends_pointer() {
        let area = Rect::new(0, 0, 10, 5);
        assert!(decode_mouse(mouse(MouseEventKind::Up(MouseButton::Right), 1, 1), area).is_none());
        assert!(decode_mouse(mouse(MouseEventKind::Up(MouseButton::Middle), 1, 1), area).is_none());
        assert_eq!(
            decode_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 1, 1), area),
            Some(ViewportEvent::PointerUp(PointerInput::primary(3.0, 6.0)))
        );
    }
}

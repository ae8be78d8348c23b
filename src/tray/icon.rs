//! Icon creation for the system tray.

use tray_icon::Icon;

const ICON_SIZE: u32 = 32;

/// Grey: monitoring armed, nothing happening.
pub const COLOR_NORMAL: [u8; 4] = [128, 128, 128, 255];

/// Green: a nudge was just delivered.
pub const COLOR_ACTIVE: [u8; 4] = [0, 200, 0, 255];

/// Dimmed: monitoring switched off.
pub const COLOR_DISABLED: [u8; 4] = [100, 100, 100, 128];

/// Renders a solid circle icon in the given color.
///
/// Icons are generated programmatically so the binary needs no bundled
/// asset files.
pub fn create_state_icon(color: [u8; 4]) -> Result<Icon, Box<dyn std::error::Error>> {
    let size = ICON_SIZE;
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);

    let center = size as f32 / 2.0;
    let radius = size as f32 / 2.0 - 2.0;

    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            let distance = (dx * dx + dy * dy).sqrt();

            if distance <= radius {
                rgba.extend_from_slice(&color);
            } else {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
            }
        }
    }

    Icon::from_rgba(rgba, size, size).map_err(|e| e.into())
}

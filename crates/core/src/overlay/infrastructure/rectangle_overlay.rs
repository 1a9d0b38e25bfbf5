use crate::overlay::domain::frame_overlay::FrameOverlay;
use crate::shared::constants::{LOCK_BOX_COLOR, LOCK_BOX_THICKNESS};
use crate::shared::frame::Frame;
use crate::shared::region::CandidateRegion;

/// Draws a solid rectangle outline inside each region's bounds.
///
/// The outline is `thickness` pixels wide, grown inward from the region
/// edges. Parts falling outside the frame are clipped, so a box hanging off
/// the frame edge shows no line along that edge.
pub struct RectangleOverlay {
    color: [u8; 3],
    thickness: u32,
}

impl RectangleOverlay {
    pub fn new(color: [u8; 3], thickness: u32) -> Self {
        Self {
            color,
            thickness: thickness.max(1),
        }
    }
}

impl Default for RectangleOverlay {
    fn default() -> Self {
        Self::new(LOCK_BOX_COLOR, LOCK_BOX_THICKNESS)
    }
}

impl FrameOverlay for RectangleOverlay {
    fn draw(
        &self,
        frame: &mut Frame,
        regions: &[CandidateRegion],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let fw = frame.width() as usize;
        let (frame_w, frame_h) = (frame.width(), frame.height());
        let channels = frame.channels() as usize;
        let painted = channels.min(self.color.len());
        let t = self.thickness.min(i32::MAX as u32) as i32;
        let data = frame.data_mut();

        for r in regions {
            let Some(visible) = r.clamp_to(frame_w, frame_h) else {
                continue;
            };

            for y in visible.y1()..visible.y2() {
                let on_horizontal = y < r.y1() + t || y >= r.y2() - t;
                for x in visible.x1()..visible.x2() {
                    if !on_horizontal && x >= r.x1() + t && x < r.x2() - t {
                        continue;
                    }
                    let offset = (y as usize * fw + x as usize) * channels;
                    data[offset..offset + painted].copy_from_slice(&self.color[..painted]);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREEN: [u8; 3] = [0, 255, 0];

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 3] {
        let offset = (y * frame.width() as usize + x) * 3;
        let d = frame.data();
        [d[offset], d[offset + 1], d[offset + 2]]
    }

    fn region(x1: i32, y1: i32, x2: i32, y2: i32) -> CandidateRegion {
        CandidateRegion::new(x1, y1, x2, y2).unwrap()
    }

    #[test]
    fn test_outline_has_requested_thickness() {
        let mut frame = Frame::filled(40, 40, [0, 0, 0], 0);
        RectangleOverlay::new(GREEN, 3)
            .draw(&mut frame, &[region(10, 10, 30, 30)])
            .unwrap();

        // Left edge band is columns 10..13.
        assert_eq!(pixel(&frame, 10, 20), GREEN);
        assert_eq!(pixel(&frame, 12, 20), GREEN);
        assert_eq!(pixel(&frame, 13, 20), [0, 0, 0]);
        // Right edge band is columns 27..30.
        assert_eq!(pixel(&frame, 27, 20), GREEN);
        assert_eq!(pixel(&frame, 29, 20), GREEN);
        assert_eq!(pixel(&frame, 30, 20), [0, 0, 0]);
        // Top and bottom bands.
        assert_eq!(pixel(&frame, 20, 10), GREEN);
        assert_eq!(pixel(&frame, 20, 12), GREEN);
        assert_eq!(pixel(&frame, 20, 29), GREEN);
        // Interior and exterior untouched.
        assert_eq!(pixel(&frame, 20, 20), [0, 0, 0]);
        assert_eq!(pixel(&frame, 5, 5), [0, 0, 0]);
    }

    #[test]
    fn test_box_hanging_off_frame_is_clipped() {
        let mut frame = Frame::filled(20, 20, [0, 0, 0], 0);
        RectangleOverlay::default()
            .draw(&mut frame, &[region(-10, 5, 10, 40)])
            .unwrap();

        // Right edge visible, left and bottom edges are off-frame.
        assert_eq!(pixel(&frame, 9, 10), GREEN);
        assert_eq!(pixel(&frame, 0, 10), [0, 0, 0]);
        assert_eq!(pixel(&frame, 5, 19), [0, 0, 0]);
        // Top edge visible.
        assert_eq!(pixel(&frame, 0, 5), GREEN);
    }

    #[test]
    fn test_box_outside_frame_draws_nothing() {
        let mut frame = Frame::filled(10, 10, [7, 7, 7], 0);
        RectangleOverlay::default()
            .draw(&mut frame, &[region(50, 50, 60, 60)])
            .unwrap();
        assert!(frame.data().iter().all(|&v| v == 7));
    }

    #[test]
    fn test_small_box_is_filled() {
        let mut frame = Frame::filled(10, 10, [0, 0, 0], 0);
        RectangleOverlay::new(GREEN, 3)
            .draw(&mut frame, &[region(2, 2, 6, 6)])
            .unwrap();
        for y in 2..6 {
            for x in 2..6 {
                assert_eq!(pixel(&frame, x, y), GREEN);
            }
        }
    }

    #[test]
    fn test_zero_thickness_is_one_pixel() {
        let mut frame = Frame::filled(10, 10, [0, 0, 0], 0);
        RectangleOverlay::new(GREEN, 0)
            .draw(&mut frame, &[region(1, 1, 9, 9)])
            .unwrap();
        assert_eq!(pixel(&frame, 1, 5), GREEN);
        assert_eq!(pixel(&frame, 2, 5), [0, 0, 0]);
    }
}

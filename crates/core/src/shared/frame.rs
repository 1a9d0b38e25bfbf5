use ndarray::ArrayView3;

use crate::shared::region::CandidateRegion;

/// A single video frame: contiguous RGB bytes in row-major order.
///
/// Frames handed to the match worker are owned snapshots, so a clone is
/// a full pixel copy and never aliases the frame being displayed.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Solid-colour RGB frame, mostly useful for stubs and previews.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], index: usize) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self::new(data, width, height, 3, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels under `region` into a new frame.
    ///
    /// The region is clipped to the frame first; returns `None` when nothing
    /// of it lies inside the frame.
    pub fn crop(&self, region: &CandidateRegion) -> Option<Frame> {
        let clipped = region.clamp_to(self.width, self.height)?;
        let x1 = clipped.x1() as usize;
        let y1 = clipped.y1() as usize;
        let w = clipped.width() as usize;
        let h = clipped.height() as usize;
        let ch = self.channels as usize;
        let stride = self.width as usize * ch;

        let mut pixels = Vec::with_capacity(w * h * ch);
        for row in y1..y1 + h {
            let start = row * stride + x1 * ch;
            pixels.extend_from_slice(&self.data[start..start + w * ch]);
        }
        Some(Frame::new(
            pixels,
            w as u32,
            h as u32,
            self.channels,
            self.index,
        ))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        // Red channel encodes x, green encodes y.
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[x as u8, y as u8, 0]);
            }
        }
        Frame::new(data, width, height, 3, 7)
    }

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_filled_repeats_colour() {
        let frame = Frame::filled(3, 2, [1, 2, 3], 0);
        assert_eq!(frame.data().len(), 18);
        assert!(frame.data().chunks(3).all(|px| px == [1, 2, 3]));
    }

    #[test]
    fn test_clone_is_independent_snapshot() {
        let frame = Frame::filled(2, 2, [100, 100, 100], 0);
        let mut cloned = frame.clone();
        cloned.data_mut()[0] = 0;
        assert_eq!(frame.data()[0], 100);
        assert_eq!(cloned.data()[0], 0);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let frame = Frame::filled(4, 2, [0, 0, 0], 0);
        assert_eq!(frame.as_ndarray().shape(), &[2, 4, 3]);
    }

    #[test]
    fn test_crop_copies_region_pixels() {
        let frame = gradient_frame(10, 8);
        let region = CandidateRegion::new(2, 3, 5, 6).unwrap();
        let crop = frame.crop(&region).unwrap();

        assert_eq!(crop.width(), 3);
        assert_eq!(crop.height(), 3);
        assert_eq!(crop.index(), 7);
        let arr = crop.as_ndarray();
        assert_eq!(arr[[0, 0, 0]], 2); // x
        assert_eq!(arr[[0, 0, 1]], 3); // y
        assert_eq!(arr[[2, 2, 0]], 4);
        assert_eq!(arr[[2, 2, 1]], 5);
    }

    #[test]
    fn test_crop_clips_to_frame() {
        let frame = gradient_frame(10, 8);
        let region = CandidateRegion::new(-5, -5, 3, 2).unwrap();
        let crop = frame.crop(&region).unwrap();
        assert_eq!(crop.width(), 3);
        assert_eq!(crop.height(), 2);
        assert_eq!(crop.as_ndarray()[[0, 0, 0]], 0);
    }

    #[test]
    fn test_crop_outside_frame_is_none() {
        let frame = gradient_frame(10, 8);
        let region = CandidateRegion::new(20, 20, 30, 30).unwrap();
        assert!(frame.crop(&region).is_none());
    }
}

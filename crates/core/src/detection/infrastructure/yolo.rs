//! Shared YOLO pre- and post-processing.
//!
//! Both the person detector and the face locator run Ultralytics-style
//! models: letterboxed NCHW input, one row of box features per anchor,
//! greedy NMS on the way out. They differ only in how a row is scored.

use crate::shared::frame::Frame;
use crate::shared::region::CandidateRegion;

/// Fallback model input resolution when the model doesn't specify dimensions.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
pub const NMS_IOU_THRESH: f64 = 0.45;

/// How confidence is encoded in each output row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum YoloLayout {
    /// `[cx, cy, w, h, conf, ...extras]` (e.g. face-pose models).
    SingleClass,
    /// `[cx, cy, w, h, score_0, ..., score_n]` (e.g. COCO detectors).
    MultiClass,
}

/// Scale and padding applied by [`letterbox`], needed to map boxes back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Letterbox {
    pub scale: f64,
    pub pad_x: u32,
    pub pad_y: u32,
}

impl Letterbox {
    fn unmap(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawDetection {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub confidence: f64,
    pub class_id: u32,
}

impl RawDetection {
    fn bbox(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Converts to a region clipped to the frame, dropping boxes that
    /// collapse after clipping.
    pub fn to_region(&self, frame_w: u32, frame_h: u32) -> Option<CandidateRegion> {
        let x1 = self.x1.max(0.0);
        let y1 = self.y1.max(0.0);
        let x2 = self.x2.min(frame_w as f64);
        let y2 = self.y2.min(frame_h as f64);
        CandidateRegion::from_xyxy(x1, y1, x2, y2).ok()
    }
}

/// Reads the square input size from an NCHW model input, if static.
pub fn model_input_size(session: &ort::session::Session) -> u32 {
    session
        .inputs()
        .first()
        .and_then(|input| {
            if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                if shape.len() >= 4 && shape[2] > 0 {
                    Some(shape[2] as u32)
                } else {
                    None
                }
            } else {
                None
            }
        })
        .unwrap_or(DEFAULT_INPUT_SIZE)
}

/// Letterbox-resize a frame to `target_size` x `target_size`.
///
/// Returns the NCHW float32 tensor and the transform applied.
pub fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padding is 114/255 gray, the YOLO convention.
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    )
}

/// Parses a `[1, features, anchors]` or `[1, anchors, features]` output
/// into detections in original frame coordinates.
///
/// Rows scoring below `confidence` are dropped. For multi-class layouts,
/// a row's class is its arg-max score.
pub fn decode(
    data: &[f32],
    shape: &[usize],
    layout: YoloLayout,
    confidence: f64,
    transform: &Letterbox,
) -> Result<Vec<RawDetection>, String> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}"));
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if data.len() < num_dets * num_feats {
        return Err(format!(
            "YOLO output holds {} values, shape {shape:?} needs {}",
            data.len(),
            num_dets * num_feats
        ));
    }
    if num_feats < 5 {
        return Ok(Vec::new());
    }

    let value = |det: usize, feat: usize| -> f32 {
        if transposed {
            data[feat * num_dets + det]
        } else {
            data[det * num_feats + feat]
        }
    };

    let mut dets = Vec::new();
    for i in 0..num_dets {
        let (class_id, score) = match layout {
            YoloLayout::SingleClass => (0, value(i, 4) as f64),
            YoloLayout::MultiClass => (4..num_feats)
                .map(|f| ((f - 4) as u32, value(i, f) as f64))
                .fold((0, f64::MIN), |best, cur| if cur.1 > best.1 { cur } else { best }),
        };
        if score < confidence {
            continue;
        }

        let cx = value(i, 0) as f64;
        let cy = value(i, 1) as f64;
        let w = value(i, 2) as f64;
        let h = value(i, 3) as f64;
        let (x1, y1) = transform.unmap(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = transform.unmap(cx + w / 2.0, cy + h / 2.0);

        dets.push(RawDetection {
            x1,
            y1,
            x2,
            y2,
            confidence: score,
            class_id,
        });
    }
    Ok(dets)
}

/// Greedy class-aware NMS: sort by confidence descending, suppress
/// same-class boxes overlapping a kept box.
pub fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if suppressed[j] || dets[j].class_id != dets[i].class_id {
                continue;
            }
            if bbox_iou(&dets[i].bbox(), &dets[j].bbox()) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

/// IoU between two bounding boxes represented as `[x1, y1, x2, y2]`.
pub fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const IDENTITY: Letterbox = Letterbox {
        scale: 1.0,
        pad_x: 0,
        pad_y: 0,
    };

    fn det(x1: f64, y1: f64, x2: f64, y2: f64, confidence: f64, class_id: u32) -> RawDetection {
        RawDetection {
            x1,
            y1,
            x2,
            y2,
            confidence,
            class_id,
        }
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 → 640: scale 3.2, new 640x320, pad_y 160
        let frame = Frame::filled(200, 100, [128, 128, 128], 0);
        let (tensor, lb) = letterbox(&frame, 640);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(lb.scale, 3.2, epsilon = 0.01);
        assert_eq!(lb.pad_x, 0);
        assert_eq!(lb.pad_y, 160);
    }

    #[test]
    fn test_letterbox_values_normalized() {
        let frame = Frame::filled(100, 50, [255, 255, 255], 0);
        let (tensor, lb) = letterbox(&frame, 640);

        let y = lb.pad_y as usize + 1;
        assert_relative_eq!(tensor[[0, 0, y, 1]], 1.0, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 114.0 / 255.0, epsilon = 0.01);
    }

    /// Row-major `[1, anchors, features]` output, padded with empty
    /// anchors so the layout is not mistaken for the transposed one.
    fn row_major(rows: &[Vec<f32>]) -> (Vec<f32>, Vec<usize>) {
        let feats = rows[0].len();
        let anchors = rows.len().max(feats + 1);
        let mut data = vec![0.0f32; anchors * feats];
        for (i, row) in rows.iter().enumerate() {
            data[i * feats..(i + 1) * feats].copy_from_slice(row);
        }
        (data, vec![1, anchors, feats])
    }

    #[test]
    fn test_decode_multiclass_row_major() {
        let (data, shape) = row_major(&[
            vec![50.0, 50.0, 20.0, 40.0, 0.9, 0.1], // person
            vec![10.0, 10.0, 4.0, 4.0, 0.2, 0.8],   // class 1
        ]);
        let dets = decode(&data, &shape, YoloLayout::MultiClass, 0.5, &IDENTITY).unwrap();

        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].class_id, 0);
        assert_relative_eq!(dets[0].x1, 40.0);
        assert_relative_eq!(dets[0].y1, 30.0);
        assert_relative_eq!(dets[0].x2, 60.0);
        assert_relative_eq!(dets[0].y2, 70.0);
        assert_eq!(dets[1].class_id, 1);
    }

    #[test]
    fn test_decode_transposed_layout() {
        // [1, 6 features, 8 anchors]: only anchor 3 is confident.
        let num_dets = 8;
        let mut data = vec![0.0f32; 6 * num_dets];
        let set = |data: &mut Vec<f32>, f: usize, v: f32| data[f * num_dets + 3] = v;
        set(&mut data, 0, 100.0);
        set(&mut data, 1, 100.0);
        set(&mut data, 2, 10.0);
        set(&mut data, 3, 10.0);
        set(&mut data, 5, 0.7);

        let dets = decode(&data, &[1, 6, 8], YoloLayout::MultiClass, 0.5, &IDENTITY).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 1);
        assert_relative_eq!(dets[0].confidence, 0.7, epsilon = 1e-6);
        assert_relative_eq!(dets[0].x1, 95.0);
    }

    #[test]
    fn test_decode_single_class_ignores_extras() {
        let (data, shape) = row_major(&[vec![20.0, 20.0, 10.0, 10.0, 0.9, 5.0, 5.0, 0.99]]);
        let dets = decode(&data, &shape, YoloLayout::SingleClass, 0.5, &IDENTITY).unwrap();
        assert_eq!(dets.len(), 1);
        assert_relative_eq!(dets[0].confidence, 0.9, epsilon = 1e-6);
    }

    #[test]
    fn test_decode_undoes_letterbox() {
        let lb = Letterbox {
            scale: 2.0,
            pad_x: 0,
            pad_y: 100,
        };
        let (data, shape) = row_major(&[vec![100.0, 200.0, 40.0, 40.0, 0.9]]);
        let dets = decode(&data, &shape, YoloLayout::SingleClass, 0.5, &lb).unwrap();
        assert_relative_eq!(dets[0].x1, 40.0);
        assert_relative_eq!(dets[0].y1, 40.0);
        assert_relative_eq!(dets[0].x2, 60.0);
        assert_relative_eq!(dets[0].y2, 60.0);
    }

    #[test]
    fn test_decode_rejects_bad_shape() {
        assert!(decode(&[0.0; 4], &[4], YoloLayout::SingleClass, 0.5, &IDENTITY).is_err());
        assert!(decode(&[0.0; 4], &[1, 2, 5], YoloLayout::SingleClass, 0.5, &IDENTITY).is_err());
    }

    #[test]
    fn test_nms_suppresses_overlapping_same_class() {
        let mut dets = vec![
            det(0.0, 0.0, 100.0, 100.0, 0.8, 0),
            det(5.0, 5.0, 105.0, 105.0, 0.9, 0),
        ];
        let kept = nms(&mut dets, 0.3);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_keeps_overlapping_different_class() {
        let mut dets = vec![
            det(0.0, 0.0, 100.0, 100.0, 0.9, 0),
            det(5.0, 5.0, 105.0, 105.0, 0.8, 1),
        ];
        assert_eq!(nms(&mut dets, 0.3).len(), 2);
    }

    #[test]
    fn test_nms_empty_input() {
        let mut dets: Vec<RawDetection> = Vec::new();
        assert!(nms(&mut dets, 0.3).is_empty());
    }

    #[test]
    fn test_to_region_clips_to_frame() {
        let region = det(-10.5, 5.2, 120.0, 50.9, 0.9, 0)
            .to_region(100, 100)
            .unwrap();
        assert_eq!(region, CandidateRegion::new(0, 5, 100, 50).unwrap());
    }

    #[test]
    fn test_to_region_drops_off_frame_box() {
        assert!(det(150.0, 0.0, 200.0, 50.0, 0.9, 0)
            .to_region(100, 100)
            .is_none());
    }

    #[test]
    fn test_bbox_iou() {
        let b = [0.0, 0.0, 10.0, 10.0];
        assert_relative_eq!(bbox_iou(&b, &b), 1.0);
        assert_eq!(bbox_iou(&b, &[20.0, 20.0, 30.0, 30.0]), 0.0);
    }
}

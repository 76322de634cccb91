//! FAST-9 corner detection and BRIEF binary descriptors.
//!
//! Stage motion is a pure translation, so descriptors are not steered by
//! keypoint orientation and detection runs at a single scale.

use image::{imageops, GrayImage};

use crate::consts::{BRIEF_PATCH_SIZE, BRIEF_SMOOTHING_SIGMA, BRIEF_WORDS};

/// Bresenham circle of radius 3 used by the FAST segment test.
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Contiguous arc length required by FAST-9.
const ARC_LENGTH: u32 = 9;

/// Keypoints closer than this to the border are dropped so every BRIEF
/// sample stays inside the image.
const BORDER: i32 = BRIEF_PATCH_SIZE / 2 + 1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyPoint {
    pub x: f32,
    pub y: f32,
    pub score: f32,
}

/// 256-bit binary descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Descriptor(pub [u64; BRIEF_WORDS]);

impl Descriptor {
    pub fn hamming_distance(&self, other: &Descriptor) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

/// Keypoints and their descriptors for one frame (same order).
#[derive(Clone, Debug, Default)]
pub struct FrameFeatures {
    pub keypoints: Vec<KeyPoint>,
    pub descriptors: Vec<Descriptor>,
}

impl FrameFeatures {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Detect FAST-9 corners with 3x3 non-maximum suppression, strongest first.
pub fn detect_fast(image: &GrayImage, threshold: u8, max_keypoints: usize) -> Vec<KeyPoint> {
    let (w, h) = (image.width() as i32, image.height() as i32);
    if w <= 2 * BORDER || h <= 2 * BORDER {
        return Vec::new();
    }

    let raw = image.as_raw();
    let px = |x: i32, y: i32| raw[(y * w + x) as usize] as i32;
    let t = threshold as i32;

    let mut scores = vec![0.0f32; (w * h) as usize];
    for y in BORDER..h - BORDER {
        for x in BORDER..w - BORDER {
            let p = px(x, y);

            // Any 9-pixel arc covers at least two of the four compass points.
            let mut compass_bright = 0;
            let mut compass_dark = 0;
            for &i in &[0usize, 4, 8, 12] {
                let v = px(x + CIRCLE[i].0, y + CIRCLE[i].1);
                if v > p + t {
                    compass_bright += 1;
                } else if v < p - t {
                    compass_dark += 1;
                }
            }
            if compass_bright < 2 && compass_dark < 2 {
                continue;
            }

            let mut bright_mask = 0u32;
            let mut dark_mask = 0u32;
            let mut bright_sum = 0i32;
            let mut dark_sum = 0i32;
            for (i, &(dx, dy)) in CIRCLE.iter().enumerate() {
                let v = px(x + dx, y + dy);
                if v > p + t {
                    bright_mask |= 1u32 << i;
                    bright_sum += v - p - t;
                } else if v < p - t {
                    dark_mask |= 1u32 << i;
                    dark_sum += p - v - t;
                }
            }

            let score = if has_arc(bright_mask) {
                bright_sum
            } else if has_arc(dark_mask) {
                dark_sum
            } else {
                continue;
            };
            scores[(y * w + x) as usize] = score as f32;
        }
    }

    let mut keypoints = Vec::new();
    for y in BORDER..h - BORDER {
        for x in BORDER..w - BORDER {
            let s = scores[(y * w + x) as usize];
            if s <= 0.0 {
                continue;
            }
            let is_max = (-1..=1).all(|dy| {
                (-1..=1).all(|dx| {
                    (dx == 0 && dy == 0) || scores[((y + dy) * w + x + dx) as usize] <= s
                })
            });
            if is_max {
                keypoints.push(KeyPoint {
                    x: x as f32,
                    y: y as f32,
                    score: s,
                });
            }
        }
    }

    keypoints.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.y.total_cmp(&b.y))
            .then(a.x.total_cmp(&b.x))
    });
    keypoints.truncate(max_keypoints);
    keypoints
}

/// True when the 16-bit circular mask has a run of at least `ARC_LENGTH` ones.
fn has_arc(mask: u32) -> bool {
    if mask.count_ones() < ARC_LENGTH {
        return false;
    }
    let doubled = mask | (mask << 16);
    let mut run = 0;
    for i in 0..32 {
        if doubled & (1u32 << i) != 0 {
            run += 1;
            if run >= ARC_LENGTH {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// BRIEF descriptor extractor with a fixed, seeded sampling pattern, so
/// descriptors from separate runs are comparable.
pub struct Brief {
    pattern: Vec<[(i32, i32); 2]>,
}

impl Default for Brief {
    fn default() -> Self {
        Self::new()
    }
}

impl Brief {
    pub fn new() -> Self {
        let half = BRIEF_PATCH_SIZE / 2;
        let span = (2 * half + 1) as u64;
        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        let mut next = || {
            // xorshift64*
            state ^= state >> 12;
            state ^= state << 25;
            state ^= state >> 27;
            (state.wrapping_mul(0x2545_F491_4F6C_DD1D) % span) as i32 - half
        };
        let pattern = (0..BRIEF_WORDS * 64)
            .map(|_| [(next(), next()), (next(), next())])
            .collect();
        Self { pattern }
    }

    /// Descriptors for `keypoints`, sampled from a smoothed copy of `image`.
    pub fn compute(&self, image: &GrayImage, keypoints: &[KeyPoint]) -> Vec<Descriptor> {
        let smoothed = imageops::blur(image, BRIEF_SMOOTHING_SIGMA);
        keypoints
            .iter()
            .map(|kp| self.describe(&smoothed, kp))
            .collect()
    }

    fn describe(&self, image: &GrayImage, kp: &KeyPoint) -> Descriptor {
        let (w, h) = (image.width() as i32, image.height() as i32);
        let sample = |x: i32, y: i32| -> u8 {
            let cx = x.clamp(0, w - 1) as u32;
            let cy = y.clamp(0, h - 1) as u32;
            image.get_pixel(cx, cy)[0]
        };

        let (kx, ky) = (kp.x as i32, kp.y as i32);
        let mut words = [0u64; BRIEF_WORDS];
        for (i, [(x1, y1), (x2, y2)]) in self.pattern.iter().enumerate() {
            if sample(kx + x1, ky + y1) < sample(kx + x2, ky + y2) {
                words[i / 64] |= 1u64 << (i % 64);
            }
        }
        Descriptor(words)
    }
}

/// Detect and describe one grayscale frame.
pub fn extract_features(
    image: &GrayImage,
    brief: &Brief,
    fast_threshold: u8,
    max_keypoints: usize,
) -> FrameFeatures {
    let keypoints = detect_fast(image, fast_threshold, max_keypoints);
    let descriptors = brief.compute(image, &keypoints);
    FrameFeatures {
        keypoints,
        descriptors,
    }
}

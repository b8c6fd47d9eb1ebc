//! Per-channel variability and the pixel-value thresholds/reference points
//! derived from a palette, ported from `getPaletteThreshold`.

use crate::error::{Error, Result};

/// The number of distinguishable levels `decodeModule` expects per
/// channel (R, G, B) for a given color count.
pub fn variability_vector(color_count: u32) -> Result<[u32; 3]> {
    Ok(match color_count {
        2 | 4 | 8 => [2, 2, 2],
        16 => [4, 2, 2],
        32 => [4, 4, 2],
        64 => [4, 4, 4],
        128 => [8, 4, 4],
        256 => [8, 8, 4],
        _ => return Err(Error::InvalidColorCount(color_count as u8)),
    })
}

/// Flattened per-channel thresholds and, for `color_count > 8`,
/// reference points used to break ties between adjacent levels.
#[derive(Clone, Debug)]
pub struct PaletteThresholds {
    pub vs: [u32; 3],
    /// `vs[0]+1 + vs[1]+1 + vs[2]+1` entries, channel-major.
    pub thresholds: Vec<f32>,
    /// `(vs[0]-2) + (vs[1]-2) + (vs[2]-2)` entries, empty for
    /// `color_count <= 8` where every channel only has 2 levels.
    pub reference_points: Vec<f32>,
}

fn max4(a: u8, b: u8, c: u8, d: u8) -> i32 {
    a.max(b).max(c).max(d) as i32
}
fn min4(a: u8, b: u8, c: u8, d: u8) -> i32 {
    a.min(b).min(c).min(d) as i32
}

/// Builds thresholds/reference points for a `color_count`-entry `palette`
/// (flat R,G,B bytes), mirroring `getPaletteThreshold` branch for branch.
pub fn get_palette_threshold(palette: &[u8], color_count: u32) -> Result<PaletteThresholds> {
    let vs = variability_vector(color_count)?;
    let p = palette;

    if color_count == 2 {
        let mut thresholds = Vec::with_capacity(9);
        for ch in 0..3 {
            thresholds.push(0.0);
            thresholds.push((p[ch] as f32 + p[3 + ch] as f32) / 2.0);
            thresholds.push(255.0);
        }
        return Ok(PaletteThresholds {
            vs,
            thresholds,
            reference_points: Vec::new(),
        });
    }

    if color_count == 4 {
        let cpr0 = p[0].max(p[3]) as i32;
        let cpr1 = p[6].min(p[9]) as i32;
        let cpg0 = p[1].max(p[7]) as i32;
        let cpg1 = p[4].min(p[10]) as i32;
        let cpb0 = p[8].max(p[11]) as i32;
        let cpb1 = p[2].min(p[5]) as i32;
        let thresholds = vec![
            0.0,
            (cpr0 + cpr1) as f32 / 2.0,
            255.0,
            0.0,
            (cpg0 + cpg1) as f32 / 2.0,
            255.0,
            0.0,
            (cpb0 + cpb1) as f32 / 2.0,
            255.0,
        ];
        return Ok(PaletteThresholds {
            vs,
            thresholds,
            reference_points: Vec::new(),
        });
    }

    if color_count == 8 {
        let cpr0 = max4(p[0], p[3], p[6], p[9]);
        let cpr1 = min4(p[12], p[15], p[18], p[21]);
        let cpg0 = max4(p[1], p[4], p[13], p[16]);
        let cpg1 = min4(p[7], p[10], p[19], p[22]);
        let cpb0 = max4(p[2], p[8], p[14], p[20]);
        let cpb1 = min4(p[5], p[11], p[17], p[23]);
        let thresholds = vec![
            0.0,
            (cpr0 + cpr1) as f32 / 2.0,
            255.0,
            0.0,
            (cpg0 + cpg1) as f32 / 2.0,
            255.0,
            0.0,
            (cpb0 + cpb1) as f32 / 2.0,
            255.0,
        ];
        return Ok(PaletteThresholds {
            vs,
            thresholds,
            reference_points: Vec::new(),
        });
    }

    // color_count > 8: find, per channel, the min/max of every block of
    // values that share the same level index in that channel, then
    // derive critical points, thresholds and reference points from them.
    let mut thresholds = vec![0.0f32; (vs[0] + vs[1] + vs[2] + 3) as usize];
    let rp_len = (vs[0] as i64 - 2).max(0) + (vs[1] as i64 - 2).max(0) + (vs[2] as i64 - 2).max(0);
    let mut reference_points = vec![0.0f32; rp_len.max(0) as usize];

    let mut ths_offset = 0usize;
    let mut rp_offset = 0usize;
    for ch in 0..3usize {
        let (block, step) = match ch {
            0 => (vs[1] * vs[2], vs[0] * vs[1] * vs[2]),
            1 => (vs[2], vs[1] * vs[2]),
            _ => (1, vs[2]),
        };
        let cps_count = (vs[ch] - 1) * 2;
        let mut cps = vec![0i32; cps_count as usize];
        let mut cps_index = 0usize;
        for i in 0..vs[ch] {
            let mut min = 255i32;
            let mut max = 0i32;
            let mut j = i * block;
            while j < color_count {
                for k in 0..block {
                    let channel_value = p[3 * (j + k) as usize + ch] as i32;
                    min = min.min(channel_value);
                    max = max.max(channel_value);
                }
                j += step;
            }
            if cps_index == 0 {
                cps[cps_index] = max;
                cps_index += 1;
            } else if cps_index == cps_count as usize - 1 {
                cps[cps_index] = min;
            } else {
                cps[cps_index] = min;
                cps[cps_index + 1] = max;
                cps_index += 2;
            }
        }

        thresholds[ths_offset] = 0.0;
        let mut local_cps_index = 0usize;
        for i in 1..vs[ch] {
            thresholds[ths_offset + i as usize] =
                (cps[local_cps_index] + cps[local_cps_index + 1]) as f32 / 2.0;
            if i != vs[ch] - 1 {
                reference_points[rp_offset + i as usize - 1] =
                    (cps[local_cps_index + 1] + cps[local_cps_index + 2]) as f32 / 2.0;
            }
            local_cps_index += 2;
        }
        thresholds[ths_offset + vs[ch] as usize] = 255.0;
        ths_offset += vs[ch] as usize + 1;
        rp_offset += (vs[ch] as i64 - 2).max(0) as usize;
    }

    Ok(PaletteThresholds {
        vs,
        thresholds,
        reference_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_color_threshold_is_midpoint() {
        let palette = [0, 0, 0, 200, 200, 200];
        let t = get_palette_threshold(&palette, 2).unwrap();
        assert_eq!(t.thresholds, vec![0.0, 100.0, 255.0, 0.0, 100.0, 255.0, 0.0, 100.0, 255.0]);
    }

    #[test]
    fn rejects_unsupported_color_count() {
        assert!(variability_vector(7).is_err());
    }
}

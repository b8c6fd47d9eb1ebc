//! Module color classification: mapping a sampled RGB triple to a palette
//! index, either by nearest-neighbor hard decision or threshold-driven
//! soft decision with per-bit reliabilities.

use crate::palette::{model::get_palette_threshold, Palette};

/// Nearest-palette-entry hard decision, ported from `decodeModuleHD`.
/// Falls back to a plain luma split when `palette` is `None`, matching
/// `decoder.c`'s "no palette available" branch.
pub fn decode_module_hd(palette: Option<&Palette>, r: u8, g: u8, b: u8) -> u8 {
    let Some(palette) = palette else {
        let count = (r > 100) as u32 + (g > 100) as u32 + (b > 100) as u32;
        return (count > 1) as u8;
    };

    let mut index1 = 0u8;
    let mut index2 = 0u8;
    let mut min1 = 255 * 255 * 3;
    let mut min2 = 255 * 255 * 3;
    for i in 0..palette.color_count() as usize {
        let (pr, pg, pb) = palette.rgb(i);
        let diff = sq_diff(pr, r) + sq_diff(pg, g) + sq_diff(pb, b);
        if diff < min1 {
            min2 = min1;
            index2 = index1;
            min1 = diff;
            index1 = i as u8;
        } else if diff < min2 {
            min2 = diff;
            index2 = i as u8;
        }
    }

    // If the two closest palette entries are nearly equidistant, break the
    // tie using hue ratios rather than raw distance, which is far more
    // robust to uneven channel gain from the capture device.
    if (min1 as f32) * 1.5 > min2 as f32 {
        let rg = (r as i32 - g as i32).unsigned_abs() as i32;
        let rb = (r as i32 - b as i32).unsigned_abs() as i32;
        let gb = (g as i32 - b as i32).unsigned_abs() as i32;

        let diff1 = hue_distance(palette, index1, rg, rb, gb);
        let diff2 = hue_distance(palette, index2, rg, rb, gb);
        if diff2 < diff1 {
            return index2;
        }
    }
    index1
}

fn sq_diff(a: u8, b: u8) -> i32 {
    let d = a as i32 - b as i32;
    d * d
}

fn hue_distance(palette: &Palette, index: u8, rg: i32, rb: i32, gb: i32) -> i32 {
    let (cr, cg, cb) = palette.rgb(index as usize);
    let crg = (cr as i32 - cg as i32).unsigned_abs() as i32;
    let crb = (cr as i32 - cb as i32).unsigned_abs() as i32;
    let cgb = (cg as i32 - cb as i32).unsigned_abs() as i32;
    (rg - crg).unsigned_abs() as i32 + (rb - crb).unsigned_abs() as i32 + (gb - cgb).unsigned_abs() as i32
}

/// Threshold-driven soft decision, ported from `decodeModule`. Returns the
/// palette index plus, in `probabilities`, one reliability value per data
/// bit this module carries (`log2(color_count)` entries for
/// `color_count > 8`, 1..3 entries otherwise matching the channel
/// grouping `decoder.c` uses).
pub fn decode_module(
    palette: &[u8],
    color_count: u32,
    thresholds: &[f32],
    reference_points: &[f32],
    rgb: (u8, u8, u8),
    probabilities: &mut [f32],
) -> crate::error::Result<u8> {
    let vs = crate::palette::model::variability_vector(color_count)?;
    let (r, g, b) = (rgb.0 as f32, rgb.1 as f32, rgb.2 as f32);
    let channels = [r, g, b];

    let mut cp = [0.0f32; 3];
    let mut cv = [0u32; 3];

    if color_count < 16 {
        let mut ths_offset = 0usize;
        for ch in 0..3 {
            let value = channels[ch];
            if value < thresholds[ths_offset + 1] {
                cp[ch] = 1.0 - value / thresholds[ths_offset + 1];
                cv[ch] = 0;
            } else {
                cp[ch] = (value - thresholds[ths_offset + 1]) / (255.0 - thresholds[ths_offset + 1]);
                cv[ch] = 1;
            }
            ths_offset += vs[ch] as usize + 1;
        }

        let index;
        if color_count == 2 {
            index = ((cv[0] + cv[1] + cv[2]) > 1) as u8;
            probabilities[0] = (cp[0] + cp[1] + cp[2]) / 3.0;
        } else if color_count == 4 {
            index = (cv[0] * vs[1] + cv[1]) as u8;
            probabilities[0] = cp[0];
            probabilities[1] = cp[1];
        } else {
            index = (cv[0] * vs[1] * vs[2] + cv[1] * vs[2] + cv[2]) as u8;
            probabilities[0] = cp[0];
            probabilities[1] = cp[1];
            probabilities[2] = cp[2];
        }
        return Ok(index);
    }

    let mut ths_offset = 0usize;
    let mut rp_offset = 0usize;
    for ch in 0..3 {
        let value = channels[ch];
        for i in 0..vs[ch] {
            let i = i as usize;
            if value >= thresholds[ths_offset + i] && value <= thresholds[ths_offset + i + 1] {
                cv[ch] = i as u32;
                if i == 0 {
                    cp[ch] = 1.0 - value / thresholds[ths_offset + i + 1];
                } else if i as u32 == vs[ch] - 1 {
                    cp[ch] = (value - thresholds[ths_offset + i]) / (255.0 - thresholds[ths_offset + i]);
                } else if value <= reference_points[rp_offset + i - 1] {
                    cp[ch] = (value - thresholds[ths_offset + i])
                        / (reference_points[rp_offset + i - 1] - thresholds[ths_offset + i]);
                } else {
                    cp[ch] = (thresholds[ths_offset + i + 1] - value)
                        / (thresholds[ths_offset + i + 1] - reference_points[rp_offset + i - 1]);
                }
            }
        }
        ths_offset += vs[ch] as usize + 1;
        rp_offset += vs[ch] as usize - 2;
    }

    let index = cv[0] * vs[1] * vs[2] + cv[1] * vs[2] + cv[2];
    let bits_count = (color_count as f32).log2() as usize;
    let average = (cp[0] + cp[1] + cp[2]) / 3.0;
    for p in probabilities.iter_mut().take(bits_count) {
        *p = average;
    }
    let _ = palette;
    Ok(index as u8)
}

/// A deliberately unused-by-default refinement for the 8-color case: the
/// commented-out red/magenta and blue/cyan disambiguation from
/// `decodeModule`. Kept as an explicit opt-in function rather than dead
/// code in a comment, since it is a real (if speculative) robustness
/// improvement the original authors tried and never enabled.
pub fn refine_hue_ambiguity(palette: &[u8], rgb: (f32, f32, f32), cv: &mut [u32; 3]) {
    let (r, g, b) = rgb;
    if cv[0] == 1 && cv[1] == 0 {
        let cpb0 = max4b(palette[2], palette[8], palette[14], palette[20]) as f32;
        let cpb1 = min4b(palette[5], palette[11], palette[17], palette[23]) as f32;
        let b_g = (palette[14] as f32 / palette[13] as f32 + palette[17] as f32 / palette[16] as f32) / 2.0;
        if cv[2] == 0 && b > cpb0 {
            if b / g > b_g {
                cv[2] = 1;
            }
        } else if cv[2] == 1 && b < cpb1 && b / g < b_g {
            cv[2] = 0;
        }
    } else if cv[0] == 0 && cv[2] == 1 {
        let cpg0 = max4b(palette[1], palette[4], palette[13], palette[16]) as f32;
        let cpg1 = min4b(palette[7], palette[10], palette[19], palette[22]) as f32;
        let g_b = (palette[4] as f32 / palette[5] as f32 + palette[10] as f32 / palette[11] as f32) / 2.0;
        if cv[1] == 0 && g > cpg0 {
            if g / b > g_b {
                cv[1] = 1;
            }
        } else if cv[1] == 1 && g < cpg1 && g / b < g_b {
            cv[1] = 0;
        }
    }
}

fn max4b(a: u8, b: u8, c: u8, d: u8) -> u8 {
    a.max(b).max(c).max(d)
}
fn min4b(a: u8, b: u8, c: u8, d: u8) -> u8 {
    a.min(b).min(c).min(d)
}

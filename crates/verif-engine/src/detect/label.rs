//! Connected-component labeling and region merging.

use verif_common::GridField;

/// One contiguous candidate region prior to object statistics.
#[derive(Debug, Clone)]
pub(crate) struct Region {
    /// Member pixels as (row, col).
    pub pixels: Vec<(usize, usize)>,
    /// Maximum field value over the members.
    pub max_value: f64,
    /// Position of the maximum.
    pub peak: (usize, usize),
}

impl Region {
    pub fn size(&self) -> usize {
        self.pixels.len()
    }

    /// Merge another region into this one.
    pub fn absorb(&mut self, other: Region) {
        if other.max_value > self.max_value {
            self.max_value = other.max_value;
            self.peak = other.peak;
        }
        self.pixels.extend(other.pixels);
    }
}

/// Label 8-connected regions of finite pixels at or above `minref`.
///
/// Flood fill with an explicit stack; regions come back in scan order.
pub(crate) fn label_regions(field: &GridField, minref: f64) -> Vec<Region> {
    let (rows, cols) = field.shape();
    let candidate = |row: usize, col: usize| {
        let v = field.at(row, col);
        v.is_finite() && v as f64 >= minref
    };

    let mut visited = vec![false; rows * cols];
    let mut regions = Vec::new();
    let mut stack = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            let idx = row * cols + col;
            if visited[idx] || !candidate(row, col) {
                continue;
            }

            let mut region = Region {
                pixels: Vec::new(),
                max_value: f64::NEG_INFINITY,
                peak: (row, col),
            };
            visited[idx] = true;
            stack.push((row, col));

            while let Some((r, c)) = stack.pop() {
                let v = field.at(r, c) as f64;
                if v > region.max_value {
                    region.max_value = v;
                    region.peak = (r, c);
                }
                region.pixels.push((r, c));

                for dr in -1i64..=1 {
                    for dc in -1i64..=1 {
                        if dr == 0 && dc == 0 {
                            continue;
                        }
                        let nr = r as i64 + dr;
                        let nc = c as i64 + dc;
                        if nr < 0 || nc < 0 || nr >= rows as i64 || nc >= cols as i64 {
                            continue;
                        }
                        let (nr, nc) = (nr as usize, nc as usize);
                        let nidx = nr * cols + nc;
                        if !visited[nidx] && candidate(nr, nc) {
                            visited[nidx] = true;
                            stack.push((nr, nc));
                        }
                    }
                }
            }

            regions.push(region);
        }
    }

    regions
}

/// Merge regions whose peaks are both close and of similar strength.
///
/// Regions are visited largest first; a smaller region is absorbed into
/// the first larger one whose peak lies within `mindis` pixels and whose
/// `maxref`-flattened peak differs by less than `mindiff`. Under the
/// adaptive parameterization every peak flattens to the same value, so the
/// rule degenerates to pure distance-based merging.
pub(crate) fn merge_regions(
    mut regions: Vec<Region>,
    maxref: f64,
    mindiff: f64,
    mindis: f64,
) -> Vec<Region> {
    if regions.len() < 2 || mindis <= 0.0 {
        return regions;
    }

    regions.sort_by(|a, b| {
        b.size()
            .cmp(&a.size())
            .then(b.max_value.total_cmp(&a.max_value))
    });

    let clip = |v: f64| v.min(maxref);
    let mut kept: Vec<Region> = Vec::new();

    'regions: for region in regions {
        for anchor in kept.iter_mut() {
            let dr = anchor.peak.0 as f64 - region.peak.0 as f64;
            let dc = anchor.peak.1 as f64 - region.peak.1 as f64;
            let distance = (dr * dr + dc * dc).sqrt();
            let contrast = (clip(anchor.max_value) - clip(region.max_value)).abs();
            if distance < mindis && contrast < mindiff {
                anchor.absorb(region);
                continue 'regions;
            }
        }
        kept.push(region);
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_from_rows(rows: &[&[f32]]) -> GridField {
        let height = rows.len();
        let width = rows[0].len();
        let data: Vec<f32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        GridField::new(data, width, height).unwrap()
    }

    #[test]
    fn test_label_single_region() {
        let field = field_from_rows(&[
            &[0.0, 0.0, 0.0],
            &[0.0, 5.0, 6.0],
            &[0.0, 4.0, 0.0],
        ]);
        let regions = label_regions(&field, 1.0);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].size(), 3);
        assert_eq!(regions[0].max_value, 6.0);
        assert_eq!(regions[0].peak, (1, 2));
    }

    #[test]
    fn test_label_diagonal_pixels_connect() {
        // 8-connectivity joins diagonal neighbors
        let field = field_from_rows(&[
            &[5.0, 0.0, 0.0],
            &[0.0, 5.0, 0.0],
            &[0.0, 0.0, 5.0],
        ]);
        let regions = label_regions(&field, 1.0);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].size(), 3);
    }

    #[test]
    fn test_label_separate_regions() {
        let field = field_from_rows(&[
            &[5.0, 0.0, 0.0, 0.0, 7.0],
            &[0.0, 0.0, 0.0, 0.0, 7.0],
            &[0.0, 0.0, 0.0, 0.0, 0.0],
        ]);
        let regions = label_regions(&field, 1.0);
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn test_label_skips_nan() {
        let field = field_from_rows(&[
            &[5.0, f32::NAN, 5.0],
            &[0.0, 0.0, 0.0],
            &[0.0, 0.0, 0.0],
        ]);
        // NaN never joins a region, but its diagonal-free gap still
        // bridges nothing here: the two pixels touch only through the NaN.
        let regions = label_regions(&field, 1.0);
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn test_merge_close_equal_peaks() {
        let field = field_from_rows(&[
            &[5.0, 0.0, 5.0],
            &[0.0, 0.0, 0.0],
            &[0.0, 0.0, 0.0],
        ]);
        let regions = label_regions(&field, 1.0);
        assert_eq!(regions.len(), 2);
        // peaks 2 pixels apart, equal strength: merged under mindis=3
        let merged = merge_regions(regions.clone(), 5.0, 1e-5, 3.0);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].size(), 2);
        // far enough apart under mindis=1: kept separate
        let separate = merge_regions(regions, 5.0, 1e-5, 1.0);
        assert_eq!(separate.len(), 2);
    }

    #[test]
    fn test_merge_respects_contrast() {
        let field = field_from_rows(&[
            &[5.0, 0.0, 50.0],
            &[0.0, 0.0, 0.0],
            &[0.0, 0.0, 0.0],
        ]);
        let regions = label_regions(&field, 1.0);
        // without flattening the peaks differ by 45 > mindiff, so the
        // regions stay separate even though they are close
        let merged = merge_regions(regions, f64::INFINITY, 8.0, 5.0);
        assert_eq!(merged.len(), 2);
    }
}

//! River width bands and seasonality.

use super::rivers::{River, RiverType};
use crate::mesh::Mesh;

pub const MIN_WIDTH: f32 = 1.0;
pub const MAX_WIDTH: f32 = 20.0;

/// Width from peak discharge on a log scale.
pub fn river_width(max_discharge: u32) -> f32 {
    ((max_discharge as f32 + 1.0).log10() * 5.0).clamp(MIN_WIDTH, MAX_WIDTH)
}

impl RiverType {
    pub fn from_width(width: f32) -> Self {
        if width <= 2.0 {
            RiverType::Stream
        } else if width <= 8.0 {
            RiverType::River
        } else {
            RiverType::MajorRiver
        }
    }
}

/// Set width, length and type on every river.
pub fn classify_widths(rivers: &mut [River]) {
    for river in rivers {
        river.width = river_width(river.max_discharge);
        river.length = river.cells.len();
        river.kind = RiverType::from_width(river.width);
    }
}

/// Flag rivers whose land cells average below `threshold` precipitation and
/// halve their width. Returns how many were flagged.
pub fn classify_seasonal(rivers: &mut [River], mesh: &Mesh, threshold: f32) -> usize {
    let mut flagged = 0;
    for river in rivers {
        let (sum, count) = river
            .cells
            .iter()
            .filter(|&&c| mesh.is_land(c))
            .fold((0.0f32, 0usize), |(s, n), &c| (s + mesh.cell(c).precipitation, n + 1));
        if count == 0 {
            continue;
        }
        if sum / (count as f32) < threshold {
            river.is_seasonal = true;
            river.width = (river.width * 0.5).max(MIN_WIDTH);
            flagged += 1;
        }
    }
    flagged
}

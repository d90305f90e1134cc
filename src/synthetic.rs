//! Synthetic test meshes.
//!
//! All meshes are hexagonal lattices in odd-r layout (odd rows shifted half a
//! cell east), so every interior cell has six neighbors and cell positions
//! are evenly spaced one unit apart.

use noise::{NoiseFn, Perlin, Seedable};

use crate::error::MeshError;
use crate::mesh::{Cell, CellId, Mesh, MAX_HEIGHT, MAX_PRECIPITATION};

const ROW_SPACING: f32 = 0.866_025_4; // sqrt(3) / 2

/// Id of the cell at (`col`, `row`) in a lattice `width` cells wide.
pub fn hex_index(width: usize, col: usize, row: usize) -> CellId {
    (row * width + col) as CellId
}

/// Planar position of a lattice cell.
pub fn hex_position(col: usize, row: usize) -> [f32; 2] {
    let shift = if row % 2 == 1 { 0.5 } else { 0.0 };
    [col as f32 + shift, row as f32 * ROW_SPACING]
}

fn hex_neighbors(width: usize, height: usize, col: usize, row: usize) -> Vec<CellId> {
    let (c, r) = (col as isize, row as isize);
    let offsets: [(isize, isize); 6] = if row % 2 == 0 {
        [(-1, 0), (1, 0), (-1, -1), (0, -1), (-1, 1), (0, 1)]
    } else {
        [(-1, 0), (1, 0), (0, -1), (1, -1), (0, 1), (1, 1)]
    };
    offsets
        .iter()
        .map(|&(dc, dr)| (c + dc, r + dr))
        .filter(|&(nc, nr)| nc >= 0 && nr >= 0 && (nc as usize) < width && (nr as usize) < height)
        .map(|(nc, nr)| hex_index(width, nc as usize, nr as usize))
        .collect()
}

/// Build a `width` x `height` hex lattice. `terrain` returns (height,
/// precipitation) for each (col, row, position). Edge cells are map border.
pub fn hex_lattice<F>(width: usize, height: usize, mut terrain: F) -> Result<Mesh, MeshError>
where
    F: FnMut(usize, usize, [f32; 2]) -> (u8, f32),
{
    let mut cells = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let [x, y] = hex_position(col, row);
            let (h, precipitation) = terrain(col, row, [x, y]);
            let border = col == 0 || row == 0 || col + 1 == width || row + 1 == height;
            cells.push(
                Cell::new(h, hex_neighbors(width, height, col, row))
                    .with_position(x, y)
                    .with_border(border)
                    .with_precipitation(precipitation),
            );
        }
    }
    Mesh::new(cells)
}

fn lattice_center(width: usize, height: usize) -> ([f32; 2], f32) {
    let max_x = width.saturating_sub(1) as f32 + if height > 1 { 0.5 } else { 0.0 };
    let max_y = height.saturating_sub(1) as f32 * ROW_SPACING;
    let center = [max_x / 2.0, max_y / 2.0];
    let radius = center[0].min(center[1]).max(1.0);
    (center, radius)
}

/// Cone island: 80 at the center falling linearly to 0 at the inscribed
/// radius, uniform precipitation 1.0.
pub fn radial_island(width: usize, height: usize) -> Result<Mesh, MeshError> {
    let (center, radius) = lattice_center(width, height);
    hex_lattice(width, height, |_, _, [x, y]| {
        let d = ((x - center[0]).powi(2) + (y - center[1]).powi(2)).sqrt();
        let h = (80.0 * (1.0 - d / radius)).round().clamp(0.0, 80.0);
        (h as u8, 1.0)
    })
}

/// Island with Perlin-perturbed relief and a noisy precipitation field.
pub fn noisy_island(width: usize, height: usize, seed: u64) -> Result<Mesh, MeshError> {
    let (center, radius) = lattice_center(width, height);
    let relief = Perlin::new(1).set_seed(seed as u32);
    let detail = Perlin::new(1).set_seed((seed as u32).wrapping_add(1111));
    let rain = Perlin::new(1).set_seed((seed as u32).wrapping_add(2222));

    hex_lattice(width, height, |_, _, [x, y]| {
        let (fx, fy) = (x as f64, y as f64);
        let d = ((x - center[0]).powi(2) + (y - center[1]).powi(2)).sqrt() / radius;
        let falloff = (1.0 - d).max(0.0);

        let n = relief.get([fx * 0.08, fy * 0.08]) as f32 * 0.7
            + detail.get([fx * 0.25, fy * 0.25]) as f32 * 0.3;
        let h = (falloff * 85.0 + n * 22.0).round().clamp(0.0, MAX_HEIGHT as f32);

        let wet = 1.0 + rain.get([fx * 0.05, fy * 0.05, 0.5]) as f32 * 1.2;
        (h as u8, wet.clamp(0.0, MAX_PRECIPITATION))
    })
}

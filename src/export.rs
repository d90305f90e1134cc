use std::error::Error;
use std::fs;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::hydrology::Hydrology;
use crate::mesh::{Cell, Mesh, LAND_HEIGHT, MAX_HEIGHT};

/// Write the diagnostics report as pretty JSON.
pub fn export_report_json(hydrology: &Hydrology, path: &str) -> Result<(), Box<dyn Error>> {
    fs::write(path, hydrology.report.to_json()?)?;
    println!("Exported hydrology report to {}", path);
    Ok(())
}

/// Write rivers, lakes and deltas with their cell lists as JSON.
pub fn export_features_json(hydrology: &Hydrology, path: &str) -> Result<(), Box<dyn Error>> {
    let features = serde_json::json!({
        "rivers": hydrology.rivers,
        "lakes": hydrology.lakes,
        "deltas": hydrology.deltas,
        "coast": hydrology.coast,
    });
    fs::write(path, serde_json::to_string_pretty(&features)?)?;
    println!("Exported hydrology features to {}", path);
    Ok(())
}

/// Land color ramp: lowland green -> upland brown -> grey peaks.
fn land_color(height: u8) -> [u8; 3] {
    let t = (height.saturating_sub(LAND_HEIGHT)) as f32 / (MAX_HEIGHT - LAND_HEIGHT) as f32;
    let stops: [[f32; 3]; 4] = [
        [70.0, 140.0, 60.0],   // Lowland
        [150.0, 170.0, 90.0],  // Hills
        [140.0, 110.0, 80.0],  // Upland
        [220.0, 220.0, 220.0], // Peaks
    ];
    let scaled = t.clamp(0.0, 1.0) * 3.0;
    let idx = (scaled as usize).min(2);
    let frac = scaled - idx as f32;
    let (a, b) = (stops[idx], stops[idx + 1]);
    [
        (a[0] + (b[0] - a[0]) * frac) as u8,
        (a[1] + (b[1] - a[1]) * frac) as u8,
        (a[2] + (b[2] - a[2]) * frac) as u8,
    ]
}

fn cell_color(cell: &Cell, in_delta: bool) -> [u8; 3] {
    if cell.is_ocean() {
        // Deeper offshore is darker
        let depth = (-(cell.coast_distance as i32)).clamp(1, 8) as f32;
        let blue = (200.0 - depth * 12.0) as u8;
        return [20, 50, blue];
    }
    if cell.feature.is_lake() {
        return [70, 130, 210];
    }
    if in_delta {
        return [60, 200, 220];
    }
    if cell.river_id != 0 {
        let intensity = ((cell.flux.max(1) as f32).log2() * 12.0).min(120.0) as u8;
        return [20, 80 + intensity / 2, 135 + intensity];
    }
    land_color(cell.height)
}

/// Render the mesh as a PNG, painting each cell as a square of `scale`
/// pixels around its position.
pub fn export_mesh_png(
    mesh: &Mesh,
    hydrology: &Hydrology,
    path: &str,
    scale: u32,
) -> Result<(), Box<dyn Error>> {
    let scale = scale.max(1) as f32;
    let (mut max_x, mut max_y) = (0.0f32, 0.0f32);
    for cell in mesh.cells() {
        max_x = max_x.max(cell.position[0]);
        max_y = max_y.max(cell.position[1]);
    }
    let width = ((max_x + 1.0) * scale).ceil() as u32;
    let height = ((max_y + 1.0) * scale).ceil() as u32;
    let mut img: RgbImage = ImageBuffer::new(width.max(1), height.max(1));

    let mut in_delta = vec![false; mesh.len()];
    for delta in &hydrology.deltas {
        for &cell in delta.channels.iter().flatten() {
            in_delta[cell as usize] = true;
        }
    }

    let half = scale * 0.5;
    for cell in mesh.cells() {
        let color = cell_color(cell, in_delta[cell.id as usize]);
        let cx = (cell.position[0] + 0.5) * scale;
        let cy = (cell.position[1] + 0.5) * scale;
        let x0 = (cx - half).max(0.0) as u32;
        let y0 = (cy - half).max(0.0) as u32;
        let x1 = ((cx + half).ceil() as u32).min(img.width());
        let y1 = ((cy + half).ceil() as u32).min(img.height());
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, Rgb(color));
            }
        }
    }

    img.save(path)?;
    println!("Exported hydrology map to {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_land_ramp_endpoints() {
        assert_eq!(land_color(LAND_HEIGHT), [70, 140, 60]);
        assert_eq!(land_color(MAX_HEIGHT), [220, 220, 220]);
    }

    #[test]
    fn test_ocean_darkens_offshore() {
        let cells = vec![
            Cell::new(5, vec![1]).with_border(true),
            Cell::new(5, vec![0, 2]),
            Cell::new(40, vec![1]),
        ];
        let mut mesh = Mesh::new(cells).unwrap();
        crate::hydrology::mark_coast(&mut mesh);
        let near = cell_color(mesh.cell(1), false);
        let far = cell_color(mesh.cell(0), false);
        assert!(far[2] < near[2]);
    }
}

//! Write a small synthetic tree of plasma meshes for trying out the CLI:
//!
//! * `sample/datasets/<r=..>/<case>.vtu` + `.pins` for `aggregate`
//! * `sample/cases/plasma (<n>).vtu` with an `Electron_density` field for
//!   `slice` and `decay`

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use pin_density::data::mesh::{write_vtu, MeshData};
use pin_density::data::model::PointArray;

fn gaussian(x: f64, mu: f64, sigma: f64) -> f64 {
    (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Regular r–z grid of `nr × nz` points split into two triangles per cell.
fn grid_mesh(r_max: f64, z_max: f64, nr: usize, nz: usize) -> MeshData {
    let mut points = Vec::with_capacity(nr * nz);
    for j in 0..nz {
        for i in 0..nr {
            let r = r_max * i as f64 / (nr - 1) as f64;
            let z = z_max * j as f64 / (nz - 1) as f64;
            points.push([r, z]);
        }
    }

    let mut triangles = Vec::with_capacity(2 * (nr - 1) * (nz - 1));
    for j in 0..nz - 1 {
        for i in 0..nr - 1 {
            let a = j * nr + i;
            let b = a + 1;
            let c = a + nr;
            let d = c + 1;
            triangles.push([a, b, c]);
            triangles.push([b, d, c]);
        }
    }

    MeshData {
        points,
        triangles,
        point_data: Vec::new(),
    }
}

/// Density blob centred on the axis at `z0`, scaled by `peak` with
/// multiplicative noise.
fn density_field(mesh: &MeshData, peak: f64, z0: f64, width: f64, rng: &mut SimpleRng) -> Vec<f64> {
    mesh.points
        .iter()
        .map(|&[r, z]| {
            let shape = gaussian(r, 0.0, width) * gaussian(z, z0, width);
            let noise = rng.gauss(1.0, 0.05).max(0.5);
            // floor keeps every value positive for the log-space statistics
            peak * shape * noise + 1e12
        })
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn write_dataset(root: &Path, radius: f64, pins: &[f64], rng: &mut SimpleRng) -> Result<usize> {
    let dir = root.join(format!("r={radius}"));
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut mesh = grid_mesh(radius, 2.0 * radius, 12, 16);
    mesh.point_data = pins
        .iter()
        .enumerate()
        .map(|(i, &pin)| {
            // density grows sub-linearly with input power
            let peak = 1e15 * (pin / 100.0).sqrt();
            let values = density_field(&mesh, peak, radius, radius / 3.0, rng);
            PointArray::scalar(format!("electron_density_{}", i + 1), values)
        })
        .collect();

    let mesh_path = dir.join("case.vtu");
    write_vtu(&mesh, &mesh_path)?;

    let pin_text: Vec<String> = pins.iter().map(|p| p.to_string()).collect();
    let pin_path = mesh_path.with_extension("pins");
    fs::write(&pin_path, pin_text.join("\n"))
        .with_context(|| format!("writing {}", pin_path.display()))?;
    Ok(pins.len())
}

fn write_case(dir: &Path, index: u32, r_max: f64, rng: &mut SimpleRng) -> Result<()> {
    let mut mesh = grid_mesh(r_max, 60.0, 24, 40);
    let values = density_field(&mesh, 2e16, 25.0 + index as f64, r_max / 3.0, rng);
    mesh.point_data = vec![PointArray::scalar("Electron_density", values)];
    write_vtu(&mesh, &dir.join(format!("plasma ({index}).vtu")))?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut rng = SimpleRng::new(42);
    let root = Path::new("sample");

    let datasets = root.join("datasets");
    let mut fields = 0;
    for (radius, pins) in [
        (32.0, vec![100.0, 200.0, 400.0, 800.0]),
        (36.0, vec![100.0, 300.0, 1200.0]),
        (39.0, vec![200.0, 400.0, 600.0, 800.0, 1000.0]),
    ] {
        fields += write_dataset(&datasets, radius, &pins, &mut rng)?;
    }
    log::info!("Wrote 3 datasets ({fields} density fields) to {}", datasets.display());

    let cases = root.join("cases");
    fs::create_dir_all(&cases).with_context(|| format!("creating {}", cases.display()))?;
    for (index, r_max) in [(1, 30.0), (2, 34.0), (3, 38.0)] {
        write_case(&cases, index, r_max, &mut rng)?;
    }
    log::info!("Wrote 3 slice cases to {}", cases.display());
    Ok(())
}

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::data::mesh::{read_mesh, MeshData};
use crate::error::{PipelineError, Result};
use crate::stats::linspace;

const BARYCENTRIC_TOL: f64 = 1e-12;
const AXIS_TOL: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Linear interpolation on a triangulation
// ---------------------------------------------------------------------------

/// Piecewise-linear interpolation of point values over a triangle mesh.
pub struct TriInterpolator<'a> {
    points: &'a [[f64; 2]],
    triangles: &'a [[usize; 3]],
    values: &'a [f64],
    /// `[r_min, r_max, z_min, z_max]` per triangle.
    bounds: Vec<[f64; 4]>,
}

impl<'a> TriInterpolator<'a> {
    pub fn new(points: &'a [[f64; 2]], triangles: &'a [[usize; 3]], values: &'a [f64]) -> Self {
        let bounds = triangles
            .iter()
            .map(|tri| {
                let mut b = [f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY];
                for &v in tri {
                    let [r, z] = points[v];
                    b[0] = b[0].min(r);
                    b[1] = b[1].max(r);
                    b[2] = b[2].min(z);
                    b[3] = b[3].max(z);
                }
                b
            })
            .collect();
        TriInterpolator {
            points,
            triangles,
            values,
            bounds,
        }
    }

    /// Interpolated value at `(r, z)`, or `None` outside the mesh.
    pub fn at(&self, r: f64, z: f64) -> Option<f64> {
        self.triangles
            .iter()
            .zip(&self.bounds)
            .filter(|(_, b)| {
                r >= b[0] - AXIS_TOL && r <= b[1] + AXIS_TOL && z >= b[2] - AXIS_TOL && z <= b[3] + AXIS_TOL
            })
            .find_map(|(tri, _)| self.blend(tri, r, z))
    }

    fn blend(&self, tri: &[usize; 3], r: f64, z: f64) -> Option<f64> {
        let [ax, ay] = self.points[tri[0]];
        let [bx, by] = self.points[tri[1]];
        let [cx, cy] = self.points[tri[2]];

        let det = (by - cy) * (ax - cx) + (cx - bx) * (ay - cy);
        if det == 0.0 {
            return None;
        }
        let l1 = ((by - cy) * (r - cx) + (cx - bx) * (z - cy)) / det;
        let l2 = ((cy - ay) * (r - cx) + (ax - cx) * (z - cy)) / det;
        let l3 = 1.0 - l1 - l2;
        if l1 < -BARYCENTRIC_TOL || l2 < -BARYCENTRIC_TOL || l3 < -BARYCENTRIC_TOL {
            return None;
        }
        Some(l1 * self.values[tri[0]] + l2 * self.values[tri[1]] + l3 * self.values[tri[2]])
    }
}

// ---------------------------------------------------------------------------
// Cases
// ---------------------------------------------------------------------------

/// One mesh case prepared for slicing.
#[derive(Debug, Clone)]
pub struct SliceCase {
    pub index: u32,
    pub path: PathBuf,
    pub mesh: MeshData,
    pub density: Vec<f64>,
    pub r_min: f64,
    pub r_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

impl SliceCase {
    pub fn from_mesh(index: u32, path: PathBuf, mesh: MeshData, field: &str) -> Result<Self> {
        let array = mesh.point_array(field).ok_or_else(|| {
            PipelineError::Mesh(format!("{field} field missing in {}", path.display()))
        })?;
        if array.components != 1 || array.values.len() != mesh.points.len() {
            return Err(PipelineError::Mesh(format!(
                "{field} in {} is not a scalar point field",
                path.display()
            )));
        }
        if mesh.triangles.is_empty() {
            return Err(PipelineError::Mesh(format!(
                "{} does not contain triangle cells",
                path.display()
            )));
        }
        let density = array.values.clone();

        let fold = |f: fn(f64, f64) -> f64, init: f64, axis: usize| {
            mesh.points.iter().map(|p| p[axis]).fold(init, f)
        };
        let (r_min, r_max) = (fold(f64::min, f64::INFINITY, 0), fold(f64::max, f64::NEG_INFINITY, 0));
        let (z_min, z_max) = (fold(f64::min, f64::INFINITY, 1), fold(f64::max, f64::NEG_INFINITY, 1));

        Ok(SliceCase {
            index,
            path,
            mesh,
            density,
            r_min,
            r_max,
            z_min,
            z_max,
        })
    }

    /// Cavity radius: the largest r coordinate of the mesh.
    pub fn cavity_radius(&self) -> f64 {
        self.r_max
    }

    /// z coordinate of the point with the highest finite density.
    pub fn peak_z(&self) -> Option<f64> {
        self.density
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
                Some((_, b)) if b >= v => best,
                _ => Some((i, v)),
            })
            .map(|(i, _)| self.mesh.points[i][1])
    }

    fn interpolator(&self) -> TriInterpolator<'_> {
        TriInterpolator::new(&self.mesh.points, &self.mesh.triangles, &self.density)
    }
}

/// Case number in parentheses: `plasma_500W(12).vtu` → 12.
pub fn case_index(file_name: &str) -> Result<u32> {
    let start = file_name.find('(');
    let end = start.and_then(|s| file_name[s + 1..].find(')').map(|e| s + 1 + e));
    match (start, end) {
        (Some(s), Some(e)) => file_name[s + 1..e]
            .trim()
            .parse()
            .map_err(|err| PipelineError::parse(format!("case index of {file_name}"), err)),
        _ => Err(PipelineError::parse(
            "case file name",
            format!("unexpected filename format: {file_name}"),
        )),
    }
}

/// Load the `*(<n>).vtu` cases of a directory, ordered by case number.
/// `requested` restricts the set; asking for an unknown case is an error.
pub fn select_cases(dir: &Path, requested: &[u32], field: &str) -> Result<Vec<SliceCase>> {
    if !dir.is_dir() {
        return Err(PipelineError::MissingInput(dir.to_path_buf()));
    }
    let mut found: Vec<(u32, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.to_ascii_lowercase().ends_with(".vtu") && name.contains('(') {
            found.push((case_index(name)?, path.clone()));
        }
    }
    if found.is_empty() {
        return Err(PipelineError::EmptyData(format!(
            "no VTU files found in {}",
            dir.display()
        )));
    }
    found.sort();

    if !requested.is_empty() {
        let wanted: BTreeSet<u32> = requested.iter().copied().collect();
        let present: BTreeSet<u32> = found.iter().map(|(i, _)| *i).collect();
        let missing: Vec<String> = wanted.difference(&present).map(u32::to_string).collect();
        if !missing.is_empty() {
            return Err(PipelineError::EmptyData(format!(
                "cases not found: [{}]",
                missing.join(", ")
            )));
        }
        found.retain(|(i, _)| wanted.contains(i));
    }

    found
        .into_iter()
        .map(|(index, path)| {
            let mesh = read_mesh(&path)?;
            SliceCase::from_mesh(index, path, mesh, field)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Radial slices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RadialSlice {
    pub index: u32,
    pub z: f64,
    pub r: Vec<f64>,
    pub density: Vec<f64>,
    pub cavity_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadialRow {
    pub case: u32,
    pub cavity_radius: f64,
    pub z: f64,
    pub r: f64,
    pub density: f64,
}

impl RadialSlice {
    pub fn rows(&self) -> impl Iterator<Item = RadialRow> + '_ {
        self.r.iter().zip(&self.density).map(|(&r, &density)| RadialRow {
            case: self.index,
            cavity_radius: self.cavity_radius,
            z: self.z,
            r,
            density,
        })
    }
}

/// Density along `r ∈ [0, r_max]` at height `z`. `None` if `z` lies outside
/// the mesh or fewer than two samples land inside it.
pub fn radial_slice(case: &SliceCase, z: f64, samples: usize) -> Option<RadialSlice> {
    if !(case.z_min..=case.z_max).contains(&z) {
        return None;
    }
    let interp = case.interpolator();
    let (r, density): (Vec<f64>, Vec<f64>) = linspace(0.0, case.r_max, samples)
        .into_iter()
        .filter_map(|r| interp.at(r, z).filter(|v| v.is_finite()).map(|v| (r, v)))
        .unzip();
    if r.len() < 2 {
        return None;
    }
    Some(RadialSlice {
        index: case.index,
        z,
        r,
        density,
        cavity_radius: case.cavity_radius(),
    })
}

// ---------------------------------------------------------------------------
// Axial slices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AxialSlice {
    pub index: u32,
    pub r: f64,
    /// Height above the bottom of the mesh, `z - z_min`.
    pub h: Vec<f64>,
    pub z: Vec<f64>,
    pub density: Vec<f64>,
    pub h_peak: f64,
    pub z_peak: f64,
    pub cavity_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxialRow {
    pub case: u32,
    pub cavity_radius: f64,
    pub r: f64,
    pub h: f64,
    pub z: f64,
    pub density: f64,
}

impl AxialSlice {
    pub fn rows(&self) -> impl Iterator<Item = AxialRow> + '_ {
        self.h
            .iter()
            .zip(&self.z)
            .zip(&self.density)
            .map(|((&h, &z), &density)| AxialRow {
                case: self.index,
                cavity_radius: self.cavity_radius,
                r: self.r,
                h,
                z,
                density,
            })
    }
}

/// Density along `z ∈ [z_min, z_max]` at radius `r`.
pub fn axial_slice(case: &SliceCase, r: f64, samples: usize) -> Option<AxialSlice> {
    if !(case.r_min - AXIS_TOL..=case.r_max + AXIS_TOL).contains(&r) {
        return None;
    }
    let interp = case.interpolator();
    let (z, density): (Vec<f64>, Vec<f64>) = linspace(case.z_min, case.z_max, samples)
        .into_iter()
        .filter_map(|z| interp.at(r, z).filter(|v| v.is_finite()).map(|v| (z, v)))
        .unzip();
    if z.len() < 2 {
        return None;
    }

    let peak = density
        .iter()
        .enumerate()
        .fold(0, |best, (i, v)| if *v > density[best] { i } else { best });
    let h: Vec<f64> = z.iter().map(|z| z - case.z_min).collect();
    Some(AxialSlice {
        index: case.index,
        r,
        h_peak: h[peak],
        z_peak: z[peak],
        h,
        z,
        density,
        cavity_radius: case.cavity_radius(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::model::PointArray;
    use approx::assert_relative_eq;

    /// Unit square split into two triangles; density = 10 - 4r + 2z, which a
    /// linear interpolator reproduces exactly.
    pub(crate) fn square_case(r_max: f64) -> SliceCase {
        let points = vec![[0.0, 0.0], [r_max, 0.0], [0.0, 1.0], [r_max, 1.0]];
        let density = points.iter().map(|[r, z]| 10.0 - 4.0 * r / r_max + 2.0 * z).collect();
        let mesh = MeshData {
            points,
            triangles: vec![[0, 1, 2], [1, 3, 2]],
            point_data: vec![PointArray::scalar("Electron_density", density)],
        };
        SliceCase::from_mesh(1, PathBuf::from("plasma_500W(1).vtu"), mesh, "Electron_density").unwrap()
    }

    #[test]
    fn interpolation_is_exact_for_linear_fields() {
        let case = square_case(1.0);
        let interp = case.interpolator();
        assert_relative_eq!(interp.at(0.25, 0.5).unwrap(), 10.0 - 1.0 + 1.0, epsilon = 1e-12);
        assert_relative_eq!(interp.at(1.0, 1.0).unwrap(), 8.0, epsilon = 1e-12);
        assert!(interp.at(1.5, 0.5).is_none());
        assert!(interp.at(0.5, -0.1).is_none());
    }

    #[test]
    fn bounds_and_peak() {
        let case = square_case(2.0);
        assert_eq!(case.cavity_radius(), 2.0);
        assert_eq!((case.z_min, case.z_max), (0.0, 1.0));
        assert_eq!(case.peak_z(), Some(1.0));
    }

    #[test]
    fn radial_slice_samples_whole_radius() {
        let case = square_case(1.0);
        let slice = radial_slice(&case, 0.5, 5).unwrap();
        assert_eq!(slice.r, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_relative_eq!(slice.density[0], 11.0, epsilon = 1e-12);
        assert_relative_eq!(slice.density[4], 7.0, epsilon = 1e-12);
        assert_eq!(slice.rows().count(), 5);
        assert!(radial_slice(&case, 1.5, 5).is_none());
    }

    #[test]
    fn axial_slice_reports_peak_height() {
        let case = square_case(1.0);
        let slice = axial_slice(&case, 0.0, 3).unwrap();
        assert_eq!(slice.h, vec![0.0, 0.5, 1.0]);
        assert_eq!(slice.h_peak, 1.0);
        assert_eq!(slice.z_peak, 1.0);
        assert!(axial_slice(&case, 1.1, 3).is_none());
    }

    #[test]
    fn case_numbers_from_file_names() {
        assert_eq!(case_index("plasma_500W(12).vtu").unwrap(), 12);
        assert!(case_index("plasma_500W.vtu").is_err());
        assert!(case_index("plasma_500W(x).vtu").is_err());
    }

    #[test]
    fn missing_field_is_rejected() {
        let mesh = MeshData {
            points: vec![[0.0, 0.0]],
            triangles: vec![],
            point_data: vec![],
        };
        assert!(SliceCase::from_mesh(1, PathBuf::from("a(1).vtu"), mesh, "Electron_density").is_err());
    }
}

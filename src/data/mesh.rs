use std::path::Path;

use vtkio::model::{
    Attribute, Attributes, ByteOrder, CellType, Cells, DataArray, DataSet, ElementType,
    IOBuffer, Piece, UnstructuredGridPiece, Version, VertexNumbers, Vtk,
};

use crate::error::{PipelineError, Result};

use super::model::PointArray;

// ---------------------------------------------------------------------------
// MeshData – the parts of an unstructured grid the pipeline needs
// ---------------------------------------------------------------------------

/// A 2-D (axisymmetric r–z) unstructured mesh with point data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// `(r, z)` per point, taken from the x and y coordinates.
    pub points: Vec<[f64; 2]>,
    /// Triangle connectivity (point indices).
    pub triangles: Vec<[usize; 3]>,
    /// Named point arrays.
    pub point_data: Vec<PointArray>,
}

impl MeshData {
    pub fn point_array(&self, name: &str) -> Option<&PointArray> {
        self.point_data.iter().find(|a| a.name == name)
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read a VTU (or any unstructured-grid VTK) file.
pub fn read_mesh(path: &Path) -> Result<MeshData> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    let vtk = Vtk::import(path)
        .map_err(|e| PipelineError::Mesh(format!("reading {}: {e:?}", path.display())))?;

    let mut mesh = MeshData::default();
    append_dataset(&mut mesh, vtk.data)?;
    Ok(mesh)
}

fn append_dataset(mesh: &mut MeshData, data: DataSet) -> Result<()> {
    match data {
        DataSet::UnstructuredGrid { pieces, .. } => {
            for piece in pieces {
                match piece {
                    Piece::Inline(grid) => append_piece(mesh, *grid)?,
                    Piece::Loaded(inner) => append_dataset(mesh, *inner)?,
                    Piece::Source(src, _) => {
                        return Err(PipelineError::Mesh(format!(
                            "external piece '{src}' is not supported"
                        )))
                    }
                }
            }
            Ok(())
        }
        _ => Err(PipelineError::Mesh(
            "expected an unstructured grid data set".into(),
        )),
    }
}

fn append_piece(mesh: &mut MeshData, piece: UnstructuredGridPiece) -> Result<()> {
    let offset = mesh.points.len();

    let coords = buffer_to_f64(&piece.points)
        .ok_or_else(|| PipelineError::Mesh("unsupported point coordinate type".into()))?;
    if coords.len() % 3 != 0 {
        return Err(PipelineError::Mesh(format!(
            "point buffer length {} is not a multiple of 3",
            coords.len()
        )));
    }
    let n_points = coords.len() / 3;
    mesh.points
        .extend(coords.chunks_exact(3).map(|xyz| [xyz[0], xyz[1]]));

    let cells = cell_vertices(piece.cells.cell_verts);
    for (verts, kind) in cells.iter().zip(&piece.cells.types) {
        if *kind == CellType::Triangle && verts.len() == 3 {
            let tri = [verts[0], verts[1], verts[2]].map(|v| v as usize + offset);
            if tri.iter().any(|&v| v >= offset + n_points) {
                return Err(PipelineError::Mesh("triangle references a missing point".into()));
            }
            mesh.triangles.push(tri);
        }
    }

    for attribute in piece.data.point {
        let arrays: Vec<(String, Option<usize>, IOBuffer)> = match attribute {
            Attribute::DataArray(DataArray { name, data, .. }) => vec![(name, None, data)],
            Attribute::Field { data_array, .. } => data_array
                .into_iter()
                .map(|fa| (fa.name, Some(fa.elem as usize), fa.data))
                .collect(),
        };
        for (name, declared, data) in arrays {
            let Some(values) = buffer_to_f64(&data) else {
                log::debug!("skipping point array '{name}': unsupported element type");
                continue;
            };
            let components = declared.unwrap_or(if n_points > 0 {
                (values.len() / n_points).max(1)
            } else {
                1
            });
            match mesh.point_data.iter_mut().find(|a| a.name == name) {
                Some(existing) if existing.components == components => {
                    existing.values.extend(values)
                }
                Some(_) => {
                    return Err(PipelineError::Mesh(format!(
                        "point array '{name}' changes shape between pieces"
                    )))
                }
                None => mesh.point_data.push(PointArray {
                    name,
                    components,
                    values,
                }),
            }
        }
    }
    Ok(())
}

/// Split either connectivity layout into per-cell vertex lists.
fn cell_vertices(numbers: VertexNumbers) -> Vec<Vec<u64>> {
    match numbers {
        VertexNumbers::XML {
            connectivity,
            offsets,
        } => {
            let mut start = 0usize;
            offsets
                .iter()
                .map(|&end| {
                    let end = (end as usize).min(connectivity.len());
                    let cell = connectivity[start.min(end)..end].to_vec();
                    start = end;
                    cell
                })
                .collect()
        }
        VertexNumbers::Legacy { vertices, .. } => {
            let mut cells = Vec::new();
            let mut i = 0usize;
            while i < vertices.len() {
                let n = vertices[i] as usize;
                let end = (i + 1 + n).min(vertices.len());
                cells.push(vertices[i + 1..end].iter().map(|&v| v as u64).collect());
                i = end;
            }
            cells
        }
    }
}

fn buffer_to_f64(buffer: &IOBuffer) -> Option<Vec<f64>> {
    Some(match buffer {
        IOBuffer::F64(v) => v.clone(),
        IOBuffer::F32(v) => v.iter().map(|&x| x as f64).collect(),
        IOBuffer::I64(v) => v.iter().map(|&x| x as f64).collect(),
        IOBuffer::U64(v) => v.iter().map(|&x| x as f64).collect(),
        IOBuffer::I32(v) => v.iter().map(|&x| x as f64).collect(),
        IOBuffer::U32(v) => v.iter().map(|&x| x as f64).collect(),
        IOBuffer::I16(v) => v.iter().map(|&x| x as f64).collect(),
        IOBuffer::U16(v) => v.iter().map(|&x| x as f64).collect(),
        IOBuffer::I8(v) => v.iter().map(|&x| x as f64).collect(),
        IOBuffer::U8(v) => v.iter().map(|&x| x as f64).collect(),
        _ => return None,
    })
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Write `mesh` as an XML unstructured grid (`.vtu`).
pub fn write_vtu(mesh: &MeshData, path: &Path) -> Result<()> {
    let points: Vec<f64> = mesh
        .points
        .iter()
        .flat_map(|&[r, z]| [r, z, 0.0])
        .collect();

    let connectivity: Vec<u64> = mesh
        .triangles
        .iter()
        .flat_map(|tri| tri.iter().map(|&v| v as u64))
        .collect();
    let offsets: Vec<u64> = (1..=mesh.triangles.len() as u64).map(|i| i * 3).collect();

    let point: Vec<Attribute> = mesh
        .point_data
        .iter()
        .map(|array| {
            let elem = if array.components == 1 {
                ElementType::Scalars {
                    num_comp: 1,
                    lookup_table: None,
                }
            } else {
                ElementType::Generic(array.components as u32)
            };
            Attribute::DataArray(DataArray {
                name: array.name.clone(),
                elem,
                data: IOBuffer::F64(array.values.clone()),
            })
        })
        .collect();

    let vtk = Vtk {
        version: Version { major: 1, minor: 0 },
        title: String::new(),
        byte_order: ByteOrder::LittleEndian,
        file_path: None,
        data: DataSet::inline(UnstructuredGridPiece {
            points: IOBuffer::F64(points),
            cells: Cells {
                cell_verts: VertexNumbers::XML {
                    connectivity,
                    offsets,
                },
                types: vec![CellType::Triangle; mesh.triangles.len()],
            },
            data: Attributes {
                point,
                cell: Vec::new(),
            },
        }),
    };

    vtk.export(path)
        .map_err(|e| PipelineError::Mesh(format!("writing {}: {e:?}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_connectivity_split() {
        let cells = cell_vertices(VertexNumbers::XML {
            connectivity: vec![0, 1, 2, 2, 1, 3, 4],
            offsets: vec![3, 7],
        });
        assert_eq!(cells, vec![vec![0, 1, 2], vec![2, 1, 3, 4]]);
    }

    #[test]
    fn legacy_connectivity_split() {
        let cells = cell_vertices(VertexNumbers::Legacy {
            num_cells: 2,
            vertices: vec![3, 0, 1, 2, 2, 5, 6],
        });
        assert_eq!(cells, vec![vec![0, 1, 2], vec![5, 6]]);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = read_mesh(Path::new("/nonexistent/case.vtu")).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput(_)));
    }

    #[test]
    fn written_mesh_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("square.vtu");
        let mesh = MeshData {
            points: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
            triangles: vec![[0, 1, 2], [1, 3, 2]],
            point_data: vec![
                PointArray::scalar("electron_density_1", vec![1.0, 2.0, 3.0, 4.0]),
                PointArray {
                    name: "velocity".into(),
                    components: 3,
                    values: vec![0.0; 12],
                },
            ],
        };
        write_vtu(&mesh, &path).unwrap();

        let back = read_mesh(&path).unwrap();
        assert_eq!(back.points, mesh.points);
        assert_eq!(back.triangles, mesh.triangles);
        let density = back.point_array("electron_density_1").unwrap();
        assert_eq!(density.components, 1);
        assert_eq!(density.values, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(back.point_array("velocity").unwrap().components, 3);
    }
}

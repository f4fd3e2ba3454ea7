//! Triangle meshes with optional per-vertex attributes
//!
//! The same container carries raw point clouds (no faces) as loaded from disk
//! and reconstructed surfaces, so every per-vertex attribute is optional and
//! kept in lockstep with `vertices`.

use crate::error::{Error, Result};
use crate::point::*;
use serde::{Deserialize, Serialize};

/// A triangle mesh with vertices, faces and optional per-vertex attributes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3f>>,
    pub colors: Option<Vec<[u8; 3]>>,
    /// Free scalar per vertex; scanners store the sample footprint here
    pub values: Option<Vec<f32>>,
    pub confidences: Option<Vec<f32>>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            ..Self::default()
        }
    }

    /// Create a face-less point set
    pub fn from_points(vertices: Vec<Point3f>) -> Self {
        Self::from_vertices_and_faces(vertices, Vec::new())
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh has no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// True when the mesh carries no topology
    pub fn is_point_set(&self) -> bool {
        self.faces.is_empty()
    }

    /// Set vertex normals
    pub fn set_normals(&mut self, normals: Vec<Vector3f>) -> Result<()> {
        self.check_len("normals", normals.len())?;
        self.normals = Some(normals);
        Ok(())
    }

    /// Set vertex colors
    pub fn set_colors(&mut self, colors: Vec<[u8; 3]>) -> Result<()> {
        self.check_len("colors", colors.len())?;
        self.colors = Some(colors);
        Ok(())
    }

    /// Set vertex values
    pub fn set_values(&mut self, values: Vec<f32>) -> Result<()> {
        self.check_len("values", values.len())?;
        self.values = Some(values);
        Ok(())
    }

    /// Set vertex confidences
    pub fn set_confidences(&mut self, confidences: Vec<f32>) -> Result<()> {
        self.check_len("confidences", confidences.len())?;
        self.confidences = Some(confidences);
        Ok(())
    }

    fn check_len(&self, attribute: &str, len: usize) -> Result<()> {
        if len != self.vertices.len() {
            return Err(Error::InvalidData(format!(
                "{} has {} entries but the mesh has {} vertices",
                attribute,
                len,
                self.vertices.len()
            )));
        }
        Ok(())
    }

    /// Calculate unit face normals
    pub fn calculate_face_normals(&self) -> Vec<Vector3f> {
        self.faces
            .iter()
            .map(|face| {
                let v0 = self.vertices[face[0]];
                let v1 = self.vertices[face[1]];
                let v2 = self.vertices[face[2]];

                (v1 - v0).cross(&(v2 - v0)).normalize()
            })
            .collect()
    }

    /// Recompute vertex normals as the area-weighted mean of adjacent faces.
    ///
    /// Vertices not referenced by any face keep a zero normal.
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vector3f::zeros(); self.vertices.len()];

        for face in &self.faces {
            let v0 = self.vertices[face[0]];
            let v1 = self.vertices[face[1]];
            let v2 = self.vertices[face[2]];
            // Cross product length is twice the triangle area
            let weighted = (v1 - v0).cross(&(v2 - v0));
            for &index in face {
                normals[index] += weighted;
            }
        }

        for normal in &mut normals {
            *normal = normal.try_normalize(f32::EPSILON).unwrap_or_else(Vector3f::zeros);
        }

        self.normals = Some(normals);
    }

    /// Delete flagged vertices, drop faces that reference them and remap the
    /// remaining face indices. Every per-vertex attribute is compacted in
    /// lockstep.
    ///
    /// Returns the number of deleted vertices.
    pub fn delete_vertices_fix_faces(&mut self, delete: &[bool]) -> Result<usize> {
        self.check_len("delete list", delete.len())?;

        let mut remap = vec![usize::MAX; self.vertices.len()];
        let mut next = 0;
        for (old, &flagged) in delete.iter().enumerate() {
            if !flagged {
                remap[old] = next;
                next += 1;
            }
        }
        let deleted = self.vertices.len() - next;
        if deleted == 0 {
            return Ok(0);
        }

        self.faces = self
            .faces
            .iter()
            .filter(|face| face.iter().all(|&i| !delete[i]))
            .map(|face| [remap[face[0]], remap[face[1]], remap[face[2]]])
            .collect();

        compact(&mut self.vertices, delete);
        if let Some(normals) = self.normals.as_mut() {
            compact(normals, delete);
        }
        if let Some(colors) = self.colors.as_mut() {
            compact(colors, delete);
        }
        if let Some(values) = self.values.as_mut() {
            compact(values, delete);
        }
        if let Some(confidences) = self.confidences.as_mut() {
            compact(confidences, delete);
        }

        Ok(deleted)
    }

    /// Clear the mesh
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn compact<T>(items: &mut Vec<T>, delete: &[bool]) {
    let mut index = 0;
    items.retain(|_| {
        let keep = !delete[index];
        index += 1;
        keep
    });
}

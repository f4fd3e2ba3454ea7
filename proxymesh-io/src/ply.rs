//! PLY format support
//!
//! Vertices may carry `nx/ny/nz` normals, a scalar `value` and a
//! `confidence`. Per-vertex colors are written but never read back; inputs
//! to the pipeline are geometry plus scan attributes only.
//!
//! ply-rs writes a wrong length prefix for binary list properties, so
//! meshes with faces are always written as ASCII. Point sets honor
//! [`PlyWriteOptions::binary`].

use crate::error::IoError;
use crate::{MeshReader, MeshWriter};
use ply_rs::{
    parser::Parser,
    ply::{
        Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
        ScalarType,
    },
    writer::Writer,
};
use proxymesh_core::{color_to_rgb8, Point3f, Result, SampleSet, TriangleMesh, Vector3f};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

pub struct PlyReader;
pub struct PlyWriter;

/// Options controlling PLY output
#[derive(Debug, Clone)]
pub struct PlyWriteOptions {
    /// Write `binary_little_endian` instead of ASCII when there are no
    /// faces (default: true)
    pub binary: bool,
    /// Include per-vertex colors when the mesh has them (default: true)
    pub colors: bool,
}

impl Default for PlyWriteOptions {
    fn default() -> Self {
        Self {
            binary: true,
            colors: true,
        }
    }
}

impl PlyWriteOptions {
    pub fn ascii() -> Self {
        Self {
            binary: false,
            ..Self::default()
        }
    }

    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }
}

impl PlyReader {
    /// Parse a PLY stream into a mesh
    pub fn read_from<R: Read>(reader: &mut R) -> Result<TriangleMesh> {
        let parser = Parser::<DefaultElement>::new();
        let ply = parser.read_ply(reader)?;

        let has = |name: &str| {
            ply.header
                .elements
                .get("vertex")
                .is_some_and(|e| e.properties.contains_key(name))
        };
        let has_normals = has("nx") && has("ny") && has("nz");
        let has_values = has("value");
        let has_confidences = has("confidence");

        let empty = Vec::new();
        let vertex_elements = ply.payload.get("vertex").unwrap_or(&empty);

        let mut vertices = Vec::with_capacity(vertex_elements.len());
        let mut normals = Vec::new();
        let mut values = Vec::new();
        let mut confidences = Vec::new();

        for vertex in vertex_elements {
            vertices.push(Point3f::new(
                extract_property_value(vertex, "x")?,
                extract_property_value(vertex, "y")?,
                extract_property_value(vertex, "z")?,
            ));
            if has_normals {
                normals.push(Vector3f::new(
                    extract_property_value(vertex, "nx")?,
                    extract_property_value(vertex, "ny")?,
                    extract_property_value(vertex, "nz")?,
                ));
            }
            if has_values {
                values.push(extract_property_value(vertex, "value")?);
            }
            if has_confidences {
                confidences.push(extract_property_value(vertex, "confidence")?);
            }
        }

        let mut faces = Vec::new();
        if let Some(face_elements) = ply.payload.get("face") {
            for face in face_elements {
                let indices = extract_face_indices(face)?;
                if indices.len() != 3 {
                    return Err(IoError::parse(
                        "face",
                        format!("expected a triangle, found {} indices", indices.len()),
                    )
                    .into());
                }
                if let Some(&bad) = indices.iter().find(|&&i| i >= vertices.len()) {
                    return Err(IoError::parse(
                        "face",
                        format!("vertex index {} out of range", bad),
                    )
                    .into());
                }
                faces.push([indices[0], indices[1], indices[2]]);
            }
        }

        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
        if has_normals {
            mesh.set_normals(normals)?;
        }
        if has_values {
            mesh.set_values(values)?;
        }
        if has_confidences {
            mesh.set_confidences(confidences)?;
        }

        debug!(
            "Read PLY with {} vertices, {} faces (normals: {}, values: {}, confidences: {})",
            mesh.vertex_count(),
            mesh.face_count(),
            has_normals,
            has_values,
            has_confidences
        );

        Ok(mesh)
    }
}

impl MeshReader for PlyReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}

fn scalar_property(name: &str, scalar: ScalarType) -> PropertyDef {
    PropertyDef::new(name.to_string(), PropertyType::Scalar(scalar))
}

fn add_position_properties(element: &mut ElementDef) {
    for name in ["x", "y", "z"] {
        element.properties.add(scalar_property(name, ScalarType::Float));
    }
}

fn add_normal_properties(element: &mut ElementDef) {
    for name in ["nx", "ny", "nz"] {
        element.properties.add(scalar_property(name, ScalarType::Float));
    }
}

fn add_color_properties(element: &mut ElementDef) {
    for name in ["red", "green", "blue"] {
        element.properties.add(scalar_property(name, ScalarType::UChar));
    }
}

fn insert_vector(element: &mut DefaultElement, names: [&str; 3], v: [f32; 3]) {
    for (name, value) in names.into_iter().zip(v) {
        element.insert(name.to_string(), Property::Float(value));
    }
}

fn insert_color(element: &mut DefaultElement, color: [u8; 3]) {
    for (name, value) in ["red", "green", "blue"].into_iter().zip(color) {
        element.insert(name.to_string(), Property::UChar(value));
    }
}

fn new_ply(binary: bool) -> Ply<DefaultElement> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = if binary {
        Encoding::BinaryLittleEndian
    } else {
        Encoding::Ascii
    };
    ply
}

fn write_ply<W: Write>(writer: &mut W, ply: &mut Ply<DefaultElement>) -> Result<()> {
    let writer_instance = Writer::new();
    writer_instance.write_ply(writer, ply)?;
    writer.flush()?;
    Ok(())
}

impl PlyWriter {
    /// Encode `mesh` with every attribute it carries
    pub fn write_to<W: Write>(
        mesh: &TriangleMesh,
        writer: &mut W,
        options: &PlyWriteOptions,
    ) -> Result<()> {
        let binary = options.binary && mesh.faces.is_empty();
        if options.binary && !binary {
            debug!("Writing {} faces as ASCII PLY", mesh.face_count());
        }
        let mut ply = new_ply(binary);
        let colors = mesh.colors.as_ref().filter(|_| options.colors);

        let mut vertex_element = ElementDef::new("vertex".to_string());
        vertex_element.count = mesh.vertex_count();
        add_position_properties(&mut vertex_element);
        if mesh.normals.is_some() {
            add_normal_properties(&mut vertex_element);
        }
        if colors.is_some() {
            add_color_properties(&mut vertex_element);
        }
        if mesh.values.is_some() {
            vertex_element
                .properties
                .add(scalar_property("value", ScalarType::Float));
        }
        if mesh.confidences.is_some() {
            vertex_element
                .properties
                .add(scalar_property("confidence", ScalarType::Float));
        }
        ply.header.elements.add(vertex_element);

        let mut face_element = ElementDef::new("face".to_string());
        face_element.count = mesh.face_count();
        face_element.properties.add(PropertyDef::new(
            "vertex_indices".to_string(),
            PropertyType::List(ScalarType::UChar, ScalarType::Int),
        ));
        ply.header.elements.add(face_element);

        let mut vertices = Vec::with_capacity(mesh.vertex_count());
        for (i, vertex) in mesh.vertices.iter().enumerate() {
            let mut element = DefaultElement::new();
            insert_vector(&mut element, ["x", "y", "z"], [vertex.x, vertex.y, vertex.z]);

            if let Some(normals) = &mesh.normals {
                let n = normals[i];
                insert_vector(&mut element, ["nx", "ny", "nz"], [n.x, n.y, n.z]);
            }
            if let Some(colors) = colors {
                insert_color(&mut element, colors[i]);
            }
            if let Some(values) = &mesh.values {
                element.insert("value".to_string(), Property::Float(values[i]));
            }
            if let Some(confidences) = &mesh.confidences {
                element.insert("confidence".to_string(), Property::Float(confidences[i]));
            }

            vertices.push(element);
        }
        ply.payload.insert("vertex".to_string(), vertices);

        let mut faces = Vec::with_capacity(mesh.face_count());
        for face in &mesh.faces {
            let mut element = DefaultElement::new();
            let indices = face.iter().map(|&i| i as i32).collect();
            element.insert("vertex_indices".to_string(), Property::ListInt(indices));
            faces.push(element);
        }
        ply.payload.insert("face".to_string(), faces);

        write_ply(writer, &mut ply)
    }

    /// Write a mesh with explicit options
    pub fn write_mesh_with_options<P: AsRef<Path>>(
        mesh: &TriangleMesh,
        path: P,
        options: &PlyWriteOptions,
    ) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(mesh, &mut writer, options)
    }

    /// Write oriented samples as a point set.
    ///
    /// Scale is stored as `value` so the file reads back like a scanner cloud.
    pub fn write_samples<P: AsRef<Path>>(
        samples: &SampleSet,
        path: P,
        options: &PlyWriteOptions,
    ) -> Result<()> {
        let mut ply = new_ply(options.binary);

        let mut vertex_element = ElementDef::new("vertex".to_string());
        vertex_element.count = samples.len();
        add_position_properties(&mut vertex_element);
        add_normal_properties(&mut vertex_element);
        if options.colors {
            add_color_properties(&mut vertex_element);
        }
        vertex_element
            .properties
            .add(scalar_property("value", ScalarType::Float));
        vertex_element
            .properties
            .add(scalar_property("confidence", ScalarType::Float));
        ply.header.elements.add(vertex_element);

        let vertices = samples
            .iter()
            .map(|sample| {
                let mut element = DefaultElement::new();
                let (p, n) = (sample.position, sample.normal);
                insert_vector(&mut element, ["x", "y", "z"], [p.x, p.y, p.z]);
                insert_vector(&mut element, ["nx", "ny", "nz"], [n.x, n.y, n.z]);
                if options.colors {
                    insert_color(&mut element, color_to_rgb8(&sample.color));
                }
                element.insert("value".to_string(), Property::Float(sample.scale));
                element.insert("confidence".to_string(), Property::Float(sample.confidence));
                element
            })
            .collect();
        ply.payload.insert("vertex".to_string(), vertices);

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        write_ply(&mut writer, &mut ply)
    }
}

impl MeshWriter for PlyWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
        Self::write_mesh_with_options(mesh, path, &PlyWriteOptions::default())
    }
}

/// Extract a property value as f32 from a PLY element
fn extract_property_value(element: &DefaultElement, name: &str) -> Result<f32> {
    match element.get(name) {
        Some(Property::Float(val)) => Ok(*val),
        Some(Property::Double(val)) => Ok(*val as f32),
        Some(Property::Int(val)) => Ok(*val as f32),
        Some(Property::UInt(val)) => Ok(*val as f32),
        Some(Property::Short(val)) => Ok(*val as f32),
        Some(Property::UShort(val)) => Ok(*val as f32),
        Some(Property::Char(val)) => Ok(*val as f32),
        Some(Property::UChar(val)) => Ok(*val as f32),
        Some(_) => Err(IoError::parse("vertex", format!("property '{}' is a list", name)).into()),
        None => Err(IoError::MissingProperty {
            name: name.to_string(),
        }
        .into()),
    }
}

/// Extract face indices from a PLY face element
fn extract_face_indices(element: &DefaultElement) -> Result<Vec<usize>> {
    match element
        .get("vertex_indices")
        .or_else(|| element.get("vertex_index"))
    {
        Some(Property::ListInt(indices)) => Ok(indices.iter().map(|&idx| idx as usize).collect()),
        Some(Property::ListUInt(indices)) => Ok(indices.iter().map(|&idx| idx as usize).collect()),
        _ => Err(IoError::MissingProperty {
            name: "vertex_indices".to_string(),
        }
        .into()),
    }
}

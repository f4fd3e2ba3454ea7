//! proxymesh normalize-values - rescale per-vertex values into [0, 1]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use proxymesh_algorithms::{normalize_values, value_range, ValueNormalizationConfig};
use proxymesh_core::TriangleMesh;
use proxymesh_io::{read_mesh, PlyWriteOptions, PlyWriter};
use tracing::info;

#[derive(Args, Debug)]
pub struct NormalizeValuesArgs {
    /// Mesh whose values are normalized
    pub input: PathBuf,

    /// Output mesh (PLY)
    pub output: PathBuf,

    /// Fraction of extreme values treated as outliers
    #[arg(short, long, default_value = "0.0")]
    pub epsilon: f32,

    /// Clamp outliers to 0/1 instead of setting them to the ignore value
    #[arg(short, long)]
    pub clamp: bool,

    /// Value marking vertices without data
    #[arg(short, long, default_value = "-1.0", allow_negative_numbers = true)]
    pub ignore: f32,

    /// Meshes the range is computed from (default: the input mesh)
    #[arg(short, long, value_delimiter = ',')]
    pub meshes: Vec<PathBuf>,
}

impl NormalizeValuesArgs {
    fn config(&self) -> ValueNormalizationConfig {
        ValueNormalizationConfig::default()
            .with_epsilon(self.epsilon)
            .with_clamp(self.clamp)
            .with_ignore(self.ignore)
    }
}

fn load(path: &PathBuf) -> Result<TriangleMesh> {
    read_mesh(path).with_context(|| format!("Failed to load mesh from {:?}", path))
}

pub fn run(args: &NormalizeValuesArgs) -> Result<()> {
    let config = args.config();
    let mut mesh = load(&args.input)?;

    let references = args
        .meshes
        .iter()
        .filter(|path| **path != args.input)
        .map(load)
        .collect::<Result<Vec<_>>>()?;

    let mut reference_refs: Vec<&TriangleMesh> = references.iter().collect();
    if args.meshes.is_empty() || args.meshes.contains(&args.input) {
        reference_refs.push(&mesh);
    }

    let range = value_range(&reference_refs, &config).context("Failed to determine value range")?;
    let report = normalize_values(&mut mesh, range, &config)
        .with_context(|| format!("Cannot normalize values of {:?}", args.input))?;

    info!(
        "{} {} outliers",
        if args.clamp { "Clamped" } else { "Removed" },
        report.outliers
    );

    let options = PlyWriteOptions::default().with_colors(false);
    PlyWriter::write_mesh_with_options(&mesh, &args.output, &options)
        .with_context(|| format!("Failed to save mesh to {:?}", args.output))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxymesh_core::Point3f;
    use proxymesh_io::write_mesh;

    fn write_valued_mesh(path: &PathBuf, values: Vec<f32>) {
        let mut mesh = TriangleMesh::from_points(vec![Point3f::origin(); values.len()]);
        mesh.set_values(values).unwrap();
        write_mesh(&mesh, path).unwrap();
    }

    fn args(input: PathBuf, output: PathBuf) -> NormalizeValuesArgs {
        NormalizeValuesArgs {
            input,
            output,
            epsilon: 0.0,
            clamp: false,
            ignore: -1.0,
            meshes: Vec::new(),
        }
    }

    #[test]
    fn test_normalize_against_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.ply");
        let output = dir.path().join("out.ply");
        write_valued_mesh(&input, vec![2.0, 4.0, 6.0, -1.0]);

        run(&args(input, output.clone())).unwrap();

        let values = read_mesh(&output).unwrap().values.unwrap();
        assert_eq!(values, vec![0.0, 0.5, 1.0, -1.0]);
    }

    #[test]
    fn test_normalize_against_reference_meshes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.ply");
        let reference = dir.path().join("ref.ply");
        let output = dir.path().join("out.ply");
        write_valued_mesh(&input, vec![5.0, 15.0]);
        write_valued_mesh(&reference, vec![0.0, 10.0]);

        let mut args = args(input, output.clone());
        args.meshes = vec![reference];
        args.clamp = true;
        run(&args).unwrap();

        let values = read_mesh(&output).unwrap().values.unwrap();
        assert_eq!(values, vec![0.5, 1.0]);
    }

    #[test]
    fn test_mesh_without_values_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.ply");
        let output = dir.path().join("out.ply");
        write_mesh(&TriangleMesh::from_points(vec![Point3f::origin()]), &input).unwrap();

        assert!(run(&args(input, output.clone())).is_err());
        assert!(!output.exists());
    }
}

//! Camera trajectory text files
//!
//! Layout: the camera count, then per camera the camera center (3 floats),
//! the world-to-camera rotation in row-major order (9 floats) and the focal
//! length. Tokens are whitespace separated.

use crate::error::IoError;
use nalgebra::{Matrix3, Vector3};
use proxymesh_core::{Point3f, Result, Transform3D};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Extrinsics and focal length of one camera
#[derive(Debug, Clone, PartialEq)]
pub struct CameraInfo {
    /// World-to-camera rotation
    pub rotation: Matrix3<f32>,
    /// World-to-camera translation
    pub translation: Vector3<f32>,
    pub focal_length: f32,
}

impl CameraInfo {
    pub fn new(rotation: Matrix3<f32>, translation: Vector3<f32>, focal_length: f32) -> Self {
        Self {
            rotation,
            translation,
            focal_length,
        }
    }

    /// Camera center in world coordinates, `-Rᵀ·t`
    pub fn position(&self) -> Point3f {
        Point3f::from(-(self.rotation.transpose() * self.translation))
    }

    /// Place a camera with rotation `rotation` at world position `position`
    pub fn from_position(rotation: Matrix3<f32>, position: &Point3f, focal_length: f32) -> Self {
        Self::new(rotation, rotation * -position.coords, focal_length)
    }

    pub fn world_to_camera(&self) -> Transform3D {
        Transform3D::from_rotation_translation(self.rotation, self.translation)
    }
}

pub type Trajectory = Vec<CameraInfo>;

/// Encode `trajectory` in the text layout
pub fn write_trajectory<W: Write>(trajectory: &[CameraInfo], writer: &mut W) -> Result<()> {
    writeln!(writer, "{}", trajectory.len())?;
    for camera in trajectory {
        let pos = camera.position();
        writeln!(writer, "{} {} {}", pos.x, pos.y, pos.z)?;
        let r = &camera.rotation;
        for row in 0..3 {
            writeln!(writer, "{} {} {}", r[(row, 0)], r[(row, 1)], r[(row, 2)])?;
        }
        writeln!(writer, "{}", camera.focal_length)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_trajectory<P: AsRef<Path>>(trajectory: &[CameraInfo], path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_trajectory(trajectory, &mut writer)
}

struct Tokens<'a> {
    inner: std::str::SplitWhitespace<'a>,
}

impl Tokens<'_> {
    fn next<T: std::str::FromStr>(&mut self, what: &str) -> Result<T> {
        let token = self
            .inner
            .next()
            .ok_or_else(|| IoError::parse("trajectory", format!("unexpected end of file reading {}", what)))?;
        token.parse().map_err(|_| {
            IoError::parse("trajectory", format!("invalid {} '{}'", what, token)).into()
        })
    }
}

/// Decode a trajectory from its text layout
pub fn parse_trajectory(text: &str) -> Result<Trajectory> {
    let mut tokens = Tokens {
        inner: text.split_whitespace(),
    };

    let count: usize = tokens.next("camera count")?;
    let mut trajectory = Vec::with_capacity(count.min(1 << 16));

    for _ in 0..count {
        let mut position = Point3f::origin();
        for i in 0..3 {
            position[i] = tokens.next("position")?;
        }

        let mut rotation = Matrix3::zeros();
        for row in 0..3 {
            for col in 0..3 {
                rotation[(row, col)] = tokens.next("rotation")?;
            }
        }

        let focal_length = tokens.next("focal length")?;
        trajectory.push(CameraInfo::from_position(rotation, &position, focal_length));
    }

    Ok(trajectory)
}

pub fn load_trajectory<P: AsRef<Path>>(path: P) -> Result<Trajectory> {
    let text = fs::read_to_string(path)?;
    parse_trajectory(&text)
}

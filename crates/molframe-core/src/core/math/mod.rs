//! # Geometry Kernel
//!
//! Numeric foundations shared by every other layer of the library.
//!
//! ## Overview
//!
//! All vector, matrix and quaternion algebra is expressed with `nalgebra` value types
//! (`Point3`, `Vector3`, `Matrix3`, `Matrix4`, `UnitQuaternion`). They are stack-allocated, so no
//! scratch buffers are kept between calls and every function here is re-entrant.
//!
//! ## Key Components
//!
//! - [`transform`] - Rigid 4×4 transform helpers: identity/rigidity checks, checked inversion,
//!   quaternion interpolation
//! - [`eigen`] - Symmetric 3×3 eigen-decomposition and principal-axis frames
//! - [`superposition`] - Least-squares rigid superposition (RMSD fitting)
//! - [`boundary`] - Axis-aligned boxes, bounding spheres and their exact/fast construction

pub mod boundary;
pub mod eigen;
pub mod superposition;
pub mod transform;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NumericError {
    #[error("Matrix is singular and cannot be inverted")]
    Singular,
    #[error("Point sets have different lengths ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },
    #[error("Operation requires at least one point")]
    Empty,
}

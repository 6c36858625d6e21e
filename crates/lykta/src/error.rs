//! Crate-wide error type.
//!
//! Errors fall into four groups:
//!
//! - **Environment**: the host could not provide a window, a drawable
//!   surface, or an event loop. These are fatal and abort startup before any
//!   frame is produced.
//! - **Configuration**: a value was rejected at the call that tried to set it
//!   (non-positive clip planes, shadows on an ambient light, a zero-sized
//!   shadow map, ...). Nothing downstream ever sees an invalid value.
//! - **Graph**: a stale [`NodeId`], a reparent that would create a cycle, or
//!   a typed lookup on a node of the wrong kind.
//! - **Runtime**: panel lookups, config files, asset decoding, and backend
//!   failures.

use std::fmt;

use crate::scene::NodeId;

/// All errors produced by lykta.
#[derive(Debug)]
pub enum Error {
    // ── Environment ─────────────────────────────────────────────────────
    /// No drawable surface could be acquired from the host window.
    Surface(String),
    /// The host event loop could not be created or failed while running.
    EventLoop(String),

    // ── Configuration ───────────────────────────────────────────────────
    /// Clip planes must satisfy `0 < near < far`.
    InvalidProjection { near: f32, far: f32 },
    /// Aspect ratio must be finite and positive.
    InvalidAspect(f32),
    /// Field of view must lie in `(0, 180)` degrees, and only applies to
    /// perspective projections.
    InvalidFieldOfView(f32),
    /// Orthographic extents must be finite and non-degenerate.
    InvalidExtent(&'static str),
    /// The light kind cannot cast shadows.
    ShadowNotSupported(&'static str),
    /// Shadow maps need a non-zero resolution on both axes.
    InvalidShadowMapSize { width: u32, height: u32 },
    /// The shadow frustum kind does not match the light kind.
    ShadowFrustumMismatch { light: &'static str, frustum: &'static str },
    /// Light intensity must be finite and non-negative.
    NegativeIntensity(f32),
    /// Surface dimensions must both be positive.
    InvalidSurfaceSize { width: u32, height: u32 },
    /// Device pixel ratios (and their ceiling) must be finite and positive.
    InvalidPixelRatio(f32),
    /// Orbit damping must lie in `(0, 1]`.
    InvalidDamping(f32),
    /// Geometry or texture data is inconsistent.
    InvalidData(String),

    // ── Graph ───────────────────────────────────────────────────────────
    /// The node was despawned (or never belonged to this scene).
    StaleNode(NodeId),
    /// Attaching `child` under `parent` would make a node its own ancestor.
    CyclicHierarchy { parent: NodeId, child: NodeId },
    /// The scene root cannot be reparented, removed, or despawned.
    RootNode,
    /// A typed accessor was used on a node of a different kind.
    WrongKind { node: NodeId, expected: &'static str, found: &'static str },

    // ── Runtime ─────────────────────────────────────────────────────────
    /// No panel binding with this name exists.
    UnknownParameter(String),
    /// A panel binding with this name already exists.
    DuplicateParameter(String),
    /// The value type does not match the binding.
    ParameterKind { name: String, expected: &'static str },
    /// A config file could not be parsed or failed validation.
    Config(String),
    /// An asset could not be decoded.
    Asset(String),
    /// A render backend failed in a way that cannot be recovered by skipping
    /// the frame.
    Backend(String),
    /// Filesystem failure.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Surface(e) => write!(f, "no drawable surface: {e}"),
            Error::EventLoop(e) => write!(f, "event loop failure: {e}"),
            Error::InvalidProjection { near, far } => {
                write!(f, "invalid clip planes near={near} far={far} (need 0 < near < far)")
            }
            Error::InvalidAspect(a) => write!(f, "invalid aspect ratio {a}"),
            Error::InvalidFieldOfView(v) => write!(f, "invalid field of view {v}"),
            Error::InvalidExtent(what) => write!(f, "invalid extent: {what}"),
            Error::ShadowNotSupported(kind) => write!(f, "{kind} lights cannot cast shadows"),
            Error::InvalidShadowMapSize { width, height } => {
                write!(f, "invalid shadow map size {width}x{height}")
            }
            Error::ShadowFrustumMismatch { light, frustum } => {
                write!(f, "{light} lights cannot use a {frustum} shadow frustum")
            }
            Error::NegativeIntensity(v) => write!(f, "invalid light intensity {v}"),
            Error::InvalidSurfaceSize { width, height } => {
                write!(f, "invalid surface size {width}x{height}")
            }
            Error::InvalidPixelRatio(r) => write!(f, "invalid pixel ratio {r}"),
            Error::InvalidDamping(d) => write!(f, "invalid damping factor {d} (need 0 < d <= 1)"),
            Error::InvalidData(e) => write!(f, "invalid data: {e}"),
            Error::StaleNode(id) => write!(f, "node {id} does not exist"),
            Error::CyclicHierarchy { parent, child } => {
                write!(f, "cannot attach {child} under {parent}: it would become its own ancestor")
            }
            Error::RootNode => write!(f, "the scene root cannot be moved or removed"),
            Error::WrongKind { node, expected, found } => {
                write!(f, "node {node} is a {found}, expected a {expected}")
            }
            Error::UnknownParameter(name) => write!(f, "unknown parameter '{name}'"),
            Error::DuplicateParameter(name) => write!(f, "parameter '{name}' is already bound"),
            Error::ParameterKind { name, expected } => {
                write!(f, "parameter '{name}' expects a {expected} value")
            }
            Error::Config(e) => write!(f, "config error: {e}"),
            Error::Asset(e) => write!(f, "asset error: {e}"),
            Error::Backend(e) => write!(f, "render backend error: {e}"),
            Error::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

/// Result alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

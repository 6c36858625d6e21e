//! # Assets — Deferred Resource Delivery
//!
//! Meshes can be spawned before their geometry, material, or color map
//! exist. Whoever produces those resources (a loader thread, a network
//! callback, a test) sends them through an [`AssetSender`]; the frame loop
//! drains the [`AssetInbox`] at the start of every tick and attaches what
//! arrived. A mesh that gets its last missing piece is drawn from that same
//! tick on.
//!
//! ```text
//!  loader thread ──► AssetSender ──mpsc──► AssetInbox
//!                                              │ attach_pending (start of tick)
//!                                              ▼
//!                                    Scene: mesh.geometry / material / map
//! ```
//!
//! Delivery is best effort. A failed load, or a delivery whose target was
//! despawned in the meantime, is logged and dropped. The scene stays
//! renderable without that object. Nothing is retried here; retries belong
//! to the loader.
//!
//! ## Comparison
//!
//! - **three.js**: `TextureLoader.load(url, onLoad)` mutates the material
//!   from inside the callback, whenever it fires.
//! - **Bevy**: `Handle<T>` resolved by the asset server; systems observe
//!   `AssetEvent`s.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::material::{Material, Texture};
use crate::math::Color;
use crate::scene::{NodeId, Scene};

/// A resource on its way to a mesh.
#[derive(Debug, Clone)]
pub enum Payload {
    Geometry(Arc<Geometry>),
    Material(Arc<Material>),
    /// Set as the mesh material's color map. A mesh without a material gets
    /// a white unlit one.
    ColorMap(Arc<Texture>),
    /// The load failed. Logged and dropped.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Delivery {
    pub target: NodeId,
    /// Where the resource came from, for logs.
    pub label: String,
    pub payload: Payload,
}

/// Cloneable, `Send` handle for delivering resources from any thread.
#[derive(Debug, Clone)]
pub struct AssetSender {
    tx: Sender<Delivery>,
}

impl AssetSender {
    /// Returns `false` once the inbox is gone.
    pub fn send(&self, target: NodeId, label: impl Into<String>, payload: Payload) -> bool {
        self.tx
            .send(Delivery { target, label: label.into(), payload })
            .is_ok()
    }
}

/// What one [`AssetInbox::attach_pending`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttachReport {
    pub attached: usize,
    pub failed: usize,
    /// Deliveries whose target was stale or not a mesh.
    pub dropped: usize,
}

/// Receiving end of asset deliveries. Lives in the [`Stage`](crate::stage::Stage).
pub struct AssetInbox {
    tx: Sender<Delivery>,
    rx: Receiver<Delivery>,
}

impl AssetInbox {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> AssetSender {
        AssetSender { tx: self.tx.clone() }
    }

    /// Attach everything that has arrived. Never blocks.
    pub fn attach_pending(&mut self, scene: &mut Scene) -> AttachReport {
        let mut report = AttachReport::default();
        while let Ok(delivery) = self.rx.try_recv() {
            let Delivery { target, label, payload } = delivery;
            if let Payload::Failed(reason) = &payload {
                log::warn!("asset '{label}' for {target:?} failed to load: {reason}");
                report.failed += 1;
                continue;
            }
            let mesh = match scene.mesh_mut(target) {
                Ok(mesh) => mesh,
                Err(e) => {
                    log::warn!("dropping asset '{label}': {e}");
                    report.dropped += 1;
                    continue;
                }
            };
            match payload {
                Payload::Geometry(geometry) => mesh.geometry = Some(geometry),
                Payload::Material(material) => mesh.material = Some(material),
                Payload::ColorMap(texture) => match &mut mesh.material {
                    Some(material) => Arc::make_mut(material).map = Some(texture),
                    None => mesh.material = Some(Arc::new(Material::basic(Color::WHITE).with_map(texture))),
                },
                Payload::Failed(_) => continue,
            }
            log::debug!("attached asset '{label}' to {target:?}");
            report.attached += 1;
        }
        report
    }
}

impl Default for AssetInbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode an image file into RGBA8 pixels.
pub fn decode_texture(path: &Path) -> Result<Texture> {
    let image = image::open(path)
        .map_err(|e| Error::Asset(format!("{}: {e}", path.display())))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Texture::from_rgba8(path.display().to_string(), width, height, image.into_raw())
}

/// Decode `path` on a background thread and deliver it to `target` as a
/// color map, or as a failure.
pub fn spawn_texture_load(path: impl Into<PathBuf>, target: NodeId, sender: AssetSender) -> Result<JoinHandle<()>> {
    let path = path.into();
    let handle = std::thread::Builder::new()
        .name("lykta-texture-load".into())
        .spawn(move || {
            let label = path.display().to_string();
            let payload = match decode_texture(&path) {
                Ok(texture) => Payload::ColorMap(Arc::new(texture)),
                Err(e) => Payload::Failed(e.to_string()),
            };
            if !sender.send(target, label, payload) {
                log::debug!("texture '{}' finished after the inbox closed", path.display());
            }
        })?;
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Mesh, Node};

    #[test]
    fn pending_mesh_becomes_ready() {
        let mut scene = Scene::new();
        let mut inbox = AssetInbox::new();
        let mesh = scene.spawn(Node::mesh("late", Mesh::pending()));

        let sender = inbox.sender();
        sender.send(mesh, "cube", Payload::Geometry(Arc::new(Geometry::cuboid(1.0, 1.0, 1.0))));
        assert!(!scene.mesh(mesh).unwrap().is_ready());

        let report = inbox.attach_pending(&mut scene);
        assert_eq!(report.attached, 1);
        assert!(!scene.mesh(mesh).unwrap().is_ready());

        sender.send(mesh, "red", Payload::Material(Arc::new(Material::lambert(Color::RED))));
        inbox.attach_pending(&mut scene);
        assert!(scene.mesh(mesh).unwrap().is_ready());
    }

    #[test]
    fn failures_and_stale_targets_are_dropped() {
        let mut scene = Scene::new();
        let mut inbox = AssetInbox::new();
        let gone = scene.spawn(Node::mesh("gone", Mesh::pending()));
        let group = scene.spawn(Node::group("group"));
        scene.despawn(gone).unwrap();

        let sender = inbox.sender();
        sender.send(gone, "a", Payload::Material(Arc::new(Material::default())));
        sender.send(group, "b", Payload::Material(Arc::new(Material::default())));
        sender.send(group, "c", Payload::Failed("404".into()));

        let report = inbox.attach_pending(&mut scene);
        assert_eq!(report, AttachReport { attached: 0, failed: 1, dropped: 2 });
    }

    #[test]
    fn color_map_does_not_touch_shared_material() {
        let mut scene = Scene::new();
        let mut inbox = AssetInbox::new();
        let shared = Arc::new(Material::lambert(Color::WHITE));
        let geometry = Arc::new(Geometry::plane(1.0, 1.0));
        let a = scene.spawn(Node::mesh("a", Mesh::new(Arc::clone(&geometry), Arc::clone(&shared))));
        let b = scene.spawn(Node::mesh("b", Mesh::new(geometry, Arc::clone(&shared))));

        let texture = Arc::new(Texture::checker(8, Color::WHITE, Color::BLACK).unwrap());
        inbox.sender().send(a, "checker", Payload::ColorMap(texture));
        inbox.attach_pending(&mut scene);

        assert!(scene.mesh(a).unwrap().material.as_ref().unwrap().map.is_some());
        assert!(scene.mesh(b).unwrap().material.as_ref().unwrap().map.is_none());
    }

    #[test]
    fn color_map_without_material_creates_one() {
        let mut scene = Scene::new();
        let mut inbox = AssetInbox::new();
        let mesh = scene.spawn(Node::mesh("m", Mesh::pending()));
        let texture = Arc::new(Texture::checker(8, Color::WHITE, Color::BLACK).unwrap());
        inbox.sender().send(mesh, "checker", Payload::ColorMap(texture));
        inbox.attach_pending(&mut scene);
        assert!(scene.mesh(mesh).unwrap().material.is_some());
    }

    #[test]
    fn background_load_reports_missing_file() {
        let mut scene = Scene::new();
        let mut inbox = AssetInbox::new();
        let mesh = scene.spawn(Node::mesh("m", Mesh::pending()));
        let handle = spawn_texture_load("does/not/exist.png", mesh, inbox.sender()).unwrap();
        handle.join().unwrap();

        let report = inbox.attach_pending(&mut scene);
        assert_eq!(report.failed, 1);
        assert!(scene.mesh(mesh).unwrap().material.is_none());
    }
}

//! # Parameter Panel — Tweakable Values Without a Widget
//!
//! A debug panel widget (egui, a web GUI, a terminal UI) needs three things
//! per tweakable value: what it is called, what kind of control to show, and
//! how to read and write the underlying state. [`ParameterPanel`] holds
//! exactly that, as explicit bindings built once at setup:
//!
//! ```text
//!  ParamDescriptor { name, folder, kind }   ← widget lays out controls
//!          │
//!  get(&Scene) -> value                     ← widget shows current value
//!  set(&mut Scene, value)                   ← widget reports user edit
//!          │
//!          ├─ number: snap to step, clamp to [min, max]
//!          ├─ apply the binding's setter
//!          └─ on_change(value)
//! ```
//!
//! The panel never holds references into the scene. Bindings capture
//! [`NodeId`]s and resolve them on every call, so a despawned node turns
//! into an error instead of a dangling pointer.
//!
//! ## Comparison
//!
//! - **lil-gui / dat.gui**: `gui.add(object, 'prop', min, max, step)`
//!   mutates the JS object by property name.
//! - **bevy-inspector-egui**: reflects component fields at runtime.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::math::Color;
use crate::scene::{NodeId, Scene};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Toggle(bool),
    Color(Color),
}

impl ParamValue {
    fn kind_name(&self) -> &'static str {
        match self {
            ParamValue::Number(_) => "number",
            ParamValue::Toggle(_) => "toggle",
            ParamValue::Color(_) => "color",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// A slider. `step` of zero means continuous.
    Number { min: f64, max: f64, step: f64 },
    Toggle,
    Color,
}

impl ParamKind {
    fn name(&self) -> &'static str {
        match self {
            ParamKind::Number { .. } => "number",
            ParamKind::Toggle => "toggle",
            ParamKind::Color => "color",
        }
    }

    /// Snap and clamp a number to this kind's range.
    fn normalize(&self, value: f64) -> f64 {
        match *self {
            ParamKind::Number { min, max, step } => {
                let snapped = if step > 0.0 { min + ((value - min) / step).round() * step } else { value };
                snapped.clamp(min, max)
            }
            _ => value,
        }
    }
}

/// What an external widget needs to lay out one control.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    pub name: String,
    /// Grouping label for the widget. Names stay unique across folders.
    pub folder: Option<String>,
    pub kind: ParamKind,
}

type Getter = Box<dyn Fn(&Scene) -> Result<ParamValue>>;
type Setter = Box<dyn FnMut(&mut Scene, ParamValue) -> Result<()>>;
type ChangeCallback = Box<dyn FnMut(ParamValue)>;

struct Binding {
    descriptor: ParamDescriptor,
    get: Getter,
    set: Setter,
    on_change: Option<ChangeCallback>,
}

/// Handle to a just-registered binding, for chaining options.
pub struct BindingRef<'a> {
    binding: &'a mut Binding,
}

impl BindingRef<'_> {
    pub fn in_folder(self, folder: impl Into<String>) -> Self {
        self.binding.descriptor.folder = Some(folder.into());
        self
    }

    /// Called after every successful [`ParameterPanel::set`], with the
    /// value that was applied.
    pub fn on_change(self, callback: impl FnMut(ParamValue) + 'static) -> Self {
        self.binding.on_change = Some(Box::new(callback));
        self
    }
}

#[derive(Default)]
pub struct ParameterPanel {
    bindings: Vec<Binding>,
}

impl ParameterPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    // ── Registration ────────────────────────────────────────────────────

    pub fn number(
        &mut self,
        name: impl Into<String>,
        (min, max, step): (f64, f64, f64),
        get: impl Fn(&Scene) -> Result<f64> + 'static,
        mut set: impl FnMut(&mut Scene, f64) -> Result<()> + 'static,
    ) -> Result<BindingRef<'_>> {
        if !(min.is_finite() && max.is_finite() && min <= max && step.is_finite() && step >= 0.0) {
            return Err(Error::InvalidExtent("number parameter needs finite min <= max and finite step >= 0"));
        }
        let name = name.into();
        let expected = name.clone();
        self.register(
            name,
            ParamKind::Number { min, max, step },
            Box::new(move |scene: &Scene| get(scene).map(ParamValue::Number)),
            Box::new(move |scene: &mut Scene, value: ParamValue| match value {
                ParamValue::Number(v) => set(scene, v),
                _ => Err(Error::ParameterKind { name: expected.clone(), expected: "number" }),
            }),
        )
    }

    pub fn toggle(
        &mut self,
        name: impl Into<String>,
        get: impl Fn(&Scene) -> Result<bool> + 'static,
        mut set: impl FnMut(&mut Scene, bool) -> Result<()> + 'static,
    ) -> Result<BindingRef<'_>> {
        let name = name.into();
        let expected = name.clone();
        self.register(
            name,
            ParamKind::Toggle,
            Box::new(move |scene: &Scene| get(scene).map(ParamValue::Toggle)),
            Box::new(move |scene: &mut Scene, value: ParamValue| match value {
                ParamValue::Toggle(v) => set(scene, v),
                _ => Err(Error::ParameterKind { name: expected.clone(), expected: "toggle" }),
            }),
        )
    }

    pub fn color(
        &mut self,
        name: impl Into<String>,
        get: impl Fn(&Scene) -> Result<Color> + 'static,
        mut set: impl FnMut(&mut Scene, Color) -> Result<()> + 'static,
    ) -> Result<BindingRef<'_>> {
        let name = name.into();
        let expected = name.clone();
        self.register(
            name,
            ParamKind::Color,
            Box::new(move |scene: &Scene| get(scene).map(ParamValue::Color)),
            Box::new(move |scene: &mut Scene, value: ParamValue| match value {
                ParamValue::Color(v) => set(scene, v),
                _ => Err(Error::ParameterKind { name: expected.clone(), expected: "color" }),
            }),
        )
    }

    fn register(&mut self, name: String, kind: ParamKind, get: Getter, set: Setter) -> Result<BindingRef<'_>> {
        if self.index_of(&name).is_some() {
            return Err(Error::DuplicateParameter(name));
        }
        let index = self.bindings.len();
        self.bindings.push(Binding {
            descriptor: ParamDescriptor { name, folder: None, kind },
            get,
            set,
            on_change: None,
        });
        Ok(BindingRef { binding: &mut self.bindings[index] })
    }

    // ── Common bindings ─────────────────────────────────────────────────

    /// Bind one local translation axis (0 = x, 1 = y, 2 = z) of `node`.
    pub fn bind_translation(
        &mut self,
        name: impl Into<String>,
        node: NodeId,
        axis: usize,
        range: (f64, f64, f64),
    ) -> Result<BindingRef<'_>> {
        if axis > 2 {
            return Err(Error::InvalidExtent("translation axis must be 0, 1 or 2"));
        }
        self.number(
            name,
            range,
            move |scene| Ok(scene.node(node)?.transform.translation[axis] as f64),
            move |scene, v| {
                scene.node_mut(node)?.transform.translation[axis] = v as f32;
                Ok(())
            },
        )
    }

    pub fn bind_visible(&mut self, name: impl Into<String>, node: NodeId) -> Result<BindingRef<'_>> {
        self.toggle(
            name,
            move |scene| Ok(scene.node(node)?.visible),
            move |scene, v| {
                scene.node_mut(node)?.visible = v;
                Ok(())
            },
        )
    }

    /// Bind the color of a mesh's material. Edits copy a shared material
    /// first, so other meshes using it keep their color.
    pub fn bind_material_color(&mut self, name: impl Into<String>, mesh: NodeId) -> Result<BindingRef<'_>> {
        self.color(
            name,
            move |scene| {
                let material = scene.mesh(mesh)?.material.as_ref();
                material
                    .map(|m| m.color)
                    .ok_or_else(|| Error::InvalidData(format!("{mesh:?} has no material yet")))
            },
            move |scene, color| {
                let material = scene.mesh_mut(mesh)?.material.as_mut();
                let material = material.ok_or_else(|| Error::InvalidData(format!("{mesh:?} has no material yet")))?;
                Arc::make_mut(material).color = color;
                Ok(())
            },
        )
    }

    pub fn bind_light_intensity(&mut self, name: impl Into<String>, light: NodeId, max: f64) -> Result<BindingRef<'_>> {
        self.number(
            name,
            (0.0, max, 0.001),
            move |scene| Ok(scene.light(light)?.intensity() as f64),
            move |scene, v| scene.light_mut(light)?.set_intensity(v as f32),
        )
    }

    pub fn bind_light_color(&mut self, name: impl Into<String>, light: NodeId) -> Result<BindingRef<'_>> {
        self.color(
            name,
            move |scene| Ok(scene.light(light)?.color),
            move |scene, color| {
                scene.light_mut(light)?.color = color;
                Ok(())
            },
        )
    }

    // ── Access ──────────────────────────────────────────────────────────

    pub fn descriptors(&self) -> impl Iterator<Item = &ParamDescriptor> {
        self.bindings.iter().map(|b| &b.descriptor)
    }

    pub fn descriptor(&self, name: &str) -> Option<&ParamDescriptor> {
        self.index_of(name).map(|i| &self.bindings[i].descriptor)
    }

    pub fn get(&self, scene: &Scene, name: &str) -> Result<ParamValue> {
        let index = self.index_of(name).ok_or_else(|| Error::UnknownParameter(name.to_string()))?;
        (self.bindings[index].get)(scene)
    }

    /// Apply a widget edit and return the value actually written, after
    /// snapping and clamping.
    pub fn set(&mut self, scene: &mut Scene, name: &str, value: ParamValue) -> Result<ParamValue> {
        let index = self.index_of(name).ok_or_else(|| Error::UnknownParameter(name.to_string()))?;
        let binding = &mut self.bindings[index];
        let kind = binding.descriptor.kind;

        let value = match value {
            ParamValue::Number(v) if matches!(kind, ParamKind::Number { .. }) => {
                if !v.is_finite() {
                    return Err(Error::ParameterKind { name: name.to_string(), expected: "finite number" });
                }
                ParamValue::Number(kind.normalize(v))
            }
            ParamValue::Toggle(_) if kind == ParamKind::Toggle => value,
            ParamValue::Color(_) if kind == ParamKind::Color => value,
            other => {
                log::debug!("parameter '{name}' got a {} value", other.kind_name());
                return Err(Error::ParameterKind { name: name.to_string(), expected: kind.name() });
            }
        };

        (binding.set)(scene, value)?;
        if let Some(callback) = &mut binding.on_change {
            callback(value);
        }
        Ok(value)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.bindings.iter().position(|b| b.descriptor.name == name)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::geometry::Geometry;
    use crate::light::Light;
    use crate::material::Material;
    use crate::scene::{Mesh, Node};

    fn scene_with_cube() -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let cube = scene.spawn(Node::mesh(
            "cube",
            Mesh::new(Arc::new(Geometry::cuboid(1.0, 1.0, 1.0)), Arc::new(Material::basic(Color::RED))),
        ));
        (scene, cube)
    }

    #[test]
    fn number_snaps_and_clamps() {
        let (mut scene, cube) = scene_with_cube();
        let mut panel = ParameterPanel::new();
        panel.bind_translation("elevation", cube, 1, (-3.0, 3.0, 0.01)).unwrap();

        let applied = panel.set(&mut scene, "elevation", ParamValue::Number(1.234)).unwrap();
        assert_eq!(applied, ParamValue::Number(-3.0 + (4.234f64 / 0.01).round() * 0.01));
        assert!((scene.node(cube).unwrap().transform.translation.y - 1.23).abs() < 1e-5);

        panel.set(&mut scene, "elevation", ParamValue::Number(99.0)).unwrap();
        assert_eq!(scene.node(cube).unwrap().transform.translation.y, 3.0);
        assert_eq!(panel.get(&scene, "elevation").unwrap(), ParamValue::Number(3.0));
    }

    #[test]
    fn number_range_must_be_finite() {
        let mut panel = ParameterPanel::new();
        for step in [f64::INFINITY, f64::NAN, -0.1] {
            let result = panel.number("x", (0.0, 1.0, step), |_| Ok(0.0), |_, _| Ok(()));
            assert!(matches!(result, Err(Error::InvalidExtent(_))), "step {step}");
        }
        assert!(panel.number("x", (0.0, f64::INFINITY, 0.1), |_| Ok(0.0), |_, _| Ok(())).is_err());
        assert!(panel.is_empty());
    }

    #[test]
    fn wrong_kind_and_unknown_name_rejected() {
        let (mut scene, cube) = scene_with_cube();
        let mut panel = ParameterPanel::new();
        panel.bind_visible("visible", cube).unwrap();

        assert!(matches!(
            panel.set(&mut scene, "visible", ParamValue::Number(1.0)),
            Err(Error::ParameterKind { expected: "toggle", .. })
        ));
        assert!(matches!(
            panel.set(&mut scene, "nope", ParamValue::Toggle(true)),
            Err(Error::UnknownParameter(_))
        ));
        assert!(matches!(panel.bind_visible("visible", cube), Err(Error::DuplicateParameter(_))));

        panel.set(&mut scene, "visible", ParamValue::Toggle(false)).unwrap();
        assert!(!scene.node(cube).unwrap().visible);
    }

    #[test]
    fn change_callback_sees_applied_value() {
        let (mut scene, cube) = scene_with_cube();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let mut panel = ParameterPanel::new();
        panel
            .bind_material_color("color", cube)
            .unwrap()
            .in_folder("cube")
            .on_change(move |v| log.borrow_mut().push(v));

        let green = ParamValue::Color(Color::GREEN);
        panel.set(&mut scene, "color", green).unwrap();
        assert_eq!(*seen.borrow(), vec![green]);
        assert_eq!(scene.mesh(cube).unwrap().material.as_ref().unwrap().color, Color::GREEN);
        assert_eq!(panel.descriptor("color").unwrap().folder.as_deref(), Some("cube"));
    }

    #[test]
    fn failed_setter_skips_callback() {
        let mut scene = Scene::new();
        let light = scene.spawn(Node::light("sun", Light::directional(Color::WHITE, 1.0).unwrap()));
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let mut panel = ParameterPanel::new();
        panel
            .bind_light_intensity("intensity", light, 5.0)
            .unwrap()
            .on_change(move |_| *counter.borrow_mut() += 1);

        scene.despawn(light).unwrap();
        assert!(matches!(
            panel.set(&mut scene, "intensity", ParamValue::Number(2.0)),
            Err(Error::StaleNode(_))
        ));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn descriptors_in_registration_order() {
        let (_, cube) = scene_with_cube();
        let mut panel = ParameterPanel::new();
        panel.bind_translation("x", cube, 0, (-1.0, 1.0, 0.0)).unwrap();
        panel.bind_visible("visible", cube).unwrap();
        let names: Vec<_> = panel.descriptors().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["x", "visible"]);
        assert!(panel.bind_translation("w", cube, 3, (0.0, 1.0, 0.0)).is_err());
    }
}

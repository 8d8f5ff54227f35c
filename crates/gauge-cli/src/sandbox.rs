//! In-memory SUT driven by the built-in suite
//!
//! Objects come in four kinds, each with a typed property schema. The
//! `Parent` property links objects into a tree; disposing an object also
//! disposes everything beneath it.

use gauge_harness::{AdapterError, MemoryProbe, PropertyValue, ResourceHandle, SutAdapter};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::mem;
use std::rc::Rc;

/// Property every kind carries; holds the parent handle
pub const PARENT: &str = "Parent";

/// Object kinds the sandbox can create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Part,
    Frame,
    Label,
    Folder,
}

impl Kind {
    pub const ALL: [Kind; 4] = [Kind::Part, Kind::Frame, Kind::Label, Kind::Folder];

    pub fn parse(name: &str) -> Option<Kind> {
        Kind::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Kind::Part => "Part",
            Kind::Frame => "Frame",
            Kind::Label => "Label",
            Kind::Folder => "Folder",
        }
    }

    /// Property names with their default values. The default also fixes
    /// the property's type.
    fn schema(&self) -> Vec<(&'static str, PropertyValue)> {
        let mut props = vec![
            ("Name", PropertyValue::Text(self.name().to_string())),
            (PARENT, PropertyValue::Handle(None)),
        ];
        match self {
            Kind::Part => props.extend([
                ("Size", PropertyValue::Number(1.0)),
                ("Anchored", PropertyValue::Bool(false)),
                ("Transparency", PropertyValue::Number(0.0)),
                (
                    "Color",
                    PropertyValue::Color {
                        r: 163,
                        g: 162,
                        b: 165,
                    },
                ),
            ]),
            Kind::Frame => props.extend([
                ("Width", PropertyValue::Number(100.0)),
                ("Height", PropertyValue::Number(100.0)),
                ("Visible", PropertyValue::Bool(true)),
                (
                    "BackgroundColor",
                    PropertyValue::Color {
                        r: 255,
                        g: 255,
                        b: 255,
                    },
                ),
            ]),
            Kind::Label => props.extend([
                ("Text", PropertyValue::Text(String::new())),
                ("TextSize", PropertyValue::Number(14.0)),
                ("Visible", PropertyValue::Bool(true)),
                ("TextColor", PropertyValue::Color { r: 0, g: 0, b: 0 }),
            ]),
            Kind::Folder => {}
        }
        props
    }
}

#[derive(Debug)]
struct Object {
    kind: Kind,
    props: BTreeMap<String, PropertyValue>,
    children: Vec<ResourceHandle>,
}

#[derive(Debug, Default)]
struct World {
    next_id: u64,
    objects: BTreeMap<ResourceHandle, Object>,
}

impl World {
    fn object(&self, handle: ResourceHandle) -> Result<&Object, AdapterError> {
        self.objects
            .get(&handle)
            .ok_or(AdapterError::UnknownHandle(handle))
    }

    fn parent_of(&self, handle: ResourceHandle) -> Option<ResourceHandle> {
        match self.objects.get(&handle)?.props.get(PARENT) {
            Some(PropertyValue::Handle(parent)) => *parent,
            _ => None,
        }
    }

    fn set(
        &mut self,
        handle: ResourceHandle,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), AdapterError> {
        let object = self.object(handle)?;
        let current = object
            .props
            .get(name)
            .ok_or_else(|| AdapterError::InvalidProperty {
                kind: object.kind.name().to_string(),
                property: name.to_string(),
            })?;
        if mem::discriminant(current) != mem::discriminant(&value) {
            return Err(AdapterError::TypeMismatch {
                property: name.to_string(),
                expected: current.type_name().to_string(),
                found: value.type_name().to_string(),
            });
        }

        if let (PARENT, PropertyValue::Handle(parent)) = (name, &value) {
            self.reparent(handle, *parent)?;
        }
        if let Some(object) = self.objects.get_mut(&handle) {
            object.props.insert(name.to_string(), value);
        }
        Ok(())
    }

    fn reparent(
        &mut self,
        child: ResourceHandle,
        parent: Option<ResourceHandle>,
    ) -> Result<(), AdapterError> {
        if let Some(parent) = parent {
            self.object(parent)?;
            // The new parent may not be the child itself or one of its descendants
            let mut cursor = Some(parent);
            while let Some(current) = cursor {
                if current == child {
                    let kind = self.object(child)?.kind;
                    return Err(AdapterError::InvalidProperty {
                        kind: kind.name().to_string(),
                        property: PARENT.to_string(),
                    });
                }
                cursor = self.parent_of(current);
            }
        }

        self.detach(child);
        if let Some(parent) = parent.and_then(|p| self.objects.get_mut(&p)) {
            parent.children.push(child);
        }
        Ok(())
    }

    fn detach(&mut self, child: ResourceHandle) {
        if let Some(old) = self.parent_of(child).and_then(|p| self.objects.get_mut(&p)) {
            old.children.retain(|c| *c != child);
        }
    }

    fn dispose(&mut self, handle: ResourceHandle) {
        if !self.objects.contains_key(&handle) {
            return;
        }
        self.detach(handle);
        let mut pending = vec![handle];
        while let Some(next) = pending.pop() {
            if let Some(object) = self.objects.remove(&next) {
                pending.extend(object.children);
            }
        }
    }
}

/// The sandbox adapter. Clones share one object world.
#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    world: Rc<RefCell<World>>,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe reporting the live object count
    pub fn probe(&self) -> SandboxProbe {
        SandboxProbe {
            world: Rc::clone(&self.world),
        }
    }

    /// Objects created and not yet disposed
    pub fn live(&self) -> usize {
        self.world.borrow().objects.len()
    }
}

impl SutAdapter for Sandbox {
    fn create(&mut self, kind: &str) -> Result<ResourceHandle, AdapterError> {
        let kind = Kind::parse(kind).ok_or_else(|| AdapterError::UnsupportedKind(kind.into()))?;
        let mut world = self.world.borrow_mut();
        world.next_id += 1;
        let handle = ResourceHandle::new(world.next_id);
        let props = kind
            .schema()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        world.objects.insert(
            handle,
            Object {
                kind,
                props,
                children: Vec::new(),
            },
        );
        Ok(handle)
    }

    fn set_property(
        &mut self,
        handle: ResourceHandle,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), AdapterError> {
        self.world.borrow_mut().set(handle, name, value)
    }

    fn get_property(
        &self,
        handle: ResourceHandle,
        name: &str,
    ) -> Result<PropertyValue, AdapterError> {
        let world = self.world.borrow();
        let object = world.object(handle)?;
        object
            .props
            .get(name)
            .cloned()
            .ok_or_else(|| AdapterError::InvalidProperty {
                kind: object.kind.name().to_string(),
                property: name.to_string(),
            })
    }

    fn dispose(&mut self, handle: ResourceHandle) -> Result<(), AdapterError> {
        self.world.borrow_mut().dispose(handle);
        Ok(())
    }
}

/// Memory probe counting live sandbox objects
#[derive(Debug, Clone)]
pub struct SandboxProbe {
    world: Rc<RefCell<World>>,
}

impl MemoryProbe for SandboxProbe {
    fn current_usage(&self) -> Option<f64> {
        Some(self.world.borrow().objects.len() as f64)
    }

    fn unit(&self) -> &'static str {
        "objects"
    }
}

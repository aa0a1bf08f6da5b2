use crate::components::{Camera, DirectionalLight, Material, Mesh, PointLight, SpotLight};
use prism_common::{Entity, Transform};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The closed set of component kinds the registry stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    Transform,
    Camera,
    Mesh,
    Material,
    DirectionalLight,
    PointLight,
    SpotLight,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 7] = [
        Self::Transform,
        Self::Camera,
        Self::Mesh,
        Self::Material,
        Self::DirectionalLight,
        Self::PointLight,
        Self::SpotLight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Transform => "Transform",
            Self::Camera => "Camera",
            Self::Mesh => "Mesh",
            Self::Material => "Material",
            Self::DirectionalLight => "DirectionalLight",
            Self::PointLight => "PointLight",
            Self::SpotLight => "SpotLight",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors from registry operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("entity id space exhausted")]
    EntityIdsExhausted,
}

mod storage {
    use super::*;

    #[derive(Debug, Clone, Default)]
    pub struct Tables {
        pub transforms: BTreeMap<Entity, Transform>,
        pub cameras: BTreeMap<Entity, Camera>,
        pub meshes: BTreeMap<Entity, Mesh>,
        pub materials: BTreeMap<Entity, Material>,
        pub directional_lights: BTreeMap<Entity, DirectionalLight>,
        pub point_lights: BTreeMap<Entity, PointLight>,
        pub spot_lights: BTreeMap<Entity, SpotLight>,
    }

    impl Tables {
        pub fn contains(&self, entity: Entity, kind: ComponentKind) -> bool {
            match kind {
                ComponentKind::Transform => self.transforms.contains_key(&entity),
                ComponentKind::Camera => self.cameras.contains_key(&entity),
                ComponentKind::Mesh => self.meshes.contains_key(&entity),
                ComponentKind::Material => self.materials.contains_key(&entity),
                ComponentKind::DirectionalLight => self.directional_lights.contains_key(&entity),
                ComponentKind::PointLight => self.point_lights.contains_key(&entity),
                ComponentKind::SpotLight => self.spot_lights.contains_key(&entity),
            }
        }

        pub fn remove_all(&mut self, entity: Entity) -> usize {
            [
                self.transforms.remove(&entity).is_some(),
                self.cameras.remove(&entity).is_some(),
                self.meshes.remove(&entity).is_some(),
                self.materials.remove(&entity).is_some(),
                self.directional_lights.remove(&entity).is_some(),
                self.point_lights.remove(&entity).is_some(),
                self.spot_lights.remove(&entity).is_some(),
            ]
            .into_iter()
            .filter(|removed| *removed)
            .count()
        }

        pub fn keys(&self) -> impl Iterator<Item = Entity> + '_ {
            self.transforms
                .keys()
                .chain(self.cameras.keys())
                .chain(self.meshes.keys())
                .chain(self.materials.keys())
                .chain(self.directional_lights.keys())
                .chain(self.point_lights.keys())
                .chain(self.spot_lights.keys())
                .copied()
        }
    }

    pub trait Stored: Sized {
        fn table(tables: &Tables) -> &BTreeMap<Entity, Self>;
        fn table_mut(tables: &mut Tables) -> &mut BTreeMap<Entity, Self>;
    }
}

/// A component type the registry knows how to store.
///
/// Implemented for exactly the kinds listed in [`ComponentKind`].
pub trait Component: storage::Stored + 'static {
    const KIND: ComponentKind;
}

macro_rules! component {
    ($ty:ty, $field:ident, $kind:ident) => {
        impl storage::Stored for $ty {
            fn table(tables: &storage::Tables) -> &BTreeMap<Entity, Self> {
                &tables.$field
            }

            fn table_mut(tables: &mut storage::Tables) -> &mut BTreeMap<Entity, Self> {
                &mut tables.$field
            }
        }

        impl Component for $ty {
            const KIND: ComponentKind = ComponentKind::$kind;
        }
    };
}

component!(Transform, transforms, Transform);
component!(Camera, cameras, Camera);
component!(Mesh, meshes, Mesh);
component!(Material, materials, Material);
component!(DirectionalLight, directional_lights, DirectionalLight);
component!(PointLight, point_lights, PointLight);
component!(SpotLight, spot_lights, SpotLight);

/// Owns every (entity, kind) -> component association.
///
/// Each kind has its own BTreeMap keyed by entity, so per-kind iteration is in
/// ascending entity order. An entity exists only while it holds at least one
/// component.
#[derive(Debug, Clone)]
pub struct Registry {
    next: Option<Entity>,
    tables: storage::Tables,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            next: Entity::from_raw(1),
            tables: storage::Tables::default(),
        }
    }

    /// Allocate a fresh identity. Ids start at 1 and are never reused.
    pub fn create_entity(&mut self) -> Result<Entity, RegistryError> {
        let entity = self.next.ok_or(RegistryError::EntityIdsExhausted)?;
        self.next = entity.raw().checked_add(1).and_then(Entity::from_raw);
        tracing::trace!(%entity, "entity created");
        Ok(entity)
    }

    /// Attach `component` to `entity`, replacing any existing one of the same kind.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> &mut T {
        match T::table_mut(&mut self.tables).entry(entity) {
            Entry::Occupied(mut slot) => {
                tracing::debug!(%entity, kind = %T::KIND, "component replaced");
                slot.insert(component);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(component),
        }
    }

    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        T::table(&self.tables).get(&entity)
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        T::table_mut(&mut self.tables).get_mut(&entity)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        T::table(&self.tables).contains_key(&entity)
    }

    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        T::table_mut(&mut self.tables).remove(&entity)
    }

    /// Entities currently holding a `T`, in ascending id order.
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        T::table(&self.tables).keys().copied().collect()
    }

    /// The lowest-id entity holding a `T`.
    pub fn first_with<T: Component>(&self) -> Option<Entity> {
        T::table(&self.tables).keys().next().copied()
    }

    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        T::table(&self.tables).iter().map(|(e, c)| (*e, c))
    }

    pub fn iter_mut<T: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        T::table_mut(&mut self.tables).iter_mut().map(|(e, c)| (*e, c))
    }

    pub fn count<T: Component>(&self) -> usize {
        T::table(&self.tables).len()
    }

    /// Remove every component of `entity`. Returns how many were removed.
    pub fn destroy_entity(&mut self, entity: Entity) -> usize {
        let removed = self.tables.remove_all(entity);
        if removed > 0 {
            tracing::debug!(%entity, removed, "entity destroyed");
        }
        removed
    }

    /// Distinct entities holding at least one component.
    pub fn entity_count(&self) -> usize {
        self.tables.keys().collect::<BTreeSet<_>>().len()
    }

    /// Every live entity in ascending id order.
    pub fn entities(&self) -> Vec<Entity> {
        self.tables
            .keys()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        ComponentKind::ALL
            .iter()
            .any(|kind| self.tables.contains(entity, *kind))
    }

    /// Kinds attached to `entity`, in `ComponentKind::ALL` order.
    pub fn component_kinds(&self, entity: Entity) -> Vec<ComponentKind> {
        ComponentKind::ALL
            .into_iter()
            .filter(|kind| self.tables.contains(entity, *kind))
            .collect()
    }

    #[cfg(test)]
    fn starting_at(raw: u32) -> Self {
        Self {
            next: Entity::from_raw(raw),
            tables: storage::Tables::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{LightCommon, MeshHandle};
    use glam::Vec3;
    use std::collections::HashSet;

    fn mesh(id: u32) -> Mesh {
        Mesh {
            handle: MeshHandle(id),
            index_count: 36,
            vertex_stride: 72,
        }
    }

    #[test]
    fn ids_start_at_one_and_are_distinct() {
        let mut registry = Registry::new();
        let ids: Vec<Entity> = (0..100).map(|_| registry.create_entity().unwrap()).collect();
        assert_eq!(ids[0].raw(), 1);
        let unique: HashSet<Entity> = ids.iter().copied().collect();
        assert_eq!(unique.len(), 100);
    }

    #[test]
    fn ids_are_not_reused_after_destroy() {
        let mut registry = Registry::new();
        let a = registry.create_entity().unwrap();
        registry.add_component(a, Transform::default());
        registry.destroy_entity(a);
        let b = registry.create_entity().unwrap();
        assert!(b > a);
    }

    #[test]
    fn id_exhaustion_is_an_error() {
        let mut registry = Registry::starting_at(u32::MAX);
        let last = registry.create_entity().unwrap();
        assert_eq!(last.raw(), u32::MAX);
        assert_eq!(
            registry.create_entity(),
            Err(RegistryError::EntityIdsExhausted)
        );
        // stays exhausted
        assert!(registry.create_entity().is_err());
    }

    #[test]
    fn add_then_get_returns_component() {
        let mut registry = Registry::new();
        let e = registry.create_entity().unwrap();
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        registry.add_component(e, t);
        assert_eq!(registry.get_component::<Transform>(e), Some(&t));
    }

    #[test]
    fn missing_component_is_none() {
        let mut registry = Registry::new();
        let e = registry.create_entity().unwrap();
        registry.add_component(e, Transform::default());
        assert!(registry.get_component::<Camera>(e).is_none());
        assert!(!registry.has_component::<Mesh>(e));
    }

    #[test]
    fn add_component_replaces_existing() {
        let mut registry = Registry::new();
        let e = registry.create_entity().unwrap();
        registry.add_component(e, Transform::from_position(Vec3::X));
        registry.add_component(e, Transform::from_position(Vec3::Y));
        assert_eq!(
            registry.get_component::<Transform>(e).map(|t| t.position),
            Some(Vec3::Y)
        );
        assert_eq!(registry.count::<Transform>(), 1);
    }

    #[test]
    fn add_component_returns_live_reference() {
        let mut registry = Registry::new();
        let e = registry.create_entity().unwrap();
        registry.add_component(e, Camera::default()).move_speed = 12.0;
        assert_eq!(registry.get_component::<Camera>(e).unwrap().move_speed, 12.0);
    }

    #[test]
    fn entities_with_matches_holders() {
        let mut registry = Registry::new();
        let a = registry.create_entity().unwrap();
        let b = registry.create_entity().unwrap();
        let c = registry.create_entity().unwrap();
        registry.add_component(c, mesh(0));
        registry.add_component(a, mesh(1));
        registry.add_component(b, Transform::default());

        assert_eq!(registry.entities_with::<Mesh>(), vec![a, c]);
        assert_eq!(registry.entities_with::<Transform>(), vec![b]);
        assert!(registry.entities_with::<SpotLight>().is_empty());
        assert_eq!(registry.first_with::<Mesh>(), Some(a));
    }

    #[test]
    fn destroy_removes_every_kind() {
        let mut registry = Registry::new();
        let e = registry.create_entity().unwrap();
        let other = registry.create_entity().unwrap();
        registry.add_component(e, Transform::default());
        registry.add_component(e, mesh(0));
        registry.add_component(e, Material::default());
        registry.add_component(
            e,
            PointLight {
                common: LightCommon::default(),
                position: Vec3::ONE,
                range: 4.0,
            },
        );
        registry.add_component(other, Transform::default());

        assert_eq!(registry.destroy_entity(e), 4);
        assert!(registry.component_kinds(e).is_empty());
        assert!(registry.get_component::<Transform>(e).is_none());
        assert!(!registry.entities_with::<Mesh>().contains(&e));
        assert!(!registry.entities_with::<PointLight>().contains(&e));
        assert!(registry.contains(other));
    }

    #[test]
    fn destroy_unknown_entity_is_noop() {
        let mut registry = Registry::new();
        let e = registry.create_entity().unwrap();
        assert_eq!(registry.destroy_entity(e), 0);
        assert_eq!(registry.entity_count(), 0);
    }

    #[test]
    fn entity_count_is_union_over_kinds() {
        let mut registry = Registry::new();
        let a = registry.create_entity().unwrap();
        let b = registry.create_entity().unwrap();
        // created but never given a component
        let _c = registry.create_entity().unwrap();
        registry.add_component(a, Transform::default());
        registry.add_component(a, mesh(0));
        registry.add_component(b, Camera::default());

        assert_eq!(registry.entity_count(), 2);
        assert_eq!(registry.entities(), vec![a, b]);
    }

    #[test]
    fn component_kinds_lists_attached() {
        let mut registry = Registry::new();
        let e = registry.create_entity().unwrap();
        registry.add_component(e, mesh(0));
        registry.add_component(e, Transform::default());
        assert_eq!(
            registry.component_kinds(e),
            vec![ComponentKind::Transform, ComponentKind::Mesh]
        );
    }

    #[test]
    fn iter_mut_edits_in_place() {
        let mut registry = Registry::new();
        for _ in 0..3 {
            let e = registry.create_entity().unwrap();
            registry.add_component(e, Camera::default());
        }
        for (_, cam) in registry.iter_mut::<Camera>() {
            cam.aspect_ratio = 2.0;
        }
        assert!(registry.iter::<Camera>().all(|(_, c)| c.aspect_ratio == 2.0));
    }

    #[test]
    fn remove_component_leaves_others() {
        let mut registry = Registry::new();
        let e = registry.create_entity().unwrap();
        registry.add_component(e, Transform::default());
        registry.add_component(e, Material::default());
        assert!(registry.remove_component::<Material>(e).is_some());
        assert!(registry.remove_component::<Material>(e).is_none());
        assert!(registry.contains(e));
    }
}

use prism_ecs::{
    Camera, ComponentKind, DirectionalLight, Entity, Material, Mesh, PointLight, Registry,
    SpotLight, Transform,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Read-only queries over a registry for debugging and tooling output.
pub struct SceneInspector;

impl SceneInspector {
    pub fn summary(registry: &Registry) -> SceneSummary {
        let mut components = BTreeMap::new();
        for entity in registry.entities() {
            for kind in registry.component_kinds(entity) {
                *components.entry(kind).or_insert(0) += 1;
            }
        }
        SceneSummary {
            entity_count: registry.entity_count(),
            components,
            main_camera: prism_render::main_camera(registry),
        }
    }

    /// Every component held by `entity`, or `None` if it holds none.
    pub fn inspect_entity(registry: &Registry, entity: Entity) -> Option<EntityInfo> {
        if !registry.contains(entity) {
            return None;
        }
        Some(EntityInfo {
            entity,
            kinds: registry.component_kinds(entity),
            transform: registry.get_component::<Transform>(entity).copied(),
            camera: registry.get_component::<Camera>(entity).copied(),
            mesh: registry.get_component::<Mesh>(entity).copied(),
            material: registry.get_component::<Material>(entity).copied(),
            directional_light: registry.get_component::<DirectionalLight>(entity).copied(),
            point_light: registry.get_component::<PointLight>(entity).copied(),
            spot_light: registry.get_component::<SpotLight>(entity).copied(),
        })
    }

    pub fn list_entities(registry: &Registry) -> Vec<Entity> {
        registry.entities()
    }

    pub fn inspect_all(registry: &Registry) -> Vec<EntityInfo> {
        registry
            .entities()
            .into_iter()
            .filter_map(|e| Self::inspect_entity(registry, e))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSummary {
    pub entity_count: usize,
    pub components: BTreeMap<ComponentKind, usize>,
    pub main_camera: Option<Entity>,
}

impl fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scene: entities={}", self.entity_count)?;
        match self.main_camera {
            Some(camera) => write!(f, " camera={camera}")?,
            None => write!(f, " camera=none")?,
        }
        for (kind, count) in &self.components {
            write!(f, " {kind}={count}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityInfo {
    pub entity: Entity,
    pub kinds: Vec<ComponentKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<Camera>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<Mesh>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<Material>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directional_light: Option<DirectionalLight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_light: Option<PointLight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot_light: Option<SpotLight>,
}

impl fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<&str> = self.kinds.iter().map(|k| k.name()).collect();
        write!(f, "Entity {} [{}]", self.entity, kinds.join(", "))?;
        if let Some(t) = &self.transform {
            let (p, s) = (t.position, t.scale);
            write!(
                f,
                " pos=({:.2}, {:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2})",
                p.x, p.y, p.z, s.x, s.y, s.z
            )?;
        }
        if let Some(c) = &self.camera {
            let (p, l) = (c.position, c.look_direction);
            write!(
                f,
                " eye=({:.2}, {:.2}, {:.2}) look=({:.2}, {:.2}, {:.2})",
                p.x, p.y, p.z, l.x, l.y, l.z
            )?;
        }
        if let Some(m) = &self.mesh {
            write!(f, " mesh={} indices={}", m.handle.0, m.index_count)?;
        }
        if let Some(l) = &self.point_light {
            write!(f, " range={:.2}", l.range)?;
        }
        if let Some(l) = &self.spot_light {
            write!(f, " range={:.2}", l.range)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn scene() -> (Registry, Entity, Entity) {
        let mut registry = Registry::new();
        let camera = registry.create_entity().unwrap();
        registry.add_component(camera, Camera::default());
        let cube = registry.create_entity().unwrap();
        registry.add_component(cube, Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));
        registry.add_component(cube, Material::default());
        (registry, camera, cube)
    }

    #[test]
    fn summary_empty_registry() {
        let summary = SceneInspector::summary(&Registry::new());
        assert_eq!(summary.entity_count, 0);
        assert!(summary.components.is_empty());
        assert_eq!(summary.main_camera, None);
        assert_eq!(summary.to_string(), "Scene: entities=0 camera=none");
    }

    #[test]
    fn summary_counts_each_kind() {
        let (registry, camera, _) = scene();
        let summary = SceneInspector::summary(&registry);
        assert_eq!(summary.entity_count, 2);
        assert_eq!(summary.components[&ComponentKind::Camera], 1);
        assert_eq!(summary.components[&ComponentKind::Transform], 1);
        assert!(!summary.components.contains_key(&ComponentKind::Mesh));
        assert_eq!(summary.main_camera, Some(camera));
        assert!(summary.to_string().contains("camera=#1"));
    }

    #[test]
    fn inspect_entity_collects_components() {
        let (registry, _, cube) = scene();
        let info = SceneInspector::inspect_entity(&registry, cube).unwrap();
        assert_eq!(info.kinds, vec![ComponentKind::Transform, ComponentKind::Material]);
        assert_eq!(info.transform.unwrap().position, Vec3::new(1.0, 2.0, 3.0));
        assert!(info.camera.is_none());
        assert!(info.to_string().starts_with("Entity #2 [Transform, Material] pos=(1.00, 2.00, 3.00)"));
    }

    #[test]
    fn inspect_unknown_entity_is_none() {
        let (registry, _, _) = scene();
        let missing = Entity::from_raw(99).unwrap();
        assert!(SceneInspector::inspect_entity(&registry, missing).is_none());
    }

    #[test]
    fn list_entities_is_ascending() {
        let (registry, camera, cube) = scene();
        assert_eq!(SceneInspector::list_entities(&registry), vec![camera, cube]);
    }

    #[test]
    fn entity_info_json_omits_missing_components() {
        let (registry, camera, _) = scene();
        let info = SceneInspector::inspect_entity(&registry, camera).unwrap();
        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("camera").is_some());
        assert!(json.get("transform").is_none());
        assert_eq!(json["kinds"], serde_json::json!(["Camera"]));
    }
}

use crate::assets::{SPHERE_RADIUS, SceneAssets};
use crate::description::{CameraDescription, LightDescription, ObjectDescription, SceneDescription};
use glam::{Vec3, Vec4};
use prism_ecs::{
    Camera, DirectionalLight, Entity, LightCommon, PointLight, Registry, RegistryError, SpotLight,
    Transform,
};

/// Creates scene entities with the shared meshes and materials attached.
pub struct SceneBuilder<'a> {
    registry: &'a mut Registry,
    assets: &'a SceneAssets,
    aspect_ratio: Option<f32>,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(registry: &'a mut Registry, assets: &'a SceneAssets) -> Self {
        Self {
            registry,
            assets,
            aspect_ratio: None,
        }
    }

    /// Aspect ratio given to cameras created by this builder.
    pub fn with_aspect_ratio(mut self, aspect_ratio: f32) -> Self {
        self.aspect_ratio = Some(aspect_ratio);
        self
    }

    pub fn create_cube(&mut self, position: Vec3, scale: Vec3) -> Result<Entity, RegistryError> {
        let entity = self.registry.create_entity()?;
        self.registry
            .add_component(entity, Transform::from_position(position).with_scale(scale));
        self.registry.add_component(entity, self.assets.cube);
        self.registry
            .add_component(entity, self.assets.object_material());
        Ok(entity)
    }

    pub fn create_sphere(&mut self, position: Vec3, radius: f32) -> Result<Entity, RegistryError> {
        let entity = self.registry.create_entity()?;
        let scale = Vec3::splat(radius / SPHERE_RADIUS);
        self.registry
            .add_component(entity, Transform::from_position(position).with_scale(scale));
        self.registry.add_component(entity, self.assets.sphere);
        self.registry
            .add_component(entity, self.assets.object_material());
        Ok(entity)
    }

    pub fn create_ground_plane(&mut self, position: Vec3) -> Result<Entity, RegistryError> {
        let entity = self.registry.create_entity()?;
        self.registry
            .add_component(entity, Transform::from_position(position));
        self.registry.add_component(entity, self.assets.plane);
        self.registry
            .add_component(entity, self.assets.ground_material());
        Ok(entity)
    }

    pub fn create_camera(&mut self, position: Vec3, look: Vec3) -> Result<Entity, RegistryError> {
        let entity = self.registry.create_entity()?;
        let mut camera = Camera::looking(position, look);
        if let Some(aspect) = self.aspect_ratio {
            camera.aspect_ratio = aspect;
        }
        self.registry.add_component(entity, camera);
        Ok(entity)
    }

    pub fn create_directional_light(
        &mut self,
        direction: Vec3,
        color: Vec4,
    ) -> Result<Entity, RegistryError> {
        let entity = self.registry.create_entity()?;
        self.registry.add_component(
            entity,
            DirectionalLight {
                common: LightCommon::with_color(color),
                direction: direction.try_normalize().unwrap_or(Vec3::NEG_Y),
            },
        );
        Ok(entity)
    }

    pub fn create_point_light(
        &mut self,
        position: Vec3,
        color: Vec4,
        range: f32,
    ) -> Result<Entity, RegistryError> {
        let entity = self.registry.create_entity()?;
        self.registry.add_component(
            entity,
            PointLight {
                common: LightCommon::with_color(color),
                position,
                range,
            },
        );
        Ok(entity)
    }

    pub fn create_spot_light(
        &mut self,
        position: Vec3,
        direction: Vec3,
        color: Vec4,
        range: f32,
    ) -> Result<Entity, RegistryError> {
        let entity = self.registry.create_entity()?;
        self.registry.add_component(
            entity,
            SpotLight {
                common: LightCommon::with_color(color),
                position,
                direction: direction.try_normalize().unwrap_or(Vec3::Z),
                range,
                ..SpotLight::default()
            },
        );
        Ok(entity)
    }

    /// Create every camera, object and light in `description`, in that order.
    pub fn populate(&mut self, description: &SceneDescription) -> Result<Vec<Entity>, RegistryError> {
        let mut created = Vec::new();
        if let Some(CameraDescription {
            position,
            look_direction,
        }) = description.camera
        {
            created.push(self.create_camera(position, look_direction)?);
        }
        for object in &description.objects {
            let entity = match *object {
                ObjectDescription::Cube { position, scale } => self.create_cube(position, scale)?,
                ObjectDescription::Sphere { position, radius } => {
                    self.create_sphere(position, radius)?
                }
                ObjectDescription::Plane { position } => self.create_ground_plane(position)?,
            };
            created.push(entity);
        }
        for light in &description.lights {
            let entity = match *light {
                LightDescription::Directional { direction, color } => {
                    self.create_directional_light(direction, color)?
                }
                LightDescription::Point {
                    position,
                    color,
                    range,
                } => self.create_point_light(position, color, range)?,
                LightDescription::Spot {
                    position,
                    direction,
                    color,
                    range,
                } => self.create_spot_light(position, direction, color, range)?,
            };
            created.push(entity);
        }
        tracing::info!(
            name = %description.name,
            entities = created.len(),
            "scene populated"
        );
        Ok(created)
    }
}

/// Populate `registry` from `description` with default camera settings.
pub fn populate(
    registry: &mut Registry,
    assets: &SceneAssets,
    description: &SceneDescription,
) -> Result<Vec<Entity>, RegistryError> {
    SceneBuilder::new(registry, assets).populate(description)
}

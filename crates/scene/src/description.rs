use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("failed to read scene {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid scene description: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("{0}")]
    Registry(#[from] prism_ecs::RegistryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraDescription {
    pub position: Vec3,
    pub look_direction: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectDescription {
    Cube {
        position: Vec3,
        #[serde(default = "unit_scale")]
        scale: Vec3,
    },
    Sphere {
        position: Vec3,
        #[serde(default = "unit_radius")]
        radius: f32,
    },
    Plane { position: Vec3 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LightDescription {
    Directional {
        direction: Vec3,
        color: Vec4,
    },
    Point {
        position: Vec3,
        color: Vec4,
        range: f32,
    },
    Spot {
        position: Vec3,
        direction: Vec3,
        color: Vec4,
        range: f32,
    },
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

fn unit_radius() -> f32 {
    1.0
}

/// A scene as data: one optional camera, mesh objects and lights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub camera: Option<CameraDescription>,
    #[serde(default)]
    pub objects: Vec<ObjectDescription>,
    #[serde(default)]
    pub lights: Vec<LightDescription>,
}

fn default_name() -> String {
    "untitled".to_string()
}

impl SceneDescription {
    /// Two cubes, two spheres, a sun and two coloured point lights.
    pub fn demo() -> Self {
        Self {
            name: "demo".to_string(),
            camera: Some(CameraDescription {
                position: Vec3::new(-0.867, 2.304, -1.181),
                look_direction: Vec3::new(-0.298, -0.144, 0.944),
            }),
            objects: vec![
                ObjectDescription::Cube {
                    position: Vec3::new(-1.8, 2.3, 4.1),
                    scale: Vec3::ONE,
                },
                ObjectDescription::Cube {
                    position: Vec3::new(-3.0, 1.0, 3.9),
                    scale: Vec3::ONE,
                },
                ObjectDescription::Sphere {
                    position: Vec3::new(-0.7, 0.0, 5.45),
                    radius: 1.0,
                },
                ObjectDescription::Sphere {
                    position: Vec3::new(-4.5, 2.428, 4.29),
                    radius: 1.0,
                },
            ],
            lights: vec![
                LightDescription::Directional {
                    direction: Vec3::NEG_Y,
                    color: Vec4::new(0.7, 0.7, 0.7, 1.0),
                },
                LightDescription::Point {
                    position: Vec3::new(-2.9, 1.8, 2.5),
                    color: Vec4::new(1.0, 0.8, 0.6, 1.0),
                    range: 7.5,
                },
                LightDescription::Point {
                    position: Vec3::new(2.0, 1.5, 4.0),
                    color: Vec4::new(0.6, 0.8, 1.0, 1.0),
                    range: 5.0,
                },
            ],
        }
    }

    pub fn from_yaml(source: &str) -> Result<Self, SceneError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn to_yaml(&self) -> Result<String, SceneError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scene = Self::from_yaml(&source)?;
        tracing::debug!(path = %path.display(), name = %scene.name, "scene description loaded");
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"
name: small
camera:
  position: [0.0, 1.0, -4.0]
  look_direction: [0.0, 0.0, 1.0]
objects:
  - kind: cube
    position: [0.0, 0.5, 0.0]
  - kind: sphere
    position: [2.0, 1.0, 0.0]
    radius: 0.5
  - kind: plane
    position: [0.0, 0.0, 0.0]
lights:
  - kind: spot
    position: [0.0, 3.0, -3.0]
    direction: [0.0, -1.0, 0.0]
    color: [0.2, 0.2, 0.9, 1.0]
    range: 10.0
"#;

    #[test]
    fn parses_tagged_objects_and_defaults() {
        let scene = SceneDescription::from_yaml(SMALL).unwrap();
        assert_eq!(scene.name, "small");
        assert_eq!(scene.objects.len(), 3);
        assert_eq!(
            scene.objects[0],
            ObjectDescription::Cube {
                position: Vec3::new(0.0, 0.5, 0.0),
                scale: Vec3::ONE,
            }
        );
        assert!(matches!(
            scene.lights[0],
            LightDescription::Spot { range, .. } if range == 10.0
        ));
    }

    #[test]
    fn empty_document_fields_default() {
        let scene = SceneDescription::from_yaml("name: bare").unwrap();
        assert!(scene.camera.is_none());
        assert!(scene.objects.is_empty());
        assert!(scene.lights.is_empty());
    }

    #[test]
    fn demo_survives_yaml() {
        let demo = SceneDescription::demo();
        let yaml = demo.to_yaml().unwrap();
        assert!(yaml.contains("kind: point"));
        assert_eq!(SceneDescription::from_yaml(&yaml).unwrap(), demo);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = SceneDescription::from_yaml("objects:\n  - kind: torus\n    position: [0, 0, 0]\n")
            .unwrap_err();
        assert!(matches!(err, SceneError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SceneDescription::load("/nonexistent/scene.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/scene.yaml"));
    }
}

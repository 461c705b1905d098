use crate::raytracer::light::DirectionalLight;
use crate::raytracer::material::Material;
use crate::raytracer::ray::{HitData, Ray};
use crate::raytracer::shape::Shape;
use crate::raytracer::sky::Sky;
use glam::Vec3;

/// Read-only view of the scene used by every tracer.
pub trait SceneAccess: Send + Sync {
    fn hit(&self, ray: &Ray) -> Option<HitData>;
    fn hit_any(&self, ray: &Ray) -> bool;
    fn get_material(&self, material_id: u32) -> &Material;
    fn sample_sky(&self, direction: Vec3) -> Vec3;
    fn get_sun(&self) -> Option<&DirectionalLight>;
}

pub struct Scene<S: Sky> {
    pub shapes: Vec<Box<dyn Shape>>,
    pub materials: Vec<Material>,
    pub sky: S,
    pub sun: Option<DirectionalLight>,
    fallback_material: Material,
}

impl<S: Sky> Scene<S> {
    pub fn new(sky: S) -> Self {
        Scene {
            shapes: Vec::new(),
            materials: Vec::new(),
            sky,
            sun: None,
            fallback_material: Material::default(),
        }
    }

    pub fn with_sun(mut self, sun: DirectionalLight) -> Self {
        self.sun = Some(sun);
        self
    }

    /// Registers a material and returns its id.
    pub fn add_material(&mut self, material: Material) -> u32 {
        self.materials.push(material);
        (self.materials.len() - 1) as u32
    }

    pub fn add_shape(&mut self, shape: impl Shape + 'static) {
        self.shapes.push(Box::new(shape));
    }
}

impl<S: Sky> SceneAccess for Scene<S> {
    fn hit(&self, ray: &Ray) -> Option<HitData> {
        let mut closest: Option<HitData> = None;
        let mut probe = *ray;
        for shape in &self.shapes {
            if let Some(hit) = shape.hit(&probe) {
                probe.t_max = hit.t;
                closest = Some(hit);
            }
        }
        closest
    }

    fn hit_any(&self, ray: &Ray) -> bool {
        self.shapes.iter().any(|shape| shape.hit_any(ray))
    }

    fn get_material(&self, material_id: u32) -> &Material {
        self.materials
            .get(material_id as usize)
            .unwrap_or(&self.fallback_material)
    }

    fn sample_sky(&self, direction: Vec3) -> Vec3 {
        self.sky.sample(direction)
    }

    fn get_sun(&self) -> Option<&DirectionalLight> {
        self.sun.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raytracer::shape::Sphere;
    use crate::raytracer::sky::GradientSky;

    #[test]
    fn closest_hit_wins() {
        let mut scene = Scene::new(GradientSky::default());
        let near = scene.add_material(Material::diffuse(Vec3::X));
        let far = scene.add_material(Material::diffuse(Vec3::Y));
        scene.add_shape(Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0, far));
        scene.add_shape(Sphere::new(Vec3::new(0.0, 0.0, -4.0), 1.0, near));

        let hit = scene.hit(&Ray::new(Vec3::ZERO, Vec3::NEG_Z)).unwrap();
        assert_eq!(hit.material_id, near);
        assert_eq!(scene.get_material(hit.material_id).base_color, Vec3::X);
    }

    #[test]
    fn unknown_material_falls_back_to_default() {
        let scene = Scene::new(GradientSky::default());
        assert_eq!(scene.get_material(7).base_color, Material::default().base_color);
    }
}

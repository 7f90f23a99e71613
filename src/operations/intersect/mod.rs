mod ray_map;

pub use ray_map::{cast_ray, HitPolicy, IntersectOptions, IntersectRaysWithMap, RayHits};

//! Celestial body model
//!
//! Everything here is plain data and closed-form math with no ECS access, so the
//! whole orbital model can be exercised without an `App`. The render side in
//! `scene` and `visualization` reads the state these types produce.

pub mod behavior;
pub mod celestial;
pub mod error;
pub mod lod;
pub mod moons;
pub mod spec;
pub mod trail;

pub use behavior::{BodyBehavior, BodyFrame, SurfaceFeature, SurfaceFeatures};
pub use celestial::{BodyKinematics, BodyPlacement, CelestialBody};
pub use error::BodyError;
pub use lod::{LodLevel, LodSelector};
pub use moons::{MoonOrbitState, MoonSystem};
pub use spec::{MoonSpec, PlanetCatalog, PlanetSpec};
pub use trail::TrailRecorder;

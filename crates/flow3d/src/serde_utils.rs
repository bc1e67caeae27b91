//! Serde utilities for glam types.

use glam::DVec3;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serde proxy for DVec3
#[derive(Serialize, Deserialize)]
pub struct DVec3Def {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<DVec3> for DVec3Def {
    fn from(v: DVec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<DVec3Def> for DVec3 {
    fn from(def: DVec3Def) -> Self {
        DVec3::new(def.x, def.y, def.z)
    }
}

pub fn serialize_dvec3<S>(v: &DVec3, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    DVec3Def::from(*v).serialize(s)
}

pub fn deserialize_dvec3<'de, D>(d: D) -> Result<DVec3, D::Error>
where
    D: Deserializer<'de>,
{
    DVec3Def::deserialize(d).map(DVec3::from)
}

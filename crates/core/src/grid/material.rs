//! Material definitions and the ordered material registry
//!
//! Materials are numbered by registration order and never renumbered or
//! removed. The registry keeps an identifier lookup table alongside the
//! ordered list so "is this material defined?" is a single hash probe.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};

/// Provenance marker appended to the type tag of imported materials
pub const IMPORTED_TAG: &str = "imported";

/// Joins provenance markers onto an existing type tag
pub const TAG_SEPARATOR: &str = ", ";

/// Debye dispersion parameters for a frequency-dependent material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebyeDispersion {
    /// Difference between zero-frequency and infinite-frequency permittivity per pole
    pub delta_er: Vec<f64>,
    /// Relaxation time per pole (s)
    pub tau: Vec<f64>,
}

/// Electromagnetic material properties, before a numeric id is assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpec {
    /// Name / identifier string
    pub id: String,
    /// Free-text type tag (e.g. "debye", "imported")
    pub kind: String,
    /// Relative permittivity
    pub er: f64,
    /// Electric conductivity (S/m)
    pub se: f64,
    /// Relative permeability
    pub mr: f64,
    /// Magnetic loss (Ohms/m)
    pub sm: f64,
    /// Whether the material may take part in dielectric averaging
    pub averagable: bool,
    /// Optional Debye poles
    pub dispersion: Option<DebyeDispersion>,
}

impl MaterialSpec {
    /// Non-dispersive material with the given constitutive parameters
    pub fn simple(id: impl Into<String>, er: f64, se: f64, mr: f64, sm: f64) -> Self {
        Self {
            id: id.into(),
            kind: String::new(),
            er,
            se,
            mr,
            sm,
            averagable: true,
            dispersion: None,
        }
    }

    /// Relaxation times of the dispersive poles (empty when non-dispersive)
    pub fn tau(&self) -> &[f64] {
        match &self.dispersion {
            Some(d) => &d.tau,
            None => &[],
        }
    }
}

/// A registered material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    num_id: u32,
    spec: MaterialSpec,
}

impl Material {
    /// Numeric id, equal to the registration index
    pub fn num_id(&self) -> u32 {
        self.num_id
    }

    /// Identifier string
    pub fn id(&self) -> &str {
        &self.spec.id
    }

    /// Type tag
    pub fn kind(&self) -> &str {
        &self.spec.kind
    }

    /// Relaxation times (s); empty for non-dispersive materials
    pub fn tau(&self) -> &[f64] {
        self.spec.tau()
    }

    /// Full property set
    pub fn spec(&self) -> &MaterialSpec {
        &self.spec
    }

    /// Append a provenance marker to the type tag, after [`TAG_SEPARATOR`]
    /// unless the tag is empty
    pub(crate) fn tag(&mut self, marker: &str) {
        if self.spec.kind.is_empty() {
            self.spec.kind = marker.to_string();
        } else {
            self.spec.kind = format!("{}{TAG_SEPARATOR}{marker}", self.spec.kind);
        }
    }
}

/// Ordered material list with identifier lookup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialRegistry {
    materials: Vec<Material>,
    by_id: FxHashMap<String, usize>,
}

impl MaterialRegistry {
    /// Registry holding the two built-in materials `pec` (0) and `free_space` (1)
    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        let mut pec = MaterialSpec::simple("pec", 0.0, f64::INFINITY, 1.0, 0.0);
        pec.kind = "builtin".to_string();
        pec.averagable = false;
        let mut free_space = MaterialSpec::simple("free_space", 1.0, 0.0, 1.0, 0.0);
        free_space.kind = "builtin".to_string();
        // Builtin ids are distinct, registration cannot fail
        let _ = registry.register(pec);
        let _ = registry.register(free_space);
        registry
    }

    /// Number of registered materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// True when no material is registered
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Register a material, assigning the next numeric id
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DuplicateMaterial`] if the identifier is taken
    pub fn register(&mut self, spec: MaterialSpec) -> Result<u32> {
        if self.by_id.contains_key(&spec.id) {
            return Err(GeometryError::DuplicateMaterial(spec.id));
        }
        let num_id = self.materials.len() as u32;
        self.by_id.insert(spec.id.clone(), self.materials.len());
        self.materials.push(Material { num_id, spec });
        Ok(num_id)
    }

    /// Look up a material by identifier
    pub fn get(&self, id: &str) -> Option<&Material> {
        self.by_id.get(id).map(|&idx| &self.materials[idx])
    }

    /// Whether a material with this identifier exists
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Material by numeric id
    pub fn by_num_id(&self, num_id: u32) -> Option<&Material> {
        self.materials.get(num_id as usize)
    }

    /// Iterate in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        self.materials.iter_mut()
    }
}

/// Identifier of the material used for grass blades and roots
pub const GRASS_MATERIAL_ID: &str = "grass";

/// Two-pole Debye model of grass
///
/// er = 18.5087, Δε = [12.7174, 3.4122], τ = [1.0793e-11, 1.3147e-9] s.
/// Grass is never averaged with neighbouring materials.
pub fn grass_material() -> MaterialSpec {
    MaterialSpec {
        id: GRASS_MATERIAL_ID.to_string(),
        kind: "debye".to_string(),
        er: 18.5087,
        se: 0.0,
        mr: 1.0,
        sm: 0.0,
        averagable: false,
        dispersion: Some(DebyeDispersion {
            delta_er: vec![12.7174, 3.4122],
            tau: vec![1.0793e-11, 1.3147e-9],
        }),
    }
}

use super::contour::Contour;
use iced::Color;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Opaque handle grouping the graphics of one layer on a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerHandle(u64);

impl LayerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// RT ROI Interpreted Type (3006,00A4).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoiInterpretedType {
    External,
    Organ,
    Target,
    Ptv,
    Ctv,
    Gtv,
    Avoidance,
    Bolus,
    Marker,
    Other(String),
    #[default]
    Unspecified,
}

impl RoiInterpretedType {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "" => Self::Unspecified,
            "EXTERNAL" => Self::External,
            "ORGAN" => Self::Organ,
            "TARGET" => Self::Target,
            "PTV" => Self::Ptv,
            "CTV" => Self::Ctv,
            "GTV" => Self::Gtv,
            "AVOIDANCE" => Self::Avoidance,
            "BOLUS" => Self::Bolus,
            "MARKER" => Self::Marker,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::External)
    }
}

/// Identity of a structure within one RT case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructureKey {
    pub roi_number: i32,
    pub roi_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub roi_number: i32,
    pub roi_name: String,
    pub color: Color,
    pub thickness: f32,
    pub interpreted_type: RoiInterpretedType,
}

impl Structure {
    pub fn key(&self) -> StructureKey {
        StructureKey {
            roi_number: self.roi_number,
            roi_name: self.roi_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureLayer {
    pub structure: Structure,
    pub layer: LayerHandle,
}

impl fmt::Display for StructureLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.structure.roi_name)
    }
}

/// Slice position used to index isodose planes.
///
/// Ordered and compared with `f64::total_cmp`, so lookups are exact: no
/// rounding and no nearest-plane fallback.
#[derive(Debug, Clone, Copy)]
pub struct PlaneKey(pub f64);

impl PartialEq for PlaneKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PlaneKey {}

impl PartialOrd for PlaneKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PlaneKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Identity of an isodose level within one RT case.
///
/// Levels compare by value, with `-0.0` and `0.0` folded together.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IsoDoseKey {
    level_bits: u64,
    pub label: String,
}

impl IsoDoseKey {
    fn new(level: f64, label: &str) -> Self {
        let level = if level == 0.0 { 0.0 } else { level };
        Self {
            level_bits: level.to_bits(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IsoDose {
    /// Dose level in percent of the prescription.
    pub level: f64,
    pub label: String,
    pub color: Color,
    pub thickness: f32,
    pub planes: BTreeMap<PlaneKey, Vec<Contour>>,
}

impl IsoDose {
    pub fn new(level: f64, color: Color, thickness: f32) -> Self {
        Self {
            level,
            label: format!("{level} %"),
            color,
            thickness,
            planes: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> IsoDoseKey {
        IsoDoseKey::new(self.level, &self.label)
    }

    pub fn contours_at(&self, z: f64) -> Option<&[Contour]> {
        self.planes.get(&PlaneKey(z)).map(Vec::as_slice)
    }

    #[cfg(test)]
    pub fn add_contour(&mut self, z: f64, contour: Contour) {
        self.planes.entry(PlaneKey(z)).or_default().push(contour);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IsoDoseLayer {
    pub iso_dose: IsoDose,
    pub layer: LayerHandle,
}

impl fmt::Display for IsoDoseLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.iso_dose.label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dose {
    pub sop_instance_uid: String,
    pub iso_doses: IndexMap<i32, Arc<IsoDoseLayer>>,
}

impl Dose {
    pub fn iso_dose_layers(&self) -> Vec<Arc<IsoDoseLayer>> {
        self.iso_doses.values().cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub sop_instance_uid: String,
    pub label: String,
    pub doses: Vec<Dose>,
}

impl Plan {
    /// The first dose drives isodose rendering.
    pub fn first_dose(&self) -> Option<&Dose> {
        self.doses.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpreted_type_parsing_is_case_insensitive() {
        assert_eq!(RoiInterpretedType::parse("external"), RoiInterpretedType::External);
        assert_eq!(RoiInterpretedType::parse(" PTV "), RoiInterpretedType::Ptv);
        assert_eq!(RoiInterpretedType::parse(""), RoiInterpretedType::Unspecified);
        assert_eq!(
            RoiInterpretedType::parse("CAVITY"),
            RoiInterpretedType::Other("CAVITY".into())
        );
        assert!(RoiInterpretedType::parse("EXTERNAL").is_external());
        assert!(!RoiInterpretedType::parse("ORGAN").is_external());
    }

    #[test]
    fn plane_lookup_is_exact() {
        let mut iso = IsoDose::new(50.0, Color::WHITE, 1.0);
        iso.add_contour(12.0, Contour::point(glam::DVec3::new(0.0, 0.0, 12.0)));

        assert!(iso.contours_at(12.0).is_some());
        assert!(iso.contours_at(10.0).is_none());
        assert!(iso.contours_at(12.0 + 1e-9).is_none());
    }

    #[test]
    fn isodose_identity_uses_level_and_label() {
        let a = IsoDose::new(50.0, Color::WHITE, 1.0);
        let mut b = IsoDose::new(50.0, Color::BLACK, 2.0);
        assert_eq!(a.key(), b.key());

        b.label = "half".into();
        assert_ne!(a.key(), b.key());
        assert_ne!(a.key(), IsoDose::new(50.5, Color::WHITE, 1.0).key());
    }

    #[test]
    fn signed_zero_levels_share_identity() {
        let mut positive = IsoDose::new(0.0, Color::WHITE, 1.0);
        let mut negative = IsoDose::new(-0.0, Color::WHITE, 1.0);
        positive.label = "floor".into();
        negative.label = "floor".into();
        assert_eq!(positive.key(), negative.key());
    }
}

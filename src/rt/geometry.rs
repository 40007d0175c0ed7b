use glam::{DVec2, DVec3};

/// Spatial placement of one displayed slice in patient coordinates (mm).
#[derive(Debug, Clone, PartialEq)]
pub struct SliceGeometry {
    /// ImagePositionPatient: centre of the top left hand corner pixel.
    pub tlhc: DVec3,
    /// Direction of increasing column index.
    pub row_direction: DVec3,
    /// Direction of increasing row index.
    pub column_direction: DVec3,
    /// PixelSpacing as (between rows, between columns).
    pub pixel_spacing: (f64, f64),
    pub rows: u32,
    pub columns: u32,
    /// Max distance from the plane for a point to count as lying on it.
    pub plane_tolerance: f64,
}

impl SliceGeometry {
    /// Builds the geometry from the raw DICOM multi-values.
    ///
    /// Returns `None` if a vector has the wrong arity, the spacing is not
    /// positive or the orientation cosines are degenerate.
    pub fn from_dicom(
        position: &[f64],
        orientation: &[f64],
        spacing: &[f64],
        rows: u32,
        columns: u32,
        plane_tolerance: f64,
    ) -> Option<Self> {
        let [x, y, z] = *position else {
            return None;
        };
        let [rx, ry, rz, cx, cy, cz] = *orientation else {
            return None;
        };
        let [row_spacing, column_spacing] = *spacing else {
            return None;
        };
        if row_spacing <= 0.0 || column_spacing <= 0.0 {
            return None;
        }

        let row_direction = DVec3::new(rx, ry, rz).try_normalize()?;
        let column_direction = DVec3::new(cx, cy, cz).try_normalize()?;
        row_direction.cross(column_direction).try_normalize()?;

        Some(Self {
            tlhc: DVec3::new(x, y, z),
            row_direction,
            column_direction,
            pixel_spacing: (row_spacing, column_spacing),
            rows,
            columns,
            plane_tolerance,
        })
    }

    /// Slice position used as the isodose plane key.
    pub fn z(&self) -> f64 {
        self.tlhc.z
    }

    pub fn normal(&self) -> DVec3 {
        self.row_direction.cross(self.column_direction).normalize_or_zero()
    }

    pub fn distance_to_plane(&self, point: DVec3) -> f64 {
        (point - self.tlhc).dot(self.normal())
    }

    pub fn contains(&self, point: DVec3) -> bool {
        self.distance_to_plane(point).abs() <= self.plane_tolerance
    }

    /// Patient coordinates to continuous pixel coordinates (x = column, y = row).
    pub fn to_pixel(&self, point: DVec3) -> DVec2 {
        let offset = point - self.tlhc;
        let (row_spacing, column_spacing) = self.pixel_spacing;
        DVec2::new(
            offset.dot(self.row_direction) / column_spacing,
            offset.dot(self.column_direction) / row_spacing,
        )
    }
}

#[cfg(test)]
pub(crate) fn axial(z: f64) -> SliceGeometry {
    SliceGeometry::from_dicom(
        &[-250.0, -250.0, z],
        &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        &[1.0, 1.0],
        512,
        512,
        0.5,
    )
    .expect("axial geometry is valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn projects_axial_points_to_pixels() {
        let geometry = SliceGeometry::from_dicom(
            &[-100.0, -50.0, 10.0],
            &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[0.5, 2.0],
            256,
            256,
            0.5,
        )
        .unwrap();

        let pixel = geometry.to_pixel(DVec3::new(-90.0, -45.0, 10.0));
        assert_relative_eq!(pixel.x, 5.0);
        assert_relative_eq!(pixel.y, 10.0);
        assert_relative_eq!(geometry.z(), 10.0);
    }

    #[test]
    fn plane_membership_uses_tolerance() {
        let geometry = axial(10.0);
        assert!(geometry.contains(DVec3::new(0.0, 0.0, 10.4)));
        assert!(!geometry.contains(DVec3::new(0.0, 0.0, 10.6)));
        assert_relative_eq!(geometry.distance_to_plane(DVec3::new(3.0, 4.0, 12.0)), 2.0);
    }

    #[test]
    fn rejects_malformed_attributes() {
        let orientation = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        assert!(SliceGeometry::from_dicom(&[0.0, 0.0], &orientation, &[1.0, 1.0], 1, 1, 0.5).is_none());
        assert!(
            SliceGeometry::from_dicom(&[0.0; 3], &orientation, &[0.0, 1.0], 1, 1, 0.5).is_none()
        );
        assert!(SliceGeometry::from_dicom(
            &[0.0; 3],
            &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            &[1.0, 1.0],
            1,
            1,
            0.5
        )
        .is_none());
    }
}

/// Axis-aligned geographic bounding box, WGS84 degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        GeoBounds {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    pub fn world() -> Self {
        GeoBounds::new(-180.0, -90.0, 180.0, 90.0)
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

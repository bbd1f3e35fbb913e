use std::f64::consts::{LN_2, PI};

use serde::Serialize;

use crate::markers::Marker;

pub const DEFAULT_MAP_WIDTH_PX: u32 = 640;
pub const DEFAULT_MAP_HEIGHT_PX: u32 = 480;
pub const MAX_ZOOM: u32 = 21;
const TILE_SIZE_PX: f64 = 256.0;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    pub fn around(point: LatLng) -> Self {
        Self {
            min_lat: point.lat,
            max_lat: point.lat,
            min_lng: point.lng,
            max_lng: point.lng,
        }
    }

    /// Smallest bounds containing every point, or `None` for an empty set.
    pub fn from_points(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        let mut points = points.into_iter();
        let mut bounds = Self::around(points.next()?);
        for p in points {
            bounds.extend(p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, point: LatLng) {
        self.min_lat = self.min_lat.min(point.lat);
        self.max_lat = self.max_lat.max(point.lat);
        self.min_lng = self.min_lng.min(point.lng);
        self.max_lng = self.max_lng.max(point.lng);
    }

    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.min_lat + self.max_lat) / 2.0,
            lng: (self.min_lng + self.max_lng) / 2.0,
        }
    }
}

/// The map the markers are drawn on.
pub trait MapWidget {
    fn clear_markers(&mut self);
    fn place_marker(&mut self, marker: &Marker);
    fn fit_bounds(&mut self, bounds: Bounds);
    fn zoom(&self) -> u32;
    fn set_zoom(&mut self, zoom: u32);
}

/// In-process map that tracks placed markers and computes the zoom a
/// web-mercator tile map would pick when fitting bounds.
#[derive(Debug, Clone)]
pub struct ViewportMap {
    width_px: u32,
    height_px: u32,
    markers: Vec<Marker>,
    center: Option<LatLng>,
    zoom: u32,
}

impl Default for ViewportMap {
    fn default() -> Self {
        Self::new(DEFAULT_MAP_WIDTH_PX, DEFAULT_MAP_HEIGHT_PX)
    }
}

impl ViewportMap {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px: width_px.max(1),
            height_px: height_px.max(1),
            markers: Vec::new(),
            center: None,
            zoom: 0,
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn center(&self) -> Option<LatLng> {
        self.center
    }

    pub fn zoom_to_fit(&self, bounds: &Bounds) -> u32 {
        let lat_fraction = (mercator_lat(bounds.max_lat) - mercator_lat(bounds.min_lat)) / PI;
        let mut lng_diff = bounds.max_lng - bounds.min_lng;
        if lng_diff < 0.0 {
            lng_diff += 360.0;
        }
        let lng_fraction = lng_diff / 360.0;

        let lat_zoom = fit_zoom(f64::from(self.height_px), lat_fraction);
        let lng_zoom = fit_zoom(f64::from(self.width_px), lng_fraction);
        lat_zoom.min(lng_zoom)
    }
}

impl MapWidget for ViewportMap {
    fn clear_markers(&mut self) {
        self.markers.clear();
    }

    fn place_marker(&mut self, marker: &Marker) {
        self.markers.push(marker.clone());
    }

    fn fit_bounds(&mut self, bounds: Bounds) {
        self.center = Some(bounds.center());
        self.zoom = self.zoom_to_fit(&bounds);
    }

    fn zoom(&self) -> u32 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: u32) {
        self.zoom = zoom.min(MAX_ZOOM);
    }
}

fn mercator_lat(lat: f64) -> f64 {
    let sin = (lat * PI / 180.0).sin();
    let rad_x2 = ((1.0 + sin) / (1.0 - sin)).ln() / 2.0;
    rad_x2.clamp(-PI, PI) / 2.0
}

fn fit_zoom(map_px: f64, fraction: f64) -> u32 {
    if fraction <= 0.0 {
        return MAX_ZOOM;
    }
    let zoom = (map_px / TILE_SIZE_PX / fraction).ln() / LN_2;
    zoom.floor().clamp(0.0, f64::from(MAX_ZOOM)) as u32
}

use serde::Serialize;

use crate::map::{Bounds, LatLng, MapWidget};
use crate::places::PlaceTag;

/// Coordinates closer than this on both axes are the same place.
pub const COORDINATE_TOLERANCE: f64 = 1e-8;
/// View altitude covered by one zoom level.
pub const ALTITUDE_PER_ZOOM_LEVEL: f64 = 450.0;
const MAX_FITTED_ZOOM: u32 = 13;
const CLAMPED_ZOOM: u32 = 11;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Marker {
    pub position: LatLng,
    pub label: String,
    pub title: String,
    /// View altitude of the last place merged into this marker.
    pub view_altitude: f64,
}

impl Marker {
    fn is_at(&self, latitude: f64, longitude: f64) -> bool {
        similar(self.position.lat, latitude) && similar(self.position.lng, longitude)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Viewport {
    None,
    Center { position: LatLng, zoom: u32 },
    Bounds { bounds: Bounds, zoom: u32 },
}

#[derive(Debug, Clone, Default)]
pub struct MarkerManager {
    markers: Vec<Marker>,
}

impl MarkerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Drops every marker, then builds the set for `places` from scratch,
    /// draws it on `map` and fits the map around it.
    pub fn rebuild(&mut self, places: &[PlaceTag], map: &mut dyn MapWidget) -> Viewport {
        map.clear_markers();
        self.markers.clear();

        for place in places {
            self.add_place(place);
        }
        for marker in &self.markers {
            map.place_marker(marker);
        }
        tracing::debug!(
            places = places.len(),
            markers = self.markers.len(),
            "rebuilt markers"
        );

        self.fit(map)
    }

    fn add_place(&mut self, place: &PlaceTag) {
        let name = place.display_name();
        match self
            .markers
            .iter_mut()
            .find(|marker| marker.is_at(place.latitude, place.longitude))
        {
            None => self.markers.push(Marker {
                position: LatLng {
                    lat: place.latitude,
                    lng: place.longitude,
                },
                label: name.clone(),
                title: name,
                view_altitude: place.view_altitude,
            }),
            Some(marker) => {
                if !marker
                    .title
                    .to_lowercase()
                    .contains(&name.to_lowercase())
                {
                    marker.title = format!("{}, {name}", marker.title);
                    marker.label = format!("{}, {name}", marker.label);
                }
                marker.view_altitude = place.view_altitude;
            }
        }
    }

    fn fit(&self, map: &mut dyn MapWidget) -> Viewport {
        match self.markers.as_slice() {
            [] => Viewport::None,
            [marker] => {
                map.fit_bounds(Bounds::around(marker.position));
                map.set_zoom(zoom_for_altitude(marker.view_altitude));
                Viewport::Center {
                    position: marker.position,
                    zoom: map.zoom(),
                }
            }
            markers => {
                let Some(bounds) = Bounds::from_points(markers.iter().map(|m| m.position)) else {
                    return Viewport::None;
                };
                map.fit_bounds(bounds);
                if map.zoom() > MAX_FITTED_ZOOM {
                    map.set_zoom(CLAMPED_ZOOM);
                }
                Viewport::Bounds {
                    bounds,
                    zoom: map.zoom(),
                }
            }
        }
    }

    /// Centers the map on the marker for `place`, when the first marker whose
    /// title mentions the place sits at the place's coordinates.
    pub fn show_location(&self, place: &PlaceTag, map: &mut dyn MapWidget) -> Option<Viewport> {
        let marker = self
            .markers
            .iter()
            .find(|marker| marker.title.contains(&place.name))?;
        if !marker.is_at(place.latitude, place.longitude) {
            return None;
        }

        map.fit_bounds(Bounds::around(marker.position));
        map.set_zoom(zoom_for_altitude(place.view_altitude));
        Some(Viewport::Center {
            position: marker.position,
            zoom: map.zoom(),
        })
    }
}

pub fn zoom_for_altitude(altitude: f64) -> u32 {
    (altitude / ALTITUDE_PER_ZOOM_LEVEL).round().max(0.0) as u32
}

fn similar(a: f64, b: f64) -> bool {
    (a - b).abs() < COORDINATE_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::ViewportMap;

    fn place(name: &str, lat: f64, lng: f64, altitude: f64) -> PlaceTag {
        PlaceTag {
            geotag_id: "1".to_owned(),
            name: name.to_owned(),
            latitude: lat,
            longitude: lng,
            view_latitude: lat,
            view_longitude: lng,
            view_tilt: 0.0,
            view_roll: 0.0,
            view_altitude: altitude,
            view_heading: 0.0,
            flag: String::new(),
        }
    }

    #[test]
    fn single_marker_zoom_comes_from_altitude() {
        let mut manager = MarkerManager::new();
        let mut map = ViewportMap::default();
        let viewport = manager.rebuild(&[place("Jerusalem", 31.77, 35.23, 900.0)], &mut map);

        assert_eq!(
            viewport,
            Viewport::Center {
                position: LatLng {
                    lat: 31.77,
                    lng: 35.23
                },
                zoom: 2
            }
        );
        assert_eq!(map.zoom(), 2);
        assert_eq!(map.markers().len(), 1);
    }

    #[test]
    fn same_place_twice_is_idempotent() {
        let mut manager = MarkerManager::new();
        let mut map = ViewportMap::default();
        let jerusalem = place("Jerusalem", 31.77, 35.23, 900.0);
        manager.rebuild(&[jerusalem.clone(), jerusalem], &mut map);

        assert_eq!(manager.markers().len(), 1);
        assert_eq!(manager.markers()[0].title, "Jerusalem");
        assert_eq!(manager.markers()[0].label, "Jerusalem");
    }

    #[test]
    fn names_at_one_position_are_aggregated_case_insensitively() {
        let mut manager = MarkerManager::new();
        let mut map = ViewportMap::default();
        manager.rebuild(
            &[
                place("Jerusalem", 31.77, 35.23, 900.0),
                place("Salem", 31.77, 35.23, 900.0),
                place("Zion", 31.77, 35.23, 900.0),
                place("zion", 31.77, 35.23, 900.0),
            ],
            &mut map,
        );

        // "Salem" is already a substring of "Jerusalem".
        assert_eq!(manager.markers().len(), 1);
        assert_eq!(manager.markers()[0].title, "Jerusalem, Zion");
        assert_eq!(manager.markers()[0].label, "Jerusalem, Zion");
    }

    #[test]
    fn tolerance_decides_whether_coordinates_merge() {
        let mut manager = MarkerManager::new();
        let mut map = ViewportMap::default();
        manager.rebuild(
            &[
                place("A", 10.0, 20.0, 900.0),
                place("B", 10.0 + 9e-9, 20.0 + 9e-9, 900.0),
            ],
            &mut map,
        );
        assert_eq!(manager.markers().len(), 1);
        assert_eq!(manager.markers()[0].title, "A, B");

        manager.rebuild(
            &[place("A", 10.0, 20.0, 900.0), place("B", 10.0 + 2e-8, 20.0, 900.0)],
            &mut map,
        );
        assert_eq!(manager.markers().len(), 2);
    }

    #[test]
    fn single_marker_uses_altitude_of_last_merged_place() {
        let mut manager = MarkerManager::new();
        let mut map = ViewportMap::default();
        let viewport = manager.rebuild(
            &[
                place("Jerusalem", 31.77, 35.23, 900.0),
                place("Zion", 31.77, 35.23, 4500.0),
            ],
            &mut map,
        );
        assert!(matches!(viewport, Viewport::Center { zoom: 10, .. }));
    }

    #[test]
    fn close_markers_clamp_zoom_to_eleven() {
        let mut manager = MarkerManager::new();
        let mut map = ViewportMap::default();
        let viewport = manager.rebuild(
            &[
                place("Temple", 31.7780, 35.2354, 900.0),
                place("Gihon", 31.7732, 35.2366, 900.0),
            ],
            &mut map,
        );
        assert!(matches!(viewport, Viewport::Bounds { zoom: 11, .. }));
    }

    #[test]
    fn distant_markers_keep_fitted_zoom() {
        let mut manager = MarkerManager::new();
        let mut map = ViewportMap::default();
        let viewport = manager.rebuild(
            &[
                place("Jerusalem", 31.77, 35.23, 900.0),
                place("Babylon", 32.54, 44.42, 900.0),
            ],
            &mut map,
        );
        let Viewport::Bounds { bounds, zoom } = viewport else {
            panic!("expected bounds viewport, got {viewport:?}");
        };
        assert!(zoom <= MAX_FITTED_ZOOM);
        assert_eq!(bounds.min_lng, 35.23);
        assert_eq!(bounds.max_lng, 44.42);
    }

    #[test]
    fn rebuild_discards_previous_markers() {
        let mut manager = MarkerManager::new();
        let mut map = ViewportMap::default();
        manager.rebuild(&[place("Jerusalem", 31.77, 35.23, 900.0)], &mut map);
        let viewport = manager.rebuild(&[], &mut map);

        assert_eq!(viewport, Viewport::None);
        assert!(manager.markers().is_empty());
        assert!(map.markers().is_empty());
    }

    #[test]
    fn show_location_centers_on_matching_marker() {
        let mut manager = MarkerManager::new();
        let mut map = ViewportMap::default();
        let jerusalem = place("Jerusalem", 31.77, 35.23, 900.0);
        manager.rebuild(
            &[jerusalem.clone(), place("Babylon", 32.54, 44.42, 900.0)],
            &mut map,
        );

        let zoomed = PlaceTag {
            view_altitude: 2700.0,
            ..jerusalem
        };
        let viewport = manager.show_location(&zoomed, &mut map).unwrap();
        assert!(matches!(viewport, Viewport::Center { zoom: 6, .. }));

        let elsewhere = place("Jerusalem", 0.0, 0.0, 900.0);
        assert!(manager.show_location(&elsewhere, &mut map).is_none());
        assert!(
            manager
                .show_location(&place("Nineveh", 36.36, 43.15, 900.0), &mut map)
                .is_none()
        );
    }
}

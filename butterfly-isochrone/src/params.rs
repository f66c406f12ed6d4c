//! Time/distance conversion and threshold validation.
//!
//! Grounded on `OsmGtIsochrone._prepare_isochrone_values_from_times` /
//! `_prepare_isochrone_values_from_distance`: a trip speed in km/h converts
//! to m/s by dividing by 3.6, then times and distances are two views of the
//! same threshold list, sorted by distance descending (the "nesting dolls"
//! order ring differencing consumes).

use butterfly_common::Error;

const KM_HOUR_TO_M_SEC: f64 = 3.6;
const MIN_TO_SEC: f64 = 60.0;
const MIN_TIME_MINUTES: f64 = 1.0;
const MIN_DISTANCE_METERS: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub time_minutes: f64,
    pub distance_meters: f64,
}

/// Builds thresholds from a list of times (minutes), sorted by distance
/// descending.
pub fn thresholds_from_times(times: &[f64], speed_kmh: f64) -> Result<Vec<Threshold>, Error> {
    let speed_mps = speed_kmh / KM_HOUR_TO_M_SEC;
    let mut thresholds = Vec::with_capacity(times.len());
    for &t in times {
        if t < MIN_TIME_MINUTES {
            return Err(Error::IsochroneLimit(format!(
                "time {t} minutes is below the minimum of {MIN_TIME_MINUTES}"
            )));
        }
        let distance_meters = (t * MIN_TO_SEC * speed_mps).ceil();
        thresholds.push(Threshold {
            time_minutes: t,
            distance_meters,
        });
    }
    sort_descending(thresholds)
}

/// Builds thresholds from a list of distances (meters), sorted descending.
pub fn thresholds_from_distances(distances: &[f64], speed_kmh: f64) -> Result<Vec<Threshold>, Error> {
    let speed_mps = speed_kmh / KM_HOUR_TO_M_SEC;
    let mut thresholds = Vec::with_capacity(distances.len());
    for &d in distances {
        if d < MIN_DISTANCE_METERS {
            return Err(Error::IsochroneLimit(format!(
                "distance {d} meters is below the minimum of {MIN_DISTANCE_METERS}"
            )));
        }
        let time_minutes = d / speed_mps / MIN_TO_SEC;
        thresholds.push(Threshold {
            time_minutes,
            distance_meters: d,
        });
    }
    sort_descending(thresholds)
}

fn sort_descending(mut thresholds: Vec<Threshold>) -> Result<Vec<Threshold>, Error> {
    thresholds.sort_by(|a, b| {
        b.distance_meters
            .partial_cmp(&a.distance_meters)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn times_convert_to_ceiling_distance() {
        let thresholds = thresholds_from_times(&[10.0], 12.0).unwrap();
        // 10 min * 60 s/min * (12/3.6) m/s = 2000 m
        assert_eq!(thresholds[0].distance_meters, 2000.0);
    }

    #[test]
    fn distances_convert_to_time() {
        let thresholds = thresholds_from_distances(&[2000.0], 12.0).unwrap();
        assert!((thresholds[0].time_minutes - 10.0).abs() < 1e-9);
    }

    #[test]
    fn sorted_descending_by_distance() {
        let thresholds = thresholds_from_times(&[5.0, 15.0, 10.0], 12.0).unwrap();
        let distances: Vec<f64> = thresholds.iter().map(|t| t.distance_meters).collect();
        assert_eq!(distances, vec![distances[0], distances[1], distances[2]]);
        assert!(distances[0] >= distances[1] && distances[1] >= distances[2]);
    }

    #[test]
    fn time_below_minimum_is_rejected() {
        assert!(thresholds_from_times(&[0.5], 12.0).is_err());
    }

    #[test]
    fn distance_below_minimum_is_rejected() {
        assert!(thresholds_from_distances(&[10.0], 12.0).is_err());
    }
}

//! Concave hull: union of Delaunay triangles whose circumradius is below
//! `1 / alpha`, falling back to the convex hull under four points.

use butterfly_common::Coordinate;
use geo::{BooleanOps, ConvexHull, MultiPoint, Point, Polygon};
use spade::{DelaunayTriangulation, Point2, Triangulation};

const MIN_POINTS_FOR_CONCAVE_HULL: usize = 4;

/// Returns the concave hull of `points` at the given `alpha`. When fewer
/// than four points are supplied, the convex hull is returned instead.
pub fn concave_hull(points: &[Coordinate], alpha: f64) -> Polygon<f64> {
    if points.len() < MIN_POINTS_FOR_CONCAVE_HULL {
        return convex_hull(points);
    }

    let mut triangulation: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
    for p in points {
        let _ = triangulation.insert(Point2::new(p.lon, p.lat));
    }

    let max_circumradius = 1.0 / alpha;
    let mut kept: Vec<Polygon<f64>> = Vec::new();
    for face in triangulation.inner_faces() {
        let verts = face.vertices();
        let a = verts[0].position();
        let b = verts[1].position();
        let c = verts[2].position();
        if circumradius(a, b, c) < max_circumradius {
            kept.push(triangle_polygon(a, b, c));
        }
    }

    if kept.is_empty() {
        return convex_hull(points);
    }

    kept.into_iter()
        .reduce(|acc, p| acc.union(&p).into_iter().next().unwrap_or(acc))
        .unwrap_or_else(|| convex_hull(points))
}

fn convex_hull(points: &[Coordinate]) -> Polygon<f64> {
    let mp: MultiPoint<f64> = points.iter().map(|c| Point::new(c.lon, c.lat)).collect();
    mp.convex_hull()
}

fn triangle_polygon(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> Polygon<f64> {
    Polygon::new(
        vec![(a.x, a.y), (b.x, b.y), (c.x, c.y), (a.x, a.y)].into(),
        vec![],
    )
}

fn circumradius(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    let ab = dist(a, b);
    let bc = dist(b, c);
    let ca = dist(c, a);
    let area = triangle_area(a, b, c);
    if area == 0.0 {
        return f64::INFINITY;
    }
    (ab * bc * ca) / (4.0 * area)
}

fn dist(a: Point2<f64>, b: Point2<f64>) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

fn triangle_area(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_convex_hull_under_four_points() {
        let points = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(0.0, 1.0),
        ];
        let hull = concave_hull(&points, 2.0);
        assert!(hull.exterior().points().count() >= 3);
    }

    #[test]
    fn concave_hull_covers_a_square() {
        let points = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(0.5, 0.5),
        ];
        let hull = concave_hull(&points, 1.0);
        assert!(hull.exterior().points().count() >= 3);
    }
}

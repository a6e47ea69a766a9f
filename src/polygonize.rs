//! Raster to polygon conversion.
//!
//! Foreground cells (value not equal to nodata) are grouped into 4-connected
//! regions. Region outlines are traced along cell edges with foreground kept
//! on the right-hand side, so exteriors and holes fall out of the same walk
//! and are told apart by the sign of their area. A walk that passes through
//! the same vertex twice (regions or holes meeting at a corner) is cut there
//! into simple rings.

use crate::raster_io::RasterIO;
use crate::types::Mosaic;
use geo::orient::{Direction, Orient};
use geo::Contains;
use geo_types::{Coord, LineString, Polygon};
use ndarray::Array2;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

type Vertex = (i64, i64);
type Step = (i64, i64);
type Edge = (Vertex, Step);

const EAST: Step = (1, 0);
const SOUTH: Step = (0, 1);
const WEST: Step = (-1, 0);
const NORTH: Step = (0, -1);

pub fn foreground_mask(mosaic: &Mosaic) -> Array2<bool> {
    mosaic
        .data
        .mapv(|v| !v.is_nan() && v != mosaic.no_data_value)
}

/// Labels 4-connected foreground regions `1..=n` in row-major discovery order.
pub fn label_regions(mask: &Array2<bool>) -> (Array2<usize>, usize) {
    let (height, width) = mask.dim();
    let mut labels = Array2::<usize>::zeros((height, width));
    let mut count = 0;
    let mut queue = VecDeque::new();

    for row in 0..height {
        for col in 0..width {
            if !mask[[row, col]] || labels[[row, col]] != 0 {
                continue;
            }
            count += 1;
            labels[[row, col]] = count;
            queue.push_back((row, col));

            while let Some((r, c)) = queue.pop_front() {
                let mut visit = |nr: usize, nc: usize| {
                    if mask[[nr, nc]] && labels[[nr, nc]] == 0 {
                        labels[[nr, nc]] = count;
                        queue.push_back((nr, nc));
                    }
                };
                if r > 0 {
                    visit(r - 1, c);
                }
                if r + 1 < height {
                    visit(r + 1, c);
                }
                if c > 0 {
                    visit(r, c - 1);
                }
                if c + 1 < width {
                    visit(r, c + 1);
                }
            }
        }
    }

    (labels, count)
}

fn boundary_edges(labels: &Array2<usize>) -> HashMap<Edge, usize> {
    let (height, width) = labels.dim();
    let is_fg = |r: i64, c: i64| {
        r >= 0
            && c >= 0
            && (r as usize) < height
            && (c as usize) < width
            && labels[[r as usize, c as usize]] != 0
    };

    let mut edges = HashMap::new();
    for ((row, col), &label) in labels.indexed_iter() {
        if label == 0 {
            continue;
        }
        let (r, c) = (row as i64, col as i64);
        if !is_fg(r - 1, c) {
            edges.insert(((c, r), EAST), label);
        }
        if !is_fg(r, c + 1) {
            edges.insert(((c + 1, r), SOUTH), label);
        }
        if !is_fg(r + 1, c) {
            edges.insert(((c + 1, r + 1), WEST), label);
        }
        if !is_fg(r, c - 1) {
            edges.insert(((c, r + 1), NORTH), label);
        }
    }
    edges
}

fn turn_right((dx, dy): Step) -> Step {
    (-dy, dx)
}

fn turn_left((dx, dy): Step) -> Step {
    (dy, -dx)
}

/// Closed lattice walks, one vertex per unit step, tagged with their region label.
fn trace_rings(edges: &HashMap<Edge, usize>) -> Vec<(usize, Vec<Vertex>)> {
    let mut remaining: BTreeSet<Edge> = edges.keys().copied().collect();
    let mut rings = Vec::new();

    while let Some(start) = remaining.pop_first() {
        let label = edges[&start];
        let mut vertices = vec![start.0];
        let (mut vertex, mut dir) = start;

        loop {
            vertex = (vertex.0 + dir.0, vertex.1 + dir.1);
            // Right turns first keeps diagonal neighbours in separate rings.
            let next = [turn_right(dir), dir, turn_left(dir)]
                .into_iter()
                .map(|d| (vertex, d))
                .find(|e| edges.contains_key(e));
            match next {
                Some(edge) if edge != start => {
                    remaining.remove(&edge);
                    vertices.push(edge.0);
                    dir = edge.1;
                }
                _ => break,
            }
        }
        rings.push((label, vertices));
    }
    rings
}

/// Splits a walk at every vertex it passes twice, leaving simple rings.
///
/// A walk touches itself where a hole meets the outline, or another hole,
/// at a single corner.
fn split_ring(walk: Vec<Vertex>) -> Vec<Vec<Vertex>> {
    let mut loops = Vec::new();
    let mut stack: Vec<Vertex> = Vec::with_capacity(walk.len());
    let mut seen: HashMap<Vertex, usize> = HashMap::new();

    for v in walk {
        if let Some(&pos) = seen.get(&v) {
            let sub = stack.split_off(pos);
            for u in &sub {
                seen.remove(u);
            }
            loops.push(sub);
        }
        seen.insert(v, stack.len());
        stack.push(v);
    }
    if !stack.is_empty() {
        loops.push(stack);
    }
    loops
}

/// Drops vertices lying on a straight run.
fn corners(ring: &[Vertex]) -> Vec<Vertex> {
    let n = ring.len();
    (0..n)
        .filter(|&i| {
            let (p, c, q) = (ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]);
            (c.0 - p.0, c.1 - p.1) != (q.0 - c.0, q.1 - c.1)
        })
        .map(|i| ring[i])
        .collect()
}

/// Twice the signed area in pixel space; positive for exteriors.
fn signed_area2(ring: &[Vertex]) -> i64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (x0, y0) = ring[i];
            let (x1, y1) = ring[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum()
}

fn to_world(ring: &[Vertex], transform: &[f64; 6]) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = ring
        .iter()
        .map(|&(x, y)| {
            let (wx, wy) = RasterIO::pixel_to_world(x as f64, y as f64, transform);
            Coord { x: wx, y: wy }
        })
        .collect();
    if let Some(&first) = coords.first() {
        coords.push(first);
    }
    LineString::new(coords)
}

/// Attaches each hole to the exterior that contains it.
fn assemble(exteriors: Vec<LineString<f64>>, holes: Vec<LineString<f64>>) -> Vec<Polygon<f64>> {
    if exteriors.len() == 1 {
        let exterior = exteriors.into_iter().next().unwrap_or_else(|| LineString::new(vec![]));
        return vec![Polygon::new(exterior, holes)];
    }

    let shells: Vec<Polygon<f64>> = exteriors
        .iter()
        .map(|e| Polygon::new(e.clone(), vec![]))
        .collect();
    let mut interiors: Vec<Vec<LineString<f64>>> = vec![Vec::new(); shells.len()];
    for hole in holes {
        let hole_poly = Polygon::new(hole.clone(), vec![]);
        let owner = shells
            .iter()
            .position(|shell| shell.contains(&hole_poly))
            .unwrap_or(0);
        if let Some(slot) = interiors.get_mut(owner) {
            slot.push(hole);
        }
    }

    exteriors
        .into_iter()
        .zip(interiors)
        .map(|(exterior, holes)| Polygon::new(exterior, holes))
        .collect()
}

/// Polygons for the 4-connected foreground regions, in world coordinates.
///
/// Every ring is simple; holes may touch their exterior or each other at a
/// single corner.
pub fn polygonize(mosaic: &Mosaic) -> Vec<Polygon<f64>> {
    let mask = foreground_mask(mosaic);
    let (labels, count) = label_regions(&mask);
    if count == 0 {
        return Vec::new();
    }

    let mut exteriors: BTreeMap<usize, Vec<LineString<f64>>> = BTreeMap::new();
    let mut holes: HashMap<usize, Vec<LineString<f64>>> = HashMap::new();
    for (label, walk) in trace_rings(&boundary_edges(&labels)) {
        for ring in split_ring(walk) {
            let ring = corners(&ring);
            let area2 = signed_area2(&ring);
            if area2 == 0 {
                continue;
            }
            let line = to_world(&ring, &mosaic.transform);
            if area2 > 0 {
                exteriors.entry(label).or_default().push(line);
            } else {
                holes.entry(label).or_default().push(line);
            }
        }
    }

    exteriors
        .into_iter()
        .flat_map(|(label, shells)| assemble(shells, holes.remove(&label).unwrap_or_default()))
        .map(|p| p.orient(Direction::Default))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;
    use ndarray::array;

    fn mosaic(data: Array2<f64>) -> Mosaic {
        Mosaic {
            data,
            transform: [0.0, 1.0, 0.0, 0.0, 0.0, -1.0],
            no_data_value: 0.0,
        }
    }

    #[test]
    fn single_cell_becomes_unit_square() {
        let polys = polygonize(&mosaic(array![[0.0, 0.0], [0.0, 1.0]]));
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].exterior().0.len(), 5);
        assert_eq!(polys[0].unsigned_area(), 1.0);
        assert_eq!(polys[0].signed_area(), 1.0);
    }

    #[test]
    fn diagonal_cells_stay_separate() {
        let polys = polygonize(&mosaic(array![[1.0, 0.0], [0.0, 1.0]]));
        assert_eq!(polys.len(), 2);
        assert!(polys.iter().all(|p| p.unsigned_area() == 1.0));
    }

    #[test]
    fn ring_of_cells_has_hole() {
        let polys = polygonize(&mosaic(array![
            [1.0, 1.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
        ]));
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].interiors().len(), 1);
        assert_eq!(polys[0].unsigned_area(), 8.0);
        // rectangle outline reduced to its four corners
        assert_eq!(polys[0].exterior().0.len(), 5);
    }

    #[test]
    fn distinct_values_share_one_region() {
        let polys = polygonize(&mosaic(array![[1.0, 2.0, 3.0], [0.0, 0.0, 7.0]]));
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].unsigned_area(), 4.0);
    }

    #[test]
    fn nodata_and_nan_are_background() {
        let m = Mosaic {
            data: array![[f64::NAN, -9999.0], [-9999.0, -9999.0]],
            transform: [0.0, 1.0, 0.0, 0.0, 0.0, -1.0],
            no_data_value: -9999.0,
        };
        assert!(polygonize(&m).is_empty());
    }

    fn has_repeated_vertex(ring: &LineString<f64>) -> bool {
        let open = &ring.0[..ring.0.len() - 1];
        open.iter()
            .enumerate()
            .any(|(i, a)| open[i + 1..].iter().any(|b| a == b))
    }

    #[test]
    fn hole_touching_outline_at_corner_is_split_off() {
        let polys = polygonize(&mosaic(array![
            [1.0, 1.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 0.0],
        ]));
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].interiors().len(), 1);
        assert!(!has_repeated_vertex(polys[0].exterior()));
        assert!(polys[0].interiors().iter().all(|r| !has_repeated_vertex(r)));
        assert_eq!(polys[0].unsigned_area(), 7.0);
    }

    #[test]
    fn diagonal_holes_become_separate_simple_rings() {
        let polys = polygonize(&mosaic(array![
            [1.0, 1.0, 1.0, 1.0],
            [1.0, 0.0, 1.0, 1.0],
            [1.0, 1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0, 1.0],
        ]));
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].interiors().len(), 2);
        assert!(!has_repeated_vertex(polys[0].exterior()));
        assert!(polys[0].interiors().iter().all(|r| !has_repeated_vertex(r)));
        assert!(polys[0].interiors().iter().all(|r| r.0.len() == 5));
        assert_eq!(polys[0].unsigned_area(), 14.0);
    }

    #[test]
    fn split_ring_cuts_at_repeated_vertex() {
        let walk = vec![(0, 0), (1, 0), (1, 1), (2, 1), (2, 2), (1, 2), (1, 1), (0, 1)];
        let loops = split_ring(walk);
        assert_eq!(loops.len(), 2);
        assert_eq!(loops[0], vec![(1, 1), (2, 1), (2, 2), (1, 2)]);
        assert_eq!(loops[1], vec![(0, 0), (1, 0), (1, 1), (0, 1)]);
    }

    #[test]
    fn labels_follow_scan_order() {
        let mask = array![[true, false, true], [false, false, true]];
        let (labels, count) = label_regions(&mask);
        assert_eq!(count, 2);
        assert_eq!(labels, array![[1, 0, 2], [0, 0, 2]]);
    }

    #[test]
    fn world_coordinates_follow_transform() {
        let m = Mosaic {
            data: array![[1.0]],
            transform: [10.0, 0.5, 0.0, 50.0, 0.0, -0.5],
            no_data_value: 0.0,
        };
        let polys = polygonize(&m);
        let xs: Vec<f64> = polys[0].exterior().coords().map(|c| c.x).collect();
        let ys: Vec<f64> = polys[0].exterior().coords().map(|c| c.y).collect();
        assert!(xs.iter().all(|&x| x == 10.0 || x == 10.5));
        assert!(ys.iter().all(|&y| y == 50.0 || y == 49.5));
        assert_eq!(polys[0].unsigned_area(), 0.25);
    }
}

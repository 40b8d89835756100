//! Integration tests for octree construction through the public API

use std::collections::HashSet;
use std::sync::Arc;

use bhtree::generation::{SharedRng, plummer_bodies};
use bhtree::prelude::*;

fn bits(position: Vector) -> [u64; 3] {
    position.to_array().map(f64::to_bits)
}

/// Walk the tree through `root`/`node` the way a force pass would, checking
/// that every particle lies inside the cube its path describes.
fn check_geometry(tree: &Octree, node: NodeRef, cube: Aabb3d, visited: &mut usize) {
    match tree.node(node) {
        SpatialNode::Particle(particle) => {
            assert!(cube.contains(particle.position), "{} outside {cube:?}", particle.position);
            *visited += 1;
        }
        SpatialNode::Cell(cell) => {
            for (octant, child) in cell.children() {
                check_geometry(tree, child, cube.octant(octant), visited);
            }
        }
    }
}

#[test]
fn test_incremental_growth_keeps_every_body() {
    let bodies = plummer_bodies(3_000, &mut SharedRng::from_seed(2024));
    let mut tree = Octree::new(Vector::splat(-0.1), 0.2);

    for body in &bodies {
        tree.expand_to_fit(body).unwrap();
        assert!(tree.in_bounds(body.position));
        tree.insert(*body).unwrap();
    }

    let expected: HashSet<_> = bodies.iter().map(|b| bits(b.position)).collect();
    let found: Vec<_> = tree.iter_particles().map(|p| bits(p.position)).collect();
    assert_eq!(found.len(), bodies.len());
    assert_eq!(found.into_iter().collect::<HashSet<_>>(), expected);
}

#[test]
fn test_leaves_lie_inside_their_cells() {
    let bodies = plummer_bodies(2_000, &mut SharedRng::from_seed(7));
    let mut tree = Octree::new(Vector::ZERO, 1.0);
    tree.build(bodies).unwrap();

    let mut visited = 0;
    let root = tree.root_ref().unwrap();
    check_geometry(&tree, root, tree.bounds(), &mut visited);

    assert_eq!(visited, 2_000);
}

#[test]
fn test_rebuilding_reuses_grown_cube() {
    let bodies = plummer_bodies(500, &mut SharedRng::from_seed(99));
    let mut tree = Octree::from_config(&BhTreeConfig::default().tree);

    tree.build(bodies.clone()).unwrap();
    let (origin, edge) = (tree.origin(), tree.edge());
    tree.build(bodies).unwrap();

    assert_eq!(tree.origin(), origin);
    assert_eq!(tree.edge(), edge);
    assert_eq!(tree.len(), 500);
}

#[test]
fn test_duplicate_is_returned_to_caller() {
    let mut tree = Octree::new(Vector::ZERO, 1.0);
    let original = Particle {
        potential: 1.5,
        ..Particle::at(Vector::splat(0.25))
    };
    tree.insert(original).unwrap();

    let Err(OctreeError::DuplicatePosition { particle, .. }) = tree.insert(original) else {
        panic!("duplicate should be rejected");
    };

    assert_eq!(*particle, original);
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_identity_table_tracks_tree_nodes_by_handle() {
    let mut table = IdentityTable::new(64);
    let a = Arc::new(Particle::at(Vector::X));
    let b = Arc::new(Particle::at(Vector::X));

    table.put(a.clone(), "a");
    table.put(b.clone(), "b");

    assert_eq!(table.get(&a), Some(&"a"));
    assert_eq!(table.get(&b), Some(&"b"));
    assert_eq!(table.remove(&a), Some("a"));
    assert_eq!(table.get(&b), Some(&"b"));
}

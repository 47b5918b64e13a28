//! End-to-end behavior of the loose octree through its public API

use approx::assert_relative_eq;
use loose_octree::foundation::logging;
use loose_octree::prelude::*;
use nalgebra::{Isometry3, Perspective3, Point3};
use slotmap::{DefaultKey, Key};

fn unit_box(x: f32, y: f32, z: f32) -> AABB {
    AABB::cube(Vec3::new(x, y, z), 1.0)
}

fn lattice(count: u32, spacing: f32) -> Vec<(u32, AABB)> {
    (0..count)
        .map(|i| {
            let x = (i % 4) as f32 * spacing;
            let y = ((i / 4) % 4) as f32 * spacing;
            let z = (i / 16) as f32 * spacing;
            (i, AABB::cube(Vec3::new(x, y, z), 0.8))
        })
        .collect()
}

#[test]
fn concrete_grow_query_remove() {
    logging::init_for_tests();

    let mut tree = LooseOctree::new(10.0, Vec3::zeros(), 0.5, 1.0);
    let a = unit_box(2.0, 2.0, 2.0);
    let b = unit_box(100.0, 0.0, 0.0);

    tree.insert('A' as u32, a).unwrap();
    assert_eq!(tree.count(), 1);
    assert!(tree.is_colliding(&a));

    let before = tree.max_bounds();
    tree.insert('B' as u32, b).unwrap();
    assert_eq!(tree.count(), 2);
    assert!(tree.root().base_length() > 10.0);
    assert!(tree.max_bounds().contains_aabb(&before));

    let around_b = AABB::cube(Vec3::new(100.0, 0.0, 0.0), 2.0);
    let around_a = AABB::cube(Vec3::new(2.0, 2.0, 2.0), 2.0);
    assert_eq!(tree.get_colliding(&around_b), vec!['B' as u32]);
    assert_eq!(tree.get_colliding(&around_a), vec!['A' as u32]);

    assert!(tree.remove('A' as u32));
    assert_eq!(tree.count(), 1);
    assert!(tree.get_colliding(&around_a).is_empty());
    assert_eq!(tree.get_colliding(&around_b), vec!['B' as u32]);
}

#[test]
fn insert_then_find_every_entry() {
    logging::init_for_tests();

    let entries = lattice(48, 2.5);
    let mut tree = LooseOctree::new(8.0, Vec3::new(4.0, 4.0, 2.0), 1.0, 1.25);
    for (handle, bounds) in &entries {
        tree.insert(*handle, *bounds).unwrap();
    }

    assert_eq!(tree.count(), entries.len());
    for (handle, bounds) in &entries {
        assert!(tree.is_colliding(bounds));
        assert!(tree.get_colliding(bounds).contains(handle), "missing {}", handle);
    }
}

#[test]
fn remove_is_exact() {
    logging::init_for_tests();

    let entries = lattice(24, 3.0);
    let mut tree = LooseOctree::new(16.0, Vec3::zeros(), 1.0, 1.25);
    for (handle, bounds) in &entries {
        tree.insert(*handle, *bounds).unwrap();
    }

    for (removed, (handle, bounds)) in entries.iter().enumerate() {
        let count = tree.count();
        assert!(tree.remove(*handle));
        assert_eq!(tree.count(), count - 1);
        assert!(!tree.get_colliding(bounds).contains(handle));

        // Everything not yet removed is still there
        for (other, other_bounds) in &entries[removed + 1..] {
            assert!(tree.get_colliding(other_bounds).contains(other));
        }
    }

    assert!(tree.is_empty());
    assert!(!tree.remove(0));
}

#[test]
fn growth_preserves_prior_content() {
    logging::init_for_tests();

    let mut tree = LooseOctree::new(4.0, Vec3::zeros(), 1.0, 1.2);
    let mut inserted = Vec::new();

    for i in 0..30_u32 {
        let step = i as f32;
        let bounds = unit_box(step * 7.0, -step * 5.0, step * 3.0 - 40.0);
        tree.insert(i, bounds).unwrap();
        inserted.push((i, bounds));

        for (handle, bounds) in &inserted {
            assert!(tree.get_colliding(bounds).contains(handle));
        }
    }

    assert!(tree.root().base_length() > 4.0);
    assert_eq!(tree.count(), 30);
}

#[test]
fn shrink_keeps_survivors_and_never_enlarges() {
    logging::init_for_tests();

    let mut tree = LooseOctree::new(10.0, Vec3::zeros(), 1.0, 1.25);
    let near: Vec<(u32, AABB)> = (0..12)
        .map(|i| (i, AABB::cube(Vec3::new(2.0 + (i % 3) as f32, 2.0 + (i / 3) as f32 * 0.5, 3.0), 0.4)))
        .collect();
    let far: Vec<(u32, AABB)> = (100..110)
        .map(|i| (i, unit_box(-60.0 - (i - 100) as f32, -60.0, -60.0)))
        .collect();

    for (handle, bounds) in near.iter().chain(&far) {
        tree.insert(*handle, *bounds).unwrap();
    }
    let before = tree.max_bounds();

    for (handle, bounds) in &far {
        assert!(tree.remove_with_bounds(*handle, bounds));
    }

    let after = tree.max_bounds();
    assert!(after.size().x <= before.size().x);
    assert_eq!(tree.count(), near.len());
    for (handle, bounds) in &near {
        assert!(after.contains_aabb(bounds));
        assert!(tree.get_colliding(bounds).contains(handle));
    }
}

#[test]
fn remove_with_bounds_finds_entries_from_before_growth() {
    logging::init_for_tests();

    // Looseness 2 lets the initial root hold boxes well past its 10 unit cell
    let mut tree = LooseOctree::new(10.0, Vec3::zeros(), 1.0, 2.0);
    let margin: Vec<(u32, AABB)> = [
        (8.0, 0.0, 0.0),
        (-8.0, 3.0, 0.0),
        (0.0, -8.0, 6.0),
        (7.0, 7.0, -7.0),
        (-6.0, -8.0, 8.0),
        (2.0, 2.0, 2.0),
    ]
    .iter()
    .zip(1_u32..)
    .map(|(&(x, y, z), handle)| (handle, unit_box(x, y, z)))
    .collect();

    for (handle, bounds) in &margin {
        tree.insert(*handle, *bounds).unwrap();
    }
    let far = [(100_u32, unit_box(45.0, -50.0, 20.0)), (101, unit_box(-120.0, 80.0, 0.0))];
    for (handle, bounds) in &far {
        tree.insert(*handle, *bounds).unwrap();
    }
    assert!(tree.root().base_length() > 10.0);

    for (handle, bounds) in &margin {
        let count = tree.count();
        assert!(tree.remove_with_bounds(*handle, bounds), "entry {} not removed", handle);
        assert_eq!(tree.count(), count - 1);
        assert!(!tree.get_colliding(bounds).contains(handle));
    }

    assert_eq!(tree.count(), far.len());
    for (handle, bounds) in &far {
        assert_eq!(tree.get_colliding(bounds), vec![*handle]);
    }
}

#[test]
fn ray_returns_exactly_the_boxes_it_crosses() {
    logging::init_for_tests();

    let mut tree = LooseOctree::new(32.0, Vec3::zeros(), 1.0, 1.25);
    // Along the X axis
    for (handle, x) in [(1_u32, -8.0), (2, 0.0), (3, 6.0), (4, 12.0)] {
        tree.insert(handle, unit_box(x, 0.0, 0.0)).unwrap();
    }
    // Off the axis
    for (handle, y) in [(10_u32, 3.0), (11, -4.0)] {
        tree.insert(handle, unit_box(0.0, y, 0.0)).unwrap();
    }

    let ray = Ray::new(Vec3::new(-20.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));

    let mut hits = tree.get_colliding_ray(&ray, 100.0);
    hits.sort_unstable();
    assert_eq!(hits, vec![1, 2, 3, 4]);

    // First box entered at 11.5, second at 19.5
    let mut short = tree.get_colliding_ray(&ray, 15.0);
    short.sort_unstable();
    assert_eq!(short, vec![1]);

    // A fat ray also picks up the box whose edge is 2.5 off the axis
    let mut swept = tree.get_colliding_ray_with_radius(&ray, 3.0, 100.0);
    swept.sort_unstable();
    assert_eq!(swept, vec![1, 2, 3, 4, 10]);

    let mut into = Vec::new();
    tree.get_colliding_ray_into(&ray, 100.0, &mut into);
    assert_eq!(into.len(), 4);
}

#[test]
fn ray_grazing_a_face_agrees_with_overlap_query() {
    logging::init_for_tests();

    // Looseness 1 puts child faces exactly on the root's center planes
    let mut tree = LooseOctree::new(8.0, Vec3::zeros(), 1.0, 1.0);
    let target = AABB::new(Vec3::new(1.0, 0.0, 1.0), Vec3::new(2.0, 1.0, 2.0));
    tree.insert(1_u32, target).unwrap();
    for i in 0..8_u32 {
        let offset = i as f32 * 0.1;
        tree.insert(10 + i, AABB::cube(Vec3::new(-2.0 - offset, -2.0, -2.0), 0.5)).unwrap();
    }
    assert!(tree.root().has_children());

    let ray = Ray::new(Vec3::new(-4.0, 0.0, 1.5), Vec3::new(1.0, 0.0, 0.0));
    let segment = AABB::new(Vec3::new(-4.0, 0.0, 1.5), Vec3::new(4.0, 0.0, 1.5));

    assert_eq!(tree.get_colliding(&segment), vec![1]);
    assert_eq!(tree.get_colliding_ray(&ray, 10.0), vec![1]);
    assert!(tree.is_colliding_ray(&ray, 10.0));
}

#[test]
fn frustum_culls_boxes_outside_every_plane() {
    logging::init_for_tests();

    let projection = Perspective3::new(1.0, std::f32::consts::FRAC_PI_2, 0.1, 50.0);
    let view = Isometry3::look_at_rh(&Point3::origin(), &Point3::new(0.0, 0.0, -1.0), &Vec3::y());
    let frustum = Frustum::from_matrix(&(projection.to_homogeneous() * view.to_homogeneous()));

    let mut tree = LooseOctree::new(20.0, Vec3::zeros(), 1.0, 1.25);
    tree.insert(1_u32, unit_box(0.0, 0.0, -10.0)).unwrap();
    tree.insert(2, unit_box(2.0, 1.0, -20.0)).unwrap();
    tree.insert(3, unit_box(0.0, 0.0, 10.0)).unwrap();
    tree.insert(4, unit_box(0.0, 0.0, -90.0)).unwrap();
    tree.insert(5, unit_box(40.0, 0.0, -5.0)).unwrap();

    let mut visible = tree.get_within_frustum(frustum.planes());
    visible.sort_unstable();
    assert_eq!(visible, vec![1, 2]);
}

#[test]
fn null_handles_never_surface() {
    logging::init_for_tests();

    let mut tree: LooseOctree<DefaultKey> = LooseOctree::new(10.0, Vec3::zeros(), 1.0, 1.0);
    let bounds = unit_box(1.0, 1.0, 1.0);

    tree.insert(DefaultKey::null(), bounds).unwrap();
    assert_eq!(tree.count(), 1);
    assert!(!tree.is_colliding(&bounds));
    assert!(tree.get_colliding(&bounds).is_empty());
}

#[test]
fn innermost_filter_on_nested_ray_hits() {
    logging::init_for_tests();

    // Room (0) contains table (1) which holds a cup (2)
    let parents: [Option<u32>; 3] = [None, Some(0), Some(1)];
    let mut tree = LooseOctree::new(20.0, Vec3::zeros(), 1.0, 1.25);
    tree.insert(0_u32, AABB::cube(Vec3::zeros(), 10.0)).unwrap();
    tree.insert(1, AABB::cube(Vec3::zeros(), 3.0)).unwrap();
    tree.insert(2, AABB::cube(Vec3::new(0.0, 0.5, 0.0), 0.5)).unwrap();

    let ray = Ray::new(Vec3::new(0.0, 20.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
    let mut hits = tree.get_colliding_ray(&ray, 50.0);
    assert_eq!(hits.len(), 3);

    retain_innermost(&mut hits, |a, b| {
        let mut current = parents[*b as usize];
        while let Some(parent) = current {
            if parent == *a {
                return true;
            }
            current = parents[parent as usize];
        }
        false
    });
    assert_eq!(hits, vec![2]);
}

#[test]
fn tree_from_saved_config() {
    logging::init_for_tests();

    let config = OctreeConfig::new(12.0, Vec3::new(1.0, 2.0, 3.0))
        .with_min_node_size(0.5)
        .with_looseness(1.5);
    let path = std::env::temp_dir().join(format!("octree_scenarios_{}.ron", std::process::id()));
    let path = path.to_string_lossy().into_owned();
    config.save_to_file(&path).unwrap();

    let loaded = OctreeConfig::load_from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded, config);

    let tree: LooseOctree<u32> = LooseOctree::from_config(&loaded);
    assert_relative_eq!(tree.looseness(), 1.5);
    assert_relative_eq!(tree.max_bounds().center(), Vec3::new(1.0, 2.0, 3.0));
    assert_relative_eq!(tree.max_bounds().size(), Vec3::new(18.0, 18.0, 18.0));
}

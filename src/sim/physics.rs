//! rapier2d integration
//!
//! [`PhysicsWorld`] owns the rapier sets and pipeline and exposes only what the
//! sandbox drives: static walls, dynamic polygon bodies, forces, AABB queries
//! and a step that reports which bodies started touching.
//!
//! User forces are cleared explicitly by the caller each tick, so a force added
//! between two steps acts for exactly one step.

use std::num::NonZeroUsize;

use glam::Vec2;
use rapier2d::prelude::*;

use super::bounds::Rect;
use super::model::ModelId;
use crate::catalogue::is_usable_polygon;

/// Fixture material shared by every spawned polygon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureMaterial {
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
}

/// Pose of a body for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyTransform {
    /// Body origin in world space
    pub position: Vec2,
    /// Rotation in radians
    pub angle: f32,
    /// World-space centre of mass
    pub center: Vec2,
}

#[inline]
fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

#[inline]
fn to_point(v: Vec2) -> Point<Real> {
    point![v.x, v.y]
}

/// Rigid-body simulation state
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
}

impl PhysicsWorld {
    /// Create an empty world with vertical gravity
    pub fn new(gravity: f32) -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![0.0, gravity],
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    /// Insert a fixed box centred at `center`
    pub fn insert_fixed_box(
        &mut self,
        center: Vec2,
        half_extents: Vec2,
        model: ModelId,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(to_vector(center))
            .user_data(model.0 as u128)
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y).build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    /// Insert a dynamic body at `origin` with one convex fixture per polygon.
    ///
    /// Polygons are in body-local coordinates. Polygons without three distinct
    /// finite vertices, or whose hull is flat, are skipped. Returns None (and
    /// inserts nothing) if no fixture survives.
    pub fn insert_dynamic(
        &mut self,
        origin: Vec2,
        polygons: &[Vec<Vec2>],
        material: FixtureMaterial,
        model: ModelId,
    ) -> Option<RigidBodyHandle> {
        let colliders: Vec<Collider> = polygons
            .iter()
            .filter(|polygon| is_usable_polygon(polygon))
            .filter_map(|polygon| {
                let points: Vec<Point<Real>> = polygon.iter().map(|v| to_point(*v)).collect();
                ColliderBuilder::convex_hull(&points)
            })
            .map(|builder| {
                builder
                    .density(material.density)
                    .friction(material.friction)
                    .restitution(material.restitution)
                    .active_events(ActiveEvents::COLLISION_EVENTS)
                    .build()
            })
            .collect();

        if colliders.is_empty() {
            return None;
        }

        let body = RigidBodyBuilder::dynamic()
            .translation(to_vector(origin))
            .user_data(model.0 as u128)
            .build();
        let handle = self.rigid_body_set.insert(body);
        for collider in colliders {
            self.collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        }
        Some(handle)
    }

    /// Remove a body together with its colliders
    pub fn remove(&mut self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    /// Model id stored in a body's user data
    pub fn model_of(&self, handle: RigidBodyHandle) -> Option<ModelId> {
        self.rigid_body_set
            .get(handle)
            .map(|rb| ModelId(rb.user_data as u32))
    }

    pub fn is_dynamic(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .get(handle)
            .is_some_and(|rb| rb.is_dynamic())
    }

    pub fn is_sleeping(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .get(handle)
            .is_some_and(|rb| rb.is_sleeping())
    }

    /// Union of the body's collider AABBs at its current pose
    pub fn body_aabb(&self, handle: RigidBodyHandle) -> Option<Rect> {
        let rb = self.rigid_body_set.get(handle)?;
        let aabb = rb
            .colliders()
            .iter()
            .filter_map(|h| self.collider_set.get(*h))
            .map(|collider| {
                let aabb = collider.compute_aabb();
                Rect::new(
                    Vec2::new(aabb.mins.x, aabb.mins.y),
                    Vec2::new(aabb.maxs.x, aabb.maxs.y),
                )
            })
            .fold(Rect::empty(), |acc, r| acc.union(&r));
        Some(aabb)
    }

    /// Number of fixtures attached to a body
    pub fn fixture_count(&self, handle: RigidBodyHandle) -> usize {
        self.rigid_body_set
            .get(handle)
            .map_or(0, |rb| rb.colliders().len())
    }

    /// Local-space outline of every polygon fixture on a body
    pub fn fixture_outlines(&self, handle: RigidBodyHandle) -> Vec<Vec<Vec2>> {
        let Some(rb) = self.rigid_body_set.get(handle) else {
            return Vec::new();
        };
        rb.colliders()
            .iter()
            .filter_map(|h| self.collider_set.get(*h))
            .filter_map(|collider| collider.shape().as_convex_polygon())
            .map(|polygon| {
                polygon
                    .points()
                    .iter()
                    .map(|p| Vec2::new(p.x, p.y))
                    .collect()
            })
            .collect()
    }

    pub fn transform(&self, handle: RigidBodyHandle) -> Option<BodyTransform> {
        let rb = self.rigid_body_set.get(handle)?;
        let position = rb.translation();
        let center = rb.center_of_mass();
        Some(BodyTransform {
            position: Vec2::new(position.x, position.y),
            angle: rb.rotation().angle(),
            center: Vec2::new(center.x, center.y),
        })
    }

    /// Drop any user force and torque still pending on a body
    pub fn reset_forces(&mut self, handle: RigidBodyHandle) {
        if let Some(rb) = self.rigid_body_set.get_mut(handle) {
            rb.reset_forces(false);
            rb.reset_torques(false);
        }
    }

    /// Apply a force at the centre of mass for the next step
    pub fn add_force(&mut self, handle: RigidBodyHandle, force: Vec2) {
        if let Some(rb) = self.rigid_body_set.get_mut(handle) {
            rb.add_force(to_vector(force), true);
        }
    }

    /// Apply a torque for the next step
    pub fn add_torque(&mut self, handle: RigidBodyHandle, torque: f32) {
        if let Some(rb) = self.rigid_body_set.get_mut(handle) {
            rb.add_torque(torque, true);
        }
    }

    /// Number of bodies, walls included
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Step the simulation by `dt` seconds.
    ///
    /// Returns the pairs of bodies whose colliders started touching during the
    /// step, in the order rapier reported them.
    pub fn step(
        &mut self,
        dt: f32,
        velocity_iterations: usize,
        position_iterations: usize,
    ) -> Vec<(RigidBodyHandle, RigidBodyHandle)> {
        self.integration_params.dt = dt;
        self.integration_params.num_solver_iterations =
            NonZeroUsize::new(velocity_iterations).unwrap_or(NonZeroUsize::MIN);
        self.integration_params.num_internal_stabilization_iterations = position_iterations;

        let (collision_send, collision_recv) =
            rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) =
            rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &event_handler,
        );

        let mut begins = Vec::new();
        while let Ok(event) = collision_recv.try_recv() {
            if let CollisionEvent::Started(h1, h2, _flags) = event {
                let body_a = self.collider_set.get(h1).and_then(|c| c.parent());
                let body_b = self.collider_set.get(h2).and_then(|c| c.parent());
                if let (Some(a), Some(b)) = (body_a, body_b) {
                    begins.push((a, b));
                }
            }
        }
        begins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATERIAL: FixtureMaterial = FixtureMaterial {
        density: 1.0,
        friction: 0.3,
        restitution: 0.5,
    };

    fn square(side: f32) -> Vec<Vec2> {
        vec![
            Vec2::ZERO,
            Vec2::new(side, 0.0),
            Vec2::new(side, side),
            Vec2::new(0.0, side),
        ]
    }

    #[test]
    fn test_dynamic_body_aabb_at_origin() {
        let mut physics = PhysicsWorld::new(-1.0);
        let handle = physics
            .insert_dynamic(Vec2::new(5.0, 5.0), &[square(2.0)], MATERIAL, ModelId(3))
            .expect("square is valid");

        let aabb = physics.body_aabb(handle).expect("body exists");
        assert!((aabb.min - Vec2::new(5.0, 5.0)).length() < 1e-4);
        assert!((aabb.max - Vec2::new(7.0, 7.0)).length() < 1e-4);
        assert_eq!(physics.model_of(handle), Some(ModelId(3)));
        assert!(physics.is_dynamic(handle));
        assert_eq!(physics.fixture_count(handle), 1);
    }

    #[test]
    fn test_degenerate_polygons_insert_nothing() {
        let mut physics = PhysicsWorld::new(-1.0);
        let line = vec![Vec2::ZERO, Vec2::X, Vec2::new(2.0, 0.0)];
        assert!(physics
            .insert_dynamic(Vec2::ZERO, &[line], MATERIAL, ModelId(1))
            .is_none());
        assert_eq!(physics.body_count(), 0);
    }

    #[test]
    fn test_coincident_points_are_skipped() {
        let mut physics = PhysicsWorld::new(-1.0);
        let point = vec![Vec2::ONE; 3];
        let pair = vec![Vec2::ZERO, Vec2::X];
        assert!(physics
            .insert_dynamic(Vec2::ZERO, &[point.clone(), pair], MATERIAL, ModelId(1))
            .is_none());
        assert_eq!(physics.body_count(), 0);

        // A usable polygon alongside still yields a body with only that fixture
        let handle = physics
            .insert_dynamic(Vec2::ZERO, &[point, square(1.0)], MATERIAL, ModelId(2))
            .expect("square is valid");
        assert_eq!(physics.fixture_count(handle), 1);
    }

    #[test]
    fn test_outlines_match_fixtures() {
        let mut physics = PhysicsWorld::new(-1.0);
        let triangle = vec![Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
        let handle = physics
            .insert_dynamic(Vec2::ZERO, &[square(1.0), triangle], MATERIAL, ModelId(1))
            .expect("valid polygons");
        let outlines = physics.fixture_outlines(handle);
        assert_eq!(outlines.len(), 2);
        assert_eq!(outlines.iter().map(Vec::len).sum::<usize>(), 7);
    }

    #[test]
    fn test_falling_body_reports_contact_with_floor() {
        let mut physics = PhysicsWorld::new(-10.0);
        let floor =
            physics.insert_fixed_box(Vec2::new(10.0, 0.0), Vec2::new(10.0, 0.1), ModelId(0));
        let body = physics
            .insert_dynamic(Vec2::new(9.0, 0.5), &[square(1.0)], MATERIAL, ModelId(1))
            .expect("valid square");

        let mut touched = false;
        for _ in 0..120 {
            for (a, b) in physics.step(1.0 / 60.0, 6, 2) {
                if (a == floor && b == body) || (a == body && b == floor) {
                    touched = true;
                }
            }
        }
        assert!(touched);
        assert!(!physics.is_dynamic(floor));
    }

    #[test]
    fn test_remove_body() {
        let mut physics = PhysicsWorld::new(-1.0);
        let handle = physics
            .insert_dynamic(Vec2::ZERO, &[square(1.0)], MATERIAL, ModelId(1))
            .expect("valid square");
        assert!(physics.remove(handle));
        assert!(!physics.remove(handle));
        assert!(physics.transform(handle).is_none());
    }
}

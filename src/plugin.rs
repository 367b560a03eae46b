//! Bevy glue: runs fusion on the async compute pool and keeps one terrain
//! entity showing the latest committed result.
//!
//! Camera, lights and controls are left to the application.

use std::collections::VecDeque;

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use futures_lite::future;

use crate::session::{FusionOutcome, FusionSession};
use crate::settings::FusionSettings;
use crate::slot::TerrainSlot;

/// Adds [`FusionSession`], [`FusionRequests`] and [`TerrainSlot`] resources and
/// the systems that service them.
///
/// # Example
///
/// ```ignore
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(TerrainFusionPlugin::default())
///     .add_systems(Update, |mut requests: ResMut<FusionRequests>| {
///         // requests.combine(dsm_bytes, ortho_bytes);
///     })
///     .run();
/// ```
#[derive(Default)]
pub struct TerrainFusionPlugin {
    /// Settings used for every fusion started by the plugin.
    pub settings: FusionSettings,
}

impl Plugin for TerrainFusionPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.settings)
            .insert_resource(FusionSession::new(self.settings))
            .init_resource::<FusionRequests>()
            .init_resource::<TerrainSlot>()
            .add_systems(
                Update,
                (start_fusion_task, finish_fusion_tasks, present_terrain).chain(),
            );
    }
}

/// A user action the core accepts.
#[derive(Debug, Clone)]
pub enum FusionRequest {
    /// Decode and fuse a new elevation/color file pair.
    Combine { elevation: Vec<u8>, color: Vec<u8> },
    /// Advance the rotation a quarter turn and re-fuse the stored rasters.
    Rotate,
}

/// Pending requests, serviced one at a time in arrival order.
#[derive(Resource, Debug, Default)]
pub struct FusionRequests {
    queue: VecDeque<FusionRequest>,
}

impl FusionRequests {
    /// Queues fusion of a new elevation/color file pair.
    pub fn combine(&mut self, elevation: Vec<u8>, color: Vec<u8>) {
        self.queue
            .push_back(FusionRequest::Combine { elevation, color });
    }

    /// Queues a quarter-turn texture rotation.
    pub fn rotate(&mut self) {
        self.queue.push_back(FusionRequest::Rotate);
    }

    /// Number of requests not yet started.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether every request has been started.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// In-flight decode + fuse work.
#[derive(Component)]
pub struct FusionTask {
    task: Task<FusionOutcome>,
}

/// Marks the entity displaying the fused terrain.
#[derive(Component)]
pub struct FusedTerrainDisplay {
    /// [`TerrainSlot`] generation currently shown.
    pub generation: u64,
}

/// Starts the next queued request unless a task is already running.
pub fn start_fusion_task(
    mut commands: Commands,
    mut requests: ResMut<FusionRequests>,
    mut session: ResMut<FusionSession>,
    running: Query<(), With<FusionTask>>,
) {
    if !running.is_empty() {
        return;
    }

    while let Some(request) = requests.queue.pop_front() {
        let job = match request {
            FusionRequest::Combine { elevation, color } => {
                Some(session.combine_job(elevation, color))
            }
            FusionRequest::Rotate => session.rotate_job(),
        };
        let Some(job) = job else {
            continue;
        };

        debug!("Spawning fusion task at {}°", job.rotation().degrees());
        let task = AsyncComputeTaskPool::get().spawn(async move { job.run() });
        commands.spawn(FusionTask { task });
        return;
    }
}

/// Commits finished tasks to the session and publishes successes.
pub fn finish_fusion_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut FusionTask)>,
    mut session: ResMut<FusionSession>,
    slot: Res<TerrainSlot>,
) {
    for (entity, mut fusion_task) in &mut tasks {
        let Some(outcome) = future::block_on(future::poll_once(&mut fusion_task.task)) else {
            continue;
        };
        commands.entity(entity).despawn();

        // Errors are already logged by the session; the slot keeps the last good pair.
        if let Ok(terrain) = session.commit(outcome) {
            let generation = slot.publish(terrain);
            debug!("Published terrain generation {generation}");
        }
    }
}

/// Swaps the displayed mesh and texture when the slot holds a newer terrain.
pub fn present_terrain(
    mut commands: Commands,
    slot: Res<TerrainSlot>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut displays: Query<(Entity, &mut FusedTerrainDisplay)>,
) {
    let seen = displays
        .iter()
        .map(|(_, display)| display.generation)
        .max()
        .unwrap_or(0);
    let Some((generation, terrain)) = slot.newer_than(seen) else {
        return;
    };

    let mesh = meshes.add(terrain.mesh.to_mesh());
    let material = materials.add(StandardMaterial {
        base_color_texture: Some(images.add(terrain.texture.to_image())),
        perceptual_roughness: 1.0,
        ..default()
    });

    // Replacing the handles drops the previous assets once nothing else holds them.
    match displays.iter_mut().next() {
        Some((entity, mut display)) => {
            display.generation = generation;
            commands
                .entity(entity)
                .insert((Mesh3d(mesh), MeshMaterial3d(material)));
        }
        None => {
            commands.spawn((
                Mesh3d(mesh),
                MeshMaterial3d(material),
                Transform::default(),
                FusedTerrainDisplay { generation },
            ));
        }
    }
}

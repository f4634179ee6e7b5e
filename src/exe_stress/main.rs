use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use clap::Parser;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use containers_flatbvh::aabb_tree::{ray_test, Node, RayHit};
use containers_flatbvh::{AabbTree, AabbTreeConfig, NodePool};
use math_flatbvh::{Frustum, Ray, AABB};
use nab_flatbvh::app::{AppRun, ExitReason};
use nab_flatbvh::format_binary;
use crate::scene::Scene;

mod scene;

#[derive(Parser, Debug)]
#[command(about = "Drives a static and a dynamic tree through a simulated scene and reports timings")]
struct CliArgs
{
    /// TOML file with optional [static_tree] and [dynamic_tree] tables
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 20_000)]
    statics: u32,

    #[arg(long, default_value_t = 4_000)]
    movers: u32,

    #[arg(long, default_value_t = 300)]
    steps: u32,

    #[arg(long, default_value_t = 0x3141_5926)]
    seed: u64,

    /// Force surface-area partitioning for both trees
    #[arg(long)]
    high_quality: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct StressConfig
{
    static_tree: AabbTreeConfig,
    dynamic_tree: AabbTreeConfig,
}
impl StressConfig
{
    fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>>
    {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}

#[derive(Debug, Default)]
struct StepTotals
{
    maintenance: Duration,
    queries: Duration,
    visible: usize,
    overlapping: usize,
    ray_hits: usize,
    pairs: usize,
}

fn main() -> ExitReason
{
    let app_run = AppRun::<CliArgs>::startup("flatbvh stress", env!("CARGO_PKG_VERSION"));
    let args = &app_run.args;

    let mut config = match &args.config
    {
        None => StressConfig::default(),
        Some(path) => match StressConfig::load(path)
        {
            Ok(config) => config,
            Err(err) =>
            {
                log::error!("Failed to load config {path:?}: {err}");
                app_run.set_exit_reason(ExitReason::BadConfig);
                return app_run.get_exit_reason();
            }
        },
    };
    if config.static_tree.name.is_empty() { config.static_tree.name = "static".to_string(); }
    if config.dynamic_tree.name.is_empty() { config.dynamic_tree.name = "dynamic".to_string(); }
    if args.high_quality
    {
        config.static_tree.high_quality = true;
        config.dynamic_tree.high_quality = true;
    }
    log::debug!("Tree config: {config:#?}");

    let pool = Arc::new(NodePool::default());
    let mut static_tree = AabbTree::with_pool(config.static_tree, pool.clone());
    let mut dynamic_tree = AabbTree::with_pool(config.dynamic_tree, pool.clone());
    let mut scene = Scene::new(args.seed);

    let start = Instant::now();
    for key in 0..args.statics
    {
        let extents = scene.random_static_box();
        if let Err(err) = static_tree.add(key, extents)
        {
            log::error!("Failed to add static {key}: {err}");
        }
    }
    static_tree.finalize();
    log::info!("Built {:?} with {} leaves in {:.2}ms",
        static_tree.config().name,
        static_tree.get_num_leaves(),
        start.elapsed().as_secs_f64() * 1000.0);

    for _ in 0..args.movers
    {
        let mover = scene.spawn_mover();
        if let Err(err) = dynamic_tree.add(mover.key, mover.bounds())
        {
            log::error!("Failed to add mover {}: {err}", mover.key);
        }
    }

    let projection = Mat4::perspective_lh(std::f32::consts::FRAC_PI_3, 16.0 / 9.0, 0.5, 400.0);
    let mut totals = StepTotals::default();
    let mut visible = Vec::new();
    let mut overlapping = Vec::new();
    let mut pairs = Vec::new();

    for step in 0..args.steps
    {
        scene.advance(1.0 / 30.0);
        for removed in scene.despawn_some(0.002)
        {
            if let Err(err) = dynamic_tree.remove(removed)
            {
                log::warn!("Failed to remove mover {removed}: {err}");
            }
        }
        while scene.movers.len() < args.movers as usize
        {
            let mover = scene.spawn_mover();
            if let Err(err) = dynamic_tree.add(mover.key, mover.bounds())
            {
                log::warn!("Failed to add mover {}: {err}", mover.key);
            }
        }
        for mover in &scene.movers
        {
            if let Err(err) = dynamic_tree.update(mover.key, mover.bounds())
            {
                log::warn!("Failed to update mover {}: {err}", mover.key);
            }
        }

        let maintenance_start = Instant::now();
        static_tree.finalize();
        dynamic_tree.finalize();
        totals.maintenance += maintenance_start.elapsed();

        if cfg!(debug_assertions)
        {
            for tree in [&static_tree, &dynamic_tree]
            {
                if let Err(err) = tree.validate()
                {
                    log::error!("{:?} failed validation at step {step}: {err}", tree.config().name);
                    app_run.set_exit_reason(ExitReason::ValidationFailed);
                    return app_run.get_exit_reason();
                }
            }
        }

        // camera circles the origin looking inward
        let angle = step as f32 * 0.02;
        let eye = Vec3::new(angle.cos() * 600.0, 40.0, angle.sin() * 600.0);
        let view = Mat4::look_at_lh(eye, Vec3::ZERO, Vec3::Y);
        let frustum = Frustum::from_matrix(&(projection * view));

        let query_start = Instant::now();
        let num_static = static_tree.get_visible_nodes(&frustum.planes, &mut visible, 0);
        let num_dynamic = dynamic_tree.get_visible_nodes(&frustum.planes, &mut visible, num_static);
        totals.visible += num_static + num_dynamic;

        let center = scene.random_point();
        let region = AABB::new(center - Vec3::splat(50.0), center + Vec3::splat(50.0));
        let num_static = static_tree.get_overlapping_nodes(&region, &mut overlapping, 0);
        let num_dynamic = dynamic_tree.get_overlapping_nodes(&region, &mut overlapping, num_static);
        totals.overlapping += num_static + num_dynamic;

        let ray = Ray::new(eye, (Vec3::ZERO - eye).normalize()).with_max_factor(2000.0);
        let hit = ray_test(&[&static_tree, &dynamic_tree], &ray, |c|
        {
            Some(RayHit { factor: c.distance, data: (c.tree_index, c.key) })
        });
        if hit.is_some() { totals.ray_hits += 1; }

        if step % 30 == 0
        {
            pairs.clear();
            totals.pairs += dynamic_tree.get_overlapping_pairs(&mut pairs);
        }
        totals.queries += query_start.elapsed();
    }

    let steps = args.steps.max(1) as f64;
    log::info!("{} steps: maintenance {:.3}ms/step, queries {:.3}ms/step",
        args.steps,
        totals.maintenance.as_secs_f64() * 1000.0 / steps,
        totals.queries.as_secs_f64() * 1000.0 / steps);
    log::info!("Averages: {:.1} visible, {:.1} overlapping, {:.1}% rays hit; {} overlapping mover pairs sampled",
        totals.visible as f64 / steps,
        totals.overlapping as f64 / steps,
        totals.ray_hits as f64 * 100.0 / steps,
        totals.pairs);
    for tree in [&static_tree, &dynamic_tree]
    {
        log::info!("{:?}: {} leaves, {} nodes, last rebuild {:?}",
            tree.config().name,
            tree.get_num_leaves(),
            tree.end_node(),
            tree.last_rebuild());
    }
    log::info!("Node pool: {} allocated ({:.1}B), {} free",
        pool.total_allocated(),
        format_binary!(pool.total_allocated() * size_of::<Node<u32>>()),
        pool.free_count());

    app_run.get_exit_reason()
}

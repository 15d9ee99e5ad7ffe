//! Benchmark grid mutation, sphere queries, and line traces.
//!
//! Run with: cargo run --release --bin bench_grid
//!
//! Usage:
//!   bench_grid                 Run default size (100k)
//!   bench_grid 10k 100k 1m     Run multiple sizes
//!   bench_grid -q 500          Run 500 queries/traces per size

use clap::Parser;
use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

use spatial_grid::util::Timed;
use spatial_grid::{Bounds, GridSemantics, LineTrace, SpatialGrid, SphereQueryBuilder};

fn parse_count(s: &str) -> Result<usize, String> {
    let s = s.to_lowercase();
    let (num_str, multiplier) = if s.ends_with('m') {
        (&s[..s.len() - 1], 1_000_000)
    } else if s.ends_with('k') {
        (&s[..s.len() - 1], 1_000)
    } else {
        (s.as_str(), 1)
    };

    num_str
        .parse::<f64>()
        .map(|n| (n * multiplier as f64) as usize)
        .map_err(|e| format!("Invalid number '{}': {}", s, e))
}

#[derive(Parser)]
#[command(name = "bench_grid")]
#[command(about = "Benchmark the spatial grid at various scales")]
struct Args {
    /// Element counts to benchmark (e.g., 10k, 100k, 1m)
    #[arg(value_parser = parse_count)]
    sizes: Vec<usize>,

    /// Random seed
    #[arg(short, long, default_value_t = 12345)]
    seed: u64,

    /// Queries and traces per size
    #[arg(short, long, default_value_t = 1000)]
    queries: usize,

    /// Query radius in world units
    #[arg(short, long, default_value_t = 250.0)]
    radius: f64,
}

struct BenchSemantics;

impl GridSemantics for BenchSemantics {
    const CELL_SIZE: f64 = 100.0;
    const MAX_ELEMENT_RADIUS: f64 = 45.0;
    type ElementData = u32;
}

type BenchGrid = SpatialGrid<BenchSemantics>;

fn random_point<R: Rng>(rng: &mut R, half_extent: f64) -> DVec3 {
    DVec3::new(
        rng.gen_range(-half_extent..half_extent),
        rng.gen_range(-half_extent..half_extent),
        rng.gen_range(-half_extent..half_extent),
    )
}

fn world_half_extent(n: usize) -> f64 {
    // Keep mean occupancy around two elements per cell.
    let cells = (n as f64 / 2.0).max(1.0);
    (cells.cbrt() * BenchSemantics::CELL_SIZE) / 2.0
}

fn bench_size(n: usize, args: &Args) {
    println!("--- {} elements ---", n);
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let half_extent = world_half_extent(n);

    let mut grid = BenchGrid::with_capacity(n);
    let mut ids = Vec::with_capacity(n);

    let start = Instant::now();
    for i in 0..n {
        let bounds = Bounds::sphere(random_point(&mut rng, half_extent), rng.gen_range(1.0..45.0));
        ids.push(grid.add_element(bounds, i as u32));
    }
    let insert = start.elapsed();

    let stats = grid.stats();
    println!(
        "insert: {:.1}ms ({:.0}ns/element), {} cells, avg {:.2}/cell, max {}/cell",
        insert.as_secs_f64() * 1000.0,
        insert.as_nanos() as f64 / n as f64,
        stats.num_cells,
        stats.avg_elements_per_cell,
        stats.max_elements_per_cell,
    );

    let query = {
        let _t = Timed::info("build cached query");
        SphereQueryBuilder::<BenchSemantics>::new()
            .radius(args.radius)
            .build_cached()
    };

    let start = Instant::now();
    let mut hits = 0usize;
    for _ in 0..args.queries {
        let origin = random_point(&mut rng, half_extent);
        query.at(origin).each(&grid, |_, _| hits += 1);
    }
    let cached = start.elapsed();
    println!(
        "cached query r={}: {:.2}us/query, {:.1} hits/query",
        args.radius,
        cached.as_micros() as f64 / args.queries as f64,
        hits as f64 / args.queries as f64,
    );

    let on_demand = SphereQueryBuilder::<BenchSemantics>::new()
        .radius(args.radius)
        .build_on_demand();
    let start = Instant::now();
    let mut hits = 0usize;
    for _ in 0..args.queries {
        let origin = random_point(&mut rng, half_extent);
        on_demand.at(origin).each(&grid, |_, _| hits += 1);
    }
    let uncached = start.elapsed();
    println!(
        "on-demand query r={}: {:.2}us/query, {:.1} hits/query",
        args.radius,
        uncached.as_micros() as f64 / args.queries as f64,
        hits as f64 / args.queries as f64,
    );

    let start = Instant::now();
    let mut blocked = 0usize;
    for _ in 0..args.queries {
        let trace = LineTrace::new(
            random_point(&mut rng, half_extent * 1.2),
            random_point(&mut rng, half_extent * 1.2),
        );
        if trace.single(&grid).blocking_hit {
            blocked += 1;
        }
    }
    let traces = start.elapsed();
    println!(
        "line trace (single): {:.2}us/trace, {:.0}% blocked",
        traces.as_micros() as f64 / args.queries as f64,
        100.0 * blocked as f64 / args.queries as f64,
    );

    let start = Instant::now();
    for id in ids.iter().step_by(2) {
        grid.update_element_location(*id, random_point(&mut rng, half_extent));
    }
    let moves = start.elapsed();
    println!(
        "relocate half: {:.1}ms ({:.0}ns/move)",
        moves.as_secs_f64() * 1000.0,
        moves.as_nanos() as f64 / (n / 2).max(1) as f64,
    );

    let start = Instant::now();
    for id in ids {
        grid.remove_element(id);
    }
    grid.clear_empty_cells();
    let removal = start.elapsed();
    println!(
        "remove all + reclaim: {:.1}ms ({:.0}ns/element)",
        removal.as_secs_f64() * 1000.0,
        removal.as_nanos() as f64 / n as f64,
    );
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let sizes = if args.sizes.is_empty() {
        vec![100_000]
    } else {
        args.sizes.clone()
    };

    for n in sizes {
        bench_size(n, &args);
    }
}

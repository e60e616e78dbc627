//! Column scans over a terrain store.

use cavern_blocks::Block;
use cavern_chunk::TerrainStore;
use cavern_geom::{BlockPos, Direction};

/// True when the `height` cells starting at `origin` and stepping along
/// `dir` all pass `free`.
pub fn is_free_space<S, F>(store: &S, origin: BlockPos, dir: Direction, height: i32, free: F) -> bool
where
    S: TerrainStore + ?Sized,
    F: Fn(Block) -> bool,
{
    (0..height).all(|i| free(store.block(origin.relative_by(dir, i))))
}

/// Length of the run of `free` cells from `origin` along `dir`, capped at `max`.
pub fn free_run<S, F>(store: &S, origin: BlockPos, dir: Direction, max: i32, free: F) -> i32
where
    S: TerrainStore + ?Sized,
    F: Fn(Block) -> bool,
{
    let mut n = 0;
    while n < max && free(store.block(origin.relative_by(dir, n))) {
        n += 1;
    }
    n
}

/// Finds the open cell resting on a surface near `start`.
///
/// `toward` points from open space into the surface. When `start` is inside
/// the surface the scan backs out against `toward`; otherwise it advances
/// along `toward` until it hits the surface. Either way at most `depth` steps
/// are taken, and the returned cell is open with its neighbour along
/// `toward` passing `surface`.
pub fn find_surrounding_surface<S, F>(
    store: &S,
    start: BlockPos,
    toward: Direction,
    depth: i32,
    surface: F,
) -> Option<BlockPos>
where
    S: TerrainStore + ?Sized,
    F: Fn(Block) -> bool,
{
    if surface(store.block(start)) {
        let back = toward.opposite();
        let mut pos = start;
        for _ in 0..depth {
            let next = pos.relative(back);
            if !surface(store.block(next)) {
                return Some(next);
            }
            pos = next;
        }
        None
    } else {
        let mut pos = start;
        for _ in 0..depth {
            let next = pos.relative(toward);
            if surface(store.block(next)) {
                return Some(pos);
            }
            pos = next;
        }
        None
    }
}

/// Walks from `start` along `dir` while cells pass `allowed`, returning the
/// first cell that passes `target`. Gives up after `max_steps` moves.
pub fn scan_for<S, T, A>(
    store: &S,
    start: BlockPos,
    dir: Direction,
    max_steps: i32,
    target: T,
    allowed: A,
) -> Option<BlockPos>
where
    S: TerrainStore + ?Sized,
    T: Fn(Block) -> bool,
    A: Fn(Block) -> bool,
{
    let mut pos = start;
    if !allowed(store.block(pos)) {
        return None;
    }
    for _ in 0..max_steps {
        if target(store.block(pos)) {
            return Some(pos);
        }
        pos = pos.relative(dir);
        if !allowed(store.block(pos)) {
            break;
        }
    }
    target(store.block(pos)).then_some(pos)
}

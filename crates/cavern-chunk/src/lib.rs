//! Terrain stores: the read/write seam placement code mutates, plus a dense
//! chunk buffer and a sparse overlay.
#![forbid(unsafe_code)]

use cavern_blocks::types::Block;
use cavern_geom::BlockPos;
use hashbrown::HashMap;

/// Synchronous block storage. Last write at a position wins.
pub trait TerrainStore {
    fn block(&self, pos: BlockPos) -> Block;
    fn set_block(&mut self, pos: BlockPos, block: Block);
}

impl<T: TerrainStore + ?Sized> TerrainStore for &mut T {
    #[inline]
    fn block(&self, pos: BlockPos) -> Block {
        (**self).block(pos)
    }

    #[inline]
    fn set_block(&mut self, pos: BlockPos, block: Block) {
        (**self).set_block(pos, block)
    }
}

#[derive(Clone, Debug)]
pub struct ChunkBuf {
    pub origin: BlockPos,
    pub sx: usize,
    pub sy: usize,
    pub sz: usize,
    pub blocks: Vec<Block>,
    /// Returned for reads outside the buffer.
    pub outside: Block,
    /// Writes outside the buffer are dropped and counted here.
    pub dropped_writes: u64,
}

impl ChunkBuf {
    pub fn filled(origin: BlockPos, sx: usize, sy: usize, sz: usize, fill: Block) -> Self {
        ChunkBuf {
            origin,
            sx,
            sy,
            sz,
            blocks: vec![fill; sx * sy * sz],
            outside: Block::AIR,
            dropped_writes: 0,
        }
    }

    pub fn from_blocks_local(
        origin: BlockPos,
        sx: usize,
        sy: usize,
        sz: usize,
        blocks: Vec<Block>,
    ) -> Self {
        let mut b = blocks;
        let expect = sx * sy * sz;
        if b.len() != expect {
            b.resize(expect, Block::AIR);
        }
        ChunkBuf {
            origin,
            sx,
            sy,
            sz,
            blocks: b,
            outside: Block::AIR,
            dropped_writes: 0,
        }
    }

    pub fn with_outside(mut self, outside: Block) -> Self {
        self.outside = outside;
        self
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (y * self.sz + z) * self.sx + x
    }

    #[inline]
    pub fn get_local(&self, x: usize, y: usize, z: usize) -> Block {
        self.blocks[self.idx(x, y, z)]
    }

    #[inline]
    fn local(&self, pos: BlockPos) -> Option<(usize, usize, usize)> {
        let lx = i64::from(pos.x) - i64::from(self.origin.x);
        let ly = i64::from(pos.y) - i64::from(self.origin.y);
        let lz = i64::from(pos.z) - i64::from(self.origin.z);
        if lx < 0 || ly < 0 || lz < 0 {
            return None;
        }
        let (lx, ly, lz) = (lx as usize, ly as usize, lz as usize);
        if lx >= self.sx || ly >= self.sy || lz >= self.sz {
            return None;
        }
        Some((lx, ly, lz))
    }

    #[inline]
    pub fn contains_world(&self, pos: BlockPos) -> bool {
        self.local(pos).is_some()
    }

    #[inline]
    pub fn get_world(&self, pos: BlockPos) -> Option<Block> {
        let (lx, ly, lz) = self.local(pos)?;
        Some(self.get_local(lx, ly, lz))
    }

    /// Fills the inclusive box `[min, max]`, clipped to the buffer.
    pub fn fill_box(&mut self, min: BlockPos, max: BlockPos, block: Block) {
        for y in min.y..=max.y {
            for z in min.z..=max.z {
                for x in min.x..=max.x {
                    if let Some((lx, ly, lz)) = self.local(BlockPos::new(x, y, z)) {
                        let i = self.idx(lx, ly, lz);
                        self.blocks[i] = block;
                    }
                }
            }
        }
    }

    pub fn count(&self, block: Block) -> usize {
        self.blocks.iter().filter(|b| **b == block).count()
    }
}

impl TerrainStore for ChunkBuf {
    #[inline]
    fn block(&self, pos: BlockPos) -> Block {
        self.get_world(pos).unwrap_or(self.outside)
    }

    #[inline]
    fn set_block(&mut self, pos: BlockPos, block: Block) {
        match self.local(pos) {
            Some((lx, ly, lz)) => {
                let i = self.idx(lx, ly, lz);
                self.blocks[i] = block;
            }
            None => self.dropped_writes += 1,
        }
    }
}

/// Unbounded store: a base function describes the untouched terrain and
/// writes are kept in an overlay.
pub struct SparseTerrain<F> {
    base: F,
    edits: HashMap<BlockPos, Block>,
}

impl<F: Fn(BlockPos) -> Block> SparseTerrain<F> {
    pub fn new(base: F) -> Self {
        Self {
            base,
            edits: HashMap::new(),
        }
    }

    pub fn edit(&self, pos: BlockPos) -> Option<Block> {
        self.edits.get(&pos).copied()
    }

    pub fn edit_count(&self) -> usize {
        self.edits.len()
    }

    /// Edits sorted by position for stable comparisons.
    pub fn snapshot_all(&self) -> Vec<(BlockPos, Block)> {
        let mut out: Vec<_> = self.edits.iter().map(|(k, v)| (*k, *v)).collect();
        out.sort_by_key(|(p, _)| (p.y, p.z, p.x));
        out
    }
}

impl<F: Fn(BlockPos) -> Block> TerrainStore for SparseTerrain<F> {
    #[inline]
    fn block(&self, pos: BlockPos) -> Block {
        self.edits.get(&pos).copied().unwrap_or_else(|| (self.base)(pos))
    }

    #[inline]
    fn set_block(&mut self, pos: BlockPos, block: Block) {
        self.edits.insert(pos, block);
    }
}

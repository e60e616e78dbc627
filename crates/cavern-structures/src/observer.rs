//! Diagnostics emitted while placing.

use cavern_blocks::Block;
use cavern_geom::{BlockPos, Direction};

#[derive(Clone, Debug, PartialEq)]
pub enum ScatterEvent {
    /// Neither floor nor ceiling next to the origin is a valid base.
    NoAttachment { origin: BlockPos },
    /// A pillar cell overwrote something that was not free space.
    Replaced {
        pos: BlockPos,
        previous: Block,
        placed: Block,
    },
    /// A pillar was grown.
    Pillar {
        origin: BlockPos,
        direction: Direction,
        height: i32,
    },
    /// A secondary attempt found no surface near its column.
    SurfaceMissing { column: BlockPos },
    /// Free space or footing refused a pillar.
    PillarRefused { origin: BlockPos, height: i32 },
}

pub trait ScatterObserver {
    fn on_event(&mut self, event: ScatterEvent);
}

/// Forwards events to `log` under the `scatter` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl ScatterObserver for LogObserver {
    fn on_event(&mut self, event: ScatterEvent) {
        match event {
            ScatterEvent::Replaced { pos, previous, placed } => {
                log::warn!(
                    target: "scatter",
                    "replaced block {}:{} with {}:{} at {}",
                    previous.id,
                    previous.state,
                    placed.id,
                    placed.state,
                    pos
                );
            }
            ScatterEvent::NoAttachment { origin } => {
                log::trace!(target: "scatter", "no valid base next to {}", origin);
            }
            ScatterEvent::Pillar { origin, direction, height } => {
                log::trace!(target: "scatter", "pillar at {} growing {:?}, height {}", origin, direction, height);
            }
            ScatterEvent::SurfaceMissing { column } => {
                log::trace!(target: "scatter", "no surface near {}", column);
            }
            ScatterEvent::PillarRefused { origin, height } => {
                log::trace!(target: "scatter", "pillar of {} refused at {}", height, origin);
            }
        }
    }
}

/// Keeps every event; used by tests and the preview tool.
#[derive(Clone, Debug, Default)]
pub struct CollectingObserver {
    pub events: Vec<ScatterEvent>,
}

impl CollectingObserver {
    pub fn replaced(&self) -> impl Iterator<Item = &ScatterEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, ScatterEvent::Replaced { .. }))
    }

    pub fn pillars(&self) -> impl Iterator<Item = (BlockPos, Direction, i32)> + '_ {
        self.events.iter().filter_map(|e| match *e {
            ScatterEvent::Pillar { origin, direction, height } => Some((origin, direction, height)),
            _ => None,
        })
    }
}

impl ScatterObserver for CollectingObserver {
    fn on_event(&mut self, event: ScatterEvent) {
        self.events.push(event);
    }
}

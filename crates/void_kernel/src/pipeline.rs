//! Layer scheduler
//!
//! Owns the ordered layer list, the entity registry and the parent/child
//! hierarchy, and drives every active layer once per frame:
//!
//! - `update`: each layer's `update`, ascending priority
//! - `render`: per layer, `collect_render_commands` then
//!   `process_render_commands` with the commands it supports; the rest is
//!   carried to the next layer
//!
//! Layers added while running are parked and merged at the start of the next
//! frame, so the run order never changes mid-frame. A failing or panicking layer
//! callback is contained at that layer; the frame continues.
//!
//! ```ignore
//! let mut pipeline = Pipeline::new();
//! pipeline.add_layer(UpdateLayer::default())?;
//! pipeline.add_layer(WorldLayer::default())?;
//! pipeline.add_entity(share(Spinner::new(id)))?;
//!
//! pipeline.update(&frame, &input);
//! pipeline.render(&frame, &mut env);
//! ```

use std::collections::HashMap;
use std::time::Instant;

use void_core::{Error, FrameTime, Result};
use void_render::{CommandList, GraphicsContext};

use crate::diagnostics::{DiagnosticsSnapshot, LayerSnapshot, LayerStats, PipelineDiagnostics};
use crate::entity::{EntityId, SharedEntity};
use crate::env::RenderEnv;
use crate::hierarchy::Hierarchy;
use crate::input::InputState;
use crate::layer::{Layer, LayerError, LayerHealth, LayerPhase};
use crate::recovery::catch_panic_mut;

struct LayerSlot {
    layer: Box<dyn Layer>,
    /// Insertion sequence, breaks priority ties
    seq: u64,
    stats: LayerStats,
    health: LayerHealth,
    /// Frame whose entity counts `stats` currently holds
    counted_frame: u64,
}

impl LayerSlot {
    /// Record a callback outcome. Returns `true` on success
    fn record(
        &mut self,
        phase: LayerPhase,
        outcome: std::result::Result<std::result::Result<(), LayerError>, String>,
        frame: u64,
    ) -> bool {
        let error = match outcome {
            Ok(Ok(())) => return true,
            Ok(Err(err)) => err,
            Err(panic) => LayerError::Panicked(panic),
        };
        log::error!("layer '{}' failed during {}: {}", self.layer.name(), phase, error);
        self.stats.failures += 1;
        self.health = LayerHealth::Failed {
            phase,
            error: error.to_string(),
            frame,
        };
        false
    }

    fn absorb_counts(&mut self, frame: u64) {
        if self.counted_frame != frame {
            self.stats.processed = 0;
            self.stats.skipped = 0;
            self.counted_frame = frame;
        }
        let counts = self.layer.take_counts();
        self.stats.processed += counts.processed;
        self.stats.skipped += counts.skipped;
        self.stats.total_entities = self.layer.entity_count();
    }
}

/// Ordered set of layers plus the entities they share
pub struct Pipeline {
    layers: Vec<LayerSlot>,
    pending: Vec<LayerSlot>,
    next_seq: u64,
    entities: HashMap<EntityId, SharedEntity>,
    hierarchy: Hierarchy,
    diagnostics: PipelineDiagnostics,
    size: Option<(u32, u32)>,
    last_frame: u64,
    /// Frame whose update pass already merged parked layers
    updated_frame: Option<u64>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            pending: Vec::new(),
            next_seq: 0,
            entities: HashMap::new(),
            hierarchy: Hierarchy::new(),
            diagnostics: PipelineDiagnostics::default(),
            size: None,
            last_frame: 0,
            updated_frame: None,
        }
    }

    fn slots(&self) -> impl Iterator<Item = &LayerSlot> {
        self.layers.iter().chain(self.pending.iter())
    }

    fn slots_mut(&mut self) -> impl Iterator<Item = &mut LayerSlot> {
        self.layers.iter_mut().chain(self.pending.iter_mut())
    }

    fn slot(&self, name: &str) -> Option<&LayerSlot> {
        self.slots().find(|s| s.layer.name() == name)
    }

    /// Register a layer. It joins the run order at the start of the next frame
    pub fn add_layer<L: Layer + 'static>(&mut self, layer: L) -> Result<()> {
        self.add_boxed_layer(Box::new(layer))
    }

    pub fn add_boxed_layer(&mut self, mut layer: Box<dyn Layer>) -> Result<()> {
        if self.slot(layer.name()).is_some() {
            return Err(Error::DuplicateLayer(layer.name().to_string()));
        }

        // Entities registered earlier join the new layer too
        for entity in self.entities.values() {
            let capabilities = entity.read().capabilities();
            if layer.accepts(capabilities) {
                layer.add_entity(entity.clone());
            }
        }

        log::debug!(
            "layer '{}' added (priority {})",
            layer.name(),
            layer.priority()
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(LayerSlot {
            layer,
            seq,
            stats: LayerStats::default(),
            health: LayerHealth::Healthy,
            counted_frame: 0,
        });
        Ok(())
    }

    /// Remove a layer by name and hand it back
    pub fn remove_layer(&mut self, name: &str) -> Result<Box<dyn Layer>> {
        let position = |list: &[LayerSlot]| list.iter().position(|s| s.layer.name() == name);
        let slot = if let Some(index) = position(&self.layers) {
            self.layers.remove(index)
        } else if let Some(index) = position(&self.pending) {
            self.pending.remove(index)
        } else {
            return Err(Error::LayerNotFound(name.to_string()));
        };
        log::debug!("layer '{}' removed", name);
        Ok(slot.layer)
    }

    /// Merge parked layers into the run order
    fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let mut added = std::mem::take(&mut self.pending);
        if let Some((width, height)) = self.size {
            for slot in &mut added {
                slot.layer.resize(width, height);
            }
        }
        self.layers.append(&mut added);
        self.layers
            .sort_by_key(|slot| (slot.layer.priority(), slot.seq));
    }

    /// Register an entity with every layer whose capability filter matches
    ///
    /// Returns the number of layers it joined.
    pub fn add_entity(&mut self, entity: SharedEntity) -> Result<usize> {
        let (id, capabilities) = {
            let guard = entity.read();
            (guard.id(), guard.capabilities())
        };
        if self.entities.contains_key(&id) {
            return Err(Error::DuplicateEntity(id));
        }

        let mut joined = 0;
        for slot in self.slots_mut() {
            if slot.layer.accepts(capabilities) && slot.layer.add_entity(entity.clone()) {
                joined += 1;
            }
        }
        if joined == 0 {
            log::debug!("entity {} matched no layer", id);
        }

        self.hierarchy.insert(id);
        self.entities.insert(id, entity);
        Ok(joined)
    }

    /// Remove an entity from every layer and the hierarchy
    ///
    /// Its children become roots.
    pub fn remove_entity(&mut self, id: EntityId) -> Result<SharedEntity> {
        let entity = self.entities.remove(&id).ok_or(Error::EntityNotFound(id))?;
        for slot in self.slots_mut() {
            slot.layer.remove_entity(id);
        }
        self.hierarchy.remove(id);
        Ok(entity)
    }

    pub fn entity(&self, id: EntityId) -> Option<&SharedEntity> {
        self.entities.get(&id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn set_parent(&mut self, child: EntityId, parent: EntityId) -> Result<()> {
        self.hierarchy.set_parent(child, parent)?;
        Ok(())
    }

    pub fn clear_parent(&mut self, child: EntityId) -> Result<Option<EntityId>> {
        Ok(self.hierarchy.clear_parent(child)?)
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Run `update` on every active layer, ascending priority
    pub fn update(&mut self, frame: &FrameTime, input: &InputState) {
        self.flush_pending();
        self.last_frame = frame.frame;
        self.updated_frame = Some(frame.frame);

        for slot in &mut self.layers {
            if !slot.layer.is_active() {
                continue;
            }
            let start = Instant::now();
            let layer = &mut slot.layer;
            let outcome = catch_panic_mut(|| layer.update(frame, input));
            slot.stats.last_update = start.elapsed();
            slot.record(LayerPhase::Update, outcome, frame.frame);
            slot.absorb_counts(frame.frame);
        }
    }

    /// Collect and process render commands layer by layer
    ///
    /// Layers added since this frame's update wait for the next frame.
    pub fn render(&mut self, frame: &FrameTime, env: &mut RenderEnv<'_>) {
        if self.updated_frame != Some(frame.frame) {
            self.flush_pending();
        }
        self.last_frame = frame.frame;
        self.diagnostics.begin_frame();

        let mut carried = CommandList::new();
        for slot in &mut self.layers {
            if !slot.layer.is_active() {
                continue;
            }
            let start = Instant::now();

            let mut collected = CommandList::new();
            let layer = &mut slot.layer;
            let outcome = catch_panic_mut(|| layer.collect_render_commands(frame, &mut collected));
            let claimed = if slot.record(LayerPhase::Collect, outcome, frame.frame) {
                self.diagnostics.commands_current += collected.len();
                carried.extend(collected);
                let (claimed, rest) =
                    std::mem::take(&mut carried).partition_supported(slot.layer.supported_commands());
                carried = rest;

                let layer = &mut slot.layer;
                let outcome = catch_panic_mut(|| layer.process_render_commands(&claimed, env));
                slot.record(LayerPhase::Process, outcome, frame.frame);
                claimed.len()
            } else {
                0
            };

            slot.stats.last_render = start.elapsed();
            slot.stats.commands_last_frame = claimed;
            slot.stats.commands_total += claimed as u64;
            slot.absorb_counts(frame.frame);
            self.diagnostics
                .per_layer
                .push((slot.layer.name().to_string(), claimed));
        }

        if !carried.is_empty() {
            log::debug!(
                "frame {}: {} unclaimed command(s): {:?}",
                frame.frame,
                carried.len(),
                carried.iter().map(|c| c.command_type()).collect::<Vec<_>>()
            );
        }
        self.diagnostics.end_frame(carried.len());

        // A layer that ran a full frame without failing is healthy again
        for slot in &mut self.layers {
            if let LayerHealth::Failed { frame: failed, .. } = slot.health {
                if failed < frame.frame {
                    slot.health = LayerHealth::Healthy;
                }
            }
        }
    }

    /// Propagate a framebuffer resize to every layer, active or not
    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = Some((width, height));
        for slot in self.slots_mut() {
            slot.layer.resize(width, height);
        }
    }

    pub fn layer(&self, name: &str) -> Option<&dyn Layer> {
        self.slot(name).map(|s| &*s.layer)
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut (dyn Layer + 'static)> {
        self.slots_mut()
            .find(|s| s.layer.name() == name)
            .map(|s| s.layer.as_mut())
    }

    /// Names in run order, followed by layers not merged yet
    pub fn layer_names(&self) -> Vec<&str> {
        self.slots().map(|s| s.layer.name()).collect()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len() + self.pending.len()
    }

    pub fn layer_health(&self, name: &str) -> Option<&LayerHealth> {
        self.slot(name).map(|s| &s.health)
    }

    pub fn layer_stats(&self, name: &str) -> Option<&LayerStats> {
        self.slot(name).map(|s| &s.stats)
    }

    pub fn diagnostics(&self) -> &PipelineDiagnostics {
        &self.diagnostics
    }

    /// Zero pipeline and per-layer counters
    pub fn reset_diagnostics(&mut self) {
        self.diagnostics.reset();
        for slot in self.slots_mut() {
            slot.stats.reset();
        }
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let diag = &self.diagnostics;
        DiagnosticsSnapshot {
            frame: self.last_frame,
            total_frames: diag.total_frames,
            entities: self.entities.len(),
            commands_current: diag.commands_current,
            commands_total: diag.commands_total,
            commands_peak: diag.commands_peak,
            average_commands: diag.average_commands(),
            unclaimed_total: diag.unclaimed_total,
            layers: self
                .slots()
                .map(|s| {
                    LayerSnapshot::new(
                        s.layer.name(),
                        s.layer.priority(),
                        s.layer.is_active(),
                        &s.health,
                        &s.stats,
                    )
                })
                .collect(),
            dispatcher: None,
        }
    }

    /// Release GPU resources held by layers. Safe to call more than once
    pub fn dispose(&mut self, gfx: &mut dyn GraphicsContext) {
        for slot in self.slots_mut() {
            slot.layer.dispose(gfx);
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use void_render::{AssetTable, CommandTypeSet, LightManager, RecordingContext};

    use super::*;
    use crate::entity::Capabilities;
    use crate::layer::LayerBase;

    struct Tracer {
        base: LayerBase,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl Tracer {
        fn new(name: &str, priority: i32, log: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                base: LayerBase::new(name, priority),
                log: log.clone(),
                fail: false,
            }
        }
    }

    impl Layer for Tracer {
        fn base(&self) -> &LayerBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut LayerBase {
            &mut self.base
        }
        fn supported_commands(&self) -> CommandTypeSet {
            CommandTypeSet::EMPTY
        }
        fn accepts(&self, _capabilities: Capabilities) -> bool {
            false
        }
        fn update(&mut self, _frame: &FrameTime, _input: &InputState) -> std::result::Result<(), LayerError> {
            if self.fail {
                panic!("{} exploded", self.base.name());
            }
            self.log.lock().push(self.base.name().to_string());
            Ok(())
        }
    }

    fn frame(n: u64) -> FrameTime {
        FrameTime::new(n, 0.016, n as f32 * 0.016)
    }

    #[test]
    fn test_runs_in_priority_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        pipeline.add_layer(Tracer::new("c", 30, &log)).unwrap();
        pipeline.add_layer(Tracer::new("a", 10, &log)).unwrap();
        pipeline.add_layer(Tracer::new("b", 10, &log)).unwrap();

        pipeline.update(&frame(1), &InputState::new());
        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
        assert_eq!(pipeline.layer_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_and_missing_layers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        pipeline.add_layer(Tracer::new("a", 0, &log)).unwrap();
        assert_eq!(
            pipeline.add_layer(Tracer::new("a", 5, &log)),
            Err(Error::DuplicateLayer("a".into()))
        );
        assert!(pipeline.remove_layer("a").is_ok());
        assert!(matches!(
            pipeline.remove_layer("a"),
            Err(Error::LayerNotFound(_))
        ));
    }

    #[test]
    fn test_panicking_layer_is_contained() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        let mut bad = Tracer::new("bad", 0, &log);
        bad.fail = true;
        pipeline.add_layer(bad).unwrap();
        pipeline.add_layer(Tracer::new("good", 10, &log)).unwrap();

        pipeline.update(&frame(1), &InputState::new());
        assert_eq!(*log.lock(), vec!["good"]);
        assert_eq!(pipeline.layer_stats("bad").unwrap().failures, 1);
        let health = pipeline.layer_health("bad").unwrap();
        assert!(health.error().unwrap().contains("bad exploded"));
    }

    #[test]
    fn test_render_counts_frames() {
        let mut pipeline = Pipeline::new();
        let (lights, assets) = (LightManager::new(), AssetTable::default());
        let mut gfx = RecordingContext::default();

        for n in 1..=3 {
            let mut env = RenderEnv::new(&mut gfx, None, &lights, &assets);
            pipeline.render(&frame(n), &mut env);
        }
        assert_eq!(pipeline.diagnostics().total_frames, 3);

        pipeline.reset_diagnostics();
        assert_eq!(pipeline.diagnostics().total_frames, 0);
        let mut env = RenderEnv::new(&mut gfx, None, &lights, &assets);
        pipeline.render(&frame(4), &mut env);
        assert_eq!(pipeline.diagnostics().total_frames, 1);
    }
}

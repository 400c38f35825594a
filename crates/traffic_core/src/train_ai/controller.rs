use bevy::prelude::*;
use std::backtrace::Backtrace;

use crate::config::BLOCK_COUNTER_STUCK;
use crate::vehicles::{PathHandle, VehicleFlags, VehicleId};

use super::types::{
    PathStatus, ReleaseReason, StepOutcome, TrainAiContext, UnspawnReason,
};

/// Per-tick driver for one train or metro consist.
///
/// Owns the path request lifecycle (wait, consume, give up), moves every unit
/// of the consist in travel order and releases vehicles that have nothing
/// left to do.
pub struct PathLifecycleController;

impl PathLifecycleController {
    pub fn simulation_step(ctx: &mut TrainAiContext, id: VehicleId) -> StepOutcome {
        #[cfg(feature = "trace")]
        let _span = bevy::log::info_span!("train_simulation_step").entered();

        if !ctx.vehicles.is_alive(id) {
            return StepOutcome::Ended;
        }

        if ctx.vehicles.flags(id).contains(VehicleFlags::WAITING_PATH) {
            if let Some(outcome) = Self::poll_path(ctx, id) {
                return outcome;
            }
        } else {
            ctx.states.reset_path_wait(id);
            if ctx.vehicles.flags(id).contains(VehicleFlags::WAITING_SPACE) {
                ctx.host.try_spawn(id, ctx.vehicles);
            }
        }

        let mut reversed = is_reversed(ctx, id);
        let mut front = Self::front_unit(ctx, id, reversed);
        Self::track_front(ctx, id, front);

        ctx.host.simulation_step(front, id, ctx.vehicles);
        if !ctx.vehicles.is_alive(id) {
            return StepOutcome::Ended;
        }

        if is_reversed(ctx, id) != reversed {
            reversed = !reversed;
            front = Self::front_unit(ctx, id, reversed);
            ctx.host.simulation_step(front, id, ctx.vehicles);
            if !ctx.vehicles.is_alive(id) {
                return StepOutcome::Ended;
            }
            if is_reversed(ctx, id) != reversed {
                warn!("Train {id:?} reversed twice in one tick, releasing it");
                Self::release(ctx, id);
                return StepOutcome::Released(ReleaseReason::InconsistentOrientation);
            }
        }

        if !Self::step_consist(ctx, id, front, reversed) {
            return StepOutcome::Ended;
        }

        let vehicle = match ctx.vehicles.get(id) {
            Some(vehicle) => vehicle,
            None => return StepOutcome::Ended,
        };
        if !vehicle.flags.intersects(VehicleFlags::ACTIVE) {
            Self::release(ctx, id);
            return StepOutcome::Released(ReleaseReason::Idle);
        }
        if vehicle.block_counter == BLOCK_COUNTER_STUCK && ctx.options.despawn_when_stuck {
            Self::release(ctx, id);
            return StepOutcome::Released(ReleaseReason::Stuck);
        }
        StepOutcome::Continued
    }

    /// Handle a pending path request. Returns the final outcome when the
    /// vehicle got unspawned.
    fn poll_path(ctx: &mut TrainAiContext, id: VehicleId) -> Option<StepOutcome> {
        let handle = ctx.vehicles.get(id).map_or(PathHandle::NULL, |v| v.path);
        let status = if handle.is_null() {
            PathStatus::Failed
        } else {
            ctx.paths.status(handle)
        };
        let limit = ctx.options.path_wait_limit;

        match status {
            PathStatus::Ready => {
                ctx.states.reset_path_wait(id);
                if let Err(err) = ctx.host.path_find_ready(id, ctx.vehicles) {
                    let class_name = ctx
                        .vehicles
                        .get(id)
                        .map_or("<unknown>", |v| v.info.class_name.as_str());
                    warn!("Train {id:?} ({class_name}) could not consume its path: {err}");
                    Self::abandon_path(ctx, id);
                    return Some(StepOutcome::Unspawned(UnspawnReason::PathConsumeFailed));
                }
                if let Some(vehicle) = ctx.vehicles.get(id) {
                    if let Err(err) = ctx.tracker.on_path_find_ready(id, vehicle) {
                        error!("Train {id:?} path-ready bookkeeping failed: {err}");
                    }
                }
                None
            }
            PathStatus::Failed => {
                ctx.states.reset_path_wait(id);
                Self::abandon_path(ctx, id);
                Some(StepOutcome::Unspawned(UnspawnReason::PathFailed))
            }
            PathStatus::Pending if ctx.states.path_wait_saturated(id, limit) => {
                debug!("Train {id:?} gave up on its path after {limit} ticks");
                ctx.states.reset_path_wait(id);
                Self::abandon_path(ctx, id);
                Some(StepOutcome::Unspawned(UnspawnReason::PathFailed))
            }
            PathStatus::Pending => {
                ctx.states.increment_path_wait(id, limit);
                None
            }
        }
    }

    /// Clear WAITING_PATH, hand the path back and unspawn.
    fn abandon_path(ctx: &mut TrainAiContext, id: VehicleId) {
        let mut handle = PathHandle::NULL;
        if let Some(vehicle) = ctx.vehicles.get_mut(id) {
            vehicle.flags.remove(VehicleFlags::WAITING_PATH);
            handle = std::mem::take(&mut vehicle.path);
        }
        if !handle.is_null() {
            ctx.paths.release_path(handle);
        }
        ctx.host.unspawn(id, ctx.vehicles);
    }

    fn front_unit(ctx: &TrainAiContext, id: VehicleId, reversed: bool) -> VehicleId {
        if reversed {
            ctx.vehicles.last_vehicle(id, ctx.options.max_consist_hops)
        } else {
            id
        }
    }

    fn track_front(ctx: &mut TrainAiContext, id: VehicleId, front: VehicleId) {
        let Some(unit) = ctx.vehicles.get(front) else {
            return;
        };
        if let Err(err) = ctx.tracker.log_traffic(front, unit) {
            error!("Train {id:?} traffic logging failed: {err}");
        }
        if let Err(err) = ctx.tracker.update_vehicle_pos(front, unit) {
            error!("Train {id:?} position update failed: {err}");
        }
        ctx.states.record_position(id, unit.frame.position);
    }

    /// Step the remaining units behind `front`. Returns false when the
    /// vehicle was deleted along the way.
    fn step_consist(ctx: &mut TrainAiContext, id: VehicleId, front: VehicleId, reversed: bool) -> bool {
        let max_hops = ctx.options.max_consist_hops;
        let mut unit = ctx.vehicles.next_unit(front, reversed);
        let mut hops: u32 = 0;
        while !unit.is_null() {
            ctx.host.simulation_step(unit, id, ctx.vehicles);
            if !ctx.vehicles.is_alive(id) {
                return false;
            }
            unit = ctx.vehicles.next_unit(unit, reversed);
            hops += 1;
            if hops > max_hops {
                error!(
                    "Invalid consist detected for train {id:?}: more than {max_hops} linked units\n{}",
                    Backtrace::capture()
                );
                break;
            }
        }
        true
    }

    fn release(ctx: &mut TrainAiContext, id: VehicleId) {
        let handle = ctx
            .vehicles
            .get_mut(id)
            .map_or(PathHandle::NULL, |v| std::mem::take(&mut v.path));
        if !handle.is_null() {
            ctx.paths.release_path(handle);
        }
        ctx.host.release_vehicle(id, ctx.vehicles);
        ctx.states.release(id);
    }
}

fn is_reversed(ctx: &TrainAiContext, id: VehicleId) -> bool {
    ctx.vehicles.flags(id).contains(VehicleFlags::REVERSED)
}

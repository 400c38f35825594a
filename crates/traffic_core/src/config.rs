/// Hard bound on linked-unit hops when walking a consist. A healthy train is
/// far shorter; exceeding this means the leading/trailing links form a cycle.
pub const MAX_CONSIST_HOPS: u32 = 16_384;

/// Block counter value at which a vehicle counts as stuck.
pub const BLOCK_COUNTER_STUCK: u8 = 255;

/// Path offsets are stored as a byte along the lane (0..=255).
pub const OFFSET_SCALE: f32 = 1.0 / 255.0;

/// Metres subtracted from the braking distance before a vehicle must commit
/// to the next lane.
pub const SAFETY_MARGIN: f32 = 5.0;

/// Free space demanded on the next lane before a train may enter it.
pub const LANE_SPACE_LOOKAHEAD: f32 = 1000.0;

/// Minimum squared length of the approach probe (segment start -> curve middle).
pub const APPROACH_PROBE_MIN_LENGTH_SQ: f32 = 3.0;

/// Distance the approach probe start is pulled toward the curve middle so the
/// probing vehicle's own nose is not tested.
pub const APPROACH_PROBE_START_INSET: f32 = 2.5;

/// Minimum squared length of the exit probe (curve middle -> curve end).
pub const EXIT_PROBE_MIN_LENGTH_SQ: f32 = 1.0;

/// Below this start/end distance an unspawned vehicle paths from its target.
pub const SHORT_TRIP_DISTANCE: f32 = 100.0;

/// Search radius used when snapping start/end positions onto lanes.
pub const PATH_POSITION_SEARCH_RADIUS: f32 = 32.0;

/// A secondary lane candidate is kept only if it is at most this factor
/// farther away than the primary one.
pub const SECONDARY_POSITION_TOLERANCE: f32 = 1.2;

/// Maximum route length handed to the path-search collaborator.
pub const MAX_PATH_LENGTH: f32 = 20_000.0;

/// Two units overlap when their physical segments come closer than this.
pub const OVERLAP_RADIUS: f32 = 2.0;

/// Half the side length of the playable area, centred on the origin.
pub const WORLD_HALF_EXTENT: f32 = 8640.0;

/// Side length of one vehicle spatial index bucket.
pub const VEHICLE_BUCKET_SIZE: f32 = 64.0;

//! Defaults and tuning constants for generation, screening, and fusion.

// --- Blip identifiers ---

/// First blip id handed out; everything below is left to host-simulation ids.
pub const BLIP_ID_FLOOR: u64 = u64::MAX / 2;

// --- Generator ---

/// Default time between rescans (seconds).
pub const DEFAULT_SCAN_INTERVAL: f64 = 20.0;

/// Default fraction of a consistent population kept per scan.
pub const DEFAULT_PERSISTENCE: f64 = 1.0;

/// Persistence at or above this value never thins the population.
pub const FULL_PERSISTENCE: f64 = 0.999;

/// Altitude of an auto-placed reference centroid (meters, 30,000 ft).
pub const DEFAULT_CENTROID_ALTITUDE: f64 = 9144.0;

/// Blip motion below this speed is treated as stationary (m/s).
pub const MIN_BLIP_SPEED: f64 = 1.0e-5;

/// Time differences below this are the same instant (seconds).
pub const TIME_EPSILON: f64 = 1.0e-5;

// --- Signal classification ---

/// SNR multiple of the detection threshold that classifies a blip as Strong.
pub const STRONG_THRESHOLD_FACTOR: f64 = 2.0;

// --- Screener ---

pub const DEFAULT_SCREENER_PLOT_CAPACITY: usize = 1000;

pub const DEFAULT_SCREENER_TRACK_CAPACITY: usize = 1000;

pub const DEFAULT_TRANSFER_CAPACITY: usize = 250;

/// Sector arcs within this of a full circle disable the sector window.
pub const FULL_CIRCLE_TOLERANCE: f64 = 0.001;

// --- Fusion center ---

/// Default fusion frame period (seconds).
pub const DEFAULT_FRAME_TIME: f64 = 1.0;

pub const DEFAULT_FUSION_TRACK_CAPACITY: usize = 500;

pub const DEFAULT_FUSION_PLOT_CAPACITY: usize = 2000;

/// Overload boundary = this multiple of plot capacity.
pub const DEFAULT_OVERLOAD_MULTIPLE: usize = 10;

/// Plot boundary = this multiple of track capacity.
pub const DEFAULT_PLOT_MULTIPLE: usize = 10;

// --- Physics used by effect-derived defaults ---

/// Speed of light (m/s).
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Mean earth radius (meters).
pub const EARTH_RADIUS: f64 = 6_366_707.0;

/// Effective earth radius factor for radar horizon.
pub const EFFECTIVE_EARTH_FACTOR: f64 = 4.0 / 3.0;

// --- Reference evaluator ---

/// Radar-equation calibration: SNR = 1 at this range for a 1 m² target.
pub const REFERENCE_RADAR_RANGE: f64 = 200_000.0;

/// Jammer calibration: JNR = 1 at this range for unit jammer power.
pub const REFERENCE_JAMMER_RANGE: f64 = 400_000.0;

/// Default receiver detection threshold (linear SNR).
pub const DEFAULT_DETECTION_THRESHOLD: f64 = 1.0;

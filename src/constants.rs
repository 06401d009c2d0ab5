/// Perturbations attempted by each annealing worker
pub const MAX_ITERATIONS: u64 = 1_000_000;

/// Temperature constant `tC`
pub const TEMPERATURE_CONSTANT: f64 = 1.0;

/// Temperature exponent `tE`
pub const TEMPERATURE_EXPONENT: f64 = 3.0;

/// Iterations without a new reset-best before the working streak snaps back
pub const WANDER_LIMIT: u64 = 10_000;

/// Annealing workers per picker group
pub const DEFAULT_WORKERS: usize = 4;

/// Capacity of the bounded candidate queue between workers and the reducer
pub const QUEUE_BOUND: usize = 1024;

/// Consecutive zero-probability moves a worker tolerates before giving up
pub const MAX_DEGENERATE_MOVES: u64 = 1_000_000;

/// Seasons drawn by the posterior simulator
pub const DEFAULT_SIMULATIONS: usize = 10_000;

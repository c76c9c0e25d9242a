//! GPU timing
//!
//! Measures device-side elapsed time of bracketed GPU work. Begin/end
//! timestamps recorded on a command stream only resolve once the device has
//! executed that work, so measurements are kept in a small ring of in-flight
//! query slots and retired lazily, in issue order, into running statistics.
//!
//! ```no_run
//! use gputimer_profiler::{sim::SimulatedDevice, GpuTimer};
//!
//! let mut device = SimulatedDevice::new();
//! let mut timer = GpuTimer::new(&mut device, 2).unwrap();
//! for _ in 0..100 {
//!     timer.bracket_begin(&mut device).unwrap();
//!     device.execute_ms(1.5);
//!     timer.bracket_end(&mut device);
//! }
//! if let Some(line) = timer.report(&mut device, "blit").unwrap() {
//!     println!("{}", line);
//! }
//! timer.destroy(&mut device);
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod metrics;
pub mod retire;
pub mod ring;
pub mod scheduler;
pub mod sim;
pub mod stats;
pub mod timer;
pub mod wait;

pub use config::TimerConfig;
pub use device::{DeviceError, QueryKind, TimingDevice, ValidityRecord};
pub use error::TimerError;
pub use stats::StatsAggregator;
pub use timer::GpuTimer;
pub use wait::{PollPolicy, WaitStrategy};

//! Step runners
//!
//! One runner per step type. Each validates its arguments at construction
//! and runs a dry-run body that simulates the host side effects.

pub mod connectivity;
pub mod disk_speed;
pub mod domain_resolution;
pub mod free_addresses;
pub mod image_availability;
pub mod install;
pub mod inventory;
pub mod logs_gather;
pub mod ntp;
pub mod stop_installation;

pub use connectivity::ConnectivityCheckRunner;
pub use disk_speed::DiskSpeedCheckRunner;
pub use domain_resolution::DomainResolutionRunner;
pub use free_addresses::FreeAddressesRunner;
pub use image_availability::ImageAvailabilityRunner;
pub use install::InstallRunner;
pub use inventory::InventoryRunner;
pub use logs_gather::LogsGatherRunner;
pub use ntp::NtpSynchronizerRunner;
pub use stop_installation::StopInstallationRunner;

use core::fmt::Debug;
use core::hash::Hash;

bitflags! {
    /// Which processors can dereference memory belonging to a space.
    pub struct Access: u8 {
        /// Host code may read and write the memory directly.
        const HOST = 0b01;

        /// Device code may read and write the memory directly.
        const DEVICE = 0b10;

        /// Both sides may access the memory, as with CUDA managed allocations.
        const SHARED = Self::HOST.bits | Self::DEVICE.bits;
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Zero-sized tag naming an execution space.
///
/// Tags carry no runtime state. They select the pointer family and default memory resource of an
/// allocator at compile time, so mixing pointers or allocators from different spaces is a type
/// error rather than a runtime failure.
///
/// This trait is sealed; the spaces are [`Host`], [`Device`] and [`Unified`].
pub trait MemorySpace:
    sealed::Sealed + Copy + Default + Debug + Eq + Hash + Send + Sync + 'static
{
    /// Human-readable name, used in diagnostics and environment variable names.
    const NAME: &'static str;

    /// Processors able to dereference memory in this space.
    const ACCESS: Access;

    /// Returns true if host code may dereference pointers into this space.
    fn is_host_accessible() -> bool {
        Self::ACCESS.contains(Access::HOST)
    }
}

/// Ordinary process memory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Host;

/// Memory resident on the device. Host code must not dereference it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Device;

/// Memory migrated on demand between host and device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Unified;

impl sealed::Sealed for Host {}
impl sealed::Sealed for Device {}
impl sealed::Sealed for Unified {}

impl MemorySpace for Host {
    const NAME: &'static str = "host";
    const ACCESS: Access = Access::HOST;
}

impl MemorySpace for Device {
    const NAME: &'static str = "device";
    const ACCESS: Access = Access::DEVICE;
}

impl MemorySpace for Unified {
    const NAME: &'static str = "unified";
    const ACCESS: Access = Access::SHARED;
}

pub mod booking;
pub mod lifecycle;
pub mod slots;

pub use booking::BookingService;
pub use lifecycle::BookingLifecycleService;
pub use slots::SlotService;

mod broadcast_worker;

pub use broadcast_worker::run_broadcast_worker;

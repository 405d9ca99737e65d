//! Backends that ship with the host

pub mod test_thread;

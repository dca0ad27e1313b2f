pub mod jtbd_store;

pub use jtbd_store::{sample_records, InMemoryJtbdRepository};

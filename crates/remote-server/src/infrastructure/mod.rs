//! Infrastructure layer: everything that touches the OS or a socket.

pub mod input_injection;
pub mod network;
pub mod pairing_page;
pub mod screen_capture;
pub mod storage;

//! remote-server library crate.
//!
//! Lets a phone on the same local network drive this computer's pointer and
//! keyboard and pull screenshots of its primary display, after pairing with a
//! short code shown as a QR code.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Phone (JSON datagrams over UDP)          Browser (pairing page)
//!         ↕                                        ↕
//! [remote-server]
//!   ├── domain/           ServerConfig (runtime settings)
//!   ├── application/      Dispatcher, InjectInputUseCase, FrameProducer,
//!   │                     InactivitySweeper + the capability traits
//!   └── infrastructure/
//!         ├── network/         UDP event loop, LAN address detection
//!         ├── input_injection/ X11/XTest, headless and mock injectors
//!         ├── screen_capture/  X11, headless and mock capturers
//!         ├── pairing_page     HTTP page with the QR code (axum)
//!         └── storage/         TOML configuration file
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `remote-core`, and reaches the OS
//!   only through the [`application::InputInjector`] and
//!   [`application::ScreenCapturer`] traits.
//! - `infrastructure` implements those traits and owns every socket.
//!
//! # For beginners: why this structure?
//!
//! The interesting rules (who may send what, how motion becomes pixels, when
//! a session expires) live in code that runs without a display or a network.
//! The tests in this crate drive the whole dispatcher with a recording mock
//! injector and a synthetic screen, and an end-to-end test talks to a real
//! UDP socket on the loopback interface.

/// Domain layer: runtime configuration types (no I/O).
pub mod domain;

/// Application layer: message dispatch and the use cases behind it.
pub mod application;

/// Infrastructure layer: sockets, OS backends, HTTP page, config file.
pub mod infrastructure;

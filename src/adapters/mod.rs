//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `config_store` | ConfigPort         | postcard blob in memory  |
//! | `log_sink`     | EventSink          | `log` facade             |
//! | `mqtt`         | RuntimeRegistry    | MQTT broker              |
//! |                | ModeSource         |                          |
//! |                | EventSink          |                          |
//! | `sim`          | Clock              | simulated plant          |
//! |                | RuntimeRegistry    |                          |
//! |                | RelayPort          |                          |
//! | `time`         | Clock              | system timer             |

pub mod config_store;
pub mod log_sink;
pub mod mqtt;
pub mod sim;
pub mod time;

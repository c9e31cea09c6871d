#![cfg_attr(not(test), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
//! ## Feature flags
#![doc = document_features::document_features!(feature_label = r#"<span class="stab portability"><code>{feature}</code></span>"#)]

// must stay first so the logging macros are visible to every module below
mod fmt;

/// The register port between an embedded framework/MCU combination and the SX127x
pub(crate) mod interface;
pub mod irq;
/// InterfaceVariant implementations using `embedded-hal`.
pub mod iv;
/// Parameters, settings and errors shared across the driver
pub mod mod_params;
/// Traits implemented by the board layer and the link layer
pub mod mod_traits;
pub mod shared;
/// Semtech SX1276/77/78/79 LoRa driver
pub mod sx127x;

pub use interface::SpiInterface;
pub use mod_params::{
    Config, NextOperation, OperatingMode, PacketStats, RadioConfig, RadioError, RxStatus, Turnaround,
};
pub use mod_traits::{InterfaceVariant, LinkCallbacks, RegisterPort};
pub use shared::SharedRadio;
pub use sx127x::Sx127x;

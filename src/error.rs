use thiserror::Error;

use crate::types::{OrderId, TintId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("order queue capacity must be > 0")]
    ZeroOrderCapacity,

    #[error("ship buffer capacity must be > 0")]
    ZeroShipCapacity,

    #[error("tint pool must hold at least one tint")]
    NoTints,

    #[error("paint complexity must be > 0")]
    ZeroComplexity,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShopError {
    #[error("order {order} requests tint {tint} but the pool only has tints 1..={tints}")]
    UnknownTint {
        order: OrderId,
        tint: TintId,
        tints: usize,
    },

    #[error("order {order} lists {len} tints but the shop mixes exactly {complexity}")]
    WrongComplexity {
        order: OrderId,
        len: usize,
        complexity: usize,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("{command}: invalid {field} value: {value}")]
    InvalidValue {
        command: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{command}: unexpected argument: {value}")]
    Unexpected { command: &'static str, value: String },

    #[error("{command}: {field} must be > 0")]
    Zero {
        command: &'static str,
        field: &'static str,
    },

    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

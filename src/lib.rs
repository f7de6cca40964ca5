pub mod cli;
pub mod context;
pub mod convert;
pub mod culture;
pub mod detect;
pub mod error;
pub mod fallback;
pub mod hash;
pub mod locate;
pub mod model;
pub mod processor;
pub mod properties;
pub mod resolve;
pub mod trx;

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod optimizer;
pub mod oracle;
pub mod random;
pub mod scorer;
pub mod truth;
pub mod verifier;

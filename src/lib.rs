//! jubakit - low-level manipulation toolkit for Jubatus model files
//!
//! Jubatus servers save their state as binary model files: a fixed header
//! followed by two MessagePack sections. This crate loads those files (or
//! their JSON rendering), validates and repairs the header, dumps them as
//! binary, JSON or text, and transforms a model of one service into a model
//! of another.
//!
//! # Quick Start
//!
//! ```ignore
//! use jubakit::{LoadOptions, Model};
//!
//! let model = Model::load_binary_file(path, LoadOptions::default())?;
//! let nn = model.transform("nearest_neighbor")?;
//! nn.dump_binary(&mut out)?;
//! ```
//!
//! The `jubamodel` command line tool lives in the `jubakit-cli` crate.

pub use jubakit_model::*;

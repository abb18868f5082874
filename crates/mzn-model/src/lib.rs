#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]

//! Builds one MiniZinc model out of many sources.
//!
//! ```no_run
//! use mzn_model::{ModelBuilder, ModelConfig};
//! use mzn_ast::WriteMode;
//!
//! let mut builder = ModelBuilder::with_config(ModelConfig::default().search_dir("lib"));
//! builder.add_file("model.mzn")?;
//! builder.add_string("data", "n = 8;")?;
//! for warning in builder.warnings() {
//!     eprintln!("warning: {warning}");
//! }
//! println!("{}", builder.write(WriteMode::Pretty));
//! # Ok::<(), mzn_model::ModelError>(())
//! ```

mod builder;
mod config;
mod error;
mod include;

pub use builder::{Binding, ModelBuilder};
pub use config::ModelConfig;
pub use error::{ModelError, ModelWarning, Result};

// src/aggregate/mod.rs

//! Aggregation configs and rebuild tracking.
//!
//! A config file declares named groups of member files. The
//! [`ConfigEngine`] concatenates each group's (optionally compiled and
//! minified) members into one output, and records every member in the
//! [`DependencyMap`] so that a member change rebuilds the config.
//!
//! ```xml
//! <root>
//!   <FileGroup Name="site.css">
//!     <File Path="reset.css" Minify="false" />
//!     <File Path="~/theme/site.less" Minify="true" />
//!   </FileGroup>
//! </root>
//! ```

pub mod deps;
pub mod engine;
pub mod model;

pub use deps::DependencyMap;
pub use engine::ConfigEngine;
pub use model::{ConfigDocument, ConfigGroup, ConfigParseError, MemberFile, parse_config, resolve_member};

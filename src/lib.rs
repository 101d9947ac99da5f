//! asset-lint - convention checker for Gazebo model packages
//!
//! Walks a folder of simulation models, checks each package against a fixed
//! set of layout, naming and content rules, and can repair the violations
//! that have a mechanical fix.
//!
//! # Architecture
//!
//! ```text
//! CLI -> Engine -> ModelScanner -> ModelDescriptor -> rules -> Finding
//!                \-> Fixer (with --fix) -> rescan -> Report
//! ```
//!
//! A package is any directory containing `model.config`. Its expected shape:
//!
//! ```text
//! MyRobot/
//!   model.config      author name, author email, description
//!   model.sdf         unit <scale>, zero <pose>
//!   meshes/
//!     MyRobot.dae
//!     MyRobot.mtl     Kd 0.8 0.8 0.8
//!     MyRobot_Diffuse.png
//! ```

pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod fixer;
pub mod model;
pub mod output;
pub mod parse;
pub mod rule;
pub mod rules;
pub mod scanner;

// Re-export main types
pub use config::Config;
pub use diagnostic::{Finding, Fix, FixAction, Severity};
pub use engine::{Engine, ModelReport, Report};
pub use fixer::{FixOutcome, Fixer};
pub use model::ModelDescriptor;
pub use output::{JsonFormatter, OutputFormatter, TextFormatter};
pub use rule::Rule;
pub use rules::{RuleId, RuleSettings};
pub use scanner::{ModelScanner, ScanError};

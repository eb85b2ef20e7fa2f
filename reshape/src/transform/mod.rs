//! Transformation module.
//!
//! - Locator / Block: finding and reading repeated meal blocks
//! - Menu: menu name substitution and the unique-menu report
//! - Operations: whole-table cleanup passes
//! - Increment: per-row increment generation
//! - Profile: versioned mapping rulesets
//! - Pipeline: the end-to-end reshape run

pub mod block;
pub mod increment;
pub mod locator;
pub mod menu;
pub mod operations;
pub mod pipeline;
pub mod profile;

pub use block::{extract_block, BlockLayout};
pub use increment::IncrementStrategy;
pub use locator::{BlockLocator, FixedIndices, HeaderScan, LocatorSpec, StrideBlocks};
pub use menu::{
    harvest_menu_names, map_menu_name, write_menu_names, MenuMapping, DEFAULT_MAPPING_PATH,
};
pub use operations::{CleanupRule, FieldSelector, Operation};
pub use pipeline::*;
pub use profile::{
    builtin_profiles, profile_by_name, FieldRule, OutputField, Profile, DEFAULT_PROFILE,
};

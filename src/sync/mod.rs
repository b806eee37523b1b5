pub mod config;
pub mod eligibility;
pub mod link;
pub mod normalize;
pub mod notion;
pub mod promote;
pub mod ranking;
pub mod reader;
pub mod reconcile;
pub mod record;
pub mod store;
pub mod util;

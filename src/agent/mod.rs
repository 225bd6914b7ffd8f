pub mod agent_factory;
pub mod interface;
pub mod normalizer;
pub mod output_types;
pub mod remote_sql_agent;

pub use agent_factory::*;
pub use interface::*;
pub use normalizer::*;
pub use output_types::*;

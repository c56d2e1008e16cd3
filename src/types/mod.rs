pub mod errors;
pub mod ids;
pub mod mapping;
pub mod migration;
pub mod plan;
pub mod report;
pub mod safepath;

pub use errors::*;
pub use mapping::*;
pub use migration::*;
pub use plan::*;
pub use report::*;
pub use safepath::*;

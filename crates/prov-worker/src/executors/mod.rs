mod bicep;
mod git;
mod http;
mod infracost;
mod opentofu;
mod shell;
mod terraform;
mod vault;

pub use bicep::BicepExecutor;
pub use git::GitExecutor;
pub use http::HttpExecutor;
pub use infracost::InfracostExecutor;
pub use opentofu::OpenTofuExecutor;
pub use terraform::TerraformExecutor;
pub use vault::VaultExecutor;

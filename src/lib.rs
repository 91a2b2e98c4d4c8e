pub mod agent;
pub mod cluster;
pub mod othello;
pub mod referee;

pub mod utils {
    pub mod prelude {
        pub use anyhow::{Context, Error, anyhow};
        pub type Result<T> = anyhow::Result<T, Error>;
    }
}

pub mod prelude {
    pub use super::agent::prelude::*;
    pub use super::cluster::prelude::*;
    pub use super::othello::prelude::*;
    pub use super::referee::*;
    pub use super::utils::prelude::*;
}

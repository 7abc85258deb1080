pub mod forms;
pub mod ids;
pub mod model;
pub mod notices;
pub mod snapshot;
pub mod state;

pub use forms::*;
pub use ids::*;
pub use model::*;
pub use notices::*;
pub use snapshot::*;
pub use state::*;

pub mod config;
pub mod error;
pub mod field;
pub mod frame;
pub mod integrals;
pub mod math;
pub mod panel2d;
pub mod panel3;
pub mod panel4;
pub mod quadrature;
pub mod triangle2d;
pub mod vortex;

pub use config::KernelConfig;
pub use error::{ConfigError, GeometryError, KernelError, Result};
pub use field::DoubletMethod;
pub use panel2d::Panel2d;
pub use panel3::{BasisInfluence, Influence, Panel3};
pub use panel4::Panel4;
pub use triangle2d::Triangle2d;
pub use vortex::VortexModel;

// [apps/control-plane/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CONTROL PLANE LIBRARY ROOT (V9.0)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L1-APP)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE MÓDULOS DEL CENTRO DE MANDO
 * =================================================================
 */

pub mod kernel;
pub mod services;
pub mod settings;
pub mod state;

pub mod prelude {
    pub use crate::kernel::ControlPlaneKernel;
    pub use crate::settings::Settings;
    pub use crate::state::AppState;
}

pub mod audio;
pub mod classifier;
pub mod desktop;
pub mod extract;
pub mod presenter;
pub mod toast;

pub use classifier::{AlertKind, ClassifiedAlert, classify};
pub use presenter::{Permission, PresentOutcome, Presenter, PresenterSettings};
